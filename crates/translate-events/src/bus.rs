//! Event egress (§4.9): wraps a validated `PipelineEvent` in the
//! `{ type, timestamp, correlationId, data }` envelope and fans it out
//! on two channels — a broadcast to the presentation layer and an
//! internal stream for in-process consumers (session recording,
//! metrics). An event that somehow fails to serialize is downgraded to
//! `error(EVENT_VALIDATION_ERROR)` rather than dropped.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use translate_core::{ErrorEventData, PipelineEvent};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub correlation_id: String,
    #[serde(flatten)]
    pub event: PipelineEvent,
}

pub struct EventBus {
    presentation_tx: broadcast::Sender<Envelope>,
    internal_tx: mpsc::Sender<Envelope>,
}

impl EventBus {
    pub fn new(internal_capacity: usize) -> (Arc<Self>, mpsc::Receiver<Envelope>) {
        let (presentation_tx, _) = broadcast::channel(256);
        let (internal_tx, internal_rx) = mpsc::channel(internal_capacity);
        (
            Arc::new(Self {
                presentation_tx,
                internal_tx,
            }),
            internal_rx,
        )
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.presentation_tx.subscribe()
    }

    pub async fn publish(&self, event: PipelineEvent, correlation_id: &str) {
        let envelope = build_envelope(event, correlation_id);
        let _ = self.presentation_tx.send(envelope.clone());
        let _ = self.internal_tx.send(envelope).await;
    }
}

fn build_envelope(event: PipelineEvent, correlation_id: &str) -> Envelope {
    let event = if serde_json::to_value(&event).is_err() {
        tracing::error!(correlation_id, "event failed to serialize, downgrading");
        PipelineEvent::Error(ErrorEventData {
            kind: "EVENT_VALIDATION_ERROR".to_string(),
            message: "event failed to serialize".to_string(),
            recoverable: false,
        })
    } else {
        event
    };
    Envelope {
        timestamp: chrono::Utc::now(),
        correlation_id: correlation_id.to_string(),
        event,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use translate_core::{SessionStatus, StatusEventData};

    #[tokio::test]
    async fn publish_reaches_presentation_subscriber() {
        let (bus, _internal_rx) = EventBus::new(16);
        let mut rx = bus.subscribe();
        bus.publish(
            PipelineEvent::Status(StatusEventData {
                status: SessionStatus::Listening,
                detail: None,
            }),
            "ipc-1-aaaaaa",
        )
        .await;
        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.correlation_id, "ipc-1-aaaaaa");
        assert_eq!(envelope.event.kind(), "status");
    }

    #[tokio::test]
    async fn publish_also_reaches_internal_stream() {
        let (bus, mut internal_rx) = EventBus::new(16);
        bus.publish(
            PipelineEvent::Status(StatusEventData {
                status: SessionStatus::Stopped,
                detail: None,
            }),
            "ipc-2-bbbbbb",
        )
        .await;
        let envelope = internal_rx.recv().await.unwrap();
        assert_eq!(envelope.event.kind(), "status");
    }
}
