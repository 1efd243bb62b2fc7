//! The command/event channel (§6): one WebSocket connection carries
//! JSON commands and binary PCM audio in (`startListening`,
//! `stopListening`, `getHistory`, `clearHistory`, raw frames) and
//! envelope-wrapped events out. Grounded on the teacher's
//! `WebSocketHandler` (`server/src/websocket.rs`): split sink/stream,
//! an `Arc<Mutex<_>>`-wrapped sender shared between the socket's own
//! read loop and a spawned event-forwarding task.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use translate_core::{AudioFrame, Channels, ErrorEventData, PipelineEvent};
use translate_events::{new_correlation_id, parse_command, Command};

use crate::state::AppState;

pub async fn handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (sender, mut receiver) = socket.split();
    let sender = Arc::new(Mutex::new(sender));
    let sequence = AtomicU64::new(0);

    let mut events = state.orchestrator.events().subscribe();
    let forward_sender = sender.clone();
    let forward_task = tokio::spawn(async move {
        loop {
            let envelope = match events.recv().await {
                Ok(envelope) => envelope,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(missed = n, "event forwarder lagged, skipping");
                    continue;
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            };
            let Ok(json) = serde_json::to_string(&envelope) else {
                continue;
            };
            let mut sink = forward_sender.lock().await;
            if sink.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let raw: serde_json::Value = match serde_json::from_str(&text) {
                    Ok(v) => v,
                    Err(e) => {
                        publish_validation_error(&state, None, e.to_string()).await;
                        continue;
                    }
                };
                dispatch_command(&state, &sender, raw).await;
            }
            Ok(Message::Binary(data)) => {
                let seq = sequence.fetch_add(1, Ordering::Relaxed);
                let frame = AudioFrame::new(data, state.asr_sample_rate_hz, Channels::Mono, seq);
                if let Err(e) = state.orchestrator.ingest_audio(&frame).await {
                    tracing::warn!(error = %e, "audio ingest failed");
                }
            }
            Ok(Message::Ping(payload)) => {
                let mut sink = sender.lock().await;
                let _ = sink.send(Message::Pong(payload)).await;
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {}
            Err(e) => {
                tracing::warn!(error = %e, "websocket error");
                break;
            }
        }
    }

    forward_task.abort();
    let _ = state.orchestrator.stop_listening(None).await;
}

type Sender = Arc<Mutex<futures::stream::SplitSink<WebSocket, Message>>>;

async fn dispatch_command(state: &AppState, sender: &Sender, raw: serde_json::Value) {
    let command = match parse_command(&raw) {
        Ok(command) => command,
        Err(e) => {
            let correlation_id = raw
                .get("correlationId")
                .and_then(|v| v.as_str())
                .map(String::from);
            publish_validation_error(state, correlation_id, e.to_string()).await;
            return;
        }
    };

    match command {
        Command::StartListening {
            source_language,
            target_language,
            correlation_id,
        } => {
            if let Err(e) = state
                .orchestrator
                .start_listening(source_language, target_language, correlation_id)
                .await
            {
                tracing::warn!(error = %e, "startListening failed");
            }
        }
        Command::StopListening { correlation_id } => {
            if let Err(e) = state.orchestrator.stop_listening(correlation_id).await {
                tracing::warn!(error = %e, "stopListening failed");
            }
        }
        Command::GetHistory { limit, offset } => {
            let entries = state.orchestrator.get_history(limit, offset);
            let envelope = serde_json::json!({
                "type": "history",
                "timestamp": chrono::Utc::now(),
                "correlationId": new_correlation_id(),
                "data": { "entries": entries },
            });
            if let Ok(json) = serde_json::to_string(&envelope) {
                let mut sink = sender.lock().await;
                let _ = sink.send(Message::Text(json)).await;
            }
        }
        Command::ClearHistory {} => {
            state.orchestrator.clear_history();
        }
    }
}

async fn publish_validation_error(state: &AppState, correlation_id: Option<String>, message: String) {
    let correlation_id = correlation_id.unwrap_or_else(new_correlation_id);
    state
        .orchestrator
        .events()
        .publish(
            PipelineEvent::Error(ErrorEventData {
                kind: "COMMAND_VALIDATION_ERROR".to_string(),
                message,
                recoverable: true,
            }),
            &correlation_id,
        )
        .await;
}
