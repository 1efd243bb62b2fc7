//! ASR Stream Adapter (C1, §4.1): owns the outbound websocket to the
//! ASR provider, following the teacher's Deepgram streaming session
//! shape (split sink/stream, a background reader task, `Arc<Mutex<..>>`
//! around the write half) with two additions the spec requires that the
//! teacher's single-shot session didn't need: a keep-alive timer that
//! runs independent of audio traffic, and bounded reconnection with
//! exponential backoff.

use crate::error::{AsrError, AsrErrorKind};
use crate::metrics::AsrMetrics;
use crate::protocol::{ControlFrame, ProviderFrame};
use futures_util::future::BoxFuture;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex as SyncMutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use translate_config::AsrConfig;
use translate_core::{AudioFrame, TranscriptSegment};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

/// Events emitted to whatever owns this adapter — ordinarily the
/// pipeline orchestrator (C8), which re-publishes them on the typed
/// event bus (C9).
#[derive(Debug, Clone)]
pub enum AsrEvent {
    Connected,
    Segment(TranscriptSegment),
    UtteranceEnd,
    Error {
        kind: AsrErrorKind,
        message: String,
        recoverable: bool,
    },
    Disconnected {
        reason: String,
    },
    ReconnectionFailed,
}

struct Inner {
    provider_url: String,
    api_key: String,
    config: AsrConfig,
    session_language: String,
    events_tx: mpsc::Sender<AsrEvent>,
    metrics: AsrMetrics,
    write_sink: SyncMutex<Option<WsSink>>,
    connected: AtomicBool,
    shutting_down: AtomicBool,
    reconnect_attempt: AtomicU32,
}

/// Owns one ASR provider connection for the lifetime of a listening
/// session (§4.1 "connect / sendAudio / disconnect").
#[derive(Clone)]
pub struct AsrClient {
    inner: Arc<Inner>,
}

impl AsrClient {
    pub fn new(
        provider_url: String,
        api_key: String,
        config: AsrConfig,
        session_language: String,
        events_tx: mpsc::Sender<AsrEvent>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider_url,
                api_key,
                config,
                session_language,
                events_tx,
                metrics: AsrMetrics::default(),
                write_sink: SyncMutex::new(None),
                connected: AtomicBool::new(false),
                shutting_down: AtomicBool::new(false),
                reconnect_attempt: AtomicU32::new(0),
            }),
        }
    }

    pub fn metrics(&self) -> &AsrMetrics {
        &self.inner.metrics
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    pub async fn connect(&self) -> Result<(), AsrError> {
        self.inner.shutting_down.store(false, Ordering::SeqCst);
        establish(self.inner.clone()).await?;
        tokio::spawn(keepalive_loop(self.inner.clone()));
        Ok(())
    }

    /// Forward a captured PCM frame as a binary websocket message.
    /// Sending audio does *not* reset the keep-alive timer (§4.1).
    pub async fn send_audio(&self, frame: &AudioFrame) -> Result<(), AsrError> {
        let sink = {
            let mut guard = self.inner.write_sink.lock();
            guard.take()
        };
        let Some(mut sink) = sink else {
            return Err(AsrError::NotConnected);
        };
        let result = sink.send(Message::Binary(frame.bytes.to_vec())).await;
        *self.inner.write_sink.lock() = Some(sink);
        result?;
        self.inner.metrics.record_sent(frame.byte_len());
        Ok(())
    }

    /// Graceful shutdown: finalize the in-flight utterance, ask the
    /// provider to close the stream, then close the socket (§4.1).
    pub async fn disconnect(&self) -> Result<(), AsrError> {
        self.inner.shutting_down.store(true, Ordering::SeqCst);
        let sink = self.inner.write_sink.lock().take();
        if let Some(mut sink) = sink {
            let _ = send_control(&mut sink, ControlFrame::Finalize).await;
            let _ = send_control(&mut sink, ControlFrame::CloseStream).await;
            let _ = sink.close().await;
        }
        self.inner.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}

async fn send_control(sink: &mut WsSink, frame: ControlFrame) -> Result<(), AsrError> {
    let text = serde_json::to_string(&frame).map_err(AsrError::Parse)?;
    sink.send(Message::Text(text)).await?;
    Ok(())
}

fn build_url(inner: &Inner) -> String {
    let cfg = &inner.config;
    let mut url = format!("{}?model={}", inner.provider_url, cfg.model);
    url.push_str(&format!("&interim_results={}", cfg.interim));
    url.push_str(&format!("&smart_format={}", cfg.smart_format));
    url.push_str(&format!("&endpointing={}", cfg.endpointing_ms));
    url.push_str(&format!("&utterance_end_ms={}", cfg.utterance_end_ms));
    url.push_str(&format!(
        "&encoding=linear16&sample_rate={}&channels=1",
        cfg.sample_rate
    ));
    if inner.session_language != "multi" {
        url.push_str(&format!("&language={}", inner.session_language));
    } else {
        url.push_str("&language=multi");
    }
    url
}

fn establish(inner: Arc<Inner>) -> BoxFuture<'static, Result<(), AsrError>> {
    Box::pin(async move {
        let url = build_url(&inner);
        let mut request = url
            .into_client_request()
            .map_err(AsrError::Transport)?;
        request.headers_mut().insert(
            "Authorization",
            format!("Token {}", inner.api_key)
                .parse()
                .expect("header value"),
        );

        let (ws_stream, _) = connect_async(request).await?;
        let (write, read) = ws_stream.split();
        *inner.write_sink.lock() = Some(write);
        inner.connected.store(true, Ordering::SeqCst);
        inner.reconnect_attempt.store(0, Ordering::SeqCst);
        let _ = inner.events_tx.try_send(AsrEvent::Connected);

        tokio::spawn(reader_loop(inner, read));
        Ok(())
    })
}

async fn reader_loop(inner: Arc<Inner>, mut read: SplitStream<WsStream>) {
    while let Some(message) = read.next().await {
        match message {
            Ok(Message::Text(text)) => {
                inner.metrics.record_received(text.len());
                handle_frame(&inner, &text);
            }
            Ok(Message::Close(frame)) => {
                let code = frame.as_ref().map(|f| u16::from(f.code)).unwrap_or(1000);
                on_disconnect(&inner, code, "provider closed connection".to_string()).await;
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "asr websocket read error");
                on_disconnect(&inner, 0, e.to_string()).await;
                return;
            }
            _ => {}
        }
    }
    on_disconnect(&inner, 1000, "stream ended".to_string()).await;
}

fn handle_frame(inner: &Arc<Inner>, text: &str) {
    let frame: ProviderFrame = match serde_json::from_str(text) {
        Ok(f) => f,
        Err(e) => {
            let _ = inner.events_tx.try_send(AsrEvent::Error {
                kind: AsrErrorKind::ParseError,
                message: e.to_string(),
                recoverable: true,
            });
            return;
        }
    };
    match frame {
        ProviderFrame::Results(results) => {
            if let Some(segment) =
                crate::protocol::segment_from_results(&results, &inner.session_language)
            {
                let _ = inner.events_tx.try_send(AsrEvent::Segment(segment));
            }
        }
        ProviderFrame::UtteranceEnd(_) => {
            let _ = inner.events_tx.try_send(AsrEvent::UtteranceEnd);
        }
        ProviderFrame::Metadata(_) => {}
        ProviderFrame::Error(err) => {
            let _ = inner.events_tx.try_send(AsrEvent::Error {
                kind: AsrErrorKind::ProviderMessageError,
                message: err.description,
                recoverable: true,
            });
        }
        ProviderFrame::Unknown => {}
    }
}

async fn on_disconnect(inner: &Arc<Inner>, close_code: u16, reason: String) {
    inner.connected.store(false, Ordering::SeqCst);
    *inner.write_sink.lock() = None;
    let _ = inner
        .events_tx
        .try_send(AsrEvent::Disconnected { reason: reason.clone() });

    if inner.shutting_down.load(Ordering::SeqCst) {
        return;
    }
    let kind = AsrErrorKind::from_close_code(close_code);
    if !kind.is_recoverable() {
        return;
    }
    tokio::spawn(reconnect(inner.clone()));
}

/// Exponential backoff from 1s up to a 30s cap, bounded to three
/// attempts (§4.1 "reconnection policy").
async fn reconnect(inner: Arc<Inner>) {
    loop {
        let attempt = inner.reconnect_attempt.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt > translate_config::ASR_MAX_RECONNECT_ATTEMPTS {
            let _ = inner.events_tx.try_send(AsrEvent::ReconnectionFailed);
            return;
        }
        let backoff_ms = (translate_config::ASR_RECONNECT_INITIAL_BACKOFF_MS * 2u64.pow(attempt - 1))
            .min(translate_config::ASR_RECONNECT_MAX_BACKOFF_MS);
        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
        inner.metrics.record_reconnect();

        match establish(inner.clone()).await {
            Ok(()) => return,
            Err(e) => {
                tracing::warn!(error = %e, attempt, "asr reconnect attempt failed");
                continue;
            }
        }
    }
}

async fn keepalive_loop(inner: Arc<Inner>) {
    let mut ticker = tokio::time::interval(Duration::from_millis(
        translate_config::ASR_KEEPALIVE_MS,
    ));
    ticker.tick().await;
    loop {
        ticker.tick().await;
        if inner.shutting_down.load(Ordering::SeqCst) {
            return;
        }
        if !inner.connected.load(Ordering::SeqCst) {
            continue;
        }
        let sink = inner.write_sink.lock().take();
        if let Some(mut sink) = sink {
            let sent = send_control(&mut sink, ControlFrame::KeepAlive).await;
            *inner.write_sink.lock() = Some(sink);
            if let Err(e) = sent {
                tracing::warn!(error = %e, "failed to send asr keep-alive");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let base = translate_config::ASR_RECONNECT_INITIAL_BACKOFF_MS;
        let cap = translate_config::ASR_RECONNECT_MAX_BACKOFF_MS;
        let seq: Vec<u64> = (1..=5)
            .map(|attempt| (base * 2u64.pow(attempt - 1)).min(cap))
            .collect();
        assert_eq!(seq, vec![1_000, 2_000, 4_000, 8_000, 16_000]);
    }

    #[test]
    fn unauthorized_is_not_recoverable() {
        assert!(!AsrErrorKind::Unauthorized.is_recoverable());
        assert!(AsrErrorKind::RequestTimeout.is_recoverable());
    }

    #[test]
    fn bad_request_is_recoverable() {
        assert!(AsrErrorKind::BadRequest.is_recoverable());
        assert!(AsrErrorKind::from_close_code(4000).is_recoverable());
    }
}
