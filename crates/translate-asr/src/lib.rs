//! Streaming ASR adapter (C1, §4.1): connects one websocket per
//! listening session to the ASR provider, forwards captured audio,
//! parses provider frames into `translate_core::TranscriptSegment`s,
//! and keeps the connection alive independent of audio traffic.
//!
//! Grounded on the teacher's `DeepgramStreamingSession` shape (a split
//! sink/stream behind `Arc<Mutex<..>>`, a background reader task), with
//! keep-alive and bounded reconnection layered on top per the wire
//! protocol this pipeline targets.

pub mod client;
pub mod error;
pub mod metrics;
pub mod protocol;

pub use client::{AsrClient, AsrEvent};
pub use error::{AsrError, AsrErrorKind};
pub use metrics::{AsrMetrics, AsrMetricsSnapshot};
