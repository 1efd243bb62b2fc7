//! Shared data model, traits, and error types for the lecture
//! translation pipeline.
//!
//! This crate has no I/O of its own — everything here is the shape that
//! `translate-asr`, `translate-llm`, `translate-pipeline`,
//! `translate-queue`, `translate-display`, `translate-events`,
//! `translate-session`, and `translate-orchestrator` build on top of.

pub mod audio;
pub mod combined;
pub mod display;
pub mod error;
pub mod event;
pub mod paragraph;
pub mod session;
pub mod summary;
pub mod traits;
pub mod transcript;
pub mod translation;

pub use audio::{AudioFrame, Channels};
pub use combined::CombinedSentence;
pub use display::{DisplayMeta, DisplayPair, OriginalSide, Position, TranslationSide};
pub use error::{Error, Result};
pub use event::{
    AsrEventData, ErrorEventData, FinalReportData, PipelineEvent, SegmentEventData,
    SessionStatus, StatusEventData, TranslationEventData,
};
pub use paragraph::Paragraph;
pub use session::{HistoryEntry, SessionRecord};
pub use summary::{Summary, VocabularyItem, DEFAULT_SUMMARY_THRESHOLDS};
pub use traits::{GatewayRequest, GatewayResponse, LlmGateway, Purpose, StreamDelta};
pub use transcript::{RoutePrefix, TranscriptSegment};
pub use translation::{Priority, QueuedJob, TranslationJob, TranslationResult};
