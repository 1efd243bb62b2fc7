//! The validated `PipelineEvent` union (§3, §6 "Events") carried end to
//! end by the typed event bus (C9). Every variant's payload is its own
//! type so a downgraded/invalid event can still be represented uniformly
//! as `Error`.

use crate::combined::CombinedSentence;
use crate::display::DisplayPair;
use crate::paragraph::Paragraph;
use crate::summary::{Summary, VocabularyItem};
use crate::transcript::TranscriptSegment;
use crate::translation::TranslationResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsrEventData {
    pub segment: TranscriptSegment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationEventData {
    pub result: TranslationResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentEventData {
    pub pairs: Vec<DisplayPair>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalReportData {
    pub session_id: String,
    pub summary: Summary,
    pub vocabulary: Vec<VocabularyItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Listening,
    Stopped,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEventData {
    pub status: SessionStatus,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEventData {
    pub kind: String,
    pub message: String,
    pub recoverable: bool,
}

/// Discriminated payload for a `PipelineEvent` (§3). `type`, `timestamp`,
/// and `correlation_id` are carried by the enclosing envelope
/// (`translate_events::Envelope`), not here, so this type alone is what
/// gets schema-validated against the union.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum PipelineEvent {
    Asr(AsrEventData),
    Translation(TranslationEventData),
    Segment(SegmentEventData),
    CombinedSentence(CombinedSentence),
    ParagraphComplete(Paragraph),
    ProgressiveSummary(Summary),
    PeriodicSummary(Summary),
    Vocabulary(VocabularyItem),
    FinalReport(FinalReportData),
    Status(StatusEventData),
    Error(ErrorEventData),
}

impl PipelineEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineEvent::Asr(_) => "asr",
            PipelineEvent::Translation(_) => "translation",
            PipelineEvent::Segment(_) => "segment",
            PipelineEvent::CombinedSentence(_) => "combinedSentence",
            PipelineEvent::ParagraphComplete(_) => "paragraphComplete",
            PipelineEvent::ProgressiveSummary(_) => "progressiveSummary",
            PipelineEvent::PeriodicSummary(_) => "periodicSummary",
            PipelineEvent::Vocabulary(_) => "vocabulary",
            PipelineEvent::FinalReport(_) => "finalReport",
            PipelineEvent::Status(_) => "status",
            PipelineEvent::Error(_) => "error",
        }
    }
}
