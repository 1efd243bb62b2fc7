//! `SessionRecord` (§3) — the append-only record a session accumulates.
//! The type lives here; `translate-session` owns the mutable store and
//! its concurrency discipline.

use crate::combined::CombinedSentence;
use crate::paragraph::Paragraph;
use crate::summary::{Summary, VocabularyItem};
use crate::transcript::TranscriptSegment;
use serde::{Deserialize, Serialize};

/// One history entry: a finalized segment, optionally upgraded in place
/// when a higher-quality (`history_`-routed) translation arrives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub segment: TranscriptSegment,
    pub realtime_translation: Option<String>,
    /// Set once the owning `CombinedSentence` resolves and its
    /// high-quality translation lands; replaces the realtime rendering
    /// in presentation without discarding it.
    pub combined: Option<CombinedSentence>,
    pub combined_translation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub start_ts: chrono::DateTime<chrono::Utc>,
    pub end_ts: Option<chrono::DateTime<chrono::Utc>>,
    pub src_lang: String,
    pub tgt_lang: String,
    pub history: Vec<HistoryEntry>,
    pub paragraphs: Vec<Paragraph>,
    pub summaries: Vec<Summary>,
    pub vocabulary: Vec<VocabularyItem>,
}

impl SessionRecord {
    pub fn new(session_id: impl Into<String>, src_lang: impl Into<String>, tgt_lang: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            start_ts: chrono::Utc::now(),
            end_ts: None,
            src_lang: src_lang.into(),
            tgt_lang: tgt_lang.into(),
            history: Vec::new(),
            paragraphs: Vec::new(),
            summaries: Vec::new(),
            vocabulary: Vec::new(),
        }
    }

    /// (R1) Idempotent on segment id: re-delivery of the same final
    /// segment does not duplicate a history entry.
    pub fn record_final_segment(&mut self, segment: TranscriptSegment) {
        if self.history.iter().any(|h| h.segment.id == segment.id) {
            return;
        }
        self.history.push(HistoryEntry {
            segment,
            realtime_translation: None,
            combined: None,
            combined_translation: None,
        });
    }

    pub fn find_history_mut(&mut self, segment_id: &str) -> Option<&mut HistoryEntry> {
        self.history.iter_mut().find(|h| h.segment.id == segment_id)
    }

    /// Total source word count across recorded history, used by the
    /// progressive summarizer (§4.6) to detect threshold crossings.
    /// (P5) Monotonically non-decreasing because history is append-only.
    pub fn cumulative_word_count(&self) -> u32 {
        self.history
            .iter()
            .map(|h| h.segment.word_count() as u32)
            .sum()
    }

    pub fn has_summary_at_threshold(&self, threshold: u32) -> bool {
        self.summaries
            .iter()
            .any(|s| s.threshold_words == Some(threshold))
    }
}
