//! ASR transcript types (§3 "TranscriptSegment").

use serde::{Deserialize, Serialize};

/// A segment of recognized speech, interim or final.
///
/// `id` is unique within a session and immutable once produced: a
/// `final=true` segment supersedes prior `final=false` segments that
/// share an identity lineage, but the superseded segment's own record
/// is never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptSegment {
    pub id: String,
    pub text: String,
    /// 0.0..=1.0
    pub confidence: f32,
    pub is_final: bool,
    pub start_ms: Option<u64>,
    pub end_ms: Option<u64>,
    pub language: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl TranscriptSegment {
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Three recognized pathways a piece of text can travel through the
/// translation queue (§3 "TranslationJob"). The prefix on a job/result
/// `keyId` is how consumers route results back to their source without
/// a shared lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePrefix {
    /// Bare id: realtime per-segment translation.
    Realtime,
    /// `history_` prefix: sentence-combiner output.
    History,
    /// `paragraph_` prefix: paragraph-builder output.
    Paragraph,
}

impl RoutePrefix {
    pub const HISTORY: &'static str = "history_";
    pub const PARAGRAPH: &'static str = "paragraph_";

    /// Apply this prefix to a bare id, producing a routable key id.
    pub fn apply(self, id: &str) -> String {
        match self {
            RoutePrefix::Realtime => id.to_string(),
            RoutePrefix::History => format!("{}{}", Self::HISTORY, id),
            RoutePrefix::Paragraph => format!("{}{}", Self::PARAGRAPH, id),
        }
    }

    /// Strip a known routing prefix, returning the base id and which
    /// pathway produced it.
    pub fn strip(key_id: &str) -> (RoutePrefix, &str) {
        if let Some(base) = key_id.strip_prefix(Self::HISTORY) {
            (RoutePrefix::History, base)
        } else if let Some(base) = key_id.strip_prefix(Self::PARAGRAPH) {
            (RoutePrefix::Paragraph, base)
        } else {
            (RoutePrefix::Realtime, key_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_round_trips_through_apply() {
        let applied = RoutePrefix::History.apply("combined-1");
        let (kind, base) = RoutePrefix::strip(&applied);
        assert_eq!(kind, RoutePrefix::History);
        assert_eq!(base, "combined-1");
    }

    #[test]
    fn bare_id_has_no_prefix() {
        let (kind, base) = RoutePrefix::strip("segment-1");
        assert_eq!(kind, RoutePrefix::Realtime);
        assert_eq!(base, "segment-1");
    }
}
