//! Sentence Combiner (C2, §4.2): groups consecutive final transcript
//! segments into a `CombinedSentence` once the buffered text reads as a
//! complete sentence, the segment count caps out, or a caller-driven
//! timeout forces emission. Buffering follows the teacher's
//! `Mutex<Vec<..>>`-guarded accumulator shape (`streaming.rs`'s
//! `audio_buffer`), generalized from audio frames to transcript
//! segments.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::time::{Duration, Instant};
use translate_config::CombinerConfig;
use translate_core::{CombinedSentence, TranscriptSegment};

static TERMINAL_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[。．！？.!?][")'\]]*\s*$"#).unwrap());

/// A "definite" terminator (§4.2) emits regardless of `min_segments` —
/// no trailing-quote allowance, just the bare terminal character.
static DEFINITE_TERMINATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[？！?!。.]\s*$"#).unwrap());

/// Suffixes that mean the sentence keeps going even though it ends in
/// terminal punctuation or would otherwise read as complete — trailing
/// commas/conjunctions/Japanese particles (§4.2).
static INCOMPLETE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(,|、|\b(and|or|but)\s*$|[はがをにでともへの]\s*$)"#).unwrap());

fn has_incomplete_suffix(text: &str) -> bool {
    INCOMPLETE_SUFFIX.is_match(text.trim_end())
}

fn reads_as_complete_sentence(text: &str) -> bool {
    let trimmed = text.trim_end();
    TERMINAL_PUNCTUATION.is_match(trimmed) && !has_incomplete_suffix(trimmed)
}

fn ends_with_definite_terminator(text: &str) -> bool {
    DEFINITE_TERMINATOR.is_match(text.trim_end())
}

#[derive(Default)]
struct CombinerState {
    buffer: Vec<TranscriptSegment>,
    first_segment_at: Option<Instant>,
}

pub struct SentenceCombiner {
    config: CombinerConfig,
    state: Mutex<CombinerState>,
}

impl SentenceCombiner {
    pub fn new(config: CombinerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(CombinerState::default()),
        }
    }

    /// Feed one final transcript segment. Returns a combined sentence
    /// once the buffer reads as complete or hits `max_segments` (§4.2,
    /// invariant: every combined sentence has at least `min_segments`
    /// unless forced).
    pub fn push_final(&self, segment: TranscriptSegment) -> Option<CombinedSentence> {
        let mut state = self.state.lock();
        if state.buffer.is_empty() {
            state.first_segment_at = Some(Instant::now());
        }
        let is_complete = reads_as_complete_sentence(&segment.text);
        let is_definite_terminator = is_complete && ends_with_definite_terminator(&segment.text);
        state.buffer.push(segment);

        // §4.2 emission policy: complete + min_segments met, or a
        // definite terminator bypassing min_segments entirely (B1),
        // or max_segments truncation safety.
        let should_emit = (is_complete && state.buffer.len() >= self.config.min_segments)
            || is_definite_terminator
            || state.buffer.len() >= self.config.max_segments;

        if should_emit {
            Some(Self::drain(&mut state))
        } else {
            None
        }
    }

    /// Emit whatever is buffered regardless of completeness — called
    /// when the combiner's timeout elapses or the session ends.
    pub fn force_emit(&self) -> Option<CombinedSentence> {
        let mut state = self.state.lock();
        if state.buffer.is_empty() {
            None
        } else {
            Some(Self::drain(&mut state))
        }
    }

    /// How long the oldest buffered segment has been waiting, for the
    /// orchestrator's timeout poll against `config.timeout_ms`.
    pub fn pending_age(&self) -> Option<Duration> {
        let state = self.state.lock();
        state.first_segment_at.map(|t| t.elapsed())
    }

    pub fn timed_out(&self) -> bool {
        self.pending_age()
            .is_some_and(|age| age >= Duration::from_millis(self.config.timeout_ms))
    }

    fn drain(state: &mut CombinerState) -> CombinedSentence {
        let segments = std::mem::take(&mut state.buffer);
        state.first_segment_at = None;
        let start_ts = segments.first().map(|s| s.timestamp).unwrap_or_else(chrono::Utc::now);
        let end_ts = segments.last().map(|s| s.timestamp).unwrap_or(start_ts);
        let segment_ids = segments.iter().map(|s| s.id.clone()).collect();
        let original_text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        CombinedSentence {
            id: uuid::Uuid::new_v4().to_string(),
            segment_ids,
            original_text,
            start_ts,
            end_ts,
            segment_count: segments.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(id: &str, text: &str) -> TranscriptSegment {
        TranscriptSegment {
            id: id.to_string(),
            text: text.to_string(),
            confidence: 0.95,
            is_final: true,
            start_ms: Some(0),
            end_ms: Some(100),
            language: "en".to_string(),
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn combines_once_min_segments_and_terminal_punctuation_met() {
        let combiner = SentenceCombiner::new(CombinerConfig {
            min_segments: 2,
            max_segments: 10,
            timeout_ms: 2_000,
        });
        assert!(combiner.push_final(segment("a", "Welcome everyone")).is_none());
        let combined = combiner.push_final(segment("b", "to the lecture.")).unwrap();
        assert_eq!(combined.segment_count, 2);
        assert_eq!(combined.original_text, "Welcome everyone to the lecture.");
    }

    #[test]
    fn single_definite_terminator_emits_regardless_of_min_segments() {
        let combiner = SentenceCombiner::new(CombinerConfig {
            min_segments: 2,
            max_segments: 10,
            timeout_ms: 2_000,
        });
        let combined = combiner.push_final(segment("a", "Hello!")).unwrap();
        assert_eq!(combined.segment_count, 1);
        assert_eq!(combined.original_text, "Hello!");
    }

    #[test]
    fn cjk_terminal_punctuation_is_recognized() {
        let combiner = SentenceCombiner::new(CombinerConfig {
            min_segments: 2,
            max_segments: 10,
            timeout_ms: 2_000,
        });
        let combined = combiner.push_final(segment("a", "こんにちは。")).unwrap();
        assert_eq!(combined.segment_count, 1);
    }

    #[test]
    fn trailing_conjunction_is_not_treated_as_complete() {
        let combiner = SentenceCombiner::new(CombinerConfig {
            min_segments: 1,
            max_segments: 10,
            timeout_ms: 2_000,
        });
        assert!(combiner.push_final(segment("a", "we packed apples, oranges, and")).is_none());
    }

    #[test]
    fn max_segments_forces_emission_without_punctuation() {
        let combiner = SentenceCombiner::new(CombinerConfig {
            min_segments: 2,
            max_segments: 2,
            timeout_ms: 2_000,
        });
        assert!(combiner.push_final(segment("a", "and then")).is_none());
        let combined = combiner.push_final(segment("b", "we continued")).unwrap();
        assert_eq!(combined.segment_count, 2);
    }

    #[test]
    fn force_emit_drains_partial_buffer() {
        let combiner = SentenceCombiner::new(CombinerConfig::default());
        combiner.push_final(segment("a", "trailing thought"));
        let combined = combiner.force_emit().unwrap();
        assert_eq!(combined.segment_count, 1);
        assert!(combiner.force_emit().is_none());
    }
}
