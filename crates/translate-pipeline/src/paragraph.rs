//! Paragraph Builder (C5, §4.5): groups final segments into paragraphs
//! closed by elapsed duration, a silence gap, or a detected topic
//! transition cue, and produces a disfluency-stripped `cleaned_text`
//! alongside the raw transcript.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::{Regex, RegexBuilder};
use std::time::{Duration, Instant};
use translate_config::ParagraphConfig;
use translate_core::{Paragraph, TranscriptSegment};

static TRANSITION_CUE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"^(now|next|moving on|so|alright|okay so|in conclusion|to summarize|finally)\b")
        .case_insensitive(true)
        .build()
        .unwrap()
});

static DISFLUENCY: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"\b(um+|uh+|erm+|you know|i mean)\b")
        .case_insensitive(true)
        .build()
        .unwrap()
});

static EXTRA_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

fn opens_new_paragraph(text: &str) -> bool {
    TRANSITION_CUE.is_match(text.trim_start())
}

fn clean_disfluencies(text: &str) -> String {
    let stripped = DISFLUENCY.replace_all(text, "");
    EXTRA_WHITESPACE.replace_all(stripped.trim(), " ").to_string()
}

#[derive(Default)]
struct ParagraphState {
    segments: Vec<TranscriptSegment>,
    started_at: Option<Instant>,
}

pub struct ParagraphBuilder {
    config: ParagraphConfig,
    state: Mutex<ParagraphState>,
}

impl ParagraphBuilder {
    pub fn new(config: ParagraphConfig) -> Self {
        Self {
            config,
            state: Mutex::new(ParagraphState::default()),
        }
    }

    /// Feed one final segment. If it opens a new paragraph (a detected
    /// transition cue) and the buffered paragraph has run at least
    /// `min_duration_ms`, the prior paragraph closes first and the new
    /// segment starts the next one (§4.5 rule (a): elapsed ≥
    /// `min_duration_ms` AND a natural boundary hits).
    pub fn push_final(&self, segment: TranscriptSegment) -> Option<Paragraph> {
        let mut state = self.state.lock();
        let meets_min_duration = state
            .started_at
            .is_some_and(|t| t.elapsed() >= Duration::from_millis(self.config.min_duration_ms));
        let closed = if !state.segments.is_empty() && meets_min_duration && opens_new_paragraph(&segment.text)
        {
            Some(Self::drain(&mut state))
        } else {
            None
        };
        if state.segments.is_empty() {
            state.started_at = Some(Instant::now());
        }
        state.segments.push(segment);
        closed
    }

    /// Close the current paragraph if the silence gap since the last
    /// segment exceeds the configured threshold (§4.5).
    pub fn close_on_silence(&self, silence_gap_ms: u64) -> Option<Paragraph> {
        if silence_gap_ms < self.config.silence_threshold_ms {
            return None;
        }
        let mut state = self.state.lock();
        if state.segments.is_empty() {
            None
        } else {
            Some(Self::drain(&mut state))
        }
    }

    /// Close the current paragraph if it has run for at least
    /// `max_duration_ms` (§4.5).
    pub fn close_on_duration(&self) -> Option<Paragraph> {
        let mut state = self.state.lock();
        let elapsed = state.started_at.map(|t| t.elapsed()).unwrap_or_default();
        if state.segments.is_empty() || elapsed < Duration::from_millis(self.config.max_duration_ms) {
            return None;
        }
        Some(Self::drain(&mut state))
    }

    /// Whether the buffered paragraph has at least run `min_duration_ms`
    /// — below this, silence/duration closure is suppressed (§4.5,
    /// avoids pathologically short paragraphs).
    pub fn meets_min_duration(&self) -> bool {
        let state = self.state.lock();
        state
            .started_at
            .map(|t| t.elapsed() >= Duration::from_millis(self.config.min_duration_ms))
            .unwrap_or(false)
    }

    pub fn force_close(&self) -> Option<Paragraph> {
        let mut state = self.state.lock();
        if state.segments.is_empty() {
            None
        } else {
            Some(Self::drain(&mut state))
        }
    }

    fn drain(state: &mut ParagraphState) -> Paragraph {
        let segments = std::mem::take(&mut state.segments);
        state.started_at = None;
        let raw_text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let cleaned_text = clean_disfluencies(&raw_text);
        let word_count = segments.iter().map(TranscriptSegment::word_count).sum();
        let start_ms = segments.first().and_then(|s| s.start_ms).unwrap_or(0);
        let end_ms = segments.last().and_then(|s| s.end_ms).unwrap_or(start_ms);
        Paragraph {
            id: uuid::Uuid::new_v4().to_string(),
            segments,
            raw_text,
            cleaned_text: Some(cleaned_text),
            start_ms,
            end_ms,
            word_count,
            translated_text: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(id: &str, text: &str, start_ms: u64) -> TranscriptSegment {
        TranscriptSegment {
            id: id.to_string(),
            text: text.to_string(),
            confidence: 0.9,
            is_final: true,
            start_ms: Some(start_ms),
            end_ms: Some(start_ms + 500),
            language: "en".to_string(),
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn transition_cue_closes_prior_paragraph_once_min_duration_elapsed() {
        let config = ParagraphConfig {
            min_duration_ms: 0,
            ..ParagraphConfig::default()
        };
        let builder = ParagraphBuilder::new(config);
        assert!(builder.push_final(segment("a", "Let's talk about gradients.", 0)).is_none());
        let closed = builder
            .push_final(segment("b", "Now, moving to backpropagation.", 1000))
            .unwrap();
        assert_eq!(closed.segments.len(), 1);
        assert_eq!(closed.raw_text, "Let's talk about gradients.");
    }

    #[test]
    fn transition_cue_is_ignored_before_min_duration_elapses() {
        let config = ParagraphConfig {
            min_duration_ms: 20_000,
            ..ParagraphConfig::default()
        };
        let builder = ParagraphBuilder::new(config);
        assert!(builder.push_final(segment("a", "Let's talk about gradients.", 0)).is_none());
        assert!(builder
            .push_final(segment("b", "Now, moving to backpropagation.", 1000))
            .is_none());
        let paragraph = builder.force_close().unwrap();
        assert_eq!(paragraph.segments.len(), 2);
    }

    #[test]
    fn cleans_disfluencies_from_raw_text() {
        let builder = ParagraphBuilder::new(ParagraphConfig::default());
        builder.push_final(segment("a", "um so this is, uh, the idea", 0));
        let paragraph = builder.force_close().unwrap();
        assert_eq!(
            paragraph.cleaned_text.as_deref(),
            Some("so this is, , the idea")
        );
    }

    #[test]
    fn silence_below_threshold_does_not_close() {
        let builder = ParagraphBuilder::new(ParagraphConfig::default());
        builder.push_final(segment("a", "still talking", 0));
        assert!(builder.close_on_silence(500).is_none());
    }
}
