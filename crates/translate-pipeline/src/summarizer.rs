//! Progressive Summarizer (C6, §4.6): watches cumulative source word
//! count and wall-clock time to decide *when* a summary should be
//! generated. It never calls the LLM gateway itself — it hands the
//! orchestrator a trigger, which resolves the right `Purpose` and text
//! range and drives the actual `translate-llm` call.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use translate_config::SummaryConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryTriggerKind {
    Threshold,
    Periodic,
}

#[derive(Debug, Clone, Copy)]
pub struct SummaryTrigger {
    pub kind: SummaryTriggerKind,
    pub threshold_words: Option<u32>,
}

/// Chinese/Japanese/Korean text packs far more meaning per whitespace
/// token than the thresholds assume, so a character-counted language
/// scales its threshold up by `character_language_multiplier` (§4.6).
fn is_character_counted_language(lang: &str) -> bool {
    matches!(lang, "zh" | "ja" | "ko")
}

fn effective_threshold(threshold: u32, lang: &str, multiplier: f32) -> u32 {
    if is_character_counted_language(lang) {
        (threshold as f32 * multiplier).round() as u32
    } else {
        threshold
    }
}

pub struct ProgressiveSummarizer {
    config: SummaryConfig,
    fired_thresholds: Mutex<HashSet<u32>>,
    last_periodic_at: Mutex<Instant>,
}

impl ProgressiveSummarizer {
    pub fn new(config: SummaryConfig) -> Self {
        Self {
            config,
            fired_thresholds: Mutex::new(HashSet::new()),
            last_periodic_at: Mutex::new(Instant::now()),
        }
    }

    /// Check whether the session's cumulative word count has just
    /// crossed a threshold it hasn't already fired. Each threshold
    /// fires at most once per session (§4.6, invariant P4).
    pub fn check_threshold(&self, cumulative_words: u32, src_lang: &str) -> Option<SummaryTrigger> {
        let mut fired = self.fired_thresholds.lock();
        for &threshold in &self.config.thresholds {
            if fired.contains(&threshold) {
                continue;
            }
            let adjusted = effective_threshold(threshold, src_lang, self.config.character_language_multiplier);
            if cumulative_words >= adjusted {
                fired.insert(threshold);
                return Some(SummaryTrigger {
                    kind: SummaryTriggerKind::Threshold,
                    threshold_words: Some(threshold),
                });
            }
        }
        None
    }

    /// Check whether the periodic interval has elapsed, independent of
    /// word-count thresholds (§4.6 "periodic summaries").
    pub fn check_periodic(&self) -> Option<SummaryTrigger> {
        let mut last = self.last_periodic_at.lock();
        if last.elapsed() >= Duration::from_millis(self.config.periodic_interval_ms) {
            *last = Instant::now();
            Some(SummaryTrigger {
                kind: SummaryTriggerKind::Periodic,
                threshold_words: None,
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SummaryConfig {
        SummaryConfig {
            thresholds: vec![400, 800],
            periodic_interval_ms: 600_000,
            character_language_multiplier: 4.0,
        }
    }

    #[test]
    fn fires_each_threshold_once() {
        let summarizer = ProgressiveSummarizer::new(config());
        assert!(summarizer.check_threshold(399, "en").is_none());
        let trigger = summarizer.check_threshold(400, "en").unwrap();
        assert_eq!(trigger.threshold_words, Some(400));
        assert!(summarizer.check_threshold(450, "en").is_none());
    }

    #[test]
    fn character_language_scales_threshold() {
        let summarizer = ProgressiveSummarizer::new(config());
        assert!(summarizer.check_threshold(500, "zh").is_none());
        let trigger = summarizer.check_threshold(1600, "zh").unwrap();
        assert_eq!(trigger.threshold_words, Some(400));
    }

    #[test]
    fn periodic_trigger_respects_interval() {
        let mut cfg = config();
        cfg.periodic_interval_ms = 0;
        let summarizer = ProgressiveSummarizer::new(cfg);
        assert!(summarizer.check_periodic().is_some());
    }
}
