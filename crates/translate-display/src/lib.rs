//! Synced Real-time Display Manager (C7, §4.7): owns the small window
//! of original/translation pairs shown on screen at once. Position and
//! opacity are a pure function of insertion order (`translate_core`'s
//! `Position`); this crate's job is keeping that order correct as
//! updates arrive out of lockstep (the translation for an older line
//! can finish after a newer line's original text appears) and evicting
//! overflow pairs no sooner than `min_display_time_ms` after they were
//! first shown.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use translate_config::DisplayConfig;
use translate_core::display::estimate_height;
use translate_core::{DisplayMeta, DisplayPair, OriginalSide, Position, TranslationSide};

/// Characters per line used for the height estimate (§4.7 sizing),
/// matched to the fixed-width lecture caption layout.
const CHARS_PER_LINE: usize = 60;

struct DisplayState {
    pairs: VecDeque<DisplayPair>,
}

pub struct DisplayManager {
    config: DisplayConfig,
    state: Mutex<DisplayState>,
}

impl DisplayManager {
    pub fn new(config: DisplayConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            state: Mutex::new(DisplayState {
                pairs: VecDeque::new(),
            }),
        })
    }

    /// Create or refresh a pair's original side. A new `segment_id`
    /// inserts a fresh pair at the front; existing pairs shift one
    /// position back.
    pub fn update_original(self: &Arc<Self>, segment_id: &str, text: &str, is_final: bool) -> DisplayPair {
        let now = chrono::Utc::now();
        let mut state = self.state.lock();

        if let Some(pair) = state.pairs.iter_mut().find(|p| p.pair_id == segment_id) {
            pair.original.text = text.to_string();
            pair.original.is_final = is_final;
            pair.original.ts = now;
            sync_height(pair);
            return pair.clone();
        }

        let pair = DisplayPair {
            pair_id: segment_id.to_string(),
            original: OriginalSide {
                text: text.to_string(),
                is_final,
                ts: now,
            },
            translation: TranslationSide {
                text: String::new(),
                is_complete: false,
                ts: now,
            },
            display: DisplayMeta {
                start_time: now,
                complete_time: None,
                position: Position::Recent,
                opacity: Position::Recent.opacity(),
                height: estimate_height(text, CHARS_PER_LINE),
            },
            segment_id: Some(segment_id.to_string()),
        };
        state.pairs.push_front(pair.clone());
        shift_positions(&mut state.pairs);
        let overflow = overflowing_pair(&state.pairs, self.config.max_display_pairs);
        drop(state);

        if let Some((pair_id, start_time)) = overflow {
            schedule_eviction(self.clone(), pair_id, start_time);
        }
        pair
    }

    /// Apply an interim translation delta. Rejected once the pair's
    /// translation has already completed (§4.7 invariant P6).
    pub fn update_translation(&self, key_id: &str, text: &str) -> Option<DisplayPair> {
        let mut state = self.state.lock();
        let pair = state.pairs.iter_mut().find(|p| p.pair_id == key_id)?;
        if pair.translation.is_complete {
            return None;
        }
        pair.translation.text = text.to_string();
        pair.translation.ts = chrono::Utc::now();
        sync_height(pair);
        Some(pair.clone())
    }

    /// Mark a pair's translation complete. Idempotent: a second call
    /// after completion is rejected rather than overwriting the final
    /// text (§4.7 invariant P6).
    pub fn complete_translation(self: &Arc<Self>, key_id: &str, text: &str) -> Option<DisplayPair> {
        let mut state = self.state.lock();
        let pair = state.pairs.iter_mut().find(|p| p.pair_id == key_id)?;
        if pair.translation.is_complete {
            return None;
        }
        let now = chrono::Utc::now();
        pair.translation.text = text.to_string();
        pair.translation.is_complete = true;
        pair.translation.ts = now;
        pair.display.complete_time = Some(now);
        sync_height(pair);
        let result = pair.clone();
        let overflow = overflowing_pair(&state.pairs, self.config.max_display_pairs);
        drop(state);

        if let Some((pair_id, complete_time)) = overflow {
            schedule_eviction(self.clone(), pair_id, complete_time);
        }
        Some(result)
    }

    pub fn reset(&self) {
        self.state.lock().pairs.clear();
    }

    /// Current pairs, most recent first.
    pub fn snapshot(&self) -> Vec<DisplayPair> {
        self.state.lock().pairs.iter().cloned().collect()
    }
}

fn sync_height(pair: &mut DisplayPair) {
    let original_height = estimate_height(&pair.original.text, CHARS_PER_LINE);
    let translation_height = estimate_height(&pair.translation.text, CHARS_PER_LINE);
    pair.display.height = original_height.max(translation_height);
}

/// Reassign `position`/`opacity` to every pair by its current slot
/// (§3: "a function of insertion order"). Slots beyond what `Position`
/// can express keep `Oldest`'s appearance until evicted.
fn shift_positions(pairs: &mut VecDeque<DisplayPair>) {
    for (idx, pair) in pairs.iter_mut().enumerate() {
        let position = match idx {
            0 => Position::Recent,
            1 => Position::Older,
            _ => Position::Oldest,
        };
        pair.display.position = position;
        pair.display.opacity = position.opacity();
    }
}

/// A pair is only evictable once its translation has completed —
/// §4.7's "cannot disappear before readable" invariant forbids evicting
/// a pair whose translation side is still blank or mid-stream. The
/// eviction timer is anchored to `complete_time`, not `start_time`, so
/// a slow translation still gets `min_display_time_ms` of readable time.
fn overflowing_pair(
    pairs: &VecDeque<DisplayPair>,
    max_display_pairs: usize,
) -> Option<(String, chrono::DateTime<chrono::Utc>)> {
    if pairs.len() <= max_display_pairs {
        return None;
    }
    let back = pairs.back()?;
    if !back.translation.is_complete {
        return None;
    }
    back.display
        .complete_time
        .map(|complete_time| (back.pair_id.clone(), complete_time))
}

fn schedule_eviction(
    manager: Arc<DisplayManager>,
    pair_id: String,
    complete_time: chrono::DateTime<chrono::Utc>,
) {
    let elapsed_ms = (chrono::Utc::now() - complete_time).num_milliseconds().max(0) as u64;
    let remaining = Duration::from_millis(
        manager
            .config
            .min_display_time_ms
            .saturating_sub(elapsed_ms),
    );
    tokio::spawn(async move {
        tokio::time::sleep(remaining).await;
        let mut state = manager.state.lock();
        if state.pairs.len() <= manager.config.max_display_pairs {
            return;
        }
        let still_overflowing = state
            .pairs
            .back()
            .is_some_and(|p| p.pair_id == pair_id && p.translation.is_complete);
        if still_overflowing {
            state.pairs.pop_back();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DisplayConfig {
        DisplayConfig {
            max_display_pairs: 3,
            min_display_time_ms: 1_500,
        }
    }

    #[test]
    fn new_segment_creates_pair_at_recent_position() {
        let manager = DisplayManager::new(config());
        let pair = manager.update_original("seg-1", "Hello", false);
        assert_eq!(pair.display.position, Position::Recent);
        assert_eq!(pair.display.opacity, 1.0);
    }

    #[test]
    fn subsequent_segments_shift_earlier_ones_back() {
        let manager = DisplayManager::new(config());
        manager.update_original("seg-1", "Hello", true);
        manager.update_original("seg-2", "World", true);
        let snapshot = manager.snapshot();
        assert_eq!(snapshot[0].pair_id, "seg-2");
        assert_eq!(snapshot[0].display.position, Position::Recent);
        assert_eq!(snapshot[1].pair_id, "seg-1");
        assert_eq!(snapshot[1].display.position, Position::Older);
    }

    #[test]
    fn translation_after_completion_is_rejected() {
        let manager = DisplayManager::new(config());
        manager.update_original("seg-1", "Hello", true);
        manager.complete_translation("seg-1", "Hola").unwrap();
        assert!(manager.complete_translation("seg-1", "Adios").is_none());
        let snapshot = manager.snapshot();
        assert_eq!(snapshot[0].translation.text, "Hola");
    }

    #[test]
    fn reset_clears_all_pairs() {
        let manager = DisplayManager::new(config());
        manager.update_original("seg-1", "Hello", true);
        manager.reset();
        assert!(manager.snapshot().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn overflow_pair_is_evicted_after_min_display_time() {
        let manager = DisplayManager::new(DisplayConfig {
            max_display_pairs: 1,
            min_display_time_ms: 200,
        });
        manager.update_original("seg-1", "first", true);
        manager.complete_translation("seg-1", "primero").unwrap();
        manager.update_original("seg-2", "second", true);
        manager.complete_translation("seg-2", "segundo").unwrap();
        assert_eq!(manager.snapshot().len(), 2);
        tokio::time::advance(Duration::from_millis(250)).await;
        tokio::task::yield_now().await;
        assert_eq!(manager.snapshot().len(), 1);
        assert_eq!(manager.snapshot()[0].pair_id, "seg-2");
    }

    #[tokio::test(start_paused = true)]
    async fn incomplete_translation_is_never_evicted() {
        let manager = DisplayManager::new(DisplayConfig {
            max_display_pairs: 1,
            min_display_time_ms: 200,
        });
        manager.update_original("seg-1", "first", true);
        manager.update_original("seg-2", "second", true);
        assert_eq!(manager.snapshot().len(), 2);
        tokio::time::advance(Duration::from_millis(250)).await;
        tokio::task::yield_now().await;
        assert_eq!(manager.snapshot().len(), 2, "seg-1's translation never completed, so it cannot be evicted");
    }
}
