//! Stream Coalescer (C10, §4.10): smooths a rapid stream of interim
//! updates (e.g. streaming translation deltas) into display-worthy
//! commits — waiting `debounce_ms` after the last update, but never
//! longer than `force_commit_ms` since the first pending update for a
//! key. Each pending key is tracked by a generation counter the way the
//! ASR adapter's keep-alive timer checks `shutting_down` before firing,
//! so a commit scheduled against stale state becomes a no-op.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use translate_config::CoalescerConfig;

/// §4.10 policy (a): a key's text ending in sentence-terminal
/// punctuation commits immediately rather than waiting for debounce.
static TERMINAL_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[。．！？.!?][")'\]]*\s*$"#).unwrap());

fn ends_with_terminal_punctuation(text: &str) -> bool {
    TERMINAL_PUNCTUATION.is_match(text.trim_end())
}

struct PendingUpdate {
    text: String,
    first_pending_at: Instant,
    generation: u64,
}

#[derive(Debug, Clone)]
pub struct CoalescedUpdate {
    pub key: String,
    pub text: String,
}

pub struct StreamCoalescer {
    config: CoalescerConfig,
    pending: Mutex<HashMap<String, PendingUpdate>>,
    commits_tx: mpsc::Sender<CoalescedUpdate>,
}

impl StreamCoalescer {
    pub fn new(config: CoalescerConfig, commits_tx: mpsc::Sender<CoalescedUpdate>) -> Arc<Self> {
        Arc::new(Self {
            config,
            pending: Mutex::new(HashMap::new()),
            commits_tx,
        })
    }

    /// Record an interim update for `key`. Commits immediately if
    /// `is_final` is set, the text ends in terminal punctuation, or the
    /// force window has elapsed; otherwise (re)schedules a debounced
    /// commit per §4.10 policy (b).
    pub fn update(self: &Arc<Self>, key: String, text: String, is_final: bool) {
        let now = Instant::now();
        let commit_immediately = is_final || ends_with_terminal_punctuation(&text);
        let generation = {
            let mut pending = self.pending.lock();
            let entry = pending.entry(key.clone()).or_insert_with(|| PendingUpdate {
                text: String::new(),
                first_pending_at: now,
                generation: 0,
            });
            entry.text = text;
            entry.generation += 1;
            if commit_immediately
                || entry.first_pending_at.elapsed() >= Duration::from_millis(self.config.force_commit_ms)
            {
                entry.generation
            } else {
                let generation = entry.generation;
                drop(pending);
                self.schedule_debounce(key, generation);
                return;
            }
        };
        self.commit(&key, generation);
    }

    fn schedule_debounce(self: &Arc<Self>, key: String, generation: u64) {
        let this = self.clone();
        let debounce = Duration::from_millis(self.config.debounce_ms);
        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            this.commit_if_current(&key, generation);
        });
    }

    fn commit_if_current(&self, key: &str, generation: u64) {
        let is_current = self
            .pending
            .lock()
            .get(key)
            .is_some_and(|p| p.generation == generation);
        if is_current {
            self.commit(key, generation);
        }
    }

    fn commit(&self, key: &str, generation: u64) {
        let mut pending = self.pending.lock();
        let Some(entry) = pending.get(key) else { return };
        if entry.generation != generation {
            return;
        }
        let update = pending.remove(key).unwrap();
        drop(pending);
        let _ = self.commits_tx.try_send(CoalescedUpdate {
            key: key.to_string(),
            text: update.text,
        });
    }

    /// Force-commit whatever is pending for `key`, ignoring timing —
    /// used when the upstream source reports completion.
    pub fn flush(&self, key: &str) {
        let generation = self.pending.lock().get(key).map(|p| p.generation);
        if let Some(generation) = generation {
            self.commit(key, generation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn debounced_update_commits_after_quiet_period() {
        let (tx, mut rx) = mpsc::channel(8);
        let coalescer = StreamCoalescer::new(
            CoalescerConfig {
                debounce_ms: 160,
                force_commit_ms: 1_100,
            },
            tx,
        );
        coalescer.update("seg-1".to_string(), "Hola".to_string(), false);
        tokio::time::advance(Duration::from_millis(200)).await;
        let committed = rx.recv().await.unwrap();
        assert_eq!(committed.key, "seg-1");
        assert_eq!(committed.text, "Hola");
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_updates_reset_the_debounce_window() {
        let (tx, mut rx) = mpsc::channel(8);
        let coalescer = StreamCoalescer::new(
            CoalescerConfig {
                debounce_ms: 160,
                force_commit_ms: 1_100,
            },
            tx,
        );
        coalescer.update("seg-1".to_string(), "Hol".to_string(), false);
        tokio::time::advance(Duration::from_millis(100)).await;
        coalescer.update("seg-1".to_string(), "Hola".to_string(), false);
        tokio::time::advance(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
        tokio::time::advance(Duration::from_millis(100)).await;
        let committed = rx.recv().await.unwrap();
        assert_eq!(committed.text, "Hola");
    }

    #[tokio::test(start_paused = true)]
    async fn is_final_commits_immediately_without_debounce() {
        let (tx, mut rx) = mpsc::channel(8);
        let coalescer = StreamCoalescer::new(
            CoalescerConfig {
                debounce_ms: 10_000,
                force_commit_ms: 60_000,
            },
            tx,
        );
        coalescer.update("seg-1".to_string(), "Hola".to_string(), true);
        let committed = rx.recv().await.unwrap();
        assert_eq!(committed.text, "Hola");
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_punctuation_commits_immediately_without_debounce() {
        let (tx, mut rx) = mpsc::channel(8);
        let coalescer = StreamCoalescer::new(
            CoalescerConfig {
                debounce_ms: 10_000,
                force_commit_ms: 60_000,
            },
            tx,
        );
        coalescer.update("seg-1".to_string(), "Hola mundo.".to_string(), false);
        let committed = rx.recv().await.unwrap();
        assert_eq!(committed.text, "Hola mundo.");
    }

    #[tokio::test]
    async fn flush_commits_immediately() {
        let (tx, mut rx) = mpsc::channel(8);
        let coalescer = StreamCoalescer::new(
            CoalescerConfig {
                debounce_ms: 10_000,
                force_commit_ms: 60_000,
            },
            tx,
        );
        coalescer.update("seg-1".to_string(), "Hola".to_string(), false);
        coalescer.flush("seg-1");
        let committed = rx.recv().await.unwrap();
        assert_eq!(committed.text, "Hola");
    }
}
