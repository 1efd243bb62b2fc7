//! Translation job/result types (§3 "TranslationJob", "TranslationResult", §4.3).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Normal,
    High,
}

/// A unit of translation work. `key_id` already carries its routing
/// prefix (§3: bare for realtime, `history_`/`paragraph_` otherwise) so
/// the queue manager and gateway never need to know which pathway
/// produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationJob {
    pub key_id: String,
    pub source_text: String,
    pub src_lang: String,
    pub tgt_lang: String,
    pub priority: Priority,
    pub enqueue_ts: chrono::DateTime<chrono::Utc>,
}

impl TranslationJob {
    pub fn new(
        key_id: impl Into<String>,
        source_text: impl Into<String>,
        src_lang: impl Into<String>,
        tgt_lang: impl Into<String>,
        priority: Priority,
    ) -> Self {
        Self {
            key_id: key_id.into(),
            source_text: source_text.into(),
            src_lang: src_lang.into(),
            tgt_lang: tgt_lang.into(),
            priority,
            enqueue_ts: chrono::Utc::now(),
        }
    }
}

/// Orders a priority queue entry by priority first (high first), then
/// FIFO by enqueue time within a class — `BinaryHeap` is a max-heap so
/// `Ord` puts the job that should run *next* as the greatest element.
#[derive(Debug, Clone)]
pub struct QueuedJob {
    pub job: TranslationJob,
    /// Monotonically increasing submission counter, used to break ties
    /// FIFO within a priority class regardless of wall-clock resolution.
    pub sequence: u64,
}

impl PartialEq for QueuedJob {
    fn eq(&self, other: &Self) -> bool {
        self.job.priority == other.job.priority && self.sequence == other.sequence
    }
}
impl Eq for QueuedJob {}

impl PartialOrd for QueuedJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedJob {
    fn cmp(&self, other: &Self) -> Ordering {
        self.job
            .priority
            .cmp(&other.job.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    pub key_id: String,
    pub translated_text: String,
    pub model: String,
    pub confidence: f32,
    pub latency_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;

    #[test]
    fn heap_pops_high_priority_first_then_fifo() {
        let mut heap = BinaryHeap::new();
        heap.push(QueuedJob {
            job: TranslationJob::new("a", "x", "en", "fr", Priority::Low),
            sequence: 0,
        });
        heap.push(QueuedJob {
            job: TranslationJob::new("b", "x", "en", "fr", Priority::High),
            sequence: 1,
        });
        heap.push(QueuedJob {
            job: TranslationJob::new("c", "x", "en", "fr", Priority::Normal),
            sequence: 2,
        });
        heap.push(QueuedJob {
            job: TranslationJob::new("d", "x", "en", "fr", Priority::Normal),
            sequence: 3,
        });

        let order: Vec<&str> = std::iter::from_fn(|| heap.pop())
            .map(|q| match q.job.key_id.as_str() {
                "a" => "a",
                "b" => "b",
                "c" => "c",
                "d" => "d",
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(order, vec!["b", "c", "d", "a"]);
    }
}
