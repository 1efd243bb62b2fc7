//! Translation Queue Manager (C3, §4.3): a strict-priority, FIFO-within-
//! class dispatcher bounded by `max_concurrency` in-flight jobs and
//! `max_queue_size` pending ones. Built on `translate_core::QueuedJob`'s
//! `BinaryHeap` ordering; concurrency is bounded the way the teacher
//! bounds model concurrency in `speculative.rs` — a `Semaphore` sized to
//! the worker pool, acquired before a job starts.

use crate::prompt::translation_system_prompt;
use parking_lot::Mutex;
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Notify, OwnedSemaphorePermit, Semaphore};
use translate_config::QueueConfig;
use translate_core::error::{Error, Result};
use translate_core::traits::{GatewayRequest, LlmGateway, Purpose};
use translate_core::translation::{Priority, QueuedJob, TranslationJob, TranslationResult};

#[derive(Debug, Clone)]
pub enum QueueOutcome {
    Completed(TranslationResult),
    Failed { key_id: String, error: String },
    Overflow { key_id: String },
}

pub struct QueueManager {
    config: QueueConfig,
    heap: Mutex<BinaryHeap<QueuedJob>>,
    sequence: AtomicU64,
    semaphore: Arc<Semaphore>,
    disabled: AtomicBool,
    notify: Notify,
    retries: Mutex<HashMap<String, u32>>,
    gateway: Arc<dyn LlmGateway>,
    outcomes_tx: mpsc::Sender<QueueOutcome>,
}

impl QueueManager {
    pub fn new(
        config: QueueConfig,
        gateway: Arc<dyn LlmGateway>,
        outcomes_tx: mpsc::Sender<QueueOutcome>,
    ) -> Arc<Self> {
        Arc::new(Self {
            semaphore: Arc::new(Semaphore::new(config.max_concurrency)),
            heap: Mutex::new(BinaryHeap::new()),
            sequence: AtomicU64::new(0),
            disabled: AtomicBool::new(false),
            notify: Notify::new(),
            retries: Mutex::new(HashMap::new()),
            config,
            gateway,
            outcomes_tx,
        })
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst)
    }

    pub fn pending_len(&self) -> usize {
        self.heap.lock().len()
    }

    /// Start the background dispatch loop. Call once per queue instance.
    pub fn spawn_dispatch_loop(self: &Arc<Self>) {
        let this = self.clone();
        tokio::spawn(async move { this.dispatch_loop().await });
    }

    /// Admit a job. Applies the overflow policy (§4.3: evict the oldest
    /// `Low` priority job to make room) when the queue is already at
    /// `max_queue_size`; returns `QueueOverflow` if nothing evictable
    /// was found.
    pub fn enqueue(&self, job: TranslationJob) -> Result<()> {
        if self.disabled.load(Ordering::SeqCst) {
            return Err(Error::Validation(
                "queue disabled after an unauthorized provider response".to_string(),
            ));
        }
        let mut heap = self.heap.lock();
        if heap.len() >= self.config.max_queue_size && !evict_oldest_low(&mut heap) {
            return Err(Error::QueueOverflow);
        }
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        heap.push(QueuedJob { job, sequence });
        drop(heap);
        self.notify.notify_one();
        Ok(())
    }

    async fn dispatch_loop(self: Arc<Self>) {
        loop {
            if self.disabled.load(Ordering::SeqCst) {
                return;
            }
            let next = self.heap.lock().pop();
            let Some(queued) = next else {
                self.notify.notified().await;
                continue;
            };
            let permit = match self.semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };
            let attempt = {
                let mut retries = self.retries.lock();
                let counter = retries.entry(queued.job.key_id.clone()).or_insert(0);
                *counter += 1;
                *counter
            };
            let this = self.clone();
            tokio::spawn(async move {
                this.run_job(queued.job, attempt, permit).await;
            });
        }
    }

    async fn run_job(self: Arc<Self>, job: TranslationJob, attempt: u32, _permit: OwnedSemaphorePermit) {
        let max_attempts = match job.priority {
            Priority::Low => self.config.low_retries,
            Priority::Normal | Priority::High => self.config.normal_retries,
        };
        let started = Instant::now();
        let request = GatewayRequest {
            purpose: Purpose::Translation,
            system_prompt: translation_system_prompt(&job.src_lang, &job.tgt_lang),
            user_content: job.source_text.clone(),
            max_tokens: None,
        };

        match self.gateway.complete(request).await {
            Ok(response) => {
                self.retries.lock().remove(&job.key_id);
                let result = TranslationResult {
                    key_id: job.key_id.clone(),
                    translated_text: response.content,
                    model: response.model,
                    confidence: 1.0,
                    latency_ms: started.elapsed().as_millis() as u64,
                };
                let _ = self.outcomes_tx.send(QueueOutcome::Completed(result)).await;
            }
            Err(Error::Llm(message)) if is_unauthorized(&message) => {
                self.disabled.store(true, Ordering::SeqCst);
                self.retries.lock().remove(&job.key_id);
                let _ = self
                    .outcomes_tx
                    .send(QueueOutcome::Failed {
                        key_id: job.key_id.clone(),
                        error: message,
                    })
                    .await;
            }
            Err(e) => {
                if attempt < max_attempts {
                    let backoff = Duration::from_millis(200 * attempt as u64);
                    let this = self.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(backoff).await;
                        let _ = this.enqueue(job);
                    });
                } else {
                    self.retries.lock().remove(&job.key_id);
                    let _ = self
                        .outcomes_tx
                        .send(QueueOutcome::Failed {
                            key_id: job.key_id.clone(),
                            error: e.to_string(),
                        })
                        .await;
                }
            }
        }
    }
}

fn is_unauthorized(message: &str) -> bool {
    message.contains("401") || message.to_uppercase().contains("UNAUTHORIZED")
}

fn evict_oldest_low(heap: &mut BinaryHeap<QueuedJob>) -> bool {
    let items: Vec<QueuedJob> = std::mem::take(heap).into_vec();
    let oldest_low = items
        .iter()
        .filter(|q| q.job.priority == Priority::Low)
        .min_by_key(|q| q.sequence)
        .map(|q| q.sequence);

    let Some(oldest_low) = oldest_low else {
        *heap = items.into_iter().collect();
        return false;
    };

    *heap = items
        .into_iter()
        .filter(|q| q.sequence != oldest_low)
        .collect();
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_low_priority_job() {
        let mut heap = BinaryHeap::new();
        heap.push(QueuedJob {
            job: TranslationJob::new("low-1", "x", "en", "fr", Priority::Low),
            sequence: 0,
        });
        heap.push(QueuedJob {
            job: TranslationJob::new("low-2", "x", "en", "fr", Priority::Low),
            sequence: 1,
        });
        heap.push(QueuedJob {
            job: TranslationJob::new("normal-1", "x", "en", "fr", Priority::Normal),
            sequence: 2,
        });
        assert!(evict_oldest_low(&mut heap));
        let remaining: Vec<&str> = heap.iter().map(|q| q.job.key_id.as_str()).collect();
        assert!(!remaining.contains(&"low-1"));
        assert!(remaining.contains(&"low-2"));
        assert!(remaining.contains(&"normal-1"));
    }

    #[test]
    fn eviction_fails_when_nothing_low_priority() {
        let mut heap = BinaryHeap::new();
        heap.push(QueuedJob {
            job: TranslationJob::new("normal-1", "x", "en", "fr", Priority::Normal),
            sequence: 0,
        });
        assert!(!evict_oldest_low(&mut heap));
        assert_eq!(heap.len(), 1);
    }

    #[test]
    fn detects_unauthorized_messages() {
        assert!(is_unauthorized("HTTP 401: invalid key"));
        assert!(is_unauthorized("provider returned UNAUTHORIZED"));
        assert!(!is_unauthorized("HTTP 500: server error"));
    }
}
