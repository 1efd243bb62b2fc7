//! Metrics & Health (C11, §4.11). Counters double-publish: once into an
//! in-process registry that backs alert thresholds and the snapshot
//! buffer this module owns, and once to the `metrics` crate's global
//! recorder so the Prometheus exporter surfaces them externally.

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use translate_config::MetricsConfig;

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub at: chrono::DateTime<chrono::Utc>,
    pub total_segments: u64,
    pub errors_by_kind: HashMap<String, u64>,
    pub ui_updates_emitted: u64,
    pub ui_updates_suppressed: u64,
    pub coalescers_created: u64,
    pub coalescers_destroyed: u64,
    pub first_paint_p50_ms: Option<u64>,
    pub processing_time_p50_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    FirstPaintSlow { ms: u64 },
    UiReductionLow { ratio: f32 },
    ErrorRateHigh { rate: f32 },
    HeapUsageHigh { bytes: u64 },
}

struct Counters {
    total_segments: AtomicU64,
    errors_by_kind: Mutex<HashMap<String, u64>>,
    ui_updates_emitted: AtomicU64,
    ui_updates_suppressed: AtomicU64,
    coalescers_created: AtomicU64,
    coalescers_destroyed: AtomicU64,
}

pub struct MetricsRegistry {
    config: MetricsConfig,
    counters: Counters,
    first_paint_samples: Mutex<VecDeque<u64>>,
    processing_times: Mutex<VecDeque<u64>>,
    snapshots: Mutex<VecDeque<Snapshot>>,
}

const PROCESSING_TIME_WINDOW: usize = 1000;

impl MetricsRegistry {
    pub fn new(config: MetricsConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            counters: Counters {
                total_segments: AtomicU64::new(0),
                errors_by_kind: Mutex::new(HashMap::new()),
                ui_updates_emitted: AtomicU64::new(0),
                ui_updates_suppressed: AtomicU64::new(0),
                coalescers_created: AtomicU64::new(0),
                coalescers_destroyed: AtomicU64::new(0),
            },
            first_paint_samples: Mutex::new(VecDeque::new()),
            processing_times: Mutex::new(VecDeque::new()),
            snapshots: Mutex::new(VecDeque::new()),
        })
    }

    pub fn record_segment(&self) {
        self.counters.total_segments.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("translate_segments_total").increment(1);
    }

    pub fn record_error(&self, kind: &str) {
        *self
            .counters
            .errors_by_kind
            .lock()
            .entry(kind.to_string())
            .or_insert(0) += 1;
        metrics::counter!("translate_errors_total", "kind" => kind.to_string()).increment(1);
    }

    pub fn record_ui_update(&self, emitted: bool) {
        if emitted {
            self.counters.ui_updates_emitted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.counters
                .ui_updates_suppressed
                .fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_coalescer_created(&self) {
        self.counters.coalescers_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_coalescer_destroyed(&self) {
        self.counters
            .coalescers_destroyed
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_first_paint(&self, ms: u64) {
        self.first_paint_samples.lock().push_back(ms);
        metrics::histogram!("translate_first_paint_ms").record(ms as f64);
    }

    pub fn record_processing_time(&self, ms: u64) {
        let mut times = self.processing_times.lock();
        times.push_back(ms);
        while times.len() > PROCESSING_TIME_WINDOW {
            times.pop_front();
        }
        metrics::histogram!("translate_processing_time_ms").record(ms as f64);
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            at: chrono::Utc::now(),
            total_segments: self.counters.total_segments.load(Ordering::Relaxed),
            errors_by_kind: self.counters.errors_by_kind.lock().clone(),
            ui_updates_emitted: self.counters.ui_updates_emitted.load(Ordering::Relaxed),
            ui_updates_suppressed: self.counters.ui_updates_suppressed.load(Ordering::Relaxed),
            coalescers_created: self.counters.coalescers_created.load(Ordering::Relaxed),
            coalescers_destroyed: self.counters.coalescers_destroyed.load(Ordering::Relaxed),
            first_paint_p50_ms: median(&self.first_paint_samples.lock()),
            processing_time_p50_ms: median(&self.processing_times.lock()),
        }
    }

    /// Push the current snapshot into the retained circular buffer and
    /// drop anything older than `retentionPeriodMs`.
    pub fn push_snapshot(&self) {
        let snapshot = self.snapshot();
        let cutoff = snapshot.at
            - chrono::Duration::milliseconds(self.config.retention_period_ms as i64);
        let mut snapshots = self.snapshots.lock();
        snapshots.push_back(snapshot);
        while snapshots.front().is_some_and(|s| s.at < cutoff) {
            snapshots.pop_front();
        }
    }

    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.snapshots.lock().iter().cloned().collect()
    }

    pub fn spawn_collector(self: &Arc<Self>) {
        let this = self.clone();
        let interval = Duration::from_millis(self.config.collection_interval_ms);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                this.push_snapshot();
            }
        });
    }

    /// Evaluate §4.11's fixed thresholds against a snapshot plus an
    /// externally-measured heap size (the registry has no way to sample
    /// process memory itself).
    pub fn check_alerts(&self, snapshot: &Snapshot, heap_bytes: u64) -> Vec<Alert> {
        let mut alerts = Vec::new();

        if let Some(p50) = snapshot.first_paint_p50_ms {
            if p50 > 1_000 {
                alerts.push(Alert::FirstPaintSlow { ms: p50 });
            }
        }

        let total_ui = snapshot.ui_updates_emitted + snapshot.ui_updates_suppressed;
        if total_ui > 0 {
            let reduction = snapshot.ui_updates_suppressed as f32 / total_ui as f32;
            if reduction < 0.5 {
                alerts.push(Alert::UiReductionLow { ratio: reduction });
            }
        }

        let total_errors: u64 = snapshot.errors_by_kind.values().sum();
        if snapshot.total_segments > 0 {
            let rate = total_errors as f32 / snapshot.total_segments as f32;
            if rate > 0.05 {
                alerts.push(Alert::ErrorRateHigh { rate });
            }
        }

        if heap_bytes > 500 * 1024 * 1024 {
            alerts.push(Alert::HeapUsageHigh { bytes: heap_bytes });
        }

        alerts
    }
}

fn median(samples: &VecDeque<u64>) -> Option<u64> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted: Vec<u64> = samples.iter().copied().collect();
    sorted.sort_unstable();
    Some(sorted[sorted.len() / 2])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MetricsConfig {
        MetricsConfig {
            collection_interval_ms: 5_000,
            retention_period_ms: 24 * 60 * 60 * 1000,
            max_recovery_attempts: 3,
        }
    }

    #[test]
    fn snapshot_reflects_recorded_counters() {
        let registry = MetricsRegistry::new(config());
        registry.record_segment();
        registry.record_segment();
        registry.record_error("ASR_TIMEOUT");
        let snapshot = registry.snapshot();
        assert_eq!(snapshot.total_segments, 2);
        assert_eq!(snapshot.errors_by_kind.get("ASR_TIMEOUT"), Some(&1));
    }

    #[test]
    fn first_paint_alert_fires_above_one_second() {
        let registry = MetricsRegistry::new(config());
        registry.record_first_paint(1_200);
        let snapshot = registry.snapshot();
        let alerts = registry.check_alerts(&snapshot, 0);
        assert!(alerts.contains(&Alert::FirstPaintSlow { ms: 1_200 }));
    }

    #[test]
    fn heap_alert_fires_above_500mb() {
        let registry = MetricsRegistry::new(config());
        let snapshot = registry.snapshot();
        let alerts = registry.check_alerts(&snapshot, 600 * 1024 * 1024);
        assert!(matches!(alerts[0], Alert::HeapUsageHigh { .. }));
    }

    #[test]
    fn error_rate_alert_respects_five_percent_threshold() {
        let registry = MetricsRegistry::new(config());
        for _ in 0..100 {
            registry.record_segment();
        }
        for _ in 0..10 {
            registry.record_error("LLM_TIMEOUT");
        }
        let snapshot = registry.snapshot();
        let alerts = registry.check_alerts(&snapshot, 0);
        assert!(alerts
            .iter()
            .any(|a| matches!(a, Alert::ErrorRateHigh { .. })));
    }

    #[test]
    fn retention_prunes_old_snapshots() {
        let mut short_retention = config();
        short_retention.retention_period_ms = 0;
        let registry = MetricsRegistry::new(short_retention);
        registry.push_snapshot();
        registry.push_snapshot();
        assert!(registry.snapshots().len() <= 1);
    }
}
