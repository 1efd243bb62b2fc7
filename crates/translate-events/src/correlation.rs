//! Correlation ID map (§4.9): every command gets or is assigned an ID
//! of the shape `ipc-<ts>-<rand>`, held for 30 s so a late event can
//! still be attributed to the command that triggered it, then swept.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

const TTL: Duration = Duration::from_secs(30);

pub fn new_correlation_id() -> String {
    format!(
        "ipc-{}-{:06x}",
        chrono::Utc::now().timestamp_millis(),
        rand::random::<u32>() & 0xffffff
    )
}

struct Entry {
    expires_at: Instant,
}

pub struct CorrelationMap {
    entries: Mutex<HashMap<String, Entry>>,
}

impl CorrelationMap {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: Mutex::new(HashMap::new()),
        })
    }

    /// Record a correlation ID, resolving one if the command didn't
    /// supply one.
    pub fn track(&self, correlation_id: Option<&str>) -> String {
        let id = correlation_id
            .map(|s| s.to_string())
            .unwrap_or_else(new_correlation_id);
        self.entries.lock().insert(
            id.clone(),
            Entry {
                expires_at: Instant::now() + TTL,
            },
        );
        id
    }

    pub fn is_live(&self, correlation_id: &str) -> bool {
        self.entries
            .lock()
            .get(correlation_id)
            .is_some_and(|e| e.expires_at > Instant::now())
    }

    /// Drop everything past its TTL. Intended to run on a periodic
    /// background tick alongside keep-alive and summary timers (§5).
    pub fn sweep(&self) {
        let now = Instant::now();
        self.entries.lock().retain(|_, e| e.expires_at > now);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) {
        let this = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                this.sweep();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_supplied_correlation_id() {
        let map = CorrelationMap::new();
        let id = map.track(Some("ipc-123-abcdef"));
        assert_eq!(id, "ipc-123-abcdef");
        assert!(map.is_live(&id));
    }

    #[test]
    fn assigns_id_when_absent() {
        let map = CorrelationMap::new();
        let id = map.track(None);
        assert!(id.starts_with("ipc-"));
        assert!(map.is_live(&id));
    }

    #[test]
    fn sweep_drops_expired_entries() {
        let map = CorrelationMap::new();
        map.entries.lock().insert(
            "stale".to_string(),
            Entry {
                expires_at: Instant::now() - Duration::from_secs(1),
            },
        );
        map.sweep();
        assert!(!map.is_live("stale"));
    }
}
