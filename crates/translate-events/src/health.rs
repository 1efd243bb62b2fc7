//! Per-component health checks (§4.11) run on a registration model:
//! components register a `HealthCheck`, the registry polls each on
//! demand, and an unhealthy component gets up to `maxRecoveryAttempts`
//! recovery attempts before it's left marked unhealthy.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use translate_config::MetricsConfig;

#[async_trait]
pub trait HealthCheck: Send + Sync {
    fn name(&self) -> &str;
    async fn check(&self) -> bool;
    /// Attempt to bring the component back. Default: no recovery path.
    async fn recover(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentStatus {
    pub healthy: bool,
    pub recovery_attempts: u32,
}

struct Registered {
    check: Arc<dyn HealthCheck>,
    status: ComponentStatus,
}

pub struct HealthRegistry {
    max_recovery_attempts: u32,
    components: Mutex<HashMap<String, Registered>>,
}

impl HealthRegistry {
    pub fn new(config: &MetricsConfig) -> Arc<Self> {
        Arc::new(Self {
            max_recovery_attempts: config.max_recovery_attempts,
            components: Mutex::new(HashMap::new()),
        })
    }

    pub fn register(&self, check: Arc<dyn HealthCheck>) {
        let name = check.name().to_string();
        self.components.lock().insert(
            name,
            Registered {
                check,
                status: ComponentStatus {
                    healthy: true,
                    recovery_attempts: 0,
                },
            },
        );
    }

    /// Poll every registered component, attempting recovery on failure.
    /// Returns the resulting status per component.
    pub async fn run_checks(&self) -> HashMap<String, ComponentStatus> {
        let checks: Vec<(String, Arc<dyn HealthCheck>)> = self
            .components
            .lock()
            .iter()
            .map(|(name, r)| (name.clone(), r.check.clone()))
            .collect();

        for (name, check) in checks {
            let healthy = check.check().await;
            if healthy {
                self.set_status(&name, true, 0);
                continue;
            }

            let attempts = self.recovery_attempts(&name);
            if attempts < self.max_recovery_attempts {
                tracing::warn!(component = %name, attempt = attempts + 1, "health check failed, attempting recovery");
                let recovered = check.recover().await;
                self.set_status(&name, recovered, attempts + 1);
            } else {
                tracing::error!(component = %name, "health check failed, recovery attempts exhausted");
                self.set_status(&name, false, attempts);
            }
        }

        self.components
            .lock()
            .iter()
            .map(|(name, r)| (name.clone(), r.status))
            .collect()
    }

    pub fn status(&self, name: &str) -> Option<ComponentStatus> {
        self.components.lock().get(name).map(|r| r.status)
    }

    fn recovery_attempts(&self, name: &str) -> u32 {
        self.components
            .lock()
            .get(name)
            .map(|r| r.status.recovery_attempts)
            .unwrap_or(0)
    }

    fn set_status(&self, name: &str, healthy: bool, recovery_attempts: u32) {
        if let Some(r) = self.components.lock().get_mut(name) {
            r.status = ComponentStatus {
                healthy,
                recovery_attempts,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    struct FlakyComponent {
        name: &'static str,
        healthy: AtomicBool,
        recover_calls: AtomicU32,
    }

    #[async_trait]
    impl HealthCheck for FlakyComponent {
        fn name(&self) -> &str {
            self.name
        }

        async fn check(&self) -> bool {
            self.healthy.load(Ordering::SeqCst)
        }

        async fn recover(&self) -> bool {
            self.recover_calls.fetch_add(1, Ordering::SeqCst);
            false
        }
    }

    fn config(max_recovery_attempts: u32) -> MetricsConfig {
        MetricsConfig {
            collection_interval_ms: 5_000,
            retention_period_ms: 1,
            max_recovery_attempts,
        }
    }

    #[tokio::test]
    async fn healthy_component_reports_healthy() {
        let registry = HealthRegistry::new(&config(3));
        registry.register(Arc::new(FlakyComponent {
            name: "asr",
            healthy: AtomicBool::new(true),
            recover_calls: AtomicU32::new(0),
        }));
        let statuses = registry.run_checks().await;
        assert!(statuses["asr"].healthy);
    }

    #[tokio::test]
    async fn unhealthy_component_attempts_recovery_up_to_limit() {
        let registry = HealthRegistry::new(&config(2));
        let component = Arc::new(FlakyComponent {
            name: "llm",
            healthy: AtomicBool::new(false),
            recover_calls: AtomicU32::new(0),
        });
        registry.register(component.clone());

        registry.run_checks().await;
        registry.run_checks().await;
        registry.run_checks().await;

        assert_eq!(component.recover_calls.load(Ordering::SeqCst), 2);
        assert_eq!(registry.status("llm").unwrap().recovery_attempts, 2);
        assert!(!registry.status("llm").unwrap().healthy);
    }
}
