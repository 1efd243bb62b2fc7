//! Shared application state (§6 "Command/event channel"): one
//! `Orchestrator` per process plus the health registry `/health` polls.
//! Grounded on the teacher's `AppState` (`server/src/state.rs`) — a
//! cheaply `Clone`-able handle of `Arc`s passed to axum via
//! `.with_state`, minus the multi-tenant session map the teacher needs
//! and this single-lecture pipeline doesn't.

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use translate_events::HealthRegistry;
use translate_orchestrator::Orchestrator;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub health: Arc<HealthRegistry>,
    pub prometheus_handle: PrometheusHandle,
    /// §6 ASR wire protocol fixes `channels=1`; the sample rate is the
    /// one piece of audio framing the command/event channel still needs
    /// to know, to tag inbound binary frames before handing them to C1.
    pub asr_sample_rate_hz: u32,
}
