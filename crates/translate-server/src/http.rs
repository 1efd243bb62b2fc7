//! HTTP surface: health/readiness probes, the Prometheus exporter, and
//! the WebSocket upgrade for the command/event channel. Grounded on the
//! teacher's `create_router`/`build_cors_layer` (`server/src/http.rs`):
//! a permissive-by-default CORS layer driven by config, `TraceLayer`,
//! and a health check that reports per-dependency status rather than a
//! single boolean.

use axum::{
    extract::State,
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::ws;

pub fn create_router(state: AppState, cors_origins: &[String]) -> Router {
    let cors_layer = build_cors_layer(cors_origins);

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        .route("/ws", get(ws::handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        tracing::warn!("no CORS origins configured, allowing all origins");
        return CorsLayer::permissive();
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!(origin, "invalid CORS origin, skipping");
                None
            })
        })
        .collect();

    if parsed.is_empty() {
        tracing::error!("all configured CORS origins are invalid, falling back to permissive");
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

/// Runs every registered `HealthCheck` (§4.11) and reports per-component
/// status; `SERVICE_UNAVAILABLE` if any component is unhealthy.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let statuses = state.health.run_checks().await;
    let all_healthy = statuses.values().all(|s| s.healthy);

    let checks: serde_json::Map<String, serde_json::Value> = statuses
        .into_iter()
        .map(|(name, status)| {
            (
                name,
                serde_json::json!({
                    "healthy": status.healthy,
                    "recoveryAttempts": status.recovery_attempts,
                }),
            )
        })
        .collect();

    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(serde_json::json!({
            "status": if all_healthy { "healthy" } else { "degraded" },
            "checks": checks,
        })),
    )
}

/// Readiness is narrower than health: only "can accept a startListening
/// command right now", i.e. no session already in flight.
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let ready = !state.orchestrator.is_listening();
    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status_code,
        Json(serde_json::json!({
            "status": if ready { "ready" } else { "busy" },
            "listening": state.orchestrator.is_listening(),
        })),
    )
}

async fn metrics_handler(State(state): State<AppState>) -> String {
    state.prometheus_handle.render()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permissive_when_no_origins_configured() {
        let layer = build_cors_layer(&[]);
        let _ = layer;
    }
}
