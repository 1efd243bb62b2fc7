//! Lecture translation server entry point. Grounded on the teacher's
//! `main.rs`: load settings, init tracing, build application state,
//! bind axum, serve with graceful shutdown on SIGINT/SIGTERM — stripped
//! of the teacher's persistence/RAG/domain-config bring-up, which this
//! pipeline has no equivalent of.

mod health;
mod http;
mod state;
mod ws;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use metrics_exporter_prometheus::PrometheusBuilder;
use translate_config::{Settings, ASR_PROVIDER_URL, LLM_PROVIDER_URL};
use translate_events::HealthRegistry;
use translate_llm::OpenAiGateway;
use translate_orchestrator::Orchestrator;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("failed to load configuration: {e}. Using defaults.");
            Settings::default()
        }
    };
    if let Err(e) = settings.validate() {
        return Err(format!("invalid configuration: {e}").into());
    }

    tracing::info!(
        bind_addr = %settings.server.bind_addr,
        "starting lecture translation server"
    );

    let asr_api_key = std::env::var("ASR_API_KEY").unwrap_or_default();
    if asr_api_key.is_empty() {
        tracing::warn!("ASR_API_KEY not set; ASR connections will fail to authorize");
    }
    let llm_api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
    if llm_api_key.is_empty() {
        tracing::warn!("OPENAI_API_KEY not set; LLM gateway calls will fail to authorize");
    }

    let gateway: Arc<dyn translate_core::traits::LlmGateway> = Arc::new(OpenAiGateway::new(
        LLM_PROVIDER_URL.clone(),
        llm_api_key,
        settings.llm.clone(),
    ));

    let orchestrator = Orchestrator::new(
        settings.clone(),
        gateway,
        ASR_PROVIDER_URL.clone(),
        asr_api_key,
    );

    let health = HealthRegistry::new(&settings.metrics);
    health.register(Arc::new(health::LlmGatewayCheck::new(LLM_PROVIDER_URL.clone())));

    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("install prometheus recorder");

    let state = AppState {
        orchestrator,
        health,
        prometheus_handle,
        asr_sample_rate_hz: settings.asr.sample_rate,
    };

    let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
        .ok()
        .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
        .unwrap_or_default();

    let shutdown_orchestrator = state.orchestrator.clone();
    let app = http::create_router(state, &cors_origins);

    let addr: SocketAddr = settings.server.bind_addr.parse()?;
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_orchestrator))
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal(orchestrator: Arc<Orchestrator>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }

    if let Err(e) = orchestrator.stop_listening(None).await {
        tracing::warn!(error = %e, "error stopping active session during shutdown");
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "translate_server=info,translate_orchestrator=info,tower_http=info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
