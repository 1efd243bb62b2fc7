//! Environment-driven configuration for the lecture translation
//! pipeline (§6 "Configuration").
//!
//! Every tunable named in the specification — ASR session parameters,
//! per-purpose LLM model/token/effort selection, queue bounds, combiner
//! and paragraph thresholds, summary word-count buckets, coalescer
//! timings, display bounds, metrics collection/retention — lives here
//! with its documented default, following the teacher's
//! `voice_agent_config::settings` layering (typed defaults, then an
//! environment overlay via the `config` crate).

pub mod constants;
pub mod settings;

pub use constants::{
    ASR_KEEPALIVE_MS, ASR_MAX_RECONNECT_ATTEMPTS, ASR_PROVIDER_URL,
    ASR_RECONNECT_INITIAL_BACKOFF_MS, ASR_RECONNECT_MAX_BACKOFF_MS, LLM_PROVIDER_URL,
};
pub use settings::{
    AsrConfig, CoalescerConfig, CombinerConfig, DisplayConfig, LlmConfig, MetricsConfig,
    ParagraphConfig, PurposeModelConfig, QueueConfig, ServerConfig, Settings, SummaryConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
