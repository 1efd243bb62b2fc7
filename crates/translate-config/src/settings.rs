//! Main settings module (§6 "Configuration").
//!
//! Layered the way the teacher's `voice_agent_config::settings` does:
//! typed defaults on every field, then an environment overlay via the
//! `config` crate, then `validate()` before the orchestrator is allowed
//! to start a session.

use crate::ConfigError;
use config::{Config, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsrConfig {
    #[serde(default = "default_asr_model")]
    pub model: String,
    #[serde(default = "default_endpointing_ms")]
    pub endpointing_ms: u32,
    #[serde(default = "default_utterance_end_ms")]
    pub utterance_end_ms: u32,
    #[serde(default = "default_true")]
    pub interim: bool,
    #[serde(default = "default_true")]
    pub smart_format: bool,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

fn default_asr_model() -> String {
    std::env::var("DG_MODEL").unwrap_or_else(|_| "nova-2".to_string())
}
fn default_endpointing_ms() -> u32 {
    std::env::var("DG_ENDPOINTING")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(300)
}
fn default_utterance_end_ms() -> u32 {
    std::env::var("DG_UTTERANCE_END_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(1000)
}
fn default_sample_rate() -> u32 {
    16_000
}
fn default_true() -> bool {
    true
}

impl Default for AsrConfig {
    fn default() -> Self {
        Self {
            model: default_asr_model(),
            endpointing_ms: default_endpointing_ms(),
            utterance_end_ms: default_utterance_end_ms(),
            interim: true,
            smart_format: true,
            sample_rate: default_sample_rate(),
        }
    }
}

/// Per-purpose model name, max tokens, and fixed reasoning effort
/// (§4.4). One entry per `translate_core::Purpose` variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurposeModelConfig {
    pub model: String,
    pub max_tokens: u32,
    pub reasoning_effort: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub translation: PurposeModelConfig,
    pub summary: PurposeModelConfig,
    pub summary_translate: PurposeModelConfig,
    pub user_translate: PurposeModelConfig,
    pub vocabulary: PurposeModelConfig,
    pub report: PurposeModelConfig,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
fn env_u32_or(key: &str, default: u32) -> u32 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            translation: PurposeModelConfig {
                model: env_or("OPENAI_MODEL_TRANSLATE", "gpt-5-mini"),
                max_tokens: env_u32_or("OPENAI_TRANSLATE_MAX_TOKENS", 1500),
                reasoning_effort: "minimal".to_string(),
                timeout_secs: 7,
            },
            summary: PurposeModelConfig {
                model: env_or("OPENAI_MODEL_SUMMARY", "gpt-5"),
                max_tokens: env_u32_or("OPENAI_SUMMARY_MAX_TOKENS", 1500),
                reasoning_effort: "low".to_string(),
                timeout_secs: 15,
            },
            summary_translate: PurposeModelConfig {
                model: env_or("OPENAI_MODEL_TRANSLATE", "gpt-5-mini"),
                max_tokens: env_u32_or("OPENAI_TRANSLATE_MAX_TOKENS", 1500),
                reasoning_effort: "minimal".to_string(),
                timeout_secs: 15,
            },
            user_translate: PurposeModelConfig {
                model: env_or("OPENAI_MODEL_TRANSLATE", "gpt-5-mini"),
                max_tokens: env_u32_or("OPENAI_TRANSLATE_MAX_TOKENS", 1500),
                reasoning_effort: "minimal".to_string(),
                timeout_secs: 7,
            },
            vocabulary: PurposeModelConfig {
                model: env_or("OPENAI_MODEL_VOCAB", "gpt-5"),
                max_tokens: env_u32_or("OPENAI_VOCAB_MAX_TOKENS", 1500),
                reasoning_effort: "low".to_string(),
                timeout_secs: 15,
            },
            report: PurposeModelConfig {
                model: env_or("OPENAI_MODEL_REPORT", "gpt-5"),
                max_tokens: env_u32_or("OPENAI_REPORT_MAX_TOKENS", 8192),
                reasoning_effort: "high".to_string(),
                timeout_secs: 60,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: usize,
    #[serde(default = "default_normal_retries")]
    pub normal_retries: u32,
    #[serde(default = "default_low_retries")]
    pub low_retries: u32,
}
fn default_max_concurrency() -> usize {
    3
}
fn default_max_queue_size() -> usize {
    100
}
fn default_normal_retries() -> u32 {
    2
}
fn default_low_retries() -> u32 {
    3
}
impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            max_queue_size: default_max_queue_size(),
            normal_retries: default_normal_retries(),
            low_retries: default_low_retries(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CombinerConfig {
    #[serde(default = "default_min_segments")]
    pub min_segments: usize,
    #[serde(default = "default_max_segments")]
    pub max_segments: usize,
    #[serde(default = "default_combiner_timeout_ms")]
    pub timeout_ms: u64,
}
fn default_min_segments() -> usize {
    2
}
fn default_max_segments() -> usize {
    10
}
fn default_combiner_timeout_ms() -> u64 {
    2_000
}
impl Default for CombinerConfig {
    fn default() -> Self {
        Self {
            min_segments: default_min_segments(),
            max_segments: default_max_segments(),
            timeout_ms: default_combiner_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ParagraphConfig {
    pub min_duration_ms: u64,
    pub max_duration_ms: u64,
    pub silence_threshold_ms: u64,
}
impl Default for ParagraphConfig {
    fn default() -> Self {
        Self {
            min_duration_ms: 20_000,
            max_duration_ms: 60_000,
            silence_threshold_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    #[serde(default = "default_thresholds")]
    pub thresholds: Vec<u32>,
    #[serde(default = "default_interval_ms")]
    pub periodic_interval_ms: u64,
    #[serde(default = "default_char_multiplier")]
    pub character_language_multiplier: f32,
}
fn default_thresholds() -> Vec<u32> {
    translate_core::DEFAULT_SUMMARY_THRESHOLDS.to_vec()
}
fn default_interval_ms() -> u64 {
    env_u32_or("SUMMARY_INTERVAL_MS", 600_000) as u64
}
fn default_char_multiplier() -> f32 {
    std::env::var("CHARACTER_LANGUAGE_MULTIPLIER")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(4.0)
}
impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            thresholds: default_thresholds(),
            periodic_interval_ms: default_interval_ms(),
            character_language_multiplier: default_char_multiplier(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CoalescerConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_force_commit_ms")]
    pub force_commit_ms: u64,
}
fn default_debounce_ms() -> u64 {
    env_u32_or("STREAM_COALESCER_DEBOUNCE_MS", 160) as u64
}
fn default_force_commit_ms() -> u64 {
    env_u32_or("STREAM_COALESCER_FORCE_COMMIT_MS", 1100) as u64
}
impl Default for CoalescerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            force_commit_ms: default_force_commit_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub max_display_pairs: usize,
    pub min_display_time_ms: u64,
}
impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_display_pairs: 3,
            min_display_time_ms: 1_500,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub collection_interval_ms: u64,
    pub retention_period_ms: u64,
    pub max_recovery_attempts: u32,
}
impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            collection_interval_ms: 5_000,
            retention_period_ms: 24 * 60 * 60 * 1000,
            max_recovery_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind_addr: String,
}
fn default_bind() -> String {
    "0.0.0.0:8088".to_string()
}
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind(),
        }
    }
}

/// Top-level settings aggregate, assembled the way
/// `voice_agent_config::Settings` composes its sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub asr: AsrConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub combiner: CombinerConfig,
    #[serde(default)]
    pub paragraph: ParagraphConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub coalescer: CoalescerConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load defaults overlaid with any `TRANSLATE_` prefixed environment
    /// variables (e.g. `TRANSLATE_SERVER__BIND_ADDR`).
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Config::try_from(&Settings::default())?;
        let built = Config::builder()
            .add_source(defaults)
            .add_source(Environment::with_prefix("TRANSLATE").separator("__"))
            .build()?;
        Ok(built.try_deserialize()?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue.max_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "queue.max_concurrency".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.queue.max_queue_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "queue.max_queue_size".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.combiner.min_segments == 0 || self.combiner.min_segments > self.combiner.max_segments {
            return Err(ConfigError::InvalidValue {
                field: "combiner.min_segments".to_string(),
                message: "must be >= 1 and <= max_segments".to_string(),
            });
        }
        if self.paragraph.min_duration_ms >= self.paragraph.max_duration_ms {
            return Err(ConfigError::InvalidValue {
                field: "paragraph.min_duration_ms".to_string(),
                message: "must be less than max_duration_ms".to_string(),
            });
        }
        if self.display.max_display_pairs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "display.max_display_pairs".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.summary.thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::InvalidValue {
                field: "summary.thresholds".to_string(),
                message: "must be strictly increasing".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        Settings::default().validate().unwrap();
    }

    #[test]
    fn rejects_empty_queue() {
        let mut s = Settings::default();
        s.queue.max_concurrency = 0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn rejects_inverted_paragraph_bounds() {
        let mut s = Settings::default();
        s.paragraph.min_duration_ms = s.paragraph.max_duration_ms;
        assert!(s.validate().is_err());
    }
}
