//! Generic, domain-agnostic constants pulled in from the environment,
//! following the teacher's `endpoints`/`timeouts` module split
//! (`voice-agent-config::constants`): one `Lazy` per env-overridable
//! value so callers never call `std::env::var` directly.

use once_cell::sync::Lazy;

/// Deepgram-shaped ASR provider endpoint (env: `ASR_PROVIDER_URL`).
pub static ASR_PROVIDER_URL: Lazy<String> = Lazy::new(|| {
    std::env::var("ASR_PROVIDER_URL")
        .unwrap_or_else(|_| "wss://api.deepgram.com/v1/listen".to_string())
});

/// LLM gateway HTTP endpoint (env: `LLM_PROVIDER_URL`).
pub static LLM_PROVIDER_URL: Lazy<String> = Lazy::new(|| {
    std::env::var("LLM_PROVIDER_URL")
        .unwrap_or_else(|_| "https://api.openai.com/v1/responses".to_string())
});

/// §4.1 ASR keep-alive interval — fixed by the wire protocol, not
/// configurable, so it is a plain constant rather than an env lookup.
pub const ASR_KEEPALIVE_MS: u64 = 8_000;

/// §4.1 reconnection policy.
pub const ASR_MAX_RECONNECT_ATTEMPTS: u32 = 3;
pub const ASR_RECONNECT_INITIAL_BACKOFF_MS: u64 = 1_000;
pub const ASR_RECONNECT_MAX_BACKOFF_MS: u64 = 30_000;
