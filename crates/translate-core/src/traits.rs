//! Capability traits implemented by other workspace crates, grounded on
//! the teacher's `LlmBackend`/`LanguageModel` split (`voice-agent-llm`):
//! a narrow async trait at the seam, object-safe so the orchestrator can
//! hold `Arc<dyn ...>` without knowing the concrete backend.

use crate::error::Result;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// What a gateway request is *for* — drives per-purpose model selection,
/// token budget, and reasoning effort (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    Translation,
    Summary,
    SummaryTranslate,
    UserTranslate,
    Vocabulary,
    Report,
}

#[derive(Debug, Clone)]
pub struct GatewayRequest {
    pub purpose: Purpose,
    pub system_prompt: String,
    pub user_content: String,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub content: String,
    pub usage_tokens: Option<u32>,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct StreamDelta {
    pub delta: String,
    pub is_complete: bool,
}

/// Uniform request/stream interface to an external generative model
/// (C4 LLM Gateway, §4.4).
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn complete(&self, req: GatewayRequest) -> Result<GatewayResponse>;

    fn stream<'a>(
        &'a self,
        req: GatewayRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamDelta>> + Send + 'a>>;

    /// Model name resolved for this purpose, for logging.
    fn model_for(&self, purpose: Purpose) -> &str;
}
