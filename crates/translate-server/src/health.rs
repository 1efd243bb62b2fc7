//! Process-wide health checks registered with C11's `HealthRegistry`
//! (§4.11). Grounded on the teacher's `readiness_check` (`http.rs`),
//! which probes the Ollama backend with a short timeout before
//! reporting ready; here the same probe targets the LLM gateway
//! endpoint instead.

use async_trait::async_trait;
use std::time::Duration;
use translate_events::HealthCheck;

pub struct LlmGatewayCheck {
    client: reqwest::Client,
    endpoint: String,
}

impl LlmGatewayCheck {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl HealthCheck for LlmGatewayCheck {
    fn name(&self) -> &str {
        "llm_gateway"
    }

    async fn check(&self) -> bool {
        let result = tokio::time::timeout(
            Duration::from_secs(2),
            self.client.head(&self.endpoint).send(),
        )
        .await;
        // A reachable endpoint, even one that rejects HEAD with 4xx, still
        // proves the network path is up; only a connect/timeout failure
        // marks the component unhealthy.
        matches!(result, Ok(Ok(_)))
    }
}
