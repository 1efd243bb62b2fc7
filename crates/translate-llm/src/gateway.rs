//! LLM Gateway (C4, §4.4): the sole caller of the external generative
//! model. Every translation, summary, vocabulary extraction, and final
//! report goes through here so model selection, token budgets, and
//! reasoning effort stay centralized per `Purpose`.
//!
//! Grounded on the teacher's `ClaudeBackend` (`claude.rs`): a thin
//! `reqwest::Client` wrapper, one request builder, and an SSE loop for
//! streaming — retargeted at the OpenAI Responses API shape.

use crate::protocol::{drain_sse_lines, InputMessage, ReasoningConfig, ResponsesReply, ResponsesRequest, StreamEvent};
use crate::{cleanup, purpose};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::time::Duration;
use translate_config::LlmConfig;
use translate_core::error::{Error, Result};
use translate_core::traits::{GatewayRequest, GatewayResponse, LlmGateway, Purpose, StreamDelta};

pub struct OpenAiGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    config: LlmConfig,
}

impl OpenAiGateway {
    pub fn new(endpoint: String, api_key: String, config: LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .build()
            .expect("reqwest client");
        Self {
            client,
            endpoint,
            api_key,
            config,
        }
    }

    fn build_request(&self, purpose: Purpose, req: &GatewayRequest, stream: bool) -> ResponsesRequest {
        let cfg = purpose::resolve(&self.config, purpose);
        let max_output_tokens = req.max_tokens.unwrap_or(cfg.max_tokens);
        ResponsesRequest {
            model: cfg.model.clone(),
            input: vec![
                InputMessage {
                    role: "system",
                    content: req.system_prompt.clone(),
                },
                InputMessage {
                    role: "user",
                    content: req.user_content.clone(),
                },
            ],
            max_output_tokens,
            reasoning: ReasoningConfig {
                effort: cfg.reasoning_effort.clone(),
            },
            temperature: purpose::temperature_for_model(&cfg.model),
            stream,
        }
    }

    fn is_translation_purpose(purpose: Purpose) -> bool {
        matches!(
            purpose,
            Purpose::Translation | Purpose::UserTranslate | Purpose::SummaryTranslate
        )
    }
}

#[async_trait]
impl LlmGateway for OpenAiGateway {
    async fn complete(&self, req: GatewayRequest) -> Result<GatewayResponse> {
        let purpose = req.purpose;
        let cfg = purpose::resolve(&self.config, purpose);
        let body = self.build_request(purpose, &req, false);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Llm(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!("HTTP {}: {}", status, body)));
        }

        let reply: ResponsesReply = response
            .json()
            .await
            .map_err(|e| Error::Llm(e.to_string()))?;

        let mut content = reply.output_text.unwrap_or_default();
        if Self::is_translation_purpose(purpose) {
            content = cleanup::clean_translation_output(&content);
        }

        Ok(GatewayResponse {
            content,
            usage_tokens: reply.usage.and_then(|u| u.output_tokens),
            model: reply.model.unwrap_or_else(|| cfg.model.clone()),
        })
    }

    fn stream<'a>(
        &'a self,
        req: GatewayRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamDelta>> + Send + 'a>> {
        Box::pin(async_stream::stream! {
            let purpose = req.purpose;
            let body = self.build_request(purpose, &req, true);

            let response = match self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    yield Err(Error::Llm(e.to_string()));
                    return;
                }
            };

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                yield Err(Error::Llm(format!("HTTP {}: {}", status, body)));
                return;
            }

            let mut bytes_stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk) = bytes_stream.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(Error::Llm(e.to_string()));
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                for line in drain_sse_lines(&mut buffer) {
                    match serde_json::from_str::<StreamEvent>(&line) {
                        Ok(StreamEvent::OutputTextDelta { delta }) => {
                            yield Ok(StreamDelta { delta, is_complete: false });
                        }
                        Ok(StreamEvent::Completed) => {
                            yield Ok(StreamDelta { delta: String::new(), is_complete: true });
                            return;
                        }
                        Ok(StreamEvent::Error { message }) => {
                            yield Err(Error::Llm(message.unwrap_or_else(|| "unknown stream error".to_string())));
                            return;
                        }
                        Ok(StreamEvent::Unknown) => {}
                        Err(e) => {
                            tracing::debug!(error = %e, line, "unrecognized responses stream event");
                        }
                    }
                }
            }
        })
    }

    fn model_for(&self, purpose: Purpose) -> &str {
        &purpose::resolve(&self.config, purpose).model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use translate_core::traits::Purpose;

    fn gateway() -> OpenAiGateway {
        OpenAiGateway::new(
            "https://example.invalid/v1/responses".to_string(),
            "test-key".to_string(),
            LlmConfig::default(),
        )
    }

    #[test]
    fn model_for_reflects_purpose_config() {
        let gw = gateway();
        assert_eq!(gw.model_for(Purpose::Translation), gw.config.translation.model);
        assert_eq!(gw.model_for(Purpose::Report), gw.config.report.model);
    }

    #[test]
    fn build_request_applies_gpt5_temperature_override() {
        let gw = gateway();
        let req = GatewayRequest {
            purpose: Purpose::Report,
            system_prompt: "sys".to_string(),
            user_content: "user".to_string(),
            max_tokens: None,
        };
        let body = gw.build_request(Purpose::Report, &req, false);
        assert_eq!(body.temperature, 1.0);
    }
}
