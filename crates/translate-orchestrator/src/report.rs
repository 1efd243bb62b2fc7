//! Final report generation (§4.8 "on stopListening"): a closing summary
//! and extracted vocabulary list produced once a session ends. Runs
//! best-effort — a gateway failure here never blocks teardown, it just
//! means the session ends without that piece of the report.

use std::sync::Arc;
use translate_core::traits::{GatewayRequest, LlmGateway, Purpose};
use translate_core::{Summary, VocabularyItem};
use translate_session::SessionStore;

#[derive(Debug, Clone)]
pub struct FinalReport {
    pub session_id: String,
    pub summary: Option<Summary>,
    pub vocabulary: Vec<VocabularyItem>,
}

pub async fn generate(
    gateway: &Arc<dyn LlmGateway>,
    session: &Arc<SessionStore>,
    src_lang: String,
) -> FinalReport {
    let Some(record) = session.end() else {
        return FinalReport {
            session_id: String::new(),
            summary: None,
            vocabulary: Vec::new(),
        };
    };

    let transcript: String = record
        .history
        .iter()
        .map(|h| h.segment.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    if transcript.trim().is_empty() {
        return FinalReport {
            session_id: record.session_id,
            summary: None,
            vocabulary: Vec::new(),
        };
    }

    let summary = generate_summary(gateway, &transcript, &src_lang).await;
    let vocabulary = generate_vocabulary(gateway, &transcript, &src_lang).await;

    FinalReport {
        session_id: record.session_id,
        summary,
        vocabulary,
    }
}

async fn generate_summary(gateway: &Arc<dyn LlmGateway>, transcript: &str, src_lang: &str) -> Option<Summary> {
    let request = GatewayRequest {
        purpose: Purpose::Report,
        system_prompt: format!("Write a closing summary of this {src_lang} lecture transcript."),
        user_content: transcript.to_string(),
        max_tokens: None,
    };
    match gateway.complete(request).await {
        Ok(response) => Some(Summary {
            id: uuid::Uuid::new_v4().to_string(),
            source_text: response.content.clone(),
            target_text: response.content,
            threshold_words: None,
            periodic: false,
            created_ts: chrono::Utc::now(),
        }),
        Err(e) => {
            tracing::warn!(error = %e, "final report summary generation failed");
            None
        }
    }
}

async fn generate_vocabulary(gateway: &Arc<dyn LlmGateway>, transcript: &str, src_lang: &str) -> Vec<VocabularyItem> {
    let request = GatewayRequest {
        purpose: Purpose::Vocabulary,
        system_prompt: format!(
            "List the key technical terms from this {src_lang} lecture, one per line as `term: definition`."
        ),
        user_content: transcript.to_string(),
        max_tokens: None,
    };
    match gateway.complete(request).await {
        Ok(response) => parse_vocabulary(&response.content),
        Err(e) => {
            tracing::warn!(error = %e, "final report vocabulary generation failed");
            Vec::new()
        }
    }
}

fn parse_vocabulary(content: &str) -> Vec<VocabularyItem> {
    content
        .lines()
        .filter_map(|line| {
            let (term, definition) = line.split_once(':')?;
            let term = term.trim().trim_start_matches(['-', '*']).trim();
            let definition = definition.trim();
            if term.is_empty() || definition.is_empty() {
                return None;
            }
            Some(VocabularyItem {
                term: term.to_string(),
                definition: definition.to_string(),
                context: None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_term_definition_lines() {
        let content = "gradient: rate of change\nbackprop: error propagation through layers";
        let items = parse_vocabulary(content);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].term, "gradient");
    }

    #[test]
    fn strips_bullet_markers() {
        let items = parse_vocabulary("- epoch: one full pass over the dataset");
        assert_eq!(items[0].term, "epoch");
    }

    #[test]
    fn skips_malformed_lines() {
        let content = "just a sentence with no colon\nterm: definition";
        let items = parse_vocabulary(content);
        assert_eq!(items.len(), 1);
    }
}
