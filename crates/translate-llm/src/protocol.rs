//! Wire shapes for the OpenAI Responses API (§4.4, §6 "LLM gateway
//! wire protocol"). Streaming is parsed the way the teacher's
//! `claude.rs` walks Anthropic's SSE stream — buffer raw bytes, split
//! on newlines, strip the `data: ` prefix, deserialize per line — aimed
//! at a differently-shaped event union.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct ResponsesRequest {
    pub model: String,
    pub input: Vec<InputMessage>,
    pub max_output_tokens: u32,
    pub reasoning: ReasoningConfig,
    pub temperature: f32,
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub struct InputMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ReasoningConfig {
    pub effort: String,
}

#[derive(Debug, Deserialize)]
pub struct ResponsesReply {
    pub output_text: Option<String>,
    pub usage: Option<Usage>,
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub output_tokens: Option<u32>,
}

/// Only the event kinds this gateway acts on; everything else in the
/// Responses API stream is deserialized as `Unknown` and ignored.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    #[serde(rename = "response.output_text.delta")]
    OutputTextDelta { delta: String },
    #[serde(rename = "response.completed")]
    Completed,
    #[serde(rename = "response.error")]
    Error { message: Option<String> },
    #[serde(other)]
    Unknown,
}

/// Split an accumulated SSE byte buffer into complete `data: ` lines,
/// returning unparsed leftover bytes to be prepended to the next chunk.
pub fn drain_sse_lines(buffer: &mut String) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(pos) = buffer.find('\n') {
        let line = buffer[..pos].trim().to_string();
        *buffer = buffer[pos + 1..].to_string();
        if let Some(data) = line.strip_prefix("data: ") {
            if data != "[DONE]" {
                lines.push(data.to_string());
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_delta_event() {
        let raw = r#"{"type":"response.output_text.delta","delta":"hola"}"#;
        let event: StreamEvent = serde_json::from_str(raw).unwrap();
        match event {
            StreamEvent::OutputTextDelta { delta } => assert_eq!(delta, "hola"),
            _ => panic!("expected delta event"),
        }
    }

    #[test]
    fn drains_complete_lines_and_keeps_partial_tail() {
        let mut buffer = "data: {\"a\":1}\ndata: {\"b\":2}\npartial".to_string();
        let lines = drain_sse_lines(&mut buffer);
        assert_eq!(lines, vec!["{\"a\":1}", "{\"b\":2}"]);
        assert_eq!(buffer, "partial");
    }

    #[test]
    fn skips_done_sentinel() {
        let mut buffer = "data: [DONE]\n".to_string();
        assert!(drain_sse_lines(&mut buffer).is_empty());
    }
}
