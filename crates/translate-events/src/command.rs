//! Command intake schema (§4.9, §6 "Command/event channel"). A raw
//! `serde_json::Value` off the wire is validated against this
//! discriminated union before it is allowed to reach the orchestrator;
//! anything that doesn't match yields `CommandError::Validation`
//! instead of being dispatched.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Command {
    StartListening {
        source_language: String,
        target_language: String,
        #[serde(default)]
        correlation_id: Option<String>,
    },
    StopListening {
        #[serde(default)]
        correlation_id: Option<String>,
    },
    GetHistory {
        #[serde(default)]
        limit: Option<usize>,
        #[serde(default)]
        offset: Option<usize>,
    },
    ClearHistory {},
}

impl Command {
    pub fn correlation_id(&self) -> Option<&str> {
        match self {
            Command::StartListening { correlation_id, .. } => correlation_id.as_deref(),
            Command::StopListening { correlation_id } => correlation_id.as_deref(),
            Command::GetHistory { .. } | Command::ClearHistory {} => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("COMMAND_VALIDATION_ERROR: {0}")]
pub struct CommandValidationError(pub String);

/// Parse and validate a raw command payload. `startListening` additionally
/// rejects empty language codes, which `serde` alone can't express.
pub fn parse_command(raw: &serde_json::Value) -> Result<Command, CommandValidationError> {
    let command: Command =
        serde_json::from_value(raw.clone()).map_err(|e| CommandValidationError(e.to_string()))?;

    if let Command::StartListening {
        source_language,
        target_language,
        ..
    } = &command
    {
        if source_language.trim().is_empty() || target_language.trim().is_empty() {
            return Err(CommandValidationError(
                "sourceLanguage and targetLanguage must be non-empty".to_string(),
            ));
        }
    }
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_start_listening() {
        let raw = json!({
            "command": "startListening",
            "sourceLanguage": "en",
            "targetLanguage": "es",
        });
        let command = parse_command(&raw).unwrap();
        assert!(matches!(command, Command::StartListening { .. }));
    }

    #[test]
    fn rejects_empty_language() {
        let raw = json!({
            "command": "startListening",
            "sourceLanguage": "",
            "targetLanguage": "es",
        });
        assert!(parse_command(&raw).is_err());
    }

    #[test]
    fn rejects_unknown_command() {
        let raw = json!({ "command": "doSomethingElse" });
        assert!(parse_command(&raw).is_err());
    }

    #[test]
    fn clear_history_has_no_fields() {
        let raw = json!({ "command": "clearHistory" });
        let command = parse_command(&raw).unwrap();
        assert!(matches!(command, Command::ClearHistory {}));
    }
}
