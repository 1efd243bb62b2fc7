//! ASR error taxonomy (§4.1 "Error handling").
//!
//! Every failure the adapter can surface is tagged with one of these
//! kinds so the orchestrator and the event bus (C9) can decide whether
//! a session should keep listening or stop, without inspecting message
//! strings.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsrErrorKind {
    BadRequest,
    Unauthorized,
    RequestTimeout,
    InvalidFormat,
    InvalidApiKey,
    ParseError,
    SendError,
    ProviderMessageError,
    UnknownError,
}

impl AsrErrorKind {
    /// Whether the session should attempt reconnection after this error,
    /// per §4.1's reconnection policy. Only auth failures are never
    /// retried; every other kind (including `BadRequest`) is recoverable.
    pub fn is_recoverable(self) -> bool {
        !matches!(
            self,
            AsrErrorKind::Unauthorized | AsrErrorKind::InvalidApiKey
        )
    }

    /// Map a provider close code to a taxonomy entry (§6 wire protocol).
    pub fn from_close_code(code: u16) -> Self {
        match code {
            4000 => AsrErrorKind::BadRequest,
            4001 => AsrErrorKind::Unauthorized,
            4008 => AsrErrorKind::RequestTimeout,
            _ => AsrErrorKind::UnknownError,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AsrErrorKind::BadRequest => "BAD_REQUEST",
            AsrErrorKind::Unauthorized => "UNAUTHORIZED",
            AsrErrorKind::RequestTimeout => "REQUEST_TIMEOUT",
            AsrErrorKind::InvalidFormat => "INVALID_FORMAT",
            AsrErrorKind::InvalidApiKey => "INVALID_API_KEY",
            AsrErrorKind::ParseError => "PARSE_ERROR",
            AsrErrorKind::SendError => "SEND_ERROR",
            AsrErrorKind::ProviderMessageError => "DEEPGRAM_MESSAGE_ERROR",
            AsrErrorKind::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

#[derive(Error, Debug)]
pub enum AsrError {
    #[error("{kind}: {message}")]
    Provider {
        kind: AsrErrorKind,
        message: String,
    },

    #[error("websocket transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("failed to parse provider frame: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("reconnection exhausted after {attempts} attempts")]
    ReconnectionExhausted { attempts: u32 },

    #[error("not connected")]
    NotConnected,
}

impl std::fmt::Display for AsrErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsrError {
    pub fn kind(&self) -> AsrErrorKind {
        match self {
            AsrError::Provider { kind, .. } => *kind,
            AsrError::Transport(_) => AsrErrorKind::SendError,
            AsrError::Parse(_) => AsrErrorKind::ParseError,
            AsrError::ReconnectionExhausted { .. } => AsrErrorKind::UnknownError,
            AsrError::NotConnected => AsrErrorKind::UnknownError,
        }
    }
}

impl From<AsrError> for translate_core::Error {
    fn from(err: AsrError) -> Self {
        translate_core::Error::Asr(err.to_string())
    }
}
