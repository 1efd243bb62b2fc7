//! Shared error type.
//!
//! Mirrors the shape of the teacher's per-crate `thiserror` enums
//! (`LlmError`, `ConfigError`): one enum per concern, `From` impls at the
//! crate boundary so `?` composes across the workspace.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("asr error: {0}")]
    Asr(String),

    #[error("llm error: {0}")]
    Llm(String),

    #[error("queue overflow")]
    QueueOverflow,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("timeout after {0:?}")]
    Timeout(std::time::Duration),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
