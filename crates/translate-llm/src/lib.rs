//! LLM Gateway (C4): the pipeline's single integration point with an
//! external generative model. Resolves model/token/effort per
//! `Purpose`, issues OpenAI Responses API calls, and cleans up
//! translation output before it reaches the display manager.

pub mod cleanup;
pub mod gateway;
pub mod protocol;
pub mod purpose;

pub use cleanup::clean_translation_output;
pub use gateway::OpenAiGateway;
