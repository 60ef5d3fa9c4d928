//! Error taxonomy for the LLM Gateway.

use debate_state::Severity;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum LlmError {
    #[error("llm call timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("llm transport error: {0}")]
    Transport(String),

    #[error("llm returned an empty or malformed response: {0}")]
    InvalidResponse(String),

    #[error("llm call misconfigured: {0}")]
    Configuration(String),
}

impl LlmError {
    /// Transport/timeout failures are transient degradations; a configuration error
    /// is a programmer mistake that should never be retried into success.
    pub fn severity(&self) -> Severity {
        match self {
            LlmError::Configuration(_) => Severity::Fatal,
            _ => Severity::Transient,
        }
    }
}
