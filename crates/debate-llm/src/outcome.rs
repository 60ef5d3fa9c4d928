//! Result of one [`crate::gateway::LlmGateway::call`].

use crate::client::TokenUsage;

#[derive(Debug, Clone)]
pub enum LlmOutcome {
    Ok { text: String, token_usage: TokenUsage },
    Timeout,
    Error { reason: String },
    /// Retries were exhausted under a [`crate::retry::RetryProfile`] with
    /// `fatal_on_exhaust` set — a non-retryable failure, unlike the plain `Error`
    /// degradation a caller can shrug off.
    Fatal { reason: String },
}

impl LlmOutcome {
    pub fn is_degradation(&self) -> bool {
        !matches!(self, LlmOutcome::Ok { .. })
    }
}
