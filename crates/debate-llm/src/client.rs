//! The external LLM collaborator seam: an async `complete(model_id, messages,
//! timeout) -> {text, token_usage}` contract any backend can implement.

use crate::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

#[derive(Debug, Clone)]
pub struct ChatCompletion {
    pub text: String,
    pub token_usage: TokenUsage,
}

/// The provider-agnostic chat-completion seam. A concrete implementation (HTTP client
/// to a hosted model, a local inference server, a deterministic test double) is an
/// external collaborator supplied by the embedder, matching the `llm::remote`/
/// `llm::local` provider split without committing this workspace to either.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(
        &self,
        model_id: &str,
        messages: &[ChatMessage],
        timeout: Duration,
    ) -> Result<ChatCompletion, LlmError>;
}
