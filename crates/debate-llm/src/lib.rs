//! LLM Gateway: retry, timeout, and per-phase backoff over a pluggable chat-completion
//! client.

pub mod client;
pub mod error;
pub mod gateway;
pub mod outcome;
pub mod retry;

pub use client::{ChatCompletion, ChatMessage, ChatRole, LlmClient, TokenUsage};
pub use error::LlmError;
pub use gateway::LlmGateway;
pub use outcome::LlmOutcome;
pub use retry::{classify_error, ErrorClass, RetryProfile};
