//! LLM Gateway: `call(model_id, prompt, expected_schema_id, deadline_ms,
//! retry_profile) -> LLMOutcome`, wrapping a pluggable [`LlmClient`] with per-phase
//! timeout/retry/backoff and a paired `llm_request_started`/`completed|failed|timeout`
//! event trail with a stable `request_id`.

use crate::client::{ChatMessage, LlmClient};
use crate::outcome::LlmOutcome;
use crate::retry::{classify_error, ErrorClass, RetryProfile};
use debate_events::{EventDispatcher, EventType};
use debate_state::{Clock, Phase, SessionId};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

pub struct LlmGateway {
    client: Arc<dyn LlmClient>,
    dispatcher: Arc<EventDispatcher>,
}

impl LlmGateway {
    pub fn new(client: Arc<dyn LlmClient>, dispatcher: Arc<EventDispatcher>) -> Self {
        Self { client, dispatcher }
    }

    /// `expected_schema_id` is carried for observability only — actual structured-
    /// output parsing happens one layer up, in the Agent Runner.
    #[allow(clippy::too_many_arguments)]
    pub async fn call(
        &self,
        session_id: SessionId,
        phase: Phase,
        agent_name: Option<String>,
        model_id: &str,
        messages: &[ChatMessage],
        expected_schema_id: Option<&str>,
        retry_profile: RetryProfile,
        clock: &dyn Clock,
    ) -> LlmOutcome {
        let request_id = Uuid::new_v4().to_string();
        let _ = expected_schema_id;
        self.dispatcher.emit(
            session_id,
            EventType::LlmRequestStarted {
                request_id: request_id.clone(),
                model_id: model_id.to_string(),
            },
            Some(phase),
            agent_name.clone(),
            clock,
        );

        let timeout = Duration::from_millis(retry_profile.timeout_ms);
        let started = Instant::now();
        let mut last_reason = String::new();

        for attempt in 0..=retry_profile.max_retries {
            match tokio::time::timeout(timeout, self.client.complete(model_id, messages, timeout)).await {
                Ok(Ok(completion)) => {
                    let latency_ms = started.elapsed().as_millis() as u64;
                    self.dispatcher.emit(
                        session_id,
                        EventType::LlmRequestCompleted {
                            request_id,
                            latency_ms,
                            prompt_tokens: completion.token_usage.prompt_tokens,
                            completion_tokens: completion.token_usage.completion_tokens,
                        },
                        Some(phase),
                        agent_name,
                        clock,
                    );
                    return LlmOutcome::Ok {
                        text: completion.text,
                        token_usage: completion.token_usage,
                    };
                }
                Ok(Err(err)) => {
                    let class = classify_error(&err);
                    debug!(attempt, ?class, %err, "llm call attempt failed");
                    last_reason = err.to_string();
                    if class == ErrorClass::Permanent || attempt == retry_profile.max_retries {
                        break;
                    }
                    tokio::time::sleep(retry_profile.backoff_delay(attempt)).await;
                }
                Err(_elapsed) => {
                    let latency_ms = started.elapsed().as_millis() as u64;
                    warn!(attempt, latency_ms, "llm call attempt timed out");
                    if attempt == retry_profile.max_retries {
                        self.dispatcher.emit(
                            session_id,
                            EventType::LlmRequestTimeout {
                                request_id: request_id.clone(),
                                latency_ms,
                            },
                            Some(phase),
                            agent_name.clone(),
                            clock,
                        );
                        if retry_profile.fatal_on_exhaust {
                            return LlmOutcome::Fatal {
                                reason: format!("timed out after {latency_ms}ms with retries exhausted"),
                            };
                        }
                        return LlmOutcome::Timeout;
                    }
                    tokio::time::sleep(retry_profile.backoff_delay(attempt)).await;
                }
            }
        }

        self.dispatcher.emit(
            session_id,
            EventType::LlmRequestFailed {
                request_id,
                reason: last_reason.clone(),
            },
            Some(phase),
            agent_name,
            clock,
        );
        if retry_profile.fatal_on_exhaust {
            LlmOutcome::Fatal { reason: last_reason }
        } else {
            LlmOutcome::Error { reason: last_reason }
        }
    }
}
