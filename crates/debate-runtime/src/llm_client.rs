//! `StubLlmClient`: a deterministic `debate_llm::LlmClient` double for the demo binary
//! and integration tests. Every registered specialist's system prompt is distinct
//! enough to recognize by substring, so this client answers by inspecting the system
//! message rather than needing an explicit role parameter — `LlmClient::complete` only
//! ever receives `model_id`/`messages`/`timeout`.

use async_trait::async_trait;
use debate_llm::{ChatCompletion, ChatMessage, ChatRole, LlmClient, LlmError, TokenUsage};
use serde_json::json;
use std::time::Duration;

fn system_prompt(messages: &[ChatMessage]) -> &str {
    messages
        .iter()
        .find(|m| m.role == ChatRole::System)
        .map(|m| m.content.as_str())
        .unwrap_or_default()
}

/// Shapes a response consistent with whichever specialist/judge/verification/
/// supervisor prompt it is answering. The judge response always cites two pieces of
/// evidence from two distinct source kinds, satisfying the judgment-phase invariant
/// that an under-cited conclusion is rejected.
fn canned_response(prompt: &str) -> serde_json::Value {
    if prompt.contains("You are the judge") {
        json!({
            "root_cause": "checkout-db-2 ran out of disk space after a misconfigured log rotation left old WAL segments in place",
            "confidence": 0.87,
            "impact": "checkout writes failing with 5xx for all regions routed to checkout-db-2",
            "fix_recommendation": "rotate and compress WAL segments, then expand the volume by 40%",
            "verification_plan": "confirm disk usage drops below 70% and 5xx rate returns to baseline within 30 minutes",
            "risk_level": "high",
            "evidence": [
                {
                    "source_kind": "log",
                    "source_ref": "checkout-db-2:/var/log/postgres/current:1842",
                    "description": "PANIC: could not write to file: No space left on device",
                    "strength": "strong",
                },
                {
                    "source_kind": "metric",
                    "source_ref": "disk.used_percent{host=checkout-db-2}",
                    "description": "disk usage climbed from 61% to 100% over six hours before the outage",
                    "strength": "strong",
                },
            ],
        })
    } else if prompt.contains("You are the verification specialist") {
        json!({
            "summary": "the proposed fix addresses the immediate cause; recommend also alerting on WAL segment count",
            "confidence": 0.75,
            "round_complete": true,
            "evidence": [
                {
                    "source_kind": "runbook",
                    "source_ref": "runbook:disk-pressure-checklist#3",
                    "description": "standard disk pressure runbook confirms volume expansion as the correct remediation",
                    "strength": "medium",
                },
            ],
        })
    } else if prompt.contains("You are the debate supervisor") {
        json!({
            "next_phase": "judgment",
            "next_agents": ["JudgeAgent"],
            "commands": {},
            "rationale": "enough corroborating specialist evidence has accumulated to adjudicate",
        })
    } else {
        json!({
            "summary": "found evidence consistent with disk exhaustion on checkout-db-2",
            "confidence": 0.6,
            "evidence": [
                {
                    "source_kind": "log",
                    "source_ref": "checkout-db-2:/var/log/postgres/current:1842",
                    "description": "PANIC: could not write to file: No space left on device",
                    "strength": "strong",
                },
            ],
        })
    }
}

/// Always succeeds within budget; never times out or errors. Suitable for demos and
/// tests that want a predictable happy path, not for exercising retry/timeout paths —
/// those use purpose-built scripted clients instead.
#[derive(Debug, Default)]
pub struct StubLlmClient;

#[async_trait]
impl LlmClient for StubLlmClient {
    async fn complete(
        &self,
        _model_id: &str,
        messages: &[ChatMessage],
        _timeout: Duration,
    ) -> Result<ChatCompletion, LlmError> {
        let response = canned_response(system_prompt(messages));
        Ok(ChatCompletion {
            text: response.to_string(),
            token_usage: TokenUsage { prompt_tokens: 128, completion_tokens: 96 },
        })
    }
}
