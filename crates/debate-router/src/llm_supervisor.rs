//! LLM-dynamic supervisor: invoked only when the rule-based layer defers. Calls
//! the supervisor LLM with the condensed debate state and the
//! list of eligible specialists, parses a structured `{next_phase, next_agents,
//! commands, rationale}` decision, and rejects anything that would violate the
//! phase-order invariant — grounded in `router::llm_router::LlmRouter`'s
//! LLM-backed selection with fallback-to-rules on invalid output.

use crate::decision::SupervisorDecision;
use debate_agent::parse_structured_output;
use debate_llm::{ChatMessage, LlmGateway, LlmOutcome, RetryProfile};
use debate_state::{Clock, Command, DebateState, Phase, SessionId, ToolUsage};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::warn;

pub struct LlmSupervisor {
    gateway: Arc<LlmGateway>,
    model_id: String,
}

fn render_eligible_specialists(eligible: &[String]) -> String {
    eligible.iter().map(|name| format!("- {name}")).collect::<Vec<_>>().join("\n")
}

fn parse_command(value: &serde_json::Value) -> Option<Command> {
    let use_tool = match value.get("use_tool").and_then(|v| v.as_str()) {
        Some("required") => ToolUsage::Required,
        Some("forbidden") => ToolUsage::Forbidden,
        _ => ToolUsage::Optional,
    };
    let tool_targets: HashSet<String> = value
        .get("tool_targets")
        .and_then(|v| v.as_array())
        .map(|items| items.iter().filter_map(|v| v.as_str()).map(str::to_string).collect())
        .unwrap_or_default();

    Some(Command {
        issued_round: value.get("issued_round")?.as_u64()? as u32,
        task: value.get("task")?.as_str()?.to_string(),
        focus: value.get("focus")?.as_str()?.to_string(),
        expected_output_schema_id: value.get("expected_output_schema_id")?.as_str()?.to_string(),
        use_tool,
        tool_targets,
        deadline_ms: value.get("deadline_ms")?.as_u64()?,
    })
}

/// Parse the LLM's decision JSON into a [`SupervisorDecision`], or `None` if any
/// required field is missing or malformed.
fn parse_decision(value: &serde_json::Value) -> Option<SupervisorDecision> {
    let next_phase: Phase = value.get("next_phase")?.as_str()?.parse().ok()?;
    let next_agents: Vec<String> = value
        .get("next_agents")?
        .as_array()?
        .iter()
        .filter_map(|v| v.as_str())
        .map(str::to_string)
        .collect();
    let mut commands = HashMap::new();
    if let Some(raw_commands) = value.get("commands").and_then(|v| v.as_object()) {
        for (agent_name, command_value) in raw_commands {
            if let Some(command) = parse_command(command_value) {
                commands.insert(agent_name.clone(), command);
            }
        }
    }
    let rationale = value.get("rationale").and_then(|v| v.as_str()).unwrap_or_default().to_string();

    Some(SupervisorDecision {
        next_phase,
        next_agents,
        commands,
        rationale,
    })
}

impl LlmSupervisor {
    pub fn new(gateway: Arc<LlmGateway>, model_id: impl Into<String>) -> Self {
        Self {
            gateway,
            model_id: model_id.into(),
        }
    }

    /// Ask the supervisor LLM for the next transition. Returns `None` if the call
    /// degrades, the output is unparseable, or the decision would violate the
    /// phase-order invariant — callers fall back to the rule-based default in every
    /// `None` case.
    pub async fn decide(
        &self,
        session_id: SessionId,
        state: &DebateState,
        current_phase: Phase,
        eligible_specialists: &[String],
        clock: &dyn Clock,
    ) -> Option<SupervisorDecision> {
        let system_prompt = "You are the debate supervisor. Decide which specialists to command next and \
             which phase the debate should move into. Respond with a JSON object: \
             {\"next_phase\": <phase name>, \"next_agents\": [...], \"commands\": {agent: {task, focus, \
             expected_output_schema_id, use_tool, tool_targets, deadline_ms, issued_round}}, \"rationale\": \
             <string>}.";
        let user_prompt = format!(
            "Current phase: {current_phase}\nRound: {}\nEligible specialists:\n{}\n\n\
             Recent feedback summaries:\n{}",
            state.route.loop_round,
            render_eligible_specialists(eligible_specialists),
            state
                .feedback
                .iter()
                .map(|(name, fb)| format!("{name}: {} (confidence {:.2})", fb.summary, fb.confidence))
                .collect::<Vec<_>>()
                .join("\n"),
        );

        let messages = vec![ChatMessage::system(system_prompt), ChatMessage::user(user_prompt)];

        let outcome = self
            .gateway
            .call(
                session_id,
                current_phase,
                None,
                &self.model_id,
                &messages,
                Some("supervisor_decision_v1"),
                RetryProfile::supervisor(),
                clock,
            )
            .await;

        let text = match outcome {
            LlmOutcome::Ok { text, .. } => text,
            LlmOutcome::Timeout | LlmOutcome::Error { .. } | LlmOutcome::Fatal { .. } => {
                warn!("supervisor llm call degraded, falling back to rule-based default");
                return None;
            }
        };

        let parsed = parse_structured_output(&text);
        let decision = parse_decision(&parsed.value)?;

        if !current_phase.can_transition_to(decision.next_phase) {
            warn!(
                from = %current_phase,
                to = %decision.next_phase,
                "supervisor llm proposed an invalid phase transition, rejecting"
            );
            return None;
        }

        Some(decision)
    }
}
