//! `AgentRunner::run`: the five-step specialist turn — prompt construction, tool
//! gating/invocation, LLM call, evidence extraction, feedback composition — collapsed
//! into one `StateDelta` that always returns, win or lose.

use crate::descriptor::AgentRegistry;
use crate::evidence::extract_evidence;
use crate::feedback::{compose_feedback, degraded_feedback, failed_feedback};
use crate::parser::parse_structured_output;
use crate::prompt::PromptBuilder;
use debate_llm::{LlmGateway, LlmOutcome};
use debate_state::{Clock, Command, DebateState, Message, Phase, Role, SessionId, StateDelta, ToolUsage};
use debate_tools::{ToolContextService, ToolKind, ToolStatus};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

pub struct AgentRunner {
    llm_gateway: Arc<LlmGateway>,
    tools: Arc<ToolContextService>,
    registry: Arc<AgentRegistry>,
    prompt_builder: PromptBuilder,
    model_id: String,
}

impl AgentRunner {
    pub fn new(
        llm_gateway: Arc<LlmGateway>,
        tools: Arc<ToolContextService>,
        registry: Arc<AgentRegistry>,
        model_id: impl Into<String>,
    ) -> Self {
        Self {
            llm_gateway,
            tools,
            registry,
            prompt_builder: PromptBuilder::new(),
            model_id: model_id.into(),
        }
    }

    /// Run the tool-gating step and return one-line summaries suitable for injecting
    /// into the prompt, alongside whether any tool call
    /// actually succeeded (used to decide whether a `Required` command must degrade
    /// without ever reaching the LLM call).
    async fn run_tools(
        &self,
        session_id: SessionId,
        phase: Phase,
        command: &Command,
        agent_name: &str,
        clock: &dyn Clock,
    ) -> (Vec<String>, bool) {
        if command.use_tool == ToolUsage::Forbidden || command.tool_targets.is_empty() {
            return (Vec::new(), true);
        }

        let targets: Vec<ToolKind> = command
            .tool_targets
            .iter()
            .filter_map(|name| {
                ToolKind::from_str(name)
                    .inspect_err(|_| warn!(agent_name, tool = name.as_str(), "unknown tool name in command targets"))
                    .ok()
            })
            .collect();

        self.tools.announce_context(session_id, phase, agent_name, &targets, clock);

        let mut summaries = Vec::with_capacity(targets.len());
        let mut any_succeeded = false;
        for tool in targets {
            let result = self
                .tools
                .invoke(session_id, phase, command, agent_name, tool, serde_json::json!({}), clock)
                .await;
            if result.status == ToolStatus::Ok {
                any_succeeded = true;
            }
            summaries.push(format!("{tool}: {}", result.summary));
        }

        let tools_usable = command.use_tool != ToolUsage::Required || any_succeeded;
        (summaries, tools_usable)
    }

    /// Execute one specialist turn and return the delta to merge into the debate
    /// state. This never returns an `Err` at the Rust-function level: every failure
    /// mode is represented as a [`debate_state::FeedbackStatus`] instead, so a single
    /// specialist's turn can never abort the round for everyone else. `cancel` is
    /// polled after each awaited tool/LLM step; a turn observed cancelled mid-flight
    /// abandons without contributing any feedback, so a mid-round cancel leaves the
    /// round's merged delta with no trace of it.
    pub async fn run(
        &self,
        agent_name: &str,
        session_id: SessionId,
        state: &DebateState,
        current_phase: Phase,
        command: &Command,
        round: u32,
        clock: &dyn Clock,
        cancel: &AtomicBool,
    ) -> StateDelta {
        let Some(descriptor) = self.registry.get(agent_name) else {
            return StateDelta::new().with_feedback(
                agent_name,
                failed_feedback(round, format!("{agent_name} is not a registered specialist")),
            );
        };

        let (tool_summaries, tools_usable) =
            self.run_tools(session_id, current_phase, command, agent_name, clock).await;

        if cancel.load(Ordering::SeqCst) {
            return StateDelta::new();
        }

        if !tools_usable {
            return StateDelta::new().with_feedback(
                agent_name,
                degraded_feedback(round, "command required a tool but none of its targets were available"),
            );
        }

        let messages = self
            .prompt_builder
            .build(descriptor, state, current_phase, command, &tool_summaries);

        let outcome = self
            .llm_gateway
            .call(
                session_id,
                current_phase,
                Some(agent_name.to_string()),
                &self.model_id,
                &messages,
                Some(command.expected_output_schema_id.as_str()),
                descriptor.retry_profile(),
                clock,
            )
            .await;

        if cancel.load(Ordering::SeqCst) {
            return StateDelta::new();
        }

        match outcome {
            LlmOutcome::Ok { text, .. } => {
                let parsed = parse_structured_output(&text);
                let evidence = extract_evidence(&parsed.value, agent_name);
                let feedback = compose_feedback(round, &parsed, &evidence);
                let mut delta = StateDelta::new()
                    .with_message(Message::new(clock, Role::Specialist, agent_name, current_phase, text))
                    .with_feedback(agent_name, feedback);
                delta.agent_outputs.insert(agent_name.to_string(), parsed.value);
                for item in evidence {
                    delta = delta.with_evidence(item);
                }
                delta
            }
            LlmOutcome::Timeout => StateDelta::new().with_feedback(
                agent_name,
                degraded_feedback(round, "llm call timed out after exhausting retries"),
            ),
            LlmOutcome::Error { reason } => {
                StateDelta::new().with_feedback(agent_name, degraded_feedback(round, reason))
            }
            LlmOutcome::Fatal { reason } => {
                StateDelta::new().with_feedback(agent_name, failed_feedback(round, reason))
            }
        }
    }
}
