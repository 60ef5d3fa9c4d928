//! Combines the two decision layers: the rule-based layer runs first
//! and is authoritative whenever it produces a transition; the LLM-dynamic layer is
//! invoked only when the rule-based layer defers, and its own output is validated
//! against the phase-order invariant before acceptance. Emits `phase_changed` and
//! `agent_command_issued` events for whichever decision wins, mirroring
//! `Router::route`, which always publishes its selection regardless of which path
//! produced it.

use crate::decision::{RuleOutcome, SupervisorDecision, SupervisorMode};
use crate::llm_supervisor::LlmSupervisor;
use crate::rule_supervisor::RuleSupervisor;
use debate_events::{EventDispatcher, EventType};
use debate_state::{Clock, DebateState, Phase, SessionId};
use std::sync::Arc;
use tracing::info;

pub struct SupervisorRouter {
    rules: RuleSupervisor,
    llm: LlmSupervisor,
    mode: SupervisorMode,
    dispatcher: Arc<EventDispatcher>,
}

impl SupervisorRouter {
    pub fn new(rules: RuleSupervisor, llm: LlmSupervisor, dispatcher: Arc<EventDispatcher>) -> Self {
        Self::with_mode(rules, llm, SupervisorMode::Hybrid, dispatcher)
    }

    pub fn with_mode(rules: RuleSupervisor, llm: LlmSupervisor, mode: SupervisorMode, dispatcher: Arc<EventDispatcher>) -> Self {
        Self { rules, llm, mode, dispatcher }
    }

    /// Decide the next transition for `state` according to the configured
    /// `SupervisorMode`:
    /// - `Rule`: the rule-based layer only; a `Defer` yields `None` directly.
    /// - `Llm`: the LLM-dynamic layer only.
    /// - `Hybrid` (default): rule-based first, falling back to the LLM-dynamic layer
    ///   only on `Defer`.
    /// Returns `None` if the configured layer(s) produce nothing (the caller should
    /// leave the phase unchanged and wait for more feedback to arrive).
    pub async fn decide(
        &self,
        session_id: SessionId,
        state: &DebateState,
        current_phase: Phase,
        round: u32,
        eligible_specialists: &[String],
        clock: &dyn Clock,
    ) -> Option<SupervisorDecision> {
        let decision = match self.mode {
            SupervisorMode::Rule => match self.rules.decide(state, round) {
                RuleOutcome::Transition(decision) => decision,
                RuleOutcome::Defer => return None,
            },
            SupervisorMode::Llm => {
                self.llm
                    .decide(session_id, state, current_phase, eligible_specialists, clock)
                    .await?
            }
            SupervisorMode::Hybrid => match self.rules.decide(state, round) {
                RuleOutcome::Transition(decision) => decision,
                RuleOutcome::Defer => {
                    info!(phase = %current_phase, "rule-based supervisor deferred, consulting llm layer");
                    self.llm
                        .decide(session_id, state, current_phase, eligible_specialists, clock)
                        .await?
                }
            },
        };

        self.dispatcher.emit(
            session_id,
            EventType::PhaseChanged {
                from: current_phase.to_string(),
                to: decision.next_phase.to_string(),
                loop_round: round,
            },
            Some(current_phase),
            None,
            clock,
        );
        for (agent_name, command) in &decision.commands {
            self.dispatcher.emit(
                session_id,
                EventType::AgentCommandIssued {
                    agent_name: agent_name.clone(),
                    task: command.task.clone(),
                    deadline_ms: command.deadline_ms,
                },
                Some(decision.next_phase),
                Some(agent_name.clone()),
                clock,
            );
        }

        Some(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule_supervisor::RuleSupervisorConfig;
    use debate_llm::{ChatCompletion, ChatMessage, LlmClient, LlmError, LlmGateway};
    use debate_state::SystemClock;
    use async_trait::async_trait;
    use std::time::Duration;

    struct UnreachableClient;

    #[async_trait]
    impl LlmClient for UnreachableClient {
        async fn complete(
            &self,
            _model_id: &str,
            _messages: &[ChatMessage],
            _timeout: Duration,
        ) -> Result<ChatCompletion, LlmError> {
            panic!("llm layer should not be consulted when rules already decided")
        }
    }

    fn router() -> SupervisorRouter {
        let dispatcher = Arc::new(EventDispatcher::default());
        let gateway = Arc::new(LlmGateway::new(Arc::new(UnreachableClient), Arc::clone(&dispatcher)));
        SupervisorRouter::new(
            RuleSupervisor::new(RuleSupervisorConfig::default()),
            LlmSupervisor::new(gateway, "test-model"),
            dispatcher,
        )
    }

    #[tokio::test]
    async fn rule_based_decision_short_circuits_the_llm_layer() {
        let router = router();
        let mut state = DebateState::new();
        state.route.current_phase = Phase::AssetMapping;
        state.context.insert(
            debate_state::context_keys::ASSET_MAPPING.to_string(),
            serde_json::json!({"svc": "checkout"}),
        );

        let decision = router
            .decide(SessionId::new(), &state, Phase::AssetMapping, 0, &[], &SystemClock)
            .await;
        assert_eq!(decision.unwrap().next_phase, Phase::Analysis);
    }

    #[tokio::test]
    async fn both_layers_deferring_yields_none() {
        let dispatcher = Arc::new(EventDispatcher::default());
        let gateway = Arc::new(LlmGateway::new(
            Arc::new(DegradingClient),
            Arc::clone(&dispatcher),
        ));
        let router = SupervisorRouter::new(
            RuleSupervisor::new(RuleSupervisorConfig::default()),
            LlmSupervisor::new(gateway, "test-model"),
            dispatcher,
        );
        let state = DebateState::new();
        let decision = router
            .decide(SessionId::new(), &state, Phase::Init, 0, &[], &SystemClock)
            .await;
        assert!(decision.is_none());
    }

    #[tokio::test]
    async fn rule_only_mode_never_consults_the_llm_layer_even_on_defer() {
        let dispatcher = Arc::new(EventDispatcher::default());
        let gateway = Arc::new(LlmGateway::new(Arc::new(UnreachableClient), Arc::clone(&dispatcher)));
        let router = SupervisorRouter::with_mode(
            RuleSupervisor::new(RuleSupervisorConfig::default()),
            LlmSupervisor::new(gateway, "test-model"),
            SupervisorMode::Rule,
            dispatcher,
        );
        let state = DebateState::new();
        let decision = router.decide(SessionId::new(), &state, Phase::Init, 0, &[], &SystemClock).await;
        assert!(decision.is_none());
    }

    struct DegradingClient;

    #[async_trait]
    impl LlmClient for DegradingClient {
        async fn complete(
            &self,
            _model_id: &str,
            _messages: &[ChatMessage],
            _timeout: Duration,
        ) -> Result<ChatCompletion, LlmError> {
            Err(LlmError::Transport("unreachable".into()))
        }
    }
}
