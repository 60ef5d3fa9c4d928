//! Bounded fan-out/fan-in over one phase's commanded specialists.
//!
//! Every agent commanded for the round runs concurrently, bounded by a configured
//! concurrency limit, and the round only advances once every one of them has settled
//! as completed, timed out, or failed. No specialist observes another's output within
//! the same fan-out: each task is handed the same pre-round `DebateState` snapshot.

use debate_agent::AgentRunner;
use debate_state::{Clock, Command, DebateState, FeedbackStatus, Phase, SessionId, StateDelta};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Returned when the round was abandoned mid-flight because `cancel` flipped after
/// at least one commanded agent had already settled. `partial` carries the merged
/// deltas of whichever agents settled before the cancel was observed; the rest never
/// contribute feedback.
#[derive(Debug, Clone)]
pub struct RoundCancelled {
    pub partial: StateDelta,
}

/// How one commanded agent's turn settled, for metrics/observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    Completed,
    TimedOut,
    Failed,
}

/// How often `run_round` re-checks `cancel` while every commanded agent is still
/// hung on a call that won't settle on its own for a while — bounds cancel latency
/// independent of how a stuck agent's own `deadline_ms` compares to the cancel flip.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

pub struct PhaseExecutorConfig {
    pub max_concurrency: usize,
}

impl Default for PhaseExecutorConfig {
    fn default() -> Self {
        Self { max_concurrency: 4 }
    }
}

pub struct PhaseExecutor {
    runner: Arc<AgentRunner>,
    config: PhaseExecutorConfig,
}

impl PhaseExecutor {
    pub fn new(runner: Arc<AgentRunner>, config: PhaseExecutorConfig) -> Self {
        Self { runner, config }
    }

    /// Run every `(agent_name, command)` pair concurrently (bounded by
    /// `config.max_concurrency`), wait for all to settle, and return the merged delta
    /// plus a settle-outcome map for metrics. `cancel` is re-checked after every join
    /// AND on a `CANCEL_POLL_INTERVAL` tick so a round where every remaining agent is
    /// stuck still observes the flip promptly rather than waiting on their own
    /// `deadline_ms`. Once observed, the remaining tasks are aborted and
    /// `Err(RoundCancelled)` carries only the deltas that had already landed.
    pub async fn run_round(
        &self,
        session_id: SessionId,
        state: Arc<DebateState>,
        current_phase: Phase,
        round: u32,
        commands: &HashMap<String, Command>,
        clock: Arc<dyn Clock + Send + Sync>,
        cancel: Arc<AtomicBool>,
    ) -> Result<(StateDelta, HashMap<String, SettleOutcome>), RoundCancelled> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for (agent_name, command) in commands {
            let runner = Arc::clone(&self.runner);
            let state = Arc::clone(&state);
            let semaphore = Arc::clone(&semaphore);
            let clock = Arc::clone(&clock);
            let cancel = Arc::clone(&cancel);
            let agent_name = agent_name.clone();
            let command = command.clone();
            let deadline = Duration::from_millis(command.deadline_ms);

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore never closed");
                let settle = tokio::time::timeout(
                    deadline,
                    runner.run(&agent_name, session_id, &state, current_phase, &command, round, clock.as_ref(), cancel.as_ref()),
                )
                .await;
                (agent_name, settle)
            });
        }

        let mut deltas = Vec::new();
        let mut outcomes = HashMap::new();

        loop {
            let joined = tokio::select! {
                joined = tasks.join_next() => joined,
                _ = tokio::time::sleep(CANCEL_POLL_INTERVAL) => {
                    if cancel.load(Ordering::SeqCst) {
                        warn!(phase = %current_phase, settled = deltas.len(), total = commands.len(), "round cancelled mid-fan-out");
                        tasks.abort_all();
                        while tasks.join_next().await.is_some() {}
                        return Err(RoundCancelled { partial: merge_deltas(deltas) });
                    }
                    continue;
                }
            };

            let Some(joined) = joined else { break };

            match joined {
                Ok((agent_name, Ok(delta))) => {
                    let outcome = if matches!(
                        delta.feedback.get(&agent_name).map(|fb| fb.status),
                        Some(FeedbackStatus::Failed)
                    ) {
                        SettleOutcome::Failed
                    } else {
                        SettleOutcome::Completed
                    };
                    info!(agent_name = %agent_name, phase = %current_phase, ?outcome, "specialist turn settled");
                    outcomes.insert(agent_name, outcome);
                    deltas.push(delta);
                }
                Ok((agent_name, Err(_elapsed))) => {
                    warn!(agent_name = %agent_name, phase = %current_phase, "specialist turn timed out");
                    deltas.push(timeout_delta(&agent_name, round));
                    outcomes.insert(agent_name, SettleOutcome::TimedOut);
                }
                Err(join_err) => {
                    let agent_name = "unknown".to_string();
                    warn!(%join_err, "specialist task panicked or was cancelled");
                    deltas.push(failed_delta(&agent_name, round, &join_err.to_string()));
                    outcomes.insert(agent_name, SettleOutcome::Failed);
                }
            }

            if cancel.load(Ordering::SeqCst) {
                warn!(phase = %current_phase, settled = deltas.len(), total = commands.len(), "round cancelled mid-fan-out");
                tasks.abort_all();
                while tasks.join_next().await.is_some() {}
                return Err(RoundCancelled { partial: merge_deltas(deltas) });
            }
        }

        Ok((merge_deltas(deltas), outcomes))
    }
}

fn timeout_delta(agent_name: &str, round: u32) -> StateDelta {
    StateDelta::new().with_feedback(
        agent_name,
        debate_agent::degraded_feedback(round, "timeout, please continue without this input"),
    )
}

fn failed_delta(agent_name: &str, round: u32, reason: &str) -> StateDelta {
    StateDelta::new().with_feedback(agent_name, debate_agent::failed_feedback(round, reason.to_string()))
}

/// Fold several independently-produced deltas into one. Each source field is itself
/// commutative (append/dedup for `messages`/`evidence`, per-key replace for
/// `feedback`), so folding in join order — which is non-deterministic across runs —
/// is safe by construction.
pub fn merge_deltas(deltas: Vec<StateDelta>) -> StateDelta {
    let mut merged = StateDelta::new();
    for delta in deltas {
        merged.messages.extend(delta.messages);
        merged.context.extend(delta.context);
        merged.commands.extend(delta.commands);
        merged.feedback.extend(delta.feedback);
        merged.evidence.extend(delta.evidence);
        merged.agent_outputs.extend(delta.agent_outputs);
        if delta.route.is_some() {
            merged.route = delta.route;
        }
        merged.metrics.add_assign(&delta.metrics);
        if delta.final_result.is_some() {
            merged.final_result = delta.final_result;
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use debate_agent::{AgentRegistry, AgentRunner};
    use debate_events::EventDispatcher;
    use debate_llm::{ChatCompletion, ChatMessage, LlmClient, LlmError, LlmGateway};
    use debate_state::{SystemClock, ToolUsage};
    use debate_tools::{ToolContextService, ToolPolicy};
    use async_trait::async_trait;

    struct StaticClient(&'static str);

    #[async_trait]
    impl LlmClient for StaticClient {
        async fn complete(
            &self,
            _model_id: &str,
            _messages: &[ChatMessage],
            _timeout: Duration,
        ) -> Result<ChatCompletion, LlmError> {
            Ok(ChatCompletion {
                text: self.0.to_string(),
                token_usage: Default::default(),
            })
        }
    }

    struct HangingClient;

    #[async_trait]
    impl LlmClient for HangingClient {
        async fn complete(
            &self,
            _model_id: &str,
            _messages: &[ChatMessage],
            _timeout: Duration,
        ) -> Result<ChatCompletion, LlmError> {
            tokio::time::sleep(Duration::from_secs(600)).await;
            unreachable!("round-level timeout should fire first")
        }
    }

    fn command(deadline_ms: u64) -> Command {
        Command {
            issued_round: 1,
            task: "investigate".into(),
            focus: "disk".into(),
            expected_output_schema_id: "specialist_v1".into(),
            use_tool: ToolUsage::Forbidden,
            tool_targets: Default::default(),
            deadline_ms,
        }
    }

    fn build_runner(client: Arc<dyn LlmClient>) -> Arc<AgentRunner> {
        let dispatcher = Arc::new(EventDispatcher::default());
        let gateway = Arc::new(LlmGateway::new(client, Arc::clone(&dispatcher)));
        let tools = Arc::new(ToolContextService::new(ToolPolicy::default(), dispatcher));
        let registry = Arc::new(AgentRegistry::standard());
        Arc::new(AgentRunner::new(gateway, tools, registry, "test-model"))
    }

    #[tokio::test]
    async fn settle_all_waits_for_every_commanded_agent() {
        let runner = build_runner(Arc::new(StaticClient(r#"{"summary":"ok","confidence":0.6}"#)));
        let executor = PhaseExecutor::new(runner, PhaseExecutorConfig::default());
        let mut commands = HashMap::new();
        commands.insert("LogAgent".to_string(), command(5_000));
        commands.insert("DomainAgent".to_string(), command(5_000));

        let (delta, outcomes) = executor
            .run_round(
                SessionId::new(),
                Arc::new(DebateState::new()),
                Phase::Analysis,
                1,
                &commands,
                Arc::new(SystemClock),
                Arc::new(AtomicBool::new(false)),
            )
            .await
            .expect("an uncancelled round always settles");

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.values().all(|o| *o == SettleOutcome::Completed));
        assert_eq!(delta.feedback.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn a_timed_out_agent_is_degraded_without_blocking_the_round() {
        let runner = build_runner(Arc::new(HangingClient));
        let executor = PhaseExecutor::new(runner, PhaseExecutorConfig::default());
        let mut commands = HashMap::new();
        commands.insert("LogAgent".to_string(), command(50));

        let (delta, outcomes) = executor
            .run_round(
                SessionId::new(),
                Arc::new(DebateState::new()),
                Phase::Analysis,
                1,
                &commands,
                Arc::new(SystemClock),
                Arc::new(AtomicBool::new(false)),
            )
            .await
            .expect("a timeout settles the round, it does not cancel it");

        assert_eq!(outcomes.get("LogAgent"), Some(&SettleOutcome::TimedOut));
        assert_eq!(delta.feedback["LogAgent"].status, FeedbackStatus::Degraded);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_mid_fanout_preserves_only_the_settled_specialists_feedback() {
        let runner = build_runner(Arc::new(HangingClient));
        let executor = PhaseExecutor::new(runner, PhaseExecutorConfig::default());
        // LogAgent settles immediately via its own deadline timeout; DomainAgent and
        // CodeAgent are still hung on HangingClient's 600s sleep when the cancel flag
        // flips a moment later — start_paused advances the clock deterministically to
        // whichever timer is nearest once every ready task has run.
        let mut commands = HashMap::new();
        commands.insert("LogAgent".to_string(), command(1));
        commands.insert("DomainAgent".to_string(), command(5_000));
        commands.insert("CodeAgent".to_string(), command(5_000));

        let cancel = Arc::new(AtomicBool::new(false));
        let cancel_setter = Arc::clone(&cancel);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2)).await;
            cancel_setter.store(true, Ordering::SeqCst);
        });

        let result = executor
            .run_round(
                SessionId::new(),
                Arc::new(DebateState::new()),
                Phase::Analysis,
                1,
                &commands,
                Arc::new(SystemClock),
                cancel,
            )
            .await;

        let RoundCancelled { partial } = result.expect_err("cancel flips before the hung agents can settle");
        assert_eq!(partial.feedback.len(), 1, "only the already-timed-out LogAgent contributes feedback");
        assert!(partial.feedback.contains_key("LogAgent"));
        assert!(!partial.feedback.contains_key("DomainAgent"));
        assert!(!partial.feedback.contains_key("CodeAgent"));
    }

    #[test]
    fn merging_disjoint_feedback_deltas_is_order_independent() {
        let mut a = StateDelta::new();
        a.feedback.insert("LogAgent".to_string(), debate_agent::degraded_feedback(1, "x"));
        let mut b = StateDelta::new();
        b.feedback.insert("DomainAgent".to_string(), debate_agent::degraded_feedback(1, "y"));

        let forward = merge_deltas(vec![a.clone(), b.clone()]);
        let backward = merge_deltas(vec![b, a]);
        assert_eq!(forward.feedback.len(), backward.feedback.len());
        assert_eq!(forward.feedback.len(), 2);
    }
}
