//! A single specialist's turn outside a fan-out round, wrapping `AgentRunner::run`.
//! Used directly for the `verify` node — the single-specialist verification phase
//! has nothing to fan out over, unlike `analysis`/`critique`/`rebuttal`, which run
//! through `phase_fanout`/`PhaseExecutor` instead.

use crate::node::{Node, NodeError};
use async_trait::async_trait;
use debate_agent::AgentRunner;
use debate_state::{Clock, DebateState, SessionId, StateDelta};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub struct AgentNode {
    node_name: String,
    agent_name: String,
    session_id: SessionId,
    runner: Arc<AgentRunner>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl AgentNode {
    pub fn new(
        node_name: impl Into<String>,
        agent_name: impl Into<String>,
        session_id: SessionId,
        runner: Arc<AgentRunner>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            node_name: node_name.into(),
            agent_name: agent_name.into(),
            session_id,
            runner,
            clock,
        }
    }
}

#[async_trait]
impl Node for AgentNode {
    fn name(&self) -> &str {
        &self.node_name
    }

    async fn run(&self, state: &DebateState, cancel: Arc<AtomicBool>) -> Result<StateDelta, NodeError> {
        let Some(command) = state.commands.get(&self.agent_name) else {
            return Err(NodeError::Failed {
                node: self.node_name.clone(),
                reason: format!("no pending command for {}", self.agent_name),
            });
        };
        let round = command.issued_round;
        let phase = state.route.current_phase;
        let delta = self
            .runner
            .run(&self.agent_name, self.session_id, state, phase, command, round, self.clock.as_ref(), cancel.as_ref())
            .await;
        Ok(delta)
    }
}
