//! `phase_fanout`: the concurrent fan-out/fan-in step for `analysis`/`critique`/
//! `rebuttal` — the node the main pump loop drives through whenever more than one
//! specialist is pending for the round, invoking every pending command through
//! `debate_phase::PhaseExecutor` concurrently bounded by `concurrency_limit`. A
//! cancel observed mid-round surfaces as `NodeError::Cancelled` carrying whatever
//! specialists had already settled.

use crate::node::{Node, NodeError};
use async_trait::async_trait;
use debate_phase::{PhaseExecutor, RoundCancelled};
use debate_state::{Clock, DebateState, SessionId, StateDelta};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub struct PhaseFanoutNode {
    session_id: SessionId,
    executor: Arc<PhaseExecutor>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl PhaseFanoutNode {
    pub fn new(session_id: SessionId, executor: Arc<PhaseExecutor>, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self { session_id, executor, clock }
    }
}

#[async_trait]
impl Node for PhaseFanoutNode {
    fn name(&self) -> &str {
        "phase_fanout"
    }

    async fn run(&self, state: &DebateState, cancel: Arc<AtomicBool>) -> Result<StateDelta, NodeError> {
        let round = state.route.loop_round;
        let pending = state.pending_agents_for_round(round);
        let mut commands = HashMap::with_capacity(pending.len());
        for agent_name in pending {
            if let Some(command) = state.commands.get(&agent_name) {
                commands.insert(agent_name, command.clone());
            }
        }
        if commands.is_empty() {
            return Ok(StateDelta::new());
        }

        let phase = state.route.current_phase;
        let state_arc = Arc::new(state.clone());
        match self
            .executor
            .run_round(self.session_id, state_arc, phase, round, &commands, Arc::clone(&self.clock), cancel)
            .await
        {
            Ok((delta, _outcomes)) => Ok(delta),
            Err(RoundCancelled { partial }) => Err(NodeError::Cancelled { node: self.name().to_string(), partial }),
        }
    }
}
