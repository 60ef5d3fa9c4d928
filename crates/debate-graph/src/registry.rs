//! `NodeRegistry`: holds every registered node by name. Grounded in
//! `graph.rs`'s `Graph::nodes: HashMap<NodeId, NodeSpec>`.

use crate::agent_node::AgentNode;
use crate::judge_node::JudgeNode;
use crate::node::Node;
use crate::phase_fanout::PhaseFanoutNode;
use crate::simple_nodes::{AggregateNode, CollectAssetsNode, InitSessionNode, ReportNode, SupervisorDecideNode, TerminalNode};
use debate_agent::{AgentRegistry, AgentRunner};
use debate_events::EventDispatcher;
use debate_phase::PhaseExecutor;
use debate_report::{ReportGuard, ReportRenderer};
use debate_router::SupervisorRouter;
use debate_state::{Clock, Incident, SessionId};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct NodeRegistry {
    nodes: HashMap<String, Arc<dyn Node>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, node: Arc<dyn Node>) {
        self.nodes.insert(node.name().to_string(), node);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Node>> {
        self.nodes.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.nodes.keys().map(String::as_str).collect()
    }

    /// Wire together the standard registry: the bootstrap/aggregation/terminal
    /// nodes, `phase_fanout` for the concurrent `analysis`/`critique`/`rebuttal`
    /// rounds (driven through `PhaseExecutor`, not through per-specialist node
    /// lookups), the `judge`/`verify` single-specialist nodes, and `report`.
    #[allow(clippy::too_many_arguments)]
    pub fn build_standard(
        session_id: SessionId,
        incident: Incident,
        agents: &AgentRegistry,
        agent_runner: Arc<AgentRunner>,
        phase_executor: Arc<PhaseExecutor>,
        supervisor_router: Arc<SupervisorRouter>,
        report_guard: ReportGuard,
        report_renderer: Arc<dyn ReportRenderer>,
        dispatcher: Arc<EventDispatcher>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        let mut registry = Self::new();

        registry.register(Arc::new(InitSessionNode::new(session_id, incident.clone(), Arc::clone(&dispatcher), Arc::clone(&clock))));
        registry.register(Arc::new(CollectAssetsNode::new(session_id, incident, Arc::clone(&dispatcher), Arc::clone(&clock))));
        registry.register(Arc::new(PhaseFanoutNode::new(session_id, Arc::clone(&phase_executor), Arc::clone(&clock))));
        registry.register(Arc::new(AggregateNode));
        let eligible_specialists: Vec<String> = agents.names().map(str::to_string).collect();
        registry.register(Arc::new(SupervisorDecideNode::new(session_id, Arc::clone(&supervisor_router), eligible_specialists, Arc::clone(&clock))));
        registry.register(Arc::new(ReportNode::new(session_id, report_guard, report_renderer, Arc::clone(&dispatcher), Arc::clone(&clock))));
        registry.register(Arc::new(TerminalNode));

        // `judge`/`verify` are the only single-specialist nodes routed to directly —
        // every other specialist's turn runs through `phase_fanout`/`PhaseExecutor`.
        // `judge` is the only node allowed to write `final_result`, so it gets its
        // own node type rather than the generic `AgentNode`.
        if let Some(judge) = agents.get("JudgeAgent") {
            registry.register(Arc::new(JudgeNode::new("judge", judge.name.clone(), session_id, Arc::clone(&agent_runner), Arc::clone(&clock))));
        }
        if let Some(verification) = agents.get("VerificationAgent") {
            registry.register(Arc::new(AgentNode::new("verify", verification.name.clone(), session_id, agent_runner, clock)));
        }

        registry
    }
}
