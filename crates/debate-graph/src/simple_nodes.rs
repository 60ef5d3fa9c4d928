//! The bootstrap, bookkeeping, and terminal nodes that don't need a specialist LLM
//! call: `init_session`, `collect_assets`, `aggregate`, `supervisor_decide`, `report`,
//! `terminal`. Grounded in the plain closure-backed `NodeSpec` of `graph.rs` for the
//! shape, generalized into one small struct per responsibility.

use crate::node::{Node, NodeError};
use async_trait::async_trait;
use debate_events::{EventDispatcher, EventType};
use debate_report::{ReportGuard, ReportRenderer};
use debate_router::SupervisorRouter;
use debate_state::{context_keys, Clock, DebateState, Incident, Route, SessionId, StateDelta};
use serde_json::json;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub struct InitSessionNode {
    session_id: SessionId,
    incident: Incident,
    dispatcher: Arc<EventDispatcher>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl InitSessionNode {
    pub fn new(
        session_id: SessionId,
        incident: Incident,
        dispatcher: Arc<EventDispatcher>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self { session_id, incident, dispatcher, clock }
    }
}

#[async_trait]
impl Node for InitSessionNode {
    fn name(&self) -> &str {
        "init_session"
    }

    async fn run(&self, state: &DebateState, _cancel: Arc<AtomicBool>) -> Result<StateDelta, NodeError> {
        self.dispatcher.emit(
            self.session_id,
            EventType::SessionStarted {
                incident_id: self.incident.id.to_string(),
            },
            Some(state.route.current_phase),
            None,
            self.clock.as_ref(),
        );

        let mut delta = StateDelta::new();
        delta.context.insert(
            context_keys::INCIDENT_SUMMARY.to_string(),
            json!(format!("{}: {}", self.incident.title, self.incident.description)),
        );
        delta
            .context
            .insert(context_keys::RAW_LOG_EXCERPT.to_string(), json!(self.incident.log_content));
        delta.route = Some(Route {
            current_phase: debate_state::Phase::AssetMapping,
            next_node: None,
            loop_round: 0,
        });
        Ok(delta)
    }
}

/// Derives the asset interface mapping from the incident's known service/environment
/// fields. A real deployment would call out to a service-catalog/CMDB collaborator;
/// that collaborator is outside this engine's fixed set of external seams
/// (`SessionStore`/`LLMClient`/`Tool`/`ReportRenderer`), so this node produces a
/// minimal deterministic mapping sufficient to satisfy `has_usable_asset_mapping`.
pub struct CollectAssetsNode {
    session_id: SessionId,
    incident: Incident,
    dispatcher: Arc<EventDispatcher>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl CollectAssetsNode {
    pub fn new(
        session_id: SessionId,
        incident: Incident,
        dispatcher: Arc<EventDispatcher>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self { session_id, incident, dispatcher, clock }
    }
}

#[async_trait]
impl Node for CollectAssetsNode {
    fn name(&self) -> &str {
        "collect_assets"
    }

    async fn run(&self, _state: &DebateState, _cancel: Arc<AtomicBool>) -> Result<StateDelta, NodeError> {
        let mut entry = serde_json::Map::new();
        entry.insert("environment".to_string(), json!(self.incident.environment));
        let mut mapping = serde_json::Map::new();
        mapping.insert(self.incident.service_name.clone(), serde_json::Value::Object(entry));
        let mapping = serde_json::Value::Object(mapping);
        self.dispatcher.emit(
            self.session_id,
            EventType::AssetInterfaceMappingCompleted { asset_count: 1 },
            Some(debate_state::Phase::AssetMapping),
            None,
            self.clock.as_ref(),
        );
        let mut delta = StateDelta::new();
        delta.context.insert(context_keys::ASSET_MAPPING.to_string(), mapping);
        Ok(delta)
    }
}

/// Folds the round's feedback summaries into `context.accumulated_summary`, then
/// marks `route.next_node = "supervisor_decide"` so the routing function hands
/// control to the supervisor exactly once per settled round.
pub struct AggregateNode;

#[async_trait]
impl Node for AggregateNode {
    fn name(&self) -> &str {
        "aggregate"
    }

    async fn run(&self, state: &DebateState, _cancel: Arc<AtomicBool>) -> Result<StateDelta, NodeError> {
        let round = state.route.loop_round;
        let mut summaries: Vec<_> = state
            .feedback
            .iter()
            .filter(|(_, fb)| fb.round == round)
            .map(|(name, fb)| format!("{name}: {}", fb.summary))
            .collect();
        summaries.sort();

        let mut delta = StateDelta::new();
        delta
            .context
            .insert(context_keys::ACCUMULATED_SUMMARY.to_string(), json!(summaries.join("\n")));
        delta.route = Some(Route {
            current_phase: state.route.current_phase,
            next_node: Some("supervisor_decide".to_string()),
            loop_round: round,
        });
        Ok(delta)
    }
}

pub struct SupervisorDecideNode {
    session_id: SessionId,
    router: Arc<SupervisorRouter>,
    eligible_specialists: Vec<String>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl SupervisorDecideNode {
    pub fn new(
        session_id: SessionId,
        router: Arc<SupervisorRouter>,
        eligible_specialists: Vec<String>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self { session_id, router, eligible_specialists, clock }
    }
}

#[async_trait]
impl Node for SupervisorDecideNode {
    fn name(&self) -> &str {
        "supervisor_decide"
    }

    async fn run(&self, state: &DebateState, _cancel: Arc<AtomicBool>) -> Result<StateDelta, NodeError> {
        let round = state.route.loop_round;
        let current_phase = state.route.current_phase;
        let decision = self
            .router
            .decide(self.session_id, state, current_phase, round, &self.eligible_specialists, self.clock.as_ref())
            .await;

        let Some(decision) = decision else {
            // Both layers deferred: stay put, clear the aggregate marker so the next
            // pump iteration re-evaluates once more feedback has arrived.
            let mut delta = StateDelta::new();
            delta.route = Some(Route {
                current_phase,
                next_node: None,
                loop_round: round,
            });
            return Ok(delta);
        };

        let mut delta = StateDelta::new();
        let next_round = if decision.next_phase == current_phase { round } else { round + 1 };
        delta.route = Some(Route {
            current_phase: decision.next_phase,
            next_node: None,
            loop_round: next_round,
        });
        for (agent_name, command) in decision.commands {
            delta.commands.insert(agent_name, command);
        }
        Ok(delta)
    }
}

pub struct ReportNode {
    session_id: SessionId,
    guard: ReportGuard,
    renderer: Arc<dyn ReportRenderer>,
    dispatcher: Arc<EventDispatcher>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl ReportNode {
    pub fn new(
        session_id: SessionId,
        guard: ReportGuard,
        renderer: Arc<dyn ReportRenderer>,
        dispatcher: Arc<EventDispatcher>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self { session_id, guard, renderer, dispatcher, clock }
    }
}

#[async_trait]
impl Node for ReportNode {
    fn name(&self) -> &str {
        "report"
    }

    async fn run(&self, state: &DebateState, _cancel: Arc<AtomicBool>) -> Result<StateDelta, NodeError> {
        let result = match self.guard.validate(state) {
            Ok(result) => result,
            Err(guard_error) => {
                return Err(NodeError::Rejected {
                    node: "report".to_string(),
                    error_code: debate_report::GuardError::ERROR_CODE.to_string(),
                    reason: guard_error.to_string(),
                    retry_hint: guard_error.retry_hint().to_string(),
                });
            }
        };

        self.renderer.render(result).await.map_err(|render_error| NodeError::Failed {
            node: "report".to_string(),
            reason: render_error.to_string(),
        })?;

        self.dispatcher.emit(
            self.session_id,
            EventType::ResultReady {
                root_cause: result.root_cause.clone(),
                confidence: result.confidence,
            },
            Some(debate_state::Phase::Report),
            None,
            self.clock.as_ref(),
        );
        let mut delta = StateDelta::new();
        delta.route = Some(Route {
            current_phase: debate_state::Phase::Terminal,
            next_node: None,
            loop_round: state.route.loop_round,
        });
        Ok(delta)
    }
}

pub struct TerminalNode;

#[async_trait]
impl Node for TerminalNode {
    fn name(&self) -> &str {
        "terminal"
    }

    async fn run(&self, state: &DebateState, _cancel: Arc<AtomicBool>) -> Result<StateDelta, NodeError> {
        Ok(StateDelta::new().with_route(state.route.clone()))
    }
}
