//! `GraphExecutor`: the pump loop that drives `route()` against the `NodeRegistry`,
//! checkpointing after every node and translating fatal node/state errors into a
//! terminal `session_failed` event. Grounded in `langgraph-core/src/compiled/tests.rs`'s
//! `CompiledGraph::invoke` step loop, which shows the same checkpoint-after-every-step
//! plus `AtomicBool` cooperative-cancel idiom used here, since this workspace carries
//! no `tokio-util::CancellationToken` dependency.

use crate::node::NodeError;
use crate::registry::NodeRegistry;
use crate::routing::{route, RouteTarget};
use crate::session_store::{Checkpoint, SessionStore, StoreError};
use debate_events::{EventDispatcher, EventType};
use debate_state::{Clock, DebateState, EvidencePolicy, SessionId, StateDelta};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("node {node} not found in registry")]
    UnknownNode { node: String },
    #[error("node execution failed: {0}")]
    Node(#[from] NodeError),
    #[error("state transition rejected: {0}")]
    State(#[from] debate_state::StateError),
    #[error("checkpoint store error: {0}")]
    Store(#[from] StoreError),
    #[error("session cancelled")]
    Cancelled,
}

/// Drives one session to completion or to a cancellation/failure boundary.
pub struct GraphExecutor {
    registry: NodeRegistry,
    store: Arc<dyn SessionStore>,
    dispatcher: Arc<EventDispatcher>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl GraphExecutor {
    pub fn new(
        registry: NodeRegistry,
        store: Arc<dyn SessionStore>,
        dispatcher: Arc<EventDispatcher>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self { registry, store, dispatcher, clock }
    }

    /// Run `state` forward until `RouteTarget::End`, a fatal error, or `cancel` flips
    /// true. On success or failure, persists a final checkpoint and emits the matching
    /// terminal event. Callers resuming a session should load the last checkpoint via
    /// the `SessionStore` and pass its `state` back in here unchanged.
    pub async fn run(
        &self,
        session_id: SessionId,
        mut state: DebateState,
        cancel: Arc<AtomicBool>,
    ) -> Result<DebateState, ExecutorError> {
        loop {
            if cancel.load(Ordering::SeqCst) {
                self.dispatcher.emit(session_id, EventType::SessionCancelled, Some(state.route.current_phase), None, self.clock.as_ref());
                self.checkpoint(session_id, &state, "cancelled").await?;
                return Err(ExecutorError::Cancelled);
            }

            match route(&state) {
                RouteTarget::End => {
                    self.dispatcher.emit(session_id, EventType::SessionCompleted, Some(state.route.current_phase), None, self.clock.as_ref());
                    self.checkpoint(session_id, &state, "terminal").await?;
                    return Ok(state);
                }
                RouteTarget::Node(name) => {
                    let Some(node) = self.registry.get(&name) else {
                        return Err(ExecutorError::UnknownNode { node: name });
                    };

                    let delta = match node.run(&state, Arc::clone(&cancel)).await {
                        Ok(delta) => delta,
                        Err(NodeError::Cancelled { node: cancelled_node, partial }) => {
                            return self.cancel_mid_node(session_id, state, cancelled_node, partial).await;
                        }
                        Err(node_error) => {
                            return self.fail(session_id, &state, node_error).await;
                        }
                    };

                    if let Err(state_error) = state.apply(delta, EvidencePolicy::default()) {
                        warn!(node = %name, error = %state_error, "delta rejected by state invariants");
                        return self.fail_state(session_id, &state, state_error).await;
                    }

                    self.checkpoint(session_id, &state, &name).await?;
                    info!(node = %name, phase = %state.route.current_phase, "node executed");
                }
            }
        }
    }

    async fn fail(&self, session_id: SessionId, state: &DebateState, node_error: NodeError) -> Result<DebateState, ExecutorError> {
        let (error_code, error_message, retry_hint) = match &node_error {
            NodeError::Failed { node, reason } => ("NODE_FAILED".to_string(), format!("{node}: {reason}"), "retry the session".to_string()),
            NodeError::Rejected { node, error_code, reason, retry_hint } => {
                (error_code.clone(), format!("{node}: {reason}"), retry_hint.clone())
            }
            NodeError::Cancelled { node, .. } => ("NODE_CANCELLED".to_string(), format!("{node} observed cancellation"), "resume from the last checkpoint".to_string()),
        };
        error!(error_code = %error_code, "session failed");
        self.dispatcher.emit(session_id, EventType::SessionFailed { error_code, error_message, retry_hint }, Some(state.route.current_phase), None, self.clock.as_ref());
        self.checkpoint(session_id, state, "failed").await?;
        Err(ExecutorError::Node(node_error))
    }

    async fn fail_state(&self, session_id: SessionId, state: &DebateState, state_error: debate_state::StateError) -> Result<DebateState, ExecutorError> {
        self.dispatcher.emit(
            session_id,
            EventType::SessionFailed {
                error_code: "INVARIANT_VIOLATION".to_string(),
                error_message: state_error.to_string(),
                retry_hint: "resume from the last checkpoint".to_string(),
            },
            Some(state.route.current_phase),
            None,
            self.clock.as_ref(),
        );
        self.checkpoint(session_id, state, "failed").await?;
        Err(ExecutorError::State(state_error))
    }

    /// A node observed the cancel flag mid-flight with `partial` progress already
    /// committed (e.g. a fan-out round where one specialist had already settled). The
    /// partial delta is applied before the session is checkpointed cancelled, so the
    /// settled progress is visible in the event log even though the round never
    /// completed.
    async fn cancel_mid_node(
        &self,
        session_id: SessionId,
        mut state: DebateState,
        node: String,
        partial: StateDelta,
    ) -> Result<DebateState, ExecutorError> {
        if let Err(state_error) = state.apply(partial, EvidencePolicy::default()) {
            warn!(node = %node, error = %state_error, "partial delta from a cancelled node rejected by state invariants");
        }
        self.dispatcher.emit(session_id, EventType::SessionCancelled, Some(state.route.current_phase), None, self.clock.as_ref());
        self.checkpoint(session_id, &state, "cancelled").await?;
        Err(ExecutorError::Cancelled)
    }

    async fn checkpoint(&self, session_id: SessionId, state: &DebateState, last_node: &str) -> Result<(), StoreError> {
        self.store
            .save_checkpoint(&Checkpoint {
                session_id,
                state: state.clone(),
                last_node: last_node.to_string(),
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use crate::simple_nodes::TerminalNode;
    use async_trait::async_trait;
    use debate_state::{Phase, Route, StateDelta, SystemClock};

    struct InMemoryStore {
        checkpoints: tokio::sync::Mutex<std::collections::HashMap<SessionId, Checkpoint>>,
    }

    impl InMemoryStore {
        fn new() -> Self {
            Self { checkpoints: tokio::sync::Mutex::new(std::collections::HashMap::new()) }
        }
    }

    #[async_trait]
    impl SessionStore for InMemoryStore {
        async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), StoreError> {
            self.checkpoints.lock().await.insert(checkpoint.session_id, checkpoint.clone());
            Ok(())
        }
        async fn load_checkpoint(&self, session_id: SessionId) -> Result<Option<Checkpoint>, StoreError> {
            Ok(self.checkpoints.lock().await.get(&session_id).cloned())
        }
        async fn append_event(&self, _session_id: SessionId, _event: debate_events::Event) -> Result<(), StoreError> {
            Ok(())
        }
        async fn load_events_since(
            &self,
            _session_id: SessionId,
            _cursor: Option<debate_events::EventId>,
        ) -> Result<Vec<debate_events::Event>, StoreError> {
            Ok(Vec::new())
        }
    }

    struct AlwaysFailNode;

    #[async_trait]
    impl Node for AlwaysFailNode {
        fn name(&self) -> &str {
            "init_session"
        }
        async fn run(&self, _state: &DebateState, _cancel: Arc<AtomicBool>) -> Result<StateDelta, NodeError> {
            Err(NodeError::Failed { node: "init_session".to_string(), reason: "boom".to_string() })
        }
    }

    fn dispatcher() -> Arc<EventDispatcher> {
        Arc::new(EventDispatcher::new(16))
    }

    #[tokio::test]
    async fn already_terminal_session_completes_immediately() {
        let mut registry = NodeRegistry::new();
        registry.register(Arc::new(TerminalNode));
        let executor = GraphExecutor::new(registry, Arc::new(InMemoryStore::new()), dispatcher(), Arc::new(SystemClock));

        let mut state = DebateState::new();
        state.route.current_phase = Phase::Terminal;

        let session_id = SessionId::new();
        let result = executor.run(session_id, state, Arc::new(AtomicBool::new(false))).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn node_failure_emits_session_failed_and_propagates() {
        let mut registry = NodeRegistry::new();
        registry.register(Arc::new(AlwaysFailNode));
        let executor = GraphExecutor::new(registry, Arc::new(InMemoryStore::new()), dispatcher(), Arc::new(SystemClock));

        let state = DebateState::new();
        let session_id = SessionId::new();
        let result = executor.run(session_id, state, Arc::new(AtomicBool::new(false))).await;
        assert!(matches!(result, Err(ExecutorError::Node(_))));
    }

    struct MidNodeCancelNode;

    #[async_trait]
    impl Node for MidNodeCancelNode {
        fn name(&self) -> &str {
            "init_session"
        }
        async fn run(&self, _state: &DebateState, _cancel: Arc<AtomicBool>) -> Result<StateDelta, NodeError> {
            let partial = StateDelta::new().with_feedback("LogAgent", debate_agent::degraded_feedback(1, "settled before the cancel"));
            Err(NodeError::Cancelled { node: "init_session".to_string(), partial })
        }
    }

    #[tokio::test]
    async fn mid_node_cancellation_checkpoints_the_partial_delta_before_failing() {
        let mut registry = NodeRegistry::new();
        registry.register(Arc::new(MidNodeCancelNode));
        let store = Arc::new(InMemoryStore::new());
        let executor = GraphExecutor::new(registry, Arc::clone(&store) as Arc<dyn SessionStore>, dispatcher(), Arc::new(SystemClock));

        let state = DebateState::new();
        let session_id = SessionId::new();
        let result = executor.run(session_id, state, Arc::new(AtomicBool::new(false))).await;
        assert!(matches!(result, Err(ExecutorError::Cancelled)));

        let checkpoint = store.load_checkpoint(session_id).await.unwrap().expect("cancellation must checkpoint");
        assert_eq!(checkpoint.last_node, "cancelled");
        assert!(checkpoint.state.feedback.contains_key("LogAgent"), "the settled specialist's feedback must survive the cancel");
    }

    #[tokio::test]
    async fn pre_flipped_cancel_flag_stops_before_any_node_runs() {
        let registry = NodeRegistry::new();
        let executor = GraphExecutor::new(registry, Arc::new(InMemoryStore::new()), dispatcher(), Arc::new(SystemClock));

        let state = DebateState::new();
        let session_id = SessionId::new();
        let result = executor.run(session_id, state, Arc::new(AtomicBool::new(true))).await;
        assert!(matches!(result, Err(ExecutorError::Cancelled)));
    }

    #[tokio::test]
    async fn unknown_node_name_is_reported() {
        let mut registry = NodeRegistry::new();
        registry.register(Arc::new(TerminalNode));
        let executor = GraphExecutor::new(registry, Arc::new(InMemoryStore::new()), dispatcher(), Arc::new(SystemClock));

        let mut state = DebateState::new();
        state.route = Route { current_phase: Phase::Judgment, next_node: None, loop_round: 0 };
        let session_id = SessionId::new();
        let result = executor.run(session_id, state, Arc::new(AtomicBool::new(false))).await;
        assert!(matches!(result, Err(ExecutorError::UnknownNode { .. })));
    }
}
