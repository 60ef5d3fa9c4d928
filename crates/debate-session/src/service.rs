//! Session Service: `create_session`, `start_session`, `subscribe`,
//! `send_control`, `fetch_final_result`. Grounded in the `TaskServiceImpl`/
//! `Orchestrator` pairing of `orchestrator::services::task`/`orchestrator::orchestrator`
//! — one long-lived service object owning the shared collaborators, spawning one
//! background task per running session rather than a per-request tonic handler.

use crate::config::SessionConfig;
use crate::control::ControlAction;
use debate_agent::{AgentRegistry, AgentRunner};
use debate_events::{EventDispatcher, EventStream};
use debate_graph::{GraphExecutor, NodeRegistry, SessionStore};
use debate_llm::{LlmClient, LlmGateway};
use debate_phase::{PhaseExecutor, PhaseExecutorConfig};
use debate_report::{PlainTextRenderer, ReportGuard, ReportGuardConfig};
use debate_router::{LlmSupervisor, RuleSupervisor, RuleSupervisorConfig, SupervisorRouter};
use debate_state::{Clock, DebateState, FeedbackStatus, FinalResult, Incident, SessionId, SessionStatus};
use debate_tools::{Tool, ToolContextService, ToolKind, ToolPolicy};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SessionServiceError {
    #[error("unknown session: {0}")]
    UnknownSession(SessionId),
    #[error("session already started")]
    AlreadyStarted,
    #[error("no checkpoint to resume from")]
    NoCheckpoint,
    #[error("timed out waiting for a final result")]
    TimedOut,
    #[error("checkpoint store error: {0}")]
    Store(#[from] debate_graph::StoreError),
}

struct RunningSession {
    status: SessionStatus,
    incident: Incident,
    config: SessionConfig,
    cancel: Arc<AtomicBool>,
    join_handle: Option<JoinHandle<()>>,
}

/// Owns every collaborator a running session needs and tracks the set of sessions
/// currently in flight. One instance per process; `create_session`/`start_session`
/// are cheap enough to call per incoming incident.
pub struct SessionService {
    store: Arc<dyn SessionStore>,
    dispatcher: Arc<EventDispatcher>,
    clock: Arc<dyn Clock + Send + Sync>,
    llm_client: Arc<dyn LlmClient>,
    model_id: String,
    agents: Arc<AgentRegistry>,
    tools: Vec<(ToolKind, Arc<dyn Tool>)>,
    sessions: Mutex<HashMap<SessionId, RunningSession>>,
}

impl SessionService {
    pub fn new(
        store: Arc<dyn SessionStore>,
        dispatcher: Arc<EventDispatcher>,
        clock: Arc<dyn Clock + Send + Sync>,
        llm_client: Arc<dyn LlmClient>,
        model_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            clock,
            llm_client,
            model_id: model_id.into(),
            agents: Arc::new(AgentRegistry::standard()),
            tools: Vec::new(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Register a tool implementation against its capability kind, for every future
    /// session this service starts.
    pub fn register_tool(&mut self, kind: ToolKind, tool: Arc<dyn Tool>) {
        self.tools.push((kind, tool));
    }

    /// Allocate a session id, persist the bootstrap checkpoint, and return
    /// immediately without running anything.
    pub async fn create_session(&self, incident: Incident) -> Result<SessionId, SessionServiceError> {
        let session_id = SessionId::new();
        let state = DebateState::new();
        self.store
            .save_checkpoint(&debate_graph::Checkpoint {
                session_id,
                state,
                last_node: "created".to_string(),
            })
            .await?;
        self.sessions.lock().await.insert(
            session_id,
            RunningSession {
                status: SessionStatus::Pending,
                incident,
                config: SessionConfig::default(),
                cancel: Arc::new(AtomicBool::new(false)),
                join_handle: None,
            },
        );
        info!(%session_id, "session created");
        Ok(session_id)
    }

    fn build_registry(&self, session_id: SessionId, incident: Incident, config: &SessionConfig) -> NodeRegistry {
        let llm_gateway = Arc::new(LlmGateway::new(Arc::clone(&self.llm_client), Arc::clone(&self.dispatcher)));

        let mut policy = ToolPolicy::default();
        for (kind, enabled) in &config.tools_enabled {
            policy.set_enabled(*kind, *enabled);
        }
        let mut tool_service = ToolContextService::new(policy, Arc::clone(&self.dispatcher));
        for (kind, tool) in &self.tools {
            tool_service.register(*kind, Arc::clone(tool));
        }

        let runner = Arc::new(AgentRunner::new(
            Arc::clone(&llm_gateway),
            Arc::new(tool_service),
            Arc::clone(&self.agents),
            self.model_id.clone(),
        ));
        let phase_executor = Arc::new(PhaseExecutor::new(
            Arc::clone(&runner),
            PhaseExecutorConfig { max_concurrency: config.concurrency_limit },
        ));
        let rule_supervisor = RuleSupervisor::new(RuleSupervisorConfig {
            max_rounds: config.max_rounds,
            ..RuleSupervisorConfig::default()
        });
        let llm_supervisor = LlmSupervisor::new(Arc::clone(&llm_gateway), self.model_id.clone());
        let supervisor_router = Arc::new(SupervisorRouter::with_mode(
            rule_supervisor,
            llm_supervisor,
            config.supervisor_mode,
            Arc::clone(&self.dispatcher),
        ));
        let guard = ReportGuard::new(ReportGuardConfig::default());
        let renderer = Arc::new(PlainTextRenderer);

        NodeRegistry::build_standard(
            session_id,
            incident,
            &self.agents,
            runner,
            phase_executor,
            supervisor_router,
            guard,
            renderer,
            Arc::clone(&self.dispatcher),
            Arc::clone(&self.clock),
        )
    }

    /// Build the per-session collaborator graph from `config` and spawn the pump
    /// loop in the background. The incident was already supplied
    /// to `create_session`; `config` is stored so `send_control(Resume | …)` can
    /// rebuild the same collaborator graph later.
    pub async fn start_session(&self, session_id: SessionId, config: SessionConfig) -> Result<(), SessionServiceError> {
        let mut sessions = self.sessions.lock().await;
        let running = sessions.get_mut(&session_id).ok_or(SessionServiceError::UnknownSession(session_id))?;
        if running.status != SessionStatus::Pending {
            return Err(SessionServiceError::AlreadyStarted);
        }
        running.status = SessionStatus::Running;
        running.config = config.clone();
        let incident = running.incident.clone();
        let cancel = Arc::clone(&running.cancel);
        drop(sessions);

        let registry = self.build_registry(session_id, incident, &config);
        let executor = GraphExecutor::new(registry, Arc::clone(&self.store), Arc::clone(&self.dispatcher), Arc::clone(&self.clock));
        let state = DebateState::new();

        let handle = tokio::spawn(async move {
            if let Err(error) = executor.run(session_id, state, cancel).await {
                warn!(%session_id, %error, "session ended without a clean completion");
            }
        });

        if let Some(running) = self.sessions.lock().await.get_mut(&session_id) {
            running.join_handle = Some(handle);
        }
        Ok(())
    }

    /// Subscribe to this session's event stream, optionally resuming from a prior
    /// cursor. Delegates directly to the dispatcher's atomic
    /// replay-then-register.
    pub fn subscribe(&self, session_id: SessionId, resume_cursor: Option<debate_events::EventId>) -> EventStream {
        EventStream::new(self.dispatcher.subscribe(session_id, resume_cursor))
    }

    /// Apply a control action: `{cancel, resume, retry_failed_only}`.
    pub async fn send_control(&self, session_id: SessionId, action: ControlAction) -> Result<(), SessionServiceError> {
        match action {
            ControlAction::Cancel => {
                let sessions = self.sessions.lock().await;
                let running = sessions.get(&session_id).ok_or(SessionServiceError::UnknownSession(session_id))?;
                running.cancel.store(true, Ordering::SeqCst);
                Ok(())
            }
            ControlAction::Resume => self.resume(session_id, false).await,
            ControlAction::RetryFailedOnly => self.resume(session_id, true).await,
        }
    }

    async fn resume(&self, session_id: SessionId, retry_failed_only: bool) -> Result<(), SessionServiceError> {
        let checkpoint = self.store.load_checkpoint(session_id).await?.ok_or(SessionServiceError::NoCheckpoint)?;
        let mut state = checkpoint.state;

        if retry_failed_only {
            let round = state.route.loop_round;
            let failed: Vec<String> = state
                .feedback
                .iter()
                .filter(|(_, fb)| fb.round == round && fb.status == FeedbackStatus::Failed)
                .map(|(name, _)| name.clone())
                .collect();
            for name in failed {
                state.feedback.remove(&name);
            }
        }

        let cancel = Arc::new(AtomicBool::new(false));
        let (incident, config) = {
            let mut sessions = self.sessions.lock().await;
            let running = sessions.get_mut(&session_id).ok_or(SessionServiceError::UnknownSession(session_id))?;
            running.status = SessionStatus::Running;
            running.cancel = Arc::clone(&cancel);
            (running.incident.clone(), running.config.clone())
        };

        let registry = self.build_registry(session_id, incident, &config);
        let executor = GraphExecutor::new(registry, Arc::clone(&self.store), Arc::clone(&self.dispatcher), Arc::clone(&self.clock));
        let handle = tokio::spawn(async move {
            if let Err(error) = executor.run(session_id, state, cancel).await {
                warn!(%session_id, %error, "resumed session ended without a clean completion");
            }
        });
        if let Some(running) = self.sessions.lock().await.get_mut(&session_id) {
            running.join_handle = Some(handle);
        }
        Ok(())
    }

    /// The one blocking-with-timeout operation on this service — poll the
    /// checkpoint store until `final_result` is set or `timeout` elapses.
    pub async fn fetch_final_result(&self, session_id: SessionId, timeout: Duration) -> Result<FinalResult, SessionServiceError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(checkpoint) = self.store.load_checkpoint(session_id).await? {
                if let Some(result) = checkpoint.state.final_result {
                    return Ok(result);
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(SessionServiceError::TimedOut);
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}
