//! Drives a full `SessionService` stack — `InMemorySessionStore`, `StubLlmClient`,
//! and a `NullTool` per capability — through complete session runs, in place of a
//! live LLM/tool backend.

use async_trait::async_trait;
use debate_events::EventType;
use debate_graph::SessionStore;
use debate_llm::{ChatCompletion, ChatMessage, ChatRole, LlmClient, LlmError, TokenUsage};
use debate_runtime::{InMemorySessionStore, NullTool, StubLlmClient};
use debate_session::{ControlAction, SessionConfig, SessionService};
use debate_state::{FeedbackStatus, Incident, IncidentId, IncidentSeverity, RiskLevel, SystemClock};
use debate_tools::ToolKind;
use futures::StreamExt;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

fn test_incident() -> Incident {
    Incident {
        id: IncidentId::new(),
        title: "checkout 5xx spike".to_string(),
        description: "checkout service began returning 5xx for all write traffic".to_string(),
        severity: IncidentSeverity::High,
        service_name: "checkout".to_string(),
        environment: "prod".to_string(),
        log_content: "PANIC: could not write to file: No space left on device".to_string(),
    }
}

fn build_service() -> SessionService {
    let store = Arc::new(InMemorySessionStore::new());
    let dispatcher = Arc::new(debate_events::EventDispatcher::new(256));
    let clock = Arc::new(SystemClock);
    let llm_client = Arc::new(StubLlmClient);

    let mut service = SessionService::new(store, dispatcher, clock, llm_client, "test-model");
    for kind in ToolKind::ALL {
        service.register_tool(kind, Arc::new(NullTool::new(kind)));
    }
    service
}

#[tokio::test]
async fn happy_path_reaches_a_judged_final_result() {
    let service = build_service();
    let session_id = service.create_session(test_incident()).await.unwrap();
    service.start_session(session_id, SessionConfig::default()).await.unwrap();

    let result = service
        .fetch_final_result(session_id, Duration::from_secs(10))
        .await
        .expect("session should reach a final result");

    assert!(result.root_cause.contains("checkout-db-2"));
    assert!((result.confidence - 0.87).abs() < 1e-9);
    assert_eq!(result.risk_level, RiskLevel::High);
    assert!(result.evidence_chain.len() >= 2);
    assert!(!result.fix_recommendation.is_empty());
    assert!(!result.verification_plan.is_empty());
}

#[tokio::test]
async fn event_stream_carries_the_expected_phase_sequence() {
    let service = build_service();
    let session_id = service.create_session(test_incident()).await.unwrap();
    let mut events = service.subscribe(session_id, None);
    service.start_session(session_id, SessionConfig::default()).await.unwrap();

    let mut phases_seen = Vec::new();
    let mut saw_result_ready = false;
    let mut saw_session_completed = false;

    let drain = tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(event) = events.next().await {
            match event.event_type {
                EventType::PhaseChanged { to, .. } => phases_seen.push(to),
                EventType::ResultReady { .. } => saw_result_ready = true,
                EventType::SessionCompleted => {
                    saw_session_completed = true;
                    break;
                }
                EventType::SessionFailed { error_message, .. } => {
                    panic!("session failed unexpectedly: {error_message}");
                }
                _ => {}
            }
        }
    })
    .await;

    assert!(drain.is_ok(), "timed out waiting for session completion events");
    assert!(saw_result_ready, "expected a result_ready event before completion");
    assert!(saw_session_completed);
    assert_eq!(
        phases_seen,
        vec!["analysis", "judgment", "verification", "report", "terminal"],
        "low-confidence-free specialist round should skip critique/rebuttal entirely"
    );
}

#[tokio::test]
async fn cancelling_immediately_after_start_prevents_a_final_result() {
    let service = build_service();
    let session_id = service.create_session(test_incident()).await.unwrap();
    service.start_session(session_id, SessionConfig::default()).await.unwrap();
    service.send_control(session_id, ControlAction::Cancel).await.unwrap();

    let result = service.fetch_final_result(session_id, Duration::from_millis(500)).await;
    assert!(result.is_err(), "a cancelled session should never produce a final result");
}

#[tokio::test]
async fn fetch_final_result_times_out_before_the_session_is_started() {
    let service = build_service();
    let session_id = service.create_session(test_incident()).await.unwrap();

    let result = service.fetch_final_result(session_id, Duration::from_millis(150)).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn every_registered_agent_settles_with_feedback_by_the_time_analysis_completes() {
    let store = Arc::new(InMemorySessionStore::new());
    let dispatcher = Arc::new(debate_events::EventDispatcher::new(256));
    let clock = Arc::new(SystemClock);
    let llm_client = Arc::new(StubLlmClient);

    let mut service = SessionService::new(Arc::clone(&store), dispatcher, clock, llm_client, "test-model");
    for kind in ToolKind::ALL {
        service.register_tool(kind, Arc::new(NullTool::new(kind)));
    }

    let session_id = service.create_session(test_incident()).await.unwrap();
    service.start_session(session_id, SessionConfig::default()).await.unwrap();

    service
        .fetch_final_result(session_id, Duration::from_secs(10))
        .await
        .expect("session should conclude");

    let checkpoint = store.load_checkpoint(session_id).await.unwrap().expect("a checkpoint must exist");
    for agent_name in ["LogAgent", "DomainAgent", "CodeAgent"] {
        let feedback = checkpoint
            .state
            .feedback
            .get(agent_name)
            .unwrap_or_else(|| panic!("expected settled feedback for {agent_name}"));
        assert_eq!(feedback.status, FeedbackStatus::Ok);
        assert!(!feedback.evidence_refs.is_empty());
    }
}

/// Answers every prompt exactly like `StubLlmClient` except one specialist, picked
/// out by a substring of its system prompt, which never returns — standing in for a
/// specialist backend that has wedged. Used to exercise the per-round deadline that
/// `PhaseExecutor` wraps every commanded agent in.
struct LaggardClient {
    inner: StubLlmClient,
    laggard_marker: &'static str,
}

#[async_trait]
impl LlmClient for LaggardClient {
    async fn complete(&self, model_id: &str, messages: &[ChatMessage], timeout: Duration) -> Result<ChatCompletion, LlmError> {
        let is_laggard = messages
            .iter()
            .any(|m| m.role == ChatRole::System && m.content.contains(self.laggard_marker));
        if is_laggard {
            std::future::pending::<()>().await;
        }
        self.inner.complete(model_id, messages, timeout).await
    }
}

#[tokio::test(start_paused = true)]
async fn a_specialist_stuck_past_its_deadline_degrades_without_blocking_the_session() {
    let store = Arc::new(InMemorySessionStore::new());
    let dispatcher = Arc::new(debate_events::EventDispatcher::new(256));
    let clock = Arc::new(SystemClock);
    let llm_client = Arc::new(LaggardClient {
        inner: StubLlmClient,
        laggard_marker: "log analysis specialist",
    });

    let mut service = SessionService::new(Arc::clone(&store), dispatcher, clock, llm_client, "test-model");
    for kind in ToolKind::ALL {
        service.register_tool(kind, Arc::new(NullTool::new(kind)));
    }

    let session_id = service.create_session(test_incident()).await.unwrap();
    service.start_session(session_id, SessionConfig::default()).await.unwrap();

    let result = service
        .fetch_final_result(session_id, Duration::from_secs(600))
        .await
        .expect("a stuck specialist must not prevent the session from concluding");
    assert!(!result.root_cause.is_empty());

    let checkpoint = store.load_checkpoint(session_id).await.unwrap().expect("a checkpoint must exist");
    assert_eq!(
        checkpoint.state.feedback["LogAgent"].status,
        FeedbackStatus::Degraded,
        "the specialist that never answered must be recorded as degraded, not silently dropped"
    );
    assert_eq!(checkpoint.state.feedback["DomainAgent"].status, FeedbackStatus::Ok);
    assert_eq!(checkpoint.state.feedback["CodeAgent"].status, FeedbackStatus::Ok);
}

/// Answers every prompt exactly like `StubLlmClient` except the judge, whose
/// conclusion is deliberately unusable — standing in for a judge turn that couldn't
/// settle on a real root cause.
struct BlockedConclusionClient(StubLlmClient);

#[async_trait]
impl LlmClient for BlockedConclusionClient {
    async fn complete(&self, model_id: &str, messages: &[ChatMessage], timeout: Duration) -> Result<ChatCompletion, LlmError> {
        let is_judge = messages.iter().any(|m| m.role == ChatRole::System && m.content.contains("You are the judge"));
        if !is_judge {
            return self.0.complete(model_id, messages, timeout).await;
        }

        let response = json!({
            "root_cause": "insufficient information to determine a definitive root cause",
            "confidence": 0.8,
            "impact": "checkout writes failing with 5xx for all regions routed to checkout-db-2",
            "fix_recommendation": "gather more diagnostics before attempting a fix",
            "verification_plan": "re-run analysis once additional logs are available",
            "risk_level": "high",
            "evidence": [
                {
                    "source_kind": "log",
                    "source_ref": "checkout-db-2:/var/log/postgres/current:1842",
                    "description": "PANIC: could not write to file: No space left on device",
                    "strength": "strong",
                },
                {
                    "source_kind": "metric",
                    "source_ref": "disk.used_percent{host=checkout-db-2}",
                    "description": "disk usage climbed from 61% to 100% over six hours before the outage",
                    "strength": "strong",
                },
            ],
        });

        Ok(ChatCompletion {
            text: response.to_string(),
            token_usage: TokenUsage::default(),
        })
    }
}

#[tokio::test]
async fn a_blocked_phrase_conclusion_fails_the_session_instead_of_producing_a_result() {
    let store = Arc::new(InMemorySessionStore::new());
    let dispatcher = Arc::new(debate_events::EventDispatcher::new(256));
    let clock = Arc::new(SystemClock);
    let llm_client = Arc::new(BlockedConclusionClient(StubLlmClient));

    let mut service = SessionService::new(Arc::clone(&store), dispatcher, clock, llm_client, "test-model");
    for kind in ToolKind::ALL {
        service.register_tool(kind, Arc::new(NullTool::new(kind)));
    }

    let session_id = service.create_session(test_incident()).await.unwrap();
    let mut events = service.subscribe(session_id, None);
    service.start_session(session_id, SessionConfig::default()).await.unwrap();

    let failure = tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(event) = events.next().await {
            if let EventType::SessionFailed { error_code, error_message, retry_hint } = event.event_type {
                return (error_code, error_message, retry_hint);
            }
        }
        panic!("event stream ended before the session failed");
    })
    .await
    .expect("the session should fail rather than hang");

    assert_eq!(failure.0, "NO_VALID_CONCLUSION");
    assert!(!failure.1.is_empty());

    let result = service.fetch_final_result(session_id, Duration::from_millis(200)).await;
    assert!(result.is_err(), "a rejected conclusion must never surface as a final result");
}

/// Like `LaggardClient`, but the hang is released on command instead of being
/// permanent, and applies to everyone except `fast_marker` — models a specialist
/// backend that is down for most specialists, then recovers, so the same client can
/// be reused across a cancel-then-resume cycle while still letting one specialist
/// settle early.
struct RecoverableLaggardClient {
    inner: StubLlmClient,
    fast_marker: &'static str,
    hang_released: Arc<AtomicBool>,
    settled: Arc<Notify>,
}

#[async_trait]
impl LlmClient for RecoverableLaggardClient {
    async fn complete(&self, model_id: &str, messages: &[ChatMessage], timeout: Duration) -> Result<ChatCompletion, LlmError> {
        let is_fast = messages
            .iter()
            .any(|m| m.role == ChatRole::System && m.content.contains(self.fast_marker));
        if !is_fast {
            while !self.hang_released.load(Ordering::SeqCst) {
                tokio::task::yield_now().await;
            }
        }
        let result = self.inner.complete(model_id, messages, timeout).await;
        if is_fast {
            self.settled.notify_one();
        }
        result
    }
}

#[tokio::test]
async fn cancelling_mid_fanout_preserves_only_the_settled_specialists_feedback() {
    let store = Arc::new(InMemorySessionStore::new());
    let dispatcher = Arc::new(debate_events::EventDispatcher::new(256));
    let clock = Arc::new(SystemClock);
    let settled = Arc::new(Notify::new());
    let hang_released = Arc::new(AtomicBool::new(false));
    let llm_client = Arc::new(RecoverableLaggardClient {
        inner: StubLlmClient,
        fast_marker: "log analysis specialist",
        hang_released: Arc::clone(&hang_released),
        settled: Arc::clone(&settled),
    });

    let mut service = SessionService::new(Arc::clone(&store), dispatcher, clock, llm_client, "test-model");
    for kind in ToolKind::ALL {
        service.register_tool(kind, Arc::new(NullTool::new(kind)));
    }

    let session_id = service.create_session(test_incident()).await.unwrap();
    service.start_session(session_id, SessionConfig::default()).await.unwrap();

    settled.notified().await;
    service.send_control(session_id, ControlAction::Cancel).await.unwrap();

    let cancelled = service.fetch_final_result(session_id, Duration::from_millis(500)).await;
    assert!(cancelled.is_err(), "a cancelled round must never produce a final result");

    let checkpoint = store
        .load_checkpoint(session_id)
        .await
        .unwrap()
        .expect("cancellation checkpoints the partial progress");
    assert_eq!(checkpoint.last_node, "cancelled");
    assert!(
        checkpoint.state.feedback.contains_key("LogAgent"),
        "LogAgent settled before the cancel and must keep its feedback"
    );
    for stuck in ["DomainAgent", "CodeAgent"] {
        assert!(
            !checkpoint.state.feedback.contains_key(stuck),
            "{stuck} never settled and must contribute no feedback"
        );
    }
}

#[tokio::test]
async fn resuming_a_cancelled_session_from_its_checkpoint_still_reaches_a_final_result() {
    let store = Arc::new(InMemorySessionStore::new());
    let dispatcher = Arc::new(debate_events::EventDispatcher::new(256));
    let clock = Arc::new(SystemClock);
    let settled = Arc::new(Notify::new());
    let hang_released = Arc::new(AtomicBool::new(false));
    let llm_client = Arc::new(RecoverableLaggardClient {
        inner: StubLlmClient,
        fast_marker: "log analysis specialist",
        hang_released: Arc::clone(&hang_released),
        settled: Arc::clone(&settled),
    });

    let mut service = SessionService::new(Arc::clone(&store), dispatcher, clock, llm_client, "test-model");
    for kind in ToolKind::ALL {
        service.register_tool(kind, Arc::new(NullTool::new(kind)));
    }

    let session_id = service.create_session(test_incident()).await.unwrap();
    service.start_session(session_id, SessionConfig::default()).await.unwrap();

    settled.notified().await;
    service.send_control(session_id, ControlAction::Cancel).await.unwrap();

    let cancelled = service.fetch_final_result(session_id, Duration::from_millis(500)).await;
    assert!(cancelled.is_err(), "the session must not have a final result while cancelled");

    let checkpoint_before_resume = store
        .load_checkpoint(session_id)
        .await
        .unwrap()
        .expect("cancellation checkpoints progress");
    assert_eq!(checkpoint_before_resume.last_node, "cancelled");
    assert!(
        checkpoint_before_resume.state.feedback.contains_key("LogAgent"),
        "the settled specialist's feedback must survive into the checkpoint"
    );

    // The backend recovers: the same client now answers for every specialist.
    hang_released.store(true, Ordering::SeqCst);
    service.send_control(session_id, ControlAction::Resume).await.unwrap();

    let result = service
        .fetch_final_result(session_id, Duration::from_secs(10))
        .await
        .expect("resuming from the checkpoint should carry the session through to a final result");
    assert!(!result.root_cause.is_empty());

    let final_checkpoint = store.load_checkpoint(session_id).await.unwrap().expect("a final checkpoint must exist");
    assert_eq!(
        final_checkpoint.state.feedback["LogAgent"].status,
        FeedbackStatus::Ok,
        "the specialist that settled before the cancel must not be re-run on resume"
    );
}
