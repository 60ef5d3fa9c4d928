//! Event schema.

use chrono::{DateTime, Utc};
use debate_state::{Phase, SessionId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A stable event identifier, `hash(session_id, node, sequence_index)`.
/// Deterministic from content: replaying the same production sequence against the
/// same session always yields the same ids, which is what makes de-duplication
/// across live stream and persisted log possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "evt_{:016x}", self.0)
    }
}

impl EventId {
    /// Compute the id for (session, producing node/component, per-session sequence
    /// index). `node` is the graph node or dispatcher-internal component name that
    /// emitted the event (e.g. `"agent_log_node"`, `"llm_gateway"`).
    pub fn compute(session_id: SessionId, node: &str, sequence_index: u64) -> Self {
        let key = format!("{session_id}\u{0}{node}\u{0}{sequence_index}");
        Self(debate_state::hash::fnv1a_64(key.as_bytes()))
    }
}

/// Enumerated event types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum EventType {
    #[serde(rename = "session_started")]
    SessionStarted { incident_id: String },

    #[serde(rename = "session_completed")]
    SessionCompleted,

    #[serde(rename = "session_failed")]
    SessionFailed {
        error_code: String,
        error_message: String,
        retry_hint: String,
    },

    #[serde(rename = "session_cancelled")]
    SessionCancelled,

    #[serde(rename = "phase_changed")]
    PhaseChanged { from: String, to: String, loop_round: u32 },

    #[serde(rename = "agent_command_issued")]
    AgentCommandIssued { agent_name: String, task: String, deadline_ms: u64 },

    #[serde(rename = "agent_chat_message")]
    AgentChatMessage { agent_name: String, content: String },

    #[serde(rename = "agent_round")]
    AgentRound { round: u32, commanded_agents: Vec<String> },

    #[serde(rename = "agent_tool_context_prepared")]
    AgentToolContextPrepared { agent_name: String, tools: Vec<String> },

    #[serde(rename = "agent_tool_io")]
    AgentToolIo {
        agent_name: String,
        tool: String,
        status: String,
        summary: String,
    },

    #[serde(rename = "llm_request_started")]
    LlmRequestStarted { request_id: String, model_id: String },

    #[serde(rename = "llm_request_completed")]
    LlmRequestCompleted {
        request_id: String,
        latency_ms: u64,
        prompt_tokens: u64,
        completion_tokens: u64,
    },

    #[serde(rename = "llm_request_failed")]
    LlmRequestFailed { request_id: String, reason: String },

    #[serde(rename = "llm_request_timeout")]
    LlmRequestTimeout { request_id: String, latency_ms: u64 },

    #[serde(rename = "asset_interface_mapping_completed")]
    AssetInterfaceMappingCompleted { asset_count: u32 },

    #[serde(rename = "result_ready")]
    ResultReady { root_cause: String, confidence: f64 },

    /// Synthesized by the dispatcher itself when a subscriber queue overflows and
    /// the oldest queued event is dropped to make room.
    #[serde(rename = "stream_lag")]
    StreamLag { dropped_count: u64 },
}

impl EventType {
    /// The producing component name used as the `node` input to [`EventId::compute`].
    /// Grouping by type keeps ids stable even if call sites are refactored, since the
    /// hash input is the logical event kind, not a source file/line.
    pub fn node_name(&self) -> &'static str {
        match self {
            EventType::SessionStarted { .. } => "session",
            EventType::SessionCompleted => "session",
            EventType::SessionFailed { .. } => "session",
            EventType::SessionCancelled => "session",
            EventType::PhaseChanged { .. } => "route",
            EventType::AgentCommandIssued { .. } => "supervisor",
            EventType::AgentChatMessage { .. } => "agent",
            EventType::AgentRound { .. } => "phase_executor",
            EventType::AgentToolContextPrepared { .. } => "tool_context",
            EventType::AgentToolIo { .. } => "tool_context",
            EventType::LlmRequestStarted { .. } => "llm_gateway",
            EventType::LlmRequestCompleted { .. } => "llm_gateway",
            EventType::LlmRequestFailed { .. } => "llm_gateway",
            EventType::LlmRequestTimeout { .. } => "llm_gateway",
            EventType::AssetInterfaceMappingCompleted { .. } => "collect_assets",
            EventType::ResultReady { .. } => "report",
            EventType::StreamLag { .. } => "dispatcher",
        }
    }
}

/// One envelope in the event stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: EventId,
    pub session_id: SessionId,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event_type: EventType,
    pub phase: Option<Phase>,
    pub agent_name: Option<String>,
}

impl Event {
    pub fn new(
        session_id: SessionId,
        event_type: EventType,
        phase: Option<Phase>,
        agent_name: Option<String>,
        timestamp: DateTime<Utc>,
        sequence_index: u64,
    ) -> Self {
        let event_id = EventId::compute(session_id, event_type.node_name(), sequence_index);
        Self {
            event_id,
            session_id,
            timestamp,
            event_type,
            phase,
            agent_name,
        }
    }
}
