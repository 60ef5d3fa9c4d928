//! The shared debate state mutated through reducers.

use crate::clock::Clock;
use crate::evidence::Evidence;
use crate::ids::{EvidenceId, MessageId};
use crate::phase::Phase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Supervisor,
    Specialist,
    System,
}

/// One turn in the append-only conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub agent_name: String,
    pub phase: Phase,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(clock: &dyn Clock, role: Role, agent_name: impl Into<String>, phase: Phase, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role,
            agent_name: agent_name.into(),
            phase,
            content: content.into(),
            timestamp: clock.now(),
        }
    }
}

/// Well-known keys for the `context` map.
pub mod context_keys {
    pub const INCIDENT_SUMMARY: &str = "incident_summary";
    pub const RAW_LOG_EXCERPT: &str = "raw_log_excerpt";
    pub const ASSET_MAPPING: &str = "asset_mapping";
    pub const ACCUMULATED_SUMMARY: &str = "accumulated_summary";
    /// Written by the Event Dispatcher as the persisted tail of the event log, so
    /// recovery can replay events from state alone without a separate store
    /// round-trip.
    pub const EVENT_LOG: &str = "event_log";
}

/// Whether a specialist must, may, or must not invoke tools for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolUsage {
    Forbidden,
    Optional,
    Required,
}

/// A supervisor -> specialist command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub issued_round: u32,
    pub task: String,
    pub focus: String,
    pub expected_output_schema_id: String,
    pub use_tool: ToolUsage,
    pub tool_targets: HashSet<String>,
    pub deadline_ms: u64,
}

/// How a commanded agent's turn settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatus {
    Ok,
    Degraded,
    Failed,
}

/// A specialist -> supervisor feedback record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub round: u32,
    pub status: FeedbackStatus,
    pub summary: String,
    pub evidence_refs: HashSet<EvidenceId>,
    pub confidence: f64,
    pub missing_info: Vec<String>,
    pub open_questions: Vec<String>,
}

/// Routing cursor: which phase the debate is in and what runs next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub current_phase: Phase,
    pub next_node: Option<String>,
    pub loop_round: u32,
}

impl Default for Route {
    fn default() -> Self {
        Self {
            current_phase: Phase::Init,
            next_node: None,
            loop_round: 0,
        }
    }
}

/// Accumulated, element-wise-additive metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub phase_latencies_ms: HashMap<String, u64>,
    pub retry_counts: HashMap<String, u32>,
    pub timeout_counts: HashMap<String, u32>,
    pub token_totals: HashMap<String, u64>,
}

impl Metrics {
    /// Element-wise add: every key in `other` is added onto the corresponding entry
    /// in `self` (or inserted if absent). This is commutative and associative, which
    /// is what lets concurrent specialists' metric deltas merge in any order.
    pub fn add_assign(&mut self, other: &Metrics) {
        for (k, v) in &other.phase_latencies_ms {
            *self.phase_latencies_ms.entry(k.clone()).or_insert(0) += v;
        }
        for (k, v) in &other.retry_counts {
            *self.retry_counts.entry(k.clone()).or_insert(0) += v;
        }
        for (k, v) in &other.timeout_counts {
            *self.timeout_counts.entry(k.clone()).or_insert(0) += v;
        }
        for (k, v) in &other.token_totals {
            *self.token_totals.entry(k.clone()).or_insert(0) += v;
        }
    }
}

/// Overall risk assessment attached to a final result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// The adjudicated outcome of the debate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalResult {
    pub root_cause: String,
    pub confidence: f64,
    pub evidence_chain: Vec<EvidenceId>,
    pub impact: String,
    pub fix_recommendation: String,
    pub verification_plan: String,
    pub risk_level: RiskLevel,
}

/// The full shared state of one debate session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebateState {
    pub messages: Vec<Message>,
    pub context: HashMap<String, serde_json::Value>,
    pub commands: HashMap<String, Command>,
    pub feedback: HashMap<String, Feedback>,
    pub evidence: Vec<Evidence>,
    pub agent_outputs: HashMap<String, serde_json::Value>,
    pub route: Route,
    pub metrics: Metrics,
    pub final_result: Option<FinalResult>,
}

impl DebateState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every agent named in `commands` for the current round that has *not* yet
    /// posted feedback for that round. Used by both the routing function and the
    /// Phase Executor's fan-in wait.
    pub fn pending_agents_for_round(&self, round: u32) -> Vec<String> {
        self.commands
            .iter()
            .filter(|(_, cmd)| cmd.issued_round == round)
            .filter(|(name, _)| {
                !self
                    .feedback
                    .get(*name)
                    .is_some_and(|fb| fb.round == round)
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// A round is complete only when every commanded agent has settled.
    pub fn round_complete(&self, round: u32) -> bool {
        self.pending_agents_for_round(round).is_empty()
    }

    pub fn evidence_by_id(&self, id: EvidenceId) -> Option<&Evidence> {
        self.evidence.iter().find(|e| e.evidence_id == id)
    }
}
