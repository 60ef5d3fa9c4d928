//! Session data model. Lifecycle *behavior* (launch, cancel, recover) lives in
//! `debate-session`; this module only carries the data and the status transition
//! rule, which is cheap enough to enforce right where the field lives.

use crate::error::StateError;
use crate::ids::{IncidentId, SessionId};
use serde::{Deserialize, Serialize};

/// A session's lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Running,
    Cancelled,
    Failed,
    Completed,
}

impl SessionStatus {
    /// {Pending} -> {Running} -> {Completed|Failed|Cancelled}; no reverse
    /// transitions, and no transition out of a terminal state.
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        matches!(
            (self, next),
            (Pending, Running) | (Running, Completed) | (Running, Failed) | (Running, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Failed | SessionStatus::Cancelled)
    }
}

/// Per-phase timeout and retry configuration snapshot, captured once at session
/// start and never mutated for the lifetime of the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfigSnapshot {
    pub max_rounds: u8,
    pub concurrency_limit: u8,
    pub per_phase_timeout_ms: std::collections::HashMap<String, u64>,
    pub per_phase_max_retries: std::collections::HashMap<String, u32>,
}

impl Default for SessionConfigSnapshot {
    fn default() -> Self {
        Self {
            max_rounds: 4,
            concurrency_limit: 4,
            per_phase_timeout_ms: Default::default(),
            per_phase_max_retries: Default::default(),
        }
    }
}

/// A session binds one incident to a bounded debate run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub incident_id: IncidentId,
    pub status: SessionStatus,
    pub round: u32,
    pub config: SessionConfigSnapshot,
}

impl Session {
    pub fn new(incident_id: IncidentId, config: SessionConfigSnapshot) -> Self {
        Self {
            id: SessionId::new(),
            incident_id,
            status: SessionStatus::Pending,
            round: 0,
            config,
        }
    }

    /// Enforce the status transition rule before mutating `status`.
    pub fn transition(&mut self, next: SessionStatus) -> Result<(), StateError> {
        if !self.status.can_transition_to(next) {
            return Err(StateError::InvalidPhaseTransition {
                from: format!("{:?}", self.status),
                to: format!("{next:?}"),
            });
        }
        self.status = next;
        Ok(())
    }
}
