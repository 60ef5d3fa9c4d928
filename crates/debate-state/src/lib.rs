//! Typed shared debate state and commutative reducers.
//!
//! This crate has no async runtime dependency and no knowledge of graphs, agents, or
//! LLMs — it is the foundation every other `debate-*` crate builds on, the way
//! `langgraph-core::state` underlies an orchestration stack.

pub mod clock;
pub mod context_shortcuts;
pub mod debate;
pub mod error;
pub mod evidence;
pub mod hash;
pub mod ids;
pub mod incident;
pub mod phase;
pub mod reducers;
pub mod session;

pub use clock::{Clock, FixedClock, SystemClock};
pub use debate::{
    context_keys, Command, DebateState, Feedback, FeedbackStatus, FinalResult, Message, Metrics,
    Role, RiskLevel, Route, ToolUsage,
};
pub use error::{Severity, StateError};
pub use evidence::{canonicalize_source_ref, evidence_id_for, Evidence, SourceKind, Strength};
pub use ids::{EvidenceId, IncidentId, MessageId, SessionId};
pub use incident::{Incident, Severity as IncidentSeverity};
pub use phase::Phase;
pub use reducers::{EvidencePolicy, StateDelta};
pub use session::{Session, SessionConfigSnapshot, SessionStatus};
