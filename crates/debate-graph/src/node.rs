//! The node contract: `async (state) -> delta`, required to be effectively
//! idempotent under checkpoint replay. Grounded in `graph.rs`'s `NodeSpec::executor`
//! closure shape, generalized from a boxed-closure into a named trait so
//! specialist nodes can carry their own `AgentRunner` handle.

use async_trait::async_trait;
use debate_state::{DebateState, Severity, StateDelta};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum NodeError {
    #[error("node {node} failed: {reason}")]
    Failed { node: String, reason: String },

    /// A node failure with a caller-facing structured error code, distinct from the
    /// generic `Failed` variant so the graph executor can surface e.g.
    /// `ReportGuard`'s `NO_VALID_CONCLUSION` code on the `session_failed` event
    /// instead of flattening it into free text.
    #[error("node {node} failed ({error_code}): {reason}")]
    Rejected {
        node: String,
        error_code: String,
        reason: String,
        retry_hint: String,
    },

    /// The cooperative cancel flag was observed mid-node. `partial` carries whatever
    /// progress the node had already committed (e.g. specialists that settled before
    /// the rest of a fan-out round was abandoned) so the caller can checkpoint it
    /// instead of discarding it.
    #[error("node {node} observed cancellation")]
    Cancelled { node: String, partial: StateDelta },
}

impl NodeError {
    pub fn severity(&self) -> Severity {
        match self {
            NodeError::Failed { .. } | NodeError::Rejected { .. } => Severity::Fatal,
            NodeError::Cancelled { .. } => Severity::Cancellation,
        }
    }
}

/// One executable unit of the graph. Implementors must be side-effect-safe to
/// re-execute with the same input state after a checkpoint restore.
#[async_trait]
pub trait Node: Send + Sync {
    /// The name this node is registered under — also the routing function's target.
    fn name(&self) -> &str;

    /// `cancel` is polled cooperatively; implementations that fan out internally
    /// (e.g. `phase_fanout`) must check it between settling sub-tasks, not just on
    /// entry, so a mid-round cancel can still preserve already-settled progress.
    async fn run(&self, state: &DebateState, cancel: Arc<AtomicBool>) -> Result<StateDelta, NodeError>;
}
