//! The Session Store collaborator seam: `save_checkpoint`, `load_checkpoint`,
//! `append_event`, `load_events_since`. Grounded in the `CheckpointSaver` trait
//! from `langgraph-checkpoint::traits` — generalized from
//! version-tracked multi-channel checkpoints down to one whole-state snapshot per
//! node completion, since `DebateState` is a single serializable struct rather than a
//! set of independently-versioned channels.

use async_trait::async_trait;
use debate_events::Event;
use debate_state::{DebateState, SessionId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
}

/// A whole-state snapshot persisted after a node completes:
/// `{session_id, state_snapshot, last_node}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub session_id: SessionId,
    pub state: DebateState,
    pub last_node: String,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), StoreError>;
    async fn load_checkpoint(&self, session_id: SessionId) -> Result<Option<Checkpoint>, StoreError>;
    async fn append_event(&self, session_id: SessionId, event: Event) -> Result<(), StoreError>;
    async fn load_events_since(
        &self,
        session_id: SessionId,
        cursor: Option<debate_events::EventId>,
    ) -> Result<Vec<Event>, StoreError>;
}
