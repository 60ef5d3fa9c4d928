//! `InMemorySessionStore`: an in-process `debate_graph::SessionStore` backed by two
//! `RwLock`-guarded maps, one per session for the latest checkpoint and one for its
//! append-only event log. Grounded in `langgraph-checkpoint::memory`'s
//! `InMemoryCheckpointSaver` — same `Arc<RwLock<HashMap>>` shape and the same
//! `new`/`Default`/test-helper texture, with a second map added since this trait
//! tracks events as well as checkpoints.

use async_trait::async_trait;
use debate_events::{Event, EventId};
use debate_graph::{Checkpoint, SessionStore, StoreError};
use debate_state::SessionId;
use std::collections::HashMap;
use tokio::sync::RwLock;

pub struct InMemorySessionStore {
    checkpoints: RwLock<HashMap<SessionId, Checkpoint>>,
    events: RwLock<HashMap<SessionId, Vec<Event>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            checkpoints: RwLock::new(HashMap::new()),
            events: RwLock::new(HashMap::new()),
        }
    }

    /// Number of sessions with at least one persisted checkpoint.
    pub async fn session_count(&self) -> usize {
        self.checkpoints.read().await.len()
    }

    /// Drop every checkpoint and event, useful for test isolation between cases that
    /// share one store instance.
    pub async fn clear(&self) {
        self.checkpoints.write().await.clear();
        self.events.write().await.clear();
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), StoreError> {
        self.checkpoints.write().await.insert(checkpoint.session_id, checkpoint.clone());
        Ok(())
    }

    async fn load_checkpoint(&self, session_id: SessionId) -> Result<Option<Checkpoint>, StoreError> {
        Ok(self.checkpoints.read().await.get(&session_id).cloned())
    }

    async fn append_event(&self, session_id: SessionId, event: Event) -> Result<(), StoreError> {
        self.events.write().await.entry(session_id).or_default().push(event);
        Ok(())
    }

    async fn load_events_since(
        &self,
        session_id: SessionId,
        cursor: Option<EventId>,
    ) -> Result<Vec<Event>, StoreError> {
        let events = self.events.read().await;
        let Some(log) = events.get(&session_id) else {
            return Ok(Vec::new());
        };
        let start = match cursor {
            Some(id) => log.iter().position(|e| e.event_id == id).map(|idx| idx + 1).unwrap_or(0),
            None => 0,
        };
        Ok(log[start..].to_vec())
    }
}
