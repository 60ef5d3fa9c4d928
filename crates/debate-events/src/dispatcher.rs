//! Event Dispatcher: assigns ids, de-duplicates, and fans out to subscribers and the
//! persisted log.

use crate::event::{Event, EventId, EventType};
use dashmap::DashMap;
use debate_state::{Clock, Phase, SessionId};
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

/// A bounded per-subscriber queue. On overflow the oldest event is dropped and the
/// drop count surfaces as a synthetic `stream_lag` event.
pub struct SubscriberQueue {
    inner: Mutex<VecDeque<Event>>,
    capacity: usize,
    notify: tokio::sync::Notify,
    dropped: AtomicU64,
}

impl SubscriberQueue {
    fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            notify: tokio::sync::Notify::new(),
            dropped: AtomicU64::new(0),
        }
    }

    /// Push an event, returning `Some(dropped_count)` if this push caused an
    /// overflow eviction.
    fn push(&self, event: Event) -> Option<u64> {
        let mut result = None;
        {
            let mut queue = self.inner.lock();
            if queue.len() >= self.capacity {
                queue.pop_front();
                let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                result = Some(total);
            }
            queue.push_back(event);
        }
        self.notify.notify_one();
        result
    }

    /// Await the next queued event in FIFO order.
    pub async fn recv(&self) -> Event {
        loop {
            if let Some(event) = self.inner.lock().pop_front() {
                return event;
            }
            self.notify.notified().await;
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[derive(Default)]
struct SessionChannel {
    persisted: Vec<Event>,
    seen: HashSet<EventId>,
    subscribers: Vec<Arc<SubscriberQueue>>,
    sequence: u64,
}

/// Default bounded queue size per subscriber: 256 gives generous headroom over a
/// typical debate's event volume — a handful of specialists across a handful of
/// rounds — while still exercising the overflow path under deliberate slow-consumer
/// tests.
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 256;

/// Assigns ids, de-duplicates, and fans out events to subscribers + the persisted
/// log. One dispatcher instance is shared across all sessions; state is sharded by
/// `SessionId` via `DashMap` so unrelated sessions never contend on the same lock.
pub struct EventDispatcher {
    channels: DashMap<SessionId, Mutex<SessionChannel>>,
    subscriber_capacity: usize,
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_CAPACITY)
    }
}

impl EventDispatcher {
    pub fn new(subscriber_capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            subscriber_capacity,
        }
    }

    /// Build and publish an event in one step, assigning its `event_id` from this
    /// dispatcher's per-session sequence counter.
    pub fn emit(
        &self,
        session_id: SessionId,
        event_type: EventType,
        phase: Option<Phase>,
        agent_name: Option<String>,
        clock: &dyn Clock,
    ) -> Event {
        let entry = self.channels.entry(session_id).or_default();
        let mut channel = entry.lock();
        let sequence_index = channel.sequence;
        channel.sequence += 1;
        let node = event_type.node_name();
        let event = Event {
            event_id: EventId::compute(session_id, node, sequence_index),
            session_id,
            timestamp: clock.now(),
            event_type,
            phase,
            agent_name,
        };
        Self::publish_locked(&mut channel, event.clone(), self.subscriber_capacity);
        event
    }

    /// Publish an already-constructed event (used to replay/inject events with a
    /// pre-assigned id — e.g. injecting the same event envelope twice to exercise
    /// de-duplication). Returns `true` if this was newly delivered, `false` if it was
    /// a duplicate by `event_id` and was suppressed.
    pub fn publish(&self, event: Event) -> bool {
        let entry = self.channels.entry(event.session_id).or_default();
        let mut channel = entry.lock();
        Self::publish_locked(&mut channel, event, self.subscriber_capacity)
    }

    fn publish_locked(channel: &mut SessionChannel, event: Event, subscriber_capacity: usize) -> bool {
        if !channel.seen.insert(event.event_id) {
            return false;
        }
        channel.persisted.push(event.clone());

        for subscriber in &channel.subscribers {
            if let Some(dropped_count) = subscriber.push(event.clone()) {
                warn!(dropped_count, "subscriber queue overflow, dropping oldest event");
                let lag_event = Event {
                    event_id: EventId::compute(event.session_id, "dispatcher_lag", channel.sequence),
                    session_id: event.session_id,
                    timestamp: event.timestamp,
                    event_type: EventType::StreamLag { dropped_count },
                    phase: None,
                    agent_name: None,
                };
                channel.sequence += 1;
                subscriber.push(lag_event);
            }
        }
        let _ = subscriber_capacity; // capacity lives on each SubscriberQueue already
        true
    }

    /// Replay the persisted tail since `resume_cursor` (exclusive), then register a
    /// live subscriber queue. Both steps happen under one lock so no event can be
    /// published between the snapshot and the registration (no gap, no duplicate).
    pub fn subscribe(&self, session_id: SessionId, resume_cursor: Option<EventId>) -> Arc<SubscriberQueue> {
        let entry = self.channels.entry(session_id).or_default();
        let mut channel = entry.lock();

        let queue = Arc::new(SubscriberQueue::new(self.subscriber_capacity));
        let replay_from = match resume_cursor {
            Some(cursor) => channel
                .persisted
                .iter()
                .position(|e| e.event_id == cursor)
                .map(|idx| idx + 1)
                .unwrap_or(0),
            None => 0,
        };
        for event in &channel.persisted[replay_from..] {
            queue.push(event.clone());
        }
        channel.subscribers.push(Arc::clone(&queue));
        queue
    }

    /// Full persisted log for a session, in production order.
    pub fn persisted_events(&self, session_id: SessionId) -> Vec<Event> {
        self.channels
            .get(&session_id)
            .map(|c| c.lock().persisted.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use debate_state::SystemClock;

    #[tokio::test]
    async fn duplicate_publish_is_suppressed() {
        let dispatcher = EventDispatcher::default();
        let session_id = SessionId::new();
        let clock = SystemClock;
        let event = dispatcher.emit(session_id, EventType::SessionCompleted, None, None, &clock);

        let delivered_again = dispatcher.publish(event.clone());
        assert!(!delivered_again);
        assert_eq!(dispatcher.persisted_events(session_id).len(), 1);
    }

    #[tokio::test]
    async fn subscriber_receives_events_in_fifo_order() {
        let dispatcher = EventDispatcher::default();
        let session_id = SessionId::new();
        let clock = SystemClock;

        let queue = dispatcher.subscribe(session_id, None);
        dispatcher.emit(session_id, EventType::SessionStarted { incident_id: "i".into() }, None, None, &clock);
        dispatcher.emit(session_id, EventType::SessionCompleted, None, None, &clock);

        let first = queue.recv().await;
        let second = queue.recv().await;
        assert!(matches!(first.event_type, EventType::SessionStarted { .. }));
        assert!(matches!(second.event_type, EventType::SessionCompleted));
    }

    #[tokio::test]
    async fn resume_cursor_replays_only_the_tail() {
        let dispatcher = EventDispatcher::default();
        let session_id = SessionId::new();
        let clock = SystemClock;

        let first = dispatcher.emit(session_id, EventType::SessionStarted { incident_id: "i".into() }, None, None, &clock);
        dispatcher.emit(session_id, EventType::SessionCompleted, None, None, &clock);

        let queue = dispatcher.subscribe(session_id, Some(first.event_id));
        assert_eq!(queue.len(), 1);
        let only = queue.recv().await;
        assert!(matches!(only.event_type, EventType::SessionCompleted));
    }

    #[tokio::test]
    async fn overflow_drops_oldest_and_emits_stream_lag() {
        let dispatcher = EventDispatcher::new(2);
        let session_id = SessionId::new();
        let clock = SystemClock;

        let queue = dispatcher.subscribe(session_id, None);
        for _ in 0..5 {
            dispatcher.emit(session_id, EventType::SessionCompleted, None, None, &clock);
        }

        // capacity 2: oldest plain events get evicted, each eviction appends a
        // stream_lag marker, so the queue ends up holding a mix the consumer can
        // observe without panicking on unbounded growth.
        assert!(queue.len() <= 2);
        assert!(queue.dropped_count() >= 1);
    }

    #[tokio::test]
    async fn unrelated_sessions_do_not_see_each_others_events() {
        let dispatcher = EventDispatcher::default();
        let session_a = SessionId::new();
        let session_b = SessionId::new();
        let clock = SystemClock;

        dispatcher.emit(session_a, EventType::SessionCompleted, None, None, &clock);
        assert_eq!(dispatcher.persisted_events(session_a).len(), 1);
        assert_eq!(dispatcher.persisted_events(session_b).len(), 0);
    }
}
