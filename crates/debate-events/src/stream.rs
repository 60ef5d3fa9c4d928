//! Async `Stream` adapter over a [`SubscriberQueue`].

use crate::dispatcher::SubscriberQueue;
use crate::event::Event;
use futures::future::BoxFuture;
use futures::stream::Stream;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// A live, never-ending stream of events for one subscriber. Dropping it
/// unsubscribes (the underlying queue is simply no longer polled; the dispatcher
/// keeps fanning out to it until the `Arc` is dropped, at which point the queue is
/// deallocated and further pushes are lost — harmless, since nobody is listening).
pub struct EventStream {
    queue: Arc<SubscriberQueue>,
    pending: Option<BoxFuture<'static, Event>>,
}

impl EventStream {
    pub fn new(queue: Arc<SubscriberQueue>) -> Self {
        Self { queue, pending: None }
    }
}

impl Stream for EventStream {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        let fut = this.pending.get_or_insert_with(|| {
            let queue = Arc::clone(&this.queue);
            Box::pin(async move { queue.recv().await })
        });

        match fut.as_mut().poll(cx) {
            Poll::Ready(event) => {
                this.pending = None;
                Poll::Ready(Some(event))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::EventDispatcher;
    use crate::event::EventType;
    use debate_state::{SessionId, SystemClock};
    use futures::StreamExt;

    #[tokio::test]
    async fn stream_yields_events_in_order() {
        let dispatcher = EventDispatcher::default();
        let session_id = SessionId::new();
        let clock = SystemClock;

        let queue = dispatcher.subscribe(session_id, None);
        let mut stream = EventStream::new(queue);

        dispatcher.emit(session_id, EventType::SessionStarted { incident_id: "i".into() }, None, None, &clock);
        dispatcher.emit(session_id, EventType::SessionCompleted, None, None, &clock);

        let first = stream.next().await.unwrap();
        let second = stream.next().await.unwrap();
        assert!(matches!(first.event_type, EventType::SessionStarted { .. }));
        assert!(matches!(second.event_type, EventType::SessionCompleted));
    }
}
