//! Event Dispatcher & Stream: schema-stable, de-duplicated event envelopes fanned out
//! to live subscribers and a persisted per-session log.

pub mod dispatcher;
pub mod error;
pub mod event;
pub mod stream;

pub use dispatcher::{EventDispatcher, SubscriberQueue, DEFAULT_SUBSCRIBER_CAPACITY};
pub use error::EventError;
pub use event::{Event, EventId, EventType};
pub use stream::EventStream;
