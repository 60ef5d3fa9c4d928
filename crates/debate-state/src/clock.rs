//! Injectable clock so reducer/event ordering can be tested deterministically.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// A source of timestamps. Production code uses [`SystemClock`]; tests can supply a
/// [`FixedClock`] or a [`SteppingClock`] to get reproducible orderings.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time via `chrono::Utc::now()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant. Useful for snapshot-style assertions.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Advances by one millisecond on every call, starting from a fixed epoch. Gives
/// tests a strictly increasing, reproducible timestamp sequence without relying on
/// wall-clock resolution.
#[derive(Debug)]
pub struct SteppingClock {
    base_millis: i64,
    counter: AtomicI64,
}

impl SteppingClock {
    pub fn starting_at(base: DateTime<Utc>) -> Self {
        Self {
            base_millis: base.timestamp_millis(),
            counter: AtomicI64::new(0),
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let step = self.counter.fetch_add(1, Ordering::SeqCst);
        DateTime::from_timestamp_millis(self.base_millis + step)
            .expect("stepping clock millis always in range")
    }
}
