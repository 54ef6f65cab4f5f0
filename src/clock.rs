//! Monotonic time sources
//!
//! Round-trip and elapsed-time measurements read the clock through the
//! [`Clock`] trait so tests can step time by hand. Scheduling (ticks,
//! read deadlines, the run deadline) stays on tokio timers.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Source of monotonic timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The runtime's monotonic clock
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(base: Instant) -> Self {
        Self {
            base,
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward by `by`
    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock()
    }
}
