//! Monotonic clock adapter.

use std::thread;
use std::time::{Duration, Instant};

use crate::app::ports::ClockPort;

/// [`ClockPort`] backed by `std::time::Instant`, zeroed at construction.
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl ClockPort for MonotonicClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn sleep(&self, period: Duration) {
        thread::sleep(period);
    }
}
