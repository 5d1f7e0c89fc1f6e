use std::time::{Duration, Instant};

/// Source of monotonic time readings.
///
/// Readings are offsets from a clock-specific epoch and are only comparable
/// with other readings of the same clock.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Monotonic clock anchored at its own construction time
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}
