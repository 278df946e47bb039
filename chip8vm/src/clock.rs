//! Host-side pacing.
use std::{
    thread,
    time::{Duration, Instant},
};

use crate::vm::Hz;

/// Timer to pace a host loop against a fixed frequency.
///
/// It is designed to work with the yielding cooperative pattern
/// of the interpreter loop. When the VM yields control back to the
/// caller, time elapses until it is resumed. Once the interpreter
/// is resumed, the elapsed time is taken into account when determining
/// the next cycle.
pub struct Clock {
    interval: Duration,
    last: Instant,
}

impl Clock {
    /// Creates a new clock with the current time as internal state.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Instant::now(),
        }
    }

    pub fn from_hz(freq: Hz) -> Self {
        Self::new(freq.into())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Set the clock state back to zero.
    pub fn reset(&mut self) {
        self.last = Instant::now()
    }

    /// Returns true, and starts the next period, when a full period has elapsed.
    pub fn tick(&mut self) -> bool {
        if self.last.elapsed() >= self.interval {
            // Reset back to zero, rather than trying to catch up.
            //
            // If the VM was paused for debugging, and a large
            // amount of time has elapsed until it is resumed,
            // it should simply continue at the next cycle running
            // at its usual speed.
            self.reset();
            true
        } else {
            false
        }
    }

    /// Block the current thread until the next clock cycle.
    pub fn wait(&mut self) {
        while !self.tick() {
            // Sleep does not have enough resolution, and causes
            // the clock to run at 30 FPS.
            //
            // Yielding in a loop is the best alternative.
            thread::yield_now();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_zero_interval_always_ticks() {
        let mut clock = Clock::from_hz(Hz(0));
        assert!(clock.tick());
        assert!(clock.tick());
        clock.wait();
    }

    #[test]
    fn test_long_interval_does_not_tick() {
        let mut clock = Clock::new(Duration::from_secs(3600));
        assert!(!clock.tick());
    }

    #[test]
    fn test_wait_for_period() {
        let mut clock = Clock::new(Duration::from_millis(2));
        let start = Instant::now();
        clock.wait();
        assert!(start.elapsed() >= Duration::from_millis(1));
    }
}
