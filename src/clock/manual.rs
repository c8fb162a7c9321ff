use super::Clock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Hand-driven clock for tests and simulations
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Create a clock starting at `start`
    pub fn new(start: u64) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    /// Move the clock to `time`. Earlier times are ignored.
    pub fn set(&self, time: u64) {
        self.now.fetch_max(time, Ordering::SeqCst);
    }

    /// Advance the clock by `delta` units, returning the new time
    pub fn advance(&self, delta: u64) -> u64 {
        let mut current = self.now.load(Ordering::SeqCst);
        loop {
            let next = current.saturating_add(delta);
            match self
                .now
                .compare_exchange(current, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_and_set() {
        let clock = ManualClock::new(10);
        assert_eq!(clock.advance(5), 15);
        clock.set(12);
        assert_eq!(clock.now(), 15);
        clock.set(40);
        assert_eq!(clock.now(), 40);
    }
}
