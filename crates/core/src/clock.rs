//! Clock abstraction, injected wherever the engine needs `now()`.
//!
//! Mirrors the role the teacher gives to its `Clock` collaborator: tests
//! inject a deterministic clock instead of calling `Utc::now()` directly.

use std::sync::Mutex;

use chrono::{DateTime, Utc};

/// Source of wall-clock timestamps.
///
/// Implementations MUST be monotonic in the sense that successive calls
/// never go backwards; they need not be high-resolution.
pub trait Clock: Send + Sync {
    /// The current wall-clock time.
    fn now(&self) -> DateTime<Utc>;
}

/// The real system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that returns a fixed, externally-advanced instant.
///
/// Useful for deterministic tests of cron scheduling and execution timing.
#[derive(Debug)]
pub struct FixedClock {
    inner: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Create a clock fixed at `at`.
    #[must_use]
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            inner: Mutex::new(at),
        }
    }

    /// Advance the clock by `duration`.
    pub fn advance(&self, duration: chrono::Duration) {
        let mut guard = self.inner.lock().unwrap();
        *guard += duration;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.inner.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn fixed_clock_advances_explicitly() {
        let start = Utc::now();
        let clock = FixedClock::new(start);
        assert_eq!(clock.now(), start);
        clock.advance(chrono::Duration::seconds(60));
        assert_eq!(clock.now(), start + chrono::Duration::seconds(60));
    }
}
