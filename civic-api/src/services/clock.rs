//! Time source for service operations.

use chrono::{Duration, Utc};
use civic_core::Timestamp;
use std::sync::Mutex;

/// Supplies "now" to the service layer.
pub trait ServiceClock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct WallClock;

impl ServiceClock for WallClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// Returns `start`, then advances by `step` on every call.
///
/// Reference numbers have second granularity, so tests that create several
/// complaints in a row use a one-second step.
#[derive(Debug)]
pub struct SteppingClock {
    next: Mutex<Timestamp>,
    step: Duration,
}

impl SteppingClock {
    pub fn new(start: Timestamp, step: Duration) -> Self {
        Self {
            next: Mutex::new(start),
            step,
        }
    }

    /// One-second steps from `start`.
    pub fn per_second(start: Timestamp) -> Self {
        Self::new(start, Duration::seconds(1))
    }
}

impl ServiceClock for SteppingClock {
    fn now(&self) -> Timestamp {
        let mut next = match self.next.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let current = *next;
        *next = current + self.step;
        current
    }
}
