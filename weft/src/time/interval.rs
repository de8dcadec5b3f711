use crate::future::Future;
use crate::runtime::Manager;

use std::time::{Duration, Instant};

/// Creates an [`Interval`] whose first tick fires one `period` from now.
///
/// # Panics
///
/// Panics if `period` is zero.
pub fn interval(manager: &Manager, period: Duration) -> Interval {
    Interval::new(manager, period)
}

/// A periodic timer without drift.
///
/// Tick `n` is due at `start + n * period` regardless of how long the
/// previous round took. Ticks missed while the task was busy are skipped.
#[derive(Debug)]
pub struct Interval {
    manager: Manager,

    /// Due instant of the next tick.
    next: Instant,

    period: Duration,
}

impl Interval {
    pub(crate) fn new(manager: &Manager, period: Duration) -> Self {
        assert!(!period.is_zero(), "interval period must be > 0");

        Self {
            manager: manager.clone(),
            next: manager.now() + period,
            period,
        }
    }

    /// Returns a clock firing at the next tick.
    pub fn tick(&mut self) -> Future<()> {
        let now = self.manager.now();

        while self.next + self.period <= now {
            self.next += self.period;
        }

        let at = self.next;
        self.next += self.period;

        self.manager.make_clock_at(at)
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}
