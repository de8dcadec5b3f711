use crate::future::Future;
use crate::runtime::Manager;

use std::time::{Duration, Instant};

/// A countdown towards a fixed deadline, ticking at a fixed period.
///
/// `Countdown` is the building block for periodic logic with an end: poll
/// [`reached`](Self::reached) for the end condition and await
/// [`tick`](Self::tick) between rounds, without busy-waiting.
///
/// Ticks are scheduled on a fixed grid starting at creation time, so a
/// slow round does not push the following ticks back. The last tick never
/// lands past the deadline.
///
/// # Examples
///
/// ```rust,ignore
/// let mut countdown = Countdown::new(&manager, Duration::from_secs(3), Duration::from_secs(1));
///
/// while !countdown.reached() {
///     countdown.tick().await?;
///     send_heartbeat();
/// }
/// ```
#[derive(Debug)]
pub struct Countdown {
    manager: Manager,

    /// Instant at which the countdown is over.
    deadline: Instant,

    /// Next point of the tick grid.
    next: Instant,

    period: Duration,
}

impl Countdown {
    /// Starts a countdown of `total`, ticking every `period`.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero.
    pub fn new(manager: &Manager, total: Duration, period: Duration) -> Self {
        assert!(!period.is_zero(), "countdown period must be > 0");

        let now = manager.now();

        Self {
            manager: manager.clone(),
            deadline: now + total,
            next: now + period,
            period,
        }
    }

    /// Returns `true` once the manager's clock reached the deadline.
    pub fn reached(&self) -> bool {
        self.manager.now() >= self.deadline
    }

    /// Time left until the deadline, zero once reached.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(self.manager.now())
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Returns a clock firing at the next tick, clamped to the deadline.
    ///
    /// Ticks that were missed entirely are skipped rather than fired in
    /// a burst. Once the countdown is reached every tick fires on the next
    /// epoch.
    pub fn tick(&mut self) -> Future<()> {
        let now = self.manager.now();

        while self.next <= now && self.next < self.deadline {
            self.next += self.period;
        }

        let at = self.next.min(self.deadline);
        self.next += self.period;

        self.manager.make_clock_at(at)
    }
}
