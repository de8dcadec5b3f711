use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Time source of a manager.
///
/// Timers compare their deadlines against this clock once per epoch, so
/// a timer never fires before `clock.now()` reaches its deadline.
#[derive(Debug, Clone, Default)]
pub enum Clock {
    /// The monotonic system clock.
    #[default]
    System,

    /// A clock that only moves when told to.
    Manual(ManualClock),
}

impl Clock {
    pub fn now(&self) -> Instant {
        match self {
            Clock::System => Instant::now(),
            Clock::Manual(clock) => clock.now(),
        }
    }

    pub(crate) fn is_manual(&self) -> bool {
        matches!(self, Clock::Manual(_))
    }
}

/// A deterministic clock for embedders and tests.
///
/// Clones share the same instant; advancing one advances them all.
///
/// # Examples
///
/// ```rust,ignore
/// let clock = ManualClock::new();
/// let manager = ManagerBuilder::new().clock(Clock::Manual(clock.clone())).build();
///
/// let tick = manager.make_clock(Duration::from_secs(1));
/// clock.advance(Duration::from_secs(1));
/// manager.drive();
/// assert!(tick.is_settled());
/// ```
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    /// Creates a manual clock starting at the current system instant.
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn now(&self) -> Instant {
        *self.now.lock()
    }

    /// Moves the clock forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        *self.now.lock() += duration;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ManualClock> for Clock {
    fn from(clock: ManualClock) -> Self {
        Clock::Manual(clock)
    }
}
