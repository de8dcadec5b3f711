use super::clock::Clock;
use super::core::Manager;
use super::stackful::DEFAULT_STACK_SIZE;

use std::time::Duration;

/// Builder for configuring and creating a [`Manager`].
///
/// # Examples
///
/// ```rust,ignore
/// let manager = ManagerBuilder::new()
///     .stack_size(0x2000)
///     .max_idle_park(Duration::from_millis(1))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ManagerBuilder {
    /// Stack size of stackful tasks, in machine words.
    pub(crate) stack_size: usize,

    /// Time source used by timers.
    pub(crate) clock: Clock,

    /// Longest park of the driver thread in `run_until`.
    pub(crate) max_idle_park: Duration,
}

impl ManagerBuilder {
    /// Creates a builder with the default configuration.
    ///
    /// By default the manager uses the system clock, gives stackful tasks
    /// [`DEFAULT_STACK_SIZE`] words of stack and parks at most 10 ms at a
    /// time while waiting in [`Manager::run_until`].
    pub fn new() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            clock: Clock::System,
            max_idle_park: Duration::from_millis(10),
        }
    }

    /// Sets the stack size of stackful tasks, in machine words.
    ///
    /// # Panics
    ///
    /// Panics if `words == 0`.
    pub fn stack_size(mut self, words: usize) -> Self {
        assert!(words > 0, "stack_size must be > 0");

        self.stack_size = words;
        self
    }

    /// Sets the time source used by timers.
    pub fn clock(mut self, clock: impl Into<Clock>) -> Self {
        self.clock = clock.into();
        self
    }

    /// Caps how long [`Manager::run_until`] parks the driver thread when
    /// nothing is ready.
    pub fn max_idle_park(mut self, duration: Duration) -> Self {
        self.max_idle_park = duration;
        self
    }

    pub fn build(self) -> Manager {
        Manager::with_config(self)
    }
}

impl Default for ManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
