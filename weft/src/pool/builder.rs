use super::core::Pool;

use std::io;
use std::thread;

/// Builder for configuring and creating a [`Pool`].
///
/// # Examples
///
/// ```rust,ignore
/// let pool = PoolBuilder::new()
///     .threads(4)
///     .thread_name("resolver")
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct PoolBuilder {
    /// Number of worker threads.
    pub(crate) threads: usize,

    /// Prefix of the worker thread names.
    pub(crate) thread_name: String,
}

impl PoolBuilder {
    /// Creates a new `PoolBuilder` with default configuration.
    ///
    /// By default, the number of threads is set to the number of available
    /// logical CPUs, falling back to `1` if unavailable, and workers are
    /// named `weft-pool-<n>`.
    pub fn new() -> Self {
        let threads = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Self {
            threads,
            thread_name: "weft-pool".to_string(),
        }
    }

    /// Sets the number of worker threads.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn threads(mut self, n: usize) -> Self {
        assert!(n > 0, "threads must be > 0");

        self.threads = n;
        self
    }

    /// Sets the prefix of the worker thread names.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Spawns the worker threads.
    ///
    /// # Errors
    ///
    /// Returns the OS error if a worker thread cannot be spawned; workers
    /// spawned before the failure are shut down.
    pub fn build(self) -> io::Result<Pool> {
        Pool::start(self)
    }
}

impl Default for PoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}
