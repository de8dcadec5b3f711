//! The cooperative driver.
//!
//! This module contains the [`Manager`] and everything it schedules:
//! - the task arena and ready queue,
//! - stackless and stackful task frames,
//! - the completion inbox fed by pool workers,
//! - the clock timers are measured against.
//!
//! All tasks of a manager run on the thread that calls
//! [`Manager::drive`]; only the inbox is touched by other threads.

mod builder;
mod clock;
mod core;
mod queue;
mod stackful;
mod yield_now;

pub(crate) mod inbox;
pub(crate) mod task;

pub use self::builder::ManagerBuilder;
pub use self::clock::{Clock, ManualClock};
pub use self::core::{Manager, WeakManager};
pub use self::stackful::{DEFAULT_STACK_SIZE, Fiber};
pub use self::task::{TaskHandle, TaskId, TaskState};
pub use self::yield_now::{YieldNow, yield_now};
