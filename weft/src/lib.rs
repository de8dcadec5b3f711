//! # Weft
//!
//! **Weft** is an embeddable cooperative task runtime. A single driver
//! thread schedules very large numbers of lightweight tasks, synchronized
//! through single-resolution future/promise pairs, composable
//! wait-combinators and timers, with a bridge to an OS thread pool for
//! blocking work.
//!
//! Unlike general-purpose runtimes, Weft never owns the thread it runs on
//! and never blocks inside its step function. The embedder calls
//! [`Manager::drive`] in a loop (or integrates it into an existing event
//! loop), and each call runs one epoch:
//!
//! - settlements deferred by [`Promise::resolve_later`] are applied,
//! - expired timers fire, earliest first,
//! - results of [`Pool`](pool::Pool) jobs are delivered,
//! - every ready task is resumed to its next suspension point.
//!
//! There is no ambient "current runtime": the [`Manager`] is passed
//! explicitly to everything that needs one.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use weft::{Manager, combinator};
//!
//! let manager = Manager::new();
//!
//! let worker = manager.clone();
//! let handle = manager.spawn_now(async move {
//!     let winner = combinator::race(&worker, vec![
//!         worker.make_clock(Duration::from_millis(10)),
//!         worker.make_clock(Duration::from_millis(20)),
//!     ])
//!     .await?;
//!
//!     Ok::<_, weft::Error>(winner.index)
//! });
//!
//! assert_eq!(manager.run_until(handle.into_result()).unwrap(), Ok(0));
//! ```
//!
//! ## Modules
//!
//! - [`combinator`]: race, all, all-settled and dynamic sets of futures
//! - [`time`]: countdowns, intervals and timeouts
//! - [`pool`]: OS threads for blocking work
//!
//! ## Stackful tasks
//!
//! Code that cannot be written as an `async` block can run on its own
//! stack with [`Manager::spawn_stackful_now`] and wait through a
//! [`Fiber`]; both kinds of task share the same scheduling and waker
//! contract.

extern crate self as weft;

mod error;
mod future;
mod runtime;
mod utils;

pub mod combinator;
pub mod pool;
pub mod time;

pub use error::{Error, Result};
pub use future::{Future, Promise, Status, make_future};
pub use runtime::{
    Clock, DEFAULT_STACK_SIZE, Fiber, Manager, ManagerBuilder, ManualClock, TaskHandle, TaskId,
    TaskState, WeakManager, YieldNow, yield_now,
};

pub use weft_macros::{all, all_settled, race, test};
