//! Task primitives.
//!
//! A task is a resumable frame stored in the manager's arena. The manager
//! only ever holds [`TaskId`]s; wakers carry the task [`Header`] and
//! re-enqueue the id, never the frame itself.
//!
//! Two frame representations share one interface:
//! - stackless frames, any [`std::future::Future`],
//! - stackful frames, a closure running on its own stack and suspending
//!   through a [`Fiber`](crate::runtime::Fiber).

pub(crate) mod core;
pub(crate) mod handle;
pub(crate) mod state;
pub(crate) mod waker;

pub use handle::TaskHandle;

pub(crate) use self::core::{Frame, PanicHook, TaskSlot};
pub(crate) use waker::{Header, make_waker};

use crate::utils::Key;

use std::fmt;

/// Identity of a task inside its manager.
///
/// Ids are generation-checked: once a task is reclaimed its id never
/// designates another task, even if the arena slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub(crate) Key);

impl fmt::Debug for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}.{}", self.0.index, self.0.generation)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Observable liveness of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Queued for the next epoch, or being resumed right now.
    Runnable,

    /// Parked at a suspension point, waiting for a wake-up.
    Suspended,

    /// Ran to completion (or panicked) and was reclaimed.
    Completed,

    /// Aborted before completion.
    Aborted,
}

impl TaskState {
    pub(crate) fn from_raw(raw: usize) -> Self {
        match raw {
            state::IDLE => TaskState::Suspended,
            state::COMPLETED => TaskState::Completed,
            state::ABORTED => TaskState::Aborted,
            _ => TaskState::Runnable,
        }
    }
}
