use super::state::COMPLETED;
use super::{Header, TaskId, TaskState};
use crate::error::Error;
use crate::future::Future;
use crate::runtime::WeakManager;

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// An owned handle to a spawned task.
///
/// A `TaskHandle` resolves to the task's output once the task completes,
/// or to [`Error::Panicked`] if its body panicked.
///
/// Dropping the handle before the task completes **aborts** the task: its
/// frame is dropped, which runs destructors (and unwinds the stack of a
/// stackful task). Use [`detach`](Self::detach) to let the task run on its
/// own, or [`into_result`](Self::into_result) to keep only its outcome.
pub struct TaskHandle<T> {
    /// Scheduling header shared with the task slot.
    header: Arc<Header>,

    /// Completion future of the task, resolved by the task wrapper.
    result: Option<Future<T>>,

    /// Whether dropping the handle aborts the task.
    owned: bool,

    /// Manager owning the task.
    manager: WeakManager,
}

impl<T> TaskHandle<T> {
    pub(crate) fn new(header: Arc<Header>, result: Future<T>, manager: WeakManager) -> Self {
        Self {
            header,
            result: Some(result),
            owned: true,
            manager,
        }
    }

    /// Returns the task identity.
    pub fn id(&self) -> TaskId {
        self.header.id
    }

    /// Returns the current liveness state of the task.
    pub fn state(&self) -> TaskState {
        TaskState::from_raw(self.header.state())
    }

    /// Returns `true` once the task body returned (or panicked).
    pub fn is_finished(&self) -> bool {
        self.header.state() == COMPLETED
    }

    /// Relinquishes ownership; the manager reclaims the task on completion.
    ///
    /// A failure of a detached task is only logged.
    pub fn detach(mut self) {
        self.release();
    }

    /// Detaches the task and returns its completion future.
    ///
    /// The future can be handed to a combinator or to
    /// [`Manager::run_until`](crate::Manager::run_until).
    pub fn into_result(mut self) -> Future<T> {
        self.release();
        self.result
            .take()
            .expect("task handle without a completion future")
    }

    /// Aborts the task now.
    ///
    /// If the task is being resumed (the call comes from inside its own
    /// body, or from a child it started with `spawn_now`) the frame is
    /// dropped as soon as it suspends.
    pub fn abort(mut self) {
        self.owned = false;

        if let Some(manager) = self.manager.upgrade() {
            manager.abort(self.header.id);
        }
    }

    fn release(&mut self) {
        self.owned = false;

        if let Some(manager) = self.manager.upgrade() {
            manager.set_detached(self.header.id);
        }
    }
}

impl<T> std::future::Future for TaskHandle<T> {
    type Output = Result<T, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        let result = this
            .result
            .as_mut()
            .expect("task handle polled after into_result");

        Pin::new(result).poll(cx)
    }
}

impl<T> Drop for TaskHandle<T> {
    fn drop(&mut self) {
        if !self.owned || self.header.state() == COMPLETED {
            return;
        }

        if let Some(manager) = self.manager.upgrade() {
            manager.abort(self.header.id);
        }
    }
}

impl<T> fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.header.id)
            .field("state", &self.state())
            .field("owned", &self.owned)
            .finish()
    }
}
