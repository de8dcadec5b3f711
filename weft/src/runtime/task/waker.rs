use super::TaskId;
use super::state::{ABORTED, COMPLETED, IDLE, NOTIFIED, QUEUED, RUNNING};
use crate::runtime::queue::ReadyQueue;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Wake, Waker};

/// Scheduling header of a task.
///
/// The header is the only part of a task that leaves the driver: wakers
/// hold it, never the frame. Waking re-enqueues the task's [`TaskId`] on
/// the ready queue; the manager resolves the id back to a frame through
/// the generation-checked arena, so a late wake-up for a finished task is
/// simply ignored.
pub(crate) struct Header {
    /// Arena key of the task.
    pub(crate) id: TaskId,

    /// Lifecycle state (`IDLE`, `QUEUED`, `RUNNING`, ...).
    state: AtomicUsize,

    /// Ready queue of the owning manager.
    queue: Arc<ReadyQueue>,
}

impl Header {
    pub(crate) fn new(id: TaskId, state: usize, queue: Arc<ReadyQueue>) -> Self {
        Self {
            id,
            state: AtomicUsize::new(state),
            queue,
        }
    }

    pub(crate) fn state(&self) -> usize {
        self.state.load(Ordering::Acquire)
    }

    /// Signals the task to be rescheduled.
    ///
    /// An idle task is queued; a running task is flagged `NOTIFIED` so the
    /// driver re-queues it once the current resumption returns. Queued,
    /// finished and aborted tasks are left alone.
    pub(crate) fn schedule(&self) {
        loop {
            let current = self.state();

            let next = match current {
                IDLE => QUEUED,
                RUNNING => NOTIFIED,
                _ => return,
            };

            if self
                .state
                .compare_exchange(current, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                if next == QUEUED {
                    self.queue.push(self.id);
                }
                return;
            }
        }
    }

    /// Moves a queued task to `RUNNING` before its frame is resumed.
    ///
    /// Returns `false` if the task is no longer runnable.
    pub(crate) fn start_running(&self) -> bool {
        self.state
            .compare_exchange(QUEUED, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Parks a task that returned pending.
    ///
    /// Returns `true` if the task was notified while running and has been
    /// re-queued, so the caller knows the wake-up was not lost.
    pub(crate) fn suspend(&self) -> bool {
        if self
            .state
            .compare_exchange(RUNNING, IDLE, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            return false;
        }

        if self
            .state
            .compare_exchange(NOTIFIED, QUEUED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.queue.push(self.id);
            return true;
        }

        false
    }

    pub(crate) fn complete(&self) {
        self.state.store(COMPLETED, Ordering::Release);
    }

    /// Marks the task aborted.
    ///
    /// Returns the state observed before the transition; `COMPLETED` and
    /// `ABORTED` tasks are left untouched.
    pub(crate) fn abort(&self) -> usize {
        loop {
            let current = self.state();

            if current == COMPLETED || current == ABORTED {
                return current;
            }

            if self
                .state
                .compare_exchange(current, ABORTED, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return current;
            }
        }
    }

    pub(crate) fn is_aborted(&self) -> bool {
        self.state() == ABORTED
    }
}

impl Wake for Header {
    fn wake(self: Arc<Self>) {
        self.schedule();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.schedule();
    }
}

/// Creates the [`Waker`] handed to a task frame while it is resumed.
///
/// The waker shares the task header, so cloning it is a reference count
/// increment and waking it is a state transition plus, at most, one push on
/// the ready queue.
pub(crate) fn make_waker(header: Arc<Header>) -> Waker {
    Waker::from(header)
}
