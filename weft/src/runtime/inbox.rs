use crate::error::Error;

use crossbeam::queue::SegQueue;
use parking_lot::Mutex;
use std::any::Any;
use std::sync::Arc;
use std::thread::Thread;

/// Shared handle to a manager's completion inbox.
pub(crate) type InboxHandle = Arc<Inbox>;

/// Type-erased result of a job run outside the driver thread.
pub(crate) type Payload = Result<Box<dyn Any + Send>, Error>;

/// A finished pool job, on its way back to the driver.
pub(crate) struct Completion {
    /// Ticket issued by the manager when the job was posted.
    pub(crate) ticket: u64,

    /// Value produced by the job, or the panic it raised.
    pub(crate) payload: Payload,
}

/// Cross-thread completion inbox owned by a manager.
///
/// Pool workers push completions here; only the driver pops them, inside
/// [`drive`](crate::Manager::drive). The queue is lock-free, so a worker
/// that is done never waits on the driver.
pub(crate) struct Inbox {
    /// Completions not yet drained by the driver.
    queue: SegQueue<Completion>,

    /// Driver thread parked in `run_until`, if any.
    driver: Mutex<Option<Thread>>,
}

impl Inbox {
    /// Creates an empty inbox.
    pub(crate) fn new() -> Self {
        Self {
            queue: SegQueue::new(),
            driver: Mutex::new(None),
        }
    }

    /// Records the thread to unpark when a completion arrives.
    pub(crate) fn set_driver(&self, thread: Thread) {
        *self.driver.lock() = Some(thread);
    }

    /// Pushes a completion and unparks the driver.
    pub(crate) fn push(&self, completion: Completion) {
        self.queue.push(completion);

        if let Some(driver) = self.driver.lock().as_ref() {
            driver.unpark();
        }
    }

    /// Pops the oldest completion, if any.
    pub(crate) fn pop(&self) -> Option<Completion> {
        self.queue.pop()
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
