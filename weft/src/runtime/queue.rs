use crate::runtime::task::TaskId;

use parking_lot::Mutex;
use std::collections::VecDeque;

/// FIFO queue of tasks ready to be resumed.
///
/// The queue only carries task ids. It sits behind a lock because wakers
/// are `Send + Sync` by contract, even though every push from a well-behaved
/// program happens on the driver thread.
pub(crate) struct ReadyQueue {
    /// Inner deque protected by a mutex.
    inner: Mutex<VecDeque<TaskId>>,
}

impl ReadyQueue {
    /// Creates an empty ready queue.
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
        }
    }

    /// Pushes a task id to the back of the queue.
    pub(crate) fn push(&self, id: TaskId) {
        self.inner.lock().push_back(id);
    }

    /// Pops the oldest ready task id, if any.
    pub(crate) fn pop(&self) -> Option<TaskId> {
        self.inner.lock().pop_front()
    }

    /// Number of queued ids, stale ones included.
    pub(crate) fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Drops every queued id.
    pub(crate) fn clear(&self) {
        self.inner.lock().clear();
    }
}
