use super::node::Policy;
use crate::error::Error;
use crate::future::{Future, Promise};
use crate::runtime::Manager;

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// A growable set of futures aggregated under one policy.
///
/// Children can be [`push`](Self::push)ed at any time, including while a
/// parent future obtained from [`get_future`](Self::get_future) is
/// pending. Settled children are queued in settlement order and popped,
/// without blocking, by [`finished_out`](Self::finished_out).
///
/// The parent future is re-armed by every `get_future` call and is
/// fulfilled when the policy is met:
/// - [`Policy::Race`]: at least one settled child is waiting in the queue,
/// - [`Policy::All`]: every pushed child settled; rejected instead with
///   the first rejection nobody was told about yet,
/// - [`Policy::AllSettled`]: every pushed child settled.
///
/// Arming a new parent releases the previous one, which is rejected with
/// [`Error::BrokenPromise`] if it was still pending. Queued results are
/// never lost or duplicated by re-arming or pushing.
///
/// # Performance
///
/// Each push costs one callback registration and each settlement one queue
/// push, so a long-running set does not pay for re-building a fixed-arity
/// wait on every round. The extra bookkeeping makes it slower than
/// rebuilding a [`race`](super::race) for small sets; the two cross over
/// at around fifty concurrent children (see the `combinators` benchmark).
///
/// # Examples
///
/// ```rust,ignore
/// let set = Dynamic::new(&manager, Policy::Race);
/// set.push(fetch(1));
/// set.push(fetch(2));
///
/// while !set.is_empty() {
///     set.get_future().await?;
///
///     while let Some((index, outcome)) = set.finished_out() {
///         handle(index, outcome);
///     }
/// }
/// ```
pub struct Dynamic<T> {
    inner: Rc<Inner<T>>,
    manager: Manager,
}

struct Inner<T> {
    policy: Policy,

    /// Settled children not popped yet, in settlement order.
    finished: RefCell<VecDeque<(usize, Result<T, Error>)>>,

    /// Children pushed but not settled yet.
    outstanding: Cell<usize>,

    /// Number of children ever pushed; the next child's index.
    pushed: Cell<usize>,

    /// First rejection not reported to a parent yet (`All` only).
    failed: RefCell<Option<Error>>,

    /// Currently armed parent promise.
    parent: RefCell<Option<Promise<()>>>,
}

impl<T: 'static> Dynamic<T> {
    /// Creates an empty set aggregated under `policy`.
    pub fn new(manager: &Manager, policy: Policy) -> Self {
        let inner = Inner {
            policy,
            finished: RefCell::new(VecDeque::new()),
            outstanding: Cell::new(0),
            pushed: Cell::new(0),
            failed: RefCell::new(None),
            parent: RefCell::new(None),
        };

        Self {
            inner: Rc::new(inner),
            manager: manager.clone(),
        }
    }

    /// Adds a child and returns its index.
    ///
    /// Indices are assigned in push order, starting at zero. A child that
    /// already settled is queued before this call returns.
    pub fn push(&self, future: Future<T>) -> usize {
        let index = self.inner.pushed.get();
        self.inner.pushed.set(index + 1);
        self.inner
            .outstanding
            .set(self.inner.outstanding.get() + 1);

        let inner = self.inner.clone();
        future.on_settle(move |outcome| inner.child_settled(index, outcome));

        index
    }

    /// Arms a fresh parent future reflecting the current aggregation state.
    ///
    /// If the policy is already met, the returned future is settled.
    pub fn get_future(&self) -> Future<()> {
        let (future, promise) = self.manager.make_future();

        let previous = self.inner.parent.replace(Some(promise));
        drop(previous);

        self.inner.evaluate();
        future
    }

    /// Pops the oldest settled child, if any. Never blocks.
    pub fn finished_out(&self) -> Option<(usize, Result<T, Error>)> {
        self.inner.finished.borrow_mut().pop_front()
    }

    /// Number of children pushed but not settled yet.
    pub fn outstanding(&self) -> usize {
        self.inner.outstanding.get()
    }

    /// Number of settled children waiting in the queue.
    pub fn finished_len(&self) -> usize {
        self.inner.finished.borrow().len()
    }

    /// Number of children not popped yet, settled or not.
    pub fn len(&self) -> usize {
        self.outstanding() + self.finished_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn policy(&self) -> Policy {
        self.inner.policy
    }
}

impl<T> Inner<T> {
    fn child_settled(&self, index: usize, outcome: Result<T, Error>) {
        self.outstanding.set(self.outstanding.get() - 1);

        if let (Policy::All, Err(err)) = (self.policy, &outcome) {
            let mut failed = self.failed.borrow_mut();

            if failed.is_none() {
                *failed = Some(err.clone());
            }
        }

        self.finished.borrow_mut().push_back((index, outcome));
        self.evaluate();
    }

    /// Settles the armed parent if the policy is met.
    fn evaluate(&self) {
        if self.parent.borrow().is_none() {
            return;
        }

        let verdict = match self.policy {
            Policy::Race => (!self.finished.borrow().is_empty()).then_some(Ok(())),
            Policy::All => match self.failed.borrow_mut().take() {
                Some(err) => Some(Err(err)),
                None => (self.outstanding.get() == 0).then_some(Ok(())),
            },
            Policy::AllSettled => (self.outstanding.get() == 0).then_some(Ok(())),
        };

        let Some(verdict) = verdict else {
            return;
        };

        let parent = self.parent.borrow_mut().take();

        if let Some(parent) = parent {
            match verdict {
                Ok(()) => parent.resolve(()),
                Err(err) => parent.reject(err),
            }
        }
    }
}

impl<T> fmt::Debug for Dynamic<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dynamic")
            .field("policy", &self.inner.policy)
            .field("outstanding", &self.inner.outstanding.get())
            .field("finished", &self.inner.finished.borrow().len())
            .field("armed", &self.inner.parent.borrow().is_some())
            .finish()
    }
}
