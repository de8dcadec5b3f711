use crate::error::Error;
use crate::future::{Future, Promise};
use crate::runtime::Manager;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Aggregation policy of a fixed-arity combinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Completes on the first child settlement, fulfilled or rejected.
    Race,

    /// Completes when every child fulfilled, or on the first rejection.
    All,

    /// Completes when every child settled. Never rejects.
    AllSettled,
}

/// Builds the parent's value once the node completes.
///
/// Receives the index of the child whose settlement completed the node.
type Finisher<O> = Box<dyn FnOnce(usize) -> Result<O, Error>>;

/// Shared state of a fixed-arity combinator.
///
/// Each child future is turned into a settlement callback that stores the
/// child's outcome in its [`Slot`] and reports to the node; the node
/// re-evaluates its policy at every report and settles the parent promise
/// at most once. Reports arriving after that are counted and dropped.
///
/// The node lives as long as a child callback is registered. A node that
/// loses every child before completing drops its parent promise, which
/// rejects the parent with [`Error::BrokenPromise`].
pub struct Node<O> {
    policy: Policy,

    /// Number of children attached by the constructor.
    total: usize,

    /// Number of children that reported so far.
    settled: Cell<usize>,

    /// Parent promise, `None` once the node completed.
    parent: RefCell<Option<Promise<O>>>,

    finish: RefCell<Option<Finisher<O>>>,
}

impl<O: 'static> Node<O> {
    /// Creates a node expecting `total` children, and its parent future.
    pub fn new(manager: &Manager, policy: Policy, total: usize) -> (Rc<Self>, Future<O>) {
        let (future, promise) = manager.make_future();

        let node = Rc::new(Self {
            policy,
            total,
            settled: Cell::new(0),
            parent: RefCell::new(Some(promise)),
            finish: RefCell::new(None),
        });

        (node, future)
    }

    /// Installs the finisher. Must happen before the first child attaches.
    ///
    /// A node with no children under `All` or `AllSettled` completes right
    /// away.
    pub fn on_finish(&self, finish: impl FnOnce(usize) -> Result<O, Error> + 'static) {
        *self.finish.borrow_mut() = Some(Box::new(finish));

        if self.total == 0 && self.policy != Policy::Race {
            self.complete(0, None);
        }
    }

    /// Records the settlement of child `index`.
    pub(crate) fn child_settled(&self, index: usize, err: Option<Error>) {
        let settled = self.settled.get() + 1;
        self.settled.set(settled);

        let done = match self.policy {
            Policy::Race => true,
            Policy::All => err.is_some() || settled == self.total,
            Policy::AllSettled => settled == self.total,
        };

        if done {
            self.complete(index, err);
        }
    }

    fn complete(&self, index: usize, err: Option<Error>) {
        let parent = self.parent.borrow_mut().take();

        let Some(parent) = parent else {
            return;
        };

        if let (Policy::All, Some(err)) = (self.policy, err) {
            parent.reject(err);
            return;
        }

        let finish = self.finish.borrow_mut().take();

        match finish.map(|finish| finish(index)) {
            Some(Ok(value)) => parent.resolve(value),
            Some(Err(err)) => parent.reject(err),
            None => parent.reject(Error::BrokenPromise),
        }
    }
}

impl<O> fmt::Debug for Node<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("policy", &self.policy)
            .field("total", &self.total)
            .field("settled", &self.settled.get())
            .finish()
    }
}

/// Typed outcome slot of one combinator child.
pub struct Slot<T> {
    outcome: Rc<RefCell<Option<Result<T, Error>>>>,
}

impl<T: 'static> Slot<T> {
    pub fn new() -> Self {
        Self {
            outcome: Rc::new(RefCell::new(None)),
        }
    }

    /// Turns `future` into child `index` of `node`.
    ///
    /// If `future` already settled, the node is notified before this call
    /// returns.
    pub fn attach<O: 'static>(&self, node: &Rc<Node<O>>, index: usize, future: Future<T>) {
        let slot = self.outcome.clone();
        let node = node.clone();

        future.on_settle(move |outcome| {
            let err = outcome.as_ref().err().cloned();
            *slot.borrow_mut() = Some(outcome);

            node.child_settled(index, err);
        });
    }

    /// Takes the recorded outcome.
    ///
    /// A child that never reported reads as [`Error::BrokenPromise`].
    pub fn outcome(&self) -> Result<T, Error> {
        self.outcome
            .borrow_mut()
            .take()
            .unwrap_or(Err(Error::BrokenPromise))
    }
}

impl<T: 'static> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            outcome: self.outcome.clone(),
        }
    }
}
