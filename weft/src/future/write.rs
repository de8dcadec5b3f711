use super::state::State;
use crate::error::Error;
use crate::runtime::WeakManager;

use std::fmt;
use std::rc::Rc;

/// The write side of a single-resolution channel.
///
/// Every settling method takes `self`, so a promise settles its future at
/// most once by construction. The immediate variants make the new state
/// visible right away and re-enqueue the waiting task; the `_later`
/// variants defer the transition to the start of the next
/// [`drive`](crate::Manager::drive) epoch, which is what a task must use to
/// settle a future it is itself nested inside of.
///
/// Dropping a promise that was never settled rejects its future with
/// [`Error::BrokenPromise`].
pub struct Promise<T> {
    /// Shared state, `None` once settled or handed to the manager.
    state: Option<Rc<State<T>>>,

    /// Manager that applies deferred settlements.
    manager: WeakManager,
}

impl<T> Promise<T> {
    pub(crate) fn new(state: Rc<State<T>>, manager: WeakManager) -> Self {
        Self {
            state: Some(state),
            manager,
        }
    }

    /// Returns `true` while the paired future (or the combinator that took
    /// it over) is still around to observe the outcome.
    pub fn has_reader(&self) -> bool {
        self.state.as_ref().is_some_and(|state| state.has_reader())
    }

    /// Fulfils the paired future with `value`.
    pub fn resolve(mut self, value: T) {
        self.settle(Ok(value));
    }

    /// Rejects the paired future with `err`.
    pub fn reject(mut self, err: impl Into<Error>) {
        self.settle(Err(err.into()));
    }

    fn settle(&mut self, outcome: Result<T, Error>) {
        if let Some(state) = self.state.take() {
            state.settle(outcome);
        }
    }
}

impl<T: 'static> Promise<T> {
    /// Fulfils the paired future at the start of the next epoch.
    pub fn resolve_later(mut self, value: T) {
        self.settle_later(Ok(value));
    }

    /// Rejects the paired future at the start of the next epoch.
    pub fn reject_later(mut self, err: impl Into<Error>) {
        self.settle_later(Err(err.into()));
    }

    fn settle_later(&mut self, outcome: Result<T, Error>) {
        let Some(state) = self.state.take() else {
            return;
        };

        // Without a manager there is no next epoch; nothing can be
        // suspended on the future either, so settling now is equivalent.
        match self.manager.upgrade() {
            Some(manager) => manager.defer(Box::new(move || state.settle(outcome))),
            None => state.settle(outcome),
        }
    }
}

impl<T> Drop for Promise<T> {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            if !state.awaiter.is_settled() {
                state.settle(Err(Error::BrokenPromise));
            }
        }
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("settled", &self.state.is_none())
            .field("has_reader", &self.has_reader())
            .finish()
    }
}
