use super::awaiter::Awaiter;
use crate::error::Error;

use std::cell::{Cell, RefCell};
use std::time::Instant;

/// Synchronization state shared by a future and its promise.
///
/// The promise is the single writer, the future (or the callback it was
/// converted into) the single reader.
pub(crate) struct State<T> {
    /// Resolution bit-state and waiter slot.
    pub(crate) awaiter: Awaiter,

    /// Typed payload slot, written once before the awaiter is notified.
    outcome: RefCell<Option<Result<T, Error>>>,

    /// Whether a reader (future or settlement callback) still exists.
    reader: Cell<bool>,

    /// Deadline attached by a timeout, if any.
    deadline: Cell<Option<Instant>>,
}

impl<T> State<T> {
    pub(crate) fn pending() -> Self {
        Self {
            awaiter: Awaiter::pending(),
            outcome: RefCell::new(None),
            reader: Cell::new(true),
            deadline: Cell::new(None),
        }
    }

    pub(crate) fn settled(outcome: Result<T, Error>) -> Self {
        Self {
            awaiter: Awaiter::settled(outcome.is_err()),
            outcome: RefCell::new(Some(outcome)),
            reader: Cell::new(true),
            deadline: Cell::new(None),
        }
    }

    /// Stores the outcome and notifies the waiter, if one is registered.
    ///
    /// # Panics
    ///
    /// Panics if the state already settled.
    pub(crate) fn settle(&self, outcome: Result<T, Error>) {
        let waiter = self.awaiter.settle(outcome.is_err());
        *self.outcome.borrow_mut() = Some(outcome);

        if let Some(waiter) = waiter {
            waiter.notify();
        }
    }

    /// Takes the settled outcome, leaving the state consumed.
    ///
    /// # Panics
    ///
    /// Panics if the state is pending or already consumed.
    pub(crate) fn take(&self) -> Result<T, Error> {
        self.awaiter.consume();

        self.outcome
            .borrow_mut()
            .take()
            .expect("settled future without an outcome")
    }

    /// Clones the rejection, if the state settled with one.
    pub(crate) fn error(&self) -> Option<Error> {
        match self.outcome.borrow().as_ref() {
            Some(Err(err)) => Some(err.clone()),
            _ => None,
        }
    }

    pub(crate) fn has_reader(&self) -> bool {
        self.reader.get()
    }

    pub(crate) fn drop_reader(&self) {
        self.reader.set(false);
    }

    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.deadline.get()
    }

    pub(crate) fn set_deadline(&self, deadline: Instant) {
        self.deadline.set(Some(deadline));
    }
}
