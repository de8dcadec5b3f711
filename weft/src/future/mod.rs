//! Single-resolution future/promise pairs.
//!
//! A [`Promise`] is the write side: it fulfils or rejects its paired
//! [`Future`] exactly once, either immediately or deferred to the next
//! drive epoch. The future is the read side: it is awaited by one task,
//! inspected with [`Future::get_err`], or handed to a combinator.
//!
//! Every future carries a single-slot awaiter. One future has one consumer;
//! fan-in over many futures is what the [`combinator`](crate::combinator)
//! module is for.

pub(crate) mod awaiter;
mod read;
pub(crate) mod state;
mod write;

pub use read::Future;
pub use write::Promise;

use crate::runtime::Manager;
use state::State;

use std::rc::Rc;

/// Observable state of a [`Future`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The outcome was taken, or the future was handed to a combinator.
    Empty,

    /// Waiting for the promise.
    Pending,

    /// Settled with a value.
    Fulfilled,

    /// Settled with an [`Error`](crate::Error).
    Rejected,
}

/// Creates a linked future/promise pair bound to `manager`.
///
/// The manager is only used by [`Promise::resolve_later`] and
/// [`Promise::reject_later`] to schedule the settlement on its next epoch.
///
/// # Examples
///
/// ```rust,ignore
/// let (future, promise) = weft::make_future::<String>(&manager);
/// promise.resolve("done".to_string());
/// assert!(future.is_settled());
/// ```
pub fn make_future<T>(manager: &Manager) -> (Future<T>, Promise<T>) {
    let state = Rc::new(State::pending());

    let future = Future::from_state(state.clone());
    let promise = Promise::new(state, manager.downgrade());

    (future, promise)
}
