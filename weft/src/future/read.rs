use super::Status;
use super::state::State;
use crate::error::Error;

use std::fmt;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};
use std::time::Instant;

/// The read side of a single-resolution channel.
///
/// A `Future` is created together with its [`Promise`](crate::Promise) by
/// [`make_future`](crate::make_future). It settles exactly once, to a value
/// or to an [`Error`], and is consumed exactly once: by `.await`, by
/// [`try_take`](Self::try_take), or by handing it to a combinator.
///
/// Awaiting a pending future suspends the current task until the promise
/// settles; awaiting a settled future completes without suspending.
///
/// # Examples
///
/// ```rust,ignore
/// let (future, promise) = manager.make_future::<u32>();
///
/// manager.spawn_now(async move {
///     let value = future.await?;
///     assert_eq!(value, 7);
///     Ok::<_, weft::Error>(())
/// }).detach();
///
/// promise.resolve(7);
/// manager.drive();
/// ```
pub struct Future<T> {
    /// Shared state, `None` once moved into a settlement callback.
    state: Option<Rc<State<T>>>,
}

impl<T> Future<T> {
    pub(crate) fn from_state(state: Rc<State<T>>) -> Self {
        Self { state: Some(state) }
    }

    /// Creates a future that is already fulfilled with `value`.
    pub fn ready(value: T) -> Self {
        Self::from_state(Rc::new(State::settled(Ok(value))))
    }

    /// Creates a future that is already rejected with `err`.
    pub fn rejected(err: impl Into<Error>) -> Self {
        Self::from_state(Rc::new(State::settled(Err(err.into()))))
    }

    /// Returns the current status of the future.
    pub fn status(&self) -> Status {
        match &self.state {
            Some(state) => state.awaiter.status(),
            None => Status::Empty,
        }
    }

    /// Returns `true` once the promise fulfilled or rejected the future
    /// and the outcome has not been taken yet.
    pub fn is_settled(&self) -> bool {
        matches!(self.status(), Status::Fulfilled | Status::Rejected)
    }

    /// Returns the rejection of a settled future, or `None` if it was fulfilled.
    ///
    /// # Panics
    ///
    /// Panics if the future has not settled yet or its outcome was already
    /// consumed.
    pub fn get_err(&self) -> Option<Error> {
        match self.status() {
            Status::Fulfilled => None,
            Status::Rejected => self.state().error(),
            Status::Pending => panic!("get_err called on an unsettled future"),
            Status::Empty => panic!("get_err called on a consumed future"),
        }
    }

    /// Takes the outcome without suspending.
    ///
    /// Returns `None` while the future is pending.
    ///
    /// # Panics
    ///
    /// Panics if the outcome was already consumed.
    pub fn try_take(&mut self) -> Option<Result<T, Error>> {
        let state = self.state();

        if state.awaiter.is_settled() {
            Some(state.take())
        } else if state.awaiter.status() == Status::Pending {
            None
        } else {
            panic!("future awaited after its outcome was consumed");
        }
    }

    /// Deadline attached by [`time::timeout`](crate::time::timeout) or
    /// [`time::with_deadline`](crate::time::with_deadline), if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.state.as_ref().and_then(|state| state.deadline())
    }

    pub(crate) fn set_deadline(&self, deadline: Instant) {
        self.state().set_deadline(deadline);
    }

    /// Registers the waker of the task that will consume this future.
    pub(crate) fn register_waker(&self, waker: &Waker) {
        self.state().awaiter.register_waker(waker);
    }

    /// Converts the future into a settlement callback.
    ///
    /// `callback` receives the outcome synchronously, from inside the
    /// settling call, or right away if the future already settled.
    ///
    /// # Panics
    ///
    /// Panics if the outcome was already consumed.
    pub(crate) fn on_settle(mut self, callback: impl FnOnce(Result<T, Error>) + 'static)
    where
        T: 'static,
    {
        let state = self
            .state
            .take()
            .expect("future already handed to a consumer");

        match state.awaiter.status() {
            Status::Pending => {}
            Status::Empty => panic!("future awaited after its outcome was consumed"),
            Status::Fulfilled | Status::Rejected => {
                callback(state.take());
                return;
            }
        }

        let reader = state.clone();
        state
            .awaiter
            .register_callback(Box::new(move || callback(reader.take())));
    }

    fn state(&self) -> &State<T> {
        self.state
            .as_deref()
            .expect("future already handed to a consumer")
    }
}

impl<T> std::future::Future for Future<T> {
    type Output = Result<T, Error>;

    /// Takes the outcome if the future settled, otherwise registers the
    /// current task as the single waiter and suspends.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if let Some(outcome) = this.try_take() {
            return Poll::Ready(outcome);
        }

        this.register_waker(cx.waker());
        Poll::Pending
    }
}

impl<T> Drop for Future<T> {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            state.drop_reader();
        }
    }
}

impl<T> fmt::Debug for Future<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future")
            .field("status", &self.status())
            .field("deadline", &self.deadline())
            .finish()
    }
}
