use super::Status;

use std::cell::{Cell, RefCell};
use std::task::Waker;

/// The future is waiting for its promise.
const PENDING: u8 = 0;

/// The promise resolved the future with a value.
const FULFILLED: u8 = 1;

/// The promise rejected the future with an error.
const REJECTED: u8 = 2;

/// The settled outcome has been taken by the consumer.
const CONSUMED: u8 = 3;

/// Whoever gets resumed when the future settles.
pub(crate) enum Waiter {
    /// A suspended task, stackless or stackful, resumed through its waker.
    Task(Waker),

    /// A settlement adapter installed by a combinator or a timeout.
    ///
    /// Runs synchronously inside the settling call.
    Callback(Box<dyn FnOnce()>),
}

impl Waiter {
    /// Hands control to the waiter.
    ///
    /// Waking a task only re-enqueues it on the manager, it never resumes
    /// the task frame from inside this call.
    pub(crate) fn notify(self) {
        match self {
            Waiter::Task(waker) => waker.wake(),
            Waiter::Callback(callback) => callback(),
        }
    }
}

/// Single-slot wake registration attached to one future.
///
/// The awaiter records the resolution state of the future and at most one
/// waiter. A second concurrent consumer is a logic error: combinators get
/// their fan-in by owning one child future each.
pub(crate) struct Awaiter {
    /// One of `PENDING`, `FULFILLED`, `REJECTED` or `CONSUMED`.
    state: Cell<u8>,

    /// The registered waiter, if any.
    waiter: RefCell<Option<Waiter>>,
}

impl Awaiter {
    /// Creates an awaiter for a future that has not settled yet.
    pub(crate) fn pending() -> Self {
        Self {
            state: Cell::new(PENDING),
            waiter: RefCell::new(None),
        }
    }

    /// Creates an awaiter for a future that is born settled.
    pub(crate) fn settled(rejected: bool) -> Self {
        Self {
            state: Cell::new(if rejected { REJECTED } else { FULFILLED }),
            waiter: RefCell::new(None),
        }
    }

    pub(crate) fn status(&self) -> Status {
        match self.state.get() {
            PENDING => Status::Pending,
            FULFILLED => Status::Fulfilled,
            REJECTED => Status::Rejected,
            _ => Status::Empty,
        }
    }

    pub(crate) fn is_settled(&self) -> bool {
        matches!(self.state.get(), FULFILLED | REJECTED)
    }

    /// Registers (or refreshes) the waker of the task awaiting the future.
    ///
    /// # Panics
    ///
    /// Panics if a settlement callback already owns the future.
    pub(crate) fn register_waker(&self, waker: &Waker) {
        let mut slot = self.waiter.borrow_mut();

        match slot.as_mut() {
            Some(Waiter::Task(current)) => {
                if !current.will_wake(waker) {
                    current.clone_from(waker);
                }
            }
            Some(Waiter::Callback(_)) => {
                panic!("future already has a registered consumer");
            }
            None => *slot = Some(Waiter::Task(waker.clone())),
        }
    }

    /// Installs a settlement callback.
    ///
    /// # Panics
    ///
    /// Panics if any waiter is already registered.
    pub(crate) fn register_callback(&self, callback: Box<dyn FnOnce()>) {
        let mut slot = self.waiter.borrow_mut();
        assert!(slot.is_none(), "future already has a registered consumer");
        *slot = Some(Waiter::Callback(callback));
    }

    /// Transitions to fulfilled or rejected and returns the waiter to notify.
    ///
    /// The caller must store the outcome before notifying the waiter.
    ///
    /// # Panics
    ///
    /// Panics if the future already settled: a promise resolves at most once.
    pub(crate) fn settle(&self, rejected: bool) -> Option<Waiter> {
        assert_eq!(
            self.state.get(),
            PENDING,
            "promise settled twice: a future resolves at most once"
        );

        self.state
            .set(if rejected { REJECTED } else { FULFILLED });

        self.waiter.borrow_mut().take()
    }

    /// Marks the settled outcome as taken.
    ///
    /// # Panics
    ///
    /// Panics if the future is still pending or was already consumed.
    pub(crate) fn consume(&self) {
        match self.state.get() {
            FULFILLED | REJECTED => self.state.set(CONSUMED),
            PENDING => panic!("future consumed before it settled"),
            _ => panic!("future awaited after its outcome was consumed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::rc::Rc;

    #[test]
    fn test_settle_returns_registered_callback() {
        let awaiter = Awaiter::pending();
        let fired = Rc::new(Cell::new(false));

        let flag = fired.clone();
        awaiter.register_callback(Box::new(move || flag.set(true)));

        let waiter = awaiter.settle(false).expect("callback was registered");
        waiter.notify();

        assert!(fired.get());
        assert_eq!(awaiter.status(), Status::Fulfilled);
    }

    #[test]
    #[should_panic(expected = "promise settled twice")]
    fn test_second_settlement_is_fatal() {
        let awaiter = Awaiter::pending();
        let _ = awaiter.settle(false);
        let _ = awaiter.settle(true);
    }

    #[test]
    #[should_panic(expected = "already has a registered consumer")]
    fn test_second_consumer_is_fatal() {
        let awaiter = Awaiter::pending();
        awaiter.register_callback(Box::new(|| {}));
        awaiter.register_callback(Box::new(|| {}));
    }

    #[test]
    #[should_panic(expected = "outcome was consumed")]
    fn test_consume_twice_is_fatal() {
        let awaiter = Awaiter::settled(false);
        awaiter.consume();
        awaiter.consume();
    }

    #[test]
    fn test_rejected_status_survives_until_consumed() {
        let awaiter = Awaiter::pending();
        assert!(awaiter.settle(true).is_none());

        assert!(awaiter.is_settled());
        assert_eq!(awaiter.status(), Status::Rejected);

        awaiter.consume();
        assert_eq!(awaiter.status(), Status::Empty);
    }
}
