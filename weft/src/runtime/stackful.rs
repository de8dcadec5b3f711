//! Stackful task frames.
//!
//! A stackful task runs a plain closure on a dedicated stack. The closure
//! suspends by yielding that stack back to the driver, which makes
//! blocking-style code (`let v = fiber.wait(future)?;`) possible without
//! turning it into an `async` state machine.
//!
//! Each task pays for a full stack: [`DEFAULT_STACK_SIZE`] words unless
//! configured otherwise through
//! [`ManagerBuilder::stack_size`](crate::ManagerBuilder::stack_size).

use crate::error::Error;
use crate::runtime::Manager;

use generator::{Gn, LocalGenerator};
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::pin::pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};
use std::time::Duration;

/// Default stack size of a stackful task, in machine words (32 KiB on
/// 64-bit targets).
///
/// Small bodies fit comfortably; deep recursion or large locals inside a
/// fiber need a larger value.
pub const DEFAULT_STACK_SIZE: usize = 0x1000;

/// Suspension context handed to the body of a stackful task.
///
/// Every method that waits suspends the fiber's stack and returns control
/// to the driver; the fiber is resumed by the same waker contract as a
/// stackless task.
pub struct Fiber<'a> {
    /// Yields the fiber's stack back to whoever resumed it.
    suspend: &'a mut dyn FnMut(),

    /// Waker of the task, refreshed on every resumption.
    waker: Rc<RefCell<Waker>>,
}

impl Fiber<'_> {
    /// Suspends the fiber until `future` completes and returns its output.
    ///
    /// Works with a [`Future`](crate::Future), a
    /// [`TaskHandle`](crate::TaskHandle) or any other
    /// [`std::future::Future`].
    pub fn wait<F: std::future::Future>(&mut self, future: F) -> F::Output {
        let mut future = pin!(future);

        loop {
            let waker = self.waker.borrow().clone();
            let mut cx = Context::from_waker(&waker);

            if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
                return output;
            }

            (self.suspend)();
        }
    }

    /// Gives the other ready tasks a turn; the fiber resumes next epoch.
    pub fn yield_now(&mut self) {
        self.waker.borrow().wake_by_ref();
        (self.suspend)();
    }

    /// Suspends the fiber for `duration` of `manager`'s clock.
    pub fn sleep(&mut self, manager: &Manager, duration: Duration) -> Result<(), Error> {
        self.wait(manager.make_clock(duration))
    }
}

/// The suspended stack of a stackful task.
pub(crate) struct StackfulFrame {
    generator: LocalGenerator<'static, (), ()>,
    waker: Rc<RefCell<Waker>>,
}

impl StackfulFrame {
    /// Allocates a stack of `stack_size` words and prepares `body` to run
    /// on it. The body does not start until the first resumption.
    pub(crate) fn new<F>(stack_size: usize, body: F) -> Result<Self, Error>
    where
        F: FnOnce(&mut Fiber<'_>) + 'static,
    {
        let waker = Rc::new(RefCell::new(Waker::noop().clone()));
        let shared = waker.clone();

        let generator = panic::catch_unwind(AssertUnwindSafe(|| {
            Gn::<()>::new_scoped_opt_local(stack_size, move |mut scope| {
                let mut suspend = || {
                    scope.yield_with(());
                };

                let mut fiber = Fiber {
                    suspend: &mut suspend,
                    waker: shared,
                };

                body(&mut fiber);
            })
        }))
        .map_err(|payload| match Error::from_panic(payload) {
            Error::Panicked(message) => Error::StackAllocation(message),
            other => other,
        })?;

        Ok(Self { generator, waker })
    }

    /// Switches to the fiber's stack until it suspends or returns.
    ///
    /// A panic of the body is re-raised on the caller's stack.
    pub(crate) fn resume(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        self.waker.borrow_mut().clone_from(cx.waker());

        let _ = self.generator.resume();

        if self.generator.is_done() {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}
