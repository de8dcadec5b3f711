use crate::error::Error;
use crate::future::Future;
use crate::runtime::Manager;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Bounds `future` by `duration` of `manager`'s clock.
///
/// The returned future settles like `future` if it settles first, and is
/// rejected with [`Error::TimedOut`] otherwise. Its deadline is reported
/// by [`Future::deadline`].
///
/// # Examples
///
/// ```rust,ignore
/// let reply = time::timeout(&manager, request, Duration::from_secs(5));
///
/// match reply.await {
///     Err(weft::Error::TimedOut) => retry(),
///     other => handle(other),
/// }
/// ```
pub fn timeout<T: 'static>(manager: &Manager, future: Future<T>, duration: Duration) -> Future<T> {
    with_deadline(manager, future, manager.now() + duration)
}

/// Bounds `future` by an absolute `deadline`.
pub fn with_deadline<T: 'static>(
    manager: &Manager,
    future: Future<T>,
    deadline: Instant,
) -> Future<T> {
    let (bounded, promise) = manager.make_future();
    bounded.set_deadline(deadline);

    let slot = Rc::new(RefCell::new(Some(promise)));
    let on_outcome = slot.clone();

    let (clock, cancelled) = manager.make_cancellable_clock_at(deadline);

    // Settling first cancels the clock, so the registry only holds live
    // deadlines.
    future.on_settle(move |outcome| {
        let promise = on_outcome.borrow_mut().take();

        if let Some(promise) = promise {
            cancelled.set(true);

            match outcome {
                Ok(value) => promise.resolve(value),
                Err(err) => promise.reject(err),
            }
        }
    });

    clock.on_settle(move |fired| {
        if fired.is_err() {
            return;
        }

        let promise = slot.borrow_mut().take();

        if let Some(promise) = promise {
            promise.reject(Error::TimedOut);
        }
    });

    bounded
}
