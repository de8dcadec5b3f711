use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A future that yields execution back to the manager exactly once.
///
/// Created by [`yield_now`].
#[derive(Debug, Default)]
#[must_use = "futures do nothing unless awaited"]
pub struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    /// On the first poll the task re-enqueues itself and suspends; the
    /// manager resumes it in the next epoch, after every task that was
    /// already ready.
    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if !self.yielded {
            self.yielded = true;
            cx.waker().wake_by_ref();
            return Poll::Pending;
        }

        Poll::Ready(())
    }
}

/// Yields execution back to the manager.
///
/// This allows the other ready tasks to make progress before the current
/// task continues.
///
/// # Examples
///
/// ```rust,ignore
/// manager.spawn_now(async {
///     // Let the rest of the epoch run first
///     weft::yield_now().await;
/// }).detach();
/// ```
pub fn yield_now() -> YieldNow {
    YieldNow::default()
}
