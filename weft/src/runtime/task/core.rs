use super::Header;
use crate::error::Error;
use crate::runtime::stackful::StackfulFrame;

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Routes the panic of a task body to the task's completion future.
///
/// Hands the error back if nobody is left to observe it.
pub(crate) type PanicHook = Box<dyn FnOnce(Error) -> Option<Error>>;

/// A resumable unit of cooperative work.
///
/// Both variants resume to their next suspension point and report
/// `Poll::Ready(())` once the body finished; the manager does not need to
/// know which one it is driving.
pub(crate) enum Frame {
    /// A state machine produced by an `async` block or any other future.
    Stackless(Pin<Box<dyn Future<Output = ()>>>),

    /// A body running on its own stack.
    Stackful(StackfulFrame),
}

impl Frame {
    pub(crate) fn resume(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        match self {
            Frame::Stackless(future) => future.as_mut().poll(cx),
            Frame::Stackful(fiber) => fiber.resume(cx),
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Frame::Stackless(_) => "stackless",
            Frame::Stackful(_) => "stackful",
        }
    }
}

/// Arena slot of one task.
pub(crate) struct TaskSlot {
    /// Shared scheduling header, also held by wakers and the task handle.
    pub(crate) header: Arc<Header>,

    /// The frame, `None` while it is being resumed.
    pub(crate) frame: Option<Frame>,

    /// Whether the caller gave up ownership of the task.
    pub(crate) detached: bool,

    /// Routes a panic of the body to the task's completion future.
    pub(crate) on_panic: Option<PanicHook>,
}

impl TaskSlot {
    pub(crate) fn new(header: Arc<Header>, frame: Frame, on_panic: PanicHook) -> Self {
        Self {
            header,
            frame: Some(frame),
            detached: false,
            on_panic: Some(on_panic),
        }
    }
}

impl fmt::Debug for TaskSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSlot")
            .field("id", &self.header.id)
            .field("kind", &self.frame.as_ref().map(Frame::kind))
            .field("detached", &self.detached)
            .finish()
    }
}
