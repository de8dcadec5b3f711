use std::borrow::Cow;

/// Convenient result alias used throughout the runtime.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The outcome carried by a rejected [`Future`](crate::Future).
///
/// Runtime rejections never unwind across a suspension point; they are
/// stored in the future and observed through `.await`,
/// [`Future::get_err`](crate::Future::get_err) or
/// [`Future::try_take`](crate::Future::try_take).
///
/// Logic errors (settling a promise twice, awaiting a consumed future,
/// resuming a running task) are not represented here: they panic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Rejected explicitly through [`Promise::reject`](crate::Promise::reject).
    #[error("rejected with code {code}: {message}")]
    Rejected {
        code: i32,
        message: Cow<'static, str>,
    },

    /// The promise was dropped without being settled.
    #[error("promise dropped before it was settled")]
    BrokenPromise,

    /// A deadline attached by [`time::timeout`](crate::time::timeout) passed first.
    #[error("deadline elapsed")]
    TimedOut,

    /// The task body or the pool callable panicked.
    #[error("panicked: {0}")]
    Panicked(String),

    /// The pool was shut down before the job could run.
    #[error("thread pool is closed")]
    PoolClosed,

    /// A dedicated stack for a stackful task could not be set up.
    #[error("failed to allocate a task stack: {0}")]
    StackAllocation(String),
}

impl Error {
    /// Builds a [`Error::Rejected`] from a code and a message.
    pub fn rejected(code: i32, message: impl Into<Cow<'static, str>>) -> Self {
        Error::Rejected {
            code,
            message: message.into(),
        }
    }

    /// Returns the rejection code, if this is an explicit rejection.
    pub fn code(&self) -> Option<i32> {
        match self {
            Error::Rejected { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Converts a panic payload into a [`Error::Panicked`].
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };

        Error::Panicked(message)
    }
}

impl From<&'static str> for Error {
    fn from(message: &'static str) -> Self {
        Error::rejected(-1, message)
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::rejected(-1, message)
    }
}

impl From<(i32, &'static str)> for Error {
    fn from((code, message): (i32, &'static str)) -> Self {
        Error::rejected(code, message)
    }
}
