use crossbeam::channel::Receiver;
use tracing::debug;

/// A unit of blocking work, already wrapped to report its completion.
pub(crate) type Job = Box<dyn FnOnce() + Send>;

/// Runs jobs until the pool closes its channel.
///
/// Jobs still queued when the pool closes are run before the worker
/// exits. A job never unwinds into this loop: the wrapper built by
/// [`Pool::post`](crate::pool::Pool::post) catches the callable's panic.
pub(crate) fn run(id: usize, jobs: Receiver<Job>) {
    debug!(worker = id, "pool worker started");

    let mut executed = 0usize;

    while let Ok(job) = jobs.recv() {
        job();
        executed += 1;
    }

    debug!(worker = id, executed, "pool worker stopped");
}
