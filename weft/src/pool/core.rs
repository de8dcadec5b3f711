use super::builder::PoolBuilder;
use super::worker::{self, Job};
use crate::error::Error;
use crate::future::Future;
use crate::runtime::Manager;
use crate::runtime::inbox::{Completion, Payload};

use crossbeam::channel::{self, Sender};
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use tracing::debug;

/// A pool of OS threads for blocking work.
///
/// [`post`](Self::post) runs a callable on a worker and returns a future
/// bound to a [`Manager`]. The worker never touches that future: it pushes
/// the result into the manager's completion inbox, and the manager
/// resolves the future during its next [`drive`](Manager::drive), on the
/// driver thread.
///
/// One pool can serve several managers. Dropping the pool closes it and
/// waits for the jobs already posted.
pub struct Pool {
    /// Job channel, `None` once the pool is closed.
    sender: Mutex<Option<Sender<Job>>>,

    /// Worker threads, joined on shutdown.
    workers: Mutex<Vec<JoinHandle<()>>>,

    threads: usize,
}

impl Pool {
    /// Creates a pool of `threads` workers.
    ///
    /// # Panics
    ///
    /// Panics if `threads == 0`.
    pub fn new(threads: usize) -> io::Result<Self> {
        PoolBuilder::new().threads(threads).build()
    }

    pub fn builder() -> PoolBuilder {
        PoolBuilder::new()
    }

    pub(crate) fn start(config: PoolBuilder) -> io::Result<Self> {
        let (sender, receiver) = channel::unbounded::<Job>();

        let pool = Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(Vec::with_capacity(config.threads)),
            threads: config.threads,
        };

        for id in 0..config.threads {
            let jobs = receiver.clone();

            let handle = thread::Builder::new()
                .name(format!("{}-{id}", config.thread_name))
                .spawn(move || worker::run(id, jobs))?;

            pool.workers.lock().push(handle);
        }

        debug!(threads = config.threads, "pool started");

        Ok(pool)
    }

    /// Runs `job` on a worker thread.
    ///
    /// The returned future settles during a [`drive`](Manager::drive) of
    /// `manager` after the job finished: fulfilled with its return value,
    /// or rejected with [`Error::Panicked`] if it panicked. If the pool is
    /// already closed it is rejected with [`Error::PoolClosed`], also from
    /// inside `drive`.
    ///
    /// `job` must not capture anything belonging to the driver thread;
    /// the `Send` bound enforces it.
    pub fn post<F, R>(&self, manager: &Manager, job: F) -> Future<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (future, promise) = manager.make_future::<R>();

        let ticket = manager.register_ticket(Box::new(move |payload: Payload| match payload {
            Ok(boxed) => match boxed.downcast::<R>() {
                Ok(value) => promise.resolve(*value),
                Err(_) => promise.reject(Error::Panicked(
                    "pool job produced a value of an unexpected type".to_string(),
                )),
            },
            Err(err) => promise.reject(err),
        }));

        let inbox = manager.inbox();
        let reply = inbox.clone();

        let wrapped: Job = Box::new(move || {
            let payload = panic::catch_unwind(AssertUnwindSafe(job))
                .map(|value| Box::new(value) as Box<dyn Any + Send>)
                .map_err(Error::from_panic);

            reply.push(Completion { ticket, payload });
        });

        let sent = match self.sender.lock().as_ref() {
            Some(sender) => sender.send(wrapped).is_ok(),
            None => false,
        };

        if !sent {
            debug!(ticket, "job posted to a closed pool");

            inbox.push(Completion {
                ticket,
                payload: Err(Error::PoolClosed),
            });
        }

        future
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Closes the pool and waits for the workers to finish the jobs
    /// already posted.
    ///
    /// Jobs posted afterwards are rejected with [`Error::PoolClosed`].
    pub fn shutdown(&self) {
        let sender = self.sender.lock().take();
        drop(sender);

        let workers = std::mem::take(&mut *self.workers.lock());

        if workers.is_empty() {
            return;
        }

        for worker in workers {
            let _ = worker.join();
        }

        debug!(threads = self.threads, "pool shut down");
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("threads", &self.threads)
            .field("closed", &self.is_closed())
            .finish()
    }
}
