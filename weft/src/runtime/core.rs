use super::builder::ManagerBuilder;
use super::inbox::{Completion, Inbox, InboxHandle, Payload};
use super::queue::ReadyQueue;
use super::stackful::{Fiber, StackfulFrame};
use super::task::state::{QUEUED, RUNNING};
use super::task::{
    Frame, Header, PanicHook, TaskHandle, TaskId, TaskSlot, TaskState, make_waker,
};
use crate::error::Error;
use crate::future::{self, Future, Promise};
use crate::time::timer::{Cancelled, Timers};
use crate::utils::Slab;

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// A settlement postponed to the start of the next epoch.
pub(crate) type Deferred = Box<dyn FnOnce()>;

/// Driver-side continuation of a job posted to a pool.
pub(crate) type TicketHandler = Box<dyn FnOnce(Payload)>;

/// The cooperative task manager.
///
/// A `Manager` owns everything the driver thread schedules: the task arena,
/// the ready queue, the timer registry and the inbox through which pool
/// workers hand completions back. It is advanced one epoch at a time by
/// [`drive`](Self::drive), which the embedder calls in a loop (or lets
/// [`run_until`](Self::run_until) call).
///
/// `Manager` is a cheap, clonable handle. It is neither `Send` nor `Sync`:
/// all tasks, futures and promises of a manager live on its driver thread.
///
/// # Examples
///
/// ```rust,ignore
/// let manager = Manager::new();
/// let (future, promise) = manager.make_future::<u32>();
///
/// let handle = manager.spawn_now(async move { future.await });
/// promise.resolve_later(7);
///
/// assert_eq!(manager.run_until(handle.into_result()).unwrap(), Ok(7));
/// ```
#[derive(Clone)]
pub struct Manager {
    core: Rc<Core>,
}

/// A non-owning reference to a [`Manager`].
///
/// Promises keep one to schedule deferred settlements without keeping
/// the manager alive.
#[derive(Clone)]
pub struct WeakManager {
    core: Weak<Core>,
}

struct Core {
    /// Arena of live tasks.
    tasks: RefCell<Slab<TaskSlot>>,

    /// Ids of tasks ready to be resumed, shared with every task waker.
    ready: Arc<ReadyQueue>,

    /// Settlements deferred by `resolve_later` / `reject_later`.
    deferred: RefCell<VecDeque<Deferred>>,

    /// One-shot timers.
    timers: RefCell<Timers>,

    /// Completions pushed by pool workers.
    inbox: InboxHandle,

    /// Outstanding pool jobs, keyed by ticket.
    tickets: RefCell<HashMap<u64, TicketHandler>>,

    /// Next ticket to hand out.
    next_ticket: Cell<u64>,

    /// Set while `drive` runs.
    driving: Cell<bool>,

    /// Number of epochs driven so far.
    epoch: Cell<u64>,

    config: ManagerBuilder,
}

/// Resets the reentrancy flag when `drive` returns or unwinds.
struct DriveGuard<'a>(&'a Cell<bool>);

impl<'a> DriveGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        assert!(!flag.replace(true), "Manager::drive called reentrantly");
        Self(flag)
    }
}

impl Drop for DriveGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Manager {
    /// Creates a manager with the default configuration.
    pub fn new() -> Self {
        ManagerBuilder::new().build()
    }

    /// Returns a builder to configure a manager.
    pub fn builder() -> ManagerBuilder {
        ManagerBuilder::new()
    }

    pub(crate) fn with_config(config: ManagerBuilder) -> Self {
        let core = Core {
            tasks: RefCell::new(Slab::with_capacity(64)),
            ready: Arc::new(ReadyQueue::new()),
            deferred: RefCell::new(VecDeque::new()),
            timers: RefCell::new(Timers::new()),
            inbox: Arc::new(Inbox::new()),
            tickets: RefCell::new(HashMap::new()),
            next_ticket: Cell::new(0),
            driving: Cell::new(false),
            epoch: Cell::new(0),
            config,
        };

        Self {
            core: Rc::new(core),
        }
    }

    pub fn downgrade(&self) -> WeakManager {
        WeakManager {
            core: Rc::downgrade(&self.core),
        }
    }

    /// Current instant of the manager's clock.
    pub fn now(&self) -> Instant {
        self.core.config.clock.now()
    }

    /// Creates a linked future/promise pair bound to this manager.
    pub fn make_future<T>(&self) -> (Future<T>, Promise<T>) {
        future::make_future(self)
    }

    /// Creates a one-shot clock that fires `duration` from now.
    ///
    /// The returned future is fulfilled by the first [`drive`](Self::drive)
    /// whose clock reading is at or past the deadline, never earlier.
    pub fn make_clock(&self, duration: Duration) -> Future<()> {
        self.make_clock_at(self.now() + duration)
    }

    /// Creates a one-shot clock that fires at `deadline`.
    pub fn make_clock_at(&self, deadline: Instant) -> Future<()> {
        let (future, _) = self.make_cancellable_clock_at(deadline);
        future
    }

    /// Creates a one-shot clock together with the flag that cancels it.
    ///
    /// A cancelled clock is removed from the registry without firing.
    pub(crate) fn make_cancellable_clock_at(&self, deadline: Instant) -> (Future<()>, Cancelled) {
        let (future, promise) = self.make_future();
        let cancelled = self.core.timers.borrow_mut().insert(deadline, promise);

        (future, cancelled)
    }

    /// Spawns a task and runs it right away, up to its first suspension
    /// point, before returning.
    ///
    /// A task spawned this way observes the spawner's state as it was at
    /// the call, and the spawner observes everything the child did before
    /// suspending.
    pub fn spawn_now<F>(&self, body: F) -> TaskHandle<F::Output>
    where
        F: std::future::Future + 'static,
        F::Output: 'static,
    {
        let (handle, header) = self.spawn_stackless(body, RUNNING);
        debug!(task = %header.id, "spawned task now");

        self.run(header);
        handle
    }

    /// Spawns a task whose first resumption happens in the next epoch.
    ///
    /// This is how a task spawns itself recursively without growing the
    /// stack.
    pub fn spawn_later<F>(&self, body: F) -> TaskHandle<F::Output>
    where
        F: std::future::Future + 'static,
        F::Output: 'static,
    {
        let (handle, header) = self.spawn_stackless(body, QUEUED);
        debug!(task = %header.id, "spawned task for next epoch");

        self.core.ready.push(header.id);
        handle
    }

    /// Spawns a stackful task and runs it up to its first suspension point.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StackAllocation`] if the task's stack cannot be set up.
    pub fn spawn_stackful_now<F, T>(&self, body: F) -> Result<TaskHandle<T>, Error>
    where
        F: FnOnce(&mut Fiber<'_>) -> T + 'static,
        T: 'static,
    {
        let (handle, header) = self.spawn_stackful(body, RUNNING)?;
        debug!(task = %header.id, "spawned stackful task now");

        self.run(header);
        Ok(handle)
    }

    /// Spawns a stackful task whose first resumption happens in the next epoch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StackAllocation`] if the task's stack cannot be set up.
    pub fn spawn_stackful_later<F, T>(&self, body: F) -> Result<TaskHandle<T>, Error>
    where
        F: FnOnce(&mut Fiber<'_>) -> T + 'static,
        T: 'static,
    {
        let (handle, header) = self.spawn_stackful(body, QUEUED)?;
        debug!(task = %header.id, "spawned stackful task for next epoch");

        self.core.ready.push(header.id);
        Ok(handle)
    }

    /// Runs one scheduling epoch and returns the number of tasks resumed.
    ///
    /// The epoch:
    /// 1. applies the settlements deferred before this call,
    /// 2. fires every timer whose deadline has passed, earliest first,
    /// 3. drains the pool completion inbox,
    /// 4. resumes every task that was ready when this step started.
    ///
    /// Tasks woken or spawned with `spawn_later` during step 4 run in the
    /// next epoch. `drive` never blocks.
    ///
    /// # Panics
    ///
    /// Panics if called from inside another `drive` of the same manager
    /// (for instance from a task body).
    pub fn drive(&self) -> usize {
        let _guard = DriveGuard::enter(&self.core.driving);

        let epoch = self.core.epoch.get() + 1;
        self.core.epoch.set(epoch);

        let settled = self.apply_deferred();
        let fired = self.fire_timers();
        let completed = self.drain_inbox();
        let resumed = self.resume_ready();

        trace!(epoch, settled, fired, completed, resumed, "epoch driven");

        resumed
    }

    /// Drives the manager until `future` settles and returns its outcome.
    ///
    /// When nothing is ready the driver thread parks until the next timer
    /// deadline or pool completion, at most for the configured
    /// [`max_idle_park`](ManagerBuilder::max_idle_park).
    ///
    /// # Panics
    ///
    /// Panics if called from a task, or if `future` is still pending while
    /// the manager has no ready task, timer, deferred settlement or pool
    /// job left: nothing could ever settle it.
    pub fn run_until<T>(&self, mut future: Future<T>) -> Result<T, Error> {
        self.core.inbox.set_driver(thread::current());

        loop {
            if let Some(outcome) = future.try_take() {
                return outcome;
            }

            self.drive();

            if let Some(outcome) = future.try_take() {
                return outcome;
            }

            if self.has_immediate_work() {
                continue;
            }

            match self.idle_park_timeout() {
                Some(timeout) => thread::park_timeout(timeout),
                None => panic!("run_until: the future is pending and nothing is left to drive"),
            }
        }
    }

    /// Spawns `body` and drives the manager until it completes.
    pub fn block_on<F>(&self, body: F) -> Result<F::Output, Error>
    where
        F: std::future::Future + 'static,
        F::Output: 'static,
    {
        let result = self.spawn_now(body).into_result();
        self.run_until(result)
    }

    /// Aborts every task and releases every pending timer, deferred
    /// settlement and pool ticket.
    ///
    /// Tasks commonly hold a clone of their manager, which keeps it alive;
    /// `shutdown` breaks those cycles. Futures still pending afterwards
    /// are rejected with [`Error::BrokenPromise`] as their promises drop.
    pub fn shutdown(&self) {
        let mut aborted = 0;

        loop {
            let deferred = std::mem::take(&mut *self.core.deferred.borrow_mut());
            let timers = self.core.timers.borrow_mut().drain();
            let tickets: Vec<TicketHandler> = self
                .core
                .tickets
                .borrow_mut()
                .drain()
                .map(|(_, handler)| handler)
                .collect();
            let tasks = self.core.tasks.borrow_mut().drain();

            self.core.ready.clear();

            for slot in &tasks {
                let previous = TaskState::from_raw(slot.header.abort());

                if slot.detached {
                    warn!(task = %slot.header.id, ?previous, "detached task dropped by shutdown before completing");
                }
            }

            aborted += tasks.len();

            let done =
                deferred.is_empty() && timers.is_empty() && tickets.is_empty() && tasks.is_empty();

            for settle in deferred {
                settle();
            }

            drop(timers);
            drop(tickets);
            drop(tasks);

            if done {
                break;
            }
        }

        debug!(aborted, "manager shut down");
    }

    /// Number of live tasks, detached ones included.
    pub fn task_count(&self) -> usize {
        self.core.tasks.borrow().len()
    }

    /// Number of live tasks whose handle was detached.
    pub fn detached_count(&self) -> usize {
        self.core
            .tasks
            .borrow()
            .values()
            .filter(|slot| slot.detached)
            .count()
    }

    /// Number of timers that have not fired yet.
    ///
    /// Cancelled timers and clocks whose future was dropped are not counted.
    pub fn timer_count(&self) -> usize {
        self.prune_timers();
        self.core.timers.borrow().len()
    }

    /// Number of epochs driven so far.
    pub fn epoch(&self) -> u64 {
        self.core.epoch.get()
    }

    /// Returns `true` if there is nothing left for `drive` to do now or
    /// later: no ready task, timer, deferred settlement or pool job.
    ///
    /// Suspended tasks waiting on a future nobody settles do not count.
    pub fn is_idle(&self) -> bool {
        self.prune_timers();

        !self.has_immediate_work()
            && self.core.timers.borrow().is_empty()
            && self.core.tickets.borrow().is_empty()
    }

    /// Queues a settlement for the start of the next epoch.
    pub(crate) fn defer(&self, settle: Deferred) {
        self.core.deferred.borrow_mut().push_back(settle);
    }

    /// Registers the continuation of a pool job and returns its ticket.
    pub(crate) fn register_ticket(&self, handler: TicketHandler) -> u64 {
        let ticket = self.core.next_ticket.get();
        self.core.next_ticket.set(ticket + 1);

        self.core.tickets.borrow_mut().insert(ticket, handler);
        ticket
    }

    pub(crate) fn inbox(&self) -> InboxHandle {
        self.core.inbox.clone()
    }

    /// Aborts a task: drops its frame now, or as soon as it suspends if it
    /// is being resumed.
    pub(crate) fn abort(&self, id: TaskId) {
        let (slot, previous) = {
            let mut tasks = self.core.tasks.borrow_mut();

            let Some(slot) = tasks.get_mut(id.0) else {
                return;
            };

            let previous = TaskState::from_raw(slot.header.abort());

            if slot.frame.is_none() {
                debug!(task = %id, ?previous, "task aborted while running");
                return;
            }

            (tasks.remove(id.0), previous)
        };

        debug!(task = %id, ?previous, "task aborted");
        drop(slot);
    }

    pub(crate) fn set_detached(&self, id: TaskId) {
        if let Some(slot) = self.core.tasks.borrow_mut().get_mut(id.0) {
            slot.detached = true;
            debug!(task = %id, "task detached");
        }
    }

    fn spawn_stackless<F>(&self, body: F, state: usize) -> (TaskHandle<F::Output>, Arc<Header>)
    where
        F: std::future::Future + 'static,
        F::Output: 'static,
    {
        let (result, promise) = self.make_future();
        let completion = Rc::new(RefCell::new(Some(promise)));
        let writer = completion.clone();

        let frame = Frame::Stackless(Box::pin(async move {
            let output = body.await;

            let promise = writer.borrow_mut().take();
            if let Some(promise) = promise {
                promise.resolve(output);
            }
        }));

        let header = self.insert(frame, state, panic_hook(completion));
        let handle = TaskHandle::new(header.clone(), result, self.downgrade());

        (handle, header)
    }

    fn spawn_stackful<F, T>(
        &self,
        body: F,
        state: usize,
    ) -> Result<(TaskHandle<T>, Arc<Header>), Error>
    where
        F: FnOnce(&mut Fiber<'_>) -> T + 'static,
        T: 'static,
    {
        let (result, promise) = self.make_future();
        let completion = Rc::new(RefCell::new(Some(promise)));
        let writer = completion.clone();

        let fiber = StackfulFrame::new(self.core.config.stack_size, move |fiber| {
            let output = body(fiber);

            let promise = writer.borrow_mut().take();
            if let Some(promise) = promise {
                promise.resolve(output);
            }
        })?;

        let header = self.insert(Frame::Stackful(fiber), state, panic_hook(completion));
        let handle = TaskHandle::new(header.clone(), result, self.downgrade());

        Ok((handle, header))
    }

    fn insert(&self, frame: Frame, state: usize, on_panic: PanicHook) -> Arc<Header> {
        let ready = self.core.ready.clone();
        let mut tasks = self.core.tasks.borrow_mut();

        let key = tasks.insert_with(|key| {
            let header = Arc::new(Header::new(TaskId(key), state, ready));
            TaskSlot::new(header, frame, on_panic)
        });

        match tasks.get_mut(key) {
            Some(slot) => slot.header.clone(),
            None => unreachable!("task slot vanished right after insertion"),
        }
    }

    /// Resumes a task whose header was moved to `RUNNING`.
    ///
    /// Returns `false` if the task no longer exists.
    fn run(&self, header: Arc<Header>) -> bool {
        let id = header.id;

        let frame = {
            let mut tasks = self.core.tasks.borrow_mut();

            match tasks.get_mut(id.0) {
                Some(slot) => match slot.frame.take() {
                    Some(frame) => frame,
                    None => panic!("{id} resumed while it is already running"),
                },
                None => return false,
            }
        };

        let mut frame = frame;
        trace!(task = %id, kind = frame.kind(), "resuming task");

        let waker = make_waker(header.clone());
        let mut cx = Context::from_waker(&waker);

        let poll = panic::catch_unwind(AssertUnwindSafe(|| frame.resume(&mut cx)));

        match poll {
            Ok(Poll::Pending) if !header.is_aborted() => {
                let orphan = self.restore(id, frame);
                drop(orphan);

                if header.suspend() {
                    trace!(task = %id, "task woken while running, re-queued");
                }
            }
            Ok(Poll::Pending) => {
                let slot = self.core.tasks.borrow_mut().remove(id.0);
                drop(slot);
                drop(frame);

                debug!(task = %id, "aborted task reclaimed");
            }
            Ok(Poll::Ready(())) => {
                header.complete();

                let slot = self.core.tasks.borrow_mut().remove(id.0);
                drop(frame);

                trace!(task = %id, detached = slot.as_ref().is_some_and(|s| s.detached), "task completed");
            }
            Err(payload) => {
                header.complete();

                let slot = self.core.tasks.borrow_mut().remove(id.0);
                drop(frame);

                let err = Error::from_panic(payload);
                let detached = slot.as_ref().is_some_and(|s| s.detached);
                let hook = slot.and_then(|s| s.on_panic);

                let unobserved = match hook {
                    Some(hook) => hook(err),
                    None => Some(err),
                };

                if let Some(err) = unobserved {
                    warn!(task = %id, detached, error = %err, "task failed with nobody observing it");
                }
            }
        }

        true
    }

    /// Puts a suspended frame back into its slot.
    ///
    /// Hands the frame back if the slot was reclaimed meanwhile, so the
    /// caller drops it outside the arena borrow.
    fn restore(&self, id: TaskId, frame: Frame) -> Option<Frame> {
        let mut tasks = self.core.tasks.borrow_mut();

        match tasks.get_mut(id.0) {
            Some(slot) => {
                slot.frame = Some(frame);
                None
            }
            None => Some(frame),
        }
    }

    fn apply_deferred(&self) -> usize {
        let batch = std::mem::take(&mut *self.core.deferred.borrow_mut());
        let settled = batch.len();

        for settle in batch {
            settle();
        }

        settled
    }

    fn prune_timers(&self) {
        let stale = self.core.timers.borrow_mut().prune();

        if !stale.is_empty() {
            trace!(pruned = stale.len(), "stale timers removed");
        }

        drop(stale);
    }

    fn fire_timers(&self) -> usize {
        self.prune_timers();

        let now = self.now();
        let expired = self.core.timers.borrow_mut().expired(now);
        let fired = expired.len();

        for entry in expired {
            entry.promise.resolve(());
        }

        fired
    }

    fn drain_inbox(&self) -> usize {
        let pending = self.core.inbox.len();
        let mut completed = 0;

        for _ in 0..pending {
            let Some(Completion { ticket, payload }) = self.core.inbox.pop() else {
                break;
            };

            let handler = self.core.tickets.borrow_mut().remove(&ticket);

            match handler {
                Some(handler) => {
                    handler(payload);
                    completed += 1;
                }
                None => trace!(ticket, "completion for a released ticket"),
            }
        }

        completed
    }

    fn resume_ready(&self) -> usize {
        let snapshot = self.core.ready.len();
        let mut resumed = 0;

        for _ in 0..snapshot {
            let Some(id) = self.core.ready.pop() else {
                break;
            };

            let header = self
                .core
                .tasks
                .borrow_mut()
                .get_mut(id.0)
                .map(|slot| slot.header.clone());

            let Some(header) = header else {
                continue;
            };

            if header.start_running() && self.run(header) {
                resumed += 1;
            }
        }

        resumed
    }

    fn has_immediate_work(&self) -> bool {
        !self.core.ready.is_empty()
            || !self.core.deferred.borrow().is_empty()
            || !self.core.inbox.is_empty()
    }

    fn idle_park_timeout(&self) -> Option<Duration> {
        self.prune_timers();

        let cap = self.core.config.max_idle_park;
        let next = self.core.timers.borrow().next_deadline();

        match next {
            Some(deadline) if !self.core.config.clock.is_manual() => {
                Some(deadline.saturating_duration_since(self.now()).min(cap))
            }
            Some(_) => Some(cap),
            None if !self.core.tickets.borrow().is_empty() => Some(cap),
            None => None,
        }
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("epoch", &self.core.epoch.get())
            .field("tasks", &self.core.tasks.borrow().len())
            .field("ready", &self.core.ready.len())
            .field("timers", &self.core.timers.borrow().len())
            .field("tickets", &self.core.tickets.borrow().len())
            .finish()
    }
}

impl WeakManager {
    /// Returns the manager if it is still alive.
    pub fn upgrade(&self) -> Option<Manager> {
        self.core.upgrade().map(|core| Manager { core })
    }
}

impl fmt::Debug for WeakManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakManager")
            .field("alive", &(self.core.strong_count() > 0))
            .finish()
    }
}

/// Rejects the completion future of a task whose body panicked.
fn panic_hook<T: 'static>(completion: Rc<RefCell<Option<Promise<T>>>>) -> PanicHook {
    Box::new(move |err| {
        let promise = completion.borrow_mut().take();

        match promise {
            Some(promise) if promise.has_reader() => {
                promise.reject(err);
                None
            }
            _ => Some(err),
        }
    })
}
