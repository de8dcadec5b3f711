use crate::future::Promise;

use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::rc::Rc;
use std::time::Instant;

/// Cancellation flag shared between a timer entry and its owner.
pub(crate) type Cancelled = Rc<Cell<bool>>;

/// An entry in the timer registry.
///
/// Entries are ordered by deadline, ties broken by insertion sequence, so
/// timers sharing a deadline fire in the order they were created.
///
/// The entry may be cancelled before it fires, either explicitly or by
/// dropping the clock future nobody else observes.
pub(crate) struct TimerEntry {
    /// The time at which the timer fires.
    pub(crate) deadline: Instant,

    /// Insertion sequence number.
    pub(crate) seq: u64,

    /// Promise resolved when the deadline is reached.
    pub(crate) promise: Promise<()>,

    pub(crate) cancelled: Cancelled,
}

impl TimerEntry {
    /// Returns `true` while firing the entry can still be observed.
    fn is_live(&self) -> bool {
        !self.cancelled.get() && self.promise.has_reader()
    }
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Ord for TimerEntry {
    /// Orders timer entries by `(deadline, seq)`.
    ///
    /// The comparison is **reversed** so that a `BinaryHeap<TimerEntry>`
    /// behaves as a min-heap, where the earliest deadline is popped first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Deadline-ordered registry of one-shot timers.
pub(crate) struct Timers {
    heap: BinaryHeap<TimerEntry>,
    next_seq: u64,
}

impl Timers {
    pub(crate) fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Registers a promise to resolve at `deadline`.
    ///
    /// Returns the flag that cancels the entry.
    pub(crate) fn insert(&mut self, deadline: Instant, promise: Promise<()>) -> Cancelled {
        let seq = self.next_seq;
        self.next_seq += 1;

        let cancelled = Rc::new(Cell::new(false));

        self.heap.push(TimerEntry {
            deadline,
            seq,
            promise,
            cancelled: cancelled.clone(),
        });

        cancelled
    }

    /// Removes the entries that were cancelled or lost their reader.
    ///
    /// The caller drops the returned entries after releasing the registry.
    pub(crate) fn prune(&mut self) -> Vec<TimerEntry> {
        if self.heap.iter().all(TimerEntry::is_live) {
            return Vec::new();
        }

        let (live, stale): (Vec<_>, Vec<_>) = std::mem::take(&mut self.heap)
            .into_vec()
            .into_iter()
            .partition(TimerEntry::is_live);

        self.heap = BinaryHeap::from(live);
        stale
    }

    /// Removes every entry whose deadline is `<= now`, earliest first.
    ///
    /// The caller resolves the returned promises after releasing the
    /// registry, since a resolution may register new timers.
    pub(crate) fn expired(&mut self, now: Instant) -> Vec<TimerEntry> {
        let mut fired = Vec::new();

        while self.heap.peek().is_some_and(|entry| entry.deadline <= now) {
            if let Some(entry) = self.heap.pop() {
                fired.push(entry);
            }
        }

        fired
    }

    /// Deadline of the earliest pending timer.
    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|entry| entry.deadline)
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Removes every pending entry.
    pub(crate) fn drain(&mut self) -> Vec<TimerEntry> {
        self.heap.drain().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Manager;

    use std::time::Duration;

    #[test]
    fn test_expired_pops_in_deadline_then_insertion_order() {
        let manager = Manager::new();
        let mut timers = Timers::new();
        let base = Instant::now();

        let (_late, late) = manager.make_future::<()>();
        let (_first, first) = manager.make_future::<()>();
        let (_second, second) = manager.make_future::<()>();

        timers.insert(base + Duration::from_secs(3), late);
        timers.insert(base + Duration::from_secs(1), first);
        timers.insert(base + Duration::from_secs(1), second);

        let fired = timers.expired(base + Duration::from_secs(2));
        let order: Vec<u64> = fired.iter().map(|entry| entry.seq).collect();

        assert_eq!(order, vec![1, 2]);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.next_deadline(), Some(base + Duration::from_secs(3)));
    }

    #[test]
    fn test_nothing_expires_early() {
        let manager = Manager::new();
        let mut timers = Timers::new();
        let base = Instant::now();

        let (_future, promise) = manager.make_future::<()>();
        timers.insert(base + Duration::from_millis(5), promise);

        assert!(timers.expired(base).is_empty());
        assert!(!timers.is_empty());
    }

    #[test]
    fn test_prune_keeps_only_observed_entries() {
        let manager = Manager::new();
        let mut timers = Timers::new();
        let base = Instant::now();

        let (_kept, kept) = manager.make_future::<()>();
        let (dropped, orphan) = manager.make_future::<()>();
        let (_cancelled, cancelled) = manager.make_future::<()>();

        timers.insert(base + Duration::from_secs(3), kept);
        timers.insert(base + Duration::from_secs(1), orphan);
        timers.insert(base + Duration::from_secs(2), cancelled).set(true);
        drop(dropped);

        assert_eq!(timers.prune().len(), 2);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.next_deadline(), Some(base + Duration::from_secs(3)));
        assert!(timers.prune().is_empty());
    }
}
