//! Monotonic time sources for the playback engine's message loop.
//!
//! [`SystemClock`] is the production clock, backed by [`std::time::Instant`]
//! the same way `cli/src/runner.rs` times its playback loop.
//! [`VirtualClock`] lets tests drive the engine deterministically:
//! nothing in the engine calls `thread::sleep` directly, so advancing a
//! `VirtualClock` is the only way delayed work ever runs under test.

use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// A monotonic time source. Clocks never fail.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Milliseconds elapsed since an arbitrary, clock-specific epoch.
    fn elapsed_realtime_ms(&self) -> i64;
}

/// Production clock backed by [`std::time::Instant`].
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn elapsed_realtime_ms(&self) -> i64 {
        self.start.elapsed().as_millis() as i64
    }
}

/// One pending callback registered against a [`VirtualClock`].
///
/// Ordered by `(due_at_ms, sequence)` so two postings made for the same
/// deadline fire in the order they were inserted, matching the
/// `HandlerWrapper` FIFO-at-equal-time contract.
struct PendingCallback {
    due_at_ms: i64,
    sequence: u64,
    run: Box<dyn FnOnce() + Send>,
}

impl PartialEq for PendingCallback {
    fn eq(&self, other: &Self) -> bool {
        self.due_at_ms == other.due_at_ms && self.sequence == other.sequence
    }
}
impl Eq for PendingCallback {}

impl Ord for PendingCallback {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        // Reversed so `BinaryHeap` (a max-heap) pops the earliest deadline first.
        other
            .due_at_ms
            .cmp(&self.due_at_ms)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}
impl PartialOrd for PendingCallback {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

/// A testable clock whose time only moves when [`VirtualClock::advance`] is
/// called. Delayed postings fire in deadline order, ties broken by insertion
/// order, exactly as `HandlerWrapper::post_delayed` promises.
#[derive(Debug, Clone)]
pub struct VirtualClock {
    now_ms: Arc<AtomicI64>,
    next_sequence: Arc<AtomicU64>,
    queue: Arc<Mutex<BinaryHeap<PendingCallback>>>,
}

impl std::fmt::Debug for PendingCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingCallback")
            .field("due_at_ms", &self.due_at_ms)
            .field("sequence", &self.sequence)
            .finish()
    }
}

impl VirtualClock {
    pub fn new() -> Self {
        Self {
            now_ms: Arc::new(AtomicI64::new(0)),
            next_sequence: Arc::new(AtomicU64::new(0)),
            queue: Arc::new(Mutex::new(BinaryHeap::new())),
        }
    }

    /// Register a callback to run once virtual time reaches `due_at_ms`.
    ///
    /// Used internally by [`super::handler::HandlerWrapper`]; not part of the
    /// public engine surface.
    pub(super) fn schedule(&self, due_at_ms: i64, run: Box<dyn FnOnce() + Send>) {
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        self.queue.lock().unwrap().push(PendingCallback {
            due_at_ms,
            sequence,
            run,
        });
    }

    /// Advance virtual time by `millis` and run every callback whose deadline
    /// has now elapsed, in insertion order at equal deadlines.
    ///
    /// Callbacks may themselves schedule further callbacks (a `DO_SOME_WORK`
    /// tick reposting itself, for instance); those are drained too as long as
    /// their deadline falls within the same advance.
    pub fn advance(&self, millis: i64) {
        let target = self.now_ms.fetch_add(millis, Ordering::SeqCst) + millis;
        loop {
            let next = {
                let mut queue = self.queue.lock().unwrap();
                match queue.peek() {
                    Some(item) if item.due_at_ms <= target => queue.pop(),
                    _ => None,
                }
            };
            match next {
                Some(item) => (item.run)(),
                None => break,
            }
        }
    }

    /// Number of callbacks still pending (for test assertions).
    pub fn pending_count(&self) -> usize {
        self.queue.lock().unwrap().len()
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for VirtualClock {
    fn elapsed_realtime_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn advance_fires_due_callbacks_in_order() {
        let clock = VirtualClock::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let o1 = order.clone();
        clock.schedule(10, Box::new(move || o1.lock().unwrap().push(1)));
        let o2 = order.clone();
        clock.schedule(5, Box::new(move || o2.lock().unwrap().push(2)));
        let o3 = order.clone();
        clock.schedule(5, Box::new(move || o3.lock().unwrap().push(3)));

        clock.advance(5);
        assert_eq!(*order.lock().unwrap(), vec![2, 3]);

        clock.advance(5);
        assert_eq!(*order.lock().unwrap(), vec![2, 3, 1]);
    }

    #[test]
    fn advance_drains_callbacks_scheduled_by_callbacks() {
        let clock = VirtualClock::new();
        let count = Arc::new(AtomicUsize::new(0));

        fn reschedule(clock: VirtualClock, count: Arc<AtomicUsize>) {
            count.fetch_add(1, Ordering::SeqCst);
            if count.load(Ordering::SeqCst) < 3 {
                let due = clock.elapsed_realtime_ms();
                let clock2 = clock.clone();
                let count2 = count.clone();
                clock.schedule(due, Box::new(move || reschedule(clock2, count2)));
            }
        }

        let clock2 = clock.clone();
        let count2 = count.clone();
        clock.schedule(0, Box::new(move || reschedule(clock2, count2)));
        clock.advance(0);

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn elapsed_realtime_only_moves_on_advance() {
        let clock = VirtualClock::new();
        assert_eq!(clock.elapsed_realtime_ms(), 0);
        clock.advance(100);
        assert_eq!(clock.elapsed_realtime_ms(), 100);
    }
}
