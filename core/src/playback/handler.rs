//! Single-threaded message loop bound to a dedicated worker.
//!
//! Grounded on the playback worker thread in
//! `playback/player/runtime/worker/runner.rs` (pre-trim): a thread that
//! blocks, drains pending work, and computes how long to sleep before waking
//! again. `HandlerWrapper` generalizes that single hard-coded loop into a
//! typed message queue with delayed posting, and adds a manual-pump mode so
//! tests can drive it with a [`VirtualClock`] instead of real time.

use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use super::clock::{Clock, VirtualClock};

/// Callback registered with a `HandlerWrapper` to receive typed messages
/// posted via [`HandlerWrapper::send_empty_message`].
pub trait MessageHandler: Send {
    fn handle_message(&mut self, what: i32);
}

impl<F: FnMut(i32) + Send> MessageHandler for F {
    fn handle_message(&mut self, what: i32) {
        (self)(what)
    }
}

enum QueueItemKind {
    Runnable(Box<dyn FnOnce() + Send>),
    Message(i32),
}

struct QueueItem {
    due_uptime_ms: i64,
    sequence: u64,
    kind: QueueItemKind,
}

/// Opaque identity for "is this the same worker thread" checks, mirroring
/// `Looper` identity comparisons in the source platform.
#[derive(Clone)]
pub struct LooperId(Arc<()>);

impl PartialEq for LooperId {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for LooperId {}

struct SharedQueue {
    items: Mutex<Vec<QueueItem>>,
    condvar: Condvar,
    next_sequence: AtomicU64,
    quit: AtomicBool,
}

impl SharedQueue {
    fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            condvar: Condvar::new(),
            next_sequence: AtomicU64::new(0),
            quit: AtomicBool::new(false),
        }
    }

    /// Insert keeping the backing `Vec` sorted by `(due_uptime_ms, sequence)`,
    /// the same small-sorted-`Vec` idiom `ShuffleScheduleEntry` uses rather
    /// than reaching for a heap crate.
    fn push(&self, due_uptime_ms: i64, kind: QueueItemKind) {
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        let item = QueueItem {
            due_uptime_ms,
            sequence,
            kind,
        };
        let mut items = self.items.lock().unwrap();
        let pos = items
            .binary_search_by(|existing| {
                (existing.due_uptime_ms, existing.sequence).cmp(&(due_uptime_ms, sequence))
            })
            .unwrap_or_else(|pos| pos);
        items.insert(pos, item);
        self.condvar.notify_all();
    }

    fn remove_messages(&self, what: i32) {
        let mut items = self.items.lock().unwrap();
        items.retain(|item| !matches!(item.kind, QueueItemKind::Message(w) if w == what));
    }

    /// Pop every item currently due (`due_uptime_ms <= now_ms`), in order.
    fn drain_due(&self, now_ms: i64) -> Vec<QueueItem> {
        let mut items = self.items.lock().unwrap();
        let split_at = items.partition_point(|item| item.due_uptime_ms <= now_ms);
        items.drain(..split_at).collect()
    }

    fn next_due_at(&self) -> Option<i64> {
        self.items.lock().unwrap().first().map(|i| i.due_uptime_ms)
    }
}

fn dispatch(item: QueueItem, handler: &Mutex<Box<dyn MessageHandler>>) {
    match item.kind {
        QueueItemKind::Runnable(f) => f(),
        QueueItemKind::Message(what) => handler.lock().unwrap().handle_message(what),
    }
}

/// A single-threaded message loop, FIFO at equal scheduled time.
///
/// Backed either by a real worker thread (production, [`SystemClock`]) or by
/// nothing at all ([`VirtualClock`]): in the latter case nothing executes
/// until the test advances the clock, which drains every item whose deadline
/// has elapsed.
pub struct HandlerWrapper {
    clock: Arc<dyn Clock>,
    queue: Arc<SharedQueue>,
    handler: Arc<Mutex<Box<dyn MessageHandler>>>,
    looper_id: LooperId,
    worker_thread: Option<JoinHandle<()>>,
    virtual_clock: Option<VirtualClock>,
}

impl HandlerWrapper {
    /// Start a real background worker thread driven by wall-clock time.
    pub fn spawn(clock: Arc<dyn Clock>, handler: impl MessageHandler + 'static) -> Self {
        let queue = Arc::new(SharedQueue::new());
        let handler = Arc::new(Mutex::new(Box::new(handler) as Box<dyn MessageHandler>));
        let looper_id = LooperId(Arc::new(()));

        let thread_queue = queue.clone();
        let thread_handler = handler.clone();
        let thread_clock = clock.clone();
        let worker_thread = std::thread::Builder::new()
            .name("playback-engine".into())
            .spawn(move || Self::run_worker(thread_clock, thread_queue, thread_handler))
            .expect("failed to spawn playback worker thread");

        Self {
            clock,
            queue,
            handler,
            looper_id,
            worker_thread: Some(worker_thread),
            virtual_clock: None,
        }
    }

    /// Bind to a [`VirtualClock`]; nothing runs until the test calls
    /// [`VirtualClock::advance`].
    pub fn new_virtual(clock: VirtualClock, handler: impl MessageHandler + 'static) -> Self {
        let queue = Arc::new(SharedQueue::new());
        let handler = Arc::new(Mutex::new(Box::new(handler) as Box<dyn MessageHandler>));
        let looper_id = LooperId(Arc::new(()));
        Self {
            clock: Arc::new(clock.clone()),
            queue,
            handler,
            looper_id,
            worker_thread: None,
            virtual_clock: Some(clock),
        }
    }

    fn run_worker(clock: Arc<dyn Clock>, queue: Arc<SharedQueue>, handler: Arc<Mutex<Box<dyn MessageHandler>>>) {
        loop {
            if queue.quit.load(Ordering::SeqCst) {
                return;
            }
            let now = clock.elapsed_realtime_ms();
            let due = queue.drain_due(now);
            if due.is_empty() {
                let wait_for = match queue.next_due_at() {
                    Some(at) => Duration::from_millis((at - now).max(0) as u64),
                    None => Duration::from_millis(200),
                };
                let guard = queue.items.lock().unwrap();
                let _ = queue
                    .condvar
                    .wait_timeout(guard, wait_for.min(Duration::from_millis(200)))
                    .unwrap();
                continue;
            }
            for item in due {
                if queue.quit.load(Ordering::SeqCst) {
                    return;
                }
                dispatch(item, &handler);
            }
        }
    }

    /// For tests bound to a [`VirtualClock`]: process whatever is currently
    /// due without advancing time. Called automatically by `advance`, but
    /// exposed so `post`'s ASAP items can be pumped deterministically between
    /// commands.
    pub fn pump(&self) {
        if self.worker_thread.is_some() {
            return;
        }
        let now = self.clock.elapsed_realtime_ms();
        loop {
            let due = self.queue.drain_due(now);
            if due.is_empty() {
                break;
            }
            for item in due {
                dispatch(item, &self.handler);
            }
        }
    }

    /// Enqueue for "as soon as possible" execution on the worker.
    pub fn post(&self, runnable: impl FnOnce() + Send + 'static) {
        let now = self.clock.elapsed_realtime_ms();
        self.enqueue(now, QueueItemKind::Runnable(Box::new(runnable)));
    }

    /// Enqueue relative to the clock's uptime.
    pub fn post_delayed(&self, runnable: impl FnOnce() + Send + 'static, delay_ms: i64) {
        let due = self.clock.elapsed_realtime_ms() + delay_ms.max(0);
        self.enqueue(due, QueueItemKind::Runnable(Box::new(runnable)));
    }

    /// Enqueue a typed message for immediate dispatch.
    pub fn send_empty_message(&self, what: i32) {
        let now = self.clock.elapsed_realtime_ms();
        self.enqueue(now, QueueItemKind::Message(what));
    }

    /// Enqueue a typed message for dispatch at a specific uptime.
    pub fn send_empty_message_at_time(&self, what: i32, uptime_ms: i64) {
        self.enqueue(uptime_ms, QueueItemKind::Message(what));
    }

    /// Push onto the shared queue and arrange for it to actually be
    /// drained: the real worker thread wakes on its condvar, but a
    /// [`VirtualClock`] has no thread to wake — it instead runs callbacks
    /// registered via `VirtualClock::schedule` directly from
    /// `VirtualClock::advance`, so manual mode registers a drain callback
    /// there instead of relying on `wake()`.
    fn enqueue(&self, due_uptime_ms: i64, kind: QueueItemKind) {
        self.queue.push(due_uptime_ms, kind);
        match &self.virtual_clock {
            Some(virtual_clock) => {
                let queue = self.queue.clone();
                let handler = self.handler.clone();
                virtual_clock.schedule(
                    due_uptime_ms,
                    Box::new(move || {
                        for item in queue.drain_due(due_uptime_ms) {
                            dispatch(item, &handler);
                        }
                    }),
                );
            }
            None => self.wake(),
        }
    }

    /// Cancel pending typed messages matching `what`. Best-effort, idempotent.
    pub fn remove_messages(&self, what: i32) {
        self.queue.remove_messages(what);
    }

    /// Opaque identity of this wrapper's worker, for "same thread" checks.
    pub fn looper(&self) -> LooperId {
        self.looper_id.clone()
    }

    /// Number of items still pending (tests only).
    pub fn pending_count(&self) -> usize {
        self.queue.items.lock().unwrap().len()
    }

    fn wake(&self) {
        if self.worker_thread.is_some() {
            self.queue.condvar.notify_all();
        }
        // Manual mode: nothing to wake; `pump`/`VirtualClock::advance` drives it.
    }

    /// Signal the real worker thread to stop and join it. A no-op in manual
    /// (virtual-clock) mode.
    pub fn quit(&mut self) {
        self.queue.quit.store(true, Ordering::SeqCst);
        self.queue.condvar.notify_all();
        if let Some(handle) = self.worker_thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for HandlerWrapper {
    fn drop(&mut self) {
        if self.worker_thread.is_some() {
            self.quit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct RecordingHandler {
        seen: Arc<Mutex<Vec<i32>>>,
    }
    impl MessageHandler for RecordingHandler {
        fn handle_message(&mut self, what: i32) {
            self.seen.lock().unwrap().push(what);
        }
    }

    #[test]
    fn virtual_clock_defers_until_advance() {
        let clock = VirtualClock::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let handler = RecordingHandler { seen: seen.clone() };
        let wrapper = HandlerWrapper::new_virtual(clock.clone(), handler);

        wrapper.send_empty_message(1);
        assert!(seen.lock().unwrap().is_empty());

        clock.advance(0);
        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[test]
    fn remove_messages_is_idempotent() {
        let clock = VirtualClock::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let handler = RecordingHandler { seen: seen.clone() };
        let wrapper = HandlerWrapper::new_virtual(clock.clone(), handler);

        wrapper.post_delayed(|| {}, 100);
        wrapper.send_empty_message_at_time(7, 50);
        wrapper.remove_messages(7);
        wrapper.remove_messages(7);

        clock.advance(100);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn equal_deadlines_dispatch_in_insertion_order() {
        let clock = VirtualClock::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let o = order.clone();
        let handler = move |what: i32| o.lock().unwrap().push(what);
        let wrapper = HandlerWrapper::new_virtual(clock.clone(), handler);

        wrapper.send_empty_message_at_time(1, 10);
        wrapper.send_empty_message_at_time(2, 10);
        wrapper.send_empty_message_at_time(3, 10);

        clock.advance(10);
        assert_eq!(*order.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn real_worker_thread_processes_posted_runnables() {
        let clock: Arc<dyn Clock> = Arc::new(super::super::clock::SystemClock::new());
        let count = Arc::new(AtomicUsize::new(0));
        let handler = |_: i32| {};
        let mut wrapper = HandlerWrapper::spawn(clock, handler);

        let c = count.clone();
        wrapper.post(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        let start = std::time::Instant::now();
        while count.load(Ordering::SeqCst) == 0 && start.elapsed() < Duration::from_secs(2) {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
        wrapper.quit();
    }
}
