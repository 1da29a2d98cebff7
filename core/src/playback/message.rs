//! User-scheduled timed messages.
//!
//! No directly analogous type exists elsewhere in this crate; built fresh,
//! following the `*Settings`/value-struct + sorted-`Vec` idiom used for the
//! shuffle schedule (`ShuffleScheduleEntry`, kept as a plain sorted `Vec`
//! rather than a `BinaryHeap`, since the list is short and resorted wholesale
//! on change).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::handler::HandlerWrapper;
use super::timeline::TIME_UNSET;

/// A payload to deliver at a specific `(window, position)` coordinate.
pub struct PlayerMessage {
    pub target: Arc<Mutex2<dyn MessageTarget>>,
    pub payload: Box<dyn std::any::Any + Send>,
    /// Handler the payload should be delivered on; `None` means "deliver
    /// directly on the engine's own worker."
    pub handler: Option<Arc<HandlerWrapper>>,
    pub window_index: usize,
    pub position_ms: i64,
    pub delete_after_delivery: bool,
    canceled: Arc<AtomicBool>,
}

/// Thin re-export so `message.rs` doesn't need to depend on `std::sync::Mutex`
/// directly at the type level while keeping the target `Send`.
pub type Mutex2<T> = std::sync::Mutex<T>;

/// Receiver of a delivered `PlayerMessage`.
pub trait MessageTarget: Send {
    fn handle_message(&mut self, message_type: i32, payload: &(dyn std::any::Any + Send));
}

impl PlayerMessage {
    pub fn new(
        target: Arc<Mutex2<dyn MessageTarget>>,
        payload: Box<dyn std::any::Any + Send>,
        window_index: usize,
        position_ms: i64,
    ) -> Self {
        Self {
            target,
            payload,
            handler: None,
            window_index,
            position_ms,
            delete_after_delivery: false,
            canceled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn delete_after_delivery(mut self, delete: bool) -> Self {
        self.delete_after_delivery = delete;
        self
    }

    /// Cancel this message. Observed by the engine the next time it sorts
    /// the pending list.
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    /// Handle for cancellation that outlives the message's move into the
    /// engine's pending list.
    pub fn cancellation_handle(&self) -> CancellationHandle {
        CancellationHandle {
            canceled: self.canceled.clone(),
        }
    }

    /// Mark whether the message was actually delivered (as opposed to
    /// discarded unresolved or dropped after release).
    pub fn mark_as_processed(&self, _delivered: bool) {}
}

/// A cloneable handle a caller can use to cancel a message after handing
/// ownership of the `PlayerMessage` itself to `send_message`.
#[derive(Clone)]
pub struct CancellationHandle {
    canceled: Arc<AtomicBool>,
}

impl CancellationHandle {
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }
}

/// Resolution state of a pending message against the current timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Unresolved,
    Resolved { period_index: usize, period_time_us: i64 },
    Unresolvable,
}

/// The engine's bookkeeping record for one outstanding `SEND_MESSAGE`.
pub struct PendingMessageInfo {
    pub message: PlayerMessage,
    pub resolution: Resolution,
}

impl PendingMessageInfo {
    pub fn new(message: PlayerMessage) -> Self {
        Self {
            message,
            resolution: Resolution::Unresolved,
        }
    }

    /// Sort key: unresolved sorts greater than resolved; resolved entries
    /// order by `(period_index, period_time_us)`.
    fn sort_key(&self) -> (u8, usize, i64) {
        match self.resolution {
            Resolution::Resolved { period_index, period_time_us } => (0, period_index, period_time_us),
            Resolution::Unresolved => (1, usize::MAX, TIME_UNSET),
            Resolution::Unresolvable => (2, usize::MAX, TIME_UNSET),
        }
    }
}

/// Sort pending messages resolved-before-unresolved, with resolved entries
/// ordered by `(period_index, period_time_us)`.
pub fn sort_pending_messages(pending: &mut Vec<PendingMessageInfo>) {
    pending.sort_by_key(|info| info.sort_key());
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullTarget;
    impl MessageTarget for NullTarget {
        fn handle_message(&mut self, _message_type: i32, _payload: &(dyn std::any::Any + Send)) {}
    }

    fn make(resolution: Resolution) -> PendingMessageInfo {
        let target: Arc<Mutex2<dyn MessageTarget>> = Arc::new(std::sync::Mutex::new(NullTarget));
        let message = PlayerMessage::new(target, Box::new(()), 0, 0);
        PendingMessageInfo { message, resolution }
    }

    #[test]
    fn unresolved_sorts_after_resolved() {
        let mut pending = vec![
            make(Resolution::Unresolved),
            make(Resolution::Resolved {
                period_index: 0,
                period_time_us: 100,
            }),
        ];
        sort_pending_messages(&mut pending);
        assert!(matches!(pending[0].resolution, Resolution::Resolved { .. }));
        assert!(matches!(pending[1].resolution, Resolution::Unresolved));
    }

    #[test]
    fn resolved_entries_order_by_period_then_time() {
        let mut pending = vec![
            make(Resolution::Resolved {
                period_index: 1,
                period_time_us: 10,
            }),
            make(Resolution::Resolved {
                period_index: 0,
                period_time_us: 500,
            }),
            make(Resolution::Resolved {
                period_index: 0,
                period_time_us: 50,
            }),
        ];
        sort_pending_messages(&mut pending);
        let keys: Vec<_> = pending
            .iter()
            .map(|info| match info.resolution {
                Resolution::Resolved { period_index, period_time_us } => (period_index, period_time_us),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(keys, vec![(0, 50), (0, 500), (1, 10)]);
    }
}
