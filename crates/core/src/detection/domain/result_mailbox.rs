use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::landmarks::DetectionResult;

enum Slot {
    Empty,
    Result(Arc<DetectionResult>),
}

/// Single-slot hand-off between the detector callback and the render loop.
///
/// `publish` overwrites whatever is stored, read or not; `take_latest` returns
/// the stored result without clearing it. If the loop is slower than the
/// detector, intermediate results are lost and the newest one wins.
///
/// Safe for one writer thread and one reader thread (or more of either).
pub struct ResultMailbox {
    slot: Mutex<Slot>,
    closed: AtomicBool,
    published: AtomicU64,
}

impl ResultMailbox {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::Empty),
            closed: AtomicBool::new(false),
            published: AtomicU64::new(0),
        }
    }

    /// Stores `result`, replacing any previous one. Returns `false` if the
    /// mailbox has been closed and the result was discarded.
    pub fn publish(&self, result: DetectionResult) -> bool {
        // `closed` only changes under the slot lock.
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if self.closed.load(Ordering::Acquire) {
            log::trace!(
                "Discarding detection result for {} ms after close",
                result.timestamp_ms()
            );
            return false;
        }
        *slot = Slot::Result(Arc::new(result));
        self.published.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Most recently published result, if any. Does not consume it.
    pub fn take_latest(&self) -> Option<Arc<DetectionResult>> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match &*slot {
            Slot::Empty => None,
            Slot::Result(result) => Some(Arc::clone(result)),
        }
    }

    /// Stops accepting results. Late callbacks become no-ops.
    pub fn close(&self) {
        let _slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of accepted publishes since creation.
    pub fn publish_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

impl Default for ResultMailbox {
    fn default() -> Self {
        Self::new()
    }
}
