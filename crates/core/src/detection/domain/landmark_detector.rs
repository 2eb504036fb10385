use std::sync::Arc;

use thiserror::Error;

use super::landmarks::DetectionResult;
use super::result_mailbox::ResultMailbox;
use crate::shared::frame::{Frame, PixelLayout};

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("timestamp {got} ms is not after previous timestamp {previous} ms")]
    NonMonotonicTimestamp { previous: u64, got: u64 },
    #[error("detector worker has stopped")]
    WorkerStopped,
}

/// Handler the detector invokes with each finished result, on its own thread.
pub type ResultCallback = Arc<dyn Fn(DetectionResult) + Send + Sync>;

/// Asynchronous landmark detector.
///
/// `submit` hands a frame over and returns immediately; the result (if any)
/// arrives later through the callback registered at construction. Delivery is
/// at most once per submitted frame: a busy detector may drop frames.
///
/// Timestamps must strictly increase from one submission to the next.
pub trait LandmarkDetector: Send {
    fn submit(&mut self, frame: &Frame, timestamp_ms: u64) -> Result<(), DetectorError>;

    /// Channel order the detector expects; callers convert before submitting.
    fn input_layout(&self) -> PixelLayout {
        PixelLayout::Rgb
    }
}

/// Callback that publishes every result into `mailbox`.
pub fn publish_to(mailbox: Arc<ResultMailbox>) -> ResultCallback {
    Arc::new(move |result| {
        mailbox.publish(result);
    })
}
