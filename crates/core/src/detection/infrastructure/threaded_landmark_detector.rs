use std::thread::JoinHandle;

use crossbeam_channel::{Sender, TrySendError};

use crate::detection::domain::landmark_detector::{DetectorError, LandmarkDetector, ResultCallback};
use crate::detection::domain::landmark_model::LandmarkModel;
use crate::detection::domain::landmarks::DetectionResult;
use crate::shared::frame::Frame;

/// Frames waiting for the worker. One slot keeps latency at most one frame.
const DEFAULT_QUEUE_CAPACITY: usize = 1;

/// Runs a [`LandmarkModel`] on a dedicated worker thread.
///
/// Layout: `submit → [bounded queue] → worker (predict) → callback`
///
/// `submit` never blocks: when the queue is full the frame is dropped and no
/// result will ever be delivered for it. Dropping the detector closes the
/// queue and joins the worker after it finishes the frame in flight.
pub struct ThreadedLandmarkDetector {
    frame_tx: Option<Sender<(Frame, u64)>>,
    worker: Option<JoinHandle<()>>,
    last_timestamp: Option<u64>,
    dropped: usize,
}

impl ThreadedLandmarkDetector {
    pub fn new(model: Box<dyn LandmarkModel>, on_result: ResultCallback) -> Self {
        Self::with_capacity(model, on_result, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(
        model: Box<dyn LandmarkModel>,
        on_result: ResultCallback,
        capacity: usize,
    ) -> Self {
        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<(Frame, u64)>(capacity.max(1));
        let worker = spawn_worker(model, frame_rx, on_result);
        Self {
            frame_tx: Some(frame_tx),
            worker: Some(worker),
            last_timestamp: None,
            dropped: 0,
        }
    }

    /// Frames discarded because the worker was still busy.
    pub fn dropped_frames(&self) -> usize {
        self.dropped
    }
}

impl LandmarkDetector for ThreadedLandmarkDetector {
    fn submit(&mut self, frame: &Frame, timestamp_ms: u64) -> Result<(), DetectorError> {
        if let Some(previous) = self.last_timestamp {
            if timestamp_ms <= previous {
                return Err(DetectorError::NonMonotonicTimestamp {
                    previous,
                    got: timestamp_ms,
                });
            }
        }
        let tx = self.frame_tx.as_ref().ok_or(DetectorError::WorkerStopped)?;
        self.last_timestamp = Some(timestamp_ms);

        match tx.try_send((frame.clone(), timestamp_ms)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                log::trace!("Detector busy, dropped frame {}", frame.index());
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(DetectorError::WorkerStopped),
        }
    }
}

impl Drop for ThreadedLandmarkDetector {
    fn drop(&mut self) {
        drop(self.frame_tx.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Landmark worker thread panicked");
            }
        }
    }
}

fn spawn_worker(
    mut model: Box<dyn LandmarkModel>,
    frame_rx: crossbeam_channel::Receiver<(Frame, u64)>,
    on_result: ResultCallback,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for (frame, timestamp_ms) in frame_rx {
            match model.predict(&frame) {
                Ok(faces) => on_result(DetectionResult::from_faces(faces, timestamp_ms)),
                Err(e) => log::warn!("Landmark model failed on frame {}: {e}", frame.index()),
            }
        }
        log::debug!("Landmark worker stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::landmark_detector::publish_to;
    use crate::detection::domain::landmarks::{LandmarkPoint, LandmarkSet};
    use crate::detection::domain::result_mailbox::ResultMailbox;
    use crate::shared::frame::PixelLayout;
    use std::sync::{Arc, Mutex};
    use std::thread::ThreadId;
    use std::time::Duration;

    struct FixedModel {
        faces: usize,
    }

    impl LandmarkModel for FixedModel {
        fn predict(
            &mut self,
            frame: &Frame,
        ) -> Result<Vec<LandmarkSet>, Box<dyn std::error::Error>> {
            let x = frame.index() as f32 / 100.0;
            Ok((0..self.faces)
                .map(|_| LandmarkSet::new(vec![LandmarkPoint::new(x, 0.5, 0.0)]))
                .collect())
        }
    }

    struct FailingModel;

    impl LandmarkModel for FailingModel {
        fn predict(
            &mut self,
            _frame: &Frame,
        ) -> Result<Vec<LandmarkSet>, Box<dyn std::error::Error>> {
            Err("model exploded".into())
        }
    }

    fn frame(index: usize) -> Frame {
        Frame::black(4, 4, PixelLayout::Rgb, index)
    }

    fn wait_for(mailbox: &ResultMailbox, count: u64) {
        for _ in 0..500 {
            if mailbox.publish_count() >= count {
                return;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        panic!("timed out waiting for {count} results");
    }

    #[test]
    fn test_result_delivered_through_callback() {
        let mailbox = Arc::new(ResultMailbox::new());
        let mut detector = ThreadedLandmarkDetector::new(
            Box::new(FixedModel { faces: 1 }),
            publish_to(Arc::clone(&mailbox)),
        );

        detector.submit(&frame(1), 10).unwrap();
        wait_for(&mailbox, 1);

        let result = mailbox.take_latest().unwrap();
        assert_eq!(result.timestamp_ms(), 10);
        assert!(result.face().is_some());
    }

    #[test]
    fn test_callback_runs_on_worker_thread() {
        let seen: Arc<Mutex<Option<ThreadId>>> = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);
        let callback: ResultCallback = Arc::new(move |_| {
            *slot.lock().unwrap() = Some(std::thread::current().id());
        });
        let mut detector = ThreadedLandmarkDetector::new(Box::new(FixedModel { faces: 0 }), callback);

        detector.submit(&frame(0), 1).unwrap();
        drop(detector);

        let id = seen.lock().unwrap().expect("callback not invoked");
        assert_ne!(id, std::thread::current().id());
    }

    #[test]
    fn test_rejects_non_monotonic_timestamps() {
        let mailbox = Arc::new(ResultMailbox::new());
        let mut detector = ThreadedLandmarkDetector::new(
            Box::new(FixedModel { faces: 1 }),
            publish_to(mailbox),
        );

        detector.submit(&frame(0), 100).unwrap();
        let err = detector.submit(&frame(1), 100).unwrap_err();
        assert!(matches!(
            err,
            DetectorError::NonMonotonicTimestamp {
                previous: 100,
                got: 100
            }
        ));
        assert!(detector.submit(&frame(2), 99).is_err());
        assert!(detector.submit(&frame(3), 101).is_ok());
    }

    #[test]
    fn test_model_error_yields_no_result() {
        let mailbox = Arc::new(ResultMailbox::new());
        let mut detector =
            ThreadedLandmarkDetector::new(Box::new(FailingModel), publish_to(Arc::clone(&mailbox)));

        detector.submit(&frame(0), 1).unwrap();
        drop(detector);

        assert!(mailbox.take_latest().is_none());
    }

    #[test]
    fn test_drop_joins_after_draining_queue() {
        let mailbox = Arc::new(ResultMailbox::new());
        let mut detector = ThreadedLandmarkDetector::with_capacity(
            Box::new(FixedModel { faces: 1 }),
            publish_to(Arc::clone(&mailbox)),
            4,
        );
        for i in 0..4 {
            detector.submit(&frame(i), i as u64 + 1).unwrap();
        }
        let dropped = detector.dropped_frames() as u64;
        drop(detector);

        assert_eq!(mailbox.publish_count() + dropped, 4);
    }
}
