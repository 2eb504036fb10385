use crate::shared::frame::Frame;

use super::landmarks::LandmarkSet;

/// Synchronous landmark model run by a detector worker.
///
/// Returns one `LandmarkSet` per face found, best candidate first. Frames are
/// passed in RGB order. Implementations may keep state between calls.
pub trait LandmarkModel: Send {
    fn predict(&mut self, frame: &Frame) -> Result<Vec<LandmarkSet>, Box<dyn std::error::Error>>;
}
