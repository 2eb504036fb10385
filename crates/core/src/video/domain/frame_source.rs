use crate::shared::frame::Frame;

/// Produces frames for the capture loop, one per call.
///
/// Implementations hide the capture backend (camera device, file, stream).
pub trait FrameSource {
    /// Next frame, `Ok(None)` once the source is exhausted.
    ///
    /// An `Err` is fatal for the session: the loop stops and reports it.
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;
}
