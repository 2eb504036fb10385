use crate::shared::constants::{FACE_MESH_WINDOW, SEGMENTED_FACE_WINDOW};
use crate::shared::frame::Frame;

/// The two on-screen views of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum View {
    FaceMesh,
    SegmentedFace,
}

impl View {
    pub fn title(self) -> &'static str {
        match self {
            View::FaceMesh => FACE_MESH_WINDOW,
            View::SegmentedFace => SEGMENTED_FACE_WINDOW,
        }
    }
}

/// Annotation shown alongside the face-mesh view.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DisplayStatus {
    /// Most recent frames-per-second sample, 0 until the first window completes.
    pub fps: f64,
    pub face_detected: bool,
}

impl DisplayStatus {
    /// Text for the status line, e.g. `FPS: 29.8` or `No face detected | FPS: 29.8`.
    pub fn label(&self) -> String {
        if self.face_detected {
            format!("FPS: {:.1}", self.fps)
        } else {
            format!("No face detected | FPS: {:.1}", self.fps)
        }
    }
}

/// Presents frames to the operator and reports key presses.
pub trait DisplaySink {
    fn show(
        &mut self,
        view: View,
        frame: &Frame,
        status: &DisplayStatus,
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// A key pressed since the last poll, if any. Never blocks.
    fn poll_key(&mut self) -> Option<char>;

    /// False once the operator has closed the display.
    fn is_open(&self) -> bool {
        true
    }
}
