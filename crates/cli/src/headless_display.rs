use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use facemesh_core::shared::constants::QUIT_KEY;
use facemesh_core::shared::frame::Frame;
use facemesh_core::video::domain::display_sink::{DisplaySink, DisplayStatus, View};

/// Display for runs without a screen: frames are counted, the status is
/// logged now and then, and Ctrl-C acts as the quit key.
pub struct HeadlessDisplay {
    interrupted: Arc<AtomicBool>,
    quit_sent: bool,
    shown: usize,
    log_every: usize,
}

impl HeadlessDisplay {
    /// Installs the process-wide Ctrl-C handler.
    pub fn install(log_every: usize) -> Result<Self, ctrlc::Error> {
        let interrupted = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&interrupted);
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
        })?;
        Ok(Self::with_flag(interrupted, log_every))
    }

    pub fn with_flag(interrupted: Arc<AtomicBool>, log_every: usize) -> Self {
        Self {
            interrupted,
            quit_sent: false,
            shown: 0,
            log_every: log_every.max(1),
        }
    }
}

impl DisplaySink for HeadlessDisplay {
    fn show(
        &mut self,
        view: View,
        frame: &Frame,
        status: &DisplayStatus,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if view != View::FaceMesh {
            return Ok(());
        }
        self.shown += 1;
        if self.shown % self.log_every == 0 {
            log::info!("Frame {}: {}", frame.index(), status.label());
        }
        Ok(())
    }

    fn poll_key(&mut self) -> Option<char> {
        if !self.quit_sent && self.interrupted.load(Ordering::SeqCst) {
            self.quit_sent = true;
            return Some(QUIT_KEY);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facemesh_core::shared::frame::PixelLayout;

    #[test]
    fn test_interrupt_becomes_single_quit_key() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut display = HeadlessDisplay::with_flag(Arc::clone(&flag), 10);
        assert_eq!(display.poll_key(), None);

        flag.store(true, Ordering::SeqCst);
        assert_eq!(display.poll_key(), Some('q'));
        assert_eq!(display.poll_key(), None);
    }

    #[test]
    fn test_counts_face_mesh_views_only() {
        let mut display = HeadlessDisplay::with_flag(Arc::new(AtomicBool::new(false)), 1);
        let frame = Frame::black(2, 2, PixelLayout::Rgb, 0);
        let status = DisplayStatus::default();
        display.show(View::FaceMesh, &frame, &status).unwrap();
        display.show(View::SegmentedFace, &frame, &status).unwrap();
        assert_eq!(display.shown, 1);
        assert!(display.is_open());
    }
}
