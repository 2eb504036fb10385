use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::detection::domain::landmark_detector::LandmarkDetector;
use crate::detection::domain::landmarks::LandmarkSet;
use crate::detection::domain::result_mailbox::ResultMailbox;
use crate::geometry::domain::geometry_catalog::GeometryCatalog;
use crate::geometry::domain::mesh_topology::MeshTopology;
use crate::pipeline::fps_counter::FpsCounter;
use crate::pipeline::save_segmented_face_use_case::SaveSegmentedFaceUseCase;
use crate::pipeline::session_logger::SessionLogger;
use crate::rendering::domain::overlay_renderer::OverlayRenderer;
use crate::segmentation::domain::face_mask::segment_face;
use crate::shared::constants::{FPS_WINDOW, QUIT_KEY};
use crate::shared::frame::Frame;
use crate::video::domain::display_sink::{DisplaySink, DisplayStatus, View};
use crate::video::domain::frame_source::FrameSource;

/// Which edge set forms the base mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshStyle {
    /// Static outline connections: oval, lips, eyes and eyebrows.
    Contours,
    /// Delaunay tessellation over the first detected face, then held for the
    /// session.
    #[default]
    Triangulated,
}

impl FromStr for MeshStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "contours" => Ok(MeshStyle::Contours),
            "triangulated" => Ok(MeshStyle::Triangulated),
            other => Err(format!(
                "unknown mesh style '{other}' (expected contours or triangulated)"
            )),
        }
    }
}

impl fmt::Display for MeshStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshStyle::Contours => f.write_str("contours"),
            MeshStyle::Triangulated => f.write_str("triangulated"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SessionOptions {
    pub mesh_style: MeshStyle,
    /// Stop after this many frames.
    pub max_frames: Option<usize>,
    /// Flip each frame horizontally before anything else sees it.
    pub mirror: bool,
    pub fps_window: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            mesh_style: MeshStyle::default(),
            max_frames: None,
            mirror: false,
            fps_window: FPS_WINDOW,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum StopReason {
    QuitKey,
    EndOfStream,
    MaxFrames,
    DisplayClosed,
    SourceFailed(String),
    DisplayFailed(String),
}

impl StopReason {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            StopReason::SourceFailed(_) | StopReason::DisplayFailed(_)
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SaveOutcome {
    /// The session did not end with a quit request.
    NotRequested,
    Saved(PathBuf),
    /// Quit while no segmented face was retained.
    NoFace,
    Failed(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct SessionSummary {
    pub frames: usize,
    pub stop: StopReason,
    pub save: SaveOutcome,
}

/// Live face-mesh session: capture, dispatch to the detector, render the
/// newest landmarks over the current frame, segment the face, and save the
/// last segmented face on quit.
///
/// Per iteration: acquire → dispatch → consume → render/segment (or no-face)
/// → display → key.
pub struct LiveMeshUseCase {
    source: Box<dyn FrameSource>,
    detector: Box<dyn LandmarkDetector>,
    mailbox: Arc<ResultMailbox>,
    display: Box<dyn DisplaySink>,
    saver: SaveSegmentedFaceUseCase,
    renderer: OverlayRenderer,
    catalog: GeometryCatalog,
    options: SessionOptions,
    logger: Box<dyn SessionLogger>,
}

/// Mutable state of one running session.
struct SessionState {
    started: Instant,
    last_timestamp: Option<u64>,
    fps: FpsCounter,
    retained: Option<Frame>,
    topology_frozen: bool,
    frames: usize,
}

impl LiveMeshUseCase {
    /// `mailbox` must be the one the detector's result callback publishes to.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Box<dyn FrameSource>,
        detector: Box<dyn LandmarkDetector>,
        mailbox: Arc<ResultMailbox>,
        display: Box<dyn DisplaySink>,
        saver: SaveSegmentedFaceUseCase,
        renderer: OverlayRenderer,
        catalog: GeometryCatalog,
        options: SessionOptions,
        logger: Box<dyn SessionLogger>,
    ) -> Self {
        Self {
            source,
            detector,
            mailbox,
            display,
            saver,
            renderer,
            catalog,
            options,
            logger,
        }
    }

    /// Runs until quit, end of stream, the frame limit, or a fatal error.
    ///
    /// The mailbox is closed on return, so results still in flight are
    /// discarded.
    pub fn execute(&mut self) -> SessionSummary {
        let started = Instant::now();
        let mut state = SessionState {
            started,
            last_timestamp: None,
            fps: FpsCounter::starting_at(self.options.fps_window, started),
            retained: None,
            topology_frozen: self.options.mesh_style == MeshStyle::Contours,
            frames: 0,
        };

        let (stop, save) = self.run_loop(&mut state);
        self.mailbox.close();
        self.logger.summary();

        log::info!("Session ended after {} frames: {stop:?}", state.frames);
        SessionSummary {
            frames: state.frames,
            stop,
            save,
        }
    }

    fn run_loop(&mut self, state: &mut SessionState) -> (StopReason, SaveOutcome) {
        loop {
            if let Some(max) = self.options.max_frames {
                if state.frames >= max {
                    return (StopReason::MaxFrames, SaveOutcome::NotRequested);
                }
            }
            if !self.display.is_open() {
                return (StopReason::DisplayClosed, SaveOutcome::NotRequested);
            }

            let t0 = Instant::now();
            let mut frame = match self.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => return (StopReason::EndOfStream, SaveOutcome::NotRequested),
                Err(e) => {
                    log::error!("Frame source failed: {e}");
                    return (
                        StopReason::SourceFailed(e.to_string()),
                        SaveOutcome::NotRequested,
                    );
                }
            };
            if self.options.mirror {
                frame.flip_horizontal();
            }
            state.frames += 1;
            self.logger.frame(frame.index());
            self.logger.timing("capture", elapsed_ms(t0));

            let timestamp_ms = next_timestamp(state);
            self.dispatch(&frame, timestamp_ms);

            let status_fps = state.fps.tick();

            let t1 = Instant::now();
            if let Err(e) = self.present(state, &frame, status_fps, timestamp_ms) {
                log::error!("Display failed: {e}");
                return (
                    StopReason::DisplayFailed(e.to_string()),
                    SaveOutcome::NotRequested,
                );
            }
            self.logger.timing("present", elapsed_ms(t1));

            if let Some(key) = self.display.poll_key() {
                if key.eq_ignore_ascii_case(&QUIT_KEY) {
                    return (StopReason::QuitKey, self.persist(state.retained.as_ref()));
                }
            }
        }
    }

    fn dispatch(&mut self, frame: &Frame, timestamp_ms: u64) {
        let input = frame.to_layout(self.detector.input_layout());
        if let Err(e) = self.detector.submit(&input, timestamp_ms) {
            log::warn!("Frame {} not submitted to detector: {e}", frame.index());
        }
    }

    /// Consumes the newest detection and shows the matching views.
    fn present(
        &mut self,
        state: &mut SessionState,
        frame: &Frame,
        fps: f64,
        now_ms: u64,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let latest = self.mailbox.take_latest();
        if let Some(result) = &latest {
            let age = now_ms.saturating_sub(result.timestamp_ms());
            log::trace!("Using detection from {} ms ({age} ms old)", result.timestamp_ms());
            self.logger.metric("detection_age_ms", age as f64);
        }

        let Some(landmarks) = latest.as_deref().and_then(|r| r.face()) else {
            state.retained = None;
            let status = DisplayStatus {
                fps,
                face_detected: false,
            };
            return self.display.show(View::FaceMesh, frame, &status);
        };

        if !state.topology_frozen {
            self.freeze_topology(landmarks);
            state.topology_frozen = true;
        }

        let t = Instant::now();
        let mesh = self.renderer.render_mesh(frame, landmarks, &self.catalog);
        self.logger.timing("render", elapsed_ms(t));

        let t = Instant::now();
        let segmented = segment_face(frame, landmarks, self.catalog.contour_indices());
        self.logger.timing("segment", elapsed_ms(t));

        let status = DisplayStatus {
            fps,
            face_detected: true,
        };
        self.display.show(View::FaceMesh, &mesh, &status)?;
        self.display.show(View::SegmentedFace, &segmented, &status)?;
        state.retained = Some(segmented);
        Ok(())
    }

    fn freeze_topology(&mut self, landmarks: &LandmarkSet) {
        let topology = MeshTopology::triangulate(landmarks);
        log::info!(
            "Mesh topology fixed from first face: {} edges over {} landmarks",
            topology.len(),
            landmarks.len()
        );
        self.catalog = self.catalog.clone().with_topology(topology);
    }

    fn persist(&self, retained: Option<&Frame>) -> SaveOutcome {
        let Some(frame) = retained else {
            log::info!("No face detected to save.");
            return SaveOutcome::NoFace;
        };
        match self.saver.save(frame) {
            Ok(path) => {
                log::info!("Segmented face saved to: {}", path.display());
                SaveOutcome::Saved(path)
            }
            Err(e) => {
                log::error!("Failed to save segmented face: {e}");
                SaveOutcome::Failed(e.to_string())
            }
        }
    }
}

/// Milliseconds since session start, bumped so that it always advances.
fn next_timestamp(state: &mut SessionState) -> u64 {
    let now = state.started.elapsed().as_millis() as u64;
    let ts = match state.last_timestamp {
        Some(last) if now <= last => last + 1,
        _ => now,
    };
    state.last_timestamp = Some(ts);
    ts
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}
