mod headless_display;
mod minifb_display;
mod settings;

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::Parser;

use facemesh_core::detection::domain::landmark_detector::publish_to;
use facemesh_core::detection::domain::result_mailbox::ResultMailbox;
use facemesh_core::detection::infrastructure::model_resolver;
use facemesh_core::detection::infrastructure::onnx_face_mesh_model::{
    OnnxFaceMeshModel, TensorLayout,
};
use facemesh_core::detection::infrastructure::threaded_landmark_detector::ThreadedLandmarkDetector;
use facemesh_core::geometry::domain::geometry_catalog::GeometryCatalog;
use facemesh_core::pipeline::live_mesh_use_case::{
    LiveMeshUseCase, MeshStyle, SaveOutcome, SessionOptions, SessionSummary,
};
use facemesh_core::pipeline::save_segmented_face_use_case::SaveSegmentedFaceUseCase;
use facemesh_core::pipeline::session_logger::StdoutSessionLogger;
use facemesh_core::rendering::domain::overlay_renderer::{OverlayRenderer, OverlayStyle};
use facemesh_core::shared::constants::{FACE_DETECTOR_MODEL_NAME, FACE_MESH_MODEL_NAME};
use facemesh_core::video::domain::display_sink::DisplaySink;
use facemesh_core::video::infrastructure::ffmpeg_frame_source::FfmpegFrameSource;
use facemesh_core::video::infrastructure::image_file_writer::ImageFileWriter;

use crate::headless_display::HeadlessDisplay;
use crate::minifb_display::MinifbDisplay;
use crate::settings::Settings;

/// Live face mesh overlay with face segmentation. Press q to save the
/// current segmented face and quit.
#[derive(Parser)]
#[command(name = "facemesh")]
struct Cli {
    /// Video file, stream URL, or capture device (see --input-format).
    input: String,

    /// Capture backend for device input, e.g. v4l2, avfoundation, dshow.
    #[arg(long)]
    input_format: Option<String>,

    /// Face detector model (default: face_detection_short_range.onnx from the model dirs).
    #[arg(long)]
    face_model: Option<PathBuf>,

    /// Face landmark model (default: face_landmark.onnx from the model dirs).
    #[arg(long)]
    mesh_model: Option<PathBuf>,

    /// Input tensor order of the landmark model: nchw (default) or nhwc.
    #[arg(long)]
    mesh_layout: Option<TensorLayout>,

    /// Directory for saved segmented faces.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Weight of the camera frame when blending the mesh (0.0-1.0).
    #[arg(long)]
    alpha: Option<f64>,

    /// Base mesh: triangulated (default) or contours.
    #[arg(long)]
    mesh: Option<MeshStyle>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f32>,

    /// Flip frames horizontally (selfie view).
    #[arg(long)]
    mirror: bool,

    /// Run without windows; Ctrl-C saves and quits.
    #[arg(long)]
    headless: bool,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<usize>,

    /// Settings file (default: <config dir>/FaceMesh/settings.json).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective settings back to the settings file.
    #[arg(long)]
    save_config: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let mut settings = Settings::load(cli.config.as_deref())?;
    apply_overrides(&mut settings, &cli);
    settings.validate()?;
    if let Some(path) = persist_settings(&settings, &cli)? {
        log::info!("Saved settings to {}", path.display());
    }

    let mailbox = Arc::new(ResultMailbox::new());
    let model = build_model(&cli, &settings)?;
    let detector = ThreadedLandmarkDetector::new(Box::new(model), publish_to(Arc::clone(&mailbox)));

    let source = FfmpegFrameSource::open(&cli.input, cli.input_format.as_deref())?;
    let display: Box<dyn DisplaySink> = if cli.headless {
        Box::new(HeadlessDisplay::install(100)?)
    } else {
        Box::new(MinifbDisplay::new())
    };

    let renderer = OverlayRenderer::new(OverlayStyle {
        alpha: settings.alpha,
        mesh_color: settings.mesh_color,
        ..OverlayStyle::default()
    });
    let options = SessionOptions {
        mesh_style: settings.mesh_style,
        max_frames: cli.max_frames,
        mirror: cli.mirror,
        fps_window: settings.fps_window,
    };

    let mut use_case = LiveMeshUseCase::new(
        Box::new(source),
        Box::new(detector),
        mailbox,
        display,
        SaveSegmentedFaceUseCase::new(Box::new(ImageFileWriter::new()), &settings.output_dir),
        renderer,
        GeometryCatalog::face_mesh(),
        options,
        Box::new(StdoutSessionLogger::default()),
    );
    let summary = use_case.execute();
    report(&summary)
}

fn build_model(
    cli: &Cli,
    settings: &Settings,
) -> Result<OnnxFaceMeshModel, Box<dyn std::error::Error>> {
    let bundled = bundled_models_dir();
    log::info!("Resolving models: {FACE_DETECTOR_MODEL_NAME}, {FACE_MESH_MODEL_NAME}");
    let detector_path = model_resolver::resolve(
        FACE_DETECTOR_MODEL_NAME,
        cli.face_model.as_deref(),
        bundled.as_deref(),
    )?;
    let mesh_path = model_resolver::resolve(
        FACE_MESH_MODEL_NAME,
        cli.mesh_model.as_deref(),
        bundled.as_deref(),
    )?;
    Ok(OnnxFaceMeshModel::new(&detector_path, &mesh_path, settings.confidence)?
        .with_mesh_layout(settings.mesh_layout))
}

/// Writes `settings` to `--config` or the per-user file when `--save-config`
/// is set. Returns the path written.
fn persist_settings(
    settings: &Settings,
    cli: &Cli,
) -> Result<Option<PathBuf>, Box<dyn std::error::Error>> {
    if !cli.save_config {
        return Ok(None);
    }
    let path = cli
        .config
        .clone()
        .or_else(Settings::config_path)
        .ok_or("could not determine the settings directory")?;
    settings.save_to(&path)?;
    Ok(Some(path))
}

/// `models/` next to the executable.
fn bundled_models_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("models")))
}

fn apply_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(alpha) = cli.alpha {
        settings.alpha = alpha;
    }
    if let Some(mesh) = cli.mesh {
        settings.mesh_style = mesh;
    }
    if let Some(dir) = &cli.output_dir {
        settings.output_dir = dir.clone();
    }
    if let Some(confidence) = cli.confidence {
        settings.confidence = confidence;
    }
    if let Some(layout) = cli.mesh_layout {
        settings.mesh_layout = layout;
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.input.trim().is_empty() {
        return Err("Input must not be empty".into());
    }
    if cli.input_format.is_none() && looks_like_path(&cli.input) && !Path::new(&cli.input).exists()
    {
        return Err(format!("Input file not found: {}", cli.input).into());
    }
    if cli.max_frames == Some(0) {
        return Err("--max-frames must be at least 1".into());
    }
    for (flag, path) in [("--face-model", &cli.face_model), ("--mesh-model", &cli.mesh_model)] {
        if let Some(path) = path {
            if !path.is_file() {
                return Err(format!("{flag} file not found: {}", path.display()).into());
            }
        }
    }
    Ok(())
}

/// Stream URLs (`rtsp://...`) are handed to ffmpeg as-is.
fn looks_like_path(input: &str) -> bool {
    !input.contains("://")
}

fn report(summary: &SessionSummary) -> Result<(), Box<dyn std::error::Error>> {
    match &summary.save {
        SaveOutcome::Saved(path) => eprintln!("Segmented face saved to: {}", path.display()),
        SaveOutcome::NoFace => eprintln!("No face detected to save."),
        SaveOutcome::Failed(e) => eprintln!("Could not save segmented face: {e}"),
        SaveOutcome::NotRequested => {}
    }
    if summary.stop.is_failure() {
        return Err(format!(
            "session stopped after {} frames: {:?}",
            summary.frames, summary.stop
        )
        .into());
    }
    log::info!("Processed {} frames", summary.frames);
    Ok(())
}
