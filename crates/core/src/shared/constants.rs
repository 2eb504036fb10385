/// Landmarks produced by the face-mesh model (468 without iris refinement).
pub const FACE_MESH_LANDMARKS: usize = 468;

/// Landmarks produced with iris refinement (468 + 2 x 5 iris points).
pub const FACE_MESH_LANDMARKS_WITH_IRIS: usize = 478;

pub const FACE_DETECTOR_MODEL_NAME: &str = "face_detection_short_range.onnx";
pub const FACE_MESH_MODEL_NAME: &str = "face_landmark.onnx";

pub const FACE_MESH_WINDOW: &str = "Face Mesh";
pub const SEGMENTED_FACE_WINDOW: &str = "Segmented Face";

pub const DEFAULT_OUTPUT_DIR: &str = "saved_faces";
pub const SEGMENTED_FACE_PREFIX: &str = "segmented_face_";

/// Weight of the source frame when compositing the mesh overlay.
pub const DEFAULT_BLEND_ALPHA: f64 = 0.8;

/// Frames per FPS sample window.
pub const FPS_WINDOW: usize = 10;

pub const QUIT_KEY: char = 'q';
