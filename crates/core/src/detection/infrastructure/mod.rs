pub mod execution_provider;
pub mod model_resolver;
pub mod onnx_face_mesh_model;
pub mod threaded_landmark_detector;
