pub mod fps_counter;
pub mod live_mesh_use_case;
pub mod save_segmented_face_use_case;
pub mod session_logger;
