pub mod landmark_detector;
pub mod landmark_model;
pub mod landmarks;
pub mod result_mailbox;
