pub mod display_sink;
pub mod frame_source;
pub mod image_writer;
