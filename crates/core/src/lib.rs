pub mod detection;
pub mod geometry;
pub mod pipeline;
pub mod rendering;
pub mod segmentation;
pub mod shared;
pub mod video;
