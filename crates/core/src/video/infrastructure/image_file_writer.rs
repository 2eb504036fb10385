use std::path::Path;

use crate::shared::frame::{Frame, PixelLayout};
use crate::video::domain::image_writer::ImageWriter;

/// Writes a single frame to an image file using the `image` crate.
///
/// BGR frames are reordered to RGB before encoding.
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let rgb = frame.to_layout(PixelLayout::Rgb);
        let img = image::RgbImage::from_raw(rgb.width(), rgb.height(), rgb.data().to_vec())
            .ok_or("Failed to create image from frame data")?;

        img.save(path)?;
        Ok(())
    }
}
