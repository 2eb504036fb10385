use std::path::PathBuf;

use chrono::{Local, NaiveDateTime};
use thiserror::Error;

use crate::shared::constants::SEGMENTED_FACE_PREFIX;
use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("could not create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not write {path}: {message}")]
    Write { path: PathBuf, message: String },
}

/// Persists a segmented face as a timestamped JPEG in one output directory.
///
/// Names have whole-second resolution, so two saves within the same second
/// land on the same file and the later one wins.
pub struct SaveSegmentedFaceUseCase {
    writer: Box<dyn ImageWriter>,
    output_dir: PathBuf,
}

impl SaveSegmentedFaceUseCase {
    pub fn new(writer: Box<dyn ImageWriter>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            writer,
            output_dir: output_dir.into(),
        }
    }

    /// Writes `frame` stamped with the current local time.
    pub fn save(&self, frame: &Frame) -> Result<PathBuf, SaveError> {
        self.save_at(frame, Local::now().naive_local())
    }

    pub fn save_at(&self, frame: &Frame, timestamp: NaiveDateTime) -> Result<PathBuf, SaveError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| SaveError::CreateDir {
            path: self.output_dir.clone(),
            source,
        })?;

        let path = self.output_dir.join(file_name(timestamp));
        self.writer
            .write(&path, frame)
            .map_err(|e| SaveError::Write {
                path: path.clone(),
                message: e.to_string(),
            })?;
        Ok(path)
    }
}

/// `segmented_face_YYYYMMDD_HHMMSS.jpg`
pub fn file_name(timestamp: NaiveDateTime) -> String {
    format!(
        "{SEGMENTED_FACE_PREFIX}{}.jpg",
        timestamp.format("%Y%m%d_%H%M%S")
    )
}

/// True for names produced by [`file_name`].
pub fn is_segmented_face_name(name: &str) -> bool {
    let Some(stamp) = name
        .strip_prefix(SEGMENTED_FACE_PREFIX)
        .and_then(|rest| rest.strip_suffix(".jpg"))
    else {
        return false;
    };
    NaiveDateTime::parse_from_str(stamp, "%Y%m%d_%H%M%S").is_ok() && stamp.len() == 15
}
