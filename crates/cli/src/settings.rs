use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use facemesh_core::detection::infrastructure::onnx_face_mesh_model::{
    TensorLayout, DEFAULT_CONFIDENCE,
};
use facemesh_core::pipeline::live_mesh_use_case::MeshStyle;
use facemesh_core::shared::constants::{DEFAULT_BLEND_ALPHA, DEFAULT_OUTPUT_DIR, FPS_WINDOW};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("could not read settings {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not write settings {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

/// Persistent session preferences. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub alpha: f64,
    pub mesh_style: MeshStyle,
    pub output_dir: PathBuf,
    /// RGB color of the base mesh.
    pub mesh_color: [u8; 3],
    pub fps_window: usize,
    pub confidence: f32,
    /// Input tensor order of the face-landmark model.
    pub mesh_layout: TensorLayout,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_BLEND_ALPHA,
            mesh_style: MeshStyle::Triangulated,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            mesh_color: [255, 255, 255],
            fps_window: FPS_WINDOW,
            confidence: DEFAULT_CONFIDENCE,
            mesh_layout: TensorLayout::Nchw,
        }
    }
}

impl Settings {
    /// `<config_dir>/FaceMesh/settings.json`
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("FaceMesh").join("settings.json"))
    }

    /// Loads `explicit` if given (it must exist), otherwise the per-user
    /// settings file when present, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        match Self::config_path() {
            Some(path) if path.is_file() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let write_err = |source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            SettingsError::Invalid(format!("could not serialize settings: {e}"))
        })?;
        fs::write(path, json).map_err(write_err)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(SettingsError::Invalid(format!(
                "Alpha must be between 0.0 and 1.0, got {}",
                self.alpha
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(SettingsError::Invalid(format!(
                "Confidence must be between 0.0 and 1.0, got {}",
                self.confidence
            )));
        }
        if self.fps_window == 0 {
            return Err(SettingsError::Invalid(
                "FPS window must be at least 1 frame".to_string(),
            ));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(SettingsError::Invalid(
                "Output directory must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.alpha, 0.8);
        assert_eq!(settings.output_dir, PathBuf::from("saved_faces"));
        assert_eq!(settings.fps_window, 10);
        assert_eq!(settings.mesh_style, MeshStyle::Triangulated);
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("FaceMesh").join("settings.json");
        let settings = Settings {
            alpha: 0.6,
            mesh_style: MeshStyle::Triangulated,
            output_dir: PathBuf::from("/tmp/faces"),
            mesh_color: [0, 200, 255],
            fps_window: 30,
            confidence: 0.7,
            mesh_layout: TensorLayout::Nhwc,
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "alpha": 0.5, "mesh_style": "contours" }"#).unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.alpha, 0.5);
        assert_eq!(settings.mesh_style, MeshStyle::Contours);
        assert_eq!(settings.output_dir, PathBuf::from("saved_faces"));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(Some(&dir.path().join("nope.json"))).unwrap_err();
        assert!(matches!(err, SettingsError::Read { .. }));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        let err = Settings::load_from(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }

    #[test]
    fn test_unknown_mesh_style_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "mesh_style": "wireframe" }"#).unwrap();
        assert!(Settings::load_from(&path).is_err());
    }

    #[rstest]
    #[case::alpha_high(Settings { alpha: 1.5, ..Settings::default() })]
    #[case::alpha_negative(Settings { alpha: -0.1, ..Settings::default() })]
    #[case::confidence(Settings { confidence: 2.0, ..Settings::default() })]
    #[case::fps_window(Settings { fps_window: 0, ..Settings::default() })]
    #[case::output_dir(Settings { output_dir: PathBuf::new(), ..Settings::default() })]
    fn test_validate_rejects(#[case] settings: Settings) {
        assert!(matches!(settings.validate(), Err(SettingsError::Invalid(_))));
    }

    #[test]
    fn test_config_path_location() {
        if let Some(path) = Settings::config_path() {
            assert!(path.ends_with("FaceMesh/settings.json"));
        }
    }
}
