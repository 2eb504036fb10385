use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("model file not found: {0}")]
    NotFound(PathBuf),
    #[error("model {name} not found (searched: {searched})")]
    Missing { name: String, searched: String },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Resolve a model file by name.
///
/// Resolution order:
/// 1. Explicit path given by the user (must exist)
/// 2. User cache directory (platform-specific)
/// 3. Bundled directory (development checkouts / packaged installs)
///
/// Models are never downloaded; place them in one of these locations.
pub fn resolve(
    name: &str,
    explicit: Option<&Path>,
    bundled_dir: Option<&Path>,
) -> Result<PathBuf, ModelResolveError> {
    let mut dirs = Vec::new();
    match model_cache_dir() {
        Ok(dir) => dirs.push(dir),
        Err(e) => log::debug!("Skipping model cache lookup: {e}"),
    }
    if let Some(dir) = bundled_dir {
        dirs.push(dir.to_path_buf());
    }
    resolve_in(name, explicit, &dirs)
}

fn resolve_in(
    name: &str,
    explicit: Option<&Path>,
    search_dirs: &[PathBuf],
) -> Result<PathBuf, ModelResolveError> {
    if let Some(path) = explicit {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(ModelResolveError::NotFound(path.to_path_buf()))
        };
    }

    for dir in search_dirs {
        let candidate = dir.join(name);
        if candidate.is_file() {
            log::debug!("Resolved {name} to {}", candidate.display());
            return Ok(candidate);
        }
    }

    Err(ModelResolveError::Missing {
        name: name.to_string(),
        searched: search_dirs
            .iter()
            .map(|d| d.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/FaceMesh/models/`
/// - Linux: `$XDG_CACHE_HOME/FaceMesh/models/` or `~/.cache/FaceMesh/models/`
/// - Windows: `%LOCALAPPDATA%/FaceMesh/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("FaceMesh").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("FaceMesh").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}
