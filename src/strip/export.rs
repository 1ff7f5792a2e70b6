use std::path::{Path, PathBuf};

use crate::strip::compositor::StripArtifact;
use crate::strip::error::{Result, StripError};

/// File name used when none is configured.
pub const DEFAULT_FILE_NAME: &str = "memory-booth-strip.png";

/// Write the strip as PNG to `path` atomically (write .tmp then rename).
///
/// Missing parent directories are created. An existing file is replaced.
pub fn save_png(artifact: &StripArtifact, path: &Path) -> Result<PathBuf> {
    let png = artifact.encode_png().map_err(StripError::Render)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("png.tmp");
    std::fs::write(&tmp_path, &png)?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    tracing::info!("strip saved to {} ({} bytes)", path.display(), png.len());
    Ok(path.to_path_buf())
}

/// Save into `dir` under `file_name`, or [`DEFAULT_FILE_NAME`] when empty.
pub fn save_to_dir(artifact: &StripArtifact, dir: &Path, file_name: &str) -> Result<PathBuf> {
    let name = if file_name.trim().is_empty() {
        DEFAULT_FILE_NAME
    } else {
        file_name
    };
    save_png(artifact, &dir.join(name))
}
