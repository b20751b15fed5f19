//! File system utilities.

use crate::models::job::Codec;
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Check that a path exists and is a regular file.
pub fn ensure_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::file_invalid(format!("{} not found", path.display())));
    }
    if !path.is_file() {
        return Err(Error::file_invalid(format!(
            "{} is not a file",
            path.display()
        )));
    }
    Ok(())
}

/// Output path for `input` encoded as `codec`, always next to the input.
///
/// `clip.mov` with VP9 becomes `clip_vp9.webm`.
pub fn output_path(input: &Path, codec: Codec) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    let filename = format!("{}{}.{}", stem, codec.suffix(), codec.extension());

    match input.parent() {
        Some(parent) => parent.join(filename),
        None => PathBuf::from(filename),
    }
}

/// Delete a transient file, logging instead of failing.
///
/// Returns true if the file is gone afterwards.
pub fn remove_transient(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!("Removed {}", path.display());
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => {
            tracing::warn!("Error removing {}: {}", path.display(), e);
            !path.exists()
        }
    }
}

/// Get file extension in lowercase.
pub fn get_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Check if a file is an audio-only file based on extension.
pub fn is_audio_file(path: &Path) -> bool {
    const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "opus", "ogg", "flac", "wav", "aac"];

    get_extension(path)
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}
