//! FFprobe service for extracting media metadata.

use crate::models::media::{MediaInfo, MediaKind};
use crate::utils::fs;
use crate::{Error, Result};
use std::path::Path;
use tokio::process::Command;

/// Check if ffprobe is installed.
pub async fn is_installed(ffprobe: &Path) -> bool {
    Command::new(ffprobe)
        .arg("-version")
        .output()
        .await
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Get ffprobe version.
pub async fn get_version(ffprobe: &Path) -> Result<String> {
    let output = Command::new(ffprobe).arg("-version").output().await?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let first_line = stdout.lines().next().unwrap_or("unknown");

    Ok(first_line.to_string())
}

/// Probe a media file and validate that it carries a stream of `wanted`.
///
/// When the stream kind is missing the returned info has the invalid duration
/// sentinel, so [`MediaInfo::duration_secs`] yields `None`.
pub async fn probe(ffprobe: &Path, path: &Path, wanted: MediaKind) -> Result<MediaInfo> {
    fs::ensure_file(path)?;

    let output = Command::new(ffprobe)
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            tracing::warn!("Failed to run {}: {}", ffprobe.display(), e);
            Error::file_invalid(format!("ffprobe could not run on {}", path.display()))
        })?;

    if !output.status.success() {
        tracing::debug!(
            "ffprobe stderr: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return Err(Error::file_invalid(format!(
            "ffprobe failed for {} ({})",
            path.display(),
            output.status
        )));
    }

    parse_probe_output(&output.stdout, wanted)
}

/// Parse ffprobe JSON output and check for the wanted stream kind.
pub fn parse_probe_output(json: &[u8], wanted: MediaKind) -> Result<MediaInfo> {
    let mut info: MediaInfo = serde_json::from_slice(json).map_err(|e| {
        tracing::warn!("Error parsing json data from ffprobe: {}", e);
        Error::file_invalid(format!("unreadable ffprobe report: {}", e))
    })?;

    if !info.has_kind(wanted) || info.format.duration.trim().is_empty() {
        tracing::debug!("No {} stream with a duration found", wanted);
        info.invalidate();
    }

    Ok(info)
}
