//! FFmpeg preflight check.

use super::CheckResult;
use crate::services::ffmpeg;
use std::path::Path;

/// Check if ffmpeg is installed.
pub async fn check(path: &Path) -> CheckResult {
    if !ffmpeg::is_installed(path).await {
        return CheckResult::fail(
            "ffmpeg",
            &format!("not found at {}", path.display()),
            "Install FFmpeg or set tools.ffmpeg in the config file",
        );
    }

    match ffmpeg::get_version(path).await {
        Ok(version) => CheckResult::ok("ffmpeg", &format!("installed ({})", version)),
        Err(_) => CheckResult::ok("ffmpeg", "installed"),
    }
}
