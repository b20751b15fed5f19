//! FFprobe preflight check.

use super::CheckResult;
use crate::services::ffprobe;
use std::path::Path;

/// Check if ffprobe is installed.
pub async fn check(path: &Path) -> CheckResult {
    if ffprobe::is_installed(path).await {
        match ffprobe::get_version(path).await {
            Ok(version) => CheckResult::ok("ffprobe", &format!("installed ({})", version)),
            Err(_) => CheckResult::ok("ffprobe", "installed"),
        }
    } else {
        CheckResult::fail(
            "ffprobe",
            &format!("not found at {}", path.display()),
            "Install FFmpeg or set tools.ffprobe in the config file",
        )
    }
}
