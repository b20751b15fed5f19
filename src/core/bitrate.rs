//! Target bitrate calculation.

use crate::models::config::BitratePolicy;
use crate::{Error, Result};

/// Kilobits per megabyte (decimal, as Discord counts).
const KBIT_PER_MB: f64 = 8000.0;

/// Bytes per megabyte used for the `-fs` cap.
const BYTES_PER_MB: f64 = 1_048_576.0;

/// Fraction of the requested size handed to `-fs`.
const SIZE_LIMIT_FACTOR: f64 = 0.99;

/// Bitrate in kbps that fills `size_mb` over `duration_secs`.
///
/// With `conservative` the policy margin is applied on top.
pub fn target_bitrate_kbps(
    size_mb: f64,
    duration_secs: f64,
    conservative: bool,
    policy: BitratePolicy,
) -> Result<f64> {
    if !(size_mb.is_finite() && size_mb > 0.0) {
        return Err(Error::ParseFailure(format!("target size {}", size_mb)));
    }
    if !(duration_secs.is_finite() && duration_secs > 0.0) {
        return Err(Error::file_invalid(format!("duration {}", duration_secs)));
    }

    let bitrate = size_mb * KBIT_PER_MB / duration_secs;
    let bitrate = if conservative {
        apply_policy(bitrate, policy)
    } else {
        bitrate
    };

    ensure_encodable(bitrate)
}

/// Apply the conservative margin.
pub fn apply_policy(bitrate: f64, policy: BitratePolicy) -> f64 {
    match policy {
        BitratePolicy::Scale { factor } => bitrate * factor,
        BitratePolicy::Subtract { headroom_kbps } => bitrate - headroom_kbps,
    }
}

/// Video share of a total budget once the audio track is accounted for.
pub fn video_bitrate_kbps(total_kbps: f64, audio_kbps: u32, reserve_audio: bool) -> Result<f64> {
    let video = if reserve_audio {
        total_kbps - f64::from(audio_kbps)
    } else {
        total_kbps
    };

    ensure_encodable(video)
}

/// Reject a bitrate that would reach ffmpeg as `0k`.
pub fn ensure_encodable(kbps: f64) -> Result<f64> {
    let rounded = rounded_kbps(kbps);
    if rounded.is_nan() || rounded <= 0.0 {
        return Err(Error::BitrateTooLow(kbps));
    }
    Ok(kbps)
}

/// Byte cap for `-fs`, slightly under the requested size.
pub fn size_limit_bytes(size_mb: f64) -> u64 {
    (size_mb * BYTES_PER_MB * SIZE_LIMIT_FACTOR) as u64
}

/// Format a bitrate for ffmpeg (`1333.33k`).
pub fn format_kbps(kbps: f64) -> String {
    format!("{}k", rounded_kbps(kbps))
}

fn rounded_kbps(kbps: f64) -> f64 {
    (kbps * 100.0).round() / 100.0
}
