//! Configuration model.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// External tool configuration.
    pub tools: ToolsConfig,
    /// Encoder configuration.
    pub encoding: EncodingConfig,
    /// Bitrate safety policy.
    pub bitrate: BitratePolicy,
}

/// External tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// ffmpeg executable.
    pub ffmpeg: PathBuf,
    /// ffprobe executable.
    pub ffprobe: PathBuf,
    /// Directory ffmpeg runs in; two-pass logs are written here.
    pub work_dir: PathBuf,
}

/// Encoder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    /// Opus audio bitrate muxed alongside video, in kbps.
    pub audio_bitrate_kbps: u32,
    /// Subtract the audio bitrate from the size budget before building `-b:v`.
    pub reserve_audio: bool,
    /// x264 preset.
    pub x264_preset: String,
    /// libvpx-vp9 deadline.
    pub vp9_deadline: String,
}

/// Safety margin applied when a conservative encode is requested.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum BitratePolicy {
    /// Multiply the bitrate by `factor`.
    Scale { factor: f64 },
    /// Subtract a fixed headroom.
    Subtract { headroom_kbps: f64 },
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: std::env::var_os("DMT_FFMPEG")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("ffmpeg")),
            ffprobe: std::env::var_os("DMT_FFPROBE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("ffprobe")),
            work_dir: PathBuf::from("."),
        }
    }
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            audio_bitrate_kbps: 96,
            reserve_audio: true,
            x264_preset: "slow".to_string(),
            vp9_deadline: "good".to_string(),
        }
    }
}

impl BitratePolicy {
    /// Check that the policy strictly lowers a bitrate.
    pub fn validate(&self) -> crate::Result<()> {
        match *self {
            BitratePolicy::Scale { factor } if !(factor > 0.0 && factor < 1.0) => {
                Err(crate::Error::other(format!(
                    "bitrate factor {} must be between 0 and 1",
                    factor
                )))
            }
            BitratePolicy::Subtract { headroom_kbps }
                if headroom_kbps.is_nan() || headroom_kbps <= 0.0 =>
            {
                Err(crate::Error::other(format!(
                    "bitrate headroom {} kbps must be positive",
                    headroom_kbps
                )))
            }
            _ => Ok(()),
        }
    }
}

impl Default for BitratePolicy {
    fn default() -> Self {
        BitratePolicy::Scale { factor: 0.98 }
    }
}

/// Get the configuration directory path.
fn dirs_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("discord_media_tool")
}

/// Default location of the config file.
pub fn default_config_path() -> PathBuf {
    dirs_config_path().join("config.toml")
}

/// Load configuration from a file.
///
/// A missing file yields the defaults; a malformed file is an error so a typo
/// never silently changes the bitrate policy.
pub fn load_config(path: Option<&Path>) -> crate::Result<Config> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(default_config_path);

    if !config_path.exists() {
        tracing::debug!("No config at {}, using defaults", config_path.display());
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(&config_path)?;
    let config: Config = toml::from_str(&content)?;
    config.bitrate.validate()?;
    tracing::debug!("Loaded config from {}", config_path.display());
    Ok(config)
}
