//! Media-related data models.

use serde::{Deserialize, Serialize};

/// Duration value stored when the requested stream kind is missing.
pub const INVALID_DURATION: &str = "invalid";

/// Media kind a probe is asked to validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
        }
    }
}

/// Stream codec type as reported by ffprobe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecType {
    Video,
    Audio,
    #[serde(other)]
    Other,
}

impl CodecType {
    /// Whether this stream satisfies the requested media kind.
    pub fn matches(self, kind: MediaKind) -> bool {
        matches!(
            (self, kind),
            (CodecType::Video, MediaKind::Video) | (CodecType::Audio, MediaKind::Audio)
        )
    }
}

/// A single stream of a probed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    /// Stream type (video, audio, ...).
    pub codec_type: CodecType,
    /// Codec name (e.g., "h264", "opus").
    #[serde(default)]
    pub codec_name: Option<String>,
    /// Width in pixels, 0 for non-video streams.
    #[serde(default)]
    pub width: u32,
    /// Height in pixels, 0 for non-video streams.
    #[serde(default)]
    pub height: u32,
}

/// Container-level information of a probed file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatInfo {
    /// Duration in seconds as reported by ffprobe, or [`INVALID_DURATION`].
    #[serde(default)]
    pub duration: String,
}

/// Media information extracted from ffprobe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Streams in container order.
    #[serde(default)]
    pub streams: Vec<StreamInfo>,
    /// Format section.
    #[serde(default)]
    pub format: FormatInfo,
}

impl MediaInfo {
    /// Duration in seconds, `None` for the invalid sentinel or unparsable values.
    pub fn duration_secs(&self) -> Option<f64> {
        if self.format.duration == INVALID_DURATION {
            return None;
        }
        self.format
            .duration
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && *d > 0.0)
    }

    /// Whether the file has at least one stream of the given kind.
    pub fn has_kind(&self, kind: MediaKind) -> bool {
        self.streams.iter().any(|s| s.codec_type.matches(kind))
    }

    /// Dimensions of the first video stream.
    pub fn video_dimensions(&self) -> Option<(u32, u32)> {
        self.streams
            .iter()
            .find(|s| s.codec_type == CodecType::Video)
            .map(|s| (s.width, s.height))
    }

    /// Mark the duration as invalid.
    pub fn invalidate(&mut self) {
        self.format.duration = INVALID_DURATION.to_string();
    }
}
