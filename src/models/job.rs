//! Encode job data models.

use crate::models::media::MediaKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    H264,
    Vp9,
    Mp3,
    Opus,
    Gif,
}

/// How a codec is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecFamily {
    /// Two-pass video with an Opus audio track.
    TwoPassVideo,
    /// Single-pass audio, video dropped.
    Audio,
    /// Single-pass palette GIF.
    Gif,
}

impl Codec {
    pub fn family(self) -> CodecFamily {
        match self {
            Codec::H264 | Codec::Vp9 => CodecFamily::TwoPassVideo,
            Codec::Mp3 | Codec::Opus => CodecFamily::Audio,
            Codec::Gif => CodecFamily::Gif,
        }
    }

    /// Stream kind the input must contain.
    pub fn required_kind(self) -> MediaKind {
        match self.family() {
            CodecFamily::Audio => MediaKind::Audio,
            CodecFamily::TwoPassVideo | CodecFamily::Gif => MediaKind::Video,
        }
    }

    /// Suffix appended to the input stem.
    pub fn suffix(self) -> &'static str {
        match self {
            Codec::H264 => "_x264",
            Codec::Vp9 => "_vp9",
            Codec::Mp3 => "_mp3",
            Codec::Opus => "_opus",
            Codec::Gif => "_gif",
        }
    }

    /// Output container extension.
    pub fn extension(self) -> &'static str {
        match self {
            Codec::H264 => "mp4",
            Codec::Vp9 => "webm",
            Codec::Mp3 => "mp3",
            Codec::Opus => "opus",
            Codec::Gif => "gif",
        }
    }

    /// ffmpeg encoder name, `None` for GIF (filter graph driven).
    pub fn encoder(self) -> Option<&'static str> {
        match self {
            Codec::H264 => Some("libx264"),
            Codec::Vp9 => Some("libvpx-vp9"),
            Codec::Mp3 => Some("libmp3lame"),
            Codec::Opus => Some("libopus"),
            Codec::Gif => None,
        }
    }
}

impl std::fmt::Display for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Codec::H264 => write!(f, "h264"),
            Codec::Vp9 => write!(f, "vp9"),
            Codec::Mp3 => write!(f, "mp3"),
            Codec::Opus => write!(f, "opus"),
            Codec::Gif => write!(f, "gif"),
        }
    }
}

/// What the encode should aim for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Total output size in megabytes.
    SizeMb(f64),
    /// Bitrate in kilobits per second.
    BitrateKbps(f64),
    /// No rate target (GIF).
    None,
}

/// A request to encode one file.
#[derive(Debug, Clone)]
pub struct EncodeRequest {
    /// Input media file.
    pub input: PathBuf,
    /// Size or bitrate target.
    pub target: Target,
    /// Output codec.
    pub codec: Codec,
    /// Apply the conservative bitrate policy.
    pub conservative: bool,
    /// Cap pass 2 output with `-fs` (size targets only).
    pub size_limit: bool,
}

impl EncodeRequest {
    pub fn new(input: impl Into<PathBuf>, codec: Codec, target: Target) -> Self {
        Self {
            input: input.into(),
            target,
            codec,
            conservative: false,
            size_limit: false,
        }
    }

    pub fn conservative(mut self, conservative: bool) -> Self {
        self.conservative = conservative;
        self
    }

    pub fn size_limit(mut self, size_limit: bool) -> Self {
        self.size_limit = size_limit;
        self
    }
}

/// Encoder progress, carried over a single-slot channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Progress {
    Starting,
    /// Fraction of the input duration written, 0.0 to 1.0.
    Fraction(f64),
    Complete,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        match self {
            Progress::Starting => 0.0,
            Progress::Fraction(f) => *f,
            Progress::Complete => 1.0,
        }
    }
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Progress::Starting => write!(f, "Starting..."),
            Progress::Fraction(v) => write!(f, "{:.2}", v),
            Progress::Complete => write!(f, "Complete"),
        }
    }
}

/// Failure category shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    FileInvalid,
    DependencyMissing,
    EncodeFailure,
    ParseFailure,
    Other,
}

impl From<&crate::Error> for FailureKind {
    fn from(err: &crate::Error) -> Self {
        use crate::Error;
        match err {
            Error::FileInvalid(_) => FailureKind::FileInvalid,
            Error::DependencyMissing(_) => FailureKind::DependencyMissing,
            Error::EncodeFailure { .. } => FailureKind::EncodeFailure,
            Error::ParseFailure(_) | Error::BitrateTooLow(_) => FailureKind::ParseFailure,
            _ => FailureKind::Other,
        }
    }
}

/// Job lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobState {
    Idle,
    Probing,
    EncodingPass1,
    EncodingPass2,
    /// Single-pass encode (audio, GIF).
    Encoding,
    Done,
    Failed { kind: FailureKind, message: String },
    Cancelled,
}

impl JobState {
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            JobState::Probing
                | JobState::EncodingPass1
                | JobState::EncodingPass2
                | JobState::Encoding
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Done | JobState::Failed { .. } | JobState::Cancelled
        )
    }
}

/// Immutable snapshot of the controller, read by the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    /// Job ID.
    pub id: Option<String>,
    /// Current state.
    pub state: JobState,
    /// Latest encoder progress of the running pass.
    pub progress: Progress,
    /// Input file.
    pub input: Option<PathBuf>,
    /// Output file, known once probing is done.
    pub output: Option<PathBuf>,
    /// Bitrate handed to ffmpeg.
    pub bitrate_kbps: Option<f64>,
    /// When the job started.
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Default for JobStatus {
    fn default() -> Self {
        Self {
            id: None,
            state: JobState::Idle,
            progress: Progress::Starting,
            input: None,
            output: None,
            bitrate_kbps: None,
            started_at: None,
        }
    }
}
