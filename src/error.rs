//! Error types for the media tool.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the media tool.
#[derive(Error, Debug)]
pub enum Error {
    // Preflight errors
    #[error("{0} not found. Install FFmpeg or set its path in the config file")]
    DependencyMissing(String),

    // Input errors
    #[error("Invalid media file: {0}")]
    FileInvalid(String),

    #[error("Failed to parse {0}")]
    ParseFailure(String),

    #[error("Target bitrate too low: {0:.1} kbps")]
    BitrateTooLow(f64),

    // Encode errors
    #[error("ffmpeg pass {pass} failed ({status})")]
    EncodeFailure { pass: u8, status: String },

    #[error("Encode cancelled")]
    Cancelled,

    #[error("An encode is already running")]
    Busy,

    // Config errors
    #[error("Invalid config file: {0}")]
    Config(#[from] toml::de::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Create a file-invalid error from a string.
    pub fn file_invalid<S: Into<String>>(msg: S) -> Self {
        Error::FileInvalid(msg.into())
    }
}
