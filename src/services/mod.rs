//! External tool services.

pub mod ffmpeg;
pub mod ffprobe;
