//! Command line argument definitions.

use crate::models::job::Codec;
use crate::models::media::MediaKind;
use crate::utils::input::parse_positive;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Discord Media Tool - Shrink videos and audio to fit Discord's upload limits
#[derive(Parser, Debug)]
#[command(name = "discord-media-tool")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Skip preflight checks
    #[arg(long, global = true)]
    pub skip_preflight: bool,

    /// Path to config.toml (default: user config directory)
    #[arg(long, global = true, value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that ffmpeg and ffprobe are available
    Check,

    /// Show stream and duration information of a media file
    Probe {
        /// Media file to probe
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Stream kind the file must contain
        #[arg(long, value_enum, default_value = "video")]
        kind: KindArg,

        /// Print the raw probe result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Two-pass encode a video to a target size or bitrate
    Encode {
        /// Video file to encode
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output codec
        #[arg(short, long, value_enum, default_value = "h264")]
        codec: VideoCodecArg,

        /// Target output size in MB (default: 10)
        #[arg(short, long, value_parser = parse_number, conflicts_with = "bitrate")]
        size: Option<f64>,

        /// Target video bitrate in kbps
        #[arg(short, long, value_parser = parse_number)]
        bitrate: Option<f64>,

        /// Apply the configured safety margin to the computed bitrate
        #[arg(long)]
        conservative: bool,

        /// Hard-cap the second pass at the target size with -fs
        #[arg(long, requires = "size")]
        size_limit: bool,
    },

    /// Convert a file to an audio-only format
    Convert {
        /// Media file with an audio stream
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output codec
        #[arg(short, long, value_enum, default_value = "mp3")]
        codec: AudioCodecArg,

        /// Audio bitrate in kbps (default: 192)
        #[arg(short, long, value_parser = parse_number, conflicts_with = "size")]
        bitrate: Option<f64>,

        /// Target output size in MB instead of a bitrate
        #[arg(short, long, value_parser = parse_number)]
        size: Option<f64>,

        /// Apply the configured safety margin to a size-derived bitrate
        #[arg(long)]
        conservative: bool,
    },

    /// Convert a video to an animated GIF
    Gif {
        /// Video file to convert
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum KindArg {
    Video,
    Audio,
}

impl From<KindArg> for MediaKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Video => MediaKind::Video,
            KindArg::Audio => MediaKind::Audio,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum VideoCodecArg {
    H264,
    Vp9,
}

impl From<VideoCodecArg> for Codec {
    fn from(codec: VideoCodecArg) -> Self {
        match codec {
            VideoCodecArg::H264 => Codec::H264,
            VideoCodecArg::Vp9 => Codec::Vp9,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioCodecArg {
    Mp3,
    Opus,
}

impl From<AudioCodecArg> for Codec {
    fn from(codec: AudioCodecArg) -> Self {
        match codec {
            AudioCodecArg::Mp3 => Codec::Mp3,
            AudioCodecArg::Opus => Codec::Opus,
        }
    }
}

fn parse_number(text: &str) -> std::result::Result<f64, String> {
    parse_positive(text).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_args() {
        let cli = Cli::try_parse_from([
            "discord-media-tool",
            "encode",
            "clip.mov",
            "--codec",
            "vp9",
            "--size",
            "8",
            "--conservative",
        ])
        .unwrap();

        match cli.command {
            Commands::Encode {
                codec,
                size,
                bitrate,
                conservative,
                ..
            } => {
                assert_eq!(codec, VideoCodecArg::Vp9);
                assert_eq!(size, Some(8.0));
                assert_eq!(bitrate, None);
                assert!(conservative);
            }
            _ => panic!("Expected Encode"),
        }
    }

    #[test]
    fn test_rejects_bad_size() {
        let result = Cli::try_parse_from(["discord-media-tool", "encode", "clip.mov", "-s", "ten"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_size_and_bitrate_conflict() {
        let result = Cli::try_parse_from([
            "discord-media-tool",
            "encode",
            "clip.mov",
            "-s",
            "8",
            "-b",
            "900",
        ]);
        assert!(result.is_err());
    }
}
