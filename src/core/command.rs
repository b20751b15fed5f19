//! FFmpeg command line construction.

use crate::core::bitrate::format_kbps;
use crate::models::job::{Codec, CodecFamily};
use std::ffi::OsString;
use std::path::PathBuf;

/// Two-pass statistics files ffmpeg leaves in its working directory.
pub const PASSLOG_FILES: [&str; 2] = ["ffmpeg2pass-0.log", "ffmpeg2pass-0.log.mbtree"];

#[cfg(windows)]
const NULL_SINK: &str = "NUL";
#[cfg(not(windows))]
const NULL_SINK: &str = "/dev/null";

/// Rate control buffer size as a multiple of the pass 2 max bitrate.
const BUFSIZE_FACTOR: f64 = 2.0;

const GIF_FILTER: &str = "fps=15,split[v1][v2]; [v1]palettegen=stats_mode=full [palette]; [v2][palette]paletteuse=dither=sierra2_4a";

/// One ffmpeg invocation of an encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Analysis pass, output discarded.
    First,
    /// Final pass of a two-pass encode.
    Second,
    /// Audio conversion or GIF.
    Single,
}

impl Pass {
    pub fn number(self) -> u8 {
        match self {
            Pass::First | Pass::Single => 1,
            Pass::Second => 2,
        }
    }
}

/// Fully resolved encode, ready to turn into command lines.
#[derive(Debug, Clone)]
pub struct EncodePlan {
    /// Absolute input path.
    pub input: PathBuf,
    /// Absolute output path.
    pub output: PathBuf,
    /// Output codec.
    pub codec: Codec,
    /// Bitrate of the main stream (video for two-pass, audio otherwise).
    pub bitrate_kbps: Option<f64>,
    /// Opus bitrate muxed into two-pass outputs.
    pub audio_bitrate_kbps: u32,
    /// `-fs` byte cap for pass 2.
    pub size_limit_bytes: Option<u64>,
    /// Input duration, for progress.
    pub duration_secs: f64,
    /// x264 preset.
    pub x264_preset: String,
    /// libvpx-vp9 deadline.
    pub vp9_deadline: String,
}

impl EncodePlan {
    /// Passes this plan runs, in order.
    pub fn passes(&self) -> &'static [Pass] {
        match self.codec.family() {
            CodecFamily::TwoPassVideo => &[Pass::First, Pass::Second],
            CodecFamily::Audio | CodecFamily::Gif => &[Pass::Single],
        }
    }

    /// Build the argument list for one pass.
    pub fn args(&self, pass: Pass, progress_url: &str) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        push(&mut args, &["-hide_banner", "-y", "-progress", progress_url]);
        args.push("-i".into());
        args.push(self.input.clone().into_os_string());

        match self.codec.family() {
            CodecFamily::TwoPassVideo => self.push_video(&mut args, pass),
            CodecFamily::Audio => self.push_audio(&mut args),
            CodecFamily::Gif => push(
                &mut args,
                &["-filter_complex", GIF_FILTER, "-vsync", "0", "-loop", "0"],
            ),
        }

        if pass == Pass::First {
            push(&mut args, &["-f", "null", NULL_SINK]);
        } else {
            args.push(self.output.clone().into_os_string());
        }
        args
    }

    fn push_video(&self, args: &mut Vec<OsString>, pass: Pass) {
        let encoder = self.codec.encoder().unwrap_or("libx264");
        push(args, &["-c:v", encoder]);
        match self.codec {
            Codec::Vp9 => push(args, &["-deadline", &self.vp9_deadline]),
            _ => push(args, &["-preset", &self.x264_preset]),
        }
        if let Some(kbps) = self.bitrate_kbps {
            push(args, &["-b:v", &format_kbps(kbps)]);
        }
        push(args, &["-pass", &pass.number().to_string()]);

        if pass == Pass::First {
            args.push("-an".into());
            return;
        }

        if let Some(kbps) = self.bitrate_kbps {
            push(
                args,
                &[
                    "-maxrate",
                    &format_kbps(kbps),
                    "-bufsize",
                    &format_kbps(kbps * BUFSIZE_FACTOR),
                ],
            );
        }
        push(
            args,
            &[
                "-c:a",
                "libopus",
                "-b:a",
                &format!("{}k", self.audio_bitrate_kbps),
            ],
        );
        if self.codec == Codec::H264 {
            push(args, &["-movflags", "+faststart"]);
        }
        if let Some(bytes) = self.size_limit_bytes {
            push(args, &["-fs", &bytes.to_string()]);
        }
    }

    fn push_audio(&self, args: &mut Vec<OsString>) {
        let encoder = self.codec.encoder().unwrap_or("libopus");
        push(args, &["-vn", "-c:a", encoder]);
        if let Some(kbps) = self.bitrate_kbps {
            push(args, &["-b:a", &format_kbps(kbps)]);
        }
    }
}

fn push(args: &mut Vec<OsString>, items: &[&str]) {
    args.extend(items.iter().map(OsString::from));
}
