//! Probe command implementation.

use crate::models::config::Config;
use crate::models::media::{CodecType, MediaKind};
use crate::services::ffprobe;
use crate::{Error, Result};
use colored::Colorize;
use std::path::Path;

/// Print stream information for a media file.
pub async fn probe(config: &Config, file: &Path, kind: MediaKind, json: bool) -> Result<()> {
    let info = ffprobe::probe(&config.tools.ffprobe, file, kind).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{} {}", "File:".bold(), file.display());
    for (index, stream) in info.streams.iter().enumerate() {
        let codec = stream.codec_name.as_deref().unwrap_or("unknown");
        match stream.codec_type {
            CodecType::Video => println!(
                "  #{} {} {} {}x{}",
                index,
                "video".cyan(),
                codec,
                stream.width,
                stream.height
            ),
            CodecType::Audio => println!("  #{} {} {}", index, "audio".cyan(), codec),
            CodecType::Other => println!("  #{} {} {}", index, "other".dimmed(), codec),
        }
    }

    match info.duration_secs() {
        Some(duration) => {
            println!("{} {:.2}s", "Duration:".bold(), duration);
            Ok(())
        }
        None => Err(Error::file_invalid(format!(
            "{} has no {} stream",
            file.display(),
            kind
        ))),
    }
}
