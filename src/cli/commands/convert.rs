//! Convert command implementation.

use super::encode::{print_output, run_request};
use crate::models::config::Config;
use crate::models::job::{Codec, EncodeRequest, Target};
use crate::Result;
use std::path::Path;

/// Audio bitrate used when neither a size nor a bitrate is given.
pub const DEFAULT_AUDIO_KBPS: f64 = 192.0;

/// Convert a file to MP3 or Opus in a single pass.
pub async fn convert(
    config: &Config,
    file: &Path,
    codec: Codec,
    bitrate: Option<f64>,
    size: Option<f64>,
    conservative: bool,
) -> Result<()> {
    let target = match size {
        Some(size) => Target::SizeMb(size),
        None => Target::BitrateKbps(bitrate.unwrap_or(DEFAULT_AUDIO_KBPS)),
    };
    let request = EncodeRequest::new(file, codec, target).conservative(conservative);

    let output = run_request(config, request).await?;
    print_output(&output, size);
    Ok(())
}
