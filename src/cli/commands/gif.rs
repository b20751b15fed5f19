//! GIF command implementation.

use super::encode::{print_output, run_request};
use crate::models::config::Config;
use crate::models::job::{Codec, EncodeRequest, Target};
use crate::Result;
use std::path::Path;

/// Convert a video to a palette-optimised GIF.
pub async fn gif(config: &Config, file: &Path) -> Result<()> {
    let request = EncodeRequest::new(file, Codec::Gif, Target::None);
    let output = run_request(config, request).await?;
    print_output(&output, None);
    Ok(())
}
