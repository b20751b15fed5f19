//! Encode command implementation.
//!
//! Starts a job on the controller and renders its status snapshots as a
//! progress bar. Ctrl-C cancels the running ffmpeg process.

use crate::core::controller::Controller;
use crate::models::config::Config;
use crate::models::job::{Codec, EncodeRequest, JobState, JobStatus, Target};
use crate::utils::fs;
use crate::{Error, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

/// Target size used when neither a size nor a bitrate is given.
pub const DEFAULT_SIZE_MB: f64 = 10.0;

/// Two-pass encode a video.
pub async fn encode(
    config: &Config,
    file: &Path,
    codec: Codec,
    size: Option<f64>,
    bitrate: Option<f64>,
    conservative: bool,
    size_limit: bool,
) -> Result<()> {
    if fs::is_audio_file(file) {
        println!(
            "{}",
            "[WARNING] This looks like an audio file, try `convert` instead".yellow()
        );
    }

    let target = match bitrate {
        Some(kbps) => Target::BitrateKbps(kbps),
        None => Target::SizeMb(size.unwrap_or(DEFAULT_SIZE_MB)),
    };
    let request = EncodeRequest::new(file, codec, target)
        .conservative(conservative)
        .size_limit(size_limit);

    let output = run_request(config, request).await?;
    print_output(&output, size);
    Ok(())
}

/// Run a request to completion, showing progress.
pub async fn run_request(config: &Config, request: EncodeRequest) -> Result<PathBuf> {
    println!(
        "{} {} -> {}",
        "[ENCODE]".bold().cyan(),
        request.input.display(),
        request.codec
    );

    let controller = Controller::new(config);
    let handle = controller.start(request).await?;
    let mut status_rx = controller.subscribe();

    let pb = ProgressBar::new(1000);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {percent:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );

    loop {
        let status = status_rx.borrow_and_update().clone();
        render(&pb, &status);
        if status.state.is_terminal() {
            break;
        }

        tokio::select! {
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                pb.set_message("Cancelling...");
                handle.cancel();
            }
        }
    }
    pb.finish_and_clear();

    match handle.wait().await {
        Ok(output) => Ok(output),
        Err(Error::Cancelled) => {
            println!("{}", "[CANCELLED] Partial output removed".yellow());
            Err(Error::Cancelled)
        }
        Err(e) => Err(e),
    }
}

fn render(pb: &ProgressBar, status: &JobStatus) {
    let message = match &status.state {
        JobState::Idle => "Waiting".to_string(),
        JobState::Probing => "Probing input".to_string(),
        JobState::EncodingPass1 => "Pass 1/2 (analysis)".to_string(),
        JobState::EncodingPass2 => "Pass 2/2".to_string(),
        JobState::Encoding => "Encoding".to_string(),
        JobState::Done => "Done".to_string(),
        JobState::Failed { message, .. } => format!("Failed: {}", message),
        JobState::Cancelled => "Cancelled".to_string(),
    };
    let message = match status.bitrate_kbps {
        Some(kbps) if status.state.is_active() => format!("{} @ {:.0} kbps", message, kbps),
        _ => message,
    };
    pb.set_message(message);
    pb.set_position((status.progress.fraction() * 1000.0).round() as u64);
}

/// Print the output path and its size against the requested target.
pub fn print_output(output: &Path, target_mb: Option<f64>) {
    println!("{} {}", "[OK] Output:".bold().green(), output.display());

    let Ok(meta) = std::fs::metadata(output) else {
        return;
    };
    let size_mb = meta.len() as f64 / 1_000_000.0;
    match target_mb {
        Some(target) if size_mb > target => println!(
            "  {} {:.2} MB (target {:.2} MB), try --conservative",
            "Size:".bold().yellow(),
            size_mb,
            target
        ),
        _ => println!("  {} {:.2} MB", "Size:".bold(), size_mb),
    }
}
