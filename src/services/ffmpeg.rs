//! FFmpeg process service.

use crate::{Error, Result};
use std::ffi::OsString;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::watch;

/// How an ffmpeg invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    Failed(ExitStatus),
    Cancelled,
}

/// Check if ffmpeg is installed.
pub async fn is_installed(ffmpeg: &Path) -> bool {
    Command::new(ffmpeg)
        .arg("-version")
        .output()
        .await
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Get ffmpeg version.
pub async fn get_version(ffmpeg: &Path) -> Result<String> {
    let output = Command::new(ffmpeg).arg("-version").output().await?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let first_line = stdout.lines().next().unwrap_or("unknown");

    Ok(first_line.to_string())
}

/// Run ffmpeg in `work_dir` until it exits or `cancel` turns true.
///
/// stderr is forwarded to the debug log line by line. On cancellation the
/// child is killed before returning.
pub async fn run(
    ffmpeg: &Path,
    work_dir: &Path,
    args: &[OsString],
    cancel: &mut watch::Receiver<bool>,
) -> Result<RunOutcome> {
    tracing::debug!(
        "Running {} {}",
        ffmpeg.display(),
        args.iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    );

    if !work_dir.is_dir() {
        return Err(Error::other(format!(
            "work directory {} does not exist",
            work_dir.display()
        )));
    }

    let mut child = Command::new(ffmpeg)
        .args(args)
        .current_dir(work_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::DependencyMissing(ffmpeg.display().to_string())
            } else {
                Error::Io(e)
            }
        })?;

    let stderr_task = child.stderr.take().map(|stderr| {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if !line.trim().is_empty() {
                    tracing::debug!("ffmpeg: {}", line.trim());
                }
            }
        })
    });

    let outcome = tokio::select! {
        status = child.wait() => {
            let status = status?;
            if status.success() {
                RunOutcome::Success
            } else {
                RunOutcome::Failed(status)
            }
        }
        _ = cancelled(cancel) => {
            tracing::info!("Cancelling ffmpeg");
            if let Err(e) = child.kill().await {
                tracing::warn!("Failed to kill ffmpeg: {}", e);
            }
            RunOutcome::Cancelled
        }
    };

    if let Some(task) = stderr_task {
        // A killed child may leave grandchildren holding the pipe open.
        if outcome == RunOutcome::Cancelled {
            task.abort();
        } else {
            let _ = task.await;
        }
    }

    Ok(outcome)
}

/// Resolve once the cancel flag is set. Never resolves if the sender is gone.
pub async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
