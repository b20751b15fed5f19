//! Encode orchestration.
//!
//! Turns an [`EncodeRequest`] plus probe results into an [`EncodePlan`] and
//! runs its ffmpeg passes in sequence:
//! - two-pass video: analysis pass, then the real encode, then log cleanup
//! - audio and GIF: a single pass

use crate::core::bitrate;
use crate::core::command::{EncodePlan, Pass, PASSLOG_FILES};
use crate::core::progress::{ProgressListener, ProgressSender};
use crate::models::config::{BitratePolicy, Config, EncodingConfig};
use crate::models::job::{CodecFamily, EncodeRequest, Progress, Target};
use crate::models::media::MediaInfo;
use crate::services::ffmpeg::{self, RunOutcome};
use crate::utils::fs;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::watch;

/// How long to wait for the progress reader after ffmpeg exits.
const PROGRESS_GRACE: Duration = Duration::from_millis(250);

/// Runs ffmpeg passes for a plan.
#[derive(Debug, Clone)]
pub struct Encoder {
    ffmpeg: PathBuf,
    work_dir: PathBuf,
    encoding: EncodingConfig,
    policy: BitratePolicy,
}

impl Encoder {
    /// Create an encoder from the application configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            ffmpeg: config.tools.ffmpeg.clone(),
            work_dir: config.tools.work_dir.clone(),
            encoding: config.encoding.clone(),
            policy: config.bitrate,
        }
    }

    /// Directory ffmpeg runs in.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Resolve bitrate, output path and flags for a probed request.
    pub fn prepare(&self, request: &EncodeRequest, info: &MediaInfo) -> Result<EncodePlan> {
        let kind = request.codec.required_kind();
        let duration_secs = info.duration_secs().ok_or_else(|| {
            Error::file_invalid(format!(
                "{} has no {} stream",
                request.input.display(),
                kind
            ))
        })?;

        let input = std::fs::canonicalize(&request.input).map_err(|e| {
            Error::file_invalid(format!("{}: {}", request.input.display(), e))
        })?;
        let output = fs::output_path(&input, request.codec);

        let family = request.codec.family();
        let bitrate_kbps = match (family, request.target) {
            (CodecFamily::Gif, _) => None,
            (CodecFamily::TwoPassVideo, Target::SizeMb(size)) => {
                let total = bitrate::target_bitrate_kbps(
                    size,
                    duration_secs,
                    request.conservative,
                    self.policy,
                )?;
                Some(bitrate::video_bitrate_kbps(
                    total,
                    self.encoding.audio_bitrate_kbps,
                    self.encoding.reserve_audio,
                )?)
            }
            (CodecFamily::Audio, Target::SizeMb(size)) => Some(bitrate::target_bitrate_kbps(
                size,
                duration_secs,
                request.conservative,
                self.policy,
            )?),
            (_, Target::BitrateKbps(kbps)) => {
                if !(kbps.is_finite() && kbps > 0.0) {
                    return Err(Error::ParseFailure(format!("bitrate {}", kbps)));
                }
                Some(bitrate::ensure_encodable(kbps)?)
            }
            (_, Target::None) => {
                return Err(Error::ParseFailure(format!(
                    "{} needs a size or bitrate target",
                    request.codec
                )));
            }
        };

        let size_limit_bytes = match (family, request.target) {
            (CodecFamily::TwoPassVideo, Target::SizeMb(size)) if request.size_limit => {
                Some(bitrate::size_limit_bytes(size))
            }
            _ => None,
        };

        tracing::info!(
            "Planned {} encode of {} ({:.2}s) -> {}",
            request.codec,
            input.display(),
            duration_secs,
            output.display()
        );
        if let Some(kbps) = bitrate_kbps {
            tracing::info!("Target bitrate: {:.1} kbps", kbps);
        }

        Ok(EncodePlan {
            input,
            output,
            codec: request.codec,
            bitrate_kbps,
            audio_bitrate_kbps: self.encoding.audio_bitrate_kbps,
            size_limit_bytes,
            duration_secs,
            x264_preset: self.encoding.x264_preset.clone(),
            vp9_deadline: self.encoding.vp9_deadline.clone(),
        })
    }

    /// Run every pass of `plan`.
    ///
    /// `on_pass` is called before each pass starts. If a pass fails the
    /// remaining passes are skipped and nothing is cleaned up. On cancel the
    /// partial output and two-pass logs are removed.
    pub async fn encode<F>(
        &self,
        plan: &EncodePlan,
        progress: ProgressSender,
        cancel: &mut watch::Receiver<bool>,
        mut on_pass: F,
    ) -> Result<PathBuf>
    where
        F: FnMut(Pass),
    {
        for &pass in plan.passes() {
            on_pass(pass);
            progress.send_replace(Progress::Starting);

            let listener = ProgressListener::bind(plan.duration_secs, progress.clone()).await?;
            let args = plan.args(pass, listener.url());
            let outcome = ffmpeg::run(&self.ffmpeg, &self.work_dir, &args, cancel).await?;

            match outcome {
                RunOutcome::Success => {
                    listener.finish(PROGRESS_GRACE).await;
                    tracing::info!("Pass {} done", pass.number());
                }
                RunOutcome::Failed(status) => {
                    tracing::error!(
                        "Error occurred while performing pass {}: {}",
                        pass.number(),
                        status
                    );
                    return Err(Error::EncodeFailure {
                        pass: pass.number(),
                        status: status.to_string(),
                    });
                }
                RunOutcome::Cancelled => {
                    drop(listener);
                    self.discard(plan);
                    return Err(Error::Cancelled);
                }
            }
        }

        if plan.codec.family() == CodecFamily::TwoPassVideo {
            self.cleanup_passlogs();
        }
        progress.send_replace(Progress::Complete);

        Ok(plan.output.clone())
    }

    /// Remove the two-pass statistics files. Failures are logged only.
    pub fn cleanup_passlogs(&self) {
        for name in PASSLOG_FILES {
            fs::remove_transient(&self.work_dir.join(name));
        }
    }

    fn discard(&self, plan: &EncodePlan) {
        if plan.output.exists() {
            tracing::info!("Removing partial output {}", plan.output.display());
            fs::remove_transient(&plan.output);
        }
        self.cleanup_passlogs();
    }
}
