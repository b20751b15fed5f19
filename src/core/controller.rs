//! Job controller.
//!
//! Owns the single encode slot and the job state machine:
//!
//! ```text
//! Idle -> Probing -> EncodingPass1 -> EncodingPass2 -> Done
//!                 \-> Encoding ----------------------/
//! any active state -> Failed | Cancelled
//! ```
//!
//! The presentation layer reads immutable [`JobStatus`] snapshots and never
//! touches the state directly.

use crate::core::command::Pass;
use crate::core::encoder::Encoder;
use crate::core::progress::ProgressSender;
use crate::models::config::Config;
use crate::models::job::{EncodeRequest, FailureKind, JobState, JobStatus, Progress};
use crate::services::{ffmpeg, ffprobe};
use crate::{Error, Result};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// The job currently holding the encode slot.
struct ActiveJob {
    id: String,
    cancel: Arc<watch::Sender<bool>>,
}

/// Handle to a started job.
pub struct JobHandle {
    id: String,
    cancel: Arc<watch::Sender<bool>>,
    task: JoinHandle<Result<PathBuf>>,
}

impl JobHandle {
    /// Job ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Request cancellation. The running ffmpeg process is killed.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Wait for the job to finish and return the output path.
    pub async fn wait(self) -> Result<PathBuf> {
        self.task
            .await
            .map_err(|e| Error::other(format!("encode task failed: {}", e)))?
    }
}

/// Single-slot encode controller.
#[derive(Clone)]
pub struct Controller {
    ffprobe: PathBuf,
    encoder: Encoder,
    status: Arc<watch::Sender<JobStatus>>,
    active: Arc<Mutex<Option<ActiveJob>>>,
}

impl Controller {
    /// Create an idle controller.
    pub fn new(config: &Config) -> Self {
        let (status, _) = watch::channel(JobStatus::default());
        Self {
            ffprobe: config.tools.ffprobe.clone(),
            encoder: Encoder::new(config),
            status: Arc::new(status),
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Latest status snapshot.
    pub fn snapshot(&self) -> JobStatus {
        self.status.borrow().clone()
    }

    /// Receiver notified on every status change.
    pub fn subscribe(&self) -> watch::Receiver<JobStatus> {
        self.status.subscribe()
    }

    /// Whether a job holds the encode slot.
    pub async fn is_busy(&self) -> bool {
        self.active.lock().await.is_some()
    }

    /// Start a job in the background.
    ///
    /// Fails with [`Error::Busy`] while another job is running.
    pub async fn start(&self, request: EncodeRequest) -> Result<JobHandle> {
        let mut active = self.active.lock().await;
        if let Some(job) = active.as_ref() {
            tracing::warn!("Rejecting new encode, job {} is still running", job.id);
            return Err(Error::Busy);
        }

        let id = Uuid::new_v4().to_string();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let cancel = Arc::new(cancel_tx);
        *active = Some(ActiveJob {
            id: id.clone(),
            cancel: cancel.clone(),
        });
        self.status.send_replace(JobStatus {
            id: Some(id.clone()),
            state: JobState::Probing,
            progress: Progress::Starting,
            input: Some(request.input.clone()),
            output: None,
            bitrate_kbps: None,
            started_at: Some(Utc::now()),
        });
        drop(active);
        tracing::info!("Job {} started for {}", id, request.input.display());

        let controller = self.clone();
        let job_id = id.clone();
        let task = tokio::spawn(async move {
            let result = controller.run(request, cancel_rx).await;
            controller.finish(&job_id, &result).await;
            result
        });

        Ok(JobHandle { id, cancel, task })
    }

    /// Cancel the running job, if any. Returns whether a job was signalled.
    pub async fn cancel(&self) -> bool {
        match self.active.lock().await.as_ref() {
            Some(job) => {
                tracing::info!("Cancelling job {}", job.id);
                job.cancel.send_replace(true);
                true
            }
            None => false,
        }
    }

    /// Return a finished job's status to idle, as when a result dialog is dismissed.
    pub fn dismiss(&self) {
        self.status.send_if_modified(|status| {
            if status.state.is_terminal() {
                *status = JobStatus::default();
                true
            } else {
                false
            }
        });
    }

    async fn run(
        &self,
        request: EncodeRequest,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<PathBuf> {
        let kind = request.codec.required_kind();
        let info = tokio::select! {
            info = ffprobe::probe(&self.ffprobe, &request.input, kind) => info?,
            _ = ffmpeg::cancelled(&mut cancel) => return Err(Error::Cancelled),
        };

        let plan = self.encoder.prepare(&request, &info)?;
        self.status.send_modify(|status| {
            status.output = Some(plan.output.clone());
            status.bitrate_kbps = plan.bitrate_kbps;
        });

        let (progress_tx, progress_rx) = watch::channel(Progress::Starting);
        let progress: ProgressSender = Arc::new(progress_tx);
        let forwarder = self.forward_progress(progress_rx);

        let status = self.status.clone();
        let result = self
            .encoder
            .encode(&plan, progress, &mut cancel, |pass| {
                let state = match pass {
                    Pass::First => JobState::EncodingPass1,
                    Pass::Second => JobState::EncodingPass2,
                    Pass::Single => JobState::Encoding,
                };
                status.send_modify(|s| {
                    s.state = state;
                    s.progress = Progress::Starting;
                });
            })
            .await;

        let _ = forwarder.await;
        result
    }

    /// Copy job progress into the status snapshot until the job drops its sender.
    fn forward_progress(&self, mut rx: watch::Receiver<Progress>) -> JoinHandle<()> {
        let status = self.status.clone();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let progress = *rx.borrow_and_update();
                status.send_modify(|s| s.progress = progress);
            }
        })
    }

    async fn finish(&self, id: &str, result: &Result<PathBuf>) {
        let state = match result {
            Ok(output) => {
                tracing::info!("Job {} done: {}", id, output.display());
                JobState::Done
            }
            Err(Error::Cancelled) => {
                tracing::info!("Job {} cancelled", id);
                JobState::Cancelled
            }
            Err(e) => {
                tracing::error!("Job {} failed: {}", id, e);
                JobState::Failed {
                    kind: FailureKind::from(e),
                    message: e.to_string(),
                }
            }
        };

        // Publish before freeing the slot; the next start() must come after.
        let mut active = self.active.lock().await;
        self.status.send_if_modified(|status| {
            if status.id.as_deref() != Some(id) {
                return false;
            }
            status.state = state;
            if matches!(status.state, JobState::Done) {
                status.progress = Progress::Complete;
            }
            true
        });
        if active.as_ref().map(|job| job.id.as_str()) == Some(id) {
            *active = None;
        }
    }
}
