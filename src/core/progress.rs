//! Listener for ffmpeg's `-progress` stream.
//!
//! ffmpeg connects to a loopback TCP endpoint and writes `key=value` lines.
//! The listener accepts exactly one connection and publishes the latest
//! progress on a single-slot watch channel.

use crate::models::job::Progress;
use crate::Result;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Sender half shared by every pass of a job.
pub type ProgressSender = Arc<watch::Sender<Progress>>;

/// Bytes of trailing data kept between reads.
const TAIL_KEEP: usize = 256;

/// Incremental scanner over the progress byte stream.
#[derive(Debug)]
pub struct ProgressScanner {
    total_secs: f64,
    out_time: Option<Regex>,
    buffer: String,
    latest: Progress,
}

impl ProgressScanner {
    pub fn new(total_secs: f64) -> Self {
        Self {
            total_secs,
            out_time: Regex::new(r"out_time_ms=(\d+)").ok(),
            buffer: String::new(),
            latest: Progress::Starting,
        }
    }

    /// Feed a chunk and return the progress after it.
    pub fn feed(&mut self, chunk: &[u8]) -> Progress {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));

        if self.buffer.contains("progress=end") {
            self.latest = Progress::Complete;
            return self.latest;
        }

        // Only count values terminated by a newline; a chunk may end mid-number.
        let complete = match self.buffer.rfind('\n') {
            Some(idx) => &self.buffer[..idx],
            None => "",
        };
        if let Some(micros) = self
            .out_time
            .as_ref()
            .and_then(|re| re.captures_iter(complete).last())
            .and_then(|c| c[1].parse::<u64>().ok())
        {
            self.latest = Progress::Fraction(self.fraction(micros));
        }

        self.trim();
        self.latest
    }

    pub fn latest(&self) -> Progress {
        self.latest
    }

    fn fraction(&self, micros: u64) -> f64 {
        if self.total_secs <= 0.0 {
            return 0.0;
        }
        (micros as f64 / 1_000_000.0 / self.total_secs).clamp(0.0, 1.0)
    }

    fn trim(&mut self) {
        if self.buffer.len() <= TAIL_KEEP * 4 {
            return;
        }
        let mut cut = self.buffer.len() - TAIL_KEEP;
        while !self.buffer.is_char_boundary(cut) {
            cut += 1;
        }
        self.buffer.drain(..cut);
    }
}

/// A bound progress endpoint with its reader task.
///
/// Dropping the listener stops the task.
pub struct ProgressListener {
    url: String,
    task: Option<JoinHandle<()>>,
}

impl ProgressListener {
    /// Bind on an OS-assigned loopback port and start waiting for ffmpeg.
    pub async fn bind(total_secs: f64, tx: ProgressSender) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let url = format!("tcp://{}", addr);
        tracing::debug!("Progress listener on {}", url);

        let task = tokio::spawn(async move {
            let (mut conn, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::warn!("Progress accept error: {}", e);
                    return;
                }
            };
            drop(listener);
            tracing::debug!("Progress stream connected from {}", peer);

            let mut scanner = ProgressScanner::new(total_secs);
            tx.send_replace(Progress::Starting);
            let mut buf = [0u8; 1024];
            loop {
                let n = match conn.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => n,
                };
                let progress = scanner.feed(&buf[..n]);
                tx.send_if_modified(|current| {
                    if *current != progress {
                        tracing::trace!("progress: {}", progress);
                        *current = progress;
                        true
                    } else {
                        false
                    }
                });
            }
        });

        Ok(Self {
            url,
            task: Some(task),
        })
    }

    /// Endpoint to hand to `-progress`.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Give the reader a moment to drain the final lines after ffmpeg exits.
    pub async fn finish(mut self, grace: Duration) {
        if let Some(task) = self.task.take() {
            let abort = task.abort_handle();
            if tokio::time::timeout(grace, task).await.is_err() {
                abort.abort();
            }
        }
    }
}

impl Drop for ProgressListener {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
