//! Integration tests for the job controller.
//!
//! Tests cover:
//! - State transitions of a successful job
//! - Rejection of a second job while one is running
//! - Cancellation and cleanup
//! - Status ownership when jobs start back to back

#![cfg(unix)]

mod common;

use common::{FailAt, Sandbox};
use discord_media_tool::core::controller::Controller;
use discord_media_tool::models::job::{
    Codec, EncodeRequest, FailureKind, JobState, Progress, Target,
};
use discord_media_tool::Error;
use std::time::Duration;

/// Wait until the controller reports `wanted`, collecting every state seen.
async fn wait_for_state(controller: &Controller, wanted: JobState) -> Vec<JobState> {
    let mut rx = controller.subscribe();
    let mut seen = Vec::new();
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let state = rx.borrow_and_update().state.clone();
            if seen.last() != Some(&state) {
                seen.push(state.clone());
            }
            if state == wanted {
                return;
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .expect("controller never reached the wanted state");
    seen
}

#[tokio::test]
async fn test_successful_job_reaches_done() {
    let sandbox = Sandbox::new(common::VIDEO_JSON);
    let controller = Controller::new(&sandbox.config());
    assert_eq!(controller.snapshot().state, JobState::Idle);

    let request = EncodeRequest::new(&sandbox.input, Codec::Vp9, Target::SizeMb(10.0));
    let handle = controller.start(request).await.unwrap();
    let output = handle.wait().await.unwrap();

    let status = controller.snapshot();
    assert_eq!(status.state, JobState::Done);
    assert_eq!(status.progress, Progress::Complete);
    assert_eq!(status.output.as_deref(), Some(output.as_path()));
    assert!(status.bitrate_kbps.unwrap() > 0.0);
    assert!(status.started_at.is_some());
    assert!(!controller.is_busy().await);

    controller.dismiss();
    assert_eq!(controller.snapshot().state, JobState::Idle);
}

#[tokio::test]
async fn test_failed_probe_reports_file_invalid() {
    let sandbox = Sandbox::new(common::SILENT_VIDEO_JSON);
    let controller = Controller::new(&sandbox.config());

    let request = EncodeRequest::new(&sandbox.input, Codec::Mp3, Target::BitrateKbps(128.0));
    let err = controller.start(request).await.unwrap().wait().await.unwrap_err();

    assert!(matches!(err, Error::FileInvalid(_)));
    match controller.snapshot().state {
        JobState::Failed { kind, .. } => assert_eq!(kind, FailureKind::FileInvalid),
        other => panic!("Expected Failed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_first_pass_reports_encode_failure() {
    let sandbox = Sandbox::with_ffmpeg(common::VIDEO_JSON, FailAt::Pass(1), false, true);
    let controller = Controller::new(&sandbox.config());

    let request = EncodeRequest::new(&sandbox.input, Codec::H264, Target::SizeMb(10.0));
    let err = controller.start(request).await.unwrap().wait().await.unwrap_err();

    assert!(matches!(err, Error::EncodeFailure { pass: 1, .. }));
    match controller.snapshot().state {
        JobState::Failed { kind, .. } => assert_eq!(kind, FailureKind::EncodeFailure),
        other => panic!("Expected Failed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_second_start_is_rejected_and_cancel_cleans_up() {
    let sandbox = Sandbox::with_ffmpeg(common::VIDEO_JSON, FailAt::Never, true, true);
    let controller = Controller::new(&sandbox.config());

    let request = EncodeRequest::new(&sandbox.input, Codec::H264, Target::SizeMb(10.0));
    let handle = controller.start(request.clone()).await.unwrap();

    let seen = wait_for_state(&controller, JobState::EncodingPass1).await;
    assert!(!seen.contains(&JobState::EncodingPass2));
    assert!(controller.is_busy().await);

    assert!(matches!(controller.start(request).await, Err(Error::Busy)));

    // Give the fake encoder time to write its pass logs before cancelling.
    tokio::time::timeout(Duration::from_secs(5), async {
        while !sandbox.passlog().exists() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap();

    assert!(controller.cancel().await);
    let err = tokio::time::timeout(Duration::from_secs(10), handle.wait())
        .await
        .unwrap()
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert_eq!(controller.snapshot().state, JobState::Cancelled);
    assert!(!sandbox.passlog().exists());
    assert!(!sandbox.mbtree().exists());
    assert_eq!(sandbox.invocations().len(), 1);
    assert!(!controller.is_busy().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_back_to_back_jobs_keep_their_own_status() {
    let failing = Sandbox::new(common::SILENT_VIDEO_JSON);
    let controller = Controller::new(&failing.config());

    for _ in 0..20 {
        let request = EncodeRequest::new(&failing.input, Codec::Mp3, Target::BitrateKbps(128.0));
        let first = controller.start(request).await.unwrap();
        let first_id = first.id().to_string();

        // Retry until the first job frees the slot, then start the next one.
        let request = EncodeRequest::new(&failing.input, Codec::Mp3, Target::BitrateKbps(128.0));
        let second = loop {
            match controller.start(request.clone()).await {
                Ok(handle) => break handle,
                Err(Error::Busy) => tokio::task::yield_now().await,
                Err(e) => panic!("unexpected start error: {}", e),
            }
        };

        let status = controller.snapshot();
        assert_eq!(status.id.as_deref(), Some(second.id()));
        assert_ne!(status.id.as_deref(), Some(first_id.as_str()));
        assert_ne!(status.state, JobState::Idle);

        assert!(first.wait().await.is_err());
        assert_eq!(controller.snapshot().id.as_deref(), Some(second.id()));
        assert!(second.wait().await.is_err());
    }
}

#[tokio::test]
async fn test_cancel_while_probing_stops_ffprobe() {
    let sandbox = Sandbox::new(common::VIDEO_JSON);
    let pid_file = sandbox.hang_ffprobe();
    let controller = Controller::new(&sandbox.config());

    let request = EncodeRequest::new(&sandbox.input, Codec::H264, Target::SizeMb(10.0));
    let handle = controller.start(request).await.unwrap();

    let pid: u32 = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Ok(text) = std::fs::read_to_string(&pid_file) {
                if let Ok(pid) = text.trim().parse() {
                    return pid;
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap();
    assert_eq!(controller.snapshot().state, JobState::Probing);

    assert!(controller.cancel().await);
    let err = tokio::time::timeout(Duration::from_secs(10), handle.wait())
        .await
        .unwrap()
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert_eq!(controller.snapshot().state, JobState::Cancelled);

    let stopped = tokio::time::timeout(Duration::from_secs(5), async {
        while common::process_alive(pid) {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await;
    assert!(stopped.is_ok(), "ffprobe {} still running after cancel", pid);
    assert!(sandbox.invocations().is_empty());
}

#[tokio::test]
async fn test_cancel_without_job() {
    let sandbox = Sandbox::new(common::VIDEO_JSON);
    let controller = Controller::new(&sandbox.config());
    assert!(!controller.cancel().await);
}
