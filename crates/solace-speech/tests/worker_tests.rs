// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! TtsWorker against a shell script speaking the frame protocol.
#![cfg(unix)]

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use solace_core::traits::{PluginAdapter, SpeechAdapter};
use solace_core::types::HealthStatus;
use solace_speech::{stream_audio, ProcessState, TtsWorker};
use tokio_util::sync::CancellationToken;

/// Frame lengths are written as octal escapes: 17 = \021, 15 = \017,
/// 22 = \026, 4 = \004.
const FAKE_WORKER: &str = r#"
while IFS= read -r line; do
  case "$line" in
    *ping*) printf '\000\000\000\021{"status":"pong"}' ;;
    *crash*) exit 1 ;;
    *boom*) printf '\000\000\000\026{"error":"cannot say"}' ;;
    *hang*) sleep 5 ;;
    *synthesize*) printf '\000\000\000\017{"status":"ok"}\000\000\000\004RIFF' ;;
  esac
done
"#;

fn worker(script: &str) -> TtsWorker {
    TtsWorker::new(
        "sh",
        vec!["-c".into(), script.into()],
        Duration::from_secs(2),
        Duration::from_millis(500),
    )
}

#[tokio::test]
async fn handshake_then_synthesize() {
    let w = worker(FAKE_WORKER);
    assert_eq!(w.state().await, ProcessState::Pending);

    w.ensure_ready().await.unwrap();
    assert_eq!(w.state().await, ProcessState::Running);
    assert_eq!(w.health_check().await.unwrap(), HealthStatus::Healthy);

    assert_eq!(w.synthesize("Hello.").await.unwrap(), b"RIFF".to_vec());
    assert_eq!(w.synthesize("Again.").await.unwrap(), b"RIFF".to_vec());
    w.shutdown().await.unwrap();
    assert_eq!(w.state().await, ProcessState::Stopped);
}

#[tokio::test]
async fn error_frame_keeps_worker_running() {
    let w = worker(FAKE_WORKER);
    let err = w.synthesize("boom").await.unwrap_err();
    assert!(err.to_string().contains("cannot say"), "{err}");
    assert_eq!(w.state().await, ProcessState::Running);
    assert_eq!(w.synthesize("fine").await.unwrap(), b"RIFF".to_vec());
}

#[tokio::test]
async fn crashed_worker_restarts_on_next_call() {
    let w = worker(FAKE_WORKER);
    w.ensure_ready().await.unwrap();
    assert!(w.synthesize("crash").await.is_err());
    assert_eq!(w.state().await, ProcessState::Failed);

    assert_eq!(w.synthesize("recovered").await.unwrap(), b"RIFF".to_vec());
    assert_eq!(w.state().await, ProcessState::Running);
}

#[tokio::test]
async fn hung_request_times_out_and_fails_worker() {
    let w = worker(FAKE_WORKER);
    let err = w.synthesize("hang").await.unwrap_err();
    assert!(err.is_timeout(), "{err}");
    assert_eq!(w.state().await, ProcessState::Failed);
}

#[tokio::test]
async fn silent_worker_fails_handshake() {
    let w = TtsWorker::new(
        "sh",
        vec!["-c".into(), "sleep 5".into()],
        Duration::from_millis(200),
        Duration::from_secs(1),
    );
    let err = w.ensure_ready().await.unwrap_err();
    assert!(err.is_timeout(), "{err}");
    assert_eq!(w.state().await, ProcessState::Failed);
}

#[tokio::test]
async fn missing_executable_is_a_speech_error() {
    let w = TtsWorker::new(
        "/nonexistent/tts-worker",
        Vec::new(),
        Duration::from_secs(1),
        Duration::from_secs(1),
    );
    let err = w.ensure_ready().await.unwrap_err();
    assert!(err.to_string().contains("failed to spawn"), "{err}");
}

#[tokio::test]
async fn audio_stream_over_real_worker() {
    let w: Arc<dyn SpeechAdapter> = Arc::new(worker(FAKE_WORKER));
    let s = stream_audio(w, "First sentence. Second one!", 3, CancellationToken::new());
    let bytes: Vec<u8> = s
        .map(|r| r.unwrap())
        .collect::<Vec<_>>()
        .await
        .concat();
    assert_eq!(bytes, b"RIFFRIFF".to_vec());
}

/// Answers "Slow" after a delay with SLOW, anything else at once with FAST.
const SLOW_WORKER: &str = r#"
while IFS= read -r line; do
  case "$line" in
    *ping*) printf '\000\000\000\021{"status":"pong"}' ;;
    *Slow*) sleep 0.3; printf '\000\000\000\017{"status":"ok"}\000\000\000\004SLOW' ;;
    *synthesize*) printf '\000\000\000\017{"status":"ok"}\000\000\000\004FAST' ;;
  esac
done
"#;

#[tokio::test]
async fn cancelled_synthesis_does_not_leak_into_next_reply() {
    let w = Arc::new(worker(SLOW_WORKER));
    w.ensure_ready().await.unwrap();

    let cancel = CancellationToken::new();
    let speech: Arc<dyn SpeechAdapter> = w.clone();
    let mut s = stream_audio(speech, "Slow one.", 1024, cancel.clone());
    let canceller = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        })
    };
    assert!(s.next().await.is_none());
    canceller.await.unwrap();
    drop(s);

    assert_eq!(w.synthesize("Fast one.").await.unwrap(), b"FAST".to_vec());
    assert_eq!(w.state().await, ProcessState::Running);
    assert_eq!(w.synthesize("Again.").await.unwrap(), b"FAST".to_vec());
}
