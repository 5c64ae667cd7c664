// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent TTS worker speaking the framed protocol in [`crate::codec`].

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use solace_config::model::SpeechConfig;
use solace_core::error::SolaceError;
use solace_core::traits::{PluginAdapter, SpeechAdapter};
use solace_core::types::{AdapterType, HealthStatus};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::codec::{read_frame, ControlFrame, WorkerRequest};
use crate::process::{ProcessState, WorkerProcess};

struct WorkerIo {
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl WorkerIo {
    async fn send(&mut self, request: &WorkerRequest) -> Result<(), SolaceError> {
        let line = request.to_line()?;
        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| SolaceError::Speech {
                message: format!("failed to write to worker: {e}"),
                source: Some(Box::new(e)),
            })?;
        self.stdin.flush().await.map_err(|e| SolaceError::Speech {
            message: format!("failed to flush worker stdin: {e}"),
            source: Some(Box::new(e)),
        })
    }

    async fn control(&mut self) -> Result<ControlFrame, SolaceError> {
        ControlFrame::parse(&read_frame(&mut self.stdout).await?)
    }
}

struct Inner {
    process: WorkerProcess,
    io: Option<WorkerIo>,
    /// Set while a request/reply exchange is on the pipes. Still set on the
    /// next call means the exchange was dropped half way and the pipes are
    /// out of sync.
    in_flight: bool,
}

enum Failure {
    /// The worker answered with an error frame. The pipe is still in sync.
    Reported(SolaceError),
    /// I/O, protocol or timeout failure. The worker must be restarted.
    Broken(SolaceError),
}

/// A long-lived speech worker process.
///
/// Started lazily by [`ensure_ready`](SpeechAdapter::ensure_ready). Any
/// transport failure drops the process so the next call starts a new one.
pub struct TtsWorker {
    command: String,
    args: Vec<String>,
    handshake_timeout: Duration,
    request_timeout: Duration,
    inner: Mutex<Inner>,
}

impl TtsWorker {
    pub fn new(
        command: impl Into<String>,
        args: Vec<String>,
        handshake_timeout: Duration,
        request_timeout: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            args,
            handshake_timeout,
            request_timeout,
            inner: Mutex::new(Inner {
                process: WorkerProcess::new("tts"),
                io: None,
                in_flight: false,
            }),
        }
    }

    pub fn from_config(config: &SpeechConfig) -> Result<Self, SolaceError> {
        let command = config
            .command
            .clone()
            .ok_or_else(|| SolaceError::Config("speech.command is required".into()))?;
        Ok(Self::new(
            command,
            config.args.clone(),
            Duration::from_secs(config.handshake_timeout_secs),
            Duration::from_secs(config.request_timeout_secs),
        ))
    }

    pub async fn state(&self) -> ProcessState {
        self.inner.lock().await.process.state()
    }

    async fn start(&self, inner: &mut Inner) -> Result<(), SolaceError> {
        if inner.in_flight {
            warn!("previous speech exchange was abandoned, restarting worker");
            inner.io = None;
            inner.process.fail();
            inner.in_flight = false;
        }
        if inner.process.state() == ProcessState::Running && inner.process.is_alive() {
            return Ok(());
        }
        if inner.process.state() == ProcessState::Running {
            warn!("speech worker exited, restarting");
            inner.process.fail();
        }
        if inner.process.state().is_terminal() {
            inner.process.transition(ProcessState::Pending)?;
        }
        inner.io = None;

        let child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SolaceError::Speech {
                message: format!("failed to spawn speech worker `{}`: {e}", self.command),
                source: Some(Box::new(e)),
            })?;
        inner.process.attach(child)?;
        inner.in_flight = true;

        let io = inner.process.child_mut().and_then(|child| {
            let stdin = child.stdin.take()?;
            let stdout = child.stdout.take()?;
            Some(WorkerIo {
                stdin,
                stdout: BufReader::new(stdout),
            })
        });
        let Some(mut io) = io else {
            inner.in_flight = false;
            inner.process.fail();
            return Err(SolaceError::Speech {
                message: "speech worker stdio was not piped".into(),
                source: None,
            });
        };

        let handshake = async {
            io.send(&WorkerRequest::Ping).await?;
            io.control().await?.expect_status("pong")
        };
        let result = match tokio::time::timeout(self.handshake_timeout, handshake).await {
            Ok(r) => r,
            Err(_) => Err(SolaceError::Timeout {
                duration: self.handshake_timeout,
            }),
        };
        inner.in_flight = false;

        match result {
            Ok(()) => {
                inner.process.transition(ProcessState::Running)?;
                inner.io = Some(io);
                info!(command = %self.command, "speech worker ready");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "speech worker handshake failed");
                inner.process.fail();
                Err(e)
            }
        }
    }

    async fn request(&self, inner: &mut Inner, text: &str) -> Result<Vec<u8>, Failure> {
        let Some(io) = inner.io.as_mut() else {
            return Err(Failure::Broken(SolaceError::Internal(
                "speech worker has no pipes".into(),
            )));
        };

        let exchange = async {
            io.send(&WorkerRequest::Synthesize {
                text: text.to_string(),
            })
            .await
            .map_err(Failure::Broken)?;
            let control = io.control().await.map_err(Failure::Broken)?;
            if let Some(error) = &control.error {
                // No audio frame follows an error frame.
                return Err(Failure::Reported(SolaceError::Speech {
                    message: format!("worker error: {error}"),
                    source: None,
                }));
            }
            control.expect_status("ok").map_err(Failure::Broken)?;
            read_frame(&mut io.stdout).await.map_err(Failure::Broken)
        };

        inner.in_flight = true;
        let result = match tokio::time::timeout(self.request_timeout, exchange).await {
            Ok(r) => r,
            Err(_) => Err(Failure::Broken(SolaceError::Timeout {
                duration: self.request_timeout,
            })),
        };
        inner.in_flight = false;
        result
    }
}

#[async_trait]
impl PluginAdapter for TtsWorker {
    fn name(&self) -> &str {
        "tts-worker"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Speech
    }

    async fn health_check(&self) -> Result<HealthStatus, SolaceError> {
        let mut inner = self.inner.lock().await;
        let state = inner.process.state();
        Ok(match state {
            ProcessState::Running if inner.process.is_alive() => HealthStatus::Healthy,
            ProcessState::Running => HealthStatus::Unhealthy("worker exited".into()),
            ProcessState::Failed => HealthStatus::Degraded("worker failed, restarts on next use".into()),
            other => HealthStatus::Degraded(format!("worker {other}")),
        })
    }

    async fn shutdown(&self) -> Result<(), SolaceError> {
        let mut inner = self.inner.lock().await;
        inner.io = None;
        inner.in_flight = false;
        inner.process.kill().await;
        debug!("speech worker stopped");
        Ok(())
    }
}

#[async_trait]
impl SpeechAdapter for TtsWorker {
    async fn ensure_ready(&self) -> Result<(), SolaceError> {
        let mut inner = self.inner.lock().await;
        self.start(&mut inner).await
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SolaceError> {
        let mut inner = self.inner.lock().await;
        self.start(&mut inner).await?;

        match self.request(&mut inner, text).await {
            Ok(audio) => {
                debug!(chars = text.len(), bytes = audio.len(), "sentence synthesized");
                Ok(audio)
            }
            Err(Failure::Reported(e)) => Err(e),
            Err(Failure::Broken(e)) => {
                warn!(error = %e, "speech worker failed, dropping process");
                inner.io = None;
                inner.process.fail();
                Err(e)
            }
        }
    }
}
