// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire format between the companion and its TTS worker.
//!
//! Requests are JSON lines on the worker's stdin. Replies on stdout are
//! frames: a 4-byte big-endian length followed by the payload. Each reply
//! opens with a JSON control frame; a successful synthesis is followed by
//! exactly one audio frame.

use serde::{Deserialize, Serialize};
use solace_core::error::SolaceError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest frame accepted from the worker (64 MiB).
pub const MAX_FRAME_BYTES: usize = 64 * 1024 * 1024;

fn speech_err(message: impl Into<String>) -> SolaceError {
    SolaceError::Speech {
        message: message.into(),
        source: None,
    }
}

fn io_err(context: &str, e: std::io::Error) -> SolaceError {
    SolaceError::Speech {
        message: format!("{context}: {e}"),
        source: Some(Box::new(e)),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WorkerRequest {
    Ping,
    Synthesize { text: String },
}

impl WorkerRequest {
    /// Serializes the request as one newline-terminated JSON line.
    pub fn to_line(&self) -> Result<String, SolaceError> {
        let mut line = serde_json::to_string(self).map_err(|e| SolaceError::Speech {
            message: format!("failed to encode worker request: {e}"),
            source: Some(Box::new(e)),
        })?;
        line.push('\n');
        Ok(line)
    }
}

/// First frame of every reply.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ControlFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ControlFrame {
    pub fn status(status: &str) -> Self {
        Self {
            status: Some(status.to_string()),
            error: None,
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            status: None,
            error: Some(message.to_string()),
        }
    }

    pub fn parse(payload: &[u8]) -> Result<Self, SolaceError> {
        serde_json::from_slice(payload).map_err(|e| SolaceError::Speech {
            message: format!("malformed control frame: {e}"),
            source: Some(Box::new(e)),
        })
    }

    /// Checks the frame answers with `expected`, surfacing worker errors.
    pub fn expect_status(self, expected: &str) -> Result<(), SolaceError> {
        if let Some(error) = self.error {
            return Err(speech_err(format!("worker error: {error}")));
        }
        match self.status.as_deref() {
            Some(s) if s == expected => Ok(()),
            other => Err(speech_err(format!(
                "unexpected worker status {other:?}, wanted {expected:?}"
            ))),
        }
    }
}

pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, SolaceError> {
    let len = reader
        .read_u32()
        .await
        .map_err(|e| io_err("failed to read frame length", e))? as usize;
    if len > MAX_FRAME_BYTES {
        return Err(speech_err(format!(
            "frame of {len} bytes exceeds the {MAX_FRAME_BYTES} byte limit"
        )));
    }
    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|e| io_err("failed to read frame payload", e))?;
    Ok(payload)
}

pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    payload: &[u8],
) -> Result<(), SolaceError> {
    if payload.len() > MAX_FRAME_BYTES {
        return Err(speech_err(format!(
            "frame of {} bytes exceeds the {MAX_FRAME_BYTES} byte limit",
            payload.len()
        )));
    }
    writer
        .write_u32(payload.len() as u32)
        .await
        .map_err(|e| io_err("failed to write frame length", e))?;
    writer
        .write_all(payload)
        .await
        .map_err(|e| io_err("failed to write frame payload", e))?;
    writer
        .flush()
        .await
        .map_err(|e| io_err("failed to flush frame", e))
}
