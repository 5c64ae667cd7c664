// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Newline-delimited JSON decoding for streaming `/api/chat` responses.

use std::pin::Pin;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use solace_core::error::SolaceError;

use crate::types::ChatChunk;

pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ChatChunk, SolaceError>> + Send>>;

struct LineReader<S> {
    inner: Pin<Box<S>>,
    buf: Vec<u8>,
    finished: bool,
}

/// Splits a byte stream into lines and decodes each as a [`ChatChunk`].
///
/// Lines may span network reads. A trailing line without a newline is still
/// decoded. Transport errors end the stream after being yielded once.
pub fn decode_ndjson<S, E>(bytes: S) -> ChunkStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let reader = LineReader {
        inner: Box::pin(bytes),
        buf: Vec::new(),
        finished: false,
    };

    Box::pin(stream::unfold(reader, |mut reader| async move {
        loop {
            if let Some(pos) = reader.buf.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = reader.buf.drain(..=pos).collect();
                let line = line.trim_ascii();
                if line.is_empty() {
                    continue;
                }
                return Some((parse_line(line), reader));
            }

            if reader.finished {
                let rest = std::mem::take(&mut reader.buf);
                let rest = rest.trim_ascii();
                if rest.is_empty() {
                    return None;
                }
                return Some((parse_line(rest), reader));
            }

            match reader.inner.next().await {
                Some(Ok(bytes)) => reader.buf.extend_from_slice(&bytes),
                Some(Err(e)) => {
                    reader.finished = true;
                    reader.buf.clear();
                    return Some((
                        Err(SolaceError::Provider {
                            message: format!("stream read failed: {e}"),
                            source: Some(Box::new(e)),
                        }),
                        reader,
                    ));
                }
                None => reader.finished = true,
            }
        }
    }))
}

fn parse_line(line: &[u8]) -> Result<ChatChunk, SolaceError> {
    serde_json::from_slice(line).map_err(|e| SolaceError::Provider {
        message: format!("failed to parse stream line: {e}"),
        source: Some(Box::new(e)),
    })
}
