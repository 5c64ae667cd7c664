// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Solace companion.

use thiserror::Error;

/// The primary error type used across all Solace adapter traits and core operations.
#[derive(Debug, Error)]
pub enum SolaceError {
    /// Configuration errors (invalid TOML, unknown tokenizer, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Long-term memory store errors (write or delete failure).
    ///
    /// Never recovered locally: a failed write would let short-term memory
    /// shrink without the content landing in long-term memory.
    #[error("storage error: {message}")]
    Storage {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// LLM or embedding provider errors (API failure, malformed stream).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Emotion classifier failure.
    #[error("emotion detection error: {message}")]
    Emotion { message: String },

    /// Speech synthesis worker failure, including worker-reported error frames.
    #[error("speech error: {message}")]
    Speech {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A conversation turn failed somewhere between eviction and generation.
    #[error("failed to process input for thread {thread_id}: {source}")]
    Turn {
        thread_id: String,
        source: Box<SolaceError>,
    },

    /// The assembled prompt does not fit the context window and the overflow
    /// policy asked for a hard failure.
    #[error("prompt exceeds token limit: {prompt_tokens} > {limit}")]
    ContextOverflow { prompt_tokens: usize, limit: usize },

    /// A stream is already in flight for this session.
    #[error("session {session_key} already has an active stream")]
    SessionBusy { session_key: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SolaceError {
    /// Wraps this error with the thread that was being processed.
    pub fn in_turn(self, thread_id: impl Into<String>) -> Self {
        match self {
            // Already carries turn context.
            SolaceError::Turn { .. } => self,
            other => SolaceError::Turn {
                thread_id: thread_id.into(),
                source: Box::new(other),
            },
        }
    }

    /// Returns true if this error is a timeout, directly or inside a turn failure.
    pub fn is_timeout(&self) -> bool {
        match self {
            SolaceError::Timeout { .. } => true,
            SolaceError::Turn { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}
