// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Speech synthesis adapter trait.

use async_trait::async_trait;

use crate::error::SolaceError;
use crate::traits::adapter::PluginAdapter;

/// Text-to-speech backend producing WAV bytes.
#[async_trait]
pub trait SpeechAdapter: PluginAdapter {
    /// Starts the backend if needed and verifies it is responsive.
    ///
    /// Must succeed before the first [`synthesize`](Self::synthesize) call.
    async fn ensure_ready(&self) -> Result<(), SolaceError>;

    /// Synthesizes one piece of text into a complete WAV payload.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SolaceError>;
}
