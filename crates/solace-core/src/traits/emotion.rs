// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Emotion classifier adapter trait.

use async_trait::async_trait;

use crate::error::SolaceError;
use crate::traits::adapter::PluginAdapter;
use crate::types::EmotionDetection;

/// Maps an utterance to a primary emotion label and per-label scores.
#[async_trait]
pub trait EmotionAdapter: PluginAdapter {
    async fn detect(&self, text: &str) -> Result<EmotionDetection, SolaceError>;
}
