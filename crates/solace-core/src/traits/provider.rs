// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for language model backends.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::SolaceError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ProviderRequest, ProviderResponse, ProviderStreamChunk};

/// Boxed stream of provider chunks. Finite and not restartable.
pub type ProviderStream =
    Pin<Box<dyn Stream<Item = Result<ProviderStreamChunk, SolaceError>> + Send>>;

/// Adapter for language model backends.
///
/// Supports both single-shot completion and token-level streaming.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Sends a completion request and returns the full response.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, SolaceError>;

    /// Sends a completion request and returns a stream of response chunks.
    async fn stream(&self, request: ProviderRequest) -> Result<ProviderStream, SolaceError>;
}
