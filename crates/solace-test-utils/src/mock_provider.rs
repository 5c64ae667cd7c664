// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock language model for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with scripted replies, so
//! tests run without an Ollama server.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;

use solace_core::error::SolaceError;
use solace_core::traits::{PluginAdapter, ProviderAdapter, ProviderStream};
use solace_core::types::{
    AdapterType, HealthStatus, ProviderRequest, ProviderResponse, ProviderStreamChunk, TokenUsage,
};

/// Default text when the queue is empty.
pub const DEFAULT_REPLY: &str = "mock response";

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Streamed word by word, or returned whole by `complete`.
    Text(String),
    /// The call itself fails.
    Fail(String),
    /// Streams the tokens, then an error chunk.
    BreakAfter { tokens: Vec<String>, error: String },
    /// Never answers.
    Hang,
}

/// A mock provider that pops replies from a FIFO queue.
pub struct MockProvider {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<ProviderRequest>>,
    calls: AtomicUsize,
    chunk_delay: Option<Duration>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            chunk_delay: None,
        }
    }

    /// Create a mock provider pre-loaded with text replies.
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let replies = responses.into_iter().map(|r| MockReply::Text(r.into()));
        Self {
            replies: Mutex::new(replies.collect()),
            ..Self::new()
        }
    }

    /// Sleep before every streamed chunk.
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = Some(delay);
        self
    }

    pub async fn push(&self, reply: MockReply) {
        self.replies.lock().await.push_back(reply);
    }

    pub async fn push_text(&self, text: impl Into<String>) {
        self.push(MockReply::Text(text.into())).await;
    }

    pub async fn push_failure(&self, message: impl Into<String>) {
        self.push(MockReply::Fail(message.into())).await;
    }

    /// Number of `complete` and `stream` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn last_request(&self) -> Option<ProviderRequest> {
        self.requests.lock().await.last().cloned()
    }

    async fn next_reply(&self, request: ProviderRequest) -> MockReply {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request);
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| MockReply::Text(DEFAULT_REPLY.to_string()))
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits text into word tokens that concatenate back to the input.
pub fn word_tokens(text: &str) -> Vec<String> {
    text.split_inclusive(' ').map(str::to_string).collect()
}

fn usage_for(tokens: usize) -> TokenUsage {
    TokenUsage {
        input_tokens: 10,
        output_tokens: tokens as u32,
    }
}

fn failure(message: String) -> SolaceError {
    SolaceError::Provider {
        message,
        source: None,
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, SolaceError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SolaceError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, SolaceError> {
        let model = request.model.clone();
        match self.next_reply(request).await {
            MockReply::Text(text) => Ok(ProviderResponse {
                id: format!("mock-resp-{}", uuid::Uuid::new_v4()),
                usage: usage_for(word_tokens(&text).len()),
                content: text,
                model,
                stop_reason: Some("stop".to_string()),
            }),
            MockReply::Fail(message) => Err(failure(message)),
            MockReply::BreakAfter { error, .. } => Err(failure(error)),
            MockReply::Hang => futures::future::pending().await,
        }
    }

    async fn stream(&self, request: ProviderRequest) -> Result<ProviderStream, SolaceError> {
        let (tokens, error) = match self.next_reply(request).await {
            MockReply::Text(text) => (word_tokens(&text), None),
            MockReply::Fail(message) => return Err(failure(message)),
            MockReply::BreakAfter { tokens, error } => (tokens, Some(error)),
            MockReply::Hang => {
                return Ok(Box::pin(stream::pending::<
                    Result<ProviderStreamChunk, SolaceError>,
                >()));
            }
        };

        // MessageStart -> ContentBlockDelta* -> MessageDelta (usage + stop) -> MessageStop
        let mut chunks = vec![ProviderStreamChunk::start()];
        let count = tokens.len();
        chunks.extend(tokens.into_iter().map(ProviderStreamChunk::text));
        match error {
            Some(error) => chunks.push(ProviderStreamChunk::error(error)),
            None => {
                chunks.push(ProviderStreamChunk::delta(
                    Some(usage_for(count)),
                    Some("stop".to_string()),
                ));
                chunks.push(ProviderStreamChunk::stop());
            }
        }

        let delay = self.chunk_delay;
        Ok(Box::pin(stream::iter(chunks).then(move |chunk| async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            Ok::<_, SolaceError>(chunk)
        })))
    }
}
