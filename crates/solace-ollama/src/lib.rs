// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama adapters for the Solace companion.
//!
//! [`OllamaProvider`] implements [`ProviderAdapter`] over `/api/chat` with
//! both single-shot and NDJSON streaming responses. [`OllamaEmbedder`]
//! implements [`EmbeddingAdapter`] over `/api/embed`.

pub mod client;
pub mod embedder;
pub mod stream;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self as fstream, StreamExt};
use solace_config::model::ModelConfig;
use solace_core::error::SolaceError;
use solace_core::traits::{PluginAdapter, ProviderAdapter, ProviderStream};
use solace_core::types::{
    AdapterType, HealthStatus, ProviderRequest, ProviderResponse, ProviderStreamChunk, TokenUsage,
};
use tracing::{debug, warn};

pub use crate::client::OllamaClient;
pub use crate::embedder::OllamaEmbedder;
use crate::types::{ChatChunk, ChatOptions, ChatRequest, WireMessage};

/// Chat model served by Ollama.
pub struct OllamaProvider {
    client: OllamaClient,
    default_model: String,
}

impl OllamaProvider {
    pub fn new(config: &ModelConfig) -> Result<Self, SolaceError> {
        let client = OllamaClient::new(
            &config.base_url,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        Ok(Self::with_client(client, config.model.clone()))
    }

    pub fn with_client(client: OllamaClient, default_model: String) -> Self {
        Self {
            client,
            default_model,
        }
    }

    fn to_chat_request(&self, request: &ProviderRequest) -> ChatRequest {
        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model.clone()
        };

        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = request.system_prompt.as_ref().filter(|s| !s.is_empty()) {
            messages.push(WireMessage {
                role: "system".into(),
                content: system.clone(),
            });
        }
        messages.extend(request.messages.iter().map(|m| WireMessage {
            role: m.role.clone(),
            content: m.content.clone(),
        }));

        ChatRequest {
            model,
            messages,
            stream: request.stream,
            options: ChatOptions {
                temperature: request.temperature,
                top_p: request.top_p,
                num_predict: request.max_tokens,
            },
        }
    }
}

fn usage_of(chunk: &ChatChunk) -> TokenUsage {
    TokenUsage {
        input_tokens: chunk.prompt_eval_count.unwrap_or(0),
        output_tokens: chunk.eval_count.unwrap_or(0),
    }
}

/// Text deltas pass through; the final object becomes a usage delta plus stop.
fn map_chunk(chunk: ChatChunk) -> Vec<Result<ProviderStreamChunk, SolaceError>> {
    if let Some(error) = chunk.error.as_deref() {
        return vec![Ok(ProviderStreamChunk::error(error))];
    }
    let mut out = Vec::with_capacity(3);
    let text = chunk.content();
    if !text.is_empty() {
        out.push(Ok(ProviderStreamChunk::text(text)));
    }
    if chunk.done {
        out.push(Ok(ProviderStreamChunk::delta(
            Some(usage_of(&chunk)),
            chunk.done_reason.clone(),
        )));
        out.push(Ok(ProviderStreamChunk::stop()));
    }
    out
}

#[async_trait]
impl PluginAdapter for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, SolaceError> {
        match self.client.tags().await {
            Ok(tags) if tags.has_model(&self.default_model) => Ok(HealthStatus::Healthy),
            Ok(_) => Ok(HealthStatus::Degraded(format!(
                "model {} is not pulled",
                self.default_model
            ))),
            Err(e) => {
                warn!(error = %e, "Ollama health check failed");
                Ok(HealthStatus::Unhealthy(e.to_string()))
            }
        }
    }

    async fn shutdown(&self) -> Result<(), SolaceError> {
        debug!("Ollama provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for OllamaProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, SolaceError> {
        let chat_request = self.to_chat_request(&request);
        let chunk = self.client.chat(&chat_request).await?;
        Ok(ProviderResponse {
            id: uuid::Uuid::new_v4().to_string(),
            content: chunk.content().to_string(),
            usage: usage_of(&chunk),
            model: chunk.model,
            stop_reason: chunk.done_reason,
        })
    }

    async fn stream(&self, request: ProviderRequest) -> Result<ProviderStream, SolaceError> {
        let chat_request = self.to_chat_request(&request);
        let chunks = self.client.chat_stream(&chat_request).await?;

        let mapped = chunks.flat_map(|item| {
            let items = match item {
                Ok(chunk) => map_chunk(chunk),
                Err(e) => vec![Err(e)],
            };
            fstream::iter(items)
        });
        let start = fstream::once(async { Ok(ProviderStreamChunk::start()) });
        Ok(Box::pin(start.chain(mapped)))
    }
}
