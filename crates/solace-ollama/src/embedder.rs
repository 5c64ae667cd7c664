// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::time::Duration;

use async_trait::async_trait;
use solace_config::model::{MemoryConfig, ModelConfig};
use solace_core::error::SolaceError;
use solace_core::traits::{EmbeddingAdapter, PluginAdapter};
use solace_core::types::{AdapterType, EmbeddingInput, EmbeddingOutput, HealthStatus};
use tracing::{debug, warn};

use crate::client::OllamaClient;
use crate::types::EmbedRequest;

/// Embedding model served by Ollama.
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
    dimensions: usize,
}

impl OllamaEmbedder {
    pub fn new(model: &ModelConfig, memory: &MemoryConfig) -> Result<Self, SolaceError> {
        let client = OllamaClient::new(
            &model.base_url,
            Duration::from_secs(model.request_timeout_secs),
        )?;
        Ok(Self::with_client(
            client,
            memory.embedding_model.clone(),
            memory.embedding_dim,
        ))
    }

    pub fn with_client(client: OllamaClient, model: String, dimensions: usize) -> Self {
        Self {
            client,
            model,
            dimensions,
        }
    }

    /// Expected vector width.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[async_trait]
impl PluginAdapter for OllamaEmbedder {
    fn name(&self) -> &str {
        "ollama-embed"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, SolaceError> {
        match self.client.tags().await {
            Ok(tags) if tags.has_model(&self.model) => Ok(HealthStatus::Healthy),
            Ok(_) => Ok(HealthStatus::Degraded(format!(
                "embedding model {} is not pulled",
                self.model
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), SolaceError> {
        Ok(())
    }
}

#[async_trait]
impl EmbeddingAdapter for OllamaEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, SolaceError> {
        if input.texts.is_empty() {
            return Ok(EmbeddingOutput {
                embeddings: Vec::new(),
                dimensions: self.dimensions,
            });
        }
        let expected = input.texts.len();
        let response = self
            .client
            .embed(&EmbedRequest {
                model: self.model.clone(),
                input: input.texts,
            })
            .await?;

        if response.embeddings.len() != expected {
            return Err(SolaceError::Provider {
                message: format!(
                    "embedding count mismatch: sent {expected}, received {}",
                    response.embeddings.len()
                ),
                source: None,
            });
        }

        let dimensions = response.embeddings.first().map_or(self.dimensions, Vec::len);
        if dimensions != self.dimensions {
            warn!(
                model = %self.model,
                configured = self.dimensions,
                actual = dimensions,
                "embedding width differs from memory.embedding_dim"
            );
        }
        debug!(count = expected, dimensions, "texts embedded");

        Ok(EmbeddingOutput {
            embeddings: response.embeddings,
            dimensions,
        })
    }
}
