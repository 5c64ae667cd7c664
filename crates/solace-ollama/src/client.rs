// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for a local or remote Ollama server.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use solace_core::error::SolaceError;
use tracing::debug;

use crate::stream::{decode_ndjson, ChunkStream};
use crate::types::{ApiError, ChatChunk, ChatRequest, EmbedRequest, EmbedResponse, TagsResponse};

fn provider_err(message: String, e: reqwest::Error) -> SolaceError {
    if e.is_timeout() {
        return SolaceError::Provider {
            message: format!("{message}: request timed out"),
            source: Some(Box::new(e)),
        };
    }
    SolaceError::Provider {
        message: format!("{message}: {e}"),
        source: Some(Box::new(e)),
    }
}

#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    /// `timeout` bounds each call end to end, including a streamed body.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SolaceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| provider_err("failed to build HTTP client".into(), e))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatChunk, SolaceError> {
        let mut req = request.clone();
        req.stream = false;
        let response = self.post("/api/chat", &req).await?;
        let chunk: ChatChunk = read_json(response).await?;
        if let Some(error) = chunk.error {
            return Err(SolaceError::Provider {
                message: format!("Ollama error: {error}"),
                source: None,
            });
        }
        Ok(chunk)
    }

    pub async fn chat_stream(&self, request: &ChatRequest) -> Result<ChunkStream, SolaceError> {
        let mut req = request.clone();
        req.stream = true;
        let response = self.post("/api/chat", &req).await?;
        Ok(decode_ndjson(response.bytes_stream()))
    }

    pub async fn embed(&self, request: &EmbedRequest) -> Result<EmbedResponse, SolaceError> {
        let response = self.post("/api/embed", request).await?;
        read_json(response).await
    }

    pub async fn tags(&self) -> Result<TagsResponse, SolaceError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| provider_err("HTTP request failed".into(), e))?;
        let response = check_status(response).await?;
        read_json(response).await
    }

    async fn post<T: Serialize>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<reqwest::Response, SolaceError> {
        let url = format!("{}{endpoint}", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| provider_err("HTTP request failed".into(), e))?;
        debug!(status = %response.status(), endpoint, "Ollama response received");
        check_status(response).await
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SolaceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiError>(&body) {
        Ok(api_err) => format!("Ollama API error ({status}): {}", api_err.error),
        Err(_) => format!("API returned {status}: {body}"),
    };
    Err(SolaceError::Provider {
        message,
        source: None,
    })
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, SolaceError> {
    let body = response
        .text()
        .await
        .map_err(|e| provider_err("failed to read response body".into(), e))?;
    serde_json::from_str(&body).map_err(|e| SolaceError::Provider {
        message: format!("failed to parse API response: {e}"),
        source: Some(Box::new(e)),
    })
}
