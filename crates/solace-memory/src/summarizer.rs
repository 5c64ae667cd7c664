// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Condenses AI messages before they are written to long-term memory.

use std::sync::Arc;
use std::time::Duration;

use solace_core::error::SolaceError;
use solace_core::traits::ProviderAdapter;
use solace_core::types::{ProviderMessage, ProviderRequest};

const SUMMARY_PROMPT: &str = "Summarize the following AI message into a concise response. \
Include only the most important details and specific information. \
Avoid repeating or expanding the content. \
Do not add unnecessary context or embellishments.\n\n\
Here is the content to summarize:\n\n";

/// Summarizes text with a single non-streaming model call.
#[derive(Clone)]
pub struct Summarizer {
    provider: Arc<dyn ProviderAdapter>,
    model: String,
    max_tokens: u32,
    timeout: Duration,
}

impl Summarizer {
    pub fn new(
        provider: Arc<dyn ProviderAdapter>,
        model: impl Into<String>,
        max_tokens: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens,
            timeout,
        }
    }

    pub async fn summarize_ai_message(&self, text: &str) -> Result<String, SolaceError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            system_prompt: None,
            messages: vec![ProviderMessage::user(format!("{SUMMARY_PROMPT}{text}"))],
            max_tokens: self.max_tokens,
            temperature: None,
            top_p: None,
            stream: false,
        };

        let response = tokio::time::timeout(self.timeout, self.provider.complete(request))
            .await
            .map_err(|_| SolaceError::Timeout {
                duration: self.timeout,
            })??;

        tracing::info!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            original_chars = text.len(),
            summary_chars = response.content.len(),
            "AI message summarized"
        );

        Ok(response.content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use solace_core::traits::{PluginAdapter, ProviderStream};
    use solace_core::types::{AdapterType, HealthStatus, ProviderResponse, TokenUsage};

    use super::*;

    #[derive(Default)]
    struct Recording {
        requests: Mutex<Vec<ProviderRequest>>,
    }

    #[async_trait]
    impl PluginAdapter for Recording {
        fn name(&self) -> &str {
            "recording"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 0, 0)
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
    impl ProviderAdapter for Recording {
        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, SolaceError> {
            self.requests.lock().unwrap().push(request);
            Ok(ProviderResponse {
                id: "r1".into(),
                content: "  Short version. \n".into(),
                model: "m".into(),
                stop_reason: Some("stop".into()),
                usage: TokenUsage::default(),
            })
        }

        async fn stream(&self, _request: ProviderRequest) -> Result<ProviderStream, SolaceError> {
            Err(SolaceError::Internal("not used".into()))
        }
    }

    #[tokio::test]
    async fn sends_fixed_prefix_and_trims_reply() {
        let provider = Arc::new(Recording::default());
        let summarizer = Summarizer::new(provider.clone(), "llama3.2", 128, Duration::from_secs(5));

        let summary = summarizer.summarize_ai_message("A very long answer.").await.unwrap();
        assert_eq!(summary, "Short version.");

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].stream);
        assert_eq!(requests[0].messages.len(), 1);
        let content = &requests[0].messages[0].content;
        assert!(content.starts_with("Summarize the following AI message into a concise response. Include"));
        assert!(content.ends_with("Here is the content to summarize:\n\nA very long answer."));
    }
}
