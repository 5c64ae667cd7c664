// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wires the configured adapters into a session controller.

use std::sync::Arc;
use std::time::Duration;

use solace_agent::{StreamingSessionController, TurnOrchestrator};
use solace_config::SolaceConfig;
use solace_context::{load_system_prompt, token_counter_from_config};
use solace_core::error::SolaceError;
use solace_core::traits::{PluginAdapter, ProviderAdapter};
use solace_core::types::HealthStatus;
use solace_emotion::{EmotionHandler, LexiconEmotionClassifier};
use solace_memory::{MemoryManager, Summarizer, VectorMemoryStore};
use solace_ollama::{OllamaEmbedder, OllamaProvider};
use solace_speech::TtsWorker;
use tracing::{info, warn};

pub struct Runtime {
    pub controller: Arc<StreamingSessionController>,
    provider: Arc<OllamaProvider>,
    speech: Option<Arc<TtsWorker>>,
}

impl Runtime {
    pub async fn build(config: &SolaceConfig) -> Result<Self, SolaceError> {
        let counter = token_counter_from_config(&config.context)?;
        let provider = Arc::new(OllamaProvider::new(&config.model)?);
        let embedder = Arc::new(OllamaEmbedder::new(&config.model, &config.memory)?);

        let store = match config.memory.store_path {
            Some(ref path) => VectorMemoryStore::open(embedder, path).await?,
            None => VectorMemoryStore::new(embedder),
        };
        let saved = store.namespaces().await;
        let mut memory =
            MemoryManager::new(Arc::new(store), &config.memory).with_saved_namespaces(saved);
        if config.memory.summarize_evicted {
            memory = memory.with_summarizer(Summarizer::new(
                Arc::clone(&provider) as Arc<dyn ProviderAdapter>,
                config.model.model.clone(),
                config.model.max_tokens,
                Duration::from_secs(config.model.request_timeout_secs),
            ));
        }

        let emotion = EmotionHandler::from_config(
            Arc::new(LexiconEmotionClassifier::new()),
            &config.emotion,
        );
        let system_prompt = load_system_prompt(&config.agent).await;

        let orchestrator = Arc::new(TurnOrchestrator::new(
            config,
            system_prompt,
            Arc::clone(&provider) as Arc<dyn ProviderAdapter>,
            Arc::new(memory),
            emotion,
            counter,
        ));

        let mut controller = StreamingSessionController::new(orchestrator);
        let speech = if config.speech.enabled {
            let worker = Arc::new(TtsWorker::from_config(&config.speech)?);
            controller = controller.with_speech(worker.clone(), config.speech.chunk_bytes);
            Some(worker)
        } else {
            None
        };

        info!(
            model = config.model.model.as_str(),
            speech = speech.is_some(),
            "runtime ready"
        );
        Ok(Self {
            controller: Arc::new(controller),
            provider,
            speech,
        })
    }

    /// Logs the model server's health. Never fails: the server may come up later.
    pub async fn check_model(&self) -> HealthStatus {
        let status = self
            .provider
            .health_check()
            .await
            .unwrap_or_else(|e| HealthStatus::Unhealthy(e.to_string()));
        match status {
            HealthStatus::Healthy => info!("model server healthy"),
            HealthStatus::Degraded(ref reason) => warn!(reason = reason.as_str(), "model server degraded"),
            HealthStatus::Unhealthy(ref reason) => warn!(reason = reason.as_str(), "model server unreachable"),
        }
        status
    }

    pub async fn shutdown(&self) {
        self.controller.cancel_all();
        if let Some(ref speech) = self.speech
            && let Err(e) = speech.shutdown().await
        {
            warn!(error = %e, "speech worker shutdown failed");
        }
        if let Err(e) = self.provider.shutdown().await {
            warn!(error = %e, "provider shutdown failed");
        }
    }
}
