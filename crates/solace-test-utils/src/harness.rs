// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end pipeline tests.
//!
//! `TestHarness` wires a full orchestrator and session controller over mock
//! adapters. Provides `turn()` and `stream()` to drive the pipeline.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use solace_agent::{StreamingSessionController, TurnEvent, TurnOrchestrator, TurnOutcome};
use solace_config::SolaceConfig;
use solace_core::error::SolaceError;
use solace_core::tokenizer::TokenCounter;
use solace_core::traits::{MemoryStoreAdapter, ProviderAdapter, SpeechAdapter};
use solace_core::types::{ChatMessage, SessionKey};
use solace_emotion::EmotionHandler;
use solace_memory::{MemoryManager, Summarizer};

use crate::mock_emotion::MockEmotion;
use crate::mock_memory::MockMemoryStore;
use crate::mock_provider::MockProvider;

/// Counts whitespace-separated words. Keeps budget arithmetic in tests
/// independent of any real tokenizer.
#[derive(Debug, Default, Clone, Copy)]
pub struct WordCounter;

impl TokenCounter for WordCounter {
    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: SolaceConfig,
    responses: Vec<String>,
    system_prompt: String,
    chunk_delay: Option<Duration>,
    emotion: MockEmotion,
    speech: Option<Arc<dyn SpeechAdapter>>,
    summarize: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = SolaceConfig::default();
        config.model.request_timeout_secs = 5;
        Self {
            config,
            responses: Vec::new(),
            system_prompt: "You are a test companion.".to_string(),
            chunk_delay: None,
            emotion: MockEmotion::default(),
            speech: None,
            summarize: false,
        }
    }

    /// Set mock provider responses.
    pub fn with_mock_responses<I, S>(mut self, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.responses = responses.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_stm_limit(mut self, limit: usize) -> Self {
        self.config.memory.stm_limit = limit;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Delay between streamed chunks, for cancellation tests.
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = Some(delay);
        self
    }

    pub fn with_emotion(mut self, emotion: MockEmotion) -> Self {
        self.emotion = emotion;
        self
    }

    pub fn with_speech(mut self, speech: Arc<dyn SpeechAdapter>) -> Self {
        self.speech = Some(speech);
        self
    }

    /// Summarize AI messages with the mock provider before saving them.
    pub fn with_summarizer(mut self) -> Self {
        self.summarize = true;
        self
    }

    /// Arbitrary config edits, applied last.
    pub fn with_config(mut self, edit: impl FnOnce(&mut SolaceConfig)) -> Self {
        edit(&mut self.config);
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub fn build(self) -> TestHarness {
        let mut provider = MockProvider::with_responses(self.responses);
        if let Some(delay) = self.chunk_delay {
            provider = provider.with_chunk_delay(delay);
        }
        let provider = Arc::new(provider);
        let store = Arc::new(MockMemoryStore::new());
        let emotion = Arc::new(self.emotion);

        let mut memory = MemoryManager::new(
            Arc::clone(&store) as Arc<dyn MemoryStoreAdapter>,
            &self.config.memory,
        );
        if self.summarize {
            memory = memory.with_summarizer(Summarizer::new(
                Arc::clone(&provider) as Arc<dyn ProviderAdapter>,
                self.config.model.model.clone(),
                self.config.model.max_tokens,
                Duration::from_secs(self.config.model.request_timeout_secs),
            ));
        }

        let orchestrator = Arc::new(TurnOrchestrator::new(
            &self.config,
            self.system_prompt,
            Arc::clone(&provider) as Arc<dyn ProviderAdapter>,
            Arc::new(memory),
            EmotionHandler::from_config(Arc::clone(&emotion) as _, &self.config.emotion),
            Arc::new(WordCounter),
        ));

        let mut controller = StreamingSessionController::new(Arc::clone(&orchestrator));
        if let Some(speech) = self.speech {
            controller = controller.with_speech(speech, self.config.speech.chunk_bytes);
        }

        TestHarness {
            provider,
            store,
            emotion,
            orchestrator,
            controller: Arc::new(controller),
            config: self.config,
        }
    }
}

/// A complete pipeline over mock adapters.
pub struct TestHarness {
    pub provider: Arc<MockProvider>,
    pub store: Arc<MockMemoryStore>,
    pub emotion: Arc<MockEmotion>,
    pub orchestrator: Arc<TurnOrchestrator>,
    pub controller: Arc<StreamingSessionController>,
    pub config: SolaceConfig,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Runs one blocking turn.
    pub async fn turn(&self, key: &SessionKey, utterance: &str) -> Result<TurnOutcome, SolaceError> {
        self.orchestrator.run_turn(key, utterance).await
    }

    /// Runs one streamed turn through the controller and collects every event.
    pub async fn stream(
        &self,
        key: &SessionKey,
        utterance: &str,
    ) -> Result<Vec<TurnEvent>, SolaceError> {
        let stream = self.controller.start_text(key.clone(), utterance)?;
        Ok(stream.collect().await)
    }

    pub async fn history(&self, key: &SessionKey) -> Vec<ChatMessage> {
        self.orchestrator.history(key).await
    }
}
