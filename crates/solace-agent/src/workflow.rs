// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-turn workflow: receive, evict, trim, retrieve, annotate, validate,
//! generate.
//!
//! The conversation lock is held for the whole turn, so a second turn for
//! the same thread waits until the first reaches a terminal state. The AI
//! reply is appended only once generation has completed.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, Stream, StreamExt};
use solace_config::model::{ModelConfig, OverflowPolicy};
use solace_config::SolaceConfig;
use solace_context::{AssembledPrompt, PromptBuilder, PromptContext, PromptDecision, StmTrimmer};
use solace_core::error::SolaceError;
use solace_core::tokenizer::TokenCounter;
use solace_core::traits::{ProviderAdapter, ProviderStream};
use solace_core::types::{
    ChatMessage, ConversationState, ProviderRequest, SessionKey, StreamEventType, TokenUsage,
};
use solace_emotion::EmotionHandler;
use solace_memory::MemoryManager;
use tokio::sync::OwnedMutexGuard;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::state::ConversationRegistry;

/// Result of a blocking turn.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Replied(ChatMessage),
    /// The prompt did not fit and the model was not called.
    Skipped { prompt_tokens: usize, limit: usize },
}

/// One item of a streamed turn.
///
/// Zero or more `Token`s are followed by exactly one terminal event, unless
/// the turn is cancelled, in which case the stream just ends.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    Token(String),
    Completed(ChatMessage),
    Skipped { prompt_tokens: usize, limit: usize },
    Error(String),
}

impl TurnEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TurnEvent::Token(_))
    }
}

pub type TurnStream = Pin<Box<dyn Stream<Item = TurnEvent> + Send>>;

/// What was removed by [`TurnOrchestrator::clear_all_memories`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearSummary {
    pub messages_removed: usize,
    pub long_term_cleared: bool,
}

/// Sampling parameters and the per-call time bound.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl GenerationSettings {
    pub fn from_config(config: &ModelConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

enum Prepared {
    Ready { request: ProviderRequest, turn: u64 },
    Skipped { prompt_tokens: usize, limit: usize },
}

pub struct TurnOrchestrator {
    registry: ConversationRegistry,
    provider: Arc<dyn ProviderAdapter>,
    memory: Arc<MemoryManager>,
    emotion: EmotionHandler,
    prompt: PromptBuilder,
    trimmer: StmTrimmer,
    overflow: OverflowPolicy,
    generation: GenerationSettings,
}

impl TurnOrchestrator {
    pub fn new(
        config: &SolaceConfig,
        system_prompt: String,
        provider: Arc<dyn ProviderAdapter>,
        memory: Arc<MemoryManager>,
        emotion: EmotionHandler,
        counter: Arc<dyn TokenCounter>,
    ) -> Self {
        let prompt = PromptBuilder::new(
            system_prompt,
            Arc::clone(&counter),
            config.context.max_context_tokens,
            config.model.max_tokens as usize,
        );
        let trimmer = StmTrimmer::from_limits(
            config.memory.stm_limit,
            config.memory.stm_token_budget,
            counter,
        );
        Self {
            registry: ConversationRegistry::new(),
            provider,
            memory,
            emotion,
            prompt,
            trimmer,
            overflow: config.context.overflow_policy,
            generation: GenerationSettings::from_config(&config.model),
        }
    }

    pub fn registry(&self) -> &ConversationRegistry {
        &self.registry
    }

    pub fn memory(&self) -> &Arc<MemoryManager> {
        &self.memory
    }

    pub fn provider(&self) -> &Arc<dyn ProviderAdapter> {
        &self.provider
    }

    /// Runs one turn and returns the whole reply.
    pub async fn run_turn(
        &self,
        key: &SessionKey,
        utterance: &str,
    ) -> Result<TurnOutcome, SolaceError> {
        let shared = self.registry.get_or_create(key);
        let mut state = shared.lock().await;
        self.run_locked(&mut state, key, utterance)
            .await
            .map_err(|e| self.fail(key, e))
    }

    async fn run_locked(
        &self,
        state: &mut ConversationState,
        key: &SessionKey,
        utterance: &str,
    ) -> Result<TurnOutcome, SolaceError> {
        let (request, turn) = match self.prepare(state, utterance, false).await? {
            Prepared::Skipped {
                prompt_tokens,
                limit,
            } => {
                return Ok(TurnOutcome::Skipped {
                    prompt_tokens,
                    limit,
                });
            }
            Prepared::Ready { request, turn } => (request, turn),
        };

        let response = tokio::time::timeout(self.generation.timeout, self.provider.complete(request))
            .await
            .map_err(|_| SolaceError::Timeout {
                duration: self.generation.timeout,
            })??;
        let message = ChatMessage::ai(response.content, turn).with_usage(Some(response.usage));
        state.push(message.clone());
        info!(
            thread_id = %key.thread_id,
            turn,
            output_tokens = response.usage.output_tokens,
            "turn completed"
        );
        Ok(TurnOutcome::Replied(message))
    }

    /// Runs one turn, yielding tokens as the model produces them.
    ///
    /// Cancelling `cancel` ends the stream before its next item and leaves
    /// the conversation without an AI message for this turn.
    pub fn stream_turn(
        self: &Arc<Self>,
        key: SessionKey,
        utterance: String,
        cancel: CancellationToken,
    ) -> TurnStream {
        let state = StreamState {
            orchestrator: Arc::clone(self),
            key,
            cancel,
            phase: Phase::Start(utterance),
        };
        Box::pin(stream::unfold(state, StreamState::advance))
    }

    /// Removes every message of the thread one at a time, stopping at the
    /// first one that cannot be removed.
    pub async fn clear_short_term_memory(&self, key: &SessionKey) -> Result<usize, SolaceError> {
        let Some(shared) = self.registry.get(key) else {
            return Ok(0);
        };
        let mut state = shared.lock().await;
        let ids: Vec<String> = state.messages().iter().map(|m| m.id.clone()).collect();
        let mut removed = 0;
        for id in ids {
            if !state.remove_message(&id) {
                error!(thread_id = %key.thread_id, message_id = %id, removed, "failed to remove message");
                return Err(SolaceError::Internal(format!(
                    "message {id} could not be removed from thread {}",
                    key.thread_id
                )));
            }
            debug!(thread_id = %key.thread_id, message_id = %id, "message removed");
            removed += 1;
        }
        info!(thread_id = %key.thread_id, removed, "short-term memory cleared");
        Ok(removed)
    }

    /// Clears the thread's messages, then the user's long-term memory.
    pub async fn clear_all_memories(&self, key: &SessionKey) -> Result<ClearSummary, SolaceError> {
        let messages_removed = self.clear_short_term_memory(key).await?;
        let long_term_cleared = self.memory.clear_long_term_memory(&key.user_id).await?;
        Ok(ClearSummary {
            messages_removed,
            long_term_cleared,
        })
    }

    /// Output tokens reported for the most recent AI reply in the thread.
    pub async fn last_output_tokens(&self, key: &SessionKey) -> Option<u32> {
        let shared = self.registry.get(key)?;
        let state = shared.lock().await;
        state
            .last_ai_message()
            .and_then(|m| m.usage)
            .map(|u| u.output_tokens)
    }

    /// Snapshot of the thread's message log.
    pub async fn history(&self, key: &SessionKey) -> Vec<ChatMessage> {
        match self.registry.get(key) {
            Some(shared) => shared.lock().await.messages().to_vec(),
            None => Vec::new(),
        }
    }

    /// Steps 1 to 6. The human message stays appended even if a later step fails.
    async fn prepare(
        &self,
        state: &mut ConversationState,
        utterance: &str,
        stream: bool,
    ) -> Result<Prepared, SolaceError> {
        let key = state.key().clone();
        let turn = state.begin_turn(utterance);

        self.memory.transfer_excess_to_ltm(state).await?;

        let window = self.trimmer.trim(state.messages());
        let memories = self.memory.retrieve_relevant_context(&key, utterance).await;
        let emotion = self.emotion.annotate(utterance).await;

        let ctx = PromptContext {
            emotion: &emotion,
            memories: &memories,
            messages: window,
        };
        match self.prompt.build(&ctx, self.overflow)? {
            PromptDecision::Skip {
                prompt_tokens,
                limit,
            } => {
                warn!(
                    thread_id = %key.thread_id,
                    turn,
                    prompt_tokens,
                    limit,
                    "prompt too large, skipping generation"
                );
                Ok(Prepared::Skipped {
                    prompt_tokens,
                    limit,
                })
            }
            PromptDecision::Ready(prompt) => {
                info!(
                    thread_id = %key.thread_id,
                    turn,
                    stm_messages = window.len(),
                    memories = prompt.memories_used,
                    emotion = %emotion.primary_emotion,
                    prompt_tokens = prompt.prompt_tokens,
                    "prompt assembled"
                );
                Ok(Prepared::Ready {
                    request: self.request(prompt, stream),
                    turn,
                })
            }
        }
    }

    fn request(&self, prompt: AssembledPrompt, stream: bool) -> ProviderRequest {
        ProviderRequest {
            model: self.generation.model.clone(),
            system_prompt: Some(prompt.system),
            messages: prompt.messages,
            max_tokens: self.generation.max_tokens,
            temperature: Some(self.generation.temperature),
            top_p: Some(self.generation.top_p),
            stream,
        }
    }

    fn fail(&self, key: &SessionKey, e: SolaceError) -> SolaceError {
        let e = e.in_turn(key.thread_id.clone());
        error!(thread_id = %key.thread_id, error = %e, "turn failed");
        e
    }
}

struct Generation {
    state: OwnedMutexGuard<ConversationState>,
    turn: u64,
    chunks: ProviderStream,
    text: String,
    usage: Option<TokenUsage>,
    deadline: Instant,
}

enum Phase {
    Start(String),
    Streaming(Box<Generation>),
    Done,
}

struct StreamState {
    orchestrator: Arc<TurnOrchestrator>,
    key: SessionKey,
    cancel: CancellationToken,
    phase: Phase,
}

impl StreamState {
    async fn advance(mut self) -> Option<(TurnEvent, Self)> {
        loop {
            match std::mem::replace(&mut self.phase, Phase::Done) {
                Phase::Done => return None,
                Phase::Start(utterance) => {
                    let cancel = self.cancel.clone();
                    let shared = self.orchestrator.registry.get_or_create(&self.key);
                    let mut state = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return None,
                        guard = shared.lock_owned() => guard,
                    };

                    let prepared = self.orchestrator.prepare(&mut state, &utterance, true).await;
                    if cancel.is_cancelled() {
                        return None;
                    }
                    let (request, turn) = match prepared {
                        Err(e) => return Some(self.error(e)),
                        Ok(Prepared::Skipped {
                            prompt_tokens,
                            limit,
                        }) => {
                            return Some((
                                TurnEvent::Skipped {
                                    prompt_tokens,
                                    limit,
                                },
                                self,
                            ));
                        }
                        Ok(Prepared::Ready { request, turn }) => (request, turn),
                    };

                    let timeout = self.orchestrator.generation.timeout;
                    let opened = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return None,
                        r = tokio::time::timeout(timeout, self.orchestrator.provider.stream(request)) => r,
                    };
                    let chunks = match opened {
                        Ok(Ok(chunks)) => chunks,
                        Ok(Err(e)) => return Some(self.error(e)),
                        Err(_) => return Some(self.error(SolaceError::Timeout { duration: timeout })),
                    };

                    self.phase = Phase::Streaming(Box::new(Generation {
                        state,
                        turn,
                        chunks,
                        text: String::new(),
                        usage: None,
                        deadline: Instant::now() + timeout,
                    }));
                }
                Phase::Streaming(mut generation) => {
                    // Locals keep `self` out of the awaited futures.
                    let cancel = self.cancel.clone();
                    let deadline = generation.deadline;
                    let timeout = self.orchestrator.generation.timeout;
                    let next = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            info!(thread_id = %self.key.thread_id, "stream cancelled, discarding partial reply");
                            return None;
                        }
                        _ = tokio::time::sleep_until(deadline) => Err(SolaceError::Timeout { duration: timeout }),
                        item = generation.chunks.next() => item.transpose(),
                    };

                    let chunk = match next {
                        Err(e) => return Some(self.error(e)),
                        Ok(None) => return Some(self.commit(generation)),
                        Ok(Some(chunk)) => chunk,
                    };

                    match chunk.event_type {
                        StreamEventType::ContentBlockDelta => {
                            let text = chunk.text.unwrap_or_default();
                            if text.is_empty() {
                                self.phase = Phase::Streaming(generation);
                                continue;
                            }
                            generation.text.push_str(&text);
                            self.phase = Phase::Streaming(generation);
                            return Some((TurnEvent::Token(text), self));
                        }
                        StreamEventType::MessageDelta => {
                            if chunk.usage.is_some() {
                                generation.usage = chunk.usage;
                            }
                            self.phase = Phase::Streaming(generation);
                        }
                        StreamEventType::MessageStop => return Some(self.commit(generation)),
                        StreamEventType::Error => {
                            let message = chunk.error.unwrap_or_else(|| "unknown stream error".into());
                            return Some(self.error(SolaceError::Provider {
                                message,
                                source: None,
                            }));
                        }
                        StreamEventType::MessageStart => self.phase = Phase::Streaming(generation),
                    }
                }
            }
        }
    }

    fn commit(self, generation: Box<Generation>) -> (TurnEvent, Self) {
        let Generation {
            mut state,
            turn,
            text,
            usage,
            ..
        } = *generation;
        let message = ChatMessage::ai(text, turn).with_usage(usage);
        state.push(message.clone());
        info!(
            thread_id = %self.key.thread_id,
            turn,
            output_tokens = usage.map(|u| u.output_tokens),
            "streamed turn completed"
        );
        (TurnEvent::Completed(message), self)
    }

    fn error(self, e: SolaceError) -> (TurnEvent, Self) {
        let e = self.orchestrator.fail(&self.key, e);
        (TurnEvent::Error(e.to_string()), self)
    }
}
