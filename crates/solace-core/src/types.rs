// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the conversation pipeline.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Metadata key under which a long-term memory record stores its thread.
pub const SESSION_ID_KEY: &str = "session_id";

/// Identifies one conversation: a thread inside a user's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    /// Namespace owner. Long-term memory is partitioned by this value.
    pub user_id: String,
    /// Conversation thread within the user's namespace.
    pub thread_id: String,
}

impl SessionKey {
    pub fn new(user_id: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            thread_id: thread_id.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_id, self.thread_id)
    }
}

/// Author of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum Role {
    #[strum(to_string = "Human")]
    Human,
    #[strum(to_string = "AI")]
    Ai,
}

impl Role {
    /// Role name used on the provider wire.
    pub fn provider_role(&self) -> &'static str {
        match self {
            Role::Human => "user",
            Role::Ai => "assistant",
        }
    }
}

/// One message in a conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message identifier.
    pub id: String,
    pub role: Role,
    pub content: String,
    /// Turn number this message belongs to. All messages of one turn share it.
    pub turn: u64,
    /// Provider token usage, recorded on AI messages when the provider reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl ChatMessage {
    pub fn human(content: impl Into<String>, turn: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: Role::Human,
            content: content.into(),
            turn,
            usage: None,
        }
    }

    pub fn ai(content: impl Into<String>, turn: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: Role::Ai,
            content: content.into(),
            turn,
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: Option<TokenUsage>) -> Self {
        self.usage = usage;
        self
    }

    /// Renders the message as `Human: ...` / `AI: ...`.
    pub fn labelled(&self) -> String {
        format!("{}: {}", self.role, self.content)
    }
}

/// Authoritative, append-only message log for one [`SessionKey`].
///
/// Messages are only removed through [`remove_message`](Self::remove_message),
/// which clears operate on one message at a time.
#[derive(Debug, Clone)]
pub struct ConversationState {
    key: SessionKey,
    messages: Vec<ChatMessage>,
    next_turn: u64,
    /// Number of leading messages already written to long-term memory.
    evicted_until: usize,
}

impl ConversationState {
    pub fn new(key: SessionKey) -> Self {
        Self {
            key,
            messages: Vec::new(),
            next_turn: 1,
            evicted_until: 0,
        }
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Appends a human utterance as the start of a new turn and returns the turn number.
    pub fn begin_turn(&mut self, utterance: impl Into<String>) -> u64 {
        let turn = self.next_turn;
        self.next_turn += 1;
        self.messages.push(ChatMessage::human(utterance, turn));
        turn
    }

    /// Appends an already-built message.
    pub fn push(&mut self, message: ChatMessage) {
        if message.turn >= self.next_turn {
            self.next_turn = message.turn + 1;
        }
        self.messages.push(message);
    }

    /// Removes one message by id. Returns false if no such message exists.
    pub fn remove_message(&mut self, id: &str) -> bool {
        let Some(pos) = self.messages.iter().position(|m| m.id == id) else {
            return false;
        };
        self.messages.remove(pos);
        if pos < self.evicted_until {
            self.evicted_until -= 1;
        }
        true
    }

    pub fn evicted_until(&self) -> usize {
        self.evicted_until
    }

    /// Records that messages before `index` have been persisted to long-term memory.
    pub fn mark_evicted(&mut self, index: usize) {
        self.evicted_until = self.evicted_until.max(index.min(self.messages.len()));
    }

    /// The most recent AI message, if any.
    pub fn last_ai_message(&self) -> Option<&ChatMessage> {
        self.messages.iter().rev().find(|m| m.role == Role::Ai)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of collaborator behind an adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Provider,
    Embedding,
    Emotion,
    MemoryStore,
    Speech,
}

// --- Provider types ---

/// A single message sent to an LLM provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMessage {
    /// "system", "user" or "assistant".
    pub role: String,
    pub content: String,
}

impl ProviderMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

impl From<&ChatMessage> for ProviderMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.provider_role().to_string(),
            content: msg.content.clone(),
        }
    }
}

/// A request to an LLM provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub model: String,
    /// Rendered system message, sent ahead of `messages`.
    pub system_prompt: Option<String>,
    pub messages: Vec<ProviderMessage>,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub stream: bool,
}

/// A complete (non-streaming) response from an LLM provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub id: String,
    pub content: String,
    pub model: String,
    pub stop_reason: Option<String>,
    pub usage: TokenUsage,
}

/// Token accounting reported by a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Kind of event carried by a [`ProviderStreamChunk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEventType {
    MessageStart,
    ContentBlockDelta,
    MessageDelta,
    MessageStop,
    Error,
}

/// A single chunk from a streaming LLM provider response.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderStreamChunk {
    pub event_type: StreamEventType,
    /// Text delta, set on `ContentBlockDelta`.
    pub text: Option<String>,
    /// Usage, set on `MessageDelta` when the provider reports it.
    pub usage: Option<TokenUsage>,
    /// Error description, set on `Error`.
    pub error: Option<String>,
    pub stop_reason: Option<String>,
}

impl ProviderStreamChunk {
    fn empty(event_type: StreamEventType) -> Self {
        Self {
            event_type,
            text: None,
            usage: None,
            error: None,
            stop_reason: None,
        }
    }

    pub fn start() -> Self {
        Self::empty(StreamEventType::MessageStart)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::empty(StreamEventType::ContentBlockDelta)
        }
    }

    pub fn delta(usage: Option<TokenUsage>, stop_reason: Option<String>) -> Self {
        Self {
            usage,
            stop_reason,
            ..Self::empty(StreamEventType::MessageDelta)
        }
    }

    pub fn stop() -> Self {
        Self::empty(StreamEventType::MessageStop)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::empty(StreamEventType::Error)
        }
    }
}

// --- Embedding types ---

/// Input for an embedding adapter.
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    pub texts: Vec<String>,
}

/// Output from an embedding adapter, one vector per input text.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    pub embeddings: Vec<Vec<f32>>,
    pub dimensions: usize,
}

// --- Emotion types ---

/// Raw classifier output for one utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionDetection {
    pub primary_emotion: String,
    /// Per-label confidence.
    pub scores: HashMap<String, f32>,
}

/// Per-turn emotion context fed to the prompt. Never cached across turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionAnnotation {
    pub primary_emotion: String,
    /// Guidance text registered for the label, empty if none.
    pub guidance_text: String,
}

impl EmotionAnnotation {
    pub fn neutral() -> Self {
        Self {
            primary_emotion: "neutral".to_string(),
            guidance_text: String::new(),
        }
    }
}

// --- Memory store types ---

/// One unit of evicted conversation written to the long-term store.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryRecord {
    /// Freshly generated, never reused.
    pub id: String,
    pub text: String,
    /// Partition key (the user id).
    pub namespace: String,
    pub metadata: HashMap<String, String>,
}

/// A similarity search against one namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryQuery {
    pub query: String,
    pub namespace: String,
    /// Every pair must match the record's metadata exactly.
    pub filter: HashMap<String, String>,
    /// Maximum number of results.
    pub k: usize,
    /// Minimum similarity for a record to be returned.
    pub score_threshold: f32,
}
