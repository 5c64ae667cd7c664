// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Solace companion.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level Solace configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SolaceConfig {
    /// Companion identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Language model backend.
    #[serde(default)]
    pub model: ModelConfig,

    /// Short-term and long-term memory.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Prompt budget and token counting.
    #[serde(default)]
    pub context: ContextConfig,

    /// Emotion detection and guidance.
    #[serde(default)]
    pub emotion: EmotionConfig,

    /// Speech synthesis worker.
    #[serde(default)]
    pub speech: SpeechConfig,
}

/// Companion identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the companion.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Inline system prompt string. Overridden by `system_prompt_file` if both set.
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Path to a markdown file containing the system prompt.
    #[serde(default)]
    pub system_prompt_file: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            system_prompt: None,
            system_prompt_file: None,
        }
    }
}

fn default_agent_name() -> String {
    "solace".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Language model backend configuration (Ollama-compatible HTTP API).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model tag used for chat completions.
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Tokens reserved for the response. Also bounds generation length.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Upper bound for one model call, including streaming.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.2".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

fn default_max_tokens() -> u32 {
    512
}

fn default_request_timeout_secs() -> u64 {
    120
}

/// How evicted messages are selected when short-term memory overflows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionMode {
    /// Persist whole turns and never split one across the window edge.
    #[default]
    TurnBoundary,
    /// Persist the two messages just before the excess boundary.
    FixedPair,
}

/// Memory system configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Number of most recent messages kept in the prompt window.
    #[serde(default = "default_stm_limit")]
    pub stm_limit: usize,

    /// When set, bounds the window by tokens instead of message count.
    #[serde(default)]
    pub stm_token_budget: Option<usize>,

    #[serde(default)]
    pub eviction: EvictionMode,

    /// Minimum similarity for a long-term memory to be recalled.
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,

    /// Maximum number of memories recalled per turn.
    #[serde(default = "default_max_db_results")]
    pub max_db_results: usize,

    /// Summarize AI messages before writing them to long-term memory.
    #[serde(default)]
    pub summarize_evicted: bool,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,

    /// JSON snapshot of the long-term store. Unset keeps memories in process only.
    #[serde(default)]
    pub store_path: Option<PathBuf>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            stm_limit: default_stm_limit(),
            stm_token_budget: None,
            eviction: EvictionMode::default(),
            score_threshold: default_score_threshold(),
            max_db_results: default_max_db_results(),
            summarize_evicted: false,
            embedding_model: default_embedding_model(),
            embedding_dim: default_embedding_dim(),
            store_path: None,
        }
    }
}

fn default_stm_limit() -> usize {
    7
}

fn default_score_threshold() -> f32 {
    0.8
}

fn default_max_db_results() -> usize {
    3
}

fn default_embedding_model() -> String {
    "mxbai-embed-large".to_string()
}

fn default_embedding_dim() -> usize {
    1024
}

/// What to do when the assembled prompt exceeds the context window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Skip generation for the turn and report it to the caller.
    #[default]
    Skip,
    /// Fail the turn with a context overflow error.
    Error,
    /// Drop the least relevant recalled memories until the prompt fits.
    TruncateMemories,
}

/// Prompt budget configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfig {
    /// Context window of the target model, in tokens.
    #[serde(default = "default_max_context_tokens")]
    pub max_context_tokens: usize,

    #[serde(default)]
    pub overflow_policy: OverflowPolicy,

    /// tiktoken encoding name.
    #[serde(default = "default_tokenizer")]
    pub tokenizer: String,

    /// HuggingFace `tokenizer.json` for the target model. Wins over `tokenizer`.
    #[serde(default)]
    pub tokenizer_file: Option<PathBuf>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_context_tokens: default_max_context_tokens(),
            overflow_policy: OverflowPolicy::default(),
            tokenizer: default_tokenizer(),
            tokenizer_file: None,
        }
    }
}

fn default_max_context_tokens() -> usize {
    128_000
}

fn default_tokenizer() -> String {
    "cl100k_base".to_string()
}

/// Emotion detection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmotionConfig {
    /// When false every turn is annotated as neutral without running the classifier.
    #[serde(default = "default_emotion_enabled")]
    pub enabled: bool,

    /// Guidance text per emotion label. Labels without an entry get no guidance.
    #[serde(default = "default_guidance")]
    pub guidance: BTreeMap<String, String>,
}

impl Default for EmotionConfig {
    fn default() -> Self {
        Self {
            enabled: default_emotion_enabled(),
            guidance: default_guidance(),
        }
    }
}

fn default_emotion_enabled() -> bool {
    true
}

const DEFAULT_GUIDANCE: &[(&str, &str)] = &[
    ("admiration", "Accept the kind words warmly and keep the focus on the user."),
    ("amusement", "Match their lighthearted mood and keep the exchange playful."),
    ("anger", "Stay calm, acknowledge the frustration and avoid arguing."),
    ("annoyance", "Keep it brief and practical. Acknowledge what is bothering them."),
    ("approval", "Affirm their view and build on it."),
    ("caring", "Recognise their concern for others and respond with warmth."),
    ("confusion", "Explain simply, one step at a time, and check understanding."),
    ("curiosity", "Offer a clear answer and invite them to explore further."),
    ("desire", "Take the wish seriously and suggest a realistic next step."),
    ("disappointment", "Acknowledge the letdown gently before offering anything new."),
    ("disapproval", "Respect their objection and do not push back."),
    ("disgust", "Acknowledge the reaction without dwelling on details."),
    ("embarrassment", "Reassure them kindly and move the conversation forward."),
    ("excitement", "Share their enthusiasm and ask about what excites them."),
    ("fear", "Be reassuring and steady. Offer one concrete thing that could help."),
    ("gratitude", "Acknowledge the thanks kindly and offer further help."),
    ("grief", "Be gentle and patient. Listen more than you advise."),
    ("joy", "Celebrate with them and keep the tone bright."),
    ("love", "Respond warmly to the affection they express."),
    ("nervousness", "Use a calm tone and break things into small steps."),
    ("optimism", "Encourage their hopeful outlook."),
    ("pride", "Congratulate them sincerely on what they achieved."),
    ("realization", "Help them follow the new insight through."),
    ("relief", "Share in the relief and let them relax."),
    ("remorse", "Be understanding and help them let go of guilt."),
    ("sadness", "Respond with empathy. Offer comfort before suggestions."),
    ("surprise", "Acknowledge the surprise and help make sense of it."),
    ("neutral", ""),
];

/// Built-in guidance table covering every label the default classifier emits.
pub fn default_guidance() -> BTreeMap<String, String> {
    DEFAULT_GUIDANCE
        .iter()
        .map(|(label, text)| (label.to_string(), text.to_string()))
        .collect()
}

/// Speech synthesis worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SpeechConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Executable that runs the TTS worker.
    #[serde(default)]
    pub command: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,

    /// Time allowed for the worker to answer the initial ping.
    #[serde(default = "default_handshake_timeout_secs")]
    pub handshake_timeout_secs: u64,

    /// Time allowed for one synthesis request.
    #[serde(default = "default_speech_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Size of each audio chunk handed to the caller.
    #[serde(default = "default_chunk_bytes")]
    pub chunk_bytes: usize,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            command: None,
            args: Vec::new(),
            handshake_timeout_secs: default_handshake_timeout_secs(),
            request_timeout_secs: default_speech_request_timeout_secs(),
            chunk_bytes: default_chunk_bytes(),
        }
    }
}

fn default_handshake_timeout_secs() -> u64 {
    30
}

fn default_speech_request_timeout_secs() -> u64 {
    60
}

fn default_chunk_bytes() -> usize {
    16 * 1024
}
