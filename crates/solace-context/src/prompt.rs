// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt rendering and token budget enforcement.
//!
//! The system message is rendered from a fixed template carrying the
//! companion instructions, recalled memories and emotional guidance. The
//! short-term window follows as role-tagged messages. Token counts use the
//! target model's tokenizer so the budget check matches what the model
//! actually receives.

use std::sync::Arc;

use solace_config::model::OverflowPolicy;
use solace_core::error::SolaceError;
use solace_core::tokenizer::TokenCounter;
use solace_core::types::{ChatMessage, EmotionAnnotation, ProviderMessage};
use tracing::{debug, error, info};

/// Per-turn inputs to the prompt.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub emotion: &'a EmotionAnnotation,
    /// Recalled memories, most relevant first.
    pub memories: &'a [String],
    /// Trimmed short-term window, ending with the new utterance.
    pub messages: &'a [ChatMessage],
}

/// A prompt that fits the budget.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledPrompt {
    pub system: String,
    pub messages: Vec<ProviderMessage>,
    pub prompt_tokens: usize,
    /// Number of recalled memories that made it into the prompt.
    pub memories_used: usize,
}

/// Result of applying the overflow policy.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptDecision {
    Ready(AssembledPrompt),
    /// Generation must not happen this turn.
    Skip { prompt_tokens: usize, limit: usize },
}

pub struct PromptBuilder {
    system_prompt: String,
    counter: Arc<dyn TokenCounter>,
    max_context_tokens: usize,
    max_response_tokens: usize,
}

impl PromptBuilder {
    pub fn new(
        system_prompt: impl Into<String>,
        counter: Arc<dyn TokenCounter>,
        max_context_tokens: usize,
        max_response_tokens: usize,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            counter,
            max_context_tokens,
            max_response_tokens,
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Largest prompt that still leaves room for the response.
    pub fn token_limit(&self) -> usize {
        self.max_context_tokens
            .saturating_sub(self.max_response_tokens)
    }

    /// Renders the system message for one turn.
    pub fn render_system(&self, emotion: &EmotionAnnotation, memories: &[String]) -> String {
        format!(
            "{}\n\n## Recall Memories\n\
             Recall memories are contextually retrieved based on the current conversation:\n\
             {}\n\n## Emotional Guidance\n\
             The user's emotion has been detected as '{}' based on their input.\n{}",
            self.system_prompt,
            memories.join("\n"),
            emotion.primary_emotion,
            emotion.guidance_text,
        )
    }

    /// Tokens in the rendered system message plus every `"{Role}: {content}"` message.
    pub fn calculate_total_tokens(&self, ctx: &PromptContext<'_>) -> usize {
        let system = self.render_system(ctx.emotion, ctx.memories);
        self.count_with_system(&system, ctx.messages)
    }

    fn count_with_system(&self, system: &str, messages: &[ChatMessage]) -> usize {
        self.counter.count(system)
            + messages
                .iter()
                .map(|m| self.counter.count(&m.labelled()))
                .sum::<usize>()
    }

    /// Returns false when `total_tokens` leaves no room for the response.
    pub fn validate_prompt_size(&self, total_tokens: usize) -> bool {
        let limit = self.token_limit();
        if total_tokens > limit {
            error!(
                prompt_tokens = total_tokens,
                limit,
                max_context_tokens = self.max_context_tokens,
                "prompt exceeds token limit"
            );
            return false;
        }
        true
    }

    /// Renders the prompt and applies `policy` if it does not fit.
    pub fn build(
        &self,
        ctx: &PromptContext<'_>,
        policy: OverflowPolicy,
    ) -> Result<PromptDecision, SolaceError> {
        let limit = self.token_limit();
        let system = self.render_system(ctx.emotion, ctx.memories);
        let total = self.count_with_system(&system, ctx.messages);
        debug!(prompt_tokens = total, limit, "prompt rendered");

        if self.validate_prompt_size(total) {
            return Ok(PromptDecision::Ready(self.assemble(
                system,
                ctx.messages,
                total,
                ctx.memories.len(),
            )));
        }

        match policy {
            OverflowPolicy::Skip => Ok(PromptDecision::Skip {
                prompt_tokens: total,
                limit,
            }),
            OverflowPolicy::Error => Err(SolaceError::ContextOverflow {
                prompt_tokens: total,
                limit,
            }),
            OverflowPolicy::TruncateMemories => {
                // Memories are ordered most relevant first, so drop from the back.
                for keep in (0..ctx.memories.len()).rev() {
                    let system = self.render_system(ctx.emotion, &ctx.memories[..keep]);
                    let total = self.count_with_system(&system, ctx.messages);
                    if total <= limit {
                        info!(
                            dropped = ctx.memories.len() - keep,
                            prompt_tokens = total,
                            "dropped recalled memories to fit the prompt"
                        );
                        return Ok(PromptDecision::Ready(
                            self.assemble(system, ctx.messages, total, keep),
                        ));
                    }
                }
                Ok(PromptDecision::Skip {
                    prompt_tokens: total,
                    limit,
                })
            }
        }
    }

    fn assemble(
        &self,
        system: String,
        messages: &[ChatMessage],
        prompt_tokens: usize,
        memories_used: usize,
    ) -> AssembledPrompt {
        AssembledPrompt {
            system,
            messages: messages.iter().map(ProviderMessage::from).collect(),
            prompt_tokens,
            memories_used,
        }
    }
}
