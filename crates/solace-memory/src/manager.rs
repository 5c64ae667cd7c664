// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Moves conversation out of the short-term window into long-term memory
//! and recalls it again for new utterances.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use dashmap::DashSet;
use solace_config::model::{EvictionMode, MemoryConfig};
use solace_core::error::SolaceError;
use solace_core::traits::MemoryStoreAdapter;
use solace_core::types::{
    ChatMessage, ConversationState, MemoryQuery, MemoryRecord, Role, SessionKey, SESSION_ID_KEY,
};
use tracing::{debug, error, info, warn};

use crate::summarizer::Summarizer;

pub struct MemoryManager {
    store: Arc<dyn MemoryStoreAdapter>,
    summarizer: Option<Summarizer>,
    stm_limit: usize,
    eviction: EvictionMode,
    score_threshold: f32,
    max_db_results: usize,
    /// Namespaces written to since the last clear.
    saved: DashSet<String>,
}

impl MemoryManager {
    pub fn new(store: Arc<dyn MemoryStoreAdapter>, config: &MemoryConfig) -> Self {
        Self {
            store,
            summarizer: None,
            stm_limit: config.stm_limit,
            eviction: config.eviction,
            score_threshold: config.score_threshold,
            max_db_results: config.max_db_results,
            saved: DashSet::new(),
        }
    }

    /// Summarize AI messages before they are persisted.
    pub fn with_summarizer(mut self, summarizer: Summarizer) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Marks namespaces that already hold records, e.g. from a reopened snapshot.
    pub fn with_saved_namespaces(self, namespaces: impl IntoIterator<Item = String>) -> Self {
        for ns in namespaces {
            self.saved.insert(ns);
        }
        self
    }

    pub fn stm_limit(&self) -> usize {
        self.stm_limit
    }

    /// Whether `user_id`'s namespace has been written since the last clear.
    pub fn has_saved(&self, user_id: &str) -> bool {
        self.saved.contains(user_id)
    }

    /// The messages the next eviction would persist, if any.
    pub fn eviction_window(&self, state: &ConversationState) -> Option<Range<usize>> {
        let messages = state.messages();
        let len = messages.len();
        if len <= self.stm_limit {
            return None;
        }
        let excess = len - self.stm_limit;
        let cursor = state.evicted_until();

        match self.eviction {
            EvictionMode::FixedPair => {
                // Never reach back past the cursor, even when a turn went unanswered.
                (excess >= 2 && excess > cursor).then(|| (excess - 2).max(cursor)..excess)
            }
            EvictionMode::TurnBoundary => {
                // Pull the boundary back so a turn straddling it stays in the window.
                let mut end = excess;
                while end > 0 && messages[end - 1].turn == messages[end].turn {
                    end -= 1;
                }
                if end <= cursor {
                    return None;
                }
                let turn = messages[end - 1].turn;
                let mut start = end - 1;
                while start > cursor && messages[start - 1].turn == turn {
                    start -= 1;
                }
                Some(start..end)
            }
        }
    }

    /// Persists the turn that just left the short-term window.
    ///
    /// Returns the number of messages written. A store failure aborts the
    /// turn and leaves the eviction cursor where it was.
    pub async fn transfer_excess_to_ltm(
        &self,
        state: &mut ConversationState,
    ) -> Result<usize, SolaceError> {
        let Some(window) = self.eviction_window(state) else {
            return Ok(0);
        };
        let end = window.end;
        let count = window.len();
        let key = state.key().clone();

        self.save_to_ltm(&key, &state.messages()[window]).await?;
        state.mark_evicted(end);
        info!(
            thread_id = %key.thread_id,
            evicted = count,
            stm_limit = self.stm_limit,
            "moved messages to long-term memory"
        );
        Ok(count)
    }

    /// Writes `messages` as one labelled, newline-joined record.
    pub async fn save_to_ltm(
        &self,
        key: &SessionKey,
        messages: &[ChatMessage],
    ) -> Result<(), SolaceError> {
        if messages.is_empty() {
            debug!(thread_id = %key.thread_id, "nothing to save to long-term memory");
            return Ok(());
        }

        let mut lines = Vec::with_capacity(messages.len());
        for message in messages {
            let content = match (message.role, &self.summarizer) {
                (Role::Ai, Some(summarizer)) => {
                    match summarizer.summarize_ai_message(&message.content).await {
                        Ok(summary) => summary,
                        Err(e) => {
                            warn!(
                                thread_id = %key.thread_id,
                                error = %e,
                                "summarization failed, keeping original content"
                            );
                            message.content.clone()
                        }
                    }
                }
                _ => message.content.clone(),
            };
            lines.push(format!("{}: {}", message.role, content));
        }

        let record = MemoryRecord {
            id: uuid::Uuid::new_v4().to_string(),
            text: lines.join("\n"),
            namespace: key.user_id.clone(),
            metadata: HashMap::from([(SESSION_ID_KEY.to_string(), key.thread_id.clone())]),
        };

        if let Err(e) = self.store.add(record).await {
            error!(
                thread_id = %key.thread_id,
                user_id = %key.user_id,
                error = %e,
                "failed to save messages to long-term memory"
            );
            return Err(SolaceError::Storage {
                message: "failed to save messages to long-term memory".to_string(),
                source: Some(Box::new(e)),
            });
        }
        self.saved.insert(key.user_id.clone());
        Ok(())
    }

    /// Similarity search restricted to this thread. Best effort: failures
    /// are logged and yield no memories.
    pub async fn retrieve_relevant_context(&self, key: &SessionKey, query: &str) -> Vec<String> {
        let query = MemoryQuery {
            query: query.to_string(),
            namespace: key.user_id.clone(),
            filter: HashMap::from([(SESSION_ID_KEY.to_string(), key.thread_id.clone())]),
            k: self.max_db_results,
            score_threshold: self.score_threshold,
        };
        match self.store.search(query).await {
            Ok(memories) => {
                debug!(thread_id = %key.thread_id, recalled = memories.len(), "memories retrieved");
                memories
            }
            Err(e) => {
                warn!(thread_id = %key.thread_id, error = %e, "memory search failed");
                Vec::new()
            }
        }
    }

    /// Deletes the user's namespace if anything was written since the last clear.
    ///
    /// Returns whether a delete was issued.
    pub async fn clear_long_term_memory(&self, user_id: &str) -> Result<bool, SolaceError> {
        if !self.has_saved(user_id) {
            debug!(user_id, "no long-term memory written, skipping delete");
            return Ok(false);
        }
        self.store.delete_all(user_id).await.inspect_err(|e| {
            error!(user_id, error = %e, "failed to clear long-term memory");
        })?;
        self.saved.remove(user_id);
        info!(user_id, "long-term memory cleared");
        Ok(true)
    }
}
