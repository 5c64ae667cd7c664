// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process store of conversation logs, one per (user, thread).

use std::sync::Arc;

use dashmap::DashMap;
use solace_core::types::{ConversationState, SessionKey};
use tokio::sync::Mutex;

/// Shared handle to one conversation. Holding the lock serializes turns.
pub type SharedConversation = Arc<Mutex<ConversationState>>;

/// Lazily creates and hands out conversation logs.
///
/// Logs live as long as the registry. Nothing is written to disk.
#[derive(Default)]
pub struct ConversationRegistry {
    states: DashMap<SessionKey, SharedConversation>,
}

impl ConversationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&self, key: &SessionKey) -> SharedConversation {
        if let Some(state) = self.states.get(key) {
            return Arc::clone(state.value());
        }
        self.states
            .entry(key.clone())
            .or_insert_with(|| {
                tracing::debug!(user_id = %key.user_id, thread_id = %key.thread_id, "conversation created");
                Arc::new(Mutex::new(ConversationState::new(key.clone())))
            })
            .clone()
    }

    pub fn get(&self, key: &SessionKey) -> Option<SharedConversation> {
        self.states.get(key).map(|s| Arc::clone(s.value()))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
