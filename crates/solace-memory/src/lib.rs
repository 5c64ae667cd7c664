// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-term memory for the Solace companion.
//!
//! - **MemoryManager**: evicts old turns from the short-term window into
//!   long-term memory and recalls them for new utterances
//! - **VectorMemoryStore**: namespaced cosine-similarity store with an
//!   optional JSON snapshot
//! - **Summarizer**: condenses AI messages before they are persisted

pub mod manager;
pub mod store;
pub mod summarizer;
pub mod types;

pub use manager::MemoryManager;
pub use store::VectorMemoryStore;
pub use summarizer::Summarizer;
pub use types::{cosine_similarity, StoredMemory};
