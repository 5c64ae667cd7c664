// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the collaborators of the conversation pipeline.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod embedding;
pub mod emotion;
pub mod memory_store;
pub mod provider;
pub mod speech;

// Re-export all traits at the traits module level for convenience.
pub use adapter::PluginAdapter;
pub use embedding::EmbeddingAdapter;
pub use emotion::EmotionAdapter;
pub use memory_store::MemoryStoreAdapter;
pub use provider::{ProviderAdapter, ProviderStream};
pub use speech::SpeechAdapter;
