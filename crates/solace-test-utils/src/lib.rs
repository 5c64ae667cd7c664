// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Solace integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic tests without an Ollama server or a speech worker.
//!
//! # Components
//!
//! - [`MockProvider`] - scripted language model with a call counter
//! - [`MockMemoryStore`] - recording store with failure injection
//! - [`MockEmotion`] / [`MockEmbedder`] - deterministic classifiers
//! - [`TestHarness`] - orchestrator and controller wired over the mocks

pub mod harness;
pub mod mock_embedder;
pub mod mock_emotion;
pub mod mock_memory;
pub mod mock_provider;

pub use harness::{TestHarness, TestHarnessBuilder, WordCounter};
pub use mock_embedder::MockEmbedder;
pub use mock_emotion::MockEmotion;
pub use mock_memory::MockMemoryStore;
pub use mock_provider::{word_tokens, MockProvider, MockReply};
