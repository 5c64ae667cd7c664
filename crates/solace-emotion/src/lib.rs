// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Emotion detection for the Solace companion.
//!
//! The [`EmotionHandler`] turns each new utterance into an
//! [`EmotionAnnotation`](solace_core::types::EmotionAnnotation) for the
//! prompt. [`LexiconEmotionClassifier`] is the built-in classifier.

pub mod handler;
pub mod lexicon;

pub use handler::EmotionHandler;
pub use lexicon::{LexiconEmotionClassifier, LABELS};
