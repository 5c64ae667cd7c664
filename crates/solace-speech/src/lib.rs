// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Speech output for the Solace companion.
//!
//! A [`TtsWorker`] keeps one synthesis process alive and talks to it over a
//! length-prefixed frame protocol. [`stream_audio`] turns a reply into a
//! cancellable stream of WAV chunks, one sentence at a time.

pub mod codec;
pub mod preprocess;
pub mod process;
pub mod sentences;
pub mod stream;
pub mod worker;

pub use preprocess::preprocess_text;
pub use process::ProcessState;
pub use sentences::split_sentences;
pub use stream::{stream_audio, AudioStream};
pub use worker::TtsWorker;
