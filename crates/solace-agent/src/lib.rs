// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation pipeline for the Solace companion.
//!
//! The [`TurnOrchestrator`] runs each turn through eviction, trimming,
//! retrieval, emotion annotation and prompt validation before calling the
//! model. The [`StreamingSessionController`] hands out cancellable streams,
//! one per session.

pub mod session;
pub mod shutdown;
pub mod state;
pub mod workflow;

pub use session::StreamingSessionController;
pub use shutdown::{cancel_streams_on_shutdown, install_signal_handler};
pub use state::{ConversationRegistry, SharedConversation};
pub use workflow::{
    ClearSummary, GenerationSettings, TurnEvent, TurnOrchestrator, TurnOutcome, TurnStream,
};
