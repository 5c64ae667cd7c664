// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streaming session controller.
//!
//! Tracks at most one in-flight stream per [`SessionKey`], each with its own
//! [`CancellationToken`]. Cancelling one session never touches another.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::stream::{self, StreamExt};
use solace_core::error::SolaceError;
use solace_core::traits::SpeechAdapter;
use solace_core::types::SessionKey;
use solace_speech::{stream_audio, AudioStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::workflow::{TurnEvent, TurnOrchestrator, TurnStream};

struct ActiveStream {
    cancel: CancellationToken,
    id: u64,
}

type ActiveMap = Arc<DashMap<SessionKey, ActiveStream>>;

/// Removes the registry entry it was created for, unless a newer stream has
/// since taken the key.
struct ActiveGuard {
    active: ActiveMap,
    key: SessionKey,
    id: u64,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        if self
            .active
            .remove_if(&self.key, |_, a| a.id == self.id)
            .is_some()
        {
            debug!(session = %self.key, stream_id = self.id, "stream released");
        }
    }
}

/// Hands out cancellable text and audio streams, one per session.
pub struct StreamingSessionController {
    orchestrator: Arc<TurnOrchestrator>,
    active: ActiveMap,
    speech: Option<Arc<dyn SpeechAdapter>>,
    chunk_bytes: usize,
    next_id: AtomicU64,
}

impl StreamingSessionController {
    pub fn new(orchestrator: Arc<TurnOrchestrator>) -> Self {
        Self {
            orchestrator,
            active: Arc::new(DashMap::new()),
            speech: None,
            chunk_bytes: 16 * 1024,
            next_id: AtomicU64::new(1),
        }
    }

    /// Enables [`start_audio`](Self::start_audio).
    pub fn with_speech(mut self, speech: Arc<dyn SpeechAdapter>, chunk_bytes: usize) -> Self {
        self.speech = Some(speech);
        self.chunk_bytes = chunk_bytes.max(1);
        self
    }

    pub fn orchestrator(&self) -> &Arc<TurnOrchestrator> {
        &self.orchestrator
    }

    pub fn has_speech(&self) -> bool {
        self.speech.is_some()
    }

    /// Starts a streamed text turn.
    ///
    /// Fails with [`SolaceError::SessionBusy`] while another stream for the
    /// same key is in flight. The key is released when the stream reaches
    /// its terminal event, ends, or is dropped.
    pub fn start_text(
        &self,
        key: SessionKey,
        utterance: impl Into<String>,
    ) -> Result<TurnStream, SolaceError> {
        let (cancel, guard) = self.register(&key)?;
        let inner = self.orchestrator.stream_turn(key, utterance.into(), cancel);

        Ok(Box::pin(stream::unfold(
            (inner, Some(guard)),
            |(mut inner, mut guard)| async move {
                let event = inner.next().await?;
                if event.is_terminal() {
                    guard.take();
                }
                Some((event, (inner, guard)))
            },
        )))
    }

    /// Starts a turn whose reply is spoken.
    ///
    /// The text reply is generated and committed first, then synthesized
    /// sentence by sentence. One token covers both phases, so a cancel at
    /// any point stops the request and discards pending audio.
    pub fn start_audio(
        &self,
        key: SessionKey,
        utterance: impl Into<String>,
    ) -> Result<AudioStream, SolaceError> {
        let Some(speech) = self.speech.clone() else {
            return Err(SolaceError::Speech {
                message: "speech output is not enabled".into(),
                source: None,
            });
        };
        let (cancel, guard) = self.register(&key)?;
        let mut text = self
            .orchestrator
            .stream_turn(key.clone(), utterance.into(), cancel.clone());
        let chunk_bytes = self.chunk_bytes;

        let audio = async move {
            let mut reply = None;
            while let Some(event) = text.next().await {
                if cancel.is_cancelled() {
                    return silent();
                }
                match event {
                    TurnEvent::Token(_) => {}
                    TurnEvent::Completed(message) => reply = Some(message.content),
                    TurnEvent::Skipped { .. } => {
                        info!(session = %key, "reply skipped, nothing to speak");
                        return silent();
                    }
                    TurnEvent::Error(message) => {
                        return stream::iter([Err(SolaceError::Internal(message))]).boxed();
                    }
                }
            }
            match reply {
                Some(reply) if !cancel.is_cancelled() => {
                    stream_audio(speech, &reply, chunk_bytes, cancel)
                }
                _ => silent(),
            }
        };

        let inner: AudioStream = Box::pin(stream::once(audio).flatten());
        Ok(Box::pin(stream::unfold(
            (inner, guard),
            |(mut inner, guard)| async move {
                let item = inner.next().await?;
                Some((item, (inner, guard)))
            },
        )))
    }

    /// Cancels the key's in-flight stream, if any, and frees the key.
    pub fn cancel(&self, key: &SessionKey) -> bool {
        match self.active.remove(key) {
            Some((_, active)) => {
                active.cancel.cancel();
                info!(session = %key, stream_id = active.id, "stream cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancels every in-flight stream. Returns how many there were.
    pub fn cancel_all(&self) -> usize {
        let keys: Vec<SessionKey> = self.active.iter().map(|e| e.key().clone()).collect();
        let cancelled = keys.iter().filter(|key| self.cancel(key)).count();
        if cancelled > 0 {
            info!(count = cancelled, "cancelled active streams");
        }
        cancelled
    }

    pub fn is_active(&self, key: &SessionKey) -> bool {
        self.active.contains_key(key)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    fn register(&self, key: &SessionKey) -> Result<(CancellationToken, ActiveGuard), SolaceError> {
        match self.active.entry(key.clone()) {
            Entry::Occupied(_) => Err(SolaceError::SessionBusy {
                session_key: key.to_string(),
            }),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let cancel = CancellationToken::new();
                slot.insert(ActiveStream {
                    cancel: cancel.clone(),
                    id,
                });
                debug!(session = %key, stream_id = id, "stream registered");
                Ok((
                    cancel,
                    ActiveGuard {
                        active: Arc::clone(&self.active),
                        key: key.clone(),
                        id,
                    },
                ))
            }
        }
    }
}

fn silent() -> AudioStream {
    stream::empty().boxed()
}
