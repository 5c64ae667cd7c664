// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sentence-by-sentence audio streaming with cooperative cancellation.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{self, Stream};
use solace_core::error::SolaceError;
use solace_core::traits::SpeechAdapter;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::preprocess::preprocess_text;
use crate::sentences::split_sentences;

pub type AudioStream = Pin<Box<dyn Stream<Item = Result<Bytes, SolaceError>> + Send>>;

struct AudioState {
    speech: Arc<dyn SpeechAdapter>,
    sentences: VecDeque<String>,
    pending: Bytes,
    chunk_bytes: usize,
    cancel: CancellationToken,
    ready: bool,
    done: bool,
}

/// Synthesizes `text` one sentence at a time and yields the WAV bytes in
/// pieces of at most `chunk_bytes`.
///
/// The token is checked before and after every sentence and before every
/// piece. Once it is cancelled the stream ends and audio already
/// synthesized but not yet yielded is dropped. A sentence that fails to
/// synthesize is skipped; a worker that cannot start ends the stream with
/// an error.
pub fn stream_audio(
    speech: Arc<dyn SpeechAdapter>,
    text: &str,
    chunk_bytes: usize,
    cancel: CancellationToken,
) -> AudioStream {
    let state = AudioState {
        speech,
        sentences: split_sentences(text).into(),
        pending: Bytes::new(),
        chunk_bytes: chunk_bytes.max(1),
        cancel,
        ready: false,
        done: false,
    };

    Box::pin(stream::unfold(state, |mut st| async move {
        loop {
            if st.done || st.cancel.is_cancelled() {
                return None;
            }

            if !st.pending.is_empty() {
                let n = st.chunk_bytes.min(st.pending.len());
                let piece = st.pending.split_to(n);
                return Some((Ok(piece), st));
            }

            if !st.ready {
                let ready = tokio::select! {
                    biased;
                    _ = st.cancel.cancelled() => return None,
                    r = st.speech.ensure_ready() => r,
                };
                if let Err(e) = ready {
                    st.done = true;
                    return Some((Err(e), st));
                }
                st.ready = true;
            }

            let sentence = st.sentences.pop_front()?;
            let sentence = preprocess_text(&sentence);
            if sentence.is_empty() {
                continue;
            }

            let result = tokio::select! {
                biased;
                _ = st.cancel.cancelled() => return None,
                r = st.speech.synthesize(&sentence) => r,
            };
            if st.cancel.is_cancelled() {
                debug!("audio stream cancelled after synthesis, discarding sentence");
                return None;
            }
            match result {
                Ok(audio) => st.pending = Bytes::from(audio),
                Err(e) => warn!(error = %e, "sentence synthesis failed, skipping"),
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use futures::StreamExt;
    use solace_core::traits::PluginAdapter;
    use solace_core::types::{AdapterType, HealthStatus};

    use super::*;

    #[derive(Default)]
    struct Echo {
        spoken: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
        not_ready: bool,
    }

    #[async_trait]
    impl PluginAdapter for Echo {
        fn name(&self) -> &str {
            "echo"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 0, 1)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Speech
        }
        async fn health_check(&self) -> Result<HealthStatus, SolaceError> {
            Ok(HealthStatus::Healthy)
        }
        async fn shutdown(&self) -> Result<(), SolaceError> {
            Ok(())
        }
    }

    #[async_trait]
    impl SpeechAdapter for Echo {
        async fn ensure_ready(&self) -> Result<(), SolaceError> {
            if self.not_ready {
                return Err(SolaceError::Speech {
                    message: "no worker".into(),
                    source: None,
                });
            }
            Ok(())
        }

        async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SolaceError> {
            self.spoken.lock().unwrap().push(text.to_string());
            if self.fail_on == Some(text) {
                return Err(SolaceError::Speech {
                    message: "bad sentence".into(),
                    source: None,
                });
            }
            Ok(text.as_bytes().to_vec())
        }
    }

    #[tokio::test]
    async fn yields_each_sentence_in_pieces() {
        let echo = Arc::new(Echo::default());
        let s = stream_audio(echo.clone(), "Hello there. Bye now!", 4, CancellationToken::new());
        let pieces: Vec<Bytes> = s.map(Result::unwrap).collect().await;
        assert!(pieces.iter().all(|p| p.len() <= 4));
        let joined: Vec<u8> = pieces.concat();
        assert_eq!(joined, b"Hello there.Bye now!".to_vec());
        assert_eq!(*echo.spoken.lock().unwrap(), vec!["Hello there.", "Bye now!"]);
    }

    #[tokio::test]
    async fn failed_sentence_is_skipped() {
        let echo = Arc::new(Echo {
            fail_on: Some("Two."),
            ..Default::default()
        });
        let s = stream_audio(echo, "One. Two. Three.", 1024, CancellationToken::new());
        let pieces: Vec<Bytes> = s.map(Result::unwrap).collect().await;
        assert_eq!(pieces.concat(), b"One.Three.".to_vec());
    }

    #[tokio::test]
    async fn worker_start_failure_ends_with_error() {
        let echo = Arc::new(Echo {
            not_ready: true,
            ..Default::default()
        });
        let mut s = stream_audio(echo.clone(), "One.", 1024, CancellationToken::new());
        assert!(s.next().await.unwrap().is_err());
        assert!(s.next().await.is_none());
        assert!(echo.spoken.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancel_mid_sentence_discards_rest() {
        let echo = Arc::new(Echo::default());
        let cancel = CancellationToken::new();
        let mut s = stream_audio(echo.clone(), "Abcdefgh. Second.", 2, cancel.clone());

        assert_eq!(s.next().await.unwrap().unwrap(), Bytes::from_static(b"Ab"));
        cancel.cancel();
        assert!(s.next().await.is_none());
        assert_eq!(echo.spoken.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cancelled_before_start_synthesizes_nothing() {
        let echo = Arc::new(Echo::default());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut s = stream_audio(echo.clone(), "One. Two.", 1024, cancel);
        assert!(s.next().await.is_none());
        assert!(echo.spoken.lock().unwrap().is_empty());
    }
}
