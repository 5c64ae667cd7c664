// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Solace companion.
//!
//! This crate provides the adapter trait definitions, the error type, the
//! conversation types and token counting used throughout the workspace.
//! Every external collaborator (language model, embedder, emotion
//! classifier, memory store, speech worker) implements a trait defined here.

pub mod error;
pub mod tokenizer;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::SolaceError;
pub use tokenizer::{HfTokenCounter, TiktokenCounter, TokenCounter};
pub use types::{
    AdapterType, ChatMessage, ConversationState, EmotionAnnotation, HealthStatus, Role,
    SessionKey,
};

// Re-export all adapter traits at crate root.
pub use traits::{
    EmbeddingAdapter, EmotionAdapter, MemoryStoreAdapter, PluginAdapter, ProviderAdapter,
    ProviderStream, SpeechAdapter,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solace_error_has_all_variants() {
        let _config = SolaceError::Config("test".into());
        let _storage = SolaceError::Storage {
            message: "test".into(),
            source: Some(Box::new(std::io::Error::other("test"))),
        };
        let _provider = SolaceError::Provider {
            message: "test".into(),
            source: None,
        };
        let _emotion = SolaceError::Emotion {
            message: "test".into(),
        };
        let _speech = SolaceError::Speech {
            message: "test".into(),
            source: None,
        };
        let _overflow = SolaceError::ContextOverflow {
            prompt_tokens: 10,
            limit: 5,
        };
        let _busy = SolaceError::SessionBusy {
            session_key: "a/b".into(),
        };
        let _timeout = SolaceError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = SolaceError::Internal("test".into());
    }

    #[test]
    fn turn_error_names_thread_and_cause() {
        let err = SolaceError::Provider {
            message: "connection refused".into(),
            source: None,
        }
        .in_turn("t1");
        let msg = err.to_string();
        assert!(msg.contains("failed to process input for thread t1"));
        assert!(msg.contains("connection refused"));

        // Wrapping twice keeps the innermost thread.
        let again = err.in_turn("t2");
        assert!(again.to_string().contains("thread t1"));
    }

    #[test]
    fn timeout_detected_through_turn_wrapper() {
        let err = SolaceError::Timeout {
            duration: std::time::Duration::from_secs(1),
        }
        .in_turn("t1");
        assert!(err.is_timeout());
        assert!(!SolaceError::Internal("x".into()).is_timeout());
    }

    #[test]
    fn adapter_type_round_trip() {
        use std::str::FromStr;

        let variants = [
            AdapterType::Provider,
            AdapterType::Embedding,
            AdapterType::Emotion,
            AdapterType::MemoryStore,
            AdapterType::Speech,
        ];

        for variant in &variants {
            let s = variant.to_string();
            let parsed = AdapterType::from_str(&s).expect("should parse back");
            assert_eq!(*variant, parsed);

            let json = serde_json::to_string(variant).expect("should serialize");
            let back: AdapterType = serde_json::from_str(&json).expect("should deserialize");
            assert_eq!(*variant, back);
        }
    }

    #[test]
    fn health_status_variants() {
        let healthy = HealthStatus::Healthy;
        let degraded = HealthStatus::Degraded("slow".into());
        let unhealthy = HealthStatus::Unhealthy("down".into());

        assert_eq!(healthy, HealthStatus::Healthy);
        assert_ne!(degraded, healthy);
        assert_ne!(unhealthy, healthy);
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_provider_adapter<T: ProviderAdapter>() {}
        fn _assert_embedding_adapter<T: EmbeddingAdapter>() {}
        fn _assert_emotion_adapter<T: EmotionAdapter>() {}
        fn _assert_memory_store_adapter<T: MemoryStoreAdapter>() {}
        fn _assert_speech_adapter<T: SpeechAdapter>() {}
        fn _assert_token_counter<T: TokenCounter>() {}
    }
}
