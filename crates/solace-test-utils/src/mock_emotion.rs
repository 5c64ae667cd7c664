// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-label emotion classifier.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use solace_core::error::SolaceError;
use solace_core::traits::{EmotionAdapter, PluginAdapter};
use solace_core::types::{AdapterType, EmotionDetection, HealthStatus};

pub struct MockEmotion {
    label: String,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl MockEmotion {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// A classifier whose every call fails.
    pub fn failing() -> Self {
        let mock = Self::new("neutral");
        mock.set_fail(true);
        mock
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockEmotion {
    fn default() -> Self {
        Self::new("neutral")
    }
}

#[async_trait]
impl PluginAdapter for MockEmotion {
    fn name(&self) -> &str {
        "mock-emotion"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Emotion
    }

    async fn health_check(&self) -> Result<HealthStatus, SolaceError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SolaceError> {
        Ok(())
    }
}

#[async_trait]
impl EmotionAdapter for MockEmotion {
    async fn detect(&self, _text: &str) -> Result<EmotionDetection, SolaceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(SolaceError::Emotion {
                message: "mock classifier unavailable".into(),
            });
        }
        Ok(EmotionDetection {
            primary_emotion: self.label.clone(),
            scores: HashMap::from([(self.label.clone(), 1.0)]),
        })
    }
}
