// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-turn emotion annotation.

use std::collections::BTreeMap;
use std::sync::Arc;

use solace_config::model::EmotionConfig;
use solace_core::traits::EmotionAdapter;
use solace_core::types::EmotionAnnotation;
use tracing::{debug, warn};

/// Runs the classifier on an utterance and attaches the guidance registered
/// for the detected label.
///
/// Classifier failure is never fatal: the turn proceeds as `neutral`.
pub struct EmotionHandler {
    classifier: Arc<dyn EmotionAdapter>,
    guidance: BTreeMap<String, String>,
    enabled: bool,
}

impl EmotionHandler {
    pub fn new(classifier: Arc<dyn EmotionAdapter>, guidance: BTreeMap<String, String>) -> Self {
        Self {
            classifier,
            guidance,
            enabled: true,
        }
    }

    pub fn from_config(classifier: Arc<dyn EmotionAdapter>, config: &EmotionConfig) -> Self {
        Self {
            classifier,
            guidance: config.guidance.clone(),
            enabled: config.enabled,
        }
    }

    /// Detects the primary emotion, falling back to `neutral` on error.
    pub async fn detect_label(&self, text: &str) -> String {
        if !self.enabled {
            return "neutral".to_string();
        }
        match self.classifier.detect(text).await {
            Ok(detection) => detection.primary_emotion,
            Err(e) => {
                warn!(error = %e, "emotion detection failed, using neutral");
                "neutral".to_string()
            }
        }
    }

    /// Guidance text for `label`, empty when none is registered.
    pub fn guidance_for(&self, label: &str) -> &str {
        self.guidance.get(label).map(String::as_str).unwrap_or("")
    }

    /// Computes a fresh annotation for this utterance.
    pub async fn annotate(&self, text: &str) -> EmotionAnnotation {
        let primary_emotion = self.detect_label(text).await;
        let guidance_text = self.guidance_for(&primary_emotion).to_string();
        debug!(
            emotion = primary_emotion.as_str(),
            has_guidance = !guidance_text.is_empty(),
            "annotated utterance"
        );
        EmotionAnnotation {
            primary_emotion,
            guidance_text,
        }
    }
}
