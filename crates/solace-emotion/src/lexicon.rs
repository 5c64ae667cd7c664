// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword classifier over the 28 GoEmotions labels.
//!
//! Fast and dependency-free. Each label's score is its share of all keyword
//! hits in the utterance, so scores sum to 1.0. A model-backed classifier can
//! replace this one through [`EmotionAdapter`].

use std::collections::HashMap;

use async_trait::async_trait;
use solace_core::error::SolaceError;
use solace_core::traits::{EmotionAdapter, PluginAdapter};
use solace_core::types::{AdapterType, EmotionDetection, HealthStatus};

/// Every label the classifier can emit, in table order.
pub const LABELS: &[&str] = &[
    "admiration",
    "amusement",
    "anger",
    "annoyance",
    "approval",
    "caring",
    "confusion",
    "curiosity",
    "desire",
    "disappointment",
    "disapproval",
    "disgust",
    "embarrassment",
    "excitement",
    "fear",
    "gratitude",
    "grief",
    "joy",
    "love",
    "nervousness",
    "optimism",
    "pride",
    "realization",
    "relief",
    "remorse",
    "sadness",
    "surprise",
    "neutral",
];

// ── Keyword table ───────────────────────────────────────────────────────

/// (label, keywords). Earlier entries win ties.
const KEYWORDS: &[(&str, &[&str])] = &[
    ("grief", &["passed away", "funeral", "lost my", "mourning", "grieving", "miss her", "miss him"]),
    ("sadness", &["sad", "lonely", "unhappy", "depressed", "crying", "heartbroken", "down today", "miserable"]),
    ("fear", &["afraid", "scared", "terrified", "frightened", "panic"]),
    ("nervousness", &["nervous", "anxious", "worried", "uneasy", "on edge"]),
    ("anger", &["angry", "furious", "outraged", "livid", "hate"]),
    ("annoyance", &["annoyed", "irritated", "frustrated", "fed up", "bothering"]),
    ("disgust", &["disgusting", "gross", "revolting", "sickening"]),
    ("disappointment", &["disappointed", "let down", "letdown", "bummed"]),
    ("disapproval", &["disagree", "not okay", "wrong of", "disapprove", "shouldn't have"]),
    ("remorse", &["regret", "my fault", "apologize", "ashamed of what", "feel guilty"]),
    ("embarrassment", &["embarrassed", "awkward", "humiliated", "mortified"]),
    ("confusion", &["confused", "don't understand", "makes no sense", "puzzled", "lost track"]),
    ("curiosity", &["curious", "wonder", "how does", "what if", "tell me more"]),
    ("surprise", &["surprised", "can't believe", "unexpected", "wow", "shocked"]),
    ("realization", &["i realize", "just realized", "now i see", "it dawned"]),
    ("desire", &["wish", "i want", "would love to", "longing", "craving"]),
    ("gratitude", &["thank", "grateful", "appreciate"]),
    ("admiration", &["amazing", "impressive", "brilliant", "admire", "beautiful"]),
    ("approval", &["agree", "sounds good", "good idea", "makes sense", "exactly"]),
    ("caring", &["take care", "are you okay", "hope you", "look after"]),
    ("love", &["love", "adore", "dear to me", "sweetheart"]),
    ("joy", &["happy", "glad", "delighted", "wonderful", "great day", "cheerful"]),
    ("excitement", &["excited", "can't wait", "thrilled", "looking forward"]),
    ("amusement", &["haha", "funny", "lol", "hilarious", "made me laugh"]),
    ("optimism", &["hopeful", "optimistic", "things will get better", "looking up"]),
    ("pride", &["proud", "accomplished", "achieved", "managed to"]),
    ("relief", &["relieved", "phew", "weight off", "finally over"]),
];

/// Keyword-table emotion classifier.
#[derive(Debug, Default, Clone)]
pub struct LexiconEmotionClassifier;

impl LexiconEmotionClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classifies one utterance.
    pub fn classify(&self, text: &str) -> EmotionDetection {
        let lower = text.to_lowercase();

        let hits: Vec<(&str, usize)> = KEYWORDS
            .iter()
            .map(|&(label, keywords)| {
                (label, keywords.iter().filter(|kw| lower.contains(*kw)).count())
            })
            .filter(|(_, n)| *n > 0)
            .collect();

        let total: usize = hits.iter().map(|(_, n)| n).sum();
        if total == 0 {
            return EmotionDetection {
                primary_emotion: "neutral".to_string(),
                scores: HashMap::from([("neutral".to_string(), 1.0)]),
            };
        }

        let mut primary = hits[0];
        for &(label, n) in &hits[1..] {
            if n > primary.1 {
                primary = (label, n);
            }
        }

        EmotionDetection {
            primary_emotion: primary.0.to_string(),
            scores: hits
                .into_iter()
                .map(|(label, n)| (label.to_string(), n as f32 / total as f32))
                .collect(),
        }
    }
}

#[async_trait]
impl PluginAdapter for LexiconEmotionClassifier {
    fn name(&self) -> &str {
        "lexicon"
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
impl EmotionAdapter for LexiconEmotionClassifier {
    async fn detect(&self, text: &str) -> Result<EmotionDetection, SolaceError> {
        Ok(self.classify(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_labels_are_known() {
        assert_eq!(LABELS.len(), 28);
        for (label, _) in KEYWORDS {
            assert!(LABELS.contains(label), "{label} missing from LABELS");
        }
        // Every label except neutral has keywords.
        assert_eq!(KEYWORDS.len(), 27);
    }

    #[test]
    fn no_keywords_is_neutral() {
        let d = LexiconEmotionClassifier::new().classify("The bus leaves at noon.");
        assert_eq!(d.primary_emotion, "neutral");
        assert_eq!(d.scores.get("neutral"), Some(&1.0));
    }

    #[test]
    fn detects_sadness() {
        let d = LexiconEmotionClassifier::new().classify("I feel so lonely and sad these days");
        assert_eq!(d.primary_emotion, "sadness");
        assert_eq!(d.scores["sadness"], 1.0);
    }

    #[test]
    fn scores_are_hit_shares() {
        let d = LexiconEmotionClassifier::new()
            .classify("I'm scared and afraid, but thank you for listening");
        assert_eq!(d.primary_emotion, "fear");
        let fear = d.scores["fear"];
        let gratitude = d.scores["gratitude"];
        assert!((fear - 2.0 / 3.0).abs() < 1e-6);
        assert!((gratitude - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn tie_goes_to_earlier_entry() {
        // One hit each for sadness and joy; sadness comes first in the table.
        let d = LexiconEmotionClassifier::new().classify("happy but lonely");
        assert_eq!(d.primary_emotion, "sadness");
    }

    #[tokio::test]
    async fn adapter_detect_matches_classify() {
        let c = LexiconEmotionClassifier::new();
        let d = c.detect("Thank you so much!").await.unwrap();
        assert_eq!(d.primary_emotion, "gratitude");
        assert_eq!(c.adapter_type(), AdapterType::Emotion);
    }
}
