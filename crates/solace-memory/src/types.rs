// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stored record type and vector math for the long-term store.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A long-term memory record together with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMemory {
    pub id: String,
    pub text: String,
    pub metadata: HashMap<String, String>,
    pub embedding: Vec<f32>,
    pub created_at: String,
}

impl StoredMemory {
    /// True when every `filter` pair is present in the record's metadata.
    pub fn matches(&self, filter: &HashMap<String, String>) -> bool {
        filter
            .iter()
            .all(|(k, v)| self.metadata.get(k).is_some_and(|m| m == v))
    }
}

/// Cosine similarity between two vectors of equal length.
///
/// Returns `None` on a length mismatch and 0.0 when either vector is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Some(0.0);
    }
    Some(dot / (norm_a * norm_b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_identical() {
        let v = vec![0.3, 0.4, 0.5];
        let sim = cosine_similarity(&v, &v).unwrap();
        assert!((sim - 1.0).abs() < 1e-6, "got {sim}");
    }

    #[test]
    fn cosine_orthogonal() {
        let sim = cosine_similarity(&[1.0, 0.0], &[0.0, 2.0]).unwrap();
        assert!(sim.abs() < f32::EPSILON);
    }

    #[test]
    fn cosine_is_scale_invariant() {
        let a = cosine_similarity(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap();
        assert!((a - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_length_mismatch() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), None);
    }

    #[test]
    fn cosine_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), Some(0.0));
    }

    #[test]
    fn filter_matching() {
        let record = StoredMemory {
            id: "m1".into(),
            text: "t".into(),
            metadata: HashMap::from([("session_id".to_string(), "t1".to_string())]),
            embedding: vec![],
            created_at: String::new(),
        };
        assert!(record.matches(&HashMap::new()));
        assert!(record.matches(&HashMap::from([("session_id".into(), "t1".into())])));
        assert!(!record.matches(&HashMap::from([("session_id".into(), "t2".into())])));
        assert!(!record.matches(&HashMap::from([("other".into(), "t1".into())])));
    }
}
