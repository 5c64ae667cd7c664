// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token counting against the target model's own tokenizer.
//!
//! Prompt budget checks must count what the model actually receives, so
//! identical text can yield different counts for different models.

use std::path::Path;

use tracing::{debug, warn};

use crate::error::SolaceError;

/// Counts tokens in a piece of text.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

/// BPE counter backed by a tiktoken encoding.
pub struct TiktokenCounter {
    encoding: String,
    bpe: tiktoken_rs::CoreBPE,
}

impl TiktokenCounter {
    /// Loads one of the bundled encodings by name.
    pub fn for_encoding(name: &str) -> Result<Self, SolaceError> {
        let bpe = match name {
            "cl100k_base" => tiktoken_rs::cl100k_base(),
            "o200k_base" => tiktoken_rs::o200k_base(),
            "p50k_base" => tiktoken_rs::p50k_base(),
            "r50k_base" => tiktoken_rs::r50k_base(),
            other => {
                return Err(SolaceError::Config(format!(
                    "unknown tiktoken encoding `{other}` (expected cl100k_base, o200k_base, p50k_base or r50k_base)"
                )));
            }
        }
        .map_err(|e| SolaceError::Config(format!("failed to load encoding {name}: {e}")))?;

        debug!(encoding = name, "loaded tiktoken encoding");
        Ok(Self {
            encoding: name.to_string(),
            bpe,
        })
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}

/// Counter backed by a HuggingFace `tokenizer.json` shipped with the model.
pub struct HfTokenCounter {
    tokenizer: tokenizers::Tokenizer,
}

impl HfTokenCounter {
    pub fn from_file(path: &Path) -> Result<Self, SolaceError> {
        let tokenizer = tokenizers::Tokenizer::from_file(path).map_err(|e| {
            SolaceError::Config(format!(
                "failed to load tokenizer from {}: {e}",
                path.display()
            ))
        })?;
        debug!(path = %path.display(), "loaded tokenizer");
        Ok(Self { tokenizer })
    }
}

impl TokenCounter for HfTokenCounter {
    fn count(&self, text: &str) -> usize {
        match self.tokenizer.encode(text, false) {
            Ok(encoding) => encoding.len(),
            Err(e) => {
                // Over-estimate rather than under-count against the budget.
                warn!(error = %e, "tokenizer failed to encode text, estimating from length");
                text.len().div_ceil(2)
            }
        }
    }
}
