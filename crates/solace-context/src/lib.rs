// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt assembly for the Solace companion.
//!
//! - **System prompt**: companion instructions from file, inline config or the default persona
//! - **Trimmer**: the short-term window of recent messages
//! - **Prompt builder**: template rendering, token accounting and overflow policy

pub mod prompt;
pub mod system_prompt;
pub mod trimmer;

use std::sync::Arc;

use solace_config::model::ContextConfig;
use solace_core::error::SolaceError;
use solace_core::tokenizer::{HfTokenCounter, TiktokenCounter, TokenCounter};
use tracing::info;

pub use prompt::{AssembledPrompt, PromptBuilder, PromptContext, PromptDecision};
pub use system_prompt::{default_persona, load_system_prompt};
pub use trimmer::StmTrimmer;

/// Picks the token counter named by `[context]`.
///
/// A `tokenizer_file` wins over the tiktoken encoding name.
pub fn token_counter_from_config(
    config: &ContextConfig,
) -> Result<Arc<dyn TokenCounter>, SolaceError> {
    if let Some(ref path) = config.tokenizer_file {
        info!(path = %path.display(), "using model tokenizer file");
        return Ok(Arc::new(HfTokenCounter::from_file(path)?));
    }
    info!(encoding = config.tokenizer.as_str(), "using tiktoken encoding");
    Ok(Arc::new(TiktokenCounter::for_encoding(&config.tokenizer)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_cl100k() {
        let counter = token_counter_from_config(&ContextConfig::default()).unwrap();
        assert_eq!(counter.count("hello world"), 2);
    }

    #[test]
    fn bad_encoding_is_config_error() {
        let config = ContextConfig {
            tokenizer: "nope".into(),
            ..Default::default()
        };
        assert!(matches!(
            token_counter_from_config(&config),
            Err(SolaceError::Config(_))
        ));
    }

    #[test]
    fn missing_tokenizer_file_is_config_error() {
        let config = ContextConfig {
            tokenizer_file: Some("/nonexistent/tokenizer.json".into()),
            ..Default::default()
        };
        assert!(token_counter_from_config(&config).is_err());
    }
}
