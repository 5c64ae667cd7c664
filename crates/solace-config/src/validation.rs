// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as the prompt budget leaving room for a response.

use crate::diagnostic::ConfigError;
use crate::model::SolaceConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &SolaceConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        fail(format!(
            "agent.log_level `{}` must be one of {}",
            config.agent.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.model.model.trim().is_empty() {
        fail("model.model must not be empty".to_string());
    }

    let base_url = config.model.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        fail(format!(
            "model.base_url `{base_url}` must start with http:// or https://"
        ));
    }

    if config.model.request_timeout_secs == 0 {
        fail("model.request_timeout_secs must be greater than 0".to_string());
    }

    if config.memory.stm_limit < 1 {
        fail("memory.stm_limit must be at least 1".to_string());
    }

    if config.memory.stm_token_budget == Some(0) {
        fail("memory.stm_token_budget must be greater than 0 when set".to_string());
    }

    let threshold = config.memory.score_threshold;
    if !(0.0..=1.0).contains(&threshold) {
        fail(format!(
            "memory.score_threshold must be between 0 and 1, got {threshold}"
        ));
    }

    if config.memory.max_db_results < 1 {
        fail("memory.max_db_results must be at least 1".to_string());
    }

    if config.memory.embedding_dim < 1 {
        fail("memory.embedding_dim must be at least 1".to_string());
    }

    // The window must leave room for the response.
    if config.context.max_context_tokens <= config.model.max_tokens as usize {
        fail(format!(
            "context.max_context_tokens ({}) must be greater than model.max_tokens ({})",
            config.context.max_context_tokens, config.model.max_tokens
        ));
    }

    if config.speech.enabled && config.speech.command.as_deref().is_none_or(str::is_empty) {
        fail("speech.command must be set when speech.enabled = true".to_string());
    }

    if config.speech.handshake_timeout_secs == 0 {
        fail("speech.handshake_timeout_secs must be greater than 0".to_string());
    }

    if config.speech.request_timeout_secs == 0 {
        fail("speech.request_timeout_secs must be greater than 0".to_string());
    }

    if config.speech.chunk_bytes == 0 {
        fail("speech.chunk_bytes must be greater than 0".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = SolaceConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn zero_stm_limit_fails_validation() {
        let mut config = SolaceConfig::default();
        config.memory.stm_limit = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "stm_limit"));
    }

    #[test]
    fn response_budget_must_fit_context() {
        let mut config = SolaceConfig::default();
        config.context.max_context_tokens = 512;
        config.model.max_tokens = 512;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "max_context_tokens"));
    }

    #[test]
    fn speech_enabled_requires_command() {
        let mut config = SolaceConfig::default();
        config.speech.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "speech.command"));

        config.speech.command = Some("python3".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = SolaceConfig::default();
        config.agent.log_level = "loud".into();
        config.model.base_url = "localhost:11434".into();
        config.memory.score_threshold = 1.5;
        config.memory.max_db_results = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(has_error(&errors, "log_level"));
        assert!(has_error(&errors, "base_url"));
        assert!(has_error(&errors, "score_threshold"));
        assert!(has_error(&errors, "max_db_results"));
    }

    #[test]
    fn zero_timeouts_rejected() {
        let mut config = SolaceConfig::default();
        config.model.request_timeout_secs = 0;
        config.speech.request_timeout_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "model.request_timeout_secs"));
        assert!(has_error(&errors, "speech.request_timeout_secs"));
    }
}
