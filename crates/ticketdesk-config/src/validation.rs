// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::DeskConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &DeskConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        fail(format!(
            "agent.log_level `{}` is not one of {}",
            config.agent.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.agent.user_queue_capacity == 0 {
        fail("agent.user_queue_capacity must be at least 1".to_string());
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.telegram.media_dir.trim().is_empty() {
        fail("telegram.media_dir must not be empty".to_string());
    }

    if config
        .telegram
        .bot_token
        .as_deref()
        .is_some_and(|token| token.trim().is_empty())
    {
        fail("telegram.bot_token must not be empty when set".to_string());
    }

    let render = &config.render;
    if !(500..=4096).contains(&render.max_chunk_chars) {
        fail(format!(
            "render.max_chunk_chars must be between 500 and 4096, got {}",
            render.max_chunk_chars
        ));
    }

    for (key, value) in [
        ("render.max_messages", render.max_messages),
        ("render.max_photos", render.max_photos),
        ("render.max_history_tickets", render.max_history_tickets),
        ("render.button_title_chars", render.button_title_chars),
    ] {
        if value == 0 {
            fail(format!("{key} must be at least 1"));
        }
    }

    if render.utc_offset_minutes.abs() > 14 * 60 {
        fail(format!(
            "render.utc_offset_minutes must be within ±840, got {}",
            render.utc_offset_minutes
        ));
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

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&DeskConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = DeskConfig::default();
        config.agent.log_level = "loud".into();
        config.storage.database_path = "  ".into();
        config.render.max_chunk_chars = 10_000;
        config.render.max_photos = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn rejects_out_of_range_offset() {
        let mut config = DeskConfig::default();
        config.render.utc_offset_minutes = -900;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("utc_offset_minutes"));
    }

    #[test]
    fn rejects_blank_token() {
        let mut config = DeskConfig::default();
        config.telegram.bot_token = Some(" ".into());
        assert!(validate_config(&config).is_err());
    }
}
