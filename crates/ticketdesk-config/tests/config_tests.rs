// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the configuration system.

use ticketdesk_config::diagnostic::ConfigError;
use ticketdesk_config::{load_and_validate_str, load_config_from_str};

#[test]
fn valid_toml_deserializes_into_desk_config() {
    let toml = r#"
[agent]
name = "desk-test"
log_level = "debug"
user_queue_capacity = 4
shutdown_grace_secs = 5

[telegram]
bot_token = "123:ABC"
allowed_users = ["alice", "42"]
media_dir = "/tmp/uploads"
fetch_avatars = false

[storage]
database_path = "/tmp/test.db"
wal_mode = false

[render]
max_chunk_chars = 3500
max_messages = 30
max_photos = 5
max_history_tickets = 20
button_title_chars = 20
utc_offset_minutes = 180
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.agent.name, "desk-test");
    assert_eq!(config.agent.user_queue_capacity, 4);
    assert_eq!(config.telegram.bot_token.as_deref(), Some("123:ABC"));
    assert_eq!(config.telegram.allowed_users, vec!["alice", "42"]);
    assert!(!config.telegram.fetch_avatars);
    assert_eq!(config.storage.database_path, "/tmp/test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.render.max_chunk_chars, 3500);
    assert_eq!(config.render.utc_offset_minutes, 180);
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_and_validate_str("").expect("defaults should validate");
    assert_eq!(config.agent.name, "ticketdesk");
    assert_eq!(config.render.max_messages, 50);
    assert!(config.telegram.bot_token.is_none());
}

#[test]
fn unknown_render_key_suggests_correction() {
    let toml = "[render]\nmax_mesages = 3\n";
    let errors = load_and_validate_str(toml).expect_err("unknown key must be rejected");
    match &errors[0] {
        ConfigError::UnknownKey {
            key,
            suggestion,
            span,
            ..
        } => {
            assert_eq!(key, "max_mesages");
            assert_eq!(suggestion.as_deref(), Some("max_messages"));
            assert!(span.is_some());
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn unknown_section_is_rejected() {
    let errors = load_and_validate_str("[anthropic]\napi_key = \"x\"\n").unwrap_err();
    assert!(matches!(errors[0], ConfigError::UnknownKey { .. }));
}

#[test]
fn wrong_type_produces_invalid_type() {
    let toml = "[render]\nmax_photos = \"ten\"\n";
    let errors = load_and_validate_str(toml).unwrap_err();
    match &errors[0] {
        ConfigError::InvalidType { key, span, .. } => {
            assert_eq!(key, "render.max_photos");
            let span = span.expect("value should be located");
            assert_eq!(&toml[span.offset()..span.offset() + span.len()], "max_photos");
        }
        other => panic!("expected InvalidType, got {other:?}"),
    }
}

#[test]
fn unknown_section_points_at_its_header() {
    let toml = "[agent]\nname = \"desk\"\n\n[anthropic]\napi_key = \"x\"\n";
    let errors = load_and_validate_str(toml).unwrap_err();
    match &errors[0] {
        ConfigError::UnknownKey {
            key, table, span, ..
        } => {
            assert_eq!(key, "anthropic");
            assert!(table.is_empty());
            let span = span.expect("header should be located");
            assert_eq!(&toml[span.offset()..span.offset() + span.len()], "anthropic");
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn report_shows_suggestion_and_accepted_keys() {
    let errors = load_and_validate_str("[render]\nmax_mesages = 3\n").unwrap_err();
    let text = ticketdesk_config::report(&errors);
    assert!(text.contains("unknown configuration key `render.max_mesages`"));
    assert!(text.contains("did you mean `max_messages`?"));
    assert!(text.contains("[render] accepts"));
}

#[test]
fn semantic_errors_surface_as_validation() {
    let errors = load_and_validate_str("[render]\nmax_chunk_chars = 100\n").unwrap_err();
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
}

#[test]
fn redacted_dump_hides_token_and_reloads() {
    let config =
        load_and_validate_str("[telegram]\nbot_token = \"123:secret\"\nallowed_users = [\"42\"]\n")
            .unwrap();
    let dumped = ticketdesk_config::to_redacted_toml(&config).unwrap();
    assert!(!dumped.contains("123:secret"));
    assert!(dumped.contains("<redacted>"));

    let reloaded = load_config_from_str(&dumped).unwrap();
    assert_eq!(reloaded.telegram.allowed_users, vec!["42".to_string()]);
    assert_eq!(reloaded.render, config.render);
}
