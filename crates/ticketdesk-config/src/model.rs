// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level configuration. Every section is optional and defaults sensibly.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DeskConfig {
    /// Process identity, logging and event loop settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Telegram bot integration settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Ticket rendering limits.
    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name used in logs and `check-config` output.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Pending events buffered per user. Events beyond it are dropped with a busy notice.
    #[serde(default = "default_user_queue_capacity")]
    pub user_queue_capacity: usize,

    /// Seconds to wait for in-flight events on shutdown.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            user_queue_capacity: default_user_queue_capacity(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

fn default_agent_name() -> String {
    "ticketdesk".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_user_queue_capacity() -> usize {
    32
}

fn default_shutdown_grace_secs() -> u64 {
    30
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. Required by `serve`.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Telegram user IDs or usernames allowed to talk to the bot. Empty allows everyone.
    #[serde(default)]
    pub allowed_users: Vec<String>,

    /// Directory where attached photos and avatars are stored.
    #[serde(default = "default_media_dir")]
    pub media_dir: String,

    /// Download profile pictures during registration.
    #[serde(default = "default_fetch_avatars")]
    pub fetch_avatars: bool,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            allowed_users: Vec::new(),
            media_dir: default_media_dir(),
            fetch_avatars: default_fetch_avatars(),
        }
    }
}

fn default_media_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("ticketdesk").join("uploads"))
        .unwrap_or_else(|| std::path::PathBuf::from("uploads"))
        .to_string_lossy()
        .into_owned()
}

fn default_fetch_avatars() -> bool {
    true
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("ticketdesk").join("ticketdesk.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("ticketdesk.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Limits applied when rendering tickets back to the user.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    /// Maximum characters per outbound chunk. Kept under Telegram's 4096 hard limit.
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// Most recent messages shown when rendering a ticket.
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,

    /// Most recent photos shown in a photo listing.
    #[serde(default = "default_max_photos")]
    pub max_photos: usize,

    /// Most recent tickets listed in the history view.
    #[serde(default = "default_max_history_tickets")]
    pub max_history_tickets: usize,

    /// Characters of the title kept on ticket list buttons.
    #[serde(default = "default_button_title_chars")]
    pub button_title_chars: usize,

    /// Offset from UTC applied to displayed timestamps, in minutes.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: default_max_chunk_chars(),
            max_messages: default_max_messages(),
            max_photos: default_max_photos(),
            max_history_tickets: default_max_history_tickets(),
            button_title_chars: default_button_title_chars(),
            utc_offset_minutes: 0,
        }
    }
}

fn default_max_chunk_chars() -> usize {
    4000
}

fn default_max_messages() -> usize {
    50
}

fn default_max_photos() -> usize {
    10
}

fn default_max_history_tickets() -> usize {
    50
}

fn default_button_title_chars() -> usize {
    25
}
