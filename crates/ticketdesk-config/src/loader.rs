// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./ticketdesk.toml` > `~/.config/ticketdesk/ticketdesk.toml`
//! > `/etc/ticketdesk/ticketdesk.toml` with environment variable overrides via
//! the `TICKETDESK_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::DeskConfig;

pub(crate) const LOCAL_FILE: &str = "ticketdesk.toml";
pub(crate) const XDG_FILE: &str = "ticketdesk/ticketdesk.toml";
pub(crate) const SYSTEM_FILE: &str = "/etc/ticketdesk/ticketdesk.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/ticketdesk/ticketdesk.toml`
/// 3. `~/.config/ticketdesk/ticketdesk.toml`
/// 4. `./ticketdesk.toml`
/// 5. `TICKETDESK_*` environment variables
pub fn load_config() -> Result<DeskConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only. No files, no environment.
pub fn load_config_from_str(toml_content: &str) -> Result<DeskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DeskConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<DeskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DeskConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(DeskConfig::default()))
        .merge(Toml::file(SYSTEM_FILE))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join(XDG_FILE))
                .unwrap_or_default(),
        ))
        .merge(Toml::file(LOCAL_FILE))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")`: `TICKETDESK_TELEGRAM_BOT_TOKEN`
/// must map to `telegram.bot_token`, not `telegram.bot.token`.
fn env_provider() -> Env {
    Env::prefixed("TICKETDESK_").map(|key| {
        let mapped = key
            .as_str()
            .replacen("agent_", "agent.", 1)
            .replacen("telegram_", "telegram.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("render_", "render.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_local_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                LOCAL_FILE,
                r#"
[telegram]
bot_token = "from-file"

[render]
max_messages = 20
"#,
            )?;
            jail.set_env("TICKETDESK_TELEGRAM_BOT_TOKEN", "from-env");
            jail.set_env("TICKETDESK_RENDER_MAX_PHOTOS", "4");

            let config = load_config()?;
            assert_eq!(config.telegram.bot_token.as_deref(), Some("from-env"));
            assert_eq!(config.render.max_messages, 20);
            assert_eq!(config.render.max_photos, 4);
            Ok(())
        });
    }

    #[test]
    fn explicit_path_skips_local_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(LOCAL_FILE, "[agent]\nname = \"local\"\n")?;
            jail.create_file("other.toml", "[agent]\nname = \"other\"\n")?;

            let config = load_config_from_path(Path::new("other.toml"))?;
            assert_eq!(config.agent.name, "other");
            Ok(())
        });
    }

    #[test]
    fn underscore_keys_keep_their_underscores() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("TICKETDESK_AGENT_USER_QUEUE_CAPACITY", "8");
            jail.set_env("TICKETDESK_STORAGE_WAL_MODE", "false");

            let config = load_config()?;
            assert_eq!(config.agent.user_queue_capacity, 8);
            assert!(!config.storage.wal_mode);
            Ok(())
        });
    }
}
