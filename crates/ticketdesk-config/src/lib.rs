// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the ticketdesk support bot.
//!
//! TOML configuration with strict validation (`deny_unknown_fields`), XDG file
//! hierarchy lookup, environment variable overrides, and diagnostic rendering
//! with typo suggestions.
//!
//! ```no_run
//! use ticketdesk_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("database: {}", config.storage.database_path);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, ConfigSource, render_errors, report};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::DeskConfig;

/// Load configuration from the XDG hierarchy and validate it.
pub fn load_and_validate() -> Result<DeskConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::from_figment(err, &collect_toml_sources())),
    }
}

/// Load configuration from one explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<DeskConfig, Vec<ConfigError>> {
    match loader::load_config_from_path(path) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources: Vec<ConfigSource> = ConfigSource::read(path).into_iter().collect();
            Err(diagnostic::from_figment(err, &sources))
        }
    }
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<DeskConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            Err(diagnostic::from_figment(
                err,
                &[ConfigSource::inline(toml_content)],
            ))
        }
    }
}

/// Serialize the effective configuration back to TOML with the bot token masked.
pub fn to_redacted_toml(config: &DeskConfig) -> Result<String, toml::ser::Error> {
    let mut shown = config.clone();
    if shown.telegram.bot_token.is_some() {
        shown.telegram.bot_token = Some("<redacted>".to_string());
    }
    toml::to_string_pretty(&shown)
}

/// Every hierarchy file that exists, for pointing errors at their lines.
fn collect_toml_sources() -> Vec<ConfigSource> {
    let local = std::env::current_dir()
        .map(|d| d.join(loader::LOCAL_FILE))
        .unwrap_or_else(|_| loader::LOCAL_FILE.into());
    let user = dirs::config_dir().map(|d| d.join(loader::XDG_FILE));
    let system = Some(std::path::PathBuf::from(loader::SYSTEM_FILE));

    [Some(local), user, system]
        .into_iter()
        .flatten()
        .filter_map(|path| ConfigSource::read(&path))
        .collect()
}
