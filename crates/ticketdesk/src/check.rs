// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ticketdesk check-config` command implementation.
//!
//! Runs after the configuration has loaded and validated, and reports whether
//! the bot can actually start with it.

use std::fmt::Write as _;
use std::path::Path;

use ticketdesk_config::DeskConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: &'static str,
    pub status: CheckStatus,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct CheckReport {
    pub results: Vec<CheckResult>,
}

impl CheckReport {
    /// No check failed. Warnings do not block startup.
    pub fn is_ready(&self) -> bool {
        self.results.iter().all(|r| r.status != CheckStatus::Fail)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "\n  ticketdesk check-config");
        let _ = writeln!(out, "  {}", "-".repeat(50));
        for result in &self.results {
            let tag = match result.status {
                CheckStatus::Pass => "[OK]  ",
                CheckStatus::Warn => "[WARN]",
                CheckStatus::Fail => "[FAIL]",
            };
            let _ = writeln!(out, "    {tag} {:<16} {}", result.name, result.message);
        }
        let _ = writeln!(out);
        out
    }
}

pub fn check_config(config: &DeskConfig) -> CheckReport {
    CheckReport {
        results: vec![
            check_bot_token(config),
            check_parent_dir("database", Path::new(&config.storage.database_path)),
            check_media_dir(Path::new(&config.telegram.media_dir)),
            check_allow_list(config),
        ],
    }
}

fn check_bot_token(config: &DeskConfig) -> CheckResult {
    match config.telegram.bot_token.as_deref() {
        Some(_) => CheckResult {
            name: "bot token",
            status: CheckStatus::Pass,
            message: "set".into(),
        },
        None => CheckResult {
            name: "bot token",
            status: CheckStatus::Fail,
            message: "telegram.bot_token is not set (or TICKETDESK_TELEGRAM_BOT_TOKEN)".into(),
        },
    }
}

fn check_parent_dir(name: &'static str, path: &Path) -> CheckResult {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    if parent.is_dir() {
        CheckResult {
            name,
            status: CheckStatus::Pass,
            message: path.display().to_string(),
        }
    } else {
        CheckResult {
            name,
            status: CheckStatus::Warn,
            message: format!("{} will be created on startup", parent.display()),
        }
    }
}

fn check_media_dir(path: &Path) -> CheckResult {
    if path.is_file() {
        return CheckResult {
            name: "media dir",
            status: CheckStatus::Fail,
            message: format!("{} is a file, not a directory", path.display()),
        };
    }
    let message = if path.is_dir() {
        path.display().to_string()
    } else {
        format!("{} will be created on first photo", path.display())
    };
    CheckResult {
        name: "media dir",
        status: if path.is_dir() {
            CheckStatus::Pass
        } else {
            CheckStatus::Warn
        },
        message,
    }
}

fn check_allow_list(config: &DeskConfig) -> CheckResult {
    let allowed = &config.telegram.allowed_users;
    if allowed.is_empty() {
        CheckResult {
            name: "allowed users",
            status: CheckStatus::Warn,
            message: "empty, every Telegram user may open tickets".into(),
        }
    } else {
        CheckResult {
            name: "allowed users",
            status: CheckStatus::Pass,
            message: format!("{} entries", allowed.len()),
        }
    }
}
