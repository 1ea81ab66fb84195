// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Load errors as miette diagnostics that point into the offending TOML file.

// The miette derive expands to assignments the lint cannot see through.
#![allow(unused_assignments)]

use std::path::Path;

use figment::error::Kind;
use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme, NamedSource, SourceSpan};
use thiserror::Error;

/// Typos scoring below this Jaro-Winkler similarity get no suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A TOML document that took part in loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub name: String,
    pub text: String,
}

impl ConfigSource {
    pub fn inline(text: &str) -> Self {
        Self {
            name: "<inline>".to_string(),
            text: text.to_string(),
        }
    }

    /// Read `path`, or `None` when it does not exist or is unreadable.
    pub fn read(path: &Path) -> Option<Self> {
        std::fs::read_to_string(path).ok().map(|text| Self {
            name: path.display().to_string(),
            text,
        })
    }

    fn named(&self) -> NamedSource<String> {
        NamedSource::new(&self.name, self.text.clone())
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{}`", qualified(.table, .key))]
    #[diagnostic(
        code(ticketdesk::config::unknown_key),
        help("{}", unknown_key_help(table, suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Dotted table the key appeared in, empty for the top level.
        table: String,
        suggestion: Option<String>,
        valid_keys: Vec<String>,
        #[label("not a ticketdesk setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: found {found}")]
    #[diagnostic(code(ticketdesk::config::invalid_type), help("use {expected} here"))]
    InvalidType {
        /// Dotted path of the value.
        key: String,
        found: String,
        expected: String,
        #[label("expected {expected}")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(ticketdesk::config::missing_key),
        help("set `{key}` in ticketdesk.toml or through a TICKETDESK_ variable")
    )]
    MissingKey { key: String },

    /// A value that parsed but is out of range for the bot.
    #[error("{message}")]
    #[diagnostic(code(ticketdesk::config::validation))]
    Validation { message: String },

    #[error("cannot load configuration: {0}")]
    #[diagnostic(code(ticketdesk::config::other))]
    Other(String),
}

fn qualified(table: &str, key: &str) -> String {
    if table.is_empty() {
        key.to_string()
    } else {
        format!("{table}.{key}")
    }
}

fn unknown_key_help(table: &str, suggestion: Option<&str>, valid_keys: &[String]) -> String {
    let scope = if table.is_empty() {
        "the top level".to_string()
    } else {
        format!("[{table}]")
    };
    let accepted = format!("{scope} accepts {}", valid_keys.join(", "));
    match suggestion {
        Some(s) => format!("did you mean `{s}`? {accepted}"),
        None => accepted,
    }
}

/// One diagnostic per error carried by `err`.
pub fn from_figment(err: figment::Error, sources: &[ConfigSource]) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| {
            let path: Vec<String> = error.path.clone();
            match &error.kind {
                Kind::UnknownField(key, expected) => {
                    let located = source_of(&error, sources)
                        .and_then(|source| locate(source, &path, key, Target::KeyOrTable));
                    let (span, src) = located.unzip();
                    ConfigError::UnknownKey {
                        key: key.clone(),
                        table: path.join("."),
                        suggestion: suggest_key(key, expected),
                        valid_keys: expected.iter().map(|k| k.to_string()).collect(),
                        span,
                        src,
                    }
                }
                Kind::MissingField(key) if path.last().is_some_and(|last| *last == **key) => {
                    ConfigError::MissingKey {
                        key: path.join("."),
                    }
                }
                Kind::MissingField(key) => ConfigError::MissingKey {
                    key: qualified(&path.join("."), key),
                },
                Kind::InvalidType(found, expected) => {
                    let located = path.split_last().and_then(|(key, table)| {
                        source_of(&error, sources)
                            .and_then(|source| locate(source, table, key, Target::Key))
                    });
                    let (span, src) = located.unzip();
                    ConfigError::InvalidType {
                        key: path.join("."),
                        found: found.to_string(),
                        expected: expected.to_string(),
                        span,
                        src,
                    }
                }
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

/// The document that produced `error`. Inline providers carry no file name, so
/// a single known document is assumed to be theirs.
fn source_of<'a>(
    error: &figment::Error,
    sources: &'a [ConfigSource],
) -> Option<&'a ConfigSource> {
    let file = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| s.file_path())
        .map(|p| p.display().to_string());
    match file {
        Some(name) => sources.iter().find(|s| s.name == name),
        None if sources.len() == 1 => sources.first(),
        None => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Key,
    /// A key, or failing that a `[table]` header of that name.
    KeyOrTable,
}

fn locate(
    source: &ConfigSource,
    table: &[String],
    key: &str,
    target: Target,
) -> Option<(SourceSpan, NamedSource<String>)> {
    let offset = find_key_offset(&source.text, table, key).or_else(|| match target {
        Target::KeyOrTable => find_table_offset(&source.text, table, key),
        Target::Key => None,
    })?;
    Some((SourceSpan::new(offset.into(), key.len()), source.named()))
}

/// Byte offset of `key` assigned directly inside `table`. Lookup stops at the
/// next table header, so a same-named key elsewhere is never reported.
pub fn find_key_offset(text: &str, table: &[String], key: &str) -> Option<usize> {
    let wanted = table.join(".");
    let mut current = String::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        let body = line.trim_start();
        if let Some(name) = header_name(body) {
            current = name;
            continue;
        }
        if current != wanted {
            continue;
        }
        let assigns = body
            .strip_prefix(key)
            .is_some_and(|rest| rest.trim_start().starts_with('='));
        if assigns {
            return Some(start + (line.len() - body.len()));
        }
    }
    None
}

/// Byte offset of `name` inside a `[table.name]` header.
fn find_table_offset(text: &str, table: &[String], name: &str) -> Option<usize> {
    let full = qualified(&table.join("."), name);
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let body = line.trim_start();
        if header_name(body).as_deref() == Some(full.as_str()) {
            let at = body.find(name)?;
            return Some(offset + (line.len() - body.len()) + at);
        }
        offset += line.len();
    }
    None
}

/// `render` for a `[render]` header line, `None` for anything else.
fn header_name(line: &str) -> Option<String> {
    let inner = line.strip_prefix('[')?;
    let end = inner.find(']')?;
    Some(inner[..end].trim().to_string())
}

/// Closest accepted key to `unknown`, ignoring case.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    let unknown = unknown.to_lowercase();
    valid_keys
        .iter()
        .map(|&key| (strsim::jaro_winkler(&unknown, &key.to_lowercase()), key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// All diagnostics as plain text, without colors.
pub fn report(errors: &[ConfigError]) -> String {
    render_with(
        &GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor()),
        errors,
    )
}

fn render_with(handler: &GraphicalReportHandler, errors: &[ConfigError]) -> String {
    let mut out = String::new();
    for error in errors {
        let mut rendered = String::new();
        match handler.render_report(&mut rendered, error as &dyn Diagnostic) {
            Ok(()) => out.push_str(&rendered),
            Err(_) => out.push_str(&format!("error: {error}\n")),
        }
    }
    out
}

/// Print every diagnostic to stderr.
pub fn render_errors(errors: &[ConfigError]) {
    eprint!("{}", render_with(&GraphicalReportHandler::new(), errors));
    eprintln!(
        "ticketdesk: {} configuration problem(s), not starting",
        errors.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str) -> Vec<String> {
        vec![name.to_string()]
    }

    #[test]
    fn suggests_closest_render_key() {
        let valid = &["max_chunk_chars", "max_messages", "max_photos"];
        assert_eq!(
            suggest_key("max_mesages", valid),
            Some("max_messages".to_string())
        );
        assert_eq!(
            suggest_key("MAX_PHOTOS", valid),
            Some("max_photos".to_string())
        );
    }

    #[test]
    fn distant_typo_gets_no_suggestion() {
        let valid = &["bot_token", "allowed_users", "media_dir"];
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn key_is_found_inside_its_table() {
        let text = "[agent]\nname = \"x\"\n\n[render]\nmax_mesages = 3\n";
        let o = find_key_offset(text, &table("render"), "max_mesages").unwrap();
        assert_eq!(&text[o..o + 11], "max_mesages");
    }

    #[test]
    fn same_key_in_another_table_is_ignored() {
        let text = "[agent]\nname = \"x\"\n[storage]\nwal_mode = true\n";
        assert!(find_key_offset(text, &table("storage"), "name").is_none());
        let top = find_key_offset("name = 1\n[agent]\n", &[], "name").unwrap();
        assert_eq!(top, 0);
    }

    #[test]
    fn crlf_line_endings_keep_offsets_exact() {
        let text = "[storage]\r\n  wal_mod = true\r\n";
        let o = find_key_offset(text, &table("storage"), "wal_mod").unwrap();
        assert_eq!(&text[o..o + 7], "wal_mod");
    }

    #[test]
    fn key_prefix_is_not_a_match() {
        let text = "[render]\nmax_photos_extra = 1\nmax_photos = 2\n";
        let o = find_key_offset(text, &table("render"), "max_photos").unwrap();
        assert!(text[o..].starts_with("max_photos = 2"));
    }

    #[test]
    fn unknown_table_header_is_located() {
        let text = "[agent]\nname = \"x\"\n[ anthropic ]\napi_key = 1\n";
        let o = find_table_offset(text, &[], "anthropic").unwrap();
        assert_eq!(&text[o..o + 9], "anthropic");
    }

    #[test]
    fn help_names_the_table_and_suggestion() {
        let keys = vec!["max_messages".to_string(), "max_photos".to_string()];
        assert_eq!(
            unknown_key_help("render", Some("max_messages"), &keys),
            "did you mean `max_messages`? [render] accepts max_messages, max_photos"
        );
        assert_eq!(
            unknown_key_help("", None, &keys),
            "the top level accepts max_messages, max_photos"
        );
    }

    #[test]
    fn report_lists_every_error() {
        let errors = [
            ConfigError::Validation {
                message: "render.max_chunk_chars must be between 500 and 4096, got 100".into(),
            },
            ConfigError::MissingKey {
                key: "telegram.bot_token".into(),
            },
        ];
        let text = report(&errors);
        assert!(text.contains("render.max_chunk_chars must be between 500 and 4096"));
        assert!(text.contains("missing required key `telegram.bot_token`"));
    }
}
