// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram MarkdownV2 escaping.

const SPECIAL: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    '\\',
];

/// Escape text placed outside of entities.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if SPECIAL.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape `text` and cut it so the escaped form is at most `max` characters,
/// marking a cut with an escaped `...`. An escape sequence is never split.
pub fn escape_within(text: &str, max: usize) -> String {
    let escaped = escape(text);
    if char_len(&escaped) <= max {
        return escaped;
    }
    let marker = "\\.\\.\\.";
    let budget = max.saturating_sub(char_len(marker));
    let mut out = String::new();
    let mut len = 0usize;
    for c in text.chars() {
        let piece = if SPECIAL.contains(&c) { 2 } else { 1 };
        if len + piece > budget {
            break;
        }
        if piece == 2 {
            out.push('\\');
        }
        out.push(c);
        len += piece;
    }
    if max >= char_len(marker) {
        out.push_str(marker);
    }
    out
}

/// Escape one character for use inside a `pre` or `code` entity.
pub(crate) fn escape_code_char(c: char) -> &'static str {
    match c {
        '`' => "\\`",
        '\\' => "\\\\",
        _ => "",
    }
}

/// Escape text placed inside a `pre` or `code` entity.
pub fn escape_code(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match escape_code_char(c) {
            "" => out.push(c),
            escaped => out.push_str(escaped),
        }
    }
    out
}

/// Length in characters, the unit Telegram limits are expressed in.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
