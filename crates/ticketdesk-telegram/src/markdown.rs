// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain-text rendering of MarkdownV2 replies.
//!
//! Used when Telegram rejects a reply's markup: the retry must not show
//! escape backslashes or formatting markers to the user.

/// Strips MarkdownV2 markup: escapes become their literal character, bold and
/// italic markers are dropped and code fences are removed. Text inside code
/// blocks is kept as is, apart from escaped backticks and backslashes.
pub fn to_plain(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_code = false;

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '`' => {
                let mut run = 1;
                while chars.peek() == Some(&'`') {
                    chars.next();
                    run += 1;
                }
                if run >= 3 {
                    in_code = !in_code;
                    // The fence line ends right after the opening backticks.
                    if in_code && chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                } else if in_code {
                    out.extend(std::iter::repeat_n('`', run));
                }
            }
            '*' | '_' | '~' | '|' if !in_code => {}
            _ => out.push(ch),
        }
    }

    out
}
