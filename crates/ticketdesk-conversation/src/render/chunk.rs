// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Packing rendered message blocks into size-bounded chunks.

use super::markdown::{char_len, escape_code_char};

/// Drawn between consecutive messages of the same chunk.
pub const SEPARATOR: &str = "\n┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄";

/// Pack `blocks` in order behind `header`, starting a new chunk with
/// `continuation` whenever the next block would push the current one past `limit`.
///
/// Every block must fit behind the longer of the two headers. The result is
/// never empty; with no blocks it is just the header.
pub fn pack(header: &str, continuation: &str, blocks: &[String], limit: usize) -> Vec<String> {
    let sep_len = char_len(SEPARATOR);
    let mut chunks = Vec::new();
    let mut current = header.to_string();
    let mut current_len = char_len(header);
    let mut in_chunk = 0usize;

    for block in blocks {
        let block_len = char_len(block);
        debug_assert!(
            char_len(header).max(char_len(continuation)) + block_len <= limit,
            "block of {block_len} chars cannot fit a chunk of {limit}"
        );
        if in_chunk > 0 && current_len + sep_len + block_len > limit {
            chunks.push(std::mem::replace(&mut current, continuation.to_string()));
            current_len = char_len(continuation);
            in_chunk = 0;
        }
        if in_chunk > 0 {
            current.push_str(SEPARATOR);
            current_len += sep_len;
        }
        current.push_str(block);
        current_len += block_len;
        in_chunk += 1;
    }

    chunks.push(current);
    chunks
}

/// Escape `raw` for a `pre` entity and cut it into parts of at most `capacity`
/// escaped characters. An escape sequence is never split.
pub fn split_code(raw: &str, capacity: usize) -> Vec<String> {
    let capacity = capacity.max(2);
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for c in raw.chars() {
        let escaped = escape_code_char(c);
        let piece_len = if escaped.is_empty() { 1 } else { 2 };
        if current_len + piece_len > capacity && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if escaped.is_empty() {
            current.push(c);
        } else {
            current.push_str(escaped);
        }
        current_len += piece_len;
    }

    if !current.is_empty() || parts.is_empty() {
        parts.push(current);
    }
    parts
}
