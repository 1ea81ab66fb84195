// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping of reply keyboards onto Telegram reply markup.

use teloxide::types::{ButtonRequest, KeyboardButton, KeyboardMarkup, KeyboardRemove, ReplyMarkup};
use ticketdesk_core::types::{Button, Keyboard, KeyboardAction};

/// Markup to attach to a message, or `None` to leave the client's keyboard alone.
pub fn reply_markup(action: &KeyboardAction) -> Option<ReplyMarkup> {
    match action {
        KeyboardAction::Keep => None,
        KeyboardAction::Remove => Some(ReplyMarkup::KeyboardRemove(KeyboardRemove::new())),
        KeyboardAction::Show(keyboard) => Some(ReplyMarkup::Keyboard(keyboard_markup(keyboard))),
    }
}

fn keyboard_markup(keyboard: &Keyboard) -> KeyboardMarkup {
    let rows: Vec<Vec<KeyboardButton>> = keyboard
        .rows
        .iter()
        .map(|row| row.iter().map(button).collect())
        .collect();
    KeyboardMarkup::new(rows).resize_keyboard()
}

fn button(button: &Button) -> KeyboardButton {
    match button {
        Button::Text(label) => KeyboardButton::new(label.clone()),
        Button::RequestContact(label) => {
            KeyboardButton::new(label.clone()).request(ButtonRequest::Contact)
        }
    }
}
