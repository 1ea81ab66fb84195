// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply keyboards and the button labels the conversation reacts to.
//!
//! Incoming text is matched against labels after [`normalize_label`], so the
//! decorated label and its plain form are equivalent.

use ticketdesk_core::types::{Button, Category, Keyboard, Ticket, TicketId};

use crate::lifecycle::status_badge;
use crate::render::truncate;
use crate::validation::normalize_label;

pub const ACTIVE_TICKETS: &str = "🎯 Активные тикеты";
pub const TICKET_HISTORY: &str = "📚 История тикетов";
pub const CREATE_TICKET: &str = "✨ Создать тикет";
pub const CANCEL: &str = "❌ Отмена";
pub const YES: &str = "✅ Да";
pub const NO: &str = "❌ Нет";
pub const VIEW_PHOTOS: &str = "🖼 Просмотреть фото";
pub const CLOSE_TICKET: &str = "❌ Закрыть тикет";
pub const BACK: &str = "⬅️ Назад";
pub const SHARE_CONTACT: &str = "Поделиться контактом";

/// Whether user input selects the button labelled `label`.
pub fn is_button(input: &str, label: &str) -> bool {
    let wanted = normalize_label(label);
    !wanted.is_empty() && normalize_label(input) == wanted
}

pub fn main_menu() -> Keyboard {
    Keyboard {
        rows: vec![
            vec![text(ACTIVE_TICKETS), text(TICKET_HISTORY)],
            vec![text(CREATE_TICKET)],
        ],
    }
}

pub fn categories() -> Keyboard {
    let buttons: Vec<Button> = Category::ALL.into_iter().map(|c| text(c.button())).collect();
    let mut rows: Vec<Vec<Button>> = buttons.chunks(2).map(<[Button]>::to_vec).collect();
    rows.push(vec![text(CANCEL)]);
    Keyboard { rows }
}

pub fn confirm() -> Keyboard {
    Keyboard {
        rows: vec![vec![text(YES), text(NO)]],
    }
}

pub fn share_contact() -> Keyboard {
    Keyboard {
        rows: vec![vec![Button::RequestContact(SHARE_CONTACT.to_string())]],
    }
}

/// Actions under an opened ticket. Closed and read-only tickets offer no close button.
pub fn ticket_actions(can_close: bool) -> Keyboard {
    let first_row = if can_close {
        vec![text(VIEW_PHOTOS), text(CLOSE_TICKET)]
    } else {
        vec![text(VIEW_PHOTOS)]
    };
    Keyboard {
        rows: vec![first_row, vec![text(BACK)]],
    }
}

/// One button per ticket followed by a back button.
pub fn ticket_list(labels: Vec<String>) -> Keyboard {
    let mut rows: Vec<Vec<Button>> = labels.into_iter().map(|l| vec![Button::Text(l)]).collect();
    rows.push(vec![text(BACK)]);
    Keyboard { rows }
}

/// `#<id> <status emoji> <title> [<n> сообщ.]`
pub fn ticket_button(ticket: &Ticket, message_count: u64, title_chars: usize) -> String {
    format!(
        "#{} {} {} [{} сообщ.]",
        ticket.id,
        status_badge(ticket.status).emoji,
        truncate(&ticket.title, title_chars),
        message_count
    )
}

/// Extract the ticket id from a `#<digits> ...` button label.
pub fn parse_ticket_button(input: &str) -> Option<TicketId> {
    let rest = input.trim().strip_prefix('#')?;
    let end = rest
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(rest.len(), |(i, _)| i);
    let (digits, tail) = rest.split_at(end);
    if digits.is_empty() || !(tail.is_empty() || tail.starts_with(char::is_whitespace)) {
        return None;
    }
    digits.parse().ok().map(TicketId)
}

fn text(label: &str) -> Button {
    Button::Text(label.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ticketdesk_core::types::{TicketStatus, UserId};

    #[test]
    fn buttons_match_with_or_without_decoration() {
        assert!(is_button("⬅️ Назад", BACK));
        assert!(is_button("назад", BACK));
        assert!(is_button("  Да ", YES));
        assert!(!is_button("Нет", YES));
        assert!(!is_button("❌ Отмена", NO));
        assert!(is_button("Закрыть тикет", CLOSE_TICKET));
    }

    #[test]
    fn parses_ticket_buttons() {
        assert_eq!(
            parse_ticket_button("#12 ⏳ Вопрос: принтер [3 сообщ.]"),
            Some(TicketId(12))
        );
        assert_eq!(parse_ticket_button("#7"), Some(TicketId(7)));
        assert_eq!(parse_ticket_button("#abc"), None);
        assert_eq!(parse_ticket_button("#"), None);
        assert_eq!(parse_ticket_button("#12abc"), None);
        assert_eq!(parse_ticket_button("12"), None);
        assert_eq!(parse_ticket_button("#99999999999999999999999"), None);
    }

    #[test]
    fn ticket_button_round_trips_id() {
        let ticket = Ticket {
            id: TicketId(41),
            owner: UserId(1),
            title: "Вопрос: очень длинное название тикета про принтер".into(),
            description: String::new(),
            category: Category::Question,
            status: TicketStatus::Created,
            created_at: Utc::now(),
            closed_at: None,
        };
        let label = ticket_button(&ticket, 5, 25);
        assert!(label.starts_with("#41 🆕 "));
        assert!(label.ends_with(" [5 сообщ.]"));
        assert_eq!(parse_ticket_button(&label), Some(TicketId(41)));
    }

    #[test]
    fn category_keyboard_lists_every_category_and_cancel() {
        let kb = categories();
        let labels: Vec<_> = kb
            .rows
            .iter()
            .flatten()
            .map(|b| match b {
                Button::Text(t) | Button::RequestContact(t) => t.as_str(),
            })
            .collect();
        assert_eq!(labels, vec!["💭 Вопрос", "🚨 Важно,Срочно", "💰 Финансы", CANCEL]);
    }

    #[test]
    fn ticket_actions_hide_close_when_not_allowed() {
        assert_eq!(ticket_actions(true).rows[0].len(), 2);
        assert_eq!(ticket_actions(false).rows[0].len(), 1);
    }

    #[test]
    fn contact_keyboard_requests_contact() {
        assert!(matches!(
            share_contact().rows[0][0],
            Button::RequestContact(_)
        ));
    }
}
