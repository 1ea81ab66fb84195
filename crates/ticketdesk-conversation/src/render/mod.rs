// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket rendering.
//!
//! Turns a ticket and its ordered messages into MarkdownV2 chunks that each stay
//! under the configured size. Rendering is pure: the same input always yields
//! byte-identical output.

pub mod chunk;
pub mod markdown;
pub mod photos;

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use ticketdesk_config::model::RenderConfig;
use ticketdesk_core::types::{Outbound, Reply, SenderKind, Ticket, TicketMessage, UserId};

use crate::lifecycle::status_badge;
use chunk::{SEPARATOR, pack, split_code};
use markdown::{char_len, escape, escape_within};

pub use photos::{PhotoEntry, PhotoListing};

/// Titles longer than this are cut in headers so a header always leaves room for messages.
const HEADER_TITLE_CHARS: usize = 120;

const SENDER_NAME_CHARS: usize = 64;

/// Share of a chunk the escaped title may take in a header.
const HEADER_TITLE_SHARE: usize = 5;

/// Escaped body characters every message block can carry.
const MIN_BODY_CHARS: usize = 16;

pub(crate) const SUPPORT_FALLBACK_NAME: &str = "Поддержка";

/// Display names of support staff, keyed by sender id.
pub type SenderNames = HashMap<UserId, String>;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderLimits {
    pub max_chunk_chars: usize,
    pub max_messages: usize,
    pub max_photos: usize,
    pub utc_offset: FixedOffset,
}

impl From<&RenderConfig> for RenderLimits {
    fn from(config: &RenderConfig) -> Self {
        Self {
            max_chunk_chars: config.max_chunk_chars,
            max_messages: config.max_messages,
            max_photos: config.max_photos,
            utc_offset: FixedOffset::east_opt(config.utc_offset_minutes * 60)
                .unwrap_or_else(|| Utc.fix()),
        }
    }
}

impl Default for RenderLimits {
    fn default() -> Self {
        Self::from(&RenderConfig::default())
    }
}

/// Whether the rendered ticket may be written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Interactive,
    ReadOnly,
}

/// A rendered conversation: an optional truncation notice followed by chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTicket {
    pub notice: Option<String>,
    pub chunks: Vec<String>,
}

impl RenderedTicket {
    pub fn into_outbound(self) -> Vec<Outbound> {
        self.notice
            .map(Reply::plain)
            .into_iter()
            .chain(self.chunks.into_iter().map(Reply::markdown))
            .map(Outbound::from)
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConversationRenderer {
    limits: RenderLimits,
}

impl ConversationRenderer {
    pub fn new(limits: RenderLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &RenderLimits {
        &self.limits
    }

    /// Render the most recent messages of `ticket` into size-bounded chunks.
    pub fn render(
        &self,
        ticket: &Ticket,
        messages: &[TicketMessage],
        names: &SenderNames,
        mode: RenderMode,
    ) -> RenderedTicket {
        let total = messages.len();
        let shown = &messages[total.saturating_sub(self.limits.max_messages)..];
        let notice = (shown.len() < total).then(|| {
            format!(
                "⚠️ Показаны только последние {} сообщений из {}",
                shown.len(),
                total
            )
        });

        let header = self.header(ticket, mode);
        let continuation = continuation_header(ticket, mode);

        if shown.is_empty() {
            let chunk = format!("{header}\n🔍 В этом тикете пока нет сообщений\\.");
            return RenderedTicket {
                notice,
                chunks: vec![chunk],
            };
        }

        let room = self
            .limits
            .max_chunk_chars
            .saturating_sub(char_len(&header).max(char_len(&continuation)))
            .saturating_sub(char_len(SEPARATOR));
        let blocks: Vec<String> = shown
            .iter()
            .flat_map(|message| self.message_blocks(message, names, room))
            .collect();

        RenderedTicket {
            notice,
            chunks: pack(&header, &continuation, &blocks, self.limits.max_chunk_chars),
        }
    }

    /// Prompt sent after the conversation, describing what the user can do next.
    pub fn follow_up(&self, ticket: &Ticket, mode: RenderMode) -> String {
        match mode {
            RenderMode::ReadOnly => "📖 *Режим просмотра \\(только чтение\\)*\n\n\
                 🖼 Для просмотра фотографий нажмите 'Просмотреть фото'\n\
                 ⬅️ Для возврата к истории тикетов нажмите 'Назад'"
                .to_string(),
            RenderMode::Interactive if ticket.status.is_open() => {
                "✏️ *Чтобы ответить, просто напишите сообщение или прикрепите фотографию\\.*\n\n\
                 🖼 Для просмотра фотографий нажмите 'Просмотреть фото'\n\
                 ⬅️ Для возврата в меню нажмите 'Назад'"
                    .to_string()
            }
            RenderMode::Interactive => "🔒 *Тикет закрыт и не может быть обновлен\\.*\n\n\
                 🖼 Вы можете просмотреть прикрепленные фотографии\n\
                 ⬅️ Или вернуться в главное меню"
                .to_string(),
        }
    }

    /// Summary card for the `/ticket` command.
    pub fn status_card(&self, ticket: &Ticket, message_count: u64) -> String {
        let badge = status_badge(ticket.status);
        let closed = ticket
            .closed_at
            .map(|ts| format!("\n🔒 Закрыт: {}", escape(&self.timestamp(ts))))
            .unwrap_or_default();
        format!(
            "🔖 *Тикет \\#{}*\n\
             {} {}\n\n\
             📝 Тема: {}\n\
             🏷️ Категория: {}\n\
             📅 Создан: {}{closed}\n\
             💬 Сообщений: {}\n\n\
             *Описание:*\n{}",
            ticket.id,
            badge.emoji,
            escape(badge.description),
            escape(&truncate(&ticket.title, HEADER_TITLE_CHARS)),
            escape(ticket.category.label()),
            escape(&self.timestamp(ticket.created_at)),
            message_count,
            escape(&ticket.description),
        )
    }

    pub(crate) fn timestamp(&self, ts: DateTime<Utc>) -> String {
        ts.with_timezone(&self.limits.utc_offset)
            .format("%d.%m.%Y %H:%M")
            .to_string()
    }

    fn header(&self, ticket: &Ticket, mode: RenderMode) -> String {
        let title_line = match mode {
            RenderMode::Interactive => format!("🎫 *ТИКЕТ \\#{}* 🎫", ticket.id),
            RenderMode::ReadOnly => format!("📖 *ТИКЕТ \\#{} \\(ТОЛЬКО ПРОСМОТР\\)* 📖", ticket.id),
        };
        let badge = status_badge(ticket.status);
        format!(
            "{title_line}\n\n\
             📝 *Тема:* {}\n\
             📅 *Создан:* {}\n\
             🏷️ *Категория:* {}\n\
             📊 *Статус:* {} {}\n\n\
             💬 *ИСТОРИЯ ДИАЛОГА:*\n",
            escape_within(
                &truncate(&ticket.title, HEADER_TITLE_CHARS),
                self.limits.max_chunk_chars / HEADER_TITLE_SHARE,
            ),
            escape(&self.timestamp(ticket.created_at)),
            escape(ticket.category.label()),
            badge.emoji,
            escape(badge.description),
        )
    }

    /// One message as one or more blocks, each at most `room` characters.
    fn message_blocks(
        &self,
        message: &TicketMessage,
        names: &SenderNames,
        room: usize,
    ) -> Vec<String> {
        let (emoji, sender, prefix) = match message.sender_kind {
            SenderKind::User => ("👤", "Вы".to_string(), "💬"),
            SenderKind::Support => (
                "👨‍💼",
                names
                    .get(&message.sender_id)
                    .map(|name| truncate(name, SENDER_NAME_CHARS))
                    .unwrap_or_else(|| SUPPORT_FALLBACK_NAME.to_string()),
                "🗨️",
            ),
        };
        let time = escape(&self.timestamp(message.created_at));
        let opener = |name: &str| format!("\n{emoji} *{name}* \\({time}\\)\n{prefix} ```\n");
        let close = "\n```\n";
        let name_room =
            room.saturating_sub(char_len(&opener("")) + char_len(close) + MIN_BODY_CHARS);
        let open = opener(&escape_within(&sender, name_room));
        let capacity = room.saturating_sub(char_len(&open) + char_len(close));

        split_code(&message.body, capacity)
            .into_iter()
            .map(|part| format!("{open}{part}{close}"))
            .collect()
    }
}

fn continuation_header(ticket: &Ticket, mode: RenderMode) -> String {
    match mode {
        RenderMode::Interactive => format!("🎫 *ТИКЕТ \\#{} \\(продолжение\\)* 🎫\n\n", ticket.id),
        RenderMode::ReadOnly => format!(
            "📖 *ТИКЕТ \\#{} \\(ТОЛЬКО ПРОСМОТР \\- продолжение\\)* 📖\n\n",
            ticket.id
        ),
    }
}

/// Keep at most `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    if char_len(text) <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
