// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slash commands, intercepted before state dispatch.

use std::sync::atomic::Ordering;

use ticketdesk_core::types::{InboundPayload, Reply, TicketId, UserId};

use crate::keyboards;
use crate::machine::{ConversationMachine, Turn};
use crate::render::markdown::escape;
use crate::session::{SessionState, UserSession};

use super::registration::WELCOME_REGISTRATION;

const HELP: &str = "🤖 *Справка по использованию бота*\n\n\
    Этот бот предназначен для создания и управления тикетами поддержки\\.\n\n\
    *Основные команды:*\n\
    /start \\- Начать работу с ботом\n\
    /help \\- Показать эту справку\n\
    /ticket <ID\\> \\- Просмотр информации о тикете\n\n\
    *Основные функции:*\n\
    • Создание новых тикетов\n\
    • Просмотр активных тикетов\n\
    • Просмотр истории тикетов\n\
    • Обмен сообщениями с поддержкой\n\
    • Отправка фотографий в тикеты";

const TIPS: &[&str] = &[
    "Кнопки можно не нажимать: достаточно написать их текст, например «Назад».",
    "Чтобы добавить скриншот к тикету, откройте тикет и просто отправьте фото.",
    "Команда /ticket с номером тикета покажет его текущий статус.",
    "Закрытые тикеты остаются доступны в «Истории тикетов» в режиме просмотра.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command<'a> {
    Start,
    Help,
    Ticket(Option<&'a str>),
}

/// Recognize a known command. Unknown `/...` text is left to the current state.
pub(crate) fn parse_command(payload: &InboundPayload) -> Option<Command<'_>> {
    let InboundPayload::Text(text) = payload else {
        return None;
    };
    let text = text.trim();
    let rest = text.strip_prefix('/')?;
    let (head, arg) = match rest.split_once(char::is_whitespace) {
        Some((head, arg)) => (head, Some(arg.trim()).filter(|a| !a.is_empty())),
        None => (rest, None),
    };
    // `/start@my_bot` in group-style clients.
    let name = head.split('@').next().unwrap_or(head);
    match name {
        "start" => Some(Command::Start),
        "help" => Some(Command::Help),
        "ticket" => Some(Command::Ticket(arg)),
        _ => None,
    }
}

impl ConversationMachine {
    pub(crate) async fn on_command(
        &self,
        session: &mut UserSession,
        user: UserId,
        command: Command<'_>,
    ) -> Turn {
        match command {
            Command::Start => self.start(session, user).await,
            Command::Help => Ok(vec![Reply::markdown(self.help_text()).into()]),
            Command::Ticket(arg) => self.ticket_card(user, arg).await,
        }
    }

    async fn start(&self, session: &mut UserSession, user: UserId) -> Turn {
        self.store.create_user(user).await?;
        if self.store.is_registered(user).await? {
            session.reset();
            return Ok(vec![
                Reply::plain("Добро пожаловать в систему поддержки!")
                    .with_keyboard(keyboards::main_menu())
                    .into(),
            ]);
        }
        session.reset();
        session.enter(SessionState::AwaitingFullName);
        Ok(vec![Reply::plain(WELCOME_REGISTRATION).remove_keyboard().into()])
    }

    fn help_text(&self) -> String {
        let tip = TIPS[self.tips.fetch_add(1, Ordering::Relaxed) % TIPS.len()];
        format!("{HELP}\n\n💡 *Совет:* {}", escape(tip))
    }

    async fn ticket_card(&self, user: UserId, arg: Option<&str>) -> Turn {
        let Some(raw) = arg else {
            return Ok(vec![
                Reply::plain("⚠️ Пожалуйста, укажите ID тикета: /ticket <ID>").into(),
            ]);
        };
        let Ok(id) = raw.trim_start_matches('#').parse::<i64>() else {
            return Ok(vec![
                Reply::plain("⚠️ Некорректный ID тикета. Используйте формат: /ticket <ID>").into(),
            ]);
        };
        let Some(ticket) = self.store.get_ticket_by_id(TicketId(id)).await? else {
            return Ok(vec![
                Reply::plain("⚠️ Тикет не найден или произошла ошибка при его получении.").into(),
            ]);
        };
        if ticket.owner != user {
            return Ok(vec![Reply::plain("⚠️ У вас нет доступа к этому тикету.").into()]);
        }
        let count = self.store.count_messages(ticket.id).await?;
        Ok(vec![
            Reply::markdown(self.renderer.status_card(&ticket, count)).into(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> InboundPayload {
        InboundPayload::Text(s.to_string())
    }

    #[test]
    fn recognizes_known_commands() {
        assert_eq!(parse_command(&text("/start")), Some(Command::Start));
        assert_eq!(parse_command(&text("/help@desk_bot")), Some(Command::Help));
        assert_eq!(
            parse_command(&text("/ticket 42")),
            Some(Command::Ticket(Some("42")))
        );
        assert_eq!(parse_command(&text("/ticket   ")), Some(Command::Ticket(None)));
    }

    #[test]
    fn other_text_is_not_a_command() {
        assert_eq!(parse_command(&text("/unknown")), None);
        assert_eq!(parse_command(&text("start")), None);
        assert_eq!(
            parse_command(&InboundPayload::Photo(ticketdesk_core::types::PhotoPayload {
                file_id: "f".into(),
                caption: Some("/start".into()),
            })),
            None
        );
    }
}
