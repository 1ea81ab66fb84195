// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Main menu, ticket lists and the ticket view, plus its read-only history variant.

use ticketdesk_core::DeskError;
use ticketdesk_core::types::{
    InboundPayload, Keyboard, NewMessage, NewPhoto, Outbound, PhotoPayload, Reply, SavedFile,
    SenderKind, Ticket, UserId,
};
use tracing::{info, warn};

use crate::keyboards::{
    self, ACTIVE_TICKETS, BACK, CLOSE_TICKET, CREATE_TICKET, TICKET_HISTORY, VIEW_PHOTOS,
    is_button, parse_ticket_button, ticket_button, ticket_list,
};
use crate::lifecycle::TicketLifecycle;
use crate::machine::{ConversationMachine, Turn};
use crate::render::RenderMode;
use crate::session::{SessionState, UserSession};

const NOT_FOUND: &str = "Тикет не найден или вы не имеете доступа к нему.";
const CHOOSE_FROM_LIST: &str = "Пожалуйста, выберите тикет из списка или нажмите 'Назад':";

/// Which ticket list a user is browsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListKind {
    Active,
    History,
}

impl ListKind {
    fn list_state(self) -> SessionState {
        match self {
            ListKind::Active => SessionState::ViewingTickets,
            ListKind::History => SessionState::ViewingHistory,
        }
    }

    fn ticket_state(self) -> SessionState {
        match self {
            ListKind::Active => SessionState::ViewingTicket,
            ListKind::History => SessionState::ViewingHistoryTicket,
        }
    }

    fn mode(self) -> RenderMode {
        match self {
            ListKind::Active => RenderMode::Interactive,
            ListKind::History => RenderMode::ReadOnly,
        }
    }
}

fn text_of(payload: &InboundPayload) -> Option<&str> {
    match payload {
        InboundPayload::Text(text) => Some(text.as_str()),
        _ => None,
    }
}

impl ConversationMachine {
    /// Registered user without a session.
    pub(crate) async fn on_main_menu(
        &self,
        session: &mut UserSession,
        user: UserId,
        payload: &InboundPayload,
    ) -> Turn {
        let text = text_of(payload).unwrap_or_default();
        if is_button(text, ACTIVE_TICKETS) {
            return self.show_ticket_list(session, user, ListKind::Active).await;
        }
        if is_button(text, TICKET_HISTORY) {
            return self.show_ticket_list(session, user, ListKind::History).await;
        }
        if is_button(text, CREATE_TICKET) {
            return Ok(self.begin_ticket_creation(session));
        }
        Ok(vec![
            Reply::plain("Пожалуйста, выберите действие из меню:")
                .with_keyboard(keyboards::main_menu())
                .into(),
        ])
    }

    /// Show the active or full ticket list as buttons, newest first.
    pub(crate) async fn show_ticket_list(
        &self,
        session: &mut UserSession,
        user: UserId,
        kind: ListKind,
    ) -> Turn {
        let tickets = match kind {
            ListKind::Active => self.store.list_active_tickets(user).await?,
            ListKind::History => self.store.list_ticket_history(user).await?,
        };

        if tickets.is_empty() {
            session.reset();
            let text = match kind {
                ListKind::Active => "📭 У вас нет активных тикетов.",
                ListKind::History => "📭 У вас пока нет тикетов.",
            };
            return Ok(vec![
                Reply::plain(text)
                    .with_keyboard(keyboards::main_menu())
                    .into(),
            ]);
        }

        let total = tickets.len();
        let shown = match kind {
            ListKind::Active => total,
            ListKind::History => total.min(self.settings.max_history_tickets),
        };
        let mut labels = Vec::with_capacity(shown);
        for ticket in tickets.iter().rev().take(shown) {
            let count = self.store.count_messages(ticket.id).await?;
            labels.push(ticket_button(
                ticket,
                count,
                self.settings.button_title_chars,
            ));
        }

        let mut out: Vec<Outbound> = Vec::new();
        if shown < total {
            out.push(
                Reply::plain(format!(
                    "⚠️ Показаны последние {shown} тикетов из {total}"
                ))
                .into(),
            );
        }
        let heading = match kind {
            ListKind::Active => "🎯 Ваши активные тикеты:".to_string(),
            ListKind::History => format!("📚 История ваших тикетов ({total}):"),
        };
        out.push(Reply::plain(heading).with_keyboard(ticket_list(labels)).into());

        session.reset();
        session.enter(kind.list_state());
        Ok(out)
    }

    pub(crate) async fn on_ticket_list(
        &self,
        session: &mut UserSession,
        user: UserId,
        payload: &InboundPayload,
        kind: ListKind,
    ) -> Turn {
        let Some(text) = text_of(payload) else {
            return Ok(vec![Reply::plain(CHOOSE_FROM_LIST).into()]);
        };

        if is_button(text, BACK) {
            session.reset();
            let text = match kind {
                ListKind::Active => "Главное меню:",
                ListKind::History => "🏠 Главное меню",
            };
            return Ok(vec![
                Reply::plain(text)
                    .with_keyboard(keyboards::main_menu())
                    .into(),
            ]);
        }

        if !text.trim_start().starts_with('#') {
            return Ok(vec![Reply::plain(CHOOSE_FROM_LIST).into()]);
        }
        let Some(id) = parse_ticket_button(text) else {
            return Ok(vec![
                Reply::plain(
                    "Не удалось определить ID тикета. Пожалуйста, выберите тикет из списка:",
                )
                .into(),
            ]);
        };
        let Some(ticket) = self.owned_ticket(id, user).await? else {
            return Ok(vec![Reply::plain(NOT_FOUND).into()]);
        };

        let out = self.render_ticket(&ticket, kind.mode()).await?;
        session.draft.ticket_id = Some(ticket.id);
        session.enter(kind.ticket_state());
        Ok(out)
    }

    /// The conversation of `ticket` followed by the prompt and action keyboard.
    async fn render_ticket(&self, ticket: &Ticket, mode: RenderMode) -> Turn {
        let messages = self.store.list_messages(ticket.id).await?;
        let names = self
            .support_names(
                messages
                    .iter()
                    .filter(|m| m.sender_kind == SenderKind::Support)
                    .map(|m| m.sender_id),
            )
            .await?;

        let mut out = self
            .renderer
            .render(ticket, &messages, &names, mode)
            .into_outbound();
        out.push(
            Reply::markdown(self.renderer.follow_up(ticket, mode))
                .with_keyboard(actions_for(ticket, mode))
                .into(),
        );
        Ok(out)
    }

    pub(crate) async fn on_ticket(
        &self,
        session: &mut UserSession,
        user: UserId,
        payload: &InboundPayload,
    ) -> Turn {
        if text_of(payload).is_some_and(|t| is_button(t, BACK)) {
            return self.show_ticket_list(session, user, ListKind::Active).await;
        }
        let Some(ticket) = self.bound_ticket(session, user).await? else {
            return Ok(self.lost_ticket(session));
        };

        let text = text_of(payload);
        if text.is_some_and(|t| is_button(t, VIEW_PHOTOS)) {
            return self
                .photo_listing(&ticket, actions_for(&ticket, RenderMode::Interactive))
                .await;
        }
        if !ticket.status.is_open() {
            return Ok(vec![
                Reply::plain("Тикет закрыт и не может быть обновлен.")
                    .with_keyboard(keyboards::ticket_actions(false))
                    .into(),
            ]);
        }

        match payload {
            InboundPayload::Text(text) if is_button(text, CLOSE_TICKET) => {
                self.close_ticket(session, user, &ticket).await
            }
            InboundPayload::Text(text) => self.append_text(user, &ticket, text).await,
            InboundPayload::Photo(photo) => self.append_photo(user, &ticket, photo).await,
            InboundPayload::Contact(_) => Ok(vec![
                Reply::markdown(self.renderer.follow_up(&ticket, RenderMode::Interactive))
                    .with_keyboard(keyboards::ticket_actions(true))
                    .into(),
            ]),
        }
    }

    pub(crate) async fn on_history_ticket(
        &self,
        session: &mut UserSession,
        user: UserId,
        payload: &InboundPayload,
    ) -> Turn {
        let text = text_of(payload);
        if text.is_some_and(|t| is_button(t, BACK)) {
            return self
                .show_ticket_list(session, user, ListKind::History)
                .await;
        }
        let Some(ticket) = self.bound_ticket(session, user).await? else {
            return Ok(self.lost_ticket(session));
        };
        if text.is_some_and(|t| is_button(t, VIEW_PHOTOS)) {
            return self
                .photo_listing(&ticket, keyboards::ticket_actions(false))
                .await;
        }
        Ok(vec![
            Reply::plain(
                "📖 Этот тикет открыт только для просмотра.\n\n\
                 🖼 Вы можете просмотреть прикрепленные фотографии\n\
                 ⬅️ Или вернуться к истории тикетов",
            )
            .with_keyboard(keyboards::ticket_actions(false))
            .into(),
        ])
    }

    async fn close_ticket(&self, session: &mut UserSession, user: UserId, ticket: &Ticket) -> Turn {
        match TicketLifecycle::new(self.store.as_ref())
            .close(ticket.id, user)
            .await
        {
            Ok(()) => {
                info!(user_id = %user, ticket_id = %ticket.id, "ticket closed by owner");
                session.reset();
                Ok(vec![
                    Reply::markdown(format!(
                        "🔒 *Тикет \\#{} успешно закрыт*\n\n\
                         Спасибо за обращение\\! Если у вас появятся новые вопросы, \
                         вы всегда можете создать новый тикет\\.",
                        ticket.id
                    ))
                    .with_keyboard(keyboards::main_menu())
                    .into(),
                ])
            }
            Err(e) if e.is_not_found() => Ok(vec![
                Reply::plain("Не удалось закрыть тикет: тикет не найден или уже закрыт.").into(),
            ]),
            Err(e) => Err(e),
        }
    }

    async fn append_text(&self, user: UserId, ticket: &Ticket, text: &str) -> Turn {
        self.store
            .append_message(&NewMessage {
                ticket_id: ticket.id,
                sender_kind: SenderKind::User,
                sender_id: user,
                body: text.to_string(),
            })
            .await?;
        let status = TicketLifecycle::new(self.store.as_ref())
            .record_user_activity(ticket)
            .await?;

        let updated = Ticket {
            status,
            ..ticket.clone()
        };
        let mut out: Vec<Outbound> =
            vec![Reply::plain("🎉 Ваше сообщение успешно отправлено!").into()];
        out.extend(self.render_ticket(&updated, RenderMode::Interactive).await?);
        Ok(out)
    }

    async fn append_photo(&self, user: UserId, ticket: &Ticket, photo: &PhotoPayload) -> Turn {
        let saved = match self.media.save_photo(photo, user, ticket.id).await {
            Ok(saved) => saved,
            Err(e) => {
                warn!(user_id = %user, ticket_id = %ticket.id, error = %e, "photo download failed");
                return Ok(vec![
                    Reply::plain("❌ Произошла ошибка при сохранении фотографии").into(),
                ]);
            }
        };

        if let Err(e) = self.record_photo(user, ticket, &saved).await {
            if let Err(cleanup) = self.media.discard(&saved).await {
                warn!(
                    file_ref = %saved.file_ref,
                    error = %cleanup,
                    "unrecorded photo left on disk"
                );
            }
            return Err(e);
        }
        if let Some(caption) = photo.caption.as_deref().map(str::trim) {
            if !caption.is_empty() {
                self.store
                    .append_message(&NewMessage {
                        ticket_id: ticket.id,
                        sender_kind: SenderKind::User,
                        sender_id: user,
                        body: caption.to_string(),
                    })
                    .await?;
            }
        }
        TicketLifecycle::new(self.store.as_ref())
            .record_user_activity(ticket)
            .await?;

        Ok(vec![
            Reply::plain("✅ Ваша фотография успешно прикреплена к тикету.")
                .with_keyboard(keyboards::ticket_actions(true))
                .into(),
        ])
    }

    async fn record_photo(
        &self,
        user: UserId,
        ticket: &Ticket,
        saved: &SavedFile,
    ) -> Result<(), DeskError> {
        let message_id = self
            .store
            .append_message(&NewMessage {
                ticket_id: ticket.id,
                sender_kind: SenderKind::User,
                sender_id: user,
                body: format!("прикрепил фото {}", saved.file_name),
            })
            .await?;
        self.store
            .append_photo(&NewPhoto {
                ticket_id: ticket.id,
                sender_kind: SenderKind::User,
                sender_id: user,
                file_ref: saved.file_ref.clone(),
                message_id,
            })
            .await?;
        Ok(())
    }

    async fn photo_listing(&self, ticket: &Ticket, keyboard: Keyboard) -> Turn {
        let photos = self.store.list_photos(ticket.id).await?;
        let names = self
            .support_names(
                photos
                    .iter()
                    .filter(|p| p.sender_kind == SenderKind::Support)
                    .map(|p| p.sender_id),
            )
            .await?;
        Ok(self
            .renderer
            .photo_listing(ticket, &photos, &names)
            .into_outbound(keyboard))
    }

    /// The ticket bound to the session, re-checked against the store.
    async fn bound_ticket(
        &self,
        session: &UserSession,
        user: UserId,
    ) -> Result<Option<Ticket>, DeskError> {
        match session.draft.ticket_id {
            Some(id) => self.owned_ticket(id, user).await,
            None => Ok(None),
        }
    }

    fn lost_ticket(&self, session: &mut UserSession) -> Vec<Outbound> {
        session.reset();
        vec![
            Reply::plain(NOT_FOUND)
                .with_keyboard(keyboards::main_menu())
                .into(),
        ]
    }
}

fn actions_for(ticket: &Ticket, mode: RenderMode) -> Keyboard {
    keyboards::ticket_actions(mode == RenderMode::Interactive && ticket.status.is_open())
}
