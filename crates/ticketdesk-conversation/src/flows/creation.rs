// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket creation: category, description, confirmation.

use ticketdesk_core::DeskError;
use ticketdesk_core::types::{
    InboundPayload, NewMessage, NewTicket, Outbound, Reply, SenderKind, UserId,
};
use tracing::{error, info};

use crate::keyboards::{self, CANCEL, NO, YES, is_button};
use crate::machine::{ConversationMachine, Turn};
use crate::session::{SessionState, UserSession};
use crate::validation::{generate_title, parse_category, validate_description};

const CATEGORY_PROMPT: &str = "Пожалуйста, выберите категорию из предложенных вариантов:";
const DESCRIPTION_PROMPT: &str =
    "Описание должно содержать от 10 до 1000 символов. Пожалуйста, введите корректное описание:";

impl ConversationMachine {
    pub(crate) fn begin_ticket_creation(&self, session: &mut UserSession) -> Vec<Outbound> {
        session.reset();
        session.enter(SessionState::CreatingTicketCategory);
        vec![
            Reply::plain("Выберите категорию вашего обращения:")
                .with_keyboard(keyboards::categories())
                .into(),
        ]
    }

    pub(crate) fn on_category(
        &self,
        session: &mut UserSession,
        payload: &InboundPayload,
    ) -> Vec<Outbound> {
        let InboundPayload::Text(text) = payload else {
            return vec![category_reprompt()];
        };
        if is_button(text, CANCEL) {
            session.reset();
            return vec![
                Reply::plain("Создание тикета отменено.")
                    .with_keyboard(keyboards::main_menu())
                    .into(),
            ];
        }
        match parse_category(text) {
            Ok(category) => {
                session.draft.category = Some(category);
                session.enter(SessionState::CreatingTicketDescription);
                vec![
                    Reply::plain("Пожалуйста, введите описание вашего обращения:")
                        .remove_keyboard()
                        .into(),
                ]
            }
            Err(_) => vec![category_reprompt()],
        }
    }

    pub(crate) fn on_description(
        &self,
        session: &mut UserSession,
        payload: &InboundPayload,
    ) -> Vec<Outbound> {
        let InboundPayload::Text(text) = payload else {
            return vec![Reply::plain(DESCRIPTION_PROMPT).into()];
        };
        let Some(category) = session.draft.category else {
            // Lost the category somehow: ask for it again.
            session.enter(SessionState::CreatingTicketCategory);
            return vec![category_reprompt()];
        };
        let description = match validate_description(text) {
            Ok(description) => description,
            Err(_) => return vec![Reply::plain(DESCRIPTION_PROMPT).into()],
        };

        let title = generate_title(category, &description);
        let confirm = format!(
            "Пожалуйста, подтвердите создание тикета:\n\n\
             Заголовок: {title}\n\
             Описание: {description}\n\
             Категория: {}\n\n\
             Всё верно?",
            category.label()
        );
        session.draft.title = Some(title);
        session.draft.description = Some(description);
        session.enter(SessionState::CreatingTicketConfirm);
        vec![
            Reply::plain(confirm)
                .with_keyboard(keyboards::confirm())
                .into(),
        ]
    }

    pub(crate) async fn on_confirm(
        &self,
        session: &mut UserSession,
        user: UserId,
        payload: &InboundPayload,
    ) -> Turn {
        let text = match payload {
            InboundPayload::Text(text) => text.as_str(),
            _ => "",
        };
        if is_button(text, NO) {
            session.reset();
            return Ok(vec![
                Reply::plain("❌ Создание тикета отменено.")
                    .with_keyboard(keyboards::main_menu())
                    .into(),
            ]);
        }
        if !is_button(text, YES) {
            return Ok(vec![
                Reply::plain("Пожалуйста, выберите 'Да' или 'Нет':")
                    .with_keyboard(keyboards::confirm())
                    .into(),
            ]);
        }

        let draft = &session.draft;
        let (Some(category), Some(title), Some(description)) =
            (draft.category, draft.title.clone(), draft.description.clone())
        else {
            return Err(DeskError::Internal(
                "ticket draft incomplete at confirmation".into(),
            ));
        };

        let ticket_id = self
            .store
            .create_ticket(&NewTicket {
                owner: user,
                title,
                description: description.clone(),
                category,
            })
            .await?;
        info!(user_id = %user, ticket_id = %ticket_id, category = %category, "ticket created");

        let seed = NewMessage {
            ticket_id,
            sender_kind: SenderKind::User,
            sender_id: user,
            body: description,
        };
        if let Err(e) = self.store.append_message(&seed).await {
            error!(ticket_id = %ticket_id, error = %e, "failed to store first ticket message");
        }

        session.reset();
        Ok(vec![
            Reply::plain(format!(
                "🎊 Тикет #{ticket_id} успешно создан! \
                 Наши специалисты свяжутся с вами в ближайшее время."
            ))
            .with_keyboard(keyboards::main_menu())
            .into(),
        ])
    }
}

fn category_reprompt() -> Outbound {
    Reply::plain(CATEGORY_PROMPT)
        .with_keyboard(keyboards::categories())
        .into()
}
