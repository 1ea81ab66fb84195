// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registration: full name, then the user's own contact.

use ticketdesk_core::types::{InboundPayload, Outbound, Registration, Reply, UserId};
use tracing::{info, warn};

use crate::keyboards;
use crate::machine::{ConversationMachine, Turn};
use crate::session::{SessionState, UserSession};
use crate::validation::validate_full_name;

const NAME_PROMPT: &str = "Пожалуйста, введите ваше полное имя (Фамилия Имя Отчество):";

pub(crate) const WELCOME_REGISTRATION: &str = "Добро пожаловать в систему поддержки! \
    Для начала работы необходимо зарегистрироваться.\n\n\
    Пожалуйста, введите ваше полное имя (Фамилия Имя Отчество):";

pub(crate) const REGISTRATION_REQUIRED: &str = "Для начала работы необходимо зарегистрироваться.\n\n\
    Пожалуйста, введите ваше полное имя (Фамилия Имя Отчество):";

impl ConversationMachine {
    /// Create the bare user record and ask for a full name.
    pub(crate) async fn begin_registration(
        &self,
        session: &mut UserSession,
        user: UserId,
        prompt: &str,
    ) -> Turn {
        self.store.create_user(user).await?;
        session.reset();
        session.enter(SessionState::AwaitingFullName);
        Ok(vec![Reply::plain(prompt).remove_keyboard().into()])
    }

    pub(crate) fn on_full_name(
        &self,
        session: &mut UserSession,
        payload: &InboundPayload,
    ) -> Vec<Outbound> {
        let InboundPayload::Text(text) = payload else {
            return vec![Reply::plain(NAME_PROMPT).into()];
        };
        match validate_full_name(text) {
            Ok(name) => {
                session.draft.full_name = Some(name);
                session.enter(SessionState::AwaitingPhone);
                vec![
                    Reply::plain("Спасибо! Теперь, пожалуйста, поделитесь своим контактом:")
                        .with_keyboard(keyboards::share_contact())
                        .into(),
                ]
            }
            Err(_) => vec![
                Reply::plain(
                    "Некорректное ФИО. Пожалуйста, введите полное имя (Фамилия Имя Отчество):",
                )
                .into(),
            ],
        }
    }

    pub(crate) async fn on_phone(
        &self,
        session: &mut UserSession,
        user: UserId,
        payload: &InboundPayload,
    ) -> Turn {
        let contact = match payload {
            InboundPayload::Contact(contact) => contact,
            InboundPayload::Text(_) | InboundPayload::Photo(_) => {
                return Ok(vec![
                    Reply::plain("Пожалуйста, нажмите кнопку 'Поделиться контактом':")
                        .with_keyboard(keyboards::share_contact())
                        .into(),
                ]);
            }
        };
        if contact.owner_id != Some(user) {
            return Ok(vec![
                Reply::plain("Пожалуйста, поделитесь своим контактом, а не чужим:")
                    .with_keyboard(keyboards::share_contact())
                    .into(),
            ]);
        }
        let Some(full_name) = session.draft.full_name.clone() else {
            session.enter(SessionState::AwaitingFullName);
            return Ok(vec![Reply::plain(NAME_PROMPT).remove_keyboard().into()]);
        };

        let has_avatar = self.fetch_avatar(user).await;
        self.store
            .update_user_registration(&Registration {
                user_id: user,
                full_name,
                phone: contact.phone.clone(),
                location: None,
                birth_date: None,
                has_avatar,
            })
            .await?;
        info!(user_id = %user, has_avatar, "user registered");

        session.reset();
        Ok(vec![
            Reply::plain("Поздравляем! Вы успешно зарегистрированы в системе поддержки.")
                .with_keyboard(keyboards::main_menu())
                .into(),
        ])
    }

    /// Best effort: a failed download only costs the avatar flag.
    async fn fetch_avatar(&self, user: UserId) -> bool {
        if !self.settings.fetch_avatars {
            return false;
        }
        match self.media.fetch_avatar(user).await {
            Ok(found) => found,
            Err(e) => {
                warn!(user_id = %user, error = %e, "avatar download failed");
                false
            }
        }
    }
}
