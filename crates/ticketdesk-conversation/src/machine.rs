// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The conversation state machine.
//!
//! [`ConversationMachine::handle`] maps one inbound event and the sender's
//! session onto store side effects, the next session state and the replies to
//! deliver. Every `(state, event)` pair has a defined outcome.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use ticketdesk_config::DeskConfig;
use ticketdesk_core::types::{
    InboundEvent, InboundPayload, Outbound, Reply, Ticket, TicketId, UserId,
};
use ticketdesk_core::{DeskError, MediaGateway, TicketStore};
use tracing::{debug, error};

use crate::flows::commands::parse_command;
use crate::flows::registration::REGISTRATION_REQUIRED;
use crate::flows::viewing::ListKind;
use crate::keyboards;
use crate::render::{ConversationRenderer, RenderLimits, SenderNames};
use crate::session::{SessionState, SessionStore, UserSession};

/// Display name for support staff whose record has no name.
const UNNAMED_SUPPORT: &str = "Сотрудник поддержки";

/// Result of one handler: replies in delivery order.
pub(crate) type Turn = Result<Vec<Outbound>, DeskError>;

/// Tunables of the state machine beyond the renderer limits.
#[derive(Debug, Clone)]
pub struct MachineSettings {
    pub render: RenderLimits,
    pub max_history_tickets: usize,
    pub button_title_chars: usize,
    pub fetch_avatars: bool,
}

impl MachineSettings {
    pub fn from_config(config: &DeskConfig) -> Self {
        Self {
            render: RenderLimits::from(&config.render),
            max_history_tickets: config.render.max_history_tickets,
            button_title_chars: config.render.button_title_chars,
            fetch_avatars: config.telegram.fetch_avatars,
        }
    }
}

impl Default for MachineSettings {
    fn default() -> Self {
        Self::from_config(&DeskConfig::default())
    }
}

pub struct ConversationMachine {
    pub(crate) store: Arc<dyn TicketStore>,
    pub(crate) media: Arc<dyn MediaGateway>,
    pub(crate) renderer: ConversationRenderer,
    pub(crate) settings: MachineSettings,
    pub(crate) tips: AtomicUsize,
    sessions: SessionStore,
}

impl ConversationMachine {
    pub fn new(
        store: Arc<dyn TicketStore>,
        media: Arc<dyn MediaGateway>,
        settings: MachineSettings,
    ) -> Self {
        Self {
            store,
            media,
            renderer: ConversationRenderer::new(settings.render.clone()),
            settings,
            tips: AtomicUsize::new(0),
            sessions: SessionStore::new(),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handle one inbound event. Holds the sender's session for the whole turn.
    pub async fn handle(&self, event: &InboundEvent) -> Vec<Outbound> {
        let user = event.user_id;
        let mut session = self.sessions.lock(user).await;
        let before = session.state;

        let result = match parse_command(&event.payload) {
            Some(command) => self.on_command(&mut session, user, command).await,
            None => self.dispatch(&mut session, event).await,
        };

        match result {
            Ok(replies) => {
                if session.state != before {
                    debug!(user_id = %user, from = %before, to = %session.state, "session transition");
                }
                replies
            }
            Err(e) => {
                error!(user_id = %user, state = %before, error = %e, "event handling failed");
                failure_replies(&mut session, before)
            }
        }
    }

    async fn dispatch(&self, session: &mut UserSession, event: &InboundEvent) -> Turn {
        let user = event.user_id;
        let payload = &event.payload;
        match session.state {
            SessionState::Idle => self.on_idle(session, user, payload).await,
            SessionState::AwaitingFullName => Ok(self.on_full_name(session, payload)),
            SessionState::AwaitingPhone => self.on_phone(session, user, payload).await,
            SessionState::CreatingTicketCategory => Ok(self.on_category(session, payload)),
            SessionState::CreatingTicketDescription => Ok(self.on_description(session, payload)),
            SessionState::CreatingTicketConfirm => self.on_confirm(session, user, payload).await,
            SessionState::ViewingTickets => {
                self.on_ticket_list(session, user, payload, ListKind::Active)
                    .await
            }
            SessionState::ViewingHistory => {
                self.on_ticket_list(session, user, payload, ListKind::History)
                    .await
            }
            SessionState::ViewingTicket => self.on_ticket(session, user, payload).await,
            SessionState::ViewingHistoryTicket => {
                self.on_history_ticket(session, user, payload).await
            }
        }
    }

    /// No session: unregistered users are enrolled, registered ones reach the menu.
    async fn on_idle(
        &self,
        session: &mut UserSession,
        user: UserId,
        payload: &InboundPayload,
    ) -> Turn {
        if !self.store.is_registered(user).await? {
            return self
                .begin_registration(session, user, REGISTRATION_REQUIRED)
                .await;
        }
        self.on_main_menu(session, user, payload).await
    }

    /// The ticket with `id` if it exists and belongs to `user`.
    pub(crate) async fn owned_ticket(
        &self,
        id: TicketId,
        user: UserId,
    ) -> Result<Option<Ticket>, DeskError> {
        Ok(self
            .store
            .get_ticket_by_id(id)
            .await?
            .filter(|ticket| ticket.owner == user))
    }

    /// Resolve display names of the given support senders.
    ///
    /// Senders without a user record are left out; the renderer shows a generic name for them.
    pub(crate) async fn support_names(
        &self,
        senders: impl IntoIterator<Item = UserId>,
    ) -> Result<SenderNames, DeskError> {
        let unique: BTreeSet<UserId> = senders.into_iter().collect();
        let mut names = SenderNames::new();
        for id in unique {
            if let Some(user) = self.store.get_user(id).await? {
                let name = match user.full_name.trim() {
                    "" => UNNAMED_SUPPORT.to_string(),
                    name => name.to_string(),
                };
                names.insert(id, name);
            }
        }
        Ok(names)
    }
}

/// User-facing replies for a failed turn. Half-finished registration and ticket
/// drafts are discarded so the next message starts over.
fn failure_replies(session: &mut UserSession, before: SessionState) -> Vec<Outbound> {
    if before.is_registration() {
        session.reset();
        return vec![Reply::plain("❌ Произошла ошибка при регистрации").into()];
    }
    if before.is_ticket_creation() {
        session.reset();
        return vec![
            Reply::plain("❌ Произошла ошибка при создании тикета")
                .with_keyboard(keyboards::main_menu())
                .into(),
        ];
    }
    let text = match before {
        SessionState::Idle => "❌ Произошла ошибка. Пожалуйста, попробуйте позже.",
        _ => "❌ Произошла ошибка при доступе к тикету",
    };
    vec![Reply::plain(text).into()]
}
