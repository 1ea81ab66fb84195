// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![allow(dead_code)]

use std::sync::Arc;

use ticketdesk_conversation::{ConversationMachine, MachineSettings, SessionState};
use ticketdesk_core::types::{
    Button, ChatId, ContactPayload, InboundEvent, InboundPayload, KeyboardAction, Outbound,
    PhotoPayload, TicketId, UserId,
};
use ticketdesk_test_utils::{MemoryStore, MockMedia};

pub struct Desk {
    pub machine: ConversationMachine,
    pub store: Arc<MemoryStore>,
    pub media: Arc<MockMedia>,
}

impl Desk {
    pub fn new() -> Self {
        Self::with_settings(MachineSettings::default())
    }

    pub fn with_settings(settings: MachineSettings) -> Self {
        let store = Arc::new(MemoryStore::new());
        let media = Arc::new(MockMedia::new());
        let machine = ConversationMachine::new(store.clone(), media.clone(), settings);
        Self {
            machine,
            store,
            media,
        }
    }

    /// A desk where `user` already completed registration.
    pub async fn registered(user: i64) -> Self {
        let desk = Self::new();
        desk.store.insert_registered(user, "Иван Петров").await;
        desk
    }

    pub async fn send(&self, user: i64, payload: InboundPayload) -> Vec<Outbound> {
        self.machine
            .handle(&InboundEvent {
                user_id: UserId(user),
                chat_id: ChatId(user),
                payload,
            })
            .await
    }

    pub async fn say(&self, user: i64, text: &str) -> Vec<Outbound> {
        self.send(user, InboundPayload::Text(text.to_string())).await
    }

    pub fn state(&self, user: i64) -> SessionState {
        self.machine
            .sessions()
            .peek(UserId(user))
            .map(|s| s.state)
            .unwrap_or(SessionState::Idle)
    }

    /// Run the whole creation flow and return the new ticket id.
    pub async fn create_ticket(&self, user: i64, description: &str) -> TicketId {
        self.say(user, "✨ Создать тикет").await;
        self.say(user, "💭 Вопрос").await;
        self.say(user, description).await;
        let out = self.say(user, "✅ Да").await;
        let text = texts(&out).join("\n");
        let id = text
            .split('#')
            .nth(1)
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|digits| digits.parse().ok())
            .unwrap_or_else(|| panic!("no ticket id in {text:?}"));
        TicketId(id)
    }

    /// Open the active ticket list and select `ticket`.
    pub async fn open_ticket(&self, user: i64, ticket: TicketId) -> Vec<Outbound> {
        self.say(user, "🎯 Активные тикеты").await;
        self.say(user, &format!("#{ticket} выбрать")).await
    }
}

pub fn texts(out: &[Outbound]) -> Vec<String> {
    out.iter()
        .map(|o| match o {
            Outbound::Text(reply) => reply.text.clone(),
            Outbound::Image(image) => image.caption.clone(),
        })
        .collect()
}

pub fn joined(out: &[Outbound]) -> String {
    texts(out).join("\n")
}

/// Labels of the keyboard shown by the last reply that changes it.
pub fn keyboard_labels(out: &[Outbound]) -> Vec<String> {
    out.iter()
        .rev()
        .find_map(|o| match o {
            Outbound::Text(reply) => match &reply.keyboard {
                KeyboardAction::Show(kb) => Some(kb),
                _ => None,
            },
            Outbound::Image(_) => None,
        })
        .map(|kb| {
            kb.rows
                .iter()
                .flatten()
                .map(|b| match b {
                    Button::Text(t) | Button::RequestContact(t) => t.clone(),
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn own_contact(user: i64) -> InboundPayload {
    InboundPayload::Contact(ContactPayload {
        owner_id: Some(UserId(user)),
        phone: "+79990001122".into(),
        first_name: "Иван".into(),
        last_name: Some("Петров".into()),
    })
}

pub fn photo(file_id: &str) -> InboundPayload {
    InboundPayload::Photo(PhotoPayload {
        file_id: file_id.to_string(),
        caption: None,
    })
}
