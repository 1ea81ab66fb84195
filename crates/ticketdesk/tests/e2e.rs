// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end run of the desk loop over a real SQLite store and a mock channel.

use std::sync::Arc;

use ticketdesk_agent::{DeskLoop, LoopSettings};
use ticketdesk_config::model::StorageConfig;
use ticketdesk_conversation::{ConversationMachine, MachineSettings};
use ticketdesk_core::TicketStore;
use ticketdesk_core::types::{
    ChatId, ContactPayload, InboundEvent, InboundPayload, TicketId, TicketStatus, UserId,
};
use ticketdesk_storage::SqliteTicketStore;
use ticketdesk_test_utils::{MockChannel, MockMedia, text_event};
use tokio_util::sync::CancellationToken;

const USER: i64 = 4242;

fn contact_event(user: i64) -> InboundEvent {
    InboundEvent {
        user_id: UserId(user),
        chat_id: ChatId(user),
        payload: InboundPayload::Contact(ContactPayload {
            owner_id: Some(UserId(user)),
            phone: "+79991234567".into(),
            first_name: "Мария".into(),
            last_name: None,
        }),
    }
}

async fn open_store(path: &std::path::Path) -> Arc<SqliteTicketStore> {
    let store = Arc::new(SqliteTicketStore::new(StorageConfig {
        database_path: path.display().to_string(),
        wal_mode: true,
    }));
    store.initialize().await.unwrap();
    store
}

/// Feed `events` through a fresh loop over `store` and return every reply text.
async fn run_session(store: Arc<SqliteTicketStore>, events: Vec<InboundEvent>) -> Vec<String> {
    let channel = MockChannel::new();
    for event in events {
        channel.inject(event).await;
    }
    channel.close_inbound();

    let machine = Arc::new(ConversationMachine::new(
        store.clone(),
        Arc::new(MockMedia::new()),
        MachineSettings::default(),
    ));
    let desk = DeskLoop::new(
        Arc::new(channel.clone()),
        machine,
        store,
        LoopSettings::default(),
    );
    desk.run(CancellationToken::new()).await.unwrap();

    channel
        .sent_to(ChatId(USER))
        .await
        .iter()
        .map(|d| d.text().to_string())
        .collect()
}

#[tokio::test]
async fn ticket_survives_a_restart_and_is_closed() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("desk.db");

    let store = open_store(&db_path).await;
    let texts = run_session(
        store,
        vec![
            text_event(USER, "/start"),
            text_event(USER, "Сидорова Мария Ивановна"),
            contact_event(USER),
            text_event(USER, "✨ Создать тикет"),
            text_event(USER, "🚨 Важно,Срочно"),
            text_event(USER, "Не открывается личный кабинет после обновления"),
            text_event(USER, "✅ Да"),
        ],
    )
    .await;
    assert!(texts[0].starts_with("Добро пожаловать в систему поддержки!"));
    assert!(texts.iter().any(|t| t.starts_with("Поздравляем!")));
    assert!(texts.last().unwrap().starts_with("🎊 Тикет #1 успешно создан!"));

    // A second process over the same database file.
    let store = open_store(&db_path).await;
    let user = store.get_user(UserId(USER)).await.unwrap().unwrap();
    assert!(user.is_registered);
    assert_eq!(user.full_name, "Сидорова Мария Ивановна");

    let texts = run_session(
        store.clone(),
        vec![
            text_event(USER, "🎯 Активные тикеты"),
            text_event(USER, "#1 выбрать"),
            text_event(USER, "Уточнение: ошибка 500"),
            text_event(USER, "❌ Закрыть тикет"),
        ],
    )
    .await;
    assert!(texts.iter().any(|t| t == "🎉 Ваше сообщение успешно отправлено!"));
    assert!(texts.last().unwrap().starts_with("🔒 *Тикет \\#1 успешно закрыт*"));

    let store = open_store(&db_path).await;
    let ticket = store.get_ticket_by_id(TicketId(1)).await.unwrap().unwrap();
    assert_eq!(ticket.status, TicketStatus::Closed);
    assert!(ticket.closed_at.is_some());
    assert_eq!(store.list_messages(TicketId(1)).await.unwrap().len(), 2);
    assert!(store.list_active_tickets(UserId(USER)).await.unwrap().is_empty());
}
