// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only ticket conversation.

use rusqlite::params;
use ticketdesk_core::DeskError;
use ticketdesk_core::types::{MessageId, NewMessage, TicketId, TicketMessage, UserId};

use crate::database::{Database, map_tr_err, now_ts, parse_enum, parse_ts};

/// Append a message and return its id.
pub async fn append_message(db: &Database, message: &NewMessage) -> Result<MessageId, DeskError> {
    let message = message.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO ticket_messages (ticket_id, sender_kind, sender_id, body, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    message.ticket_id.0,
                    message.sender_kind.to_string(),
                    message.sender_id.0,
                    message.body,
                    now_ts(),
                ],
            )?;
            Ok(MessageId(conn.last_insert_rowid()))
        })
        .await
        .map_err(map_tr_err)
}

/// All messages of a ticket in conversation order.
pub async fn list_messages(
    db: &Database,
    ticket_id: TicketId,
) -> Result<Vec<TicketMessage>, DeskError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, ticket_id, sender_kind, sender_id, body, created_at
                 FROM ticket_messages WHERE ticket_id = ?1
                 ORDER BY created_at ASC, id ASC",
            )?;
            let rows = stmt.query_map(params![ticket_id.0], |row| {
                let sender_kind: String = row.get(2)?;
                let created_at: String = row.get(5)?;
                Ok(TicketMessage {
                    id: MessageId(row.get(0)?),
                    ticket_id: TicketId(row.get(1)?),
                    sender_kind: parse_enum(2, &sender_kind)?,
                    sender_id: UserId(row.get(3)?),
                    body: row.get(4)?,
                    created_at: parse_ts(5, &created_at)?,
                })
            })?;

            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn count_messages(db: &Database, ticket_id: TicketId) -> Result<u64, DeskError> {
    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM ticket_messages WHERE ticket_id = ?1",
                params![ticket_id.0],
                |row| row.get(0),
            )?;
            Ok(count.max(0) as u64)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::tickets::create_ticket;
    use crate::queries::users::create_user;
    use tempfile::tempdir;
    use ticketdesk_core::types::{Category, NewTicket, SenderKind};

    async fn setup() -> (tempfile::TempDir, Database, TicketId) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("messages.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();
        create_user(&db, UserId(5)).await.unwrap();
        let ticket = create_ticket(
            &db,
            &NewTicket {
                owner: UserId(5),
                title: "t".into(),
                description: "описание обращения".into(),
                category: Category::Finance,
            },
        )
        .await
        .unwrap();
        (dir, db, ticket)
    }

    fn msg(ticket: TicketId, kind: SenderKind, sender: i64, body: &str) -> NewMessage {
        NewMessage {
            ticket_id: ticket,
            sender_kind: kind,
            sender_id: UserId(sender),
            body: body.into(),
        }
    }

    #[tokio::test]
    async fn messages_come_back_in_insertion_order() {
        let (_dir, db, ticket) = setup().await;
        for (i, body) in ["первое", "второе", "третье"].iter().enumerate() {
            let kind = if i == 1 {
                SenderKind::Support
            } else {
                SenderKind::User
            };
            append_message(&db, &msg(ticket, kind, 5, body)).await.unwrap();
        }

        let messages = list_messages(&db, ticket).await.unwrap();
        let bodies: Vec<_> = messages.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["первое", "второе", "третье"]);
        assert_eq!(messages[1].sender_kind, SenderKind::Support);
        assert_eq!(count_messages(&db, ticket).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn message_for_missing_ticket_violates_foreign_key() {
        let (_dir, db, _ticket) = setup().await;
        let err = append_message(&db, &msg(TicketId(999), SenderKind::User, 5, "x"))
            .await
            .unwrap_err();
        assert!(err.is_store_failure());
    }

    #[tokio::test]
    async fn empty_ticket_counts_zero() {
        let (_dir, db, ticket) = setup().await;
        assert_eq!(count_messages(&db, ticket).await.unwrap(), 0);
        assert!(list_messages(&db, ticket).await.unwrap().is_empty());
    }
}
