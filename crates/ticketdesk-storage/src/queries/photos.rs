// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Photo attachments. Each row points at the synthetic message recording it.

use rusqlite::params;
use ticketdesk_core::DeskError;
use ticketdesk_core::types::{MessageId, NewPhoto, PhotoId, TicketId, TicketPhoto, UserId};

use crate::database::{Database, map_tr_err, now_ts, parse_enum, parse_ts};

pub async fn append_photo(db: &Database, photo: &NewPhoto) -> Result<PhotoId, DeskError> {
    let photo = photo.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO ticket_photos
                     (ticket_id, sender_kind, sender_id, file_ref, message_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    photo.ticket_id.0,
                    photo.sender_kind.to_string(),
                    photo.sender_id.0,
                    photo.file_ref,
                    photo.message_id.0,
                    now_ts(),
                ],
            )?;
            Ok(PhotoId(conn.last_insert_rowid()))
        })
        .await
        .map_err(map_tr_err)
}

/// All photos of a ticket, oldest first.
pub async fn list_photos(
    db: &Database,
    ticket_id: TicketId,
) -> Result<Vec<TicketPhoto>, DeskError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, ticket_id, sender_kind, sender_id, file_ref, message_id, created_at
                 FROM ticket_photos WHERE ticket_id = ?1
                 ORDER BY created_at ASC, id ASC",
            )?;
            let rows = stmt.query_map(params![ticket_id.0], |row| {
                let sender_kind: String = row.get(2)?;
                let created_at: String = row.get(6)?;
                Ok(TicketPhoto {
                    id: PhotoId(row.get(0)?),
                    ticket_id: TicketId(row.get(1)?),
                    sender_kind: parse_enum(2, &sender_kind)?,
                    sender_id: UserId(row.get(3)?),
                    file_ref: row.get(4)?,
                    message_id: MessageId(row.get(5)?),
                    created_at: parse_ts(6, &created_at)?,
                })
            })?;

            let mut photos = Vec::new();
            for row in rows {
                photos.push(row?);
            }
            Ok(photos)
        })
        .await
        .map_err(map_tr_err)
}
