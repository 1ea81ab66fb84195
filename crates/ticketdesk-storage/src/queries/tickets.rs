// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket CRUD operations and the ownership-checked close.

use rusqlite::params;
use ticketdesk_core::DeskError;
use ticketdesk_core::types::{NewTicket, Ticket, TicketId, TicketStatus, UserId};

use crate::database::{Database, map_tr_err, now_ts, parse_enum, parse_ts};

const TICKET_COLUMNS: &str =
    "id, user_id, title, description, category, status, created_at, closed_at";

fn ticket_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Ticket> {
    let category: String = row.get(4)?;
    let status: String = row.get(5)?;
    let created_at: String = row.get(6)?;
    let closed_at: Option<String> = row.get(7)?;
    Ok(Ticket {
        id: TicketId(row.get(0)?),
        owner: UserId(row.get(1)?),
        title: row.get(2)?,
        description: row.get(3)?,
        category: parse_enum(4, &category)?,
        status: parse_enum(5, &status)?,
        created_at: parse_ts(6, &created_at)?,
        closed_at: closed_at.as_deref().map(|ts| parse_ts(7, ts)).transpose()?,
    })
}

/// Insert a ticket in the `created` status and return its id.
pub async fn create_ticket(db: &Database, ticket: &NewTicket) -> Result<TicketId, DeskError> {
    let ticket = ticket.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO tickets (user_id, title, description, category, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    ticket.owner.0,
                    ticket.title,
                    ticket.description,
                    ticket.category.to_string(),
                    TicketStatus::Created.to_string(),
                    now_ts(),
                ],
            )?;
            Ok(TicketId(conn.last_insert_rowid()))
        })
        .await
        .map_err(map_tr_err)
}

/// Get a ticket by ID.
pub async fn get_ticket(db: &Database, id: TicketId) -> Result<Option<Ticket>, DeskError> {
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?1"))?;
            match stmt.query_row(params![id.0], ticket_from_row) {
                Ok(ticket) => Ok(Some(ticket)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// List an owner's tickets, oldest first. `only_open` drops closed tickets.
pub async fn list_tickets(
    db: &Database,
    owner: UserId,
    only_open: bool,
) -> Result<Vec<Ticket>, DeskError> {
    db.connection()
        .call(move |conn| {
            let filter = if only_open {
                " AND status != 'closed'"
            } else {
                ""
            };
            let mut stmt = conn.prepare(&format!(
                "SELECT {TICKET_COLUMNS} FROM tickets
                 WHERE user_id = ?1{filter}
                 ORDER BY created_at ASC, id ASC"
            ))?;
            let tickets = stmt
                .query_map(params![owner.0], ticket_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(tickets)
        })
        .await
        .map_err(map_tr_err)
}

/// Overwrite a ticket's status. Closed tickets are never rewritten.
pub async fn set_ticket_status(
    db: &Database,
    id: TicketId,
    status: TicketStatus,
) -> Result<(), DeskError> {
    let updated = db
        .connection()
        .call(move |conn| {
            let closed_at = (status == TicketStatus::Closed).then(now_ts);
            let rows = conn.execute(
                "UPDATE tickets SET status = ?1, closed_at = COALESCE(?2, closed_at)
                 WHERE id = ?3 AND status != 'closed'",
                params![status.to_string(), closed_at, id.0],
            )?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)?;

    if updated == 0 {
        return Err(DeskError::NotFoundOrUnauthorized { ticket_id: id });
    }
    Ok(())
}

/// Close an open ticket owned by `owner`.
///
/// Zero affected rows means the ticket is missing, foreign, or already closed.
pub async fn close_ticket(db: &Database, id: TicketId, owner: UserId) -> Result<(), DeskError> {
    let updated = db
        .connection()
        .call(move |conn| {
            let rows = conn.execute(
                "UPDATE tickets SET status = 'closed', closed_at = ?1
                 WHERE id = ?2 AND user_id = ?3 AND status != 'closed'",
                params![now_ts(), id.0, owner.0],
            )?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)?;

    if updated == 0 {
        return Err(DeskError::NotFoundOrUnauthorized { ticket_id: id });
    }
    Ok(())
}
