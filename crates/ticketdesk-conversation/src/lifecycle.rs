// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket status lifecycle.
//!
//! Statuses advance monotonically:
//! `created -> assigned -> in_progress -> waiting_user | waiting_support -> resolved -> closed`.
//! `waiting_user` and `waiting_support` may alternate. `cancelled` is reachable from
//! any status before `resolved` and can only be followed by `closed`. `closed` is terminal.

use ticketdesk_core::types::{Ticket, TicketId, TicketStatus, UserId};
use ticketdesk_core::{DeskError, TicketStore};
use tracing::debug;

/// Position of a status on the forward path. `cancelled` sits outside it.
fn rank(status: TicketStatus) -> Option<u8> {
    match status {
        TicketStatus::Created => Some(0),
        TicketStatus::Assigned => Some(1),
        TicketStatus::InProgress => Some(2),
        TicketStatus::WaitingUser | TicketStatus::WaitingSupport => Some(3),
        TicketStatus::Resolved => Some(4),
        TicketStatus::Closed => Some(5),
        TicketStatus::Cancelled => None,
    }
}

/// Whether a ticket in `from` may be written with status `to`.
///
/// Writing the current status again is allowed for every status except `closed`
/// and is treated as a no-op by [`TicketLifecycle`].
pub fn can_transition(from: TicketStatus, to: TicketStatus) -> bool {
    use TicketStatus::*;

    match (from, to) {
        (Closed, _) => false,
        (a, b) if a == b => true,
        (_, Closed) => true,
        (Cancelled, _) => false,
        (WaitingUser, WaitingSupport) | (WaitingSupport, WaitingUser) => true,
        (from, Cancelled) => rank(from).is_some_and(|r| r < 4),
        (from, to) => match (rank(from), rank(to)) {
            (Some(f), Some(t)) => t > f,
            _ => false,
        },
    }
}

/// Emoji and one-line description shown next to a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusBadge {
    pub emoji: &'static str,
    pub description: &'static str,
}

pub fn status_badge(status: TicketStatus) -> StatusBadge {
    let (emoji, description) = match status {
        TicketStatus::Created => ("🆕", "Создан: тикет ожидает назначения агенту"),
        TicketStatus::Assigned => ("👨‍💻", "Назначен: ожидает начала работы агентом"),
        TicketStatus::InProgress => ("🔧", "В работе: агент работает над тикетом"),
        TicketStatus::WaitingUser => ("❓", "Ожидает ответа пользователя"),
        TicketStatus::WaitingSupport => ("⏳", "Ожидает действий поддержки"),
        TicketStatus::Resolved => ("✅", "Решён: предложено решение, ожидает подтверждения"),
        TicketStatus::Closed => ("🗃", "Закрыт"),
        TicketStatus::Cancelled => ("🚫", "Отменён: тикет не требует решения"),
    };
    StatusBadge { emoji, description }
}

/// Status writes that go through the store, checked against [`can_transition`].
pub struct TicketLifecycle<'a> {
    store: &'a dyn TicketStore,
}

impl<'a> TicketLifecycle<'a> {
    pub fn new(store: &'a dyn TicketStore) -> Self {
        Self { store }
    }

    /// Move `ticket` to `next`. Same-status writes are skipped.
    pub async fn advance(&self, ticket: &Ticket, next: TicketStatus) -> Result<(), DeskError> {
        if !can_transition(ticket.status, next) {
            return Err(DeskError::InvalidTransition {
                from: ticket.status,
                to: next,
            });
        }
        if ticket.status == next {
            return Ok(());
        }
        self.store.set_ticket_status(ticket.id, next).await
    }

    /// The user wrote to the ticket: it now waits on support.
    ///
    /// `resolved` and `cancelled` tickets keep their status. Returns the status
    /// the ticket ends up in.
    pub async fn record_user_activity(&self, ticket: &Ticket) -> Result<TicketStatus, DeskError> {
        let next = TicketStatus::WaitingSupport;
        if ticket.status == next {
            return Ok(next);
        }
        if !can_transition(ticket.status, next) {
            if ticket.status.is_open() {
                debug!(
                    ticket_id = %ticket.id,
                    status = %ticket.status,
                    "status kept on user activity"
                );
                return Ok(ticket.status);
            }
            return Err(DeskError::InvalidTransition {
                from: ticket.status,
                to: next,
            });
        }
        self.store.set_ticket_status(ticket.id, next).await?;
        Ok(next)
    }

    /// Owner-initiated close. Fails with `NotFoundOrUnauthorized` for foreign,
    /// missing or already closed tickets.
    pub async fn close(&self, ticket_id: TicketId, owner: UserId) -> Result<(), DeskError> {
        self.store.close_ticket(ticket_id, owner).await
    }
}
