// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Repository interface for users, tickets, messages and photos.

use async_trait::async_trait;

use crate::error::DeskError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    MessageId, NewMessage, NewPhoto, NewTicket, PhotoId, Registration, Ticket, TicketId,
    TicketMessage, TicketPhoto, TicketStatus, User, UserId,
};

/// Durable storage of the support desk.
///
/// Lists are ordered oldest first, ties broken by id.
#[async_trait]
pub trait TicketStore: PluginAdapter {
    /// Prepares the backend (migrations, connections).
    async fn initialize(&self) -> Result<(), DeskError>;

    /// Flushes pending writes and releases connections.
    async fn close(&self) -> Result<(), DeskError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, DeskError>;

    /// Creates a bare, unregistered user. Does nothing if the user already exists.
    async fn create_user(&self, id: UserId) -> Result<(), DeskError>;

    /// Completes registration. The user row must exist.
    async fn update_user_registration(&self, registration: &Registration)
        -> Result<(), DeskError>;

    async fn is_registered(&self, id: UserId) -> Result<bool, DeskError>;

    /// Inserts a ticket with status `created`.
    async fn create_ticket(&self, ticket: &NewTicket) -> Result<TicketId, DeskError>;

    async fn get_ticket_by_id(&self, id: TicketId) -> Result<Option<Ticket>, DeskError>;

    /// Tickets of `owner` that are not closed.
    async fn list_active_tickets(&self, owner: UserId) -> Result<Vec<Ticket>, DeskError>;

    /// Every ticket of `owner`, closed ones included.
    async fn list_ticket_history(&self, owner: UserId) -> Result<Vec<Ticket>, DeskError>;

    async fn append_message(&self, message: &NewMessage) -> Result<MessageId, DeskError>;

    async fn list_messages(&self, ticket_id: TicketId) -> Result<Vec<TicketMessage>, DeskError>;

    async fn count_messages(&self, ticket_id: TicketId) -> Result<u64, DeskError>;

    async fn append_photo(&self, photo: &NewPhoto) -> Result<PhotoId, DeskError>;

    async fn list_photos(&self, ticket_id: TicketId) -> Result<Vec<TicketPhoto>, DeskError>;

    async fn set_ticket_status(
        &self,
        ticket_id: TicketId,
        status: TicketStatus,
    ) -> Result<(), DeskError>;

    /// Closes an open ticket owned by `owner` and stamps `closed_at`.
    ///
    /// Returns [`DeskError::NotFoundOrUnauthorized`] when no open ticket with
    /// that id belongs to `owner`, including when it is already closed.
    async fn close_ticket(&self, ticket_id: TicketId, owner: UserId) -> Result<(), DeskError>;
}
