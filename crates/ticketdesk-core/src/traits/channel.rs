// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport traits: the chat platform the bot talks through.

use async_trait::async_trait;

use crate::error::DeskError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    ChatId, ImageReply, InboundEvent, PhotoPayload, Reply, SavedFile, TicketId, UserId,
};

/// Adapter for bidirectional messaging with a chat platform.
///
/// The core never retries deliveries; a failed send is reported once and dropped.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Establishes a connection to the messaging platform.
    async fn connect(&mut self) -> Result<(), DeskError>;

    /// Receives the next inbound event.
    async fn receive(&self) -> Result<InboundEvent, DeskError>;

    /// Sends a text message, optionally changing the reply keyboard.
    async fn send(&self, chat_id: ChatId, reply: &Reply) -> Result<(), DeskError>;

    /// Sends a stored image with a caption.
    async fn send_image(&self, chat_id: ChatId, image: &ImageReply) -> Result<(), DeskError>;
}

/// Media operations the conversation engine needs from the transport.
#[async_trait]
pub trait MediaGateway: Send + Sync + 'static {
    /// Downloads an inbound photo into local media storage for the given ticket.
    async fn save_photo(
        &self,
        photo: &PhotoPayload,
        owner: UserId,
        ticket_id: TicketId,
    ) -> Result<SavedFile, DeskError>;

    /// Removes a photo saved by [`save_photo`](Self::save_photo) that never got recorded.
    /// A file that is already gone is not an error.
    async fn discard(&self, file: &SavedFile) -> Result<(), DeskError>;

    /// Downloads the user's profile picture. Returns `false` when the user has none.
    async fn fetch_avatar(&self, user_id: UserId) -> Result<bool, DeskError>;
}
