// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles shared by the ticketdesk crates.
//!
//! - [`MemoryStore`]: an in-memory [`TicketStore`](ticketdesk_core::TicketStore)
//!   with switchable read and write failures.
//! - [`MockChannel`]: a [`ChannelAdapter`](ticketdesk_core::ChannelAdapter) with an
//!   injectable inbound queue and captured deliveries.
//! - [`MockMedia`]: a [`MediaGateway`](ticketdesk_core::MediaGateway) that fabricates
//!   file references without touching the disk.

pub mod memory_store;
pub mod mock_channel;
pub mod mock_media;

pub use memory_store::MemoryStore;
pub use mock_channel::{Delivery, MockChannel};
pub use mock_media::MockMedia;

use ticketdesk_core::types::{ChatId, InboundEvent, InboundPayload, UserId};

/// A text event from `user` in their private chat.
pub fn text_event(user: i64, text: &str) -> InboundEvent {
    InboundEvent {
        user_id: UserId(user),
        chat_id: ChatId(user),
        payload: InboundPayload::Text(text.to_string()),
    }
}
