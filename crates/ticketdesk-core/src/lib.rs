// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the ticketdesk support bot.
//!
//! Holds the domain types, the error enum and the adapter traits that the
//! store, the transports and the conversation engine agree on.

pub mod error;
pub mod traits;
pub mod types;

pub use error::DeskError;
pub use types::{AdapterType, HealthStatus};

pub use traits::{ChannelAdapter, MediaGateway, PluginAdapter, TicketStore};
