// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the ticketdesk support bot.

use thiserror::Error;

use crate::types::{TicketId, TicketStatus};

/// The primary error type used across all adapter traits and core operations.
#[derive(Debug, Error)]
pub enum DeskError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// User input rejected by a validation rule. Always recoverable.
    #[error("validation rejected: {0}")]
    Validation(String),

    /// The ticket does not exist or belongs to someone else.
    #[error("ticket #{ticket_id} not found or not owned by the requesting user")]
    NotFoundOrUnauthorized { ticket_id: TicketId },

    /// A status write the ticket lifecycle does not allow.
    #[error("ticket status cannot move from {from} to {to}")]
    InvalidTransition { from: TicketStatus, to: TicketStatus },

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Channel adapter errors (connection failure, message format, download failure).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DeskError {
    /// Builds a storage error from a plain message.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            source: message.into().into(),
        }
    }

    /// Builds a channel error without an underlying source.
    pub fn channel(message: impl Into<String>) -> Self {
        Self::Channel {
            message: message.into(),
            source: None,
        }
    }

    /// True for persistence failures (StoreFailure in the error taxonomy).
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }

    /// True when a ticket lookup or ownership check failed.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFoundOrUnauthorized { .. })
    }
}
