// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite ticket store.
//!
//! WAL-mode SQLite with embedded migrations and a single-writer concurrency
//! model via `tokio-rusqlite`. Typed queries cover users, tickets, messages
//! and photos.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteTicketStore;
pub use database::Database;
