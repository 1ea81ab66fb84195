// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handlers for each part of the conversation, as `impl ConversationMachine` blocks.

pub(crate) mod commands;
pub(crate) mod creation;
pub(crate) mod registration;
pub(crate) mod viewing;
