// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation engine of the ticketdesk support bot.
//!
//! Registration, ticket creation and ticket viewing are driven by a per-user
//! state machine ([`ConversationMachine`]). It validates input with the pure
//! rules in [`validation`], moves tickets through [`lifecycle`] and renders
//! ticket history into size-bounded MarkdownV2 chunks with [`render`].

mod flows;
pub mod keyboards;
pub mod lifecycle;
pub mod machine;
pub mod render;
pub mod session;
pub mod validation;

pub use lifecycle::{StatusBadge, TicketLifecycle, can_transition, status_badge};
pub use machine::{ConversationMachine, MachineSettings};
pub use render::{ConversationRenderer, RenderLimits, RenderMode, RenderedTicket};
pub use session::{SessionState, SessionStore, UserSession};
pub use validation::ValidationError;
