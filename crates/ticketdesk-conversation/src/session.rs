// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user conversation sessions.
//!
//! A session exists only while a user is mid-flow. [`SessionStore::lock`] hands
//! out exclusive access per user id, so two events from the same user never
//! interleave while events from different users proceed independently.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use dashmap::DashMap;
use strum::Display;
use ticketdesk_core::types::{Category, TicketId, UserId};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Where a user is in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SessionState {
    /// No session: the next event is routed to the main menu or registration.
    #[default]
    Idle,
    AwaitingFullName,
    AwaitingPhone,
    CreatingTicketCategory,
    CreatingTicketDescription,
    CreatingTicketConfirm,
    ViewingTickets,
    ViewingTicket,
    ViewingHistory,
    ViewingHistoryTicket,
}

impl SessionState {
    pub fn is_registration(self) -> bool {
        matches!(self, Self::AwaitingFullName | Self::AwaitingPhone)
    }

    pub fn is_ticket_creation(self) -> bool {
        matches!(
            self,
            Self::CreatingTicketCategory
                | Self::CreatingTicketDescription
                | Self::CreatingTicketConfirm
        )
    }
}

/// Partial data collected across the steps of a flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub full_name: Option<String>,
    pub category: Option<Category>,
    pub description: Option<String>,
    pub title: Option<String>,
    pub ticket_id: Option<TicketId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserSession {
    pub state: SessionState,
    pub draft: Draft,
}

impl UserSession {
    pub fn is_idle(&self) -> bool {
        self.state == SessionState::Idle
    }

    /// Move to `state`, keeping the draft.
    pub fn enter(&mut self, state: SessionState) {
        self.state = state;
    }

    /// Delete the session: back to idle with an empty draft.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

type Slot = Arc<Mutex<UserSession>>;

/// Concurrent map of sessions keyed by user id.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    slots: Arc<DashMap<UserId, Slot>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to the session of `user`.
    ///
    /// An idle session that nobody else is waiting on is dropped from the map
    /// when the guard is released.
    pub async fn lock(&self, user: UserId) -> SessionGuard {
        let slot = self
            .slots
            .entry(user)
            .or_insert_with(|| Arc::new(Mutex::new(UserSession::default())))
            .clone();
        let guard = slot.lock_owned().await;
        SessionGuard {
            guard,
            _release: Release {
                user,
                slots: Arc::clone(&self.slots),
            },
        }
    }

    /// Number of users with a live session.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Current session of `user` if nobody holds it.
    pub fn peek(&self, user: UserId) -> Option<UserSession> {
        let slot = self.slots.get(&user)?.clone();
        let session = slot.try_lock().ok()?.clone();
        Some(session)
    }
}

/// Exclusive handle to one user's session.
pub struct SessionGuard {
    // Declared before `_release` so the lock is released before cleanup runs.
    guard: OwnedMutexGuard<UserSession>,
    _release: Release,
}

impl Deref for SessionGuard {
    type Target = UserSession;

    fn deref(&self) -> &UserSession {
        &self.guard
    }
}

impl DerefMut for SessionGuard {
    fn deref_mut(&mut self) -> &mut UserSession {
        &mut self.guard
    }
}

struct Release {
    user: UserId,
    slots: Arc<DashMap<UserId, Slot>>,
}

impl Drop for Release {
    fn drop(&mut self) {
        // The map holds the only reference unless another task is queued on this slot.
        self.slots.remove_if(&self.user, |_, slot| {
            Arc::strong_count(slot) == 1 && slot.try_lock().is_ok_and(|s| s.is_idle())
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn idle_sessions_are_not_retained() {
        let store = SessionStore::new();
        {
            let session = store.lock(UserId(1)).await;
            assert!(session.is_idle());
        }
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn active_sessions_persist_across_locks() {
        let store = SessionStore::new();
        {
            let mut session = store.lock(UserId(1)).await;
            session.enter(SessionState::AwaitingFullName);
        }
        assert_eq!(store.len(), 1);
        let peeked = store.peek(UserId(1)).unwrap();
        assert_eq!(peeked.state, SessionState::AwaitingFullName);

        {
            let mut session = store.lock(UserId(1)).await;
            session.reset();
        }
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn same_user_is_serialized() {
        let store = SessionStore::new();
        let first = store.lock(UserId(1)).await;

        let contender = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut session = store.lock(UserId(1)).await;
                session.enter(SessionState::ViewingTickets);
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());
        drop(first);
        contender.await.unwrap();
        assert_eq!(
            store.peek(UserId(1)).unwrap().state,
            SessionState::ViewingTickets
        );
    }

    #[tokio::test]
    async fn different_users_do_not_block_each_other() {
        let store = SessionStore::new();
        let _held = store.lock(UserId(1)).await;
        let other = tokio::time::timeout(Duration::from_secs(1), store.lock(UserId(2))).await;
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn queued_waiter_keeps_slot_alive() {
        let store = SessionStore::new();
        let mut first = store.lock(UserId(1)).await;
        first.enter(SessionState::CreatingTicketConfirm);

        let waiter = {
            let store = store.clone();
            tokio::spawn(async move {
                let session = store.lock(UserId(1)).await;
                session.state
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        first.reset();
        drop(first);
        assert_eq!(waiter.await.unwrap(), SessionState::Idle);
        assert!(store.is_empty());
    }

    #[test]
    fn state_names_are_snake_case() {
        assert_eq!(
            SessionState::CreatingTicketDescription.to_string(),
            "creating_ticket_description"
        );
        assert!(SessionState::AwaitingPhone.is_registration());
        assert!(SessionState::CreatingTicketConfirm.is_ticket_creation());
        assert!(!SessionState::ViewingTicket.is_ticket_creation());
    }
}
