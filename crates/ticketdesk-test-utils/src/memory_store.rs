// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory ticket store.
//!
//! Mirrors the SQLite store's contract: lists oldest first, conditional close,
//! no status writes after `closed`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use ticketdesk_core::traits::adapter::PluginAdapter;
use ticketdesk_core::traits::store::TicketStore;
use ticketdesk_core::types::{
    AdapterType, HealthStatus, MessageId, NewMessage, NewPhoto, NewTicket, PhotoId,
    Registration, Ticket, TicketId, TicketMessage, TicketPhoto, TicketStatus, User, UserId,
};
use ticketdesk_core::DeskError;

#[derive(Default)]
struct Inner {
    users: BTreeMap<UserId, User>,
    tickets: BTreeMap<TicketId, Ticket>,
    messages: Vec<TicketMessage>,
    photos: Vec<TicketPhoto>,
}

/// A [`TicketStore`] backed by maps, with failure injection.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    panic_reads: AtomicBool,
    tickets_created: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every read operation fail with a storage error.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every write operation fail with a storage error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every read operation panic, to exercise panic isolation in callers.
    pub fn panic_on_reads(&self, panic: bool) {
        self.panic_reads.store(panic, Ordering::SeqCst);
    }

    /// Insert or replace a user record directly, e.g. a named support agent.
    pub async fn insert_user(&self, user: User) {
        self.inner.lock().await.users.insert(user.id, user);
    }

    /// Insert a registered user with the given name.
    pub async fn insert_registered(&self, id: i64, full_name: &str) -> UserId {
        let id = UserId(id);
        self.insert_user(User {
            id,
            full_name: full_name.to_string(),
            phone: Some("+70000000000".to_string()),
            location: None,
            birth_date: None,
            is_registered: true,
            has_avatar: false,
            created_at: Utc::now(),
        })
        .await;
        id
    }

    /// Number of successful `create_ticket` calls.
    pub fn tickets_created(&self) -> usize {
        self.tickets_created.load(Ordering::SeqCst)
    }

    /// Snapshot of every ticket.
    pub async fn all_tickets(&self) -> Vec<Ticket> {
        self.inner.lock().await.tickets.values().cloned().collect()
    }

    fn check_read(&self) -> Result<(), DeskError> {
        if self.panic_reads.load(Ordering::SeqCst) {
            panic!("injected panic in store read");
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DeskError::storage("injected read failure"));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), DeskError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DeskError::storage("injected write failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, DeskError> {
        if self.fail_reads.load(Ordering::SeqCst) || self.fail_writes.load(Ordering::SeqCst) {
            return Ok(HealthStatus::Degraded("failure injection enabled".into()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DeskError> {
        Ok(())
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn initialize(&self) -> Result<(), DeskError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), DeskError> {
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, DeskError> {
        self.check_read()?;
        Ok(self.inner.lock().await.users.get(&id).cloned())
    }

    async fn create_user(&self, id: UserId) -> Result<(), DeskError> {
        self.check_write()?;
        self.inner.lock().await.users.entry(id).or_insert_with(|| User {
            id,
            full_name: String::new(),
            phone: None,
            location: None,
            birth_date: None,
            is_registered: false,
            has_avatar: false,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn update_user_registration(&self, registration: &Registration) -> Result<(), DeskError> {
        self.check_write()?;
        let mut inner = self.inner.lock().await;
        let user = inner
            .users
            .get_mut(&registration.user_id)
            .ok_or_else(|| DeskError::storage(format!("user {} does not exist", registration.user_id)))?;
        user.full_name = registration.full_name.clone();
        user.phone = Some(registration.phone.clone());
        user.location = registration.location;
        user.birth_date = registration.birth_date;
        user.has_avatar = registration.has_avatar;
        user.is_registered = true;
        Ok(())
    }

    async fn is_registered(&self, id: UserId) -> Result<bool, DeskError> {
        self.check_read()?;
        Ok(self
            .inner
            .lock()
            .await
            .users
            .get(&id)
            .is_some_and(|u| u.is_registered))
    }

    async fn create_ticket(&self, ticket: &NewTicket) -> Result<TicketId, DeskError> {
        self.check_write()?;
        let mut inner = self.inner.lock().await;
        let id = TicketId(inner.tickets.len() as i64 + 1);
        inner.tickets.insert(
            id,
            Ticket {
                id,
                owner: ticket.owner,
                title: ticket.title.clone(),
                description: ticket.description.clone(),
                category: ticket.category,
                status: TicketStatus::Created,
                created_at: Utc::now(),
                closed_at: None,
            },
        );
        self.tickets_created.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }

    async fn get_ticket_by_id(&self, id: TicketId) -> Result<Option<Ticket>, DeskError> {
        self.check_read()?;
        Ok(self.inner.lock().await.tickets.get(&id).cloned())
    }

    async fn list_active_tickets(&self, owner: UserId) -> Result<Vec<Ticket>, DeskError> {
        self.check_read()?;
        Ok(self
            .inner
            .lock()
            .await
            .tickets
            .values()
            .filter(|t| t.owner == owner && t.status.is_open())
            .cloned()
            .collect())
    }

    async fn list_ticket_history(&self, owner: UserId) -> Result<Vec<Ticket>, DeskError> {
        self.check_read()?;
        Ok(self
            .inner
            .lock()
            .await
            .tickets
            .values()
            .filter(|t| t.owner == owner)
            .cloned()
            .collect())
    }

    async fn append_message(&self, message: &NewMessage) -> Result<MessageId, DeskError> {
        self.check_write()?;
        let mut inner = self.inner.lock().await;
        if !inner.tickets.contains_key(&message.ticket_id) {
            return Err(DeskError::storage(format!(
                "ticket {} does not exist",
                message.ticket_id
            )));
        }
        let id = MessageId(inner.messages.len() as i64 + 1);
        inner.messages.push(TicketMessage {
            id,
            ticket_id: message.ticket_id,
            sender_kind: message.sender_kind,
            sender_id: message.sender_id,
            body: message.body.clone(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn list_messages(&self, ticket_id: TicketId) -> Result<Vec<TicketMessage>, DeskError> {
        self.check_read()?;
        Ok(self
            .inner
            .lock()
            .await
            .messages
            .iter()
            .filter(|m| m.ticket_id == ticket_id)
            .cloned()
            .collect())
    }

    async fn count_messages(&self, ticket_id: TicketId) -> Result<u64, DeskError> {
        self.check_read()?;
        Ok(self
            .inner
            .lock()
            .await
            .messages
            .iter()
            .filter(|m| m.ticket_id == ticket_id)
            .count() as u64)
    }

    async fn append_photo(&self, photo: &NewPhoto) -> Result<PhotoId, DeskError> {
        self.check_write()?;
        let mut inner = self.inner.lock().await;
        if !inner.messages.iter().any(|m| m.id == photo.message_id) {
            return Err(DeskError::storage(format!(
                "message {} does not exist",
                photo.message_id
            )));
        }
        let id = PhotoId(inner.photos.len() as i64 + 1);
        inner.photos.push(TicketPhoto {
            id,
            ticket_id: photo.ticket_id,
            sender_kind: photo.sender_kind,
            sender_id: photo.sender_id,
            file_ref: photo.file_ref.clone(),
            message_id: photo.message_id,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn list_photos(&self, ticket_id: TicketId) -> Result<Vec<TicketPhoto>, DeskError> {
        self.check_read()?;
        Ok(self
            .inner
            .lock()
            .await
            .photos
            .iter()
            .filter(|p| p.ticket_id == ticket_id)
            .cloned()
            .collect())
    }

    async fn set_ticket_status(
        &self,
        ticket_id: TicketId,
        status: TicketStatus,
    ) -> Result<(), DeskError> {
        self.check_write()?;
        let mut inner = self.inner.lock().await;
        match inner.tickets.get_mut(&ticket_id) {
            Some(ticket) if ticket.status.is_open() => {
                ticket.status = status;
                if status == TicketStatus::Closed {
                    ticket.closed_at = Some(Utc::now());
                }
                Ok(())
            }
            _ => Err(DeskError::NotFoundOrUnauthorized { ticket_id }),
        }
    }

    async fn close_ticket(&self, ticket_id: TicketId, owner: UserId) -> Result<(), DeskError> {
        self.check_write()?;
        let mut inner = self.inner.lock().await;
        match inner.tickets.get_mut(&ticket_id) {
            Some(ticket) if ticket.owner == owner && ticket.status.is_open() => {
                ticket.status = TicketStatus::Closed;
                ticket.closed_at = Some(Utc::now());
                Ok(())
            }
            _ => Err(DeskError::NotFoundOrUnauthorized { ticket_id }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketdesk_core::types::{Category, SenderKind};

    fn new_ticket(owner: i64) -> NewTicket {
        NewTicket {
            owner: UserId(owner),
            title: "Вопрос: тест".into(),
            description: "описание тикета".into(),
            category: Category::Question,
        }
    }

    #[tokio::test]
    async fn close_is_owner_checked_and_single_shot() {
        let store = MemoryStore::new();
        let id = store.create_ticket(&new_ticket(1)).await.unwrap();

        let foreign = store.close_ticket(id, UserId(2)).await.unwrap_err();
        assert!(foreign.is_not_found());

        store.close_ticket(id, UserId(1)).await.unwrap();
        let again = store.close_ticket(id, UserId(1)).await.unwrap_err();
        assert!(again.is_not_found());

        let ticket = store.get_ticket_by_id(id).await.unwrap().unwrap();
        assert_eq!(ticket.status, TicketStatus::Closed);
        assert!(ticket.closed_at.is_some());
        assert!(store.list_active_tickets(UserId(1)).await.unwrap().is_empty());
        assert_eq!(store.list_ticket_history(UserId(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn injected_failures_are_storage_errors() {
        let store = MemoryStore::new();
        store.fail_writes(true);
        let err = store.create_user(UserId(1)).await.unwrap_err();
        assert!(err.is_store_failure());
        assert!(matches!(
            store.health_check().await.unwrap(),
            HealthStatus::Degraded(_)
        ));

        store.fail_writes(false);
        store.fail_reads(true);
        assert!(store.is_registered(UserId(1)).await.unwrap_err().is_store_failure());
    }

    #[tokio::test]
    async fn photos_require_an_existing_message() {
        let store = MemoryStore::new();
        let ticket_id = store.create_ticket(&new_ticket(1)).await.unwrap();
        let orphan = NewPhoto {
            ticket_id,
            sender_kind: SenderKind::User,
            sender_id: UserId(1),
            file_ref: "x.jpg".into(),
            message_id: MessageId(99),
        };
        assert!(store.append_photo(&orphan).await.is_err());

        let message_id = store
            .append_message(&NewMessage {
                ticket_id,
                sender_kind: SenderKind::User,
                sender_id: UserId(1),
                body: "прикрепил фото x.jpg".into(),
            })
            .await
            .unwrap();
        store
            .append_photo(&NewPhoto {
                message_id,
                ..orphan
            })
            .await
            .unwrap();
        assert_eq!(store.list_photos(ticket_id).await.unwrap().len(), 1);
    }
}
