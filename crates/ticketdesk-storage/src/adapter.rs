// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`TicketStore`] trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use ticketdesk_config::model::StorageConfig;
use ticketdesk_core::types::{
    MessageId, NewMessage, NewPhoto, NewTicket, PhotoId, Registration, Ticket, TicketId,
    TicketMessage, TicketPhoto, TicketStatus, User, UserId,
};
use ticketdesk_core::{AdapterType, DeskError, HealthStatus, PluginAdapter, TicketStore};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed ticket store.
///
/// The database is opened on the first call to [`TicketStore::initialize`].
pub struct SqliteTicketStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteTicketStore {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, DeskError> {
        self.db
            .get()
            .ok_or_else(|| DeskError::storage("store not initialized -- call initialize() first"))
    }
}

#[async_trait]
impl PluginAdapter for SqliteTicketStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, DeskError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DeskError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl TicketStore for SqliteTicketStore {
    async fn initialize(&self) -> Result<(), DeskError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db
            .set(db)
            .map_err(|_| DeskError::storage("store already initialized"))?;
        debug!(path = %self.config.database_path, "SQLite ticket store initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), DeskError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, DeskError> {
        queries::users::get_user(self.db()?, id).await
    }

    async fn create_user(&self, id: UserId) -> Result<(), DeskError> {
        queries::users::create_user(self.db()?, id).await
    }

    async fn update_user_registration(
        &self,
        registration: &Registration,
    ) -> Result<(), DeskError> {
        queries::users::update_user_registration(self.db()?, registration).await
    }

    async fn is_registered(&self, id: UserId) -> Result<bool, DeskError> {
        queries::users::is_registered(self.db()?, id).await
    }

    async fn create_ticket(&self, ticket: &NewTicket) -> Result<TicketId, DeskError> {
        queries::tickets::create_ticket(self.db()?, ticket).await
    }

    async fn get_ticket_by_id(&self, id: TicketId) -> Result<Option<Ticket>, DeskError> {
        queries::tickets::get_ticket(self.db()?, id).await
    }

    async fn list_active_tickets(&self, owner: UserId) -> Result<Vec<Ticket>, DeskError> {
        queries::tickets::list_tickets(self.db()?, owner, true).await
    }

    async fn list_ticket_history(&self, owner: UserId) -> Result<Vec<Ticket>, DeskError> {
        queries::tickets::list_tickets(self.db()?, owner, false).await
    }

    async fn append_message(&self, message: &NewMessage) -> Result<MessageId, DeskError> {
        queries::messages::append_message(self.db()?, message).await
    }

    async fn list_messages(&self, ticket_id: TicketId) -> Result<Vec<TicketMessage>, DeskError> {
        queries::messages::list_messages(self.db()?, ticket_id).await
    }

    async fn count_messages(&self, ticket_id: TicketId) -> Result<u64, DeskError> {
        queries::messages::count_messages(self.db()?, ticket_id).await
    }

    async fn append_photo(&self, photo: &NewPhoto) -> Result<PhotoId, DeskError> {
        queries::photos::append_photo(self.db()?, photo).await
    }

    async fn list_photos(&self, ticket_id: TicketId) -> Result<Vec<TicketPhoto>, DeskError> {
        queries::photos::list_photos(self.db()?, ticket_id).await
    }

    async fn set_ticket_status(
        &self,
        ticket_id: TicketId,
        status: TicketStatus,
    ) -> Result<(), DeskError> {
        queries::tickets::set_ticket_status(self.db()?, ticket_id, status).await
    }

    async fn close_ticket(&self, ticket_id: TicketId, owner: UserId) -> Result<(), DeskError> {
        queries::tickets::close_ticket(self.db()?, ticket_id, owner).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use ticketdesk_core::types::{Category, SenderKind};

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn store_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("meta.db");
        let store = SqliteTicketStore::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(store.name(), "sqlite");
        assert_eq!(store.version(), semver::Version::new(0, 1, 0));
        assert_eq!(store.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn health_check_fails_before_initialize() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("no_init.db");
        let store = SqliteTicketStore::new(make_config(db_path.to_str().unwrap()));
        assert!(store.health_check().await.is_err());
        assert!(store.get_user(UserId(1)).await.is_err());
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double.db");
        let store = SqliteTicketStore::new(make_config(db_path.to_str().unwrap()));
        store.initialize().await.unwrap();
        assert!(store.initialize().await.is_err());
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn full_ticket_lifecycle_through_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("lifecycle.db");
        let store = SqliteTicketStore::new(make_config(db_path.to_str().unwrap()));
        store.initialize().await.unwrap();

        store.create_user(UserId(77)).await.unwrap();
        let ticket_id = store
            .create_ticket(&NewTicket {
                owner: UserId(77),
                title: "Финансы: Не пришла зарплата за...".into(),
                description: "Не пришла зарплата за март месяц".into(),
                category: Category::Finance,
            })
            .await
            .unwrap();

        store
            .append_message(&NewMessage {
                ticket_id,
                sender_kind: SenderKind::User,
                sender_id: UserId(77),
                body: "Не пришла зарплата за март месяц".into(),
            })
            .await
            .unwrap();
        store
            .set_ticket_status(ticket_id, TicketStatus::WaitingSupport)
            .await
            .unwrap();

        assert_eq!(store.count_messages(ticket_id).await.unwrap(), 1);
        assert_eq!(store.list_active_tickets(UserId(77)).await.unwrap().len(), 1);

        store.close_ticket(ticket_id, UserId(77)).await.unwrap();
        assert!(store.list_active_tickets(UserId(77)).await.unwrap().is_empty());
        assert_eq!(store.list_ticket_history(UserId(77)).await.unwrap().len(), 1);
        assert!(
            store
                .close_ticket(ticket_id, UserId(77))
                .await
                .unwrap_err()
                .is_not_found()
        );

        store.shutdown().await.unwrap();
    }
}
