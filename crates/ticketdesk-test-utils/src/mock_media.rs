// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media gateway double that never touches the network or the disk.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use ticketdesk_core::DeskError;
use ticketdesk_core::traits::channel::MediaGateway;
use ticketdesk_core::types::{PhotoPayload, SavedFile, TicketId, UserId};

#[derive(Default)]
pub struct MockMedia {
    counter: AtomicU64,
    fail_saves: AtomicBool,
    fail_avatars: AtomicBool,
    has_avatar: AtomicBool,
    avatar_requests: Mutex<Vec<UserId>>,
    discarded: Mutex<Vec<String>>,
}

impl MockMedia {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn fail_avatars(&self, fail: bool) {
        self.fail_avatars.store(fail, Ordering::SeqCst);
    }

    /// Whether users appear to have a profile picture.
    pub fn set_has_avatar(&self, present: bool) {
        self.has_avatar.store(present, Ordering::SeqCst);
    }

    pub async fn avatar_requests(&self) -> Vec<UserId> {
        self.avatar_requests.lock().await.clone()
    }

    /// File refs passed to `discard`, in call order.
    pub async fn discarded(&self) -> Vec<String> {
        self.discarded.lock().await.clone()
    }
}

#[async_trait]
impl MediaGateway for MockMedia {
    async fn save_photo(
        &self,
        photo: &PhotoPayload,
        owner: UserId,
        ticket_id: TicketId,
    ) -> Result<SavedFile, DeskError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(DeskError::channel("injected download failure"));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let file_name = format!("{n}_{}.jpg", photo.file_id);
        Ok(SavedFile {
            file_ref: format!("/media/{owner}/{ticket_id}/{file_name}"),
            file_name,
        })
    }

    async fn discard(&self, file: &SavedFile) -> Result<(), DeskError> {
        self.discarded.lock().await.push(file.file_ref.clone());
        Ok(())
    }

    async fn fetch_avatar(&self, user_id: UserId) -> Result<bool, DeskError> {
        self.avatar_requests.lock().await.push(user_id);
        if self.fail_avatars.load(Ordering::SeqCst) {
            return Err(DeskError::channel("injected avatar failure"));
        }
        Ok(self.has_avatar.load(Ordering::SeqCst))
    }
}
