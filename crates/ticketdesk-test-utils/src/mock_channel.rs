// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` with injectable inbound events and
//! captured deliveries for assertion in tests.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use ticketdesk_core::DeskError;
use ticketdesk_core::traits::adapter::PluginAdapter;
use ticketdesk_core::traits::channel::ChannelAdapter;
use ticketdesk_core::types::{AdapterType, ChatId, HealthStatus, ImageReply, InboundEvent, Reply};

/// Something the channel was asked to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Text { chat_id: ChatId, reply: Reply },
    Image { chat_id: ChatId, image: ImageReply },
}

impl Delivery {
    /// Text of a message, or caption of an image.
    pub fn text(&self) -> &str {
        match self {
            Delivery::Text { reply, .. } => &reply.text,
            Delivery::Image { image, .. } => &image.caption,
        }
    }

    pub fn chat_id(&self) -> ChatId {
        match self {
            Delivery::Text { chat_id, .. } | Delivery::Image { chat_id, .. } => *chat_id,
        }
    }
}

/// A mock messaging channel.
///
/// - **inbound**: events injected via `inject()` are returned by `receive()`
/// - **sent**: everything passed to `send()` / `send_image()` is captured in order
#[derive(Clone, Default)]
pub struct MockChannel {
    inbound: Arc<Mutex<VecDeque<InboundEvent>>>,
    sent: Arc<Mutex<Vec<Delivery>>>,
    notify: Arc<Notify>,
    closed: Arc<AtomicBool>,
    fail_images: Arc<AtomicBool>,
    fail_sends: Arc<AtomicBool>,
    held: Arc<std::sync::Mutex<HashSet<ChatId>>>,
    released: Arc<Notify>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn inject(&self, event: InboundEvent) {
        self.inbound.lock().await.push_back(event);
        self.notify.notify_one();
    }

    /// After the queue drains, `receive()` fails instead of waiting.
    pub fn close_inbound(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Make `send_image()` fail, as when the stored file is gone.
    pub fn fail_images(&self, fail: bool) {
        self.fail_images.store(fail, Ordering::SeqCst);
    }

    /// Make `send()` fail.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Make `send()` to `chat_id` wait until [`release`](Self::release) is called,
    /// as with a stalled connection.
    pub fn hold_sends_to(&self, chat_id: ChatId) {
        self.held_chats().insert(chat_id);
    }

    pub fn release(&self, chat_id: ChatId) {
        self.held_chats().remove(&chat_id);
        self.released.notify_waiters();
    }

    fn held_chats(&self) -> std::sync::MutexGuard<'_, HashSet<ChatId>> {
        self.held.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn wait_until_released(&self, chat_id: ChatId) {
        loop {
            let released = self.released.notified();
            if !self.held_chats().contains(&chat_id) {
                return;
            }
            released.await;
        }
    }

    pub async fn sent(&self) -> Vec<Delivery> {
        self.sent.lock().await.clone()
    }

    /// Deliveries addressed to `chat_id`, in order.
    pub async fn sent_to(&self, chat_id: ChatId) -> Vec<Delivery> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|d| d.chat_id() == chat_id)
            .cloned()
            .collect()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, DeskError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DeskError> {
        self.close_inbound();
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    async fn connect(&mut self) -> Result<(), DeskError> {
        Ok(())
    }

    async fn receive(&self) -> Result<InboundEvent, DeskError> {
        loop {
            let notified = self.notify.notified();
            {
                let mut queue = self.inbound.lock().await;
                if let Some(event) = queue.pop_front() {
                    return Ok(event);
                }
            }
            if self.closed.load(Ordering::SeqCst) {
                return Err(DeskError::channel("mock inbound closed"));
            }
            notified.await;
        }
    }

    async fn send(&self, chat_id: ChatId, reply: &Reply) -> Result<(), DeskError> {
        self.wait_until_released(chat_id).await;
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(DeskError::channel("injected send failure"));
        }
        self.sent.lock().await.push(Delivery::Text {
            chat_id,
            reply: reply.clone(),
        });
        Ok(())
    }

    async fn send_image(&self, chat_id: ChatId, image: &ImageReply) -> Result<(), DeskError> {
        if self.fail_images.load(Ordering::SeqCst) {
            return Err(DeskError::channel("injected image failure"));
        }
        self.sent.lock().await.push(Delivery::Image {
            chat_id,
            image: image.clone(),
        });
        Ok(())
    }
}
