// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram transport for the ticketdesk support bot.
//!
//! [`TelegramChannel`] implements [`ChannelAdapter`] over teloxide long polling:
//! private chats only, optional allow-list, reply keyboards and MarkdownV2 with a
//! plain-text retry. [`TelegramMedia`] implements [`MediaGateway`] for photo and
//! avatar downloads.

pub mod handler;
pub mod keyboard;
pub mod markdown;
pub mod media;

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::RequestError;
use teloxide::prelude::*;
use teloxide::types::{ChatId as TgChatId, InputFile, ParseMode, ReplyMarkup};
use ticketdesk_config::model::TelegramConfig;
use ticketdesk_core::error::DeskError;
use ticketdesk_core::traits::{ChannelAdapter, PluginAdapter};
use ticketdesk_core::types::{
    AdapterType, ChatId, HealthStatus, ImageReply, InboundEvent, Reply, TextFormat,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub use media::TelegramMedia;

/// Capacity of the queue between the polling task and [`ChannelAdapter::receive`].
const INBOUND_CAPACITY: usize = 100;

pub struct TelegramChannel {
    bot: Bot,
    config: TelegramConfig,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundEvent>>,
    /// Moved into the polling task by `connect`; `receive` reports a closed
    /// channel once that task is gone.
    inbound_tx: Option<mpsc::Sender<InboundEvent>>,
    polling_handle: Option<tokio::task::JoinHandle<()>>,
}

impl TelegramChannel {
    /// Requires `config.bot_token` to be set and non-empty.
    pub fn new(config: TelegramConfig) -> Result<Self, DeskError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            DeskError::Config("telegram.bot_token is required for the Telegram transport".into())
        })?;
        if token.is_empty() {
            return Err(DeskError::Config("telegram.bot_token cannot be empty".into()));
        }

        let bot = Bot::new(token);
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);
        Ok(Self {
            bot,
            config,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx: Some(inbound_tx),
            polling_handle: None,
        })
    }

    /// Media gateway sharing this channel's bot and media directory.
    pub fn media(&self) -> TelegramMedia {
        TelegramMedia::new(self.bot.clone(), self.config.media_dir.clone())
    }

    async fn send_text(
        &self,
        chat_id: TgChatId,
        text: &str,
        format: TextFormat,
        markup: Option<ReplyMarkup>,
    ) -> Result<(), RequestError> {
        let mut request = self.bot.send_message(chat_id, text);
        if format == TextFormat::MarkdownV2 {
            request = request.parse_mode(ParseMode::MarkdownV2);
        }
        if let Some(markup) = markup {
            request = request.reply_markup(markup);
        }
        request.await.map(|_| ())
    }

    async fn send_photo(
        &self,
        chat_id: TgChatId,
        image: &ImageReply,
        caption: &str,
        format: TextFormat,
    ) -> Result<(), RequestError> {
        let mut request = self
            .bot
            .send_photo(chat_id, InputFile::file(&image.file_ref))
            .caption(caption);
        if format == TextFormat::MarkdownV2 {
            request = request.parse_mode(ParseMode::MarkdownV2);
        }
        request.await.map(|_| ())
    }
}

fn is_markup_rejection(e: &RequestError) -> bool {
    e.to_string().contains("can't parse entities")
}

fn send_failed(e: RequestError) -> DeskError {
    DeskError::Channel {
        message: format!("failed to send message: {e}"),
        source: Some(Box::new(e)),
    }
}

#[async_trait]
impl PluginAdapter for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, DeskError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), DeskError> {
        debug!("Telegram channel shutting down");
        if let Some(handle) = &self.polling_handle {
            handle.abort();
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for TelegramChannel {
    async fn connect(&mut self) -> Result<(), DeskError> {
        if self.polling_handle.is_some() {
            return Ok(());
        }
        let tx = self
            .inbound_tx
            .take()
            .ok_or_else(|| DeskError::channel("Telegram channel was already shut down"))?;

        let bot = self.bot.clone();
        let allowed_users: Arc<Vec<String>> = Arc::new(self.config.allowed_users.clone());

        info!("starting Telegram long polling");

        let handle = tokio::spawn(async move {
            let handler = Update::filter_message().endpoint(move |msg: Message| {
                let tx = tx.clone();
                let allowed = allowed_users.clone();
                async move {
                    if !handler::is_dm(&msg) {
                        debug!(chat_id = msg.chat.id.0, "ignoring non-private chat");
                        return respond(());
                    }
                    if !handler::is_authorized(&msg, &allowed) {
                        debug!(chat_id = msg.chat.id.0, "ignoring unauthorized user");
                        return respond(());
                    }
                    match handler::to_inbound_event(&msg) {
                        Some(event) => {
                            if tx.send(event).await.is_err() {
                                warn!("inbound channel closed, dropping message");
                            }
                        }
                        None => {
                            debug!(msg_id = msg.id.0, "ignoring unsupported message type");
                        }
                    }
                    respond(())
                }
            });

            Dispatcher::builder(bot, handler)
                .default_handler(|_| async {})
                .build()
                .dispatch()
                .await;
        });

        self.polling_handle = Some(handle);
        Ok(())
    }

    async fn receive(&self) -> Result<InboundEvent, DeskError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv()
            .await
            .ok_or_else(|| DeskError::channel("Telegram inbound channel closed"))
    }

    async fn send(&self, chat_id: ChatId, reply: &Reply) -> Result<(), DeskError> {
        let chat = TgChatId(chat_id.0);
        let markup = keyboard::reply_markup(&reply.keyboard);

        match self
            .send_text(chat, &reply.text, reply.format, markup.clone())
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if reply.format == TextFormat::MarkdownV2 && is_markup_rejection(&e) => {
                warn!(chat_id = chat_id.0, error = %e, "MarkdownV2 rejected, sending as plain text");
                let plain = markdown::to_plain(&reply.text);
                self.send_text(chat, &plain, TextFormat::Plain, markup)
                    .await
                    .map_err(send_failed)
            }
            Err(e) => Err(send_failed(e)),
        }
    }

    async fn send_image(&self, chat_id: ChatId, image: &ImageReply) -> Result<(), DeskError> {
        let chat = TgChatId(chat_id.0);
        match self
            .send_photo(chat, image, &image.caption, image.format)
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if image.format == TextFormat::MarkdownV2 && is_markup_rejection(&e) => {
                warn!(
                    chat_id = chat_id.0,
                    error = %e,
                    "MarkdownV2 caption rejected, sending as plain text"
                );
                self.send_photo(
                    chat,
                    image,
                    &markdown::to_plain(&image.caption),
                    TextFormat::Plain,
                )
                .await
                .map_err(send_failed)
            }
            Err(e) => Err(DeskError::Channel {
                message: format!("failed to send photo {}: {e}", image.file_ref),
                source: Some(Box::new(e)),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token: Option<&str>) -> TelegramConfig {
        TelegramConfig {
            bot_token: token.map(str::to_string),
            media_dir: "/tmp/ticketdesk-media".into(),
            ..TelegramConfig::default()
        }
    }

    #[test]
    fn new_requires_bot_token() {
        assert!(matches!(
            TelegramChannel::new(config(None)),
            Err(DeskError::Config(_))
        ));
    }

    #[test]
    fn new_rejects_empty_token() {
        assert!(TelegramChannel::new(config(Some(""))).is_err());
    }

    #[test]
    fn new_accepts_valid_token() {
        let token = "123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11";
        assert!(TelegramChannel::new(config(Some(token))).is_ok());
    }

    #[test]
    fn media_gateway_uses_configured_directory() {
        let channel = TelegramChannel::new(config(Some("test:token"))).unwrap();
        assert_eq!(
            channel.media().avatar_path(ticketdesk_core::types::UserId(3)),
            std::path::PathBuf::from("/tmp/ticketdesk-media/avatars/3.jpg")
        );
    }

    #[test]
    fn plugin_adapter_metadata() {
        let channel = TelegramChannel::new(config(Some("test:token"))).unwrap();
        assert_eq!(channel.name(), "telegram");
        assert_eq!(channel.version(), semver::Version::new(0, 1, 0));
        assert_eq!(channel.adapter_type(), AdapterType::Channel);
    }

    #[tokio::test]
    async fn receive_fails_once_polling_is_gone() {
        let mut channel = TelegramChannel::new(config(Some("test:token"))).unwrap();
        // Dropping the sender without ever polling closes the queue.
        channel.inbound_tx.take();
        assert!(channel.receive().await.is_err());
    }
}
