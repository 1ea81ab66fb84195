// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Downloads of ticket photos and profile pictures into the media directory.
//!
//! Layout: `<media_dir>/<user_id>/<ticket_id>/<unix_ts>_<file_id>.jpg` for ticket
//! photos and `<media_dir>/avatars/<user_id>.jpg` for profile pictures.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{FileId, UserId as TgUserId};
use ticketdesk_core::DeskError;
use ticketdesk_core::traits::channel::MediaGateway;
use ticketdesk_core::types::{PhotoPayload, SavedFile, TicketId, UserId};
use tracing::debug;

/// [`MediaGateway`] backed by the Telegram file API.
#[derive(Clone)]
pub struct TelegramMedia {
    bot: Bot,
    media_dir: PathBuf,
}

impl TelegramMedia {
    pub fn new(bot: Bot, media_dir: impl Into<PathBuf>) -> Self {
        Self {
            bot,
            media_dir: media_dir.into(),
        }
    }

    /// Where a ticket photo received at `unix_ts` is stored.
    pub fn photo_path(
        &self,
        owner: UserId,
        ticket_id: TicketId,
        unix_ts: i64,
        file_id: &str,
    ) -> PathBuf {
        self.media_dir
            .join(owner.to_string())
            .join(ticket_id.to_string())
            .join(photo_file_name(unix_ts, file_id))
    }

    pub fn avatar_path(&self, user_id: UserId) -> PathBuf {
        self.media_dir.join("avatars").join(format!("{user_id}.jpg"))
    }

    /// Resolves `file_id` with `getFile` and streams the content into `dest`.
    async fn download(&self, file_id: &str, dest: &Path) -> Result<(), DeskError> {
        let file = self
            .bot
            .get_file(FileId(file_id.to_string()))
            .await
            .map_err(|e| DeskError::Channel {
                message: format!("failed to get file info: {e}"),
                source: Some(Box::new(e)),
            })?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error("failed to create media directory", e))?;
        }
        let mut out = tokio::fs::File::create(dest)
            .await
            .map_err(|e| io_error("failed to create media file", e))?;

        if let Err(e) = self.bot.download_file(&file.path, &mut out).await {
            // Leave no truncated file behind.
            drop(out);
            let _ = tokio::fs::remove_file(dest).await;
            return Err(DeskError::Channel {
                message: format!("failed to download file: {e}"),
                source: Some(Box::new(e)),
            });
        }

        debug!(file_id, path = %dest.display(), "downloaded file from Telegram");
        Ok(())
    }
}

fn photo_file_name(unix_ts: i64, file_id: &str) -> String {
    format!("{unix_ts}_{file_id}.jpg")
}

fn io_error(message: &str, e: std::io::Error) -> DeskError {
    DeskError::Channel {
        message: format!("{message}: {e}"),
        source: Some(Box::new(e)),
    }
}

fn telegram_user(user_id: UserId) -> Result<TgUserId, DeskError> {
    u64::try_from(user_id.0)
        .map(TgUserId)
        .map_err(|_| DeskError::channel(format!("invalid Telegram user id {user_id}")))
}

#[async_trait]
impl MediaGateway for TelegramMedia {
    async fn save_photo(
        &self,
        photo: &PhotoPayload,
        owner: UserId,
        ticket_id: TicketId,
    ) -> Result<SavedFile, DeskError> {
        let unix_ts = Utc::now().timestamp();
        let path = self.photo_path(owner, ticket_id, unix_ts, &photo.file_id);
        self.download(&photo.file_id, &path).await?;
        Ok(SavedFile {
            file_name: photo_file_name(unix_ts, &photo.file_id),
            file_ref: path.to_string_lossy().into_owned(),
        })
    }

    async fn discard(&self, file: &SavedFile) -> Result<(), DeskError> {
        match tokio::fs::remove_file(&file.file_ref).await {
            Ok(()) => {
                debug!(path = %file.file_ref, "removed unrecorded photo");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("failed to remove media file", e)),
        }
    }

    async fn fetch_avatar(&self, user_id: UserId) -> Result<bool, DeskError> {
        let photos = self
            .bot
            .get_user_profile_photos(telegram_user(user_id)?)
            .limit(1)
            .await
            .map_err(|e| DeskError::Channel {
                message: format!("failed to get profile photos: {e}"),
                source: Some(Box::new(e)),
            })?;

        let Some(largest) = photos.photos.first().and_then(|sizes| sizes.last()) else {
            return Ok(false);
        };
        self.download(&largest.file.id.to_string(), &self.avatar_path(user_id))
            .await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media() -> TelegramMedia {
        TelegramMedia::new(Bot::new("test:token"), "/var/lib/ticketdesk/uploads")
    }

    #[test]
    fn photos_are_grouped_by_user_and_ticket() {
        let path = media().photo_path(UserId(42), TicketId(7), 1_700_000_000, "AgAD");
        assert_eq!(
            path,
            PathBuf::from("/var/lib/ticketdesk/uploads/42/7/1700000000_AgAD.jpg")
        );
    }

    #[test]
    fn avatars_live_in_their_own_directory() {
        assert_eq!(
            media().avatar_path(UserId(42)),
            PathBuf::from("/var/lib/ticketdesk/uploads/avatars/42.jpg")
        );
    }

    #[tokio::test]
    async fn discard_removes_the_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("42").join("7").join("1700000000_AgAD.jpg");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"jpeg").unwrap();

        let media = TelegramMedia::new(Bot::new("test:token"), dir.path());
        let saved = SavedFile {
            file_name: "1700000000_AgAD.jpg".into(),
            file_ref: path.to_string_lossy().into_owned(),
        };
        media.discard(&saved).await.unwrap();
        assert!(!path.exists());
        // Already gone.
        media.discard(&saved).await.unwrap();
    }

    #[test]
    fn negative_user_ids_are_rejected() {
        assert!(telegram_user(UserId(-1)).is_err());
        assert_eq!(telegram_user(UserId(5)).unwrap(), TgUserId(5));
    }
}
