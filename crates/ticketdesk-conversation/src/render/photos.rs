// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Photo listing for a ticket.

use ticketdesk_core::types::{
    ImageReply, Keyboard, Outbound, Reply, SenderKind, TextFormat, Ticket, TicketPhoto,
};

use super::markdown::escape;
use super::{ConversationRenderer, SUPPORT_FALLBACK_NAME, SenderNames};

/// One image of the listing, numbered within the shown window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoEntry {
    pub seq: usize,
    pub file_ref: String,
    pub caption: String,
    pub fallback: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoListing {
    Empty,
    Photos {
        header: String,
        notice: Option<String>,
        entries: Vec<PhotoEntry>,
    },
}

impl PhotoListing {
    /// Outbound units in delivery order. The last one carries `keyboard`.
    pub fn into_outbound(self, keyboard: Keyboard) -> Vec<Outbound> {
        match self {
            PhotoListing::Empty => vec![
                Reply::markdown("📷 В этом тикете нет прикрепленных фотографий\\.")
                    .with_keyboard(keyboard)
                    .into(),
            ],
            PhotoListing::Photos {
                header,
                notice,
                entries,
            } => {
                let mut out: Vec<Outbound> = vec![Reply::markdown(header).into()];
                out.extend(notice.map(|n| Outbound::from(Reply::plain(n))));
                out.extend(entries.into_iter().map(|entry| {
                    Outbound::Image(ImageReply {
                        file_ref: entry.file_ref,
                        caption: entry.caption,
                        format: TextFormat::MarkdownV2,
                        fallback: Some(Reply::plain(entry.fallback)),
                    })
                }));
                out.push(
                    Reply::plain("⬅️ Для возврата к списку тикетов нажмите 'Назад'")
                        .with_keyboard(keyboard)
                        .into(),
                );
                out
            }
        }
    }
}

impl ConversationRenderer {
    /// List the most recent photos of `ticket`, oldest of them first.
    pub fn photo_listing(
        &self,
        ticket: &Ticket,
        photos: &[TicketPhoto],
        names: &SenderNames,
    ) -> PhotoListing {
        if photos.is_empty() {
            return PhotoListing::Empty;
        }

        let total = photos.len();
        let shown = &photos[total.saturating_sub(self.limits.max_photos)..];
        let notice = (shown.len() < total).then(|| {
            format!(
                "⚠️ Показаны только последние {} из {} фотографий",
                shown.len(),
                total
            )
        });

        let entries = shown
            .iter()
            .enumerate()
            .map(|(i, photo)| {
                let seq = i + 1;
                let (emoji, sender) = match photo.sender_kind {
                    SenderKind::User => ("👤", "Вы"),
                    SenderKind::Support => (
                        "👨‍💼",
                        names
                            .get(&photo.sender_id)
                            .map(String::as_str)
                            .unwrap_or(SUPPORT_FALLBACK_NAME),
                    ),
                };
                PhotoEntry {
                    seq,
                    file_ref: photo.file_ref.clone(),
                    caption: format!(
                        "📷 *Фото \\#{seq}*\n👤 Отправитель: {emoji} {}\n🕒 Дата: {}",
                        escape(sender),
                        escape(&self.timestamp(photo.created_at)),
                    ),
                    fallback: format!("⚠️ Не удалось отправить фото #{seq}"),
                }
            })
            .collect();

        PhotoListing::Photos {
            header: format!(
                "🖼 *Фотографии к тикету \\#{}*\n\nНайдено фотографий: {total}",
                ticket.id
            ),
            notice,
            entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderLimits;
    use chrono::{TimeZone, Utc};
    use ticketdesk_core::types::{
        Category, KeyboardAction, MessageId, PhotoId, TicketId, TicketStatus, UserId,
    };

    fn ticket() -> Ticket {
        Ticket {
            id: TicketId(3),
            owner: UserId(1),
            title: "Финансы: счёт".into(),
            description: "не пришёл счёт за март".into(),
            category: Category::Finance,
            status: TicketStatus::WaitingSupport,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            closed_at: None,
        }
    }

    fn photo(i: i64, kind: SenderKind) -> TicketPhoto {
        TicketPhoto {
            id: PhotoId(i),
            ticket_id: TicketId(3),
            sender_kind: kind,
            sender_id: UserId(if kind == SenderKind::User { 1 } else { 50 }),
            file_ref: format!("/media/1/3/{i}.jpg"),
            message_id: MessageId(i),
            created_at: Utc.with_ymd_and_hms(2026, 1, 2, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn empty_listing_is_a_single_notice_with_keyboard() {
        let out = ConversationRenderer::default()
            .photo_listing(&ticket(), &[], &SenderNames::new())
            .into_outbound(Keyboard::column(["⬅️ Назад"]));
        assert_eq!(out.len(), 1);
        let Outbound::Text(reply) = &out[0] else {
            panic!("expected text");
        };
        assert!(reply.text.starts_with("📷 В этом тикете нет"));
        assert!(matches!(reply.keyboard, KeyboardAction::Show(_)));
    }

    #[test]
    fn listing_caps_to_most_recent_and_numbers_entries() {
        let photos: Vec<_> = (1..=12).map(|i| photo(i, SenderKind::User)).collect();
        let listing =
            ConversationRenderer::default().photo_listing(&ticket(), &photos, &SenderNames::new());
        let PhotoListing::Photos {
            header,
            notice,
            entries,
        } = listing
        else {
            panic!("expected photos");
        };
        assert!(header.contains("Найдено фотографий: 12"));
        assert_eq!(
            notice.as_deref(),
            Some("⚠️ Показаны только последние 10 из 12 фотографий")
        );
        assert_eq!(entries.len(), 10);
        assert_eq!(entries[0].file_ref, "/media/1/3/3.jpg");
        assert_eq!(entries[0].seq, 1);
        assert!(entries[9].caption.starts_with("📷 *Фото \\#10*"));
        assert_eq!(entries[9].fallback, "⚠️ Не удалось отправить фото #10");
    }

    #[test]
    fn captions_name_support_staff() {
        let mut names = SenderNames::new();
        names.insert(UserId(50), "Олег".into());
        let r = ConversationRenderer::new(RenderLimits::default());
        let listing = r.photo_listing(
            &ticket(),
            &[photo(1, SenderKind::Support), photo(2, SenderKind::User)],
            &names,
        );
        let out = listing.into_outbound(Keyboard::default());
        assert_eq!(out.len(), 4);
        let Outbound::Image(first) = &out[1] else {
            panic!("expected image");
        };
        assert!(first.caption.contains("Отправитель: 👨‍💼 Олег"));
        assert!(first.caption.contains("🕒 Дата: 02\\.01\\.2026 12:00"));
        let Outbound::Image(second) = &out[2] else {
            panic!("expected image");
        };
        assert!(second.caption.contains("Отправитель: 👤 Вы"));
        assert!(second.fallback.is_some());
    }
}
