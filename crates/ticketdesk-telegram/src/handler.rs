// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filtering of incoming Telegram messages and their conversion into
//! transport-neutral [`InboundEvent`]s.

use teloxide::types::{ChatKind, Message};
use ticketdesk_core::types::{
    ChatId, ContactPayload, InboundEvent, InboundPayload, PhotoPayload, UserId,
};

/// Checks whether the sender may talk to the bot.
///
/// An empty `allowed_users` list admits every sender. Otherwise the sender's
/// numeric id or username (with or without `@`, case-insensitive) must be listed.
/// Messages without a sender are always rejected.
pub fn is_authorized(msg: &Message, allowed_users: &[String]) -> bool {
    let Some(user) = msg.from.as_ref() else {
        return false;
    };
    if allowed_users.is_empty() {
        return true;
    }

    let user_id = user.id.0.to_string();
    allowed_users.iter().any(|allowed| {
        if *allowed == user_id {
            return true;
        }
        let wanted = allowed.strip_prefix('@').unwrap_or(allowed);
        user.username
            .as_deref()
            .is_some_and(|name| name.eq_ignore_ascii_case(wanted))
    })
}

/// Tickets are handled in private chats only.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

/// Converts a message into an event, or `None` for unsupported content
/// such as stickers, and for sender-less messages.
pub fn to_inbound_event(msg: &Message) -> Option<InboundEvent> {
    let user = msg.from.as_ref()?;
    let user_id = UserId(i64::try_from(user.id.0).ok()?);
    let payload = extract_payload(msg)?;
    Some(InboundEvent {
        user_id,
        chat_id: ChatId(msg.chat.id.0),
        payload,
    })
}

fn extract_payload(msg: &Message) -> Option<InboundPayload> {
    if let Some(text) = msg.text() {
        return Some(InboundPayload::Text(text.to_string()));
    }

    if let Some(contact) = msg.contact() {
        return Some(InboundPayload::Contact(ContactPayload {
            owner_id: contact
                .user_id
                .and_then(|id| i64::try_from(id.0).ok())
                .map(UserId),
            phone: contact.phone_number.clone(),
            first_name: contact.first_name.clone(),
            last_name: contact.last_name.clone(),
        }));
    }

    // Telegram lists sizes smallest first.
    if let Some(largest) = msg.photo().and_then(|sizes| sizes.last()) {
        return Some(InboundPayload::Photo(PhotoPayload {
            file_id: largest.file.id.to_string(),
            caption: msg.caption().map(str::to_string),
        }));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_json(extra: serde_json::Value, chat: serde_json::Value) -> Message {
        let mut json = serde_json::json!({
            "message_id": 1,
            "date": 1700000000i64,
            "chat": chat,
            "from": {
                "id": 12345,
                "is_bot": false,
                "first_name": "Иван",
                "username": "ivan_p",
            },
        });
        if let (Some(base), Some(extra)) = (json.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        serde_json::from_value(json).expect("failed to deserialize mock message")
    }

    fn private() -> serde_json::Value {
        serde_json::json!({ "id": 12345i64, "type": "private", "first_name": "Иван" })
    }

    fn private_text(text: &str) -> Message {
        from_json(serde_json::json!({ "text": text }), private())
    }

    #[test]
    fn empty_allow_list_admits_everyone() {
        assert!(is_authorized(&private_text("привет"), &[]));
    }

    #[test]
    fn allow_list_matches_id_or_username() {
        let msg = private_text("привет");
        assert!(is_authorized(&msg, &["12345".into()]));
        assert!(is_authorized(&msg, &["@Ivan_P".into()]));
        assert!(!is_authorized(&msg, &["99999".into(), "someone".into()]));
    }

    #[test]
    fn message_without_sender_is_rejected() {
        let json = serde_json::json!({
            "message_id": 1,
            "date": 1700000000i64,
            "chat": private(),
            "text": "привет",
        });
        let msg: Message = serde_json::from_value(json).unwrap();
        assert!(!is_authorized(&msg, &[]));
        assert!(to_inbound_event(&msg).is_none());
    }

    #[test]
    fn group_chats_are_not_dms() {
        let group = serde_json::json!({ "id": -100123i64, "type": "supergroup", "title": "Поддержка" });
        let msg = from_json(serde_json::json!({ "text": "привет" }), group);
        assert!(!is_dm(&msg));
        assert!(is_dm(&private_text("привет")));
    }

    #[test]
    fn text_message_becomes_text_event() {
        let event = to_inbound_event(&private_text("✨ Создать тикет")).unwrap();
        assert_eq!(event.user_id, UserId(12345));
        assert_eq!(event.chat_id, ChatId(12345));
        assert_eq!(event.payload, InboundPayload::Text("✨ Создать тикет".into()));
    }

    #[test]
    fn contact_keeps_owner_id() {
        let msg = from_json(
            serde_json::json!({
                "contact": {
                    "phone_number": "+79990001122",
                    "first_name": "Иван",
                    "last_name": "Петров",
                    "user_id": 12345,
                }
            }),
            private(),
        );
        let InboundPayload::Contact(contact) = to_inbound_event(&msg).unwrap().payload else {
            panic!("expected contact");
        };
        assert_eq!(contact.owner_id, Some(UserId(12345)));
        assert_eq!(contact.phone, "+79990001122");
        assert_eq!(contact.last_name.as_deref(), Some("Петров"));
    }

    #[test]
    fn contact_without_user_id_has_no_owner() {
        let msg = from_json(
            serde_json::json!({
                "contact": { "phone_number": "+70000000000", "first_name": "Аноним" }
            }),
            private(),
        );
        let InboundPayload::Contact(contact) = to_inbound_event(&msg).unwrap().payload else {
            panic!("expected contact");
        };
        assert_eq!(contact.owner_id, None);
    }

    #[test]
    fn photo_uses_largest_size_and_caption() {
        let msg = from_json(
            serde_json::json!({
                "photo": [
                    { "file_id": "small", "file_unique_id": "s", "width": 90, "height": 90, "file_size": 1000 },
                    { "file_id": "large", "file_unique_id": "l", "width": 1280, "height": 960, "file_size": 90000 },
                ],
                "caption": "скриншот",
            }),
            private(),
        );
        let event = to_inbound_event(&msg).unwrap();
        assert_eq!(
            event.payload,
            InboundPayload::Photo(PhotoPayload {
                file_id: "large".into(),
                caption: Some("скриншот".into()),
            })
        );
    }

    #[test]
    fn location_is_unsupported() {
        let msg = from_json(
            serde_json::json!({ "location": { "latitude": 55.75, "longitude": 37.61 } }),
            private(),
        );
        assert!(to_inbound_event(&msg).is_none());
    }
}
