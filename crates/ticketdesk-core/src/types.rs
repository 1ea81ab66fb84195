// SPDX-FileCopyrightText: 2026 Ticketdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the conversation engine, the ticket store and the transports.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Platform user identifier of a person talking to the bot.
    UserId
);
numeric_id!(
    /// Chat the replies for an event are delivered to.
    ChatId
);
numeric_id!(
    /// Ticket primary key.
    TicketId
);
numeric_id!(
    /// Ticket message primary key.
    MessageId
);
numeric_id!(
    /// Ticket photo primary key.
    PhotoId
);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a [`PluginAdapter`](crate::PluginAdapter).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
}

/// Status of a ticket. Stored and logged by its snake_case name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Created,
    Assigned,
    InProgress,
    WaitingUser,
    WaitingSupport,
    Resolved,
    Closed,
    Cancelled,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 8] = [
        TicketStatus::Created,
        TicketStatus::Assigned,
        TicketStatus::InProgress,
        TicketStatus::WaitingUser,
        TicketStatus::WaitingSupport,
        TicketStatus::Resolved,
        TicketStatus::Closed,
        TicketStatus::Cancelled,
    ];

    /// Whether the ticket still accepts messages and photos.
    pub fn is_open(self) -> bool {
        self != TicketStatus::Closed
    }
}

/// Fixed set of ticket categories. The stored value is the lowercase Russian name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum Category {
    #[strum(serialize = "вопрос")]
    #[serde(rename = "вопрос")]
    Question,
    #[strum(serialize = "важно,срочно")]
    #[serde(rename = "важно,срочно")]
    Urgent,
    #[strum(serialize = "финансы")]
    #[serde(rename = "финансы")]
    Finance,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Question, Category::Urgent, Category::Finance];

    /// Human label shown in titles and ticket cards.
    pub fn label(self) -> &'static str {
        match self {
            Category::Question => "Вопрос",
            Category::Urgent => "Важно,Срочно",
            Category::Finance => "Финансы",
        }
    }

    /// Decorated label used on the category keyboard.
    pub fn button(self) -> &'static str {
        match self {
            Category::Question => "💭 Вопрос",
            Category::Urgent => "🚨 Важно,Срочно",
            Category::Finance => "💰 Финансы",
        }
    }
}

/// Who wrote a ticket message or attached a photo.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SenderKind {
    User,
    Support,
}

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// A person known to the store. Created bare on first contact, completed by registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub full_name: String,
    pub phone: Option<String>,
    pub location: Option<GeoPoint>,
    pub birth_date: Option<NaiveDate>,
    pub is_registered: bool,
    pub has_avatar: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields written when a user completes registration.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub user_id: UserId,
    pub full_name: String,
    pub phone: String,
    pub location: Option<GeoPoint>,
    pub birth_date: Option<NaiveDate>,
    pub has_avatar: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub owner: UserId,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTicket {
    pub owner: UserId,
    pub title: String,
    pub description: String,
    pub category: Category,
}

/// One entry of a ticket's append-only conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketMessage {
    pub id: MessageId,
    pub ticket_id: TicketId,
    pub sender_kind: SenderKind,
    pub sender_id: UserId,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub ticket_id: TicketId,
    pub sender_kind: SenderKind,
    pub sender_id: UserId,
    pub body: String,
}

/// A stored image attached to a ticket, always paired with a synthetic message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketPhoto {
    pub id: PhotoId,
    pub ticket_id: TicketId,
    pub sender_kind: SenderKind,
    pub sender_id: UserId,
    pub file_ref: String,
    pub message_id: MessageId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPhoto {
    pub ticket_id: TicketId,
    pub sender_kind: SenderKind,
    pub sender_id: UserId,
    pub file_ref: String,
    pub message_id: MessageId,
}

// --- Transport-facing types ---

/// A message received from a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub user_id: UserId,
    pub chat_id: ChatId,
    pub payload: InboundPayload,
}

/// Content of an inbound event. Exactly one kind per event.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundPayload {
    Text(String),
    Contact(ContactPayload),
    Photo(PhotoPayload),
}

/// A shared phone contact.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactPayload {
    /// Platform user the contact card belongs to, if the platform knows it.
    pub owner_id: Option<UserId>,
    pub phone: String,
    pub first_name: String,
    pub last_name: Option<String>,
}

/// A photo reference as delivered by the transport, before it is saved.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoPayload {
    pub file_id: String,
    pub caption: Option<String>,
}

/// Result of persisting an inbound photo to local media storage.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedFile {
    pub file_name: String,
    pub file_ref: String,
}

/// How outbound text should be interpreted by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextFormat {
    #[default]
    Plain,
    MarkdownV2,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Button {
    Text(String),
    RequestContact(String),
}

/// A reply keyboard, one `Vec` per row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// One text button per row.
    pub fn column<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: labels
                .into_iter()
                .map(|label| vec![Button::Text(label.into())])
                .collect(),
        }
    }
}

/// What happens to the reply keyboard alongside a message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KeyboardAction {
    /// Leave whatever keyboard the client currently shows.
    #[default]
    Keep,
    Remove,
    Show(Keyboard),
}

/// A text message to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub format: TextFormat,
    pub keyboard: KeyboardAction,
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: TextFormat::Plain,
            keyboard: KeyboardAction::Keep,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: TextFormat::MarkdownV2,
            keyboard: KeyboardAction::Keep,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = KeyboardAction::Show(keyboard);
        self
    }

    pub fn remove_keyboard(mut self) -> Self {
        self.keyboard = KeyboardAction::Remove;
        self
    }
}

/// An image to send, with a text line to use if the image cannot be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReply {
    pub file_ref: String,
    pub caption: String,
    pub format: TextFormat,
    pub fallback: Option<Reply>,
}

/// One outbound unit produced for a conversation turn, delivered in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(Reply),
    Image(ImageReply),
}

impl From<Reply> for Outbound {
    fn from(reply: Reply) -> Self {
        Outbound::Text(reply)
    }
}
