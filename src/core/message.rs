//! # Message View-Models
//!
//! The renderable message union produced by the chat selectors and
//! consumed by reconciliation. Plain data: no provider types leak in here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Delivery status of a chat message. `Delivered`, `Seen` and `Failed`
/// are never left once reached (except `Delivered -> Seen`).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum MessageStatus {
    Sending,
    Delivered,
    Seen,
    Failed,
}

impl MessageStatus {
    /// Whether moving from `self` to `next` is a legal lifecycle step.
    pub fn can_become(self, next: MessageStatus) -> bool {
        use MessageStatus::*;
        matches!(
            (self, next),
            (Sending, Sending | Delivered | Seen | Failed)
                | (Delivered, Delivered | Seen)
                | (Seen, Seen)
                | (Failed, Failed)
        )
    }
}

/// Discriminant used for grouping: messages only attach to their own kind.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MessageKind {
    Chat,
    System,
    Custom,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub message_id: Option<String>,
    pub client_message_id: Option<String>,
    pub sender_id: String,
    pub sender_display_name: String,
    pub content: String,
    pub created_on: Option<DateTime<Utc>>,
    pub edited_on: Option<DateTime<Utc>>,
    pub status: MessageStatus,
    pub mine: bool,
    /// Visual grouping only; never affects delivery.
    pub attached: bool,
}

impl ChatMessage {
    /// A locally composed message that the backend has not accepted yet.
    pub fn local(sender_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            message_id: None,
            client_message_id: Some(uuid::Uuid::new_v4().to_string()),
            sender_id: sender_id.into(),
            sender_display_name: String::new(),
            content: content.into(),
            created_on: None,
            edited_on: None,
            status: MessageStatus::Sending,
            mine: true,
            attached: false,
        }
    }

    /// "Is this the same message?" Ignores identity, grouping and
    /// client-side ids: a reconciled copy of a delivered message compares
    /// equal, a genuinely new message does not.
    pub fn is_same_message(&self, other: &ChatMessage) -> bool {
        self.message_id == other.message_id
            && self.content == other.content
            && self.created_on == other.created_on
            && self.sender_id == other.sender_id
            && self.sender_display_name == other.sender_display_name
            && self.status == other.status
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SystemEvent {
    ParticipantAdded { participants: Vec<String> },
    ParticipantRemoved { participants: Vec<String> },
    TopicUpdated { topic: String },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SystemMessage {
    pub message_id: String,
    pub created_on: Option<DateTime<Utc>>,
    pub event: SystemEvent,
    pub attached: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CustomMessage {
    pub message_id: String,
    pub created_on: Option<DateTime<Utc>>,
    pub content: String,
    pub attached: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "messageType", rename_all = "camelCase")]
pub enum Message {
    Chat(ChatMessage),
    System(SystemMessage),
    Custom(CustomMessage),
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Chat(_) => MessageKind::Chat,
            Message::System(_) => MessageKind::System,
            Message::Custom(_) => MessageKind::Custom,
        }
    }

    pub fn created_on(&self) -> Option<DateTime<Utc>> {
        match self {
            Message::Chat(m) => m.created_on,
            Message::System(m) => m.created_on,
            Message::Custom(m) => m.created_on,
        }
    }

    /// Sender of a chat message. System and custom messages have none.
    pub fn sender_id(&self) -> Option<&str> {
        match self {
            Message::Chat(m) => Some(&m.sender_id),
            _ => None,
        }
    }

    pub fn attached(&self) -> bool {
        match self {
            Message::Chat(m) => m.attached,
            Message::System(m) => m.attached,
            Message::Custom(m) => m.attached,
        }
    }

    pub fn set_attached(&mut self, attached: bool) {
        match self {
            Message::Chat(m) => m.attached = attached,
            Message::System(m) => m.attached = attached,
            Message::Custom(m) => m.attached = attached,
        }
    }

    /// Stable render key: the server id once assigned, the client id until then.
    pub fn key(&self) -> &str {
        match self {
            Message::Chat(m) => m
                .message_id
                .as_deref()
                .filter(|id| !id.is_empty())
                .or(m.client_message_id.as_deref())
                .unwrap_or_default(),
            Message::System(m) => &m.message_id,
            Message::Custom(m) => &m.message_id,
        }
    }

    pub fn as_chat(&self) -> Option<&ChatMessage> {
        match self {
            Message::Chat(m) => Some(m),
            _ => None,
        }
    }
}
