//! Data models for the messenger client.
//! Defines the conversation entities and the REST/push wire DTOs.

pub mod conversation;
pub mod message;
pub mod user;

pub use conversation::Conversation;
pub use message::{ConversationId, Message, MessageId};
pub use user::{UserId, UserRef};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /messages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub recipient_id: UserId,
    /// Absent when sending into a placeholder conversation; the server
    /// creates the conversation and assigns the id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<ConversationId>,
    pub text: String,
}

/// Response to `POST /messages`. `sender` is present only when the server
/// created a brand-new conversation for this message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub message: Message,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<UserRef>,
}

/// Body of `POST /conversations` (the read-mark request).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadMarkRequest {
    pub conversation_id: ConversationId,
    pub read_at: DateTime<Utc>,
    pub read_messages: Vec<MessageId>,
}

/// Response to `POST /conversations`. The server is authoritative: the
/// confirmed set may be a subset or superset of the requested ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadMarkResponse {
    pub read_message_ids: Vec<MessageId>,
}

/// Read receipt exchanged between the two clients over the push channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadReceipt {
    pub conversation_id: ConversationId,
    pub read_at: DateTime<Utc>,
    pub read_message_ids: Vec<MessageId>,
}
