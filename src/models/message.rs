//! Message model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::UserId;

/// Server-assigned message identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Server-assigned conversation identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub i64);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    /// Never changes after creation.
    pub sender_id: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
    /// Once set, never cleared and never moved backwards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
}

impl Message {
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }

    /// True for a message the local user received and has not yet read.
    pub fn is_unread_from_peer(&self, local_user: UserId) -> bool {
        self.sender_id != local_user && self.read_at.is_none()
    }

    /// Record a read timestamp. Keeps `read_at` monotonically non-decreasing,
    /// which makes repeated and out-of-order receipt application converge.
    pub fn mark_read(&mut self, read_at: DateTime<Utc>) {
        match self.read_at {
            Some(existing) if existing >= read_at => {}
            _ => self.read_at = Some(read_at),
        }
    }
}
