//! Conversation model.
//!
//! A conversation pairs the local user with exactly one counterpart. The
//! `id` is absent for a placeholder synthesized from a search result and is
//! adopted from the first persisted message, after which it never changes.

use serde::{Deserialize, Serialize};

use super::{ConversationId, Message, MessageId, UserId, UserRef};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ConversationId>,
    pub other_user: UserRef,
    /// Insertion order is arrival order, not necessarily `created_at` order.
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub unread_message_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_message_text: Option<String>,
}

impl Conversation {
    /// A conversation with no server id and no messages yet.
    pub fn placeholder(other_user: UserRef) -> Self {
        Conversation {
            id: None,
            other_user,
            messages: Vec::new(),
            unread_message_count: 0,
            latest_message_text: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.id.is_none()
    }

    pub fn contains_message(&self, id: MessageId) -> bool {
        self.messages.iter().any(|message| message.id == id)
    }

    /// Append a message, refresh the preview, and adopt the conversation id
    /// if this is the first persisted message.
    pub fn push_message(&mut self, message: Message) {
        if self.id.is_none() {
            self.id = Some(message.conversation_id);
        }
        self.latest_message_text = Some(message.text.clone());
        self.messages.push(message);
    }

    /// Count of messages from the counterpart that carry no read timestamp.
    pub fn unread_from_peer(&self, local_user: UserId) -> usize {
        self.messages
            .iter()
            .filter(|message| message.is_unread_from_peer(local_user))
            .count()
    }
}
