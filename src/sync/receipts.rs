//! Read-receipt reconciler.
//!
//! Splits read-marking into a pure planning half (which messages need a
//! server acknowledgement) and an apply half (merge the server-confirmed
//! result). The server is authoritative: the confirmed id set may diverge
//! from the request, and the apply step takes it as-is. Applying a receipt
//! is idempotent and commutative, so receipts may arrive in any order and
//! any number of times.

use chrono::{DateTime, Utc};

use crate::models::{ConversationId, Message, MessageId, ReadMarkRequest, ReadReceipt, UserId};
use crate::sync::store::ConversationStore;

/// A read-mark request the facade still has to send.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadMarkPlan {
    pub conversation_id: ConversationId,
    pub read_at: DateTime<Utc>,
    pub message_ids: Vec<MessageId>,
}

impl ReadMarkPlan {
    pub fn into_request(self) -> ReadMarkRequest {
        ReadMarkRequest {
            conversation_id: self.conversation_id,
            read_at: self.read_at,
            read_messages: self.message_ids,
        }
    }
}

/// Plan acknowledgement for every unread message from the counterpart in
/// the given conversation. `None` when there is nothing to acknowledge —
/// no request is issued then.
pub fn plan_read_marks(
    store: &ConversationStore,
    conversation_id: ConversationId,
    local_user: UserId,
    read_at: DateTime<Utc>,
) -> Option<ReadMarkPlan> {
    let conversation = store.find(conversation_id)?;

    let message_ids: Vec<_> = conversation
        .messages
        .iter()
        .filter(|message| message.is_unread_from_peer(local_user))
        .map(|message| message.id)
        .collect();

    if message_ids.is_empty() {
        return None;
    }

    Some(ReadMarkPlan {
        conversation_id,
        read_at,
        message_ids,
    })
}

/// Plan acknowledgement for exactly one just-ingested message (an inbound
/// message that landed in the active conversation).
pub fn plan_single(message: &Message, read_at: DateTime<Utc>) -> ReadMarkPlan {
    ReadMarkPlan {
        conversation_id: message.conversation_id,
        read_at,
        message_ids: vec![message.id],
    }
}

/// Merge a confirmed receipt into the store: every listed message gains the
/// confirmed timestamp. Messages or conversations this store does not know
/// are skipped; stale and replayed receipts are no-ops.
pub fn apply_read_receipt(store: &mut ConversationStore, receipt: &ReadReceipt) {
    let Some(conversation) = store.find_mut(receipt.conversation_id) else {
        log::debug!(
            "read receipt for unknown conversation {}",
            receipt.conversation_id
        );
        return;
    };

    for message in &mut conversation.messages {
        if receipt.read_message_ids.contains(&message.id) {
            message.mark_read(receipt.read_at);
        }
    }
}

/// The optimistic unread reset: the user has looked at the conversation, so
/// the badge clears now, regardless of how the server round trip ends.
pub fn clear_unread(store: &mut ConversationStore, conversation_id: ConversationId) {
    if let Some(conversation) = store.find_mut(conversation_id) {
        conversation.unread_message_count = 0;
    }
}
