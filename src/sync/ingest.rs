//! Message ingest pipeline.
//!
//! Merges a newly-created or newly-received message into the conversation
//! set: locating (or synthesizing) the target conversation, refreshing the
//! preview, and keeping the unread counter consistent with the active
//! conversation marker. Ingest is idempotent per message id, so replayed
//! push events and the echo of a local broadcast are harmless.

use crate::models::{Conversation, Message, UserId, UserRef};
use crate::sync::store::ConversationStore;

/// A message entering the store.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestEvent {
    /// Echo of a locally-sent message, after the server persisted it.
    LocalSend {
        message: Message,
        recipient_id: UserId,
    },
    /// Message delivered over the push channel. `sender` is present only
    /// when the server deemed this the first message of a brand-new
    /// conversation for the receiving client.
    RemotePush {
        message: Message,
        sender: Option<UserRef>,
    },
}

/// What the facade must do after a merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestOutcome {
    /// False when the event was a duplicate or targeted a conversation this
    /// store does not know (both are defensive no-ops).
    pub merged: bool,
    /// Set when the message landed in the active conversation: instead of
    /// incrementing the unread counter, it must be acknowledged immediately.
    pub read_immediately: Option<Message>,
}

pub fn ingest(
    store: &mut ConversationStore,
    event: IngestEvent,
    local_user: UserId,
    active: Option<&str>,
) -> IngestOutcome {
    let (message, counterpart, sender) = match event {
        IngestEvent::LocalSend {
            message,
            recipient_id,
        } => (message, Some(recipient_id), None),
        IngestEvent::RemotePush { message, sender } => {
            let counterpart = sender.as_ref().map(|user| user.id);
            (message, counterpart, sender)
        }
    };

    match store.locate(message.conversation_id, counterpart) {
        Some(index) => {
            let conversation = store.conversation_mut(index);
            if conversation.contains_message(message.id) {
                log::debug!(
                    "ignoring duplicate message {} in conversation {}",
                    message.id,
                    message.conversation_id
                );
                return IngestOutcome::default();
            }

            conversation.push_message(message.clone());

            let mut outcome = IngestOutcome {
                merged: true,
                read_immediately: None,
            };
            if message.sender_id != local_user {
                if active == Some(conversation.other_user.username.as_str()) {
                    outcome.read_immediately = Some(message);
                } else {
                    conversation.unread_message_count += 1;
                }
            }
            outcome
        }
        None => match sender {
            // First contact from a previously-unknown counterpart.
            Some(sender) => {
                let mut conversation = Conversation::placeholder(sender);
                conversation.push_message(message);
                conversation.unread_message_count = 1;
                store.insert_front(conversation);
                IngestOutcome {
                    merged: true,
                    read_immediately: None,
                }
            }
            None => {
                log::debug!(
                    "dropping message {} for unknown conversation {}",
                    message.id,
                    message.conversation_id
                );
                IngestOutcome::default()
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConversationId, MessageId};
    use chrono::{TimeZone, Utc};

    const ALICE: UserId = UserId(1);
    const BOB: UserId = UserId(2);

    fn message(id: i64, conversation: i64, sender: UserId) -> Message {
        Message {
            id: MessageId(id),
            conversation_id: ConversationId(conversation),
            sender_id: sender,
            text: format!("message {}", id),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, id as u32).unwrap(),
            read_at: None,
        }
    }

    fn store_with_bob_conversation() -> ConversationStore {
        let mut convo = Conversation::placeholder(UserRef::new(BOB, "bob"));
        convo.push_message(message(1, 10, ALICE));
        ConversationStore::from_conversations(vec![convo])
    }

    #[test]
    fn test_inbound_message_increments_unread() {
        let mut store = store_with_bob_conversation();

        let outcome = ingest(
            &mut store,
            IngestEvent::RemotePush {
                message: message(2, 10, BOB),
                sender: None,
            },
            ALICE,
            None,
        );

        assert!(outcome.merged);
        assert!(outcome.read_immediately.is_none());
        let convo = store.find(ConversationId(10)).unwrap();
        assert_eq!(convo.unread_message_count, 1);
        assert_eq!(convo.latest_message_text.as_deref(), Some("message 2"));
    }

    #[test]
    fn test_inbound_message_on_active_conversation_queues_read() {
        let mut store = store_with_bob_conversation();

        let outcome = ingest(
            &mut store,
            IngestEvent::RemotePush {
                message: message(2, 10, BOB),
                sender: None,
            },
            ALICE,
            Some("bob"),
        );

        assert_eq!(outcome.read_immediately, Some(message(2, 10, BOB)));
        let convo = store.find(ConversationId(10)).unwrap();
        assert_eq!(convo.unread_message_count, 0);
        assert_eq!(convo.messages.len(), 2);
    }

    #[test]
    fn test_local_send_never_counts_as_unread() {
        let mut store = store_with_bob_conversation();

        let outcome = ingest(
            &mut store,
            IngestEvent::LocalSend {
                message: message(2, 10, ALICE),
                recipient_id: BOB,
            },
            ALICE,
            None,
        );

        assert!(outcome.merged);
        let convo = store.find(ConversationId(10)).unwrap();
        assert_eq!(convo.unread_message_count, 0);
        assert_eq!(convo.messages.len(), 2);
    }

    #[test]
    fn test_local_send_into_placeholder_adopts_id() {
        let mut store = ConversationStore::from_conversations(vec![Conversation::placeholder(
            UserRef::new(BOB, "bob"),
        )]);

        let outcome = ingest(
            &mut store,
            IngestEvent::LocalSend {
                message: message(1, 10, ALICE),
                recipient_id: BOB,
            },
            ALICE,
            None,
        );

        assert!(outcome.merged);
        let convo = store.find(ConversationId(10)).unwrap();
        assert_eq!(convo.id, Some(ConversationId(10)));
        assert_eq!(convo.messages.len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_sender_present_synthesizes_conversation() {
        let mut store = ConversationStore::new();

        let outcome = ingest(
            &mut store,
            IngestEvent::RemotePush {
                message: message(1, 10, BOB),
                sender: Some(UserRef::new(BOB, "bob")),
            },
            ALICE,
            None,
        );

        assert!(outcome.merged);
        assert_eq!(store.len(), 1);
        let convo = store.find(ConversationId(10)).unwrap();
        assert_eq!(convo.unread_message_count, 1);
        assert_eq!(convo.other_user.username, "bob");
        assert_eq!(convo.latest_message_text.as_deref(), Some("message 1"));
    }

    #[test]
    fn test_sender_present_collapses_into_existing_placeholder() {
        let mut store = ConversationStore::from_conversations(vec![Conversation::placeholder(
            UserRef::new(BOB, "bob"),
        )]);

        ingest(
            &mut store,
            IngestEvent::RemotePush {
                message: message(1, 10, BOB),
                sender: Some(UserRef::new(BOB, "bob")),
            },
            ALICE,
            None,
        );

        // One conversation per counterpart, placeholder collapsed.
        assert_eq!(store.len(), 1);
        let convo = store.find(ConversationId(10)).unwrap();
        assert_eq!(convo.unread_message_count, 1);
    }

    #[test]
    fn test_ingest_is_idempotent_per_message_id() {
        let mut store = store_with_bob_conversation();
        let event = IngestEvent::RemotePush {
            message: message(2, 10, BOB),
            sender: None,
        };

        ingest(&mut store, event.clone(), ALICE, None);
        let snapshot = store.clone();

        let outcome = ingest(&mut store, event, ALICE, None);
        assert!(!outcome.merged);
        assert_eq!(store, snapshot);
    }

    #[test]
    fn test_unknown_conversation_is_a_silent_no_op() {
        let mut store = store_with_bob_conversation();
        let snapshot = store.clone();

        let outcome = ingest(
            &mut store,
            IngestEvent::RemotePush {
                message: message(5, 99, UserId(9)),
                sender: None,
            },
            ALICE,
            None,
        );

        assert!(!outcome.merged);
        assert_eq!(store, snapshot);
    }
}
