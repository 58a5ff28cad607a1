//! Presence tracker.

use crate::models::UserId;
use crate::sync::store::ConversationStore;

/// Flip the online flag on the conversation with the given counterpart.
/// At most one conversation matches; no-op when none does (the user may
/// have no conversation with us yet). Nothing else is touched.
pub fn set_online(store: &mut ConversationStore, user_id: UserId, online: bool) {
    if let Some(conversation) = store.find_by_counterpart_mut(user_id) {
        conversation.other_user.online = online;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Conversation, UserRef};

    fn store() -> ConversationStore {
        ConversationStore::from_conversations(vec![Conversation::placeholder(UserRef::new(
            UserId(2),
            "bob",
        ))])
    }

    #[test]
    fn test_online_and_offline_round_trip() {
        let mut store = store();

        set_online(&mut store, UserId(2), true);
        assert!(store.find_by_username("bob").unwrap().other_user.online);

        set_online(&mut store, UserId(2), false);
        assert!(!store.find_by_username("bob").unwrap().other_user.online);
    }

    #[test]
    fn test_unknown_user_is_a_no_op() {
        let mut store = store();
        let snapshot = store.clone();

        set_online(&mut store, UserId(99), true);
        assert_eq!(store, snapshot);
    }

    #[test]
    fn test_only_the_presence_flag_changes() {
        let mut store = store();
        set_online(&mut store, UserId(2), true);

        let convo = store.find_by_username("bob").unwrap();
        assert!(convo.messages.is_empty());
        assert_eq!(convo.unread_message_count, 0);
        assert_eq!(convo.other_user.username, "bob");
    }
}
