//! The authoritative conversation set for the logged-in session.
//!
//! The store is an in-memory value, replaced or mutated only through the
//! synchronization facade. It is discarded wholesale at session teardown;
//! conversations are never individually deleted. At most one conversation
//! exists per counterpart, placeholder or persisted.

use crate::models::{Conversation, ConversationId, UserId, UserRef};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationStore {
    conversations: Vec<Conversation>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store from the REST bulk fetch, replacing any prior content.
    pub fn from_conversations(conversations: Vec<Conversation>) -> Self {
        ConversationStore { conversations }
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    pub fn find(&self, id: ConversationId) -> Option<&Conversation> {
        self.conversations
            .iter()
            .find(|convo| convo.id == Some(id))
    }

    pub fn find_mut(&mut self, id: ConversationId) -> Option<&mut Conversation> {
        self.conversations
            .iter_mut()
            .find(|convo| convo.id == Some(id))
    }

    pub fn find_by_counterpart(&self, user_id: UserId) -> Option<&Conversation> {
        self.conversations
            .iter()
            .find(|convo| convo.other_user.id == user_id)
    }

    pub fn find_by_counterpart_mut(&mut self, user_id: UserId) -> Option<&mut Conversation> {
        self.conversations
            .iter_mut()
            .find(|convo| convo.other_user.id == user_id)
    }

    pub fn find_by_username(&self, username: &str) -> Option<&Conversation> {
        self.conversations
            .iter()
            .find(|convo| convo.other_user.username == username)
    }

    /// Locate the ingest target: by conversation id first, then by
    /// counterpart for messages bound for a conversation with no id yet.
    pub(crate) fn locate(
        &self,
        id: ConversationId,
        counterpart: Option<UserId>,
    ) -> Option<usize> {
        self.conversations
            .iter()
            .position(|convo| convo.id == Some(id))
            .or_else(|| {
                let counterpart = counterpart?;
                self.conversations
                    .iter()
                    .position(|convo| convo.other_user.id == counterpart)
            })
    }

    pub(crate) fn conversation_mut(&mut self, index: usize) -> &mut Conversation {
        &mut self.conversations[index]
    }

    /// Newest conversations go to the front, matching the ordering of the
    /// bulk fetch.
    pub fn insert_front(&mut self, conversation: Conversation) {
        self.conversations.insert(0, conversation);
    }

    /// Add placeholder conversations for searched users that have no
    /// conversation with the local user yet.
    pub fn add_search_results(&mut self, users: Vec<UserRef>) {
        for user in users {
            if self.find_by_counterpart(user.id).is_none() {
                self.conversations.push(Conversation::placeholder(user));
            }
        }
    }

    /// Drop placeholders once the search is dismissed. Conversations that
    /// gained an id in the meantime survive.
    pub fn clear_search_results(&mut self) {
        self.conversations.retain(|convo| convo.id.is_some());
    }
}
