//! Last-read resolver.
//!
//! Decides which single message, among those the local user sent, carries
//! the "seen by the other party" indicator: the sent-and-read message with
//! the latest `created_at`. Ties fall to the latest insertion. `None` means
//! no indicator, never an error.

use crate::models::{Message, MessageId, UserId};

pub fn resolve(messages: &[Message], current_user: UserId) -> Option<MessageId> {
    let mut last_read: Option<&Message> = None;

    for message in messages {
        if message.sender_id != current_user || message.read_at.is_none() {
            continue;
        }
        match last_read {
            Some(best) if message.created_at < best.created_at => {}
            _ => last_read = Some(message),
        }
    }

    last_read.map(|message| message.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConversationId;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, second).unwrap()
    }

    fn message(id: i64, sender: i64, created_second: u32, read: bool) -> Message {
        Message {
            id: MessageId(id),
            conversation_id: ConversationId(10),
            sender_id: UserId(sender),
            text: String::new(),
            created_at: at(created_second),
            read_at: read.then(|| at(created_second + 30)),
        }
    }

    #[test]
    fn test_empty_list_resolves_to_none() {
        assert_eq!(resolve(&[], UserId(1)), None);
    }

    #[test]
    fn test_no_sent_and_read_messages_resolves_to_none() {
        let messages = vec![
            message(1, 1, 0, false), // sent, unread
            message(2, 2, 1, true),  // received
        ];
        assert_eq!(resolve(&messages, UserId(1)), None);
    }

    #[test]
    fn test_latest_sent_and_read_wins() {
        let messages = vec![
            message(1, 1, 0, true),
            message(2, 1, 5, true),
            message(3, 1, 9, false),
            message(4, 2, 12, true),
        ];
        assert_eq!(resolve(&messages, UserId(1)), Some(MessageId(2)));
    }

    #[test]
    fn test_created_at_tie_breaks_by_insertion_order() {
        let messages = vec![message(1, 1, 3, true), message(2, 1, 3, true)];
        assert_eq!(resolve(&messages, UserId(1)), Some(MessageId(2)));
    }

    #[test]
    fn test_arrival_order_does_not_matter() {
        // Later-created message appears earlier in the list.
        let messages = vec![message(2, 1, 8, true), message(1, 1, 2, true)];
        assert_eq!(resolve(&messages, UserId(1)), Some(MessageId(2)));
    }
}
