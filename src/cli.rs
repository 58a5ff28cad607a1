//! CLI interface for the messenger client
//!
//! Provides command parsing, display formatting, and async stdin reading
//! for concurrent I/O in the main client loop.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::{ClientError, Result};
use crate::models::{Conversation, Message, MessageId, UserId};

/// Command types for the terminal UI
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Open(String),
    Close,
    List,
    Search(String),
    Message(String),
    Quit,
}

impl Command {
    /// Parse a command string
    pub fn parse(input: &str) -> std::result::Result<Self, String> {
        let input = input.trim();

        if input == "/quit" || input == "/exit" {
            return Ok(Command::Quit);
        }

        if input == "/list" {
            return Ok(Command::List);
        }

        if input == "/close" {
            return Ok(Command::Close);
        }

        if let Some(username) = input.strip_prefix("/open ") {
            if username.is_empty() {
                return Err("Usage: /open <username>".to_string());
            }
            return Ok(Command::Open(username.to_string()));
        }

        if let Some(term) = input.strip_prefix("/search ") {
            if term.is_empty() {
                return Err("Usage: /search <term>".to_string());
            }
            return Ok(Command::Search(term.to_string()));
        }

        if input.starts_with('/') {
            return Err(format!("Unknown command: {}", input));
        }

        Ok(Command::Message(input.to_string()))
    }
}

/// Parse a command from user input
pub fn parse_command(input: &str) -> Result<Command> {
    Command::parse(input).map_err(ClientError::InvalidCommand)
}

/// One sidebar line: presence dot, username, preview, unread badge.
pub fn format_conversation(conversation: &Conversation) -> String {
    let presence = if conversation.other_user.online {
        "*"
    } else {
        " "
    };
    // Placeholders have no persisted messages, so no preview either.
    let preview = conversation
        .latest_message_text
        .as_deref()
        .filter(|_| conversation.id.is_some())
        .unwrap_or("");

    if conversation.unread_message_count > 0 {
        format!(
            "{} {:<16} {} ({})",
            presence,
            conversation.other_user.username,
            preview,
            conversation.unread_message_count
        )
    } else {
        format!(
            "{} {:<16} {}",
            presence, conversation.other_user.username, preview
        )
    }
}

/// One transcript line; the local user's last message seen by the peer is
/// suffixed with a marker.
pub fn format_message(
    message: &Message,
    conversation: &Conversation,
    local_user: UserId,
    local_username: &str,
    last_read: Option<MessageId>,
) -> String {
    let sender = if message.sender_id == local_user {
        local_username
    } else {
        conversation.other_user.username.as_str()
    };
    let seen = if last_read == Some(message.id) {
        "  [seen]"
    } else {
        ""
    };

    format!(
        "[{}] <{}> {}{}",
        message.created_at.format("%H:%M"),
        sender,
        message.text,
        seen
    )
}

/// Async stdin reader that yields one line at a time
///
/// Prints the prompt and flushes stdout before blocking on input.
///
/// # Returns
/// - `Ok(Some(line))` - User entered a line
/// - `Ok(None)` - EOF reached (Ctrl+D)
/// - `Err(e)` - I/O error
pub async fn read_line_async(reader: &mut BufReader<tokio::io::Stdin>) -> Result<Option<String>> {
    print!("> ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    match reader.read_line(&mut line).await {
        Ok(0) => Ok(None), // EOF
        Ok(_) => {
            if line.ends_with('\n') {
                line.pop();
                if line.ends_with('\r') {
                    line.pop();
                }
            }
            Ok(Some(line))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConversationId, UserRef};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_parse_open_command() {
        let result = parse_command("/open bob");
        assert!(matches!(result, Ok(Command::Open(username)) if username == "bob"));
    }

    #[test]
    fn test_parse_list_and_close() {
        assert!(matches!(parse_command("/list"), Ok(Command::List)));
        assert!(matches!(parse_command("/close"), Ok(Command::Close)));
    }

    #[test]
    fn test_parse_search_command() {
        let result = parse_command("/search bo");
        assert!(matches!(result, Ok(Command::Search(term)) if term == "bo"));
    }

    #[test]
    fn test_parse_regular_message() {
        let result = parse_command("Hello world");
        assert!(matches!(result, Ok(Command::Message(msg)) if msg == "Hello world"));
    }

    #[test]
    fn test_parse_quit() {
        assert!(matches!(parse_command("/quit"), Ok(Command::Quit)));
        assert!(matches!(parse_command("/exit"), Ok(Command::Quit)));
    }

    #[test]
    fn test_invalid_command() {
        assert!(parse_command("/unknown").is_err());
        assert!(parse_command("/open ").is_err());
    }

    #[test]
    fn test_format_conversation_with_unread() {
        let mut convo = Conversation::placeholder(UserRef::new(UserId(2), "bob"));
        convo.id = Some(ConversationId(10));
        convo.latest_message_text = Some("hey".to_string());
        convo.unread_message_count = 3;
        convo.other_user.online = true;

        let line = format_conversation(&convo);
        assert!(line.contains("bob"));
        assert!(line.contains("hey"));
        assert!(line.contains("(3)"));
        assert!(line.starts_with('*'));
    }

    #[test]
    fn test_format_conversation_placeholder_has_no_preview() {
        let convo = Conversation::placeholder(UserRef::new(UserId(2), "bob"));
        let line = format_conversation(&convo);
        assert!(line.contains("bob"));
        assert!(!line.contains("("));
    }

    #[test]
    fn test_format_message_marks_last_read() {
        let convo = Conversation::placeholder(UserRef::new(UserId(2), "bob"));
        let message = Message {
            id: MessageId(1),
            conversation_id: ConversationId(10),
            sender_id: UserId(1),
            text: "hello".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            read_at: None,
        };

        let marked = format_message(&message, &convo, UserId(1), "alice", Some(MessageId(1)));
        assert!(marked.contains("<alice> hello"));
        assert!(marked.ends_with("[seen]"));

        let unmarked = format_message(&message, &convo, UserId(1), "alice", None);
        assert!(!unmarked.contains("[seen]"));
    }
}
