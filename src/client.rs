//! Synchronization facade
//!
//! `ChatClient` owns the authoritative conversation store for the session
//! and is the single entry point the terminal UI and the push channel call
//! into. Every mutation goes through the sync engine under one lock; network
//! round trips happen outside the lock, so a push event arriving mid-send is
//! merged into the current store value, never a stale snapshot.

use chrono::Utc;
use tokio::io::BufReader;
use tokio::sync::Mutex;

use crate::api::ServerApi;
use crate::cli::{self, Command};
use crate::error::{ClientError, Result};
use crate::models::{Message, ReadReceipt, SendMessageRequest, UserRef};
use crate::sync::{self, ConversationStore, IngestEvent, ReadMarkPlan};
use crate::websocket::{ClientEvent, PushChannel, PushEvents, ServerEvent};

#[derive(Debug, Default)]
struct SessionState {
    store: ConversationStore,
    /// Username of the conversation currently on screen. While set, unread
    /// accounting for that conversation is suppressed.
    active: Option<String>,
}

pub struct ChatClient {
    user: UserRef,
    api: ServerApi,
    push: PushChannel,
    state: Mutex<SessionState>,
}

impl ChatClient {
    /// Connect to the server: fetch the local user's ref and open the push
    /// channel. The returned event stream feeds [`ChatClient::run`].
    pub async fn connect(server_url: &str, username: &str) -> Result<(Self, PushEvents)> {
        let api = ServerApi::new(server_url, username)?;
        let user = api.fetch_profile().await?;
        let (push, events) = PushChannel::connect(server_url, username).await?;

        log::info!("Connected as {} (id {})", user.username, user.id);

        let client = ChatClient {
            user,
            api,
            push,
            state: Mutex::new(SessionState::default()),
        };
        Ok((client, events))
    }

    pub fn user(&self) -> &UserRef {
        &self.user
    }

    /// Seed the store from the REST bulk fetch, replacing any prior content.
    /// Called once per session start.
    pub async fn initialize(&self) -> Result<()> {
        let conversations = self.api.fetch_conversations().await?;

        let mut state = self.state.lock().await;
        state.store = ConversationStore::from_conversations(conversations);
        state.active = None;
        log::info!("Loaded {} conversations", state.store.len());
        Ok(())
    }

    /// Stable, immutable view of the store for rendering.
    pub async fn snapshot(&self) -> ConversationStore {
        self.state.lock().await.store.clone()
    }

    pub async fn active_conversation(&self) -> Option<String> {
        self.state.lock().await.active.clone()
    }

    /// Mark a conversation active. Its unread badge clears synchronously,
    /// before any network response; unread messages from the counterpart are
    /// then acknowledged with the server and the confirmed receipt is
    /// broadcast to the other party.
    pub async fn open_conversation(&self, username: &str) -> Result<()> {
        let plan = {
            let mut state = self.state.lock().await;
            let conversation_id = match state.store.find_by_username(username) {
                Some(conversation) => conversation.id,
                None => {
                    return Err(ClientError::NotFound(format!(
                        "no conversation with {}",
                        username
                    )))
                }
            };
            state.active = Some(username.to_string());

            match conversation_id {
                Some(id) => {
                    sync::clear_unread(&mut state.store, id);
                    sync::plan_read_marks(&state.store, id, self.user.id, Utc::now())
                }
                // Placeholder: nothing persisted yet, nothing to acknowledge.
                None => None,
            }
        };

        if let Some(plan) = plan {
            self.acknowledge(plan).await;
        }
        Ok(())
    }

    pub async fn close_conversation(&self) {
        self.state.lock().await.active = None;
    }

    /// Persist a message, merge the echo, and broadcast it to the
    /// counterpart. Nothing is appended until the server has persisted the
    /// message; a network failure surfaces to the caller with the text
    /// intact.
    pub async fn send(&self, text: &str) -> Result<Message> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::InvalidCommand(
                "Cannot send an empty message".to_string(),
            ));
        }

        let (recipient_id, conversation_id) = {
            let state = self.state.lock().await;
            let username = state.active.clone().ok_or_else(|| {
                ClientError::State("no active conversation; /open one first".to_string())
            })?;
            let conversation = state.store.find_by_username(&username).ok_or_else(|| {
                ClientError::NotFound(format!("no conversation with {}", username))
            })?;
            (conversation.other_user.id, conversation.id)
        };

        let request = SendMessageRequest {
            recipient_id,
            conversation_id,
            text: text.to_string(),
        };
        let response = self.api.post_message(&request).await?;
        let message = response.message.clone();

        {
            let mut state = self.state.lock().await;
            let active = state.active.clone();
            sync::ingest(
                &mut state.store,
                IngestEvent::LocalSend {
                    message: response.message,
                    recipient_id,
                },
                self.user.id,
                active.as_deref(),
            );
        }

        // `sender` comes back from the server only for a conversation's
        // first message; the counterpart's client uses it to synthesize the
        // new conversation.
        let broadcast = ClientEvent::NewMessage {
            message: message.clone(),
            recipient_id,
            sender: response.sender,
        };
        if let Err(e) = self.push.send_event(&broadcast) {
            log::warn!("Failed to broadcast message {}: {}", message.id, e);
        }

        Ok(message)
    }

    /// Route a push event to the engine. Returns the merged message when the
    /// event carried one worth displaying.
    pub async fn on_push_event(&self, event: ServerEvent) -> Option<Message> {
        match event {
            ServerEvent::NewMessage { message, sender } => {
                let outcome = {
                    let mut state = self.state.lock().await;
                    let active = state.active.clone();
                    sync::ingest(
                        &mut state.store,
                        IngestEvent::RemotePush {
                            message: message.clone(),
                            sender,
                        },
                        self.user.id,
                        active.as_deref(),
                    )
                };

                if let Some(unread) = outcome.read_immediately {
                    self.acknowledge(sync::plan_single(&unread, Utc::now())).await;
                }
                outcome.merged.then_some(message)
            }
            ServerEvent::ReadMessages(receipt) => {
                let mut state = self.state.lock().await;
                sync::apply_read_receipt(&mut state.store, &receipt);
                None
            }
            ServerEvent::AddOnlineUser { id } => {
                let mut state = self.state.lock().await;
                sync::presence::set_online(&mut state.store, id, true);
                None
            }
            ServerEvent::RemoveOfflineUser { id } => {
                let mut state = self.state.lock().await;
                sync::presence::set_online(&mut state.store, id, false);
                None
            }
        }
    }

    /// Search users on the server and add placeholders for counterparts the
    /// local user has no conversation with yet.
    pub async fn search_users(&self, term: &str) -> Result<Vec<UserRef>> {
        let users = self.api.search_users(term).await?;

        let mut state = self.state.lock().await;
        state.store.add_search_results(users.clone());
        Ok(users)
    }

    pub async fn clear_search_results(&self) {
        self.state.lock().await.store.clear_search_results();
    }

    /// Read-mark round trip: ask the server, merge the confirmed set, tell
    /// the other party. The unread badge was already cleared optimistically
    /// and is not rolled back on failure.
    async fn acknowledge(&self, plan: ReadMarkPlan) {
        let conversation_id = plan.conversation_id;
        let read_at = plan.read_at;

        match self.api.mark_read(&plan.into_request()).await {
            Ok(confirmation) => {
                let receipt = ReadReceipt {
                    conversation_id,
                    read_at,
                    read_message_ids: confirmation.read_message_ids,
                };
                {
                    let mut state = self.state.lock().await;
                    sync::apply_read_receipt(&mut state.store, &receipt);
                }
                if let Err(e) = self.push.send_event(&ClientEvent::ReadMessages(receipt)) {
                    log::warn!(
                        "Failed to broadcast read receipt for conversation {}: {}",
                        conversation_id,
                        e
                    );
                }
            }
            Err(e) => {
                log::warn!(
                    "Read-mark request failed for conversation {}: {}",
                    conversation_id,
                    e
                );
            }
        }
    }

    /// Run the terminal loop: multiplex stdin commands and push events.
    pub async fn run(&self, mut events: PushEvents) -> Result<()> {
        println!("Logged in as {}", self.user.username);
        println!("Commands: /list, /open <username>, /search <term>, /close, /quit");

        let mut reader = BufReader::new(tokio::io::stdin());
        loop {
            tokio::select! {
                line = cli::read_line_async(&mut reader) => {
                    match line? {
                        None => break,
                        Some(line) => {
                            if line.trim().is_empty() {
                                continue;
                            }
                            match self.handle_line(&line).await {
                                Ok(true) => break,
                                Ok(false) => {}
                                Err(e) => println!("error: {}", e),
                            }
                        }
                    }
                }
                event = events.next_event() => {
                    match event {
                        Some(event) => {
                            if let Some(message) = self.on_push_event(event).await {
                                self.print_inbound(&message).await;
                            }
                        }
                        None => {
                            log::warn!("Push channel disconnected");
                            break;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn handle_line(&self, line: &str) -> Result<bool> {
        match cli::parse_command(line)? {
            Command::Quit => Ok(true),
            Command::List => {
                self.print_conversations().await;
                Ok(false)
            }
            Command::Open(username) => {
                self.open_conversation(&username).await?;
                self.print_transcript(&username).await;
                Ok(false)
            }
            Command::Close => {
                self.close_conversation().await;
                Ok(false)
            }
            Command::Search(term) => {
                let users = self.search_users(&term).await?;
                if users.is_empty() {
                    println!("no users match '{}'", term);
                }
                for user in &users {
                    println!("  {}", user.username);
                }
                Ok(false)
            }
            Command::Message(text) => {
                let message = self.send(&text).await?;
                self.print_own(&message).await;
                Ok(false)
            }
        }
    }

    async fn print_conversations(&self) {
        let state = self.state.lock().await;
        if state.store.is_empty() {
            println!("no conversations; /search <term> to find someone");
            return;
        }
        for conversation in state.store.conversations() {
            println!("{}", cli::format_conversation(conversation));
        }
    }

    async fn print_transcript(&self, username: &str) {
        let state = self.state.lock().await;
        let Some(conversation) = state.store.find_by_username(username) else {
            return;
        };
        let last_read = sync::last_read::resolve(&conversation.messages, self.user.id);
        for message in &conversation.messages {
            println!(
                "{}",
                cli::format_message(
                    message,
                    conversation,
                    self.user.id,
                    &self.user.username,
                    last_read
                )
            );
        }
    }

    async fn print_inbound(&self, message: &Message) {
        let state = self.state.lock().await;
        let Some(conversation) = state.store.find(message.conversation_id) else {
            return;
        };
        if state.active.as_deref() == Some(conversation.other_user.username.as_str()) {
            let last_read = sync::last_read::resolve(&conversation.messages, self.user.id);
            println!(
                "{}",
                cli::format_message(
                    message,
                    conversation,
                    self.user.id,
                    &self.user.username,
                    last_read
                )
            );
        } else {
            println!(
                "({} unread from {})",
                conversation.unread_message_count, conversation.other_user.username
            );
        }
    }

    async fn print_own(&self, message: &Message) {
        let state = self.state.lock().await;
        if let Some(conversation) = state.store.find(message.conversation_id) {
            println!(
                "{}",
                cli::format_message(
                    message,
                    conversation,
                    self.user.id,
                    &self.user.username,
                    None
                )
            );
        }
    }
}

// Note: ChatClient requires a live server and push channel to construct, so
// its flows are exercised in tests/sync_scenarios.rs at the engine level and
// by integration runs against a real server.
