//! Push channel for real-time events.
//!
//! One always-open WebSocket per session, distinct from the REST calls.
//! Events are JSON envelopes discriminated by a `type` tag; inbound frames
//! are pumped into a channel so the client loop can `select!` over them.

use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

use crate::error::{ClientError, Result};
use crate::models::{Message, ReadReceipt, UserId, UserRef};

/// Event arriving from the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "new-message")]
    NewMessage {
        message: Message,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender: Option<UserRef>,
    },
    #[serde(rename = "read-messages")]
    ReadMessages(ReadReceipt),
    #[serde(rename = "add-online-user")]
    AddOnlineUser { id: UserId },
    #[serde(rename = "remove-offline-user")]
    RemoveOfflineUser { id: UserId },
}

/// Event this client emits for the counterpart's client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "new-message", rename_all = "camelCase")]
    NewMessage {
        message: Message,
        recipient_id: UserId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender: Option<UserRef>,
    },
    #[serde(rename = "read-messages")]
    ReadMessages(ReadReceipt),
}

/// Outbound half of the push channel.
pub struct PushChannel {
    sender: futures::channel::mpsc::UnboundedSender<WsMessage>,
}

/// Inbound half of the push channel, consumed by the client loop.
pub struct PushEvents {
    receiver: futures::channel::mpsc::UnboundedReceiver<WsMessage>,
}

impl PushChannel {
    /// Connect to the server push endpoint for the given user.
    pub async fn connect(server_url: &str, username: &str) -> Result<(PushChannel, PushEvents)> {
        let ws_url = format!(
            "{}/ws/{}",
            server_url
                .replace("http://", "ws://")
                .replace("https://", "wss://"),
            username
        );

        let (ws_stream, _) = connect_async(&ws_url).await?;
        let (mut write, mut read) = ws_stream.split();

        let (tx, mut rx) = futures::channel::mpsc::unbounded::<WsMessage>();
        let (tx_in, rx_in) = futures::channel::mpsc::unbounded::<WsMessage>();

        // Pump outgoing frames
        tokio::spawn(async move {
            while let Some(frame) = rx.next().await {
                if let Err(e) = write.send(frame).await {
                    log::error!("Failed to send push frame: {}", e);
                    break;
                }
            }
        });

        // Pump incoming frames
        tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(frame) => {
                        if tx_in.unbounded_send(frame).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        log::error!("Push channel error: {}", e);
                        break;
                    }
                }
            }
            log::info!("Push channel closed");
        });

        log::info!("Push channel connected for user: {}", username);

        Ok((
            PushChannel { sender: tx },
            PushEvents { receiver: rx_in },
        ))
    }

    /// Emit an event to the server for relay to the counterpart's client.
    pub fn send_event(&self, event: &ClientEvent) -> Result<()> {
        let json = serde_json::to_string(event)?;
        self.sender
            .unbounded_send(WsMessage::Text(json.into()))
            .map_err(|_| ClientError::WebSocket("push channel closed".to_string()))
    }
}

impl PushEvents {
    /// Next event from the server. Frames that fail to parse are logged and
    /// skipped; `None` means the channel is gone.
    pub async fn next_event(&mut self) -> Option<ServerEvent> {
        while let Some(frame) = self.receiver.next().await {
            match frame {
                WsMessage::Text(text) => match serde_json::from_str::<ServerEvent>(&text) {
                    Ok(event) => return Some(event),
                    Err(e) => log::warn!("Ignoring malformed push event: {}", e),
                },
                WsMessage::Close(_) => return None,
                _ => {}
            }
        }
        None
    }
}
