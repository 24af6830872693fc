//! Inbound message decoding and dispatch

use crate::channel::ChannelEvent;
use crate::session::Event;
use crate::types::{ClientMessage, ServerMessage};
use tokio::sync::mpsc;
use tracing::{debug, warn};

const KNOWN_KINDS: &[&str] = &["game_start", "game_setup", "game_result", "error", "ping"];

/// Decodes inbound frames and dispatches them by message kind.
///
/// Heartbeat pings are answered here and never reach the controller. Unknown
/// kinds are logged and dropped; malformed payloads are dropped without fuss.
pub struct MessageRouter {
    outbound: mpsc::Sender<ClientMessage>,
    events: mpsc::Sender<Event>,
}

impl MessageRouter {
    pub fn new(outbound: mpsc::Sender<ClientMessage>, events: mpsc::Sender<Event>) -> Self {
        Self { outbound, events }
    }

    /// Consume channel events until the channel task ends.
    pub async fn run(self, mut channel_rx: mpsc::Receiver<ChannelEvent>) {
        while let Some(ev) = channel_rx.recv().await {
            match ev {
                ChannelEvent::Opened => {
                    let _ = self.events.send(Event::ChannelOpened).await;
                }
                ChannelEvent::Closed => {
                    let _ = self.events.send(Event::ChannelClosed).await;
                }
                ChannelEvent::Frame(raw) => self.route(&raw).await,
            }
        }
    }

    /// Decode one frame and forward it, answering pings in place.
    pub async fn route(&self, raw: &str) {
        match serde_json::from_str::<ServerMessage>(raw) {
            Ok(ServerMessage::Ping) => {
                if self.outbound.send(ClientMessage::Pong).await.is_err() {
                    warn!("failed to queue pong reply");
                }
            }
            Ok(msg) => {
                let _ = self.events.send(Event::Server(msg)).await;
            }
            Err(e) => self.drop_frame(raw, e),
        }
    }

    fn drop_frame(&self, raw: &str, err: serde_json::Error) {
        let kind = serde_json::from_str::<serde_json::Value>(raw)
            .ok()
            .and_then(|v| v.get("type").and_then(|t| t.as_str()).map(String::from));

        match kind {
            Some(kind) if !KNOWN_KINDS.contains(&kind.as_str()) => {
                warn!("dropping message with unknown type {:?}", kind);
            }
            _ => {
                debug!("dropping malformed frame: {}", err);
            }
        }
    }
}
