//! WebSocket channel management with automatic reconnection

use crate::error::GameError;
use crate::types::ClientMessage;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{debug, info, warn};

/// Raw channel transitions and frames, forwarded to the router
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    Opened,
    Frame(String),
    Closed,
}

/// Owns the persistent WebSocket connection.
///
/// Runs until shutdown, reconnecting indefinitely at a fixed cadence after
/// every drop. A reconnect opens a brand-new connection; it does not replay
/// anything from the previous one.
pub struct ChannelManager {
    url: String,
    reconnect_delay: Duration,
    outbound: mpsc::Receiver<ClientMessage>,
    events: mpsc::Sender<ChannelEvent>,
    shutdown: broadcast::Receiver<()>,
}

impl ChannelManager {
    pub fn new(
        url: String,
        reconnect_delay: Duration,
        outbound: mpsc::Receiver<ClientMessage>,
        events: mpsc::Sender<ChannelEvent>,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            url,
            reconnect_delay,
            outbound,
            events,
            shutdown,
        }
    }

    /// Drive the channel until shutdown, reconnecting after each drop.
    pub async fn run(mut self) {
        loop {
            if self.shutdown.try_recv().is_ok() {
                info!("channel: shutdown signal received");
                return;
            }

            match self.run_session().await {
                Ok(()) => {
                    info!("channel: clean shutdown");
                    return;
                }
                Err(e) => {
                    warn!(
                        "channel error: {}, reconnecting in {:?}",
                        e, self.reconnect_delay
                    );
                }
            }

            // Fixed delay, no backoff, no attempt cap. Outbound messages that
            // arrive while closed fail with ChannelClosed and are only logged.
            let wait = tokio::time::sleep(self.reconnect_delay);
            tokio::pin!(wait);
            loop {
                tokio::select! {
                    _ = &mut wait => break,
                    msg = self.outbound.recv() => {
                        match msg {
                            Some(m) => warn!("channel closed, dropping outbound {:?}", m),
                            None => return,
                        }
                    }
                    _ = self.shutdown.recv() => {
                        info!("channel: shutdown during reconnect wait");
                        return;
                    }
                }
            }
        }
    }

    /// Run a single connection. `Ok` means shutdown; `Err` means the
    /// connection dropped and a reconnect is due.
    async fn run_session(&mut self) -> Result<(), GameError> {
        info!("connecting to {}", self.url);

        let (ws_stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| GameError::WebSocket(e.to_string()))?;

        info!("connected");
        let _ = self.events.send(ChannelEvent::Opened).await;

        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            let _ = self
                                .events
                                .send(ChannelEvent::Frame(text.as_str().to_string()))
                                .await;
                        }
                        Some(Ok(Message::Ping(data))) => {
                            if let Err(e) = write.send(Message::Pong(data)).await {
                                let _ = self.events.send(ChannelEvent::Closed).await;
                                return Err(GameError::WebSocket(e.to_string()));
                            }
                        }
                        Some(Ok(Message::Close(frame))) => {
                            debug!("close frame: {:?}", frame);
                            let _ = self.events.send(ChannelEvent::Closed).await;
                            return Err(GameError::ChannelClosed);
                        }
                        Some(Err(e)) => {
                            let _ = self.events.send(ChannelEvent::Closed).await;
                            return Err(GameError::WebSocket(e.to_string()));
                        }
                        None => {
                            let _ = self.events.send(ChannelEvent::Closed).await;
                            return Err(GameError::ChannelClosed);
                        }
                        _ => {}
                    }
                }
                msg = self.outbound.recv() => {
                    match msg {
                        Some(m) => {
                            debug!("sending {:?}", m);
                            if let Err(e) = write.send(Message::Text(m.to_json().into())).await {
                                let _ = self.events.send(ChannelEvent::Closed).await;
                                return Err(GameError::WebSocket(e.to_string()));
                            }
                        }
                        None => return Ok(()),
                    }
                }
                _ = self.shutdown.recv() => {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                }
            }
        }
    }
}
