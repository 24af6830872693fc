//! GameClient - public facade wiring channel, router, timers and controller

use crate::channel::ChannelManager;
use crate::error::{GameError, Result};
use crate::router::MessageRouter;
use crate::session::{Event, GameEvent, SessionController};
use crate::timer::TimerService;
use crate::types::{ClientMessage, GameConfig, Phase, Session, generate_client_id};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, broadcast, mpsc};
use tracing::info;

/// Receiver halves handed to the background tasks on `connect`.
struct Wiring {
    event_rx: mpsc::Receiver<Event>,
    outbound_rx: mpsc::Receiver<ClientMessage>,
    outbound_tx: mpsc::Sender<ClientMessage>,
    game_tx: mpsc::Sender<GameEvent>,
}

/// Plays the prediction game against the server.
///
/// All session mutation is serialized through the controller task; this
/// facade only enqueues events and reads snapshots.
pub struct GameClient {
    config: GameConfig,
    client_id: String,
    session: Arc<RwLock<Session>>,
    events: mpsc::Sender<Event>,
    game_rx: Arc<RwLock<mpsc::Receiver<GameEvent>>>,
    shutdown: broadcast::Sender<()>,
    wiring: Mutex<Option<Wiring>>,
}

impl GameClient {
    /// Create a new client. No connection is made until [`connect`](Self::connect).
    pub fn new(config: GameConfig) -> Self {
        let client_id = config
            .client_id
            .clone()
            .unwrap_or_else(generate_client_id);
        let (event_tx, event_rx) = mpsc::channel(100);
        let (outbound_tx, outbound_rx) = mpsc::channel(100);
        let (game_tx, game_rx) = mpsc::channel(100);
        let (shutdown, _) = broadcast::channel(1);

        Self {
            config,
            client_id,
            session: Arc::new(RwLock::new(Session::default())),
            events: event_tx,
            game_rx: Arc::new(RwLock::new(game_rx)),
            shutdown,
            wiring: Mutex::new(Some(Wiring {
                event_rx,
                outbound_rx,
                outbound_tx,
                game_tx,
            })),
        }
    }

    /// The client id used in the WebSocket path.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Spawn the channel, router and controller tasks and start connecting.
    /// The channel keeps reconnecting on its own after any drop.
    pub async fn connect(&self) -> Result<()> {
        let wiring = self
            .wiring
            .lock()
            .await
            .take()
            .ok_or(GameError::AlreadyStarted)?;

        let url = self.config.ws_url(&self.client_id);
        info!("starting game client for {}", url);

        let (channel_tx, channel_rx) = mpsc::channel(100);

        let manager = ChannelManager::new(
            url,
            Duration::from_millis(self.config.reconnect_delay),
            wiring.outbound_rx,
            channel_tx,
            self.shutdown.subscribe(),
        );
        let router = MessageRouter::new(wiring.outbound_tx.clone(), self.events.clone());
        let controller = SessionController::new(
            self.config.clone(),
            self.session.clone(),
            wiring.event_rx,
            TimerService::new(self.events.clone()),
            wiring.outbound_tx,
            wiring.game_tx,
            self.shutdown.subscribe(),
        );

        tokio::spawn(manager.run());
        tokio::spawn(router.run(channel_rx));
        tokio::spawn(controller.run());

        Ok(())
    }

    /// Stop all background tasks. The session state is discarded with them.
    pub async fn disconnect(&self) -> Result<()> {
        let _ = self.shutdown.send(());
        self.session.write().await.connected = false;
        info!("game client shut down");
        Ok(())
    }

    /// Request a new game. Valid from INIT and GAME_OVER with an open channel.
    pub async fn start(&self) -> Result<()> {
        {
            let session = self.session.read().await;
            if !session.connected {
                return Err(GameError::NotConnected);
            }
            if !matches!(session.phase, Phase::Init | Phase::GameOver) {
                return Err(GameError::AlreadyStarted);
            }
        }
        self.events
            .send(Event::StartRequested)
            .await
            .map_err(|_| GameError::ShutDown)
    }

    /// Answer the current question manually.
    pub async fn select_option(&self, id: i32) -> Result<()> {
        {
            let session = self.session.read().await;
            if session.phase != Phase::Question {
                return Err(GameError::NoActiveGame);
            }
            if session.answer_submitted {
                return Err(GameError::AlreadyAnswered);
            }
            if !session.options.iter().any(|o| o.id == id) {
                return Err(GameError::UnknownOption(id));
            }
        }
        self.events
            .send(Event::OptionSelected(id))
            .await
            .map_err(|_| GameError::ShutDown)
    }

    /// Receive next event (blocking)
    pub async fn recv(&self) -> Option<GameEvent> {
        self.game_rx.write().await.recv().await
    }

    /// Receive next event (non-blocking)
    pub async fn try_recv(&self) -> Option<GameEvent> {
        self.game_rx.write().await.try_recv().ok()
    }

    /// Snapshot of the current session state.
    pub async fn session(&self) -> Session {
        self.session.read().await.clone()
    }

    /// Current phase.
    pub async fn phase(&self) -> Phase {
        self.session.read().await.phase
    }

    /// Whether the channel is currently open.
    pub async fn is_connected(&self) -> bool {
        self.session.read().await.connected
    }
}
