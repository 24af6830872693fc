//! Session phase state machine and controller task

use crate::timer::{TimerKind, TimerService};
use crate::types::{
    ClientMessage, GameConfig, GameData, GameStatus, Phase, RoundResult, ServerMessage, Session,
    TIMEOUT_ANSWER,
};
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast, mpsc};
use tracing::{debug, warn};

/// Everything the controller reacts to: user input, decoded server messages,
/// channel transitions and timer firings. Processed strictly in arrival order.
#[derive(Debug)]
pub enum Event {
    StartRequested,
    OptionSelected(i32),
    Server(ServerMessage),
    ChannelOpened,
    ChannelClosed,
    RoundTick(u32),
    RoundExpired,
    SessionTick(u32),
    SessionExpired,
    RevealDelayElapsed,
    AdvanceDelayElapsed,
    WatchdogFired,
}

/// Side effects requested by the reducer, executed by the controller task.
#[derive(Debug)]
pub enum Effect {
    Send(ClientMessage),
    StartRoundCountdown,
    StartSessionCountdown,
    StartRevealDelay,
    StartAdvanceDelay,
    StartWatchdog,
    Cancel(TimerKind),
    CancelAll,
    Emit(GameEvent),
}

/// Events emitted to the application
#[derive(Debug, Clone)]
pub enum GameEvent {
    /// Phase transition
    PhaseChanged(Phase),
    /// Round setup stored; charts can be drawn from the session snapshot
    SetupReceived { instrument: String },
    /// Question opened with the full round countdown
    QuestionOpened { countdown: u32 },
    /// Round countdown tick (remaining seconds)
    CountdownTick(u32),
    /// Session countdown tick (remaining seconds)
    SessionTick(u32),
    /// Server graded the round
    ResultRevealed(RoundResult),
    /// Session finished
    GameOver { score: i64 },
    /// Channel opened
    Connected,
    /// Channel dropped; reconnection is already scheduled
    Disconnected,
    /// User-visible message (server errors, connectivity trouble)
    Notice(String),
}

impl Session {
    /// Pure transition function: apply one event, mutate the session, and
    /// return the effects to execute. No I/O happens here, which keeps the
    /// whole phase table unit-testable without timers or sockets.
    pub fn apply(&mut self, event: Event, config: &GameConfig) -> Vec<Effect> {
        match event {
            Event::StartRequested => self.on_start_requested(config),
            Event::OptionSelected(id) => self.on_option_selected(id),
            Event::Server(ServerMessage::GameStart { game_data }) => self.on_setup(game_data),
            Event::Server(ServerMessage::GameResult { result }) => self.on_result(result),
            Event::Server(ServerMessage::Error { message }) => self.on_server_error(message),
            // Pings are answered by the router and never get this far.
            Event::Server(ServerMessage::Ping) => Vec::new(),
            Event::ChannelOpened => self.on_channel_opened(),
            Event::ChannelClosed => self.on_channel_closed(),
            Event::RoundTick(remaining) => self.on_round_tick(remaining),
            Event::RoundExpired => self.on_round_expired(),
            Event::SessionTick(remaining) => self.on_session_tick(remaining),
            Event::SessionExpired => {
                self.session_time_remaining = 0;
                Vec::new()
            }
            Event::RevealDelayElapsed => self.on_reveal_delay_elapsed(config),
            Event::AdvanceDelayElapsed => self.on_advance_delay_elapsed(),
            Event::WatchdogFired => self.on_watchdog_fired(),
        }
    }

    fn on_start_requested(&mut self, config: &GameConfig) -> Vec<Effect> {
        if !matches!(self.phase, Phase::Init | Phase::GameOver) {
            debug!("start requested in {:?}, ignoring", self.phase);
            return Vec::new();
        }
        if !self.connected {
            return vec![Effect::Emit(GameEvent::Notice(
                "Not connected to server".to_string(),
            ))];
        }

        self.score = 0;
        self.lives = 0;
        self.streak = 0;
        self.round = 0;
        self.last_result = None;
        self.clear_round_state();
        self.session_clock_started = false;
        self.session_time_remaining = config.session_seconds;
        self.phase = Phase::Loading;

        vec![
            Effect::Send(ClientMessage::StartGame),
            Effect::Emit(GameEvent::PhaseChanged(Phase::Loading)),
        ]
    }

    fn on_setup(&mut self, game_data: GameData) -> Vec<Effect> {
        if self.phase != Phase::Loading {
            debug!("round setup in {:?}, ignoring", self.phase);
            return Vec::new();
        }

        let instrument = game_data.setup.instrument.clone();
        self.round_setup = Some(game_data.setup);
        self.options = game_data.options;
        self.selected_option = None;
        self.correct_option = None;
        self.answer_submitted = false;

        vec![
            Effect::Cancel(TimerKind::Watchdog),
            Effect::StartRevealDelay,
            Effect::Emit(GameEvent::SetupReceived { instrument }),
        ]
    }

    fn on_reveal_delay_elapsed(&mut self, config: &GameConfig) -> Vec<Effect> {
        if self.phase != Phase::Loading || self.round_setup.is_none() {
            return Vec::new();
        }

        self.phase = Phase::Question;
        self.countdown_time = config.round_seconds;

        let mut effects = vec![Effect::StartRoundCountdown];
        if !self.session_clock_started {
            // The session clock starts with the first question and then runs
            // across rounds until game over.
            self.session_clock_started = true;
            self.session_time_remaining = config.session_seconds;
            effects.push(Effect::StartSessionCountdown);
        }
        effects.push(Effect::Emit(GameEvent::PhaseChanged(Phase::Question)));
        effects.push(Effect::Emit(GameEvent::QuestionOpened {
            countdown: self.countdown_time,
        }));
        effects
    }

    fn on_option_selected(&mut self, id: i32) -> Vec<Effect> {
        if self.phase != Phase::Question || self.answer_submitted {
            debug!("selection ignored (phase {:?})", self.phase);
            return Vec::new();
        }
        if !self.options.iter().any(|o| o.id == id) {
            warn!("selected unknown option {}", id);
            return Vec::new();
        }

        self.selected_option = Some(id);
        self.answer_submitted = true;

        // Canceling before sending makes a late auto-submit impossible.
        vec![
            Effect::Cancel(TimerKind::Round),
            Effect::Send(ClientMessage::SubmitAnswer { answer: id }),
        ]
    }

    fn on_round_tick(&mut self, remaining: u32) -> Vec<Effect> {
        if self.phase != Phase::Question || self.answer_submitted {
            return Vec::new();
        }
        self.countdown_time = remaining;
        vec![Effect::Emit(GameEvent::CountdownTick(remaining))]
    }

    fn on_round_expired(&mut self) -> Vec<Effect> {
        if self.phase != Phase::Question || self.answer_submitted {
            return Vec::new();
        }

        self.countdown_time = 0;
        self.answer_submitted = true;

        vec![Effect::Send(ClientMessage::SubmitAnswer {
            answer: TIMEOUT_ANSWER,
        })]
    }

    fn on_session_tick(&mut self, remaining: u32) -> Vec<Effect> {
        if !self.session_clock_started {
            return Vec::new();
        }
        self.session_time_remaining = remaining;
        vec![Effect::Emit(GameEvent::SessionTick(remaining))]
    }

    fn on_result(&mut self, result: RoundResult) -> Vec<Effect> {
        if self.phase != Phase::Question || !self.answer_submitted {
            debug!("result in {:?}, ignoring", self.phase);
            return Vec::new();
        }

        self.score = result.score;
        self.lives = result.lives;
        self.streak = result.streak;
        self.round = result.round;
        self.correct_option = Some(result.correct_option);
        if result.user_answer != TIMEOUT_ANSWER {
            self.selected_option = Some(result.user_answer);
        }
        self.last_result = Some(result.clone());
        self.phase = Phase::Reveal;

        vec![
            Effect::Cancel(TimerKind::Round),
            Effect::StartAdvanceDelay,
            Effect::Emit(GameEvent::PhaseChanged(Phase::Reveal)),
            Effect::Emit(GameEvent::ResultRevealed(result)),
        ]
    }

    fn on_advance_delay_elapsed(&mut self) -> Vec<Effect> {
        if self.phase != Phase::Reveal {
            return Vec::new();
        }
        let Some(result) = &self.last_result else {
            return Vec::new();
        };

        // Session-clock expiry is enacted here rather than from the timer, so
        // an in-flight round can never race the clock.
        let finished = result.status == GameStatus::Completed || self.session_time_remaining == 0;

        if finished {
            self.phase = Phase::GameOver;
            return vec![
                Effect::Cancel(TimerKind::Session),
                Effect::Emit(GameEvent::PhaseChanged(Phase::GameOver)),
                Effect::Emit(GameEvent::GameOver { score: self.score }),
            ];
        }

        self.clear_round_state();
        self.phase = Phase::Loading;

        vec![
            Effect::Send(ClientMessage::NextRound),
            Effect::StartWatchdog,
            Effect::Emit(GameEvent::PhaseChanged(Phase::Loading)),
        ]
    }

    fn on_watchdog_fired(&mut self) -> Vec<Effect> {
        if self.phase != Phase::Loading || self.round_setup.is_some() {
            return Vec::new();
        }

        self.reset_to_init();
        vec![
            Effect::CancelAll,
            Effect::Emit(GameEvent::Notice(
                "No response from server; check your connection".to_string(),
            )),
            Effect::Emit(GameEvent::PhaseChanged(Phase::Init)),
        ]
    }

    fn on_server_error(&mut self, message: String) -> Vec<Effect> {
        warn!("server error: {}", message);
        self.reset_to_init();
        vec![
            Effect::CancelAll,
            Effect::Emit(GameEvent::Notice(message)),
            Effect::Emit(GameEvent::PhaseChanged(Phase::Init)),
        ]
    }

    fn on_channel_opened(&mut self) -> Vec<Effect> {
        self.connected = true;
        vec![Effect::Emit(GameEvent::Connected)]
    }

    fn on_channel_closed(&mut self) -> Vec<Effect> {
        self.connected = false;

        // A reconnected channel never saw our start_game, so any in-flight
        // round is unservable. Reset to INIT instead of keeping stale state.
        if matches!(self.phase, Phase::Loading | Phase::Question | Phase::Reveal) {
            self.reset_to_init();
            return vec![
                Effect::CancelAll,
                Effect::Emit(GameEvent::Disconnected),
                Effect::Emit(GameEvent::Notice("Connection lost".to_string())),
                Effect::Emit(GameEvent::PhaseChanged(Phase::Init)),
            ];
        }

        vec![Effect::Emit(GameEvent::Disconnected)]
    }

    fn clear_round_state(&mut self) {
        self.round_setup = None;
        self.options.clear();
        self.selected_option = None;
        self.correct_option = None;
        self.answer_submitted = false;
        self.countdown_time = 0;
    }

    fn reset_to_init(&mut self) {
        self.clear_round_state();
        self.session_clock_started = false;
        self.phase = Phase::Init;
    }
}

/// Owns the [`Session`] and serializes every mutation through one event loop.
/// The channel and timers only ever talk to it through the event queue.
pub struct SessionController {
    config: GameConfig,
    session: Arc<RwLock<Session>>,
    events: mpsc::Receiver<Event>,
    timers: TimerService,
    outbound: mpsc::Sender<ClientMessage>,
    game_events: mpsc::Sender<GameEvent>,
    shutdown: broadcast::Receiver<()>,
}

impl SessionController {
    pub fn new(
        config: GameConfig,
        session: Arc<RwLock<Session>>,
        events: mpsc::Receiver<Event>,
        timers: TimerService,
        outbound: mpsc::Sender<ClientMessage>,
        game_events: mpsc::Sender<GameEvent>,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            config,
            session,
            events,
            timers,
            outbound,
            game_events,
            shutdown,
        }
    }

    /// Process events until shutdown.
    pub async fn run(mut self) {
        loop {
            let event = tokio::select! {
                ev = self.events.recv() => ev,
                _ = self.shutdown.recv() => None,
            };
            let Some(event) = event else {
                self.timers.cancel_all();
                debug!("controller stopped");
                return;
            };

            let effects = self.session.write().await.apply(event, &self.config);
            for effect in effects {
                self.execute(effect).await;
            }
        }
    }

    async fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::Send(msg) => {
                if self.outbound.send(msg).await.is_err() {
                    warn!("outbound channel gone, message dropped");
                }
            }
            Effect::StartRoundCountdown => self.timers.start_round(self.config.round_seconds),
            Effect::StartSessionCountdown => self.timers.start_session(self.config.session_seconds),
            Effect::StartRevealDelay => self.timers.start_reveal_delay(self.config.reveal_delay),
            Effect::StartAdvanceDelay => self.timers.start_advance_delay(self.config.advance_delay),
            Effect::StartWatchdog => self.timers.start_watchdog(self.config.watchdog_timeout),
            Effect::Cancel(kind) => self.timers.cancel(kind),
            Effect::CancelAll => self.timers.cancel_all(),
            Effect::Emit(event) => {
                let _ = self.game_events.send(event).await;
            }
        }
    }
}
