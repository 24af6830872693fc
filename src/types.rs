//! Type definitions for guesstrade

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Answer value submitted when the round countdown expires without a selection.
pub const TIMEOUT_ANSWER: i32 = -1;

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Init,
    Loading,
    Question,
    Reveal,
    GameOver,
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// WebSocket endpoint, without the trailing client id segment
    pub server_url: String,
    /// Client id appended to the endpoint path (generated when `None`)
    pub client_id: Option<String>,
    /// Per-round countdown in seconds (default: 20)
    pub round_seconds: u32,
    /// Whole-session countdown in seconds (default: 300)
    pub session_seconds: u32,
    /// Delay between round setup arriving and the question opening, in ms (default: 5000)
    pub reveal_delay: u64,
    /// Time the result stays on screen before advancing, in ms (default: 3000)
    pub advance_delay: u64,
    /// Timeout guarding the next-round request, in ms (default: 10000)
    pub watchdog_timeout: u64,
    /// Fixed delay between reconnection attempts, in ms (default: 2000)
    pub reconnect_delay: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:8000/game/ws".to_string(),
            client_id: None,
            round_seconds: 20,
            session_seconds: 300,
            reveal_delay: 5000,
            advance_delay: 3000,
            watchdog_timeout: 10000,
            reconnect_delay: 2000,
        }
    }
}

impl GameConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            ..Default::default()
        }
    }

    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    pub fn round_seconds(mut self, secs: u32) -> Self {
        self.round_seconds = secs;
        self
    }

    pub fn session_seconds(mut self, secs: u32) -> Self {
        self.session_seconds = secs;
        self
    }

    pub fn reveal_delay(mut self, ms: u64) -> Self {
        self.reveal_delay = ms;
        self
    }

    pub fn advance_delay(mut self, ms: u64) -> Self {
        self.advance_delay = ms;
        self
    }

    pub fn watchdog_timeout(mut self, ms: u64) -> Self {
        self.watchdog_timeout = ms;
        self
    }

    pub fn reconnect_delay(mut self, ms: u64) -> Self {
        self.reconnect_delay = ms;
        self
    }

    /// Full WebSocket URL including the client id segment.
    pub fn ws_url(&self, client_id: &str) -> String {
        format!("{}/{}", self.server_url.trim_end_matches('/'), client_id)
    }
}

/// Mutable session state, owned by the controller
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub phase: Phase,
    /// Whether the channel is currently open
    pub connected: bool,
    pub round: u32,
    pub score: i64,
    pub lives: i32,
    pub streak: u32,
    pub round_setup: Option<RoundSetup>,
    pub options: Vec<GameOption>,
    pub selected_option: Option<i32>,
    pub correct_option: Option<i32>,
    /// True once this round's answer went out (manual or timeout)
    pub answer_submitted: bool,
    /// Remaining seconds of the round countdown; meaningful only in QUESTION
    pub countdown_time: u32,
    /// Remaining seconds of the session countdown
    pub session_time_remaining: u32,
    /// Set once the session countdown has been started for this game
    pub session_clock_started: bool,
    pub last_result: Option<RoundResult>,
}

// Wire payload types

/// Chart setup for the current round. Render-only: the controller stores it
/// for chart consumers and never reads the series itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundSetup {
    #[serde(default)]
    pub instrument: String,
    #[serde(default)]
    pub timeframe: String,
    #[serde(default)]
    pub timestamp: Vec<String>,
    /// Column-oriented OHLCV data: column name to values
    #[serde(default)]
    pub base_data: HashMap<String, Vec<f64>>,
}

/// Technical indicator overlay payload; render-only, shape owned by the server
pub type IndicatorOverlay = serde_json::Value;

/// One answer candidate. Correctness is never present before the reveal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameOption {
    pub id: i32,
    /// Price-continuation series; render-only
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Round setup payload carried by `game_start` / `game_setup`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameData {
    pub setup: RoundSetup,
    #[serde(default)]
    pub options: Vec<GameOption>,
    #[serde(default)]
    pub overlays: HashMap<String, IndicatorOverlay>,
}

/// Round status reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    #[default]
    InProgress,
    Completed,
}

/// Result payload carried by `game_result`. Score, lives and streak are
/// authoritative here; the client never computes them.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RoundResult {
    pub user_answer: i32,
    pub correct_option: i32,
    pub is_correct: bool,
    pub score: i64,
    pub lives: i32,
    pub streak: u32,
    pub round: u32,
    pub status: GameStatus,
}

/// Inbound envelope, discriminated by `type`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    #[serde(alias = "game_setup")]
    GameStart {
        #[serde(alias = "setup")]
        game_data: GameData,
    },
    GameResult {
        result: RoundResult,
    },
    Error {
        message: String,
    },
    Ping,
}

/// Outbound envelope. Serialized by hand because the heartbeat reply is
/// `type`-keyed while game actions are `action`-keyed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    StartGame,
    SubmitAnswer { answer: i32 },
    NextRound,
    Pong,
}

impl ClientMessage {
    pub fn to_json(&self) -> String {
        let value = match self {
            Self::StartGame => serde_json::json!({"action": "start_game"}),
            Self::SubmitAnswer { answer } => {
                serde_json::json!({"action": "submit_answer", "answer": answer})
            }
            Self::NextRound => serde_json::json!({"action": "next_round"}),
            Self::Pong => serde_json::json!({"type": "pong"}),
        };
        value.to_string()
    }
}

/// Generate a unique client ID (8 chars)
pub fn generate_client_id() -> String {
    use rand::Rng;
    const CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..8)
        .map(|_| CHARS[rng.gen_range(0..CHARS.len())] as char)
        .collect()
}
