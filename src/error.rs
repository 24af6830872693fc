//! Error types for guesstrade

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("Not connected to server")]
    NotConnected,

    #[error("Channel closed")]
    ChannelClosed,

    #[error("No game in progress")]
    NoActiveGame,

    #[error("Game already started")]
    AlreadyStarted,

    #[error("Answer already submitted for this round")]
    AlreadyAnswered,

    #[error("Unknown option: {0}")]
    UnknownOption(i32),

    #[error("Client is shut down")]
    ShutDown,

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GameError>;
