//! # guesstrade
//!
//! Client for the GuessTrade server: a timed, round-based chart prediction
//! game played over a persistent WebSocket.
//!
//! ## Features
//!
//! - **Session state machine**: INIT → LOADING → QUESTION → REVEAL → GAME_OVER
//! - **Countdowns**: 20 s per round with auto-submit on expiry, 300 s per session
//! - **Auto-reconnect**: fixed-cadence reconnection after any channel drop
//! - **Heartbeats**: server pings answered transparently
//!
//! ## Example
//!
//! ```rust,ignore
//! use guesstrade::{GameClient, GameConfig, GameEvent};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GameConfig::new("ws://localhost:8000/game/ws");
//!     let client = GameClient::new(config);
//!     client.connect().await?;
//!
//!     while let Some(event) = client.recv().await {
//!         match event {
//!             GameEvent::Connected => {
//!                 client.start().await?;
//!             }
//!             GameEvent::QuestionOpened { countdown } => {
//!                 println!("Guess the continuation! {countdown}s");
//!                 client.select_option(0).await?;
//!             }
//!             GameEvent::ResultRevealed(result) => {
//!                 println!("Correct: {} Score: {}", result.is_correct, result.score);
//!             }
//!             GameEvent::GameOver { score } => {
//!                 println!("Final score: {score}");
//!                 break;
//!             }
//!             _ => {}
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod client;
pub mod error;
pub mod router;
pub mod session;
pub mod timer;
pub mod types;

#[cfg(test)]
mod tests;

pub use client::GameClient;
pub use error::{GameError, Result};
pub use session::{Event, GameEvent};
pub use timer::{TimerKind, TimerService};
pub use types::*;
