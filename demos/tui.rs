//! Simple TUI example for guesstrade

use guesstrade::{GameClient, GameConfig, GameEvent};
use std::io::{self, Write};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("guesstrade TUI Example");
    println!("======================\n");

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://127.0.0.1:8000/game/ws".to_string());

    let client = GameClient::new(GameConfig::new(url));

    println!("Connecting...");
    client.connect().await?;
    println!("Client id: {}\n", client.client_id());

    println!("Commands:");
    println!("  s - Start game");
    println!("  0-3 - Select option");
    println!("  i - Show session state");
    println!("  q - Quit\n");

    loop {
        // Check for events
        while let Some(event) = client.try_recv().await {
            match event {
                GameEvent::Connected => println!("[Event] Connected"),
                GameEvent::Disconnected => println!("[Event] Disconnected, reconnecting..."),
                GameEvent::PhaseChanged(phase) => println!("[Event] Phase: {:?}", phase),
                GameEvent::SetupReceived { instrument } => {
                    println!("[Event] Round loading: {}", instrument);
                }
                GameEvent::QuestionOpened { countdown } => {
                    println!("[Event] Guess the continuation! {}s", countdown);
                }
                GameEvent::CountdownTick(secs) => println!("[Event] {}s left", secs),
                GameEvent::SessionTick(secs) => {
                    if secs % 60 == 0 {
                        println!("[Event] Session: {}s remaining", secs);
                    }
                }
                GameEvent::ResultRevealed(result) => {
                    println!(
                        "[Event] {} Correct option: {} Score: {} Streak: {}",
                        if result.is_correct { "Correct!" } else { "Wrong." },
                        result.correct_option,
                        result.score,
                        result.streak,
                    );
                }
                GameEvent::GameOver { score } => println!("[Event] Game over! Score: {}", score),
                GameEvent::Notice(msg) => println!("[Notice] {}", msg),
            }
        }

        // Read input
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        match input {
            "s" => match client.start().await {
                Ok(()) => println!("Game requested"),
                Err(e) => println!("Failed to start: {}", e),
            },
            "i" => {
                let session = client.session().await;
                println!(
                    "phase={:?} round={} score={} lives={} streak={} countdown={} session={}s",
                    session.phase,
                    session.round,
                    session.score,
                    session.lives,
                    session.streak,
                    session.countdown_time,
                    session.session_time_remaining,
                );
            }
            "q" => {
                println!("Goodbye!");
                break;
            }
            _ => match input.parse::<i32>() {
                Ok(id) => match client.select_option(id).await {
                    Ok(()) => println!("Answered {}", id),
                    Err(e) => println!("Failed to answer: {}", e),
                },
                Err(_) => println!("Unknown command: {}", input),
            },
        }
    }

    client.disconnect().await?;
    Ok(())
}
