//! Unit tests for guesstrade

#[cfg(test)]
mod tests {
    use crate::session::{Effect, Event, GameEvent};
    use crate::timer::TimerKind;
    use crate::types::*;

    fn cfg() -> GameConfig {
        GameConfig::default()
    }

    fn setup_data() -> GameData {
        GameData {
            setup: RoundSetup {
                instrument: "AAPL".to_string(),
                timeframe: "5m".to_string(),
                timestamp: vec!["2024-01-02T10:00:00".to_string()],
                base_data: [("close".to_string(), vec![187.2, 188.1])]
                    .into_iter()
                    .collect(),
            },
            options: (0..4)
                .map(|id| GameOption {
                    id,
                    data: serde_json::Value::Null,
                })
                .collect(),
            overlays: Default::default(),
        }
    }

    fn setup_event() -> Event {
        Event::Server(ServerMessage::GameStart {
            game_data: setup_data(),
        })
    }

    fn result_event(status: GameStatus, user_answer: i32) -> Event {
        Event::Server(ServerMessage::GameResult {
            result: RoundResult {
                user_answer,
                correct_option: 2,
                is_correct: user_answer == 2,
                score: 150,
                lives: 3,
                streak: 1,
                round: 1,
                status,
            },
        })
    }

    /// Drive a fresh session to QUESTION.
    fn session_in_question() -> Session {
        let mut s = Session::default();
        s.apply(Event::ChannelOpened, &cfg());
        s.apply(Event::StartRequested, &cfg());
        s.apply(setup_event(), &cfg());
        s.apply(Event::RevealDelayElapsed, &cfg());
        assert_eq!(s.phase, Phase::Question);
        s
    }

    fn sends(effects: &[Effect]) -> Vec<ClientMessage> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Send(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    // =========================================================================
    // Config
    // =========================================================================

    #[test]
    fn test_config_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.round_seconds, 20);
        assert_eq!(config.session_seconds, 300);
        assert_eq!(config.reveal_delay, 5000);
        assert_eq!(config.advance_delay, 3000);
        assert_eq!(config.watchdog_timeout, 10000);
        assert_eq!(config.reconnect_delay, 2000);
        assert!(config.client_id.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = GameConfig::new("ws://example.com/game/ws")
            .client_id("tester01")
            .round_seconds(10)
            .session_seconds(60)
            .reconnect_delay(500);

        assert_eq!(config.server_url, "ws://example.com/game/ws");
        assert_eq!(config.client_id.as_deref(), Some("tester01"));
        assert_eq!(config.round_seconds, 10);
        assert_eq!(config.session_seconds, 60);
        assert_eq!(config.reconnect_delay, 500);
    }

    #[test]
    fn test_ws_url_joins_client_id() {
        let config = GameConfig::new("ws://example.com/game/ws/");
        assert_eq!(config.ws_url("abc123"), "ws://example.com/game/ws/abc123");
    }

    #[test]
    fn test_generate_client_id() {
        let id = generate_client_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        assert_ne!(generate_client_id(), id);
    }

    // =========================================================================
    // Envelopes
    // =========================================================================

    #[test]
    fn test_inbound_game_start() {
        let raw = r#"{
            "type": "game_start",
            "game_data": {
                "setup": {
                    "instrument": "TSLA",
                    "timeframe": "1d",
                    "timestamp": ["2024-01-02"],
                    "base_data": {"open": [238.1], "close": [240.5]}
                },
                "options": [
                    {"id": 0, "data": []},
                    {"id": 1, "data": []}
                ],
                "overlays": {"ema20": [239.0]}
            }
        }"#;

        let msg: ServerMessage = serde_json::from_str(raw).unwrap();
        let ServerMessage::GameStart { game_data } = msg else {
            panic!("expected game_start");
        };
        assert_eq!(game_data.setup.instrument, "TSLA");
        assert_eq!(game_data.options.len(), 2);
        assert!(game_data.overlays.contains_key("ema20"));
    }

    #[test]
    fn test_inbound_game_setup_alias() {
        // Same message under its alternate discriminant and payload key.
        let raw = r#"{"type": "game_setup", "setup": {"setup": {"instrument": "BTC"}, "options": []}}"#;
        let msg: ServerMessage = serde_json::from_str(raw).unwrap();
        let ServerMessage::GameStart { game_data } = msg else {
            panic!("expected game_setup to decode as setup message");
        };
        assert_eq!(game_data.setup.instrument, "BTC");
    }

    #[test]
    fn test_inbound_game_result() {
        let raw = r#"{
            "type": "game_result",
            "result": {
                "user_answer": 1,
                "correct_option": 1,
                "is_correct": true,
                "score": 250,
                "lives": 2,
                "streak": 3,
                "round": 4,
                "status": "in_progress"
            }
        }"#;

        let msg: ServerMessage = serde_json::from_str(raw).unwrap();
        let ServerMessage::GameResult { result } = msg else {
            panic!("expected game_result");
        };
        assert!(result.is_correct);
        assert_eq!(result.score, 250);
        assert_eq!(result.status, GameStatus::InProgress);
    }

    #[test]
    fn test_inbound_result_missing_fields_default() {
        // The backend omits lives/streak/round in early versions.
        let raw = r#"{"type": "game_result", "result": {"is_correct": false, "score": 0, "correct_option": 3, "user_answer": -1}}"#;
        let msg: ServerMessage = serde_json::from_str(raw).unwrap();
        let ServerMessage::GameResult { result } = msg else {
            panic!("expected game_result");
        };
        assert_eq!(result.status, GameStatus::InProgress);
        assert_eq!(result.round, 0);
    }

    #[test]
    fn test_inbound_ping_and_error() {
        assert!(matches!(
            serde_json::from_str::<ServerMessage>(r#"{"type": "ping"}"#).unwrap(),
            ServerMessage::Ping
        ));

        let msg: ServerMessage =
            serde_json::from_str(r#"{"type": "error", "message": "session not found"}"#).unwrap();
        assert!(matches!(msg, ServerMessage::Error { message } if message == "session not found"));
    }

    #[test]
    fn test_inbound_unknown_type_rejected() {
        assert!(serde_json::from_str::<ServerMessage>(r#"{"type": "leaderboard"}"#).is_err());
        assert!(serde_json::from_str::<ServerMessage>("not json at all").is_err());
    }

    #[test]
    fn test_outbound_frames_exact() {
        assert_eq!(ClientMessage::StartGame.to_json(), r#"{"action":"start_game"}"#);
        assert_eq!(
            ClientMessage::SubmitAnswer { answer: 2 }.to_json(),
            r#"{"action":"submit_answer","answer":2}"#
        );
        assert_eq!(
            ClientMessage::SubmitAnswer { answer: TIMEOUT_ANSWER }.to_json(),
            r#"{"action":"submit_answer","answer":-1}"#
        );
        assert_eq!(ClientMessage::NextRound.to_json(), r#"{"action":"next_round"}"#);
        assert_eq!(ClientMessage::Pong.to_json(), r#"{"type":"pong"}"#);
    }

    // =========================================================================
    // Reducer: happy path
    // =========================================================================

    #[test]
    fn test_start_requires_connection() {
        let mut s = Session::default();
        let effects = s.apply(Event::StartRequested, &cfg());
        assert_eq!(s.phase, Phase::Init);
        assert!(sends(&effects).is_empty());
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::Emit(GameEvent::Notice(_)))));
    }

    #[test]
    fn test_start_sends_start_game() {
        let mut s = Session::default();
        s.apply(Event::ChannelOpened, &cfg());
        let effects = s.apply(Event::StartRequested, &cfg());

        assert_eq!(s.phase, Phase::Loading);
        assert_eq!(sends(&effects), vec![ClientMessage::StartGame]);
    }

    #[test]
    fn test_setup_arms_reveal_delay() {
        let mut s = Session::default();
        s.apply(Event::ChannelOpened, &cfg());
        s.apply(Event::StartRequested, &cfg());
        let effects = s.apply(setup_event(), &cfg());

        assert_eq!(s.phase, Phase::Loading);
        assert_eq!(s.options.len(), 4);
        assert!(s.round_setup.is_some());
        assert!(effects.iter().any(|e| matches!(e, Effect::StartRevealDelay)));
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::Cancel(TimerKind::Watchdog))));
    }

    #[test]
    fn test_reveal_delay_opens_question() {
        let mut s = Session::default();
        s.apply(Event::ChannelOpened, &cfg());
        s.apply(Event::StartRequested, &cfg());
        s.apply(setup_event(), &cfg());
        let effects = s.apply(Event::RevealDelayElapsed, &cfg());

        assert_eq!(s.phase, Phase::Question);
        assert_eq!(s.countdown_time, 20);
        assert!(s.session_clock_started);
        assert!(effects.iter().any(|e| matches!(e, Effect::StartRoundCountdown)));
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::StartSessionCountdown)));
    }

    #[test]
    fn test_manual_selection_submits_once() {
        let mut s = session_in_question();
        s.apply(Event::RoundTick(19), &cfg());
        s.apply(Event::RoundTick(18), &cfg());
        s.apply(Event::RoundTick(17), &cfg());
        assert_eq!(s.countdown_time, 17);

        let effects = s.apply(Event::OptionSelected(1), &cfg());
        assert_eq!(sends(&effects), vec![ClientMessage::SubmitAnswer { answer: 1 }]);
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::Cancel(TimerKind::Round))));
        assert_eq!(s.selected_option, Some(1));

        // A raced expiry or second click must not submit again.
        assert!(sends(&s.apply(Event::RoundExpired, &cfg())).is_empty());
        assert!(sends(&s.apply(Event::OptionSelected(2), &cfg())).is_empty());
        assert_eq!(s.selected_option, Some(1));
    }

    #[test]
    fn test_expiry_submits_sentinel() {
        let mut s = session_in_question();
        let effects = s.apply(Event::RoundExpired, &cfg());

        assert_eq!(
            sends(&effects),
            vec![ClientMessage::SubmitAnswer { answer: TIMEOUT_ANSWER }]
        );
        assert_eq!(s.countdown_time, 0);
        assert!(s.selected_option.is_none());

        // Late manual clicks are too late.
        assert!(sends(&s.apply(Event::OptionSelected(0), &cfg())).is_empty());
    }

    #[test]
    fn test_unknown_option_ignored() {
        let mut s = session_in_question();
        let effects = s.apply(Event::OptionSelected(99), &cfg());
        assert!(effects.is_empty());
        assert!(!s.answer_submitted);
    }

    #[test]
    fn test_result_enters_reveal() {
        let mut s = session_in_question();
        s.apply(Event::OptionSelected(2), &cfg());
        let effects = s.apply(result_event(GameStatus::InProgress, 2), &cfg());

        assert_eq!(s.phase, Phase::Reveal);
        assert_eq!(s.score, 150);
        assert_eq!(s.lives, 3);
        assert_eq!(s.streak, 1);
        assert_eq!(s.round, 1);
        assert_eq!(s.correct_option, Some(2));
        assert!(effects.iter().any(|e| matches!(e, Effect::StartAdvanceDelay)));
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::Emit(GameEvent::ResultRevealed(_)))));
    }

    #[test]
    fn test_in_progress_requests_next_round() {
        let mut s = session_in_question();
        s.apply(Event::OptionSelected(0), &cfg());
        s.apply(result_event(GameStatus::InProgress, 0), &cfg());
        let effects = s.apply(Event::AdvanceDelayElapsed, &cfg());

        assert_eq!(s.phase, Phase::Loading);
        assert_eq!(sends(&effects), vec![ClientMessage::NextRound]);
        assert!(effects.iter().any(|e| matches!(e, Effect::StartWatchdog)));
        // Round state resets together on LOADING entry.
        assert!(s.round_setup.is_none());
        assert!(s.options.is_empty());
        assert!(s.selected_option.is_none());
        assert!(s.correct_option.is_none());
    }

    #[test]
    fn test_completed_ends_game() {
        let mut s = session_in_question();
        s.apply(Event::OptionSelected(0), &cfg());
        s.apply(result_event(GameStatus::Completed, 0), &cfg());
        let effects = s.apply(Event::AdvanceDelayElapsed, &cfg());

        assert_eq!(s.phase, Phase::GameOver);
        assert!(sends(&effects).is_empty());
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::Cancel(TimerKind::Session))));
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::Emit(GameEvent::GameOver { score: 150 }))));
    }

    #[test]
    fn test_session_clock_starts_only_once() {
        let mut s = session_in_question();
        s.apply(Event::OptionSelected(0), &cfg());
        s.apply(result_event(GameStatus::InProgress, 0), &cfg());
        s.apply(Event::AdvanceDelayElapsed, &cfg());

        // Second round arrives.
        s.apply(setup_event(), &cfg());
        let effects = s.apply(Event::RevealDelayElapsed, &cfg());

        assert_eq!(s.phase, Phase::Question);
        assert!(effects.iter().any(|e| matches!(e, Effect::StartRoundCountdown)));
        assert!(!effects
            .iter()
            .any(|e| matches!(e, Effect::StartSessionCountdown)));
    }

    #[test]
    fn test_session_expiry_enacted_at_next_result() {
        let mut s = session_in_question();
        s.apply(Event::SessionExpired, &cfg());
        assert_eq!(s.session_time_remaining, 0);
        // Expiry alone never changes phase.
        assert_eq!(s.phase, Phase::Question);

        s.apply(Event::OptionSelected(0), &cfg());
        s.apply(result_event(GameStatus::InProgress, 0), &cfg());
        let effects = s.apply(Event::AdvanceDelayElapsed, &cfg());

        assert_eq!(s.phase, Phase::GameOver);
        assert!(sends(&effects).is_empty());
    }

    #[test]
    fn test_restart_from_game_over() {
        let mut s = session_in_question();
        s.apply(Event::OptionSelected(0), &cfg());
        s.apply(result_event(GameStatus::Completed, 0), &cfg());
        s.apply(Event::AdvanceDelayElapsed, &cfg());
        assert_eq!(s.phase, Phase::GameOver);

        let effects = s.apply(Event::StartRequested, &cfg());
        assert_eq!(s.phase, Phase::Loading);
        assert_eq!(s.score, 0);
        assert_eq!(s.streak, 0);
        assert_eq!(sends(&effects), vec![ClientMessage::StartGame]);
    }

    // =========================================================================
    // Reducer: failure paths
    // =========================================================================

    #[test]
    fn test_watchdog_resets_to_init() {
        let mut s = session_in_question();
        s.apply(Event::OptionSelected(0), &cfg());
        s.apply(result_event(GameStatus::InProgress, 0), &cfg());
        s.apply(Event::AdvanceDelayElapsed, &cfg());
        assert_eq!(s.phase, Phase::Loading);

        let effects = s.apply(Event::WatchdogFired, &cfg());
        assert_eq!(s.phase, Phase::Init);
        assert!(effects.iter().any(|e| matches!(e, Effect::CancelAll)));
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::Emit(GameEvent::Notice(_)))));
    }

    #[test]
    fn test_watchdog_ignored_once_setup_arrived() {
        let mut s = session_in_question();
        s.apply(Event::OptionSelected(0), &cfg());
        s.apply(result_event(GameStatus::InProgress, 0), &cfg());
        s.apply(Event::AdvanceDelayElapsed, &cfg());
        s.apply(setup_event(), &cfg());

        // A watchdog firing that raced its cancel must not reset anything.
        let effects = s.apply(Event::WatchdogFired, &cfg());
        assert!(effects.is_empty());
        assert_eq!(s.phase, Phase::Loading);
    }

    #[test]
    fn test_server_error_resets_any_phase() {
        let mut s = session_in_question();
        let effects = s.apply(
            Event::Server(ServerMessage::Error {
                message: "boom".to_string(),
            }),
            &cfg(),
        );

        assert_eq!(s.phase, Phase::Init);
        assert!(effects.iter().any(|e| matches!(e, Effect::CancelAll)));
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::Emit(GameEvent::Notice(m)) if m == "boom")));
    }

    #[test]
    fn test_disconnect_mid_round_resets() {
        let mut s = session_in_question();
        let effects = s.apply(Event::ChannelClosed, &cfg());

        assert_eq!(s.phase, Phase::Init);
        assert!(!s.connected);
        assert!(effects.iter().any(|e| matches!(e, Effect::CancelAll)));
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::Emit(GameEvent::Disconnected))));
    }

    #[test]
    fn test_disconnect_while_idle_keeps_phase() {
        let mut s = Session::default();
        s.apply(Event::ChannelOpened, &cfg());
        let effects = s.apply(Event::ChannelClosed, &cfg());

        assert_eq!(s.phase, Phase::Init);
        assert_eq!(effects.len(), 1);
        assert!(matches!(effects[0], Effect::Emit(GameEvent::Disconnected)));
    }

    #[test]
    fn test_stale_events_ignored() {
        let mut s = Session::default();
        assert!(s.apply(Event::RevealDelayElapsed, &cfg()).is_empty());
        assert!(s.apply(Event::AdvanceDelayElapsed, &cfg()).is_empty());
        assert!(s.apply(Event::RoundExpired, &cfg()).is_empty());
        assert!(s.apply(Event::RoundTick(5), &cfg()).is_empty());
        assert!(s.apply(Event::WatchdogFired, &cfg()).is_empty());
        assert_eq!(s.phase, Phase::Init);
    }

    #[test]
    fn test_ping_never_touches_state() {
        let mut s = session_in_question();
        let before = s.clone();
        let effects = s.apply(Event::Server(ServerMessage::Ping), &cfg());
        assert!(effects.is_empty());
        assert_eq!(s.phase, before.phase);
        assert_eq!(s.countdown_time, before.countdown_time);
    }

    #[test]
    fn test_setup_outside_loading_ignored() {
        let mut s = session_in_question();
        let effects = s.apply(setup_event(), &cfg());
        assert!(effects.is_empty());
        assert_eq!(s.phase, Phase::Question);
    }
}
