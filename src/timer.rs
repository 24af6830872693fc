//! Countdown and delay timers feeding the controller event loop

use crate::session::Event;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Timer categories. The controller holds at most one live timer per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Round,
    Session,
    RevealDelay,
    AdvanceDelay,
    Watchdog,
}

/// Owns one cancelable handle per timer category. Starting a category cancels
/// the previous handle first; canceling an idle category is a no-op.
pub struct TimerService {
    events: mpsc::Sender<Event>,
    round: Option<JoinHandle<()>>,
    session: Option<JoinHandle<()>>,
    reveal: Option<JoinHandle<()>>,
    advance: Option<JoinHandle<()>>,
    watchdog: Option<JoinHandle<()>>,
}

impl TimerService {
    pub fn new(events: mpsc::Sender<Event>) -> Self {
        Self {
            events,
            round: None,
            session: None,
            reveal: None,
            advance: None,
            watchdog: None,
        }
    }

    /// Per-round countdown: one tick per second, then a single expiry event.
    pub fn start_round(&mut self, secs: u32) {
        self.cancel(TimerKind::Round);
        let events = self.events.clone();
        self.round = Some(tokio::spawn(async move {
            for remaining in (0..secs).rev() {
                sleep(Duration::from_secs(1)).await;
                let _ = events.send(Event::RoundTick(remaining)).await;
            }
            let _ = events.send(Event::RoundExpired).await;
        }));
    }

    /// Whole-session countdown. Runs down to zero and stops; it never forces
    /// a phase change on its own.
    pub fn start_session(&mut self, secs: u32) {
        self.cancel(TimerKind::Session);
        let events = self.events.clone();
        self.session = Some(tokio::spawn(async move {
            for remaining in (0..secs).rev() {
                sleep(Duration::from_secs(1)).await;
                let _ = events.send(Event::SessionTick(remaining)).await;
            }
            let _ = events.send(Event::SessionExpired).await;
        }));
    }

    pub fn start_reveal_delay(&mut self, ms: u64) {
        self.cancel(TimerKind::RevealDelay);
        self.reveal = Some(Self::one_shot(
            self.events.clone(),
            ms,
            Event::RevealDelayElapsed,
        ));
    }

    pub fn start_advance_delay(&mut self, ms: u64) {
        self.cancel(TimerKind::AdvanceDelay);
        self.advance = Some(Self::one_shot(
            self.events.clone(),
            ms,
            Event::AdvanceDelayElapsed,
        ));
    }

    pub fn start_watchdog(&mut self, ms: u64) {
        self.cancel(TimerKind::Watchdog);
        self.watchdog = Some(Self::one_shot(self.events.clone(), ms, Event::WatchdogFired));
    }

    fn one_shot(events: mpsc::Sender<Event>, ms: u64, event: Event) -> JoinHandle<()> {
        tokio::spawn(async move {
            sleep(Duration::from_millis(ms)).await;
            let _ = events.send(event).await;
        })
    }

    /// Cancel one category. Idempotent.
    pub fn cancel(&mut self, kind: TimerKind) {
        if let Some(handle) = self.slot(kind).take() {
            handle.abort();
        }
    }

    /// Cancel everything that is running.
    pub fn cancel_all(&mut self) {
        for kind in [
            TimerKind::Round,
            TimerKind::Session,
            TimerKind::RevealDelay,
            TimerKind::AdvanceDelay,
            TimerKind::Watchdog,
        ] {
            self.cancel(kind);
        }
    }

    /// Whether a category currently has a live timer.
    pub fn is_active(&self, kind: TimerKind) -> bool {
        match kind {
            TimerKind::Round => &self.round,
            TimerKind::Session => &self.session,
            TimerKind::RevealDelay => &self.reveal,
            TimerKind::AdvanceDelay => &self.advance,
            TimerKind::Watchdog => &self.watchdog,
        }
        .as_ref()
        .is_some_and(|h| !h.is_finished())
    }

    fn slot(&mut self, kind: TimerKind) -> &mut Option<JoinHandle<()>> {
        match kind {
            TimerKind::Round => &mut self.round,
            TimerKind::Session => &mut self.session,
            TimerKind::RevealDelay => &mut self.reveal,
            TimerKind::AdvanceDelay => &mut self.advance,
            TimerKind::Watchdog => &mut self.watchdog,
        }
    }
}
