// Rendering boundary. The board, players and dealer report every visible
// change through `DisplaySink` so front ends (TUI, logs, tests) stay outside
// the coordination core.

use crate::cards::Card;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

pub trait DisplaySink: Send + Sync {
    fn show_card(&self, card: Card, slot: usize);
    fn hide_card(&self, slot: usize);
    fn show_marker(&self, player: usize, slot: usize);
    fn hide_marker(&self, player: usize, slot: usize);
    fn set_score(&self, player: usize, score: u32);
    fn set_cooldown(&self, player: usize, remaining: Duration);
    fn set_countdown(&self, remaining: Duration, warning: bool);
    fn announce_winners(&self, players: &[usize]);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDisplay;

impl DisplaySink for NullDisplay {
    fn show_card(&self, _card: Card, _slot: usize) {}
    fn hide_card(&self, _slot: usize) {}
    fn show_marker(&self, _player: usize, _slot: usize) {}
    fn hide_marker(&self, _player: usize, _slot: usize) {}
    fn set_score(&self, _player: usize, _score: u32) {}
    fn set_cooldown(&self, _player: usize, _remaining: Duration) {}
    fn set_countdown(&self, _remaining: Duration, _warning: bool) {}
    fn announce_winners(&self, _players: &[usize]) {}
}

/// Writes game events to the `log` facade. Used by headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDisplay;

impl DisplaySink for LogDisplay {
    fn show_card(&self, card: Card, slot: usize) {
        log::debug!("slot {slot}: {card}");
    }
    fn hide_card(&self, slot: usize) {
        log::debug!("slot {slot}: empty");
    }
    fn show_marker(&self, player: usize, slot: usize) {
        log::trace!("player {player} marks slot {slot}");
    }
    fn hide_marker(&self, player: usize, slot: usize) {
        log::trace!("player {player} unmarks slot {slot}");
    }
    fn set_score(&self, player: usize, score: u32) {
        log::info!("player {player} score: {score}");
    }
    fn set_cooldown(&self, player: usize, remaining: Duration) {
        log::trace!("player {player} frozen for {}ms", remaining.as_millis());
    }
    fn set_countdown(&self, remaining: Duration, warning: bool) {
        if warning {
            log::trace!("countdown {}ms (warning)", remaining.as_millis());
        }
    }
    fn announce_winners(&self, players: &[usize]) {
        log::info!("winners: {players:?}");
    }
}

/// One call made on a [`Recorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DisplayEvent {
    ShowCard { card: Card, slot: usize },
    HideCard { slot: usize },
    ShowMarker { player: usize, slot: usize },
    HideMarker { player: usize, slot: usize },
    Score { player: usize, score: u32 },
    Cooldown { player: usize, remaining: Duration },
    Countdown { remaining: Duration, warning: bool },
    Winners(Vec<usize>),
}

/// Keeps every display call in order, for assertions.
#[derive(Debug, Default)]
pub struct Recorder {
    events: Mutex<Vec<DisplayEvent>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DisplayEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Winner announcements seen so far.
    pub fn winners(&self) -> Vec<Vec<usize>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                DisplayEvent::Winners(w) => Some(w),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: DisplayEvent) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event);
    }
}

impl DisplaySink for Recorder {
    fn show_card(&self, card: Card, slot: usize) {
        self.push(DisplayEvent::ShowCard { card, slot });
    }
    fn hide_card(&self, slot: usize) {
        self.push(DisplayEvent::HideCard { slot });
    }
    fn show_marker(&self, player: usize, slot: usize) {
        self.push(DisplayEvent::ShowMarker { player, slot });
    }
    fn hide_marker(&self, player: usize, slot: usize) {
        self.push(DisplayEvent::HideMarker { player, slot });
    }
    fn set_score(&self, player: usize, score: u32) {
        self.push(DisplayEvent::Score { player, score });
    }
    fn set_cooldown(&self, player: usize, remaining: Duration) {
        self.push(DisplayEvent::Cooldown { player, remaining });
    }
    fn set_countdown(&self, remaining: Duration, warning: bool) {
        self.push(DisplayEvent::Countdown { remaining, warning });
    }
    fn announce_winners(&self, players: &[usize]) {
        self.push(DisplayEvent::Winners(players.to_vec()));
    }
}
