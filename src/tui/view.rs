use crate::cards::Card;
use crate::display::DisplaySink;
use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Everything the table screen shows, as last reported by the game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct TableView {
    pub cards: Vec<Option<Card>>,
    pub markers: Vec<BTreeSet<usize>>,
    pub scores: Vec<u32>,
    pub cooldowns: Vec<Duration>,
    pub countdown: Duration,
    pub warning: bool,
    pub winners: Option<Vec<usize>>,
}

impl TableView {
    pub fn new(table_size: usize, players: usize) -> Self {
        Self {
            cards: vec![None; table_size],
            markers: vec![BTreeSet::new(); players],
            scores: vec![0; players],
            cooldowns: vec![Duration::ZERO; players],
            ..Self::default()
        }
    }

    /// Players holding a marker on `slot`.
    pub fn markers_on(&self, slot: usize) -> Vec<usize> {
        self.markers
            .iter()
            .enumerate()
            .filter(|(_, m)| m.contains(&slot))
            .map(|(p, _)| p)
            .collect()
    }
}

/// [`DisplaySink`] that records into a [`TableView`] for the render loop.
#[derive(Debug)]
pub struct TuiDisplay {
    view: Mutex<TableView>,
}

impl TuiDisplay {
    pub fn new(table_size: usize, players: usize) -> Self {
        Self { view: Mutex::new(TableView::new(table_size, players)) }
    }

    pub fn snapshot(&self) -> TableView {
        self.view.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn update(&self, f: impl FnOnce(&mut TableView)) {
        f(&mut self.view.lock().unwrap_or_else(PoisonError::into_inner));
    }
}

impl DisplaySink for TuiDisplay {
    fn show_card(&self, card: Card, slot: usize) {
        self.update(|v| {
            if let Some(cell) = v.cards.get_mut(slot) {
                *cell = Some(card);
            }
        });
    }

    fn hide_card(&self, slot: usize) {
        self.update(|v| {
            if let Some(cell) = v.cards.get_mut(slot) {
                *cell = None;
            }
        });
    }

    fn show_marker(&self, player: usize, slot: usize) {
        self.update(|v| {
            if let Some(m) = v.markers.get_mut(player) {
                m.insert(slot);
            }
        });
    }

    fn hide_marker(&self, player: usize, slot: usize) {
        self.update(|v| {
            if let Some(m) = v.markers.get_mut(player) {
                m.remove(&slot);
            }
        });
    }

    fn set_score(&self, player: usize, score: u32) {
        self.update(|v| {
            if let Some(s) = v.scores.get_mut(player) {
                *s = score;
            }
        });
    }

    fn set_cooldown(&self, player: usize, remaining: Duration) {
        self.update(|v| {
            if let Some(c) = v.cooldowns.get_mut(player) {
                *c = remaining;
            }
        });
    }

    fn set_countdown(&self, remaining: Duration, warning: bool) {
        self.update(|v| {
            v.countdown = remaining;
            v.warning = warning;
        });
    }

    fn announce_winners(&self, players: &[usize]) {
        self.update(|v| v.winners = Some(players.to_vec()));
    }
}
