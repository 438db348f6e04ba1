//! The shared table: slots, the card/slot mapping, player markers and the
//! pending-removal flags.
//!
//! # Locking
//! Each slot and each player has its own mutex. Every operation goes through
//! [`Board::acquire`], which takes the slot locks it needs in ascending order
//! and then the player locks in ascending order. Nothing else locks board
//! state, so two operations can never wait on each other in a cycle.
//! Operations on disjoint slots and players run in parallel.
//!
//! The card→slot index is a table of atomics. An entry is only written while
//! the lock of the slot it points to (or used to point to) is held.

use crate::cards::{Card, CLAIM_SIZE};
use crate::display::DisplaySink;
use crate::evaluator::SetEvaluator;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

const NO_SLOT: usize = usize::MAX;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BoardError {
    #[error("slot {0} is out of range")]
    SlotOutOfRange(usize),
    #[error("player {0} is out of range")]
    PlayerOutOfRange(usize),
    #[error("card {0} is out of range")]
    CardOutOfRange(Card),
    #[error("slot {0} already holds a card")]
    SlotOccupied(usize),
    #[error("slot {0} is empty")]
    SlotEmpty(usize),
    #[error("card {card} is already in slot {slot}")]
    CardOnBoard { card: Card, slot: usize },
}

/// What a key press did to a player's markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Placed,
    Removed,
    /// The player already holds a full claim, or the slot has no card.
    Rejected,
}

impl Toggle {
    pub fn changed(self) -> bool {
        !matches!(self, Toggle::Rejected)
    }
}

/// A valid claim currently on the table, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    pub slots: Vec<usize>,
    pub features: Vec<Vec<u8>>,
}

#[derive(Debug, Default)]
struct Slot {
    card: Option<Card>,
    pending_removal: bool,
}

type Markers = BTreeSet<usize>;

/// Locks held for the duration of one board operation.
struct Held<'a> {
    slots: Vec<(usize, MutexGuard<'a, Slot>)>,
    players: Vec<(usize, MutexGuard<'a, Markers>)>,
}

impl Held<'_> {
    fn slot(&mut self, slot: usize) -> Result<&mut Slot, BoardError> {
        self.slots
            .iter_mut()
            .find(|(s, _)| *s == slot)
            .map(|(_, g)| &mut **g)
            .ok_or(BoardError::SlotOutOfRange(slot))
    }

    fn markers(&mut self, player: usize) -> Result<&mut Markers, BoardError> {
        self.players
            .iter_mut()
            .find(|(p, _)| *p == player)
            .map(|(_, g)| &mut **g)
            .ok_or(BoardError::PlayerOutOfRange(player))
    }
}

pub struct Board {
    slots: Vec<Mutex<Slot>>,
    markers: Vec<Mutex<Markers>>,
    card_slots: Vec<AtomicUsize>,
    evaluator: Arc<dyn SetEvaluator>,
    display: Arc<dyn DisplaySink>,
    delay: Duration,
}

impl std::fmt::Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Board")
            .field("slots", &self.slots.len())
            .field("players", &self.markers.len())
            .field("cards", &self.card_slots.len())
            .finish()
    }
}

impl Board {
    pub fn new(
        table_size: usize,
        deck_size: usize,
        players: usize,
        evaluator: Arc<dyn SetEvaluator>,
        display: Arc<dyn DisplaySink>,
    ) -> Self {
        Self {
            slots: (0..table_size).map(|_| Mutex::new(Slot::default())).collect(),
            markers: (0..players).map(|_| Mutex::new(Markers::new())).collect(),
            card_slots: (0..deck_size).map(|_| AtomicUsize::new(NO_SLOT)).collect(),
            evaluator,
            display,
            delay: Duration::ZERO,
        }
    }

    /// Sleep this long inside every placement and removal.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn table_size(&self) -> usize {
        self.slots.len()
    }

    pub fn players(&self) -> usize {
        self.markers.len()
    }

    pub fn evaluator(&self) -> &Arc<dyn SetEvaluator> {
        &self.evaluator
    }

    /// Lock `slots` ascending, then `players` ascending. The only place board
    /// mutexes are taken.
    fn acquire(&self, slots: &[usize], players: &[usize]) -> Result<Held<'_>, BoardError> {
        let mut slot_ids = slots.to_vec();
        slot_ids.sort_unstable();
        slot_ids.dedup();
        let mut player_ids = players.to_vec();
        player_ids.sort_unstable();
        player_ids.dedup();

        if let Some(&s) = slot_ids.iter().find(|&&s| s >= self.slots.len()) {
            return Err(BoardError::SlotOutOfRange(s));
        }
        if let Some(&p) = player_ids.iter().find(|&&p| p >= self.markers.len()) {
            return Err(BoardError::PlayerOutOfRange(p));
        }

        let slots = slot_ids
            .into_iter()
            .map(|s| (s, self.slots[s].lock().unwrap_or_else(PoisonError::into_inner)))
            .collect();
        let players = player_ids
            .into_iter()
            .map(|p| (p, self.markers[p].lock().unwrap_or_else(PoisonError::into_inner)))
            .collect();
        Ok(Held { slots, players })
    }

    fn all_players(&self) -> Vec<usize> {
        (0..self.markers.len()).collect()
    }

    fn all_slots(&self) -> Vec<usize> {
        (0..self.slots.len()).collect()
    }

    fn pause(&self) {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
    }

    /// Put `card` into the empty `slot`. Every player's marker on the slot is
    /// cleared under the same locks, so no one can mark it mid-placement.
    pub fn place_card(&self, card: Card, slot: usize) -> Result<(), BoardError> {
        let index = self.card_slots.get(card.index()).ok_or(BoardError::CardOutOfRange(card))?;
        let mut held = self.acquire(&[slot], &self.all_players())?;
        let cell = held.slot(slot)?;
        if cell.card.is_some() {
            return Err(BoardError::SlotOccupied(slot));
        }
        let current = index.load(Ordering::Acquire);
        if current != NO_SLOT {
            return Err(BoardError::CardOnBoard { card, slot: current });
        }

        self.pause();
        cell.card = Some(card);
        cell.pending_removal = false;
        index.store(slot, Ordering::Release);
        self.display.show_card(card, slot);
        for (player, markers) in held.players.iter_mut() {
            if markers.remove(&slot) {
                self.display.hide_marker(*player, slot);
            }
        }
        Ok(())
    }

    /// Take the card out of `slot`, dropping its pending-removal flag and
    /// every marker on it.
    pub fn remove_card(&self, slot: usize) -> Result<Card, BoardError> {
        let mut held = self.acquire(&[slot], &self.all_players())?;
        self.remove_held(&mut held, slot)
    }

    fn remove_held(&self, held: &mut Held<'_>, slot: usize) -> Result<Card, BoardError> {
        let cell = held.slot(slot)?;
        let card = cell.card.ok_or(BoardError::SlotEmpty(slot))?;

        self.pause();
        cell.card = None;
        cell.pending_removal = false;
        if let Some(index) = self.card_slots.get(card.index()) {
            index.store(NO_SLOT, Ordering::Release);
        }
        self.display.hide_card(slot);
        for (player, markers) in held.players.iter_mut() {
            if markers.remove(&slot) {
                self.display.hide_marker(*player, slot);
            }
        }
        Ok(card)
    }

    /// Remove the player's marker on `slot` if there is one; otherwise place
    /// one, unless the player already holds a full claim or the slot is empty.
    pub fn toggle_marker(&self, player: usize, slot: usize) -> Result<Toggle, BoardError> {
        let mut held = self.acquire(&[slot], &[player])?;
        let has_card = held.slot(slot)?.card.is_some();
        let markers = held.markers(player)?;

        if markers.remove(&slot) {
            self.display.hide_marker(player, slot);
            log::debug!("player {player} removed marker from slot {slot}");
            return Ok(Toggle::Removed);
        }
        if markers.len() >= CLAIM_SIZE || !has_card {
            return Ok(Toggle::Rejected);
        }
        markers.insert(slot);
        self.display.show_marker(player, slot);
        log::debug!("player {player} placed marker on slot {slot}");
        Ok(Toggle::Placed)
    }

    pub fn marker_count(&self, player: usize) -> usize {
        self.acquire(&[], &[player])
            .and_then(|mut held| held.markers(player).map(|m| m.len()))
            .unwrap_or(0)
    }

    /// The player's marked slots in ascending order; unused entries are `None`.
    pub fn markers_of(&self, player: usize) -> [Option<usize>; CLAIM_SIZE] {
        let mut out = [None; CLAIM_SIZE];
        if let Ok(mut held) = self.acquire(&[], &[player]) {
            if let Ok(markers) = held.markers(player) {
                for (dst, &slot) in out.iter_mut().zip(markers.iter()) {
                    *dst = Some(slot);
                }
            }
        }
        out
    }

    /// True when the player holds exactly three markers, none of them on a
    /// slot already claimed by someone else, and the cards form a valid claim.
    pub fn is_valid_claim(&self, player: usize) -> bool {
        loop {
            let claimed: Vec<usize> = self.markers_of(player).iter().flatten().copied().collect();
            if claimed.len() != CLAIM_SIZE {
                return false;
            }
            let Ok(mut held) = self.acquire(&claimed, &[player]) else {
                return false;
            };
            let unchanged = held
                .markers(player)
                .map(|m| m.iter().copied().eq(claimed.iter().copied()))
                .unwrap_or(false);
            if !unchanged {
                // Markers moved between the read and the lock; look again.
                continue;
            }

            let mut cards = Vec::with_capacity(CLAIM_SIZE);
            for &slot in &claimed {
                match held.slot(slot) {
                    Ok(cell) if !cell.pending_removal => match cell.card {
                        Some(card) => cards.push(card),
                        None => return false,
                    },
                    _ => return false,
                }
            }
            return self.evaluator.is_valid(&cards);
        }
    }

    pub fn mark_pending_removal(&self, slot: usize) -> Result<(), BoardError> {
        let mut held = self.acquire(&[slot], &[])?;
        held.slot(slot)?.pending_removal = true;
        Ok(())
    }

    pub fn is_pending_removal(&self, slot: usize) -> bool {
        self.acquire(&[slot], &[])
            .and_then(|mut held| held.slot(slot).map(|c| c.pending_removal))
            .unwrap_or(false)
    }

    /// Remove every card flagged for removal, in slot order.
    pub fn sweep_pending_removals(&self) -> Vec<Card> {
        let mut removed = Vec::new();
        for slot in 0..self.slots.len() {
            let Ok(mut held) = self.acquire(&[slot], &self.all_players()) else {
                continue;
            };
            let flagged = held.slot(slot).map(|c| c.pending_removal).unwrap_or(false);
            if !flagged {
                continue;
            }
            match self.remove_held(&mut held, slot) {
                Ok(card) => removed.push(card),
                Err(err) => {
                    log::warn!("pending removal on slot {slot} failed: {err}");
                    if let Ok(cell) = held.slot(slot) {
                        cell.pending_removal = false;
                    }
                }
            }
        }
        removed
    }

    pub fn card_at(&self, slot: usize) -> Option<Card> {
        self.acquire(&[slot], &[]).ok().and_then(|mut held| held.slot(slot).ok()?.card)
    }

    pub fn slot_of(&self, card: Card) -> Option<usize> {
        let slot = self.card_slots.get(card.index())?.load(Ordering::Acquire);
        (slot != NO_SLOT).then_some(slot)
    }

    pub fn card_count(&self) -> usize {
        self.snapshot_cards().len()
    }

    /// Cards currently on the table, in slot order.
    pub fn snapshot_cards(&self) -> Vec<Card> {
        self.acquire(&self.all_slots(), &[])
            .map(|held| held.slots.iter().filter_map(|(_, cell)| cell.card).collect())
            .unwrap_or_default()
    }

    /// Every valid claim on the table, with sorted slots and card features.
    /// Each hint is also logged.
    pub fn hints(&self) -> Vec<Hint> {
        let cards = self.snapshot_cards();
        let hints: Vec<Hint> = self
            .evaluator
            .find_all(&cards, usize::MAX)
            .into_iter()
            .map(|claim| {
                let mut slots: Vec<usize> = claim.iter().filter_map(|&c| self.slot_of(c)).collect();
                slots.sort_unstable();
                Hint { slots, features: self.evaluator.features(&claim) }
            })
            .collect();
        for hint in &hints {
            log::info!("hint: set found: slots {:?} features {:?}", hint.slots, hint.features);
        }
        hints
    }
}
