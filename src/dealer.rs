//! The dealer: deals, runs the round countdown, verifies claims in arrival
//! order and ends the game.
//!
//! Claims reach the dealer through [`ClaimQueue`], which has its own lock and
//! condition variable. The dealer's per-tick sleep is a timed wait on that
//! condition, so a submitted claim wakes it at once and board locks are never
//! involved in waking it.

use crate::board::Board;
use crate::cards::Card;
use crate::config::Config;
use crate::deck::Deck;
use crate::display::DisplaySink;
use crate::game::GameError;
use crate::player::{Player, Verdict};
use crate::sync::Closed;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Tick outside the warning window.
pub const TICK: Duration = Duration::from_secs(1);
/// Tick inside the warning window.
pub const WARNING_TICK: Duration = Duration::from_millis(10);

#[derive(Debug, Default)]
struct ClaimState {
    pending: VecDeque<usize>,
    closed: bool,
    wakeups: u64,
}

/// FIFO of player ids waiting for verification. Many players submit, only the
/// dealer drains.
#[derive(Debug, Default)]
pub struct ClaimQueue {
    state: Mutex<ClaimState>,
    changed: Condvar,
}

impl ClaimQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ClaimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue `player` and wake the dealer.
    pub fn submit(&self, player: usize) -> Result<(), Closed> {
        let mut st = self.lock();
        if st.closed {
            return Err(Closed);
        }
        st.pending.push_back(player);
        drop(st);
        self.changed.notify_all();
        Ok(())
    }

    /// Take every pending claim, oldest first.
    pub fn drain(&self) -> Vec<usize> {
        self.lock().pending.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    /// Wake a sleeping dealer without submitting anything.
    pub fn notify(&self) {
        self.lock().wakeups += 1;
        self.changed.notify_all();
    }

    /// Refuse further submissions. Already queued claims stay drainable.
    pub fn close(&self) {
        self.lock().closed = true;
        self.changed.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Sleep up to `timeout`, returning early when a claim is pending or
    /// someone calls [`notify`](Self::notify). Returns true on an early wake.
    pub fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut st = self.lock();
        let seen = st.wakeups;
        loop {
            if !st.pending.is_empty() || st.wakeups != seen {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            st = self
                .changed
                .wait_timeout(st, deadline - now)
                .map(|(g, _)| g)
                .unwrap_or_else(|e| e.into_inner().0);
        }
    }
}

/// Final scores and the players sharing the best one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub scores: Vec<u32>,
    pub winners: Vec<usize>,
}

pub struct Dealer {
    board: Arc<Board>,
    players: Vec<Arc<Player>>,
    claims: Arc<ClaimQueue>,
    display: Arc<dyn DisplaySink>,
    deck: Deck,
    rng: ChaCha8Rng,
    stop: Arc<AtomicBool>,
    deadline: Instant,
    turn_timeout: Duration,
    warning: Duration,
    hints: bool,
}

impl std::fmt::Debug for Dealer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dealer")
            .field("deck", &self.deck.len())
            .field("players", &self.players.len())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

impl Dealer {
    pub fn new(
        config: &Config,
        board: Arc<Board>,
        players: Vec<Arc<Player>>,
        claims: Arc<ClaimQueue>,
        display: Arc<dyn DisplaySink>,
        stop: Arc<AtomicBool>,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => {
                let mut seed = [0u8; 32];
                rand::rng().fill_bytes(&mut seed);
                ChaCha8Rng::from_seed(seed)
            }
        };
        Self {
            board,
            players,
            claims,
            display,
            deck: Deck::full(config.deck_size),
            rng,
            stop,
            deadline: Instant::now() + config.turn_timeout(),
            turn_timeout: config.turn_timeout(),
            warning: config.turn_timeout_warning(),
            hints: config.hints,
        }
    }

    /// Replace the deck, e.g. to play a fixed set of cards.
    pub fn with_deck(mut self, deck: Deck) -> Self {
        self.deck = deck;
        self
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn board(&self) -> &Arc<Board> {
        &self.board
    }

    pub fn players(&self) -> &[Arc<Player>] {
        &self.players
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Raise the global stop flag and wake the dealer.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
        self.claims.notify();
    }

    pub fn shuffle(&mut self) {
        self.deck.shuffle_with(&mut self.rng);
    }

    /// Fill every empty slot from the front of the deck. Returns the number of
    /// cards dealt.
    pub fn deal(&mut self) -> usize {
        let mut dealt = 0;
        for slot in 0..self.board.table_size() {
            if self.board.card_at(slot).is_some() {
                continue;
            }
            let Some(card) = self.deck.draw() else {
                break;
            };
            match self.board.place_card(card, slot) {
                Ok(()) => dealt += 1,
                Err(err) => {
                    log::warn!("could not deal {card} to slot {slot}: {err}");
                    self.deck.put_back(card);
                }
            }
        }
        if dealt > 0 {
            log::debug!("dealt {dealt} cards, {} left in deck", self.deck.len());
            if self.hints {
                self.board.hints();
            }
        }
        dealt
    }

    /// Serve every queued claim in arrival order. Each claimant gets exactly one
    /// award or penalty and exactly one wake-up.
    pub fn verify_claims(&mut self) -> Vec<(usize, Verdict)> {
        let mut served = Vec::new();
        for id in self.claims.drain() {
            let Some(player) = self.players.get(id).cloned() else {
                log::warn!("claim from unknown player {id}");
                continue;
            };
            let verdict = if self.board.is_valid_claim(id) {
                for slot in self.board.markers_of(id).into_iter().flatten() {
                    if let Err(err) = self.board.mark_pending_removal(slot) {
                        log::warn!("cannot flag slot {slot}: {err}");
                    }
                }
                player.award_point();
                self.update_countdown(true);
                Verdict::Point
            } else {
                player.apply_penalty();
                Verdict::Penalty
            };
            log::info!("{}: {verdict:?}", player.name());
            player.wake(verdict);
            served.push((id, verdict));
        }
        served
    }

    /// Physically remove the cards of accepted claims.
    pub fn sweep(&self) -> Vec<Card> {
        self.board.sweep_pending_removals()
    }

    fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    fn in_warning(&self) -> bool {
        self.remaining() < self.warning
    }

    /// Refresh the countdown display, restarting it first when `reset`.
    /// Outside the warning window the time is rounded up to whole seconds.
    pub fn update_countdown(&mut self, reset: bool) {
        if reset {
            self.deadline = Instant::now() + self.turn_timeout;
        }
        let left = self.remaining();
        let warning = left < self.warning;
        let shown = if warning {
            left
        } else {
            let secs = left.as_millis().div_ceil(1000);
            Duration::from_secs(secs as u64)
        };
        self.display.set_countdown(shown, warning);
    }

    /// Sleep one tick, or less if a claim arrives. Returns true on an early wake.
    pub fn sleep_until_woken_or_timeout(&self) -> bool {
        let tick = if self.in_warning() { WARNING_TICK } else { TICK };
        let tick = tick.min(self.remaining().max(Duration::from_millis(1)));
        let woken = self.claims.wait(tick);
        if woken {
            log::trace!("dealer woken early");
        }
        woken
    }

    /// Deck is empty and nothing on the table forms a claim.
    pub fn claims_exhausted(&self) -> bool {
        self.deck.is_empty() && !self.board.evaluator().any_valid(&self.board.snapshot_cards())
    }

    /// Stop requested, or the deck and table together hold no claim.
    pub fn should_finish(&self) -> bool {
        if self.is_stopped() {
            return true;
        }
        let mut all = self.deck.cards();
        all.extend(self.board.snapshot_cards());
        !self.board.evaluator().any_valid(&all)
    }

    /// Return every card on the table to the deck.
    pub fn clear_board(&mut self) -> usize {
        let mut cleared = 0;
        for slot in 0..self.board.table_size() {
            if self.board.card_at(slot).is_none() {
                continue;
            }
            match self.board.remove_card(slot) {
                Ok(card) => {
                    self.deck.put_back(card);
                    cleared += 1;
                }
                Err(err) => log::warn!("could not clear slot {slot}: {err}"),
            }
        }
        cleared
    }

    fn round(&mut self) {
        self.update_countdown(true);
        while (!self.is_stopped() || !self.claims.is_empty()) && Instant::now() < self.deadline {
            self.verify_claims();
            self.sweep();
            self.deal();
            self.sleep_until_woken_or_timeout();
            self.update_countdown(false);
            if self.claims_exhausted() {
                log::info!("no claims left on the table, ending the game");
                self.stop.store(true, Ordering::Release);
            }
        }
    }

    /// Player ids with the highest score, in id order.
    pub fn winners(&self) -> Vec<usize> {
        let best = self.players.iter().map(|p| p.score()).max().unwrap_or(0);
        self.players.iter().filter(|p| p.score() == best).map(|p| p.id()).collect()
    }

    fn spawn_players(&self) -> Result<Vec<JoinHandle<()>>, GameError> {
        let mut handles = Vec::with_capacity(self.players.len());
        for player in &self.players {
            let name = format!("player-{}", player.id());
            let me = Arc::clone(player);
            match thread::Builder::new().name(name.clone()).spawn(move || me.run()) {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    self.terminate_players();
                    join_all(handles);
                    return Err(GameError::Spawn { name, source });
                }
            }
        }
        Ok(handles)
    }

    fn terminate_players(&self) {
        for player in self.players.iter().rev() {
            player.terminate();
        }
    }

    /// Play the whole game on the calling thread: start the players, deal
    /// rounds until the game is over, announce the winners and wait for every
    /// player thread to finish.
    pub fn run(mut self) -> Result<Outcome, GameError> {
        let handles = self.spawn_players()?;
        log::info!("game started with {} players", self.players.len());

        while !self.should_finish() {
            self.shuffle();
            self.deal();
            self.round();
            self.update_countdown(true);
            self.clear_board();
        }

        // Late claims are refused; claims already queued still get an answer.
        self.claims.close();
        self.verify_claims();

        let winners = self.winners();
        log::info!("game over, winners: {winners:?}");
        self.display.announce_winners(&winners);
        self.terminate_players();
        join_all(handles);

        let scores = self.players.iter().map(|p| p.score()).collect();
        Ok(Outcome { scores, winners })
    }
}

fn join_all(handles: Vec<JoinHandle<()>>) {
    for handle in handles.into_iter().rev() {
        let name = handle.thread().name().unwrap_or("player").to_string();
        if handle.join().is_err() {
            log::warn!("{name} panicked");
        }
    }
}
