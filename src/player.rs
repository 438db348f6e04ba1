//! Players: one thread per participant, plus a key-press generator thread for
//! bots.
//!
//! A player pulls slot presses from its capacity-3 intent queue and applies
//! them to the board. Once it holds a full claim it hands its id to the
//! dealer's [`ClaimQueue`] and waits on its own [`Latch`] for the verdict.
//! The dealer writes the score and cooldown only while the player waits, then
//! resolves the latch; the player then sits out the cooldown.

use crate::board::{Board, Toggle};
use crate::cards::CLAIM_SIZE;
use crate::dealer::ClaimQueue;
use crate::display::DisplaySink;
use crate::sync::{BoundedQueue, Closed, Latch, TryPushError};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// Longest single cooldown step between display refreshes.
const FREEZE_STEP: Duration = Duration::from_secs(1);

/// Who produces a player's key presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum AgentKind {
    Human,
    Bot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PlayerState {
    Active = 0,
    AwaitingVerification = 1,
    Frozen = 2,
    Terminated = 3,
}

impl PlayerState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => PlayerState::AwaitingVerification,
            2 => PlayerState::Frozen,
            3 => PlayerState::Terminated,
            _ => PlayerState::Active,
        }
    }
}

/// The dealer's answer to a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Point,
    Penalty,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum PressError {
    #[error("slot {0} is out of range")]
    SlotOutOfRange(usize),
    #[error("player {0} is out of range")]
    PlayerOutOfRange(usize),
    #[error("intent queue is full")]
    Full,
    #[error("player has terminated")]
    Closed,
}

impl From<Closed> for PressError {
    fn from(_: Closed) -> Self {
        PressError::Closed
    }
}

impl From<TryPushError> for PressError {
    fn from(e: TryPushError) -> Self {
        match e {
            TryPushError::Full => PressError::Full,
            TryPushError::Closed => PressError::Closed,
        }
    }
}

#[derive(Debug)]
struct CooldownState {
    remaining: Duration,
    closed: bool,
}

/// Remaining freeze time. Set by the dealer, run down by the player thread,
/// waited on by the bot generator.
#[derive(Debug)]
pub struct Cooldown {
    state: Mutex<CooldownState>,
    changed: Condvar,
}

impl Default for Cooldown {
    fn default() -> Self {
        Self {
            state: Mutex::new(CooldownState { remaining: Duration::ZERO, closed: false }),
            changed: Condvar::new(),
        }
    }
}

impl Cooldown {
    pub fn remaining(&self) -> Duration {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).remaining
    }

    fn set(&self, remaining: Duration) {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).remaining = remaining;
        self.changed.notify_all();
    }

    /// Sleep up to `step` unless closed meanwhile. Returns false if closed.
    fn sleep(&self, step: Duration) -> bool {
        let deadline = Instant::now() + step;
        let mut st = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if st.closed {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            st = self
                .changed
                .wait_timeout(st, deadline - now)
                .map(|(g, _)| g)
                .unwrap_or_else(|e| e.into_inner().0);
        }
    }

    /// Block until no cooldown is running. Returns false if closed.
    fn wait_thawed(&self) -> bool {
        let mut st = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        while !st.closed && !st.remaining.is_zero() {
            st = self.changed.wait(st).unwrap_or_else(PoisonError::into_inner);
        }
        !st.closed
    }

    fn close(&self) {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).closed = true;
        self.changed.notify_all();
    }
}

pub struct Player {
    id: usize,
    name: String,
    kind: AgentKind,
    board: Arc<Board>,
    claims: Arc<ClaimQueue>,
    display: Arc<dyn DisplaySink>,
    intents: BoundedQueue<usize>,
    verdict: Latch<Verdict>,
    cooldown: Cooldown,
    score: AtomicU32,
    state: AtomicU8,
    terminated: AtomicBool,
    // Set when a cooldown starts, cleared by the next placed marker.
    after_freeze: AtomicBool,
    point_freeze: Duration,
    penalty_freeze: Duration,
    bot_delay: Duration,
    seed: Option<u64>,
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("score", &self.score())
            .field("state", &self.state())
            .finish()
    }
}

/// Per-player settings taken from the game config.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct PlayerSettings {
    pub name: String,
    pub kind: AgentKind,
    pub point_freeze: Duration,
    pub penalty_freeze: Duration,
    pub bot_delay: Duration,
    pub seed: Option<u64>,
}

impl PlayerSettings {
    pub fn new(kind: AgentKind) -> Self {
        Self {
            name: String::new(),
            kind,
            point_freeze: Duration::from_secs(1),
            penalty_freeze: Duration::from_secs(3),
            bot_delay: Duration::ZERO,
            seed: None,
        }
    }

    pub fn with_freezes(mut self, point: Duration, penalty: Duration) -> Self {
        self.point_freeze = point;
        self.penalty_freeze = penalty;
        self
    }
}

impl Player {
    pub fn new(
        id: usize,
        settings: PlayerSettings,
        board: Arc<Board>,
        claims: Arc<ClaimQueue>,
        display: Arc<dyn DisplaySink>,
    ) -> Self {
        let name = if settings.name.is_empty() {
            format!("Player {}", id + 1)
        } else {
            settings.name
        };
        Self {
            id,
            name,
            kind: settings.kind,
            board,
            claims,
            display,
            intents: BoundedQueue::new(CLAIM_SIZE),
            verdict: Latch::new(),
            cooldown: Cooldown::default(),
            score: AtomicU32::new(0),
            state: AtomicU8::new(PlayerState::Active as u8),
            terminated: AtomicBool::new(false),
            after_freeze: AtomicBool::new(false),
            point_freeze: settings.point_freeze,
            penalty_freeze: settings.penalty_freeze,
            bot_delay: settings.bot_delay,
            seed: settings.seed,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    pub fn score(&self) -> u32 {
        self.score.load(Ordering::Acquire)
    }

    pub fn state(&self) -> PlayerState {
        PlayerState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn cooldown_remaining(&self) -> Duration {
        self.cooldown.remaining()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    fn set_state(&self, state: PlayerState) {
        // Terminated is final.
        let _ = self.state.fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
            (cur != PlayerState::Terminated as u8).then_some(state as u8)
        });
    }

    fn check_slot(&self, slot: usize) -> Result<(), PressError> {
        if slot >= self.board.table_size() {
            return Err(PressError::SlotOutOfRange(slot));
        }
        Ok(())
    }

    /// Queue a slot press, waiting while three presses are already pending.
    pub fn press(&self, slot: usize) -> Result<(), PressError> {
        self.check_slot(slot)?;
        Ok(self.intents.push(slot)?)
    }

    /// Queue a slot press without waiting.
    pub fn try_press(&self, slot: usize) -> Result<(), PressError> {
        self.check_slot(slot)?;
        Ok(self.intents.try_push(slot)?)
    }

    pub fn pending_presses(&self) -> usize {
        self.intents.len()
    }

    /// Called by the dealer while this player waits for its verdict.
    pub fn award_point(&self) {
        let score = self.score.fetch_add(1, Ordering::AcqRel) + 1;
        self.display.set_score(self.id, score);
        self.cooldown.set(self.point_freeze);
    }

    /// Called by the dealer while this player waits for its verdict.
    pub fn apply_penalty(&self) {
        self.cooldown.set(self.penalty_freeze);
    }

    /// Release the player from its verification wait. Called exactly once per
    /// claim, after [`award_point`](Self::award_point) or
    /// [`apply_penalty`](Self::apply_penalty).
    pub fn wake(&self, verdict: Verdict) {
        if !self.verdict.resolve(verdict) {
            log::debug!("player {} woken after termination", self.id);
        }
    }

    /// Stop the player. Every blocking wait it is in returns immediately.
    pub fn terminate(&self) {
        self.terminated.store(true, Ordering::Release);
        self.set_state(PlayerState::Terminated);
        self.intents.close();
        self.verdict.close();
        self.cooldown.close();
    }

    /// The player thread's main loop. Spawns and joins the bot generator for
    /// automated players.
    pub fn run(self: Arc<Self>) {
        log::info!("{} ({:?}) starting", self.name, self.kind);
        let generator = match self.kind {
            AgentKind::Bot => {
                let me = Arc::clone(&self);
                let spawned = thread::Builder::new()
                    .name(format!("bot-{}", self.id))
                    .spawn(move || me.generate_presses());
                match spawned {
                    Ok(handle) => Some(handle),
                    Err(err) => {
                        log::warn!("player {} could not start its generator: {err}", self.id);
                        None
                    }
                }
            }
            AgentKind::Human => None,
        };

        while !self.is_terminated() {
            let Some(slot) = self.intents.pop() else {
                break;
            };
            self.apply_press(slot);
            self.request_verification();
            self.freeze_remaining();
        }

        if let Some(handle) = generator {
            if handle.join().is_err() {
                log::warn!("player {} generator panicked", self.id);
            }
        }
        log::info!("{} terminated with score {}", self.name, self.score());
    }

    fn apply_press(&self, slot: usize) {
        match self.board.toggle_marker(self.id, slot) {
            Ok(Toggle::Placed) => self.after_freeze.store(false, Ordering::Release),
            Ok(_) => {}
            Err(err) => log::warn!("player {} press ignored: {err}", self.id),
        }
    }

    /// Submit a full claim to the dealer and wait for the verdict. Returns
    /// `None` when no claim was due or the game ended first.
    pub(crate) fn request_verification(&self) -> Option<Verdict> {
        if self.is_terminated()
            || self.after_freeze.load(Ordering::Acquire)
            || self.board.marker_count(self.id) != CLAIM_SIZE
        {
            return None;
        }
        self.verdict.arm();
        self.set_state(PlayerState::AwaitingVerification);
        if self.claims.submit(self.id).is_err() {
            self.set_state(PlayerState::Active);
            return None;
        }
        let verdict = self.verdict.wait();
        match verdict {
            Some(v) => log::debug!("player {} verdict: {v:?}", self.id),
            None => log::debug!("player {} stopped waiting for a verdict", self.id),
        }
        self.set_state(PlayerState::Active);
        verdict
    }

    /// Sit out any cooldown the dealer assigned, refreshing the display at
    /// most once per second.
    fn freeze_remaining(&self) {
        let mut remaining = self.cooldown.remaining();
        if remaining.is_zero() || self.is_terminated() {
            return;
        }
        self.after_freeze.store(true, Ordering::Release);
        self.set_state(PlayerState::Frozen);
        while !remaining.is_zero() {
            self.display.set_cooldown(self.id, remaining);
            let step = remaining.min(FREEZE_STEP);
            if !self.cooldown.sleep(step) {
                log::info!("player {} cooldown cut short by termination", self.id);
                return;
            }
            remaining -= step;
            self.cooldown.set(remaining);
        }
        self.cooldown.set(Duration::ZERO);
        self.display.set_cooldown(self.id, Duration::ZERO);
        self.set_state(PlayerState::Active);
    }

    fn rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed ^ (self.id as u64).rotate_left(32)),
            None => {
                let mut seed = [0u8; 32];
                rand::rng().fill_bytes(&mut seed);
                ChaCha8Rng::from_seed(seed)
            }
        }
    }

    /// Bot generator loop: uniformly random presses, paused while frozen and
    /// while the intent queue is full.
    fn generate_presses(&self) {
        let mut rng = self.rng();
        let slots = self.board.table_size();
        while !self.is_terminated() {
            if !self.cooldown.wait_thawed() {
                break;
            }
            if !self.bot_delay.is_zero() && !self.cooldown.sleep(self.bot_delay) {
                break;
            }
            let slot = rng.random_range(0..slots);
            if self.intents.push(slot).is_err() {
                break;
            }
        }
        log::debug!("bot generator {} stopped", self.id);
    }
}
