#![allow(dead_code)]

use set_rs::board::Board;
use set_rs::cards::Card;
use set_rs::config::Config;
use set_rs::dealer::{ClaimQueue, Dealer};
use set_rs::deck::Deck;
use set_rs::display::{DisplaySink, Recorder};
use set_rs::evaluator::{FeatureEvaluator, SetEvaluator};
use set_rs::player::{AgentKind, Player, PlayerSettings};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Poll `check` until it holds or `timeout` passes.
pub fn eventually(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    check()
}

pub fn config(players: usize, humans: usize) -> Config {
    let mut cfg = Config::default();
    cfg.players = players;
    cfg.human_players = humans;
    cfg.point_freeze_ms = 50;
    cfg.penalty_freeze_ms = 300;
    cfg.seed = Some(7);
    cfg
}

/// Dealer, board and idle players wired by hand so tests drive every phase.
pub struct Rig {
    pub board: Arc<Board>,
    pub claims: Arc<ClaimQueue>,
    pub players: Vec<Arc<Player>>,
    pub display: Arc<Recorder>,
    pub dealer: Dealer,
}

pub fn rig(players: usize, deck: &[u16]) -> Rig {
    let cfg = config(players, players);
    let display = Arc::new(Recorder::new());
    let sink: Arc<dyn DisplaySink> = display.clone();
    let evaluator: Arc<dyn SetEvaluator> = Arc::new(FeatureEvaluator::standard());
    let board =
        Arc::new(Board::new(cfg.table_size, cfg.deck_size, players, evaluator, Arc::clone(&sink)));
    let claims = Arc::new(ClaimQueue::new());
    let players: Vec<Arc<Player>> = (0..players)
        .map(|id| {
            Arc::new(Player::new(
                id,
                PlayerSettings::new(AgentKind::Human),
                Arc::clone(&board),
                Arc::clone(&claims),
                Arc::clone(&sink),
            ))
        })
        .collect();
    let dealer = Dealer::new(
        &cfg,
        Arc::clone(&board),
        players.clone(),
        Arc::clone(&claims),
        sink,
        Arc::new(AtomicBool::new(false)),
    )
    .with_deck(Deck::from_cards(deck.iter().copied().map(Card::new)));
    Rig { board, claims, players, display, dealer }
}

/// Slots of the first three table cards that do not form a claim.
pub fn invalid_triple(board: &Board) -> Option<[usize; 3]> {
    let slots: Vec<usize> = (0..board.table_size()).filter(|&s| board.card_at(s).is_some()).collect();
    for (i, &a) in slots.iter().enumerate() {
        for (j, &b) in slots.iter().enumerate().skip(i + 1) {
            for &c in slots.iter().skip(j + 1) {
                let cards: Vec<Card> = [a, b, c].iter().filter_map(|&s| board.card_at(s)).collect();
                if !board.evaluator().is_valid(&cards) {
                    return Some([a, b, c]);
                }
            }
        }
    }
    None
}
