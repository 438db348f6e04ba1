mod common;

use common::{config, eventually, invalid_triple, rig};
use set_rs::cards::Card;
use set_rs::deck::Deck;
use set_rs::display::{DisplayEvent, Recorder};
use set_rs::evaluator::FeatureEvaluator;
use set_rs::game::Game;
use set_rs::player::{PlayerState, Verdict};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const WAIT: Duration = Duration::from_secs(5);

fn start(game: Game) -> thread::JoinHandle<set_rs::game::Outcome> {
    thread::spawn(move || game.run().unwrap())
}

#[test]
fn deal_fills_twelve_slots_from_a_full_deck() {
    let mut game = Game::new(
        config(2, 2),
        Arc::new(FeatureEvaluator::standard()),
        Arc::new(Recorder::new()),
    )
    .unwrap();
    assert_eq!(game.dealer_mut().deal(), 12);
    assert_eq!(game.dealer_mut().deck().len(), 69);

    let board = Arc::clone(game.board());
    assert_eq!(board.card_count(), 12);
    let mut seen = HashSet::new();
    for slot in 0..12 {
        let card = board.card_at(slot).unwrap();
        assert!(seen.insert(card));
        assert_eq!(board.slot_of(card), Some(slot));
    }
    assert!(game.dealer_mut().deck().cards().iter().all(|c| board.slot_of(*c).is_none()));
}

#[test]
fn valid_claim_scores_and_refills_slots() {
    // Cards 0..9 share their first two features, and any six of them hold a
    // claim, so the opening table always has one and three cards stay for refill.
    let mut cfg = config(1, 1);
    cfg.table_size = 6;
    let display = Arc::new(Recorder::new());
    let game = Game::new(cfg, Arc::new(FeatureEvaluator::standard()), display.clone())
        .unwrap()
        .with_deck(Deck::from_cards((0..9).map(Card::new)));
    let board = Arc::clone(game.board());
    let handle = game.handle();
    let player = Arc::clone(&game.players()[0]);
    let running = start(game);

    assert!(eventually(WAIT, || board.card_count() == 6));
    let hint = board.hints().into_iter().next().expect("six cards of one plane hold a claim");
    let before: Vec<Card> = hint.slots.iter().filter_map(|&s| board.card_at(s)).collect();
    for &slot in &hint.slots {
        handle.press(0, slot).unwrap();
    }

    assert!(eventually(WAIT, || player.score() == 1));
    assert!(eventually(WAIT, || {
        hint.slots.iter().all(|&s| board.card_at(s).is_some_and(|c| !before.contains(&c)))
    }));
    assert!(before.iter().all(|c| board.slot_of(*c).is_none()));
    assert_eq!(board.marker_count(0), 0);

    handle.stop();
    let outcome = running.join().unwrap();
    assert_eq!(outcome.scores, vec![1]);
    assert_eq!(outcome.winners, vec![0]);
    assert!(display.events().contains(&DisplayEvent::Score { player: 0, score: 1 }));
}

#[test]
fn invalid_claim_freezes_and_keeps_markers() {
    let display = Arc::new(Recorder::new());
    let game =
        Game::new(config(1, 1), Arc::new(FeatureEvaluator::standard()), display.clone()).unwrap();
    let board = Arc::clone(game.board());
    let handle = game.handle();
    let player = Arc::clone(&game.players()[0]);
    let running = start(game);

    assert!(eventually(WAIT, || board.card_count() == 12));
    let triple = invalid_triple(&board).unwrap();
    for slot in triple {
        handle.press(0, slot).unwrap();
    }

    assert!(eventually(WAIT, || {
        display.events().iter().any(|e| {
            matches!(e, DisplayEvent::Cooldown { player: 0, remaining } if !remaining.is_zero())
        })
    }));
    assert_eq!(player.score(), 0);
    assert_eq!(board.markers_of(0), triple.map(Some));

    assert!(eventually(WAIT, || player.state() == PlayerState::Active
        && player.cooldown_remaining().is_zero()));
    assert_eq!(board.marker_count(0), 3);
    handle.press(0, triple[0]).unwrap();
    assert!(eventually(WAIT, || board.marker_count(0) == 2));
    assert_eq!(player.score(), 0);

    handle.stop();
    running.join().unwrap();
}

#[test]
fn game_ends_once_no_claim_remains() {
    // 0, 1, 2 is the only claim; card 4 cannot complete another.
    let mut cfg = config(1, 1);
    cfg.turn_timeout_ms = 60_000;
    let game = Game::new(cfg, Arc::new(FeatureEvaluator::standard()), Arc::new(Recorder::new()))
        .unwrap()
        .with_deck(Deck::from_cards([0, 1, 2, 4].map(Card::new)));
    let board = Arc::clone(game.board());
    let handle = game.handle();
    let started = Instant::now();
    let running = start(game);

    assert!(eventually(WAIT, || board.card_count() == 4));
    let slots: Vec<usize> =
        [0, 1, 2].iter().filter_map(|&c| board.slot_of(Card::new(c))).collect();
    assert_eq!(slots.len(), 3);
    for slot in slots {
        handle.press(0, slot).unwrap();
    }

    let outcome = running.join().unwrap();
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(outcome.scores, vec![1]);
}

#[test]
fn game_without_any_claim_ends_immediately() {
    let game = Game::new(config(2, 0), Arc::new(FeatureEvaluator::standard()), Arc::new(Recorder::new()))
        .unwrap()
        .with_deck(Deck::from_cards([0, 1, 3].map(Card::new)));
    let started = Instant::now();
    let outcome = game.run().unwrap();
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(outcome.scores, vec![0, 0]);
    assert_eq!(outcome.winners, vec![0, 1]);
}

#[test]
fn overlapping_claims_first_wins_second_is_stale() {
    let mut r = rig(2, &[0, 1, 2, 3, 6]);
    assert_eq!(r.dealer.deal(), 5);
    for slot in [0, 1, 2] {
        r.board.toggle_marker(0, slot).unwrap();
    }
    for slot in [0, 3, 4] {
        r.board.toggle_marker(1, slot).unwrap();
    }
    // Both claims hold on their own.
    assert!(r.board.is_valid_claim(0));
    assert!(r.board.is_valid_claim(1));

    r.claims.submit(0).unwrap();
    r.claims.submit(1).unwrap();
    assert_eq!(r.dealer.verify_claims(), vec![(0, Verdict::Point), (1, Verdict::Penalty)]);
    assert_eq!(r.players[0].score(), 1);
    assert_eq!(r.players[1].score(), 0);
    assert!(r.board.is_pending_removal(0));

    let mut removed = r.dealer.sweep();
    removed.sort();
    assert_eq!(removed, [0, 1, 2].map(Card::new));
    assert_eq!(r.board.markers_of(1), [Some(3), Some(4), None]);
    assert_eq!(r.board.card_count(), 2);
    assert!(r.display.events().contains(&DisplayEvent::HideMarker { player: 1, slot: 0 }));
}
