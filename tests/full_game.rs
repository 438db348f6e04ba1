mod common;

use common::{config, eventually};
use set_rs::display::Recorder;
use set_rs::evaluator::FeatureEvaluator;
use set_rs::game::Game;
use set_rs::player::PlayerState;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn bots_play_until_stopped_and_every_thread_exits() {
    let mut cfg = config(4, 0);
    cfg.point_freeze_ms = 10;
    cfg.penalty_freeze_ms = 20;
    cfg.bot_delay_ms = 1;
    let display = Arc::new(Recorder::new());
    let game = Game::new(cfg, Arc::new(FeatureEvaluator::standard()), display.clone()).unwrap();
    let handle = game.handle();
    let board = Arc::clone(game.board());
    let players = game.players().to_vec();
    let running = thread::spawn(move || game.run().unwrap());

    assert!(eventually(Duration::from_secs(5), || board.card_count() > 0));
    thread::sleep(Duration::from_millis(300));
    handle.stop();

    let started = Instant::now();
    let outcome = running.join().unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));

    assert_eq!(outcome.scores.len(), 4);
    let best = outcome.scores.iter().copied().max().unwrap();
    let expected: Vec<usize> = (0..4).filter(|&p| outcome.scores[p] == best).collect();
    assert_eq!(outcome.winners, expected);
    assert_eq!(display.winners(), vec![expected]);
    assert!(players.iter().all(|p| p.is_terminated() && p.state() == PlayerState::Terminated));
    assert!(players.iter().all(|p| p.pending_presses() == 0));
    for (p, score) in players.iter().zip(&outcome.scores) {
        assert_eq!(p.score(), *score);
    }
}

#[test]
fn stop_before_start_ends_without_a_round() {
    let game = Game::new(config(2, 2), Arc::new(FeatureEvaluator::standard()), Arc::new(Recorder::new()))
        .unwrap();
    game.handle().stop();
    let started = Instant::now();
    let outcome = game.run().unwrap();
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(outcome.scores, vec![0, 0]);
    assert_eq!(outcome.winners, vec![0, 1]);
}

#[test]
fn short_turn_timeout_reshuffles_the_table() {
    let mut cfg = config(1, 1);
    cfg.turn_timeout_ms = 100;
    cfg.turn_timeout_warning_ms = 50;
    let display = Arc::new(Recorder::new());
    let game = Game::new(cfg, Arc::new(FeatureEvaluator::standard()), display.clone()).unwrap();
    let handle = game.handle();
    let running = thread::spawn(move || game.run().unwrap());

    // Each round deals twelve cards; a reshuffle deals twelve again.
    let deals = || {
        display
            .events()
            .iter()
            .filter(|e| matches!(e, set_rs::display::DisplayEvent::ShowCard { .. }))
            .count()
    };
    assert!(eventually(Duration::from_secs(5), || deals() >= 24));
    let warned = display.events().iter().any(|e| {
        matches!(e, set_rs::display::DisplayEvent::Countdown { warning: true, .. })
    });
    assert!(warned);
    handle.stop();
    running.join().unwrap();
}
