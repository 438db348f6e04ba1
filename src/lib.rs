//! set-rs: a real-time, multi-threaded engine for the card game Set
//!
//! Goals:
//! - One dealer thread and one thread per player sharing a lock-ordered board
//! - Claims verified strictly in submission order, with point and penalty freezes
//! - Pluggable claim rules ([`evaluator::SetEvaluator`]) and front ends ([`display::DisplaySink`])
//! - No panics for invalid input; use `Result` for recoverable errors
//!
//! ## Quick start: check a claim
//! ```
//! use set_rs::cards::Card;
//! use set_rs::evaluator::{FeatureEvaluator, SetEvaluator};
//!
//! let eval = FeatureEvaluator::standard();
//! // 0000, 0001, 0002: three features equal, one all different.
//! assert!(eval.is_valid(&[Card::new(0), Card::new(1), Card::new(2)]));
//! assert!(!eval.is_valid(&[Card::new(0), Card::new(1), Card::new(3)]));
//! ```
//!
//! ## TUI
//! Run the interactive TUI with:
//! ```sh
//! cargo run --bin set-rs
//! ```

pub mod board;
pub mod cards;
pub mod config;
pub mod dealer;
pub mod deck;
pub mod display;
pub mod evaluator;
pub mod game;
pub mod player;
pub mod sync;
pub mod tui;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
