//! Terminal front end: a [`view::TuiDisplay`] sink fed by the game threads,
//! key handling in [`app`], and a Ratatui render loop in [`controller`].

pub mod app;
pub mod controller;
pub mod ui;
pub mod view;
