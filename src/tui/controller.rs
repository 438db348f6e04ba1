use crate::tui::app::{action_for_char, AppState, InputAction};
use crate::tui::ui;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::prelude::{CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Render and read keys until the player quits. `game` is the thread running
/// the dealer; once it finishes the final scores stay on screen until Esc.
pub fn run<T>(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut AppState,
    game: &JoinHandle<T>,
    tick_rate: Duration,
) -> io::Result<()> {
    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && handle_key(app, key.code) {
                    break;
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            if game.is_finished() && !app.game_over() {
                app.set_game_over();
            }
            app.on_tick();
            last_tick = Instant::now();
        }
    }
    Ok(())
}

/// Returns true when the controller should exit.
pub fn handle_key(app: &mut AppState, code: KeyCode) -> bool {
    match code {
        KeyCode::Esc if app.help_open() => {
            let _ = app.handle_input(InputAction::ToggleHelp);
        }
        KeyCode::Esc => {
            let _ = app.handle_input(InputAction::Quit);
        }
        KeyCode::Char('?') => {
            let _ = app.handle_input(InputAction::ToggleHelp);
        }
        KeyCode::Char(c) => {
            if let Some(action) = action_for_char(c, app.humans) {
                let _ = app.handle_input(action);
            }
        }
        _ => {}
    }
    app.should_quit()
}
