use crate::cards::Card;
use crate::evaluator::SetEvaluator;
use crate::game::GameHandle;
use crate::player::PressError;
use crate::tui::view::{TableView, TuiDisplay};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Keys for player 1 and player 2, one per slot in row-major order.
pub const KEYMAPS: [[char; 12]; 2] = [
    ['q', 'w', 'e', 'r', 'a', 's', 'd', 'f', 'z', 'x', 'c', 'v'],
    ['u', 'i', 'o', 'p', 'j', 'k', 'l', ';', 'm', ',', '.', '/'],
];

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{0} keyboard players requested, the terminal has keys for {max}", max = KEYMAPS.len())]
pub struct TooManyHumans(pub usize);

/// Every human player needs its own key map.
pub fn check_keyboard_players(humans: usize) -> Result<(), TooManyHumans> {
    if humans > KEYMAPS.len() {
        return Err(TooManyHumans(humans));
    }
    Ok(())
}

/// High-level input actions for the TUI controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum InputAction {
    Press { player: usize, slot: usize },
    ToggleHelp,
    Quit,
}

/// Map a typed character to a slot press for one of the keyboard players.
pub fn action_for_char(c: char, humans: usize) -> Option<InputAction> {
    let c = c.to_ascii_lowercase();
    KEYMAPS.iter().take(humans).enumerate().find_map(|(player, keys)| {
        keys.iter().position(|&k| k == c).map(|slot| InputAction::Press { player, slot })
    })
}

/// One character per feature value in base 36 (`0`-`9`, then `a`-`z`). Values
/// of 36 and above are written in decimal and joined with `.`.
pub fn feature_label(features: &[u8]) -> String {
    let compact: Option<String> =
        features.iter().map(|&d| char::from_digit(u32::from(d), 36)).collect();
    compact.unwrap_or_else(|| {
        features.iter().map(u8::to_string).collect::<Vec<_>>().join(".")
    })
}

#[non_exhaustive]
pub struct AppState {
    pub names: Vec<String>,
    pub humans: usize,
    pub started: Instant,
    display: Arc<TuiDisplay>,
    evaluator: Arc<dyn SetEvaluator>,
    handle: GameHandle,
    help_open: bool,
    quit: bool,
    game_over: bool,
    press_error: Option<String>,
    press_error_at: Option<Instant>,
}

impl AppState {
    const PRESS_ERROR_TTL: Duration = Duration::from_secs(2);

    pub fn new(
        names: Vec<String>,
        humans: usize,
        display: Arc<TuiDisplay>,
        evaluator: Arc<dyn SetEvaluator>,
        handle: GameHandle,
    ) -> Self {
        Self {
            names,
            humans: humans.min(KEYMAPS.len()),
            started: Instant::now(),
            display,
            evaluator,
            handle,
            help_open: false,
            quit: false,
            game_over: false,
            press_error: None,
            press_error_at: None,
        }
    }

    pub fn view(&self) -> TableView {
        self.display.snapshot()
    }

    /// Feature digits of a card, e.g. `0120`. See [`feature_label`].
    pub fn card_label(&self, card: Card) -> String {
        let features = self.evaluator.features(&[card]);
        features.first().map(|f| feature_label(f)).unwrap_or_default()
    }

    pub fn help_open(&self) -> bool {
        self.help_open
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn game_over(&self) -> bool {
        self.game_over
    }

    pub fn set_game_over(&mut self) {
        self.game_over = true;
    }

    pub fn press_error(&self) -> Option<&str> {
        self.press_error.as_deref()
    }

    /// Drop stale error messages.
    pub fn on_tick(&mut self) {
        if let Some(at) = self.press_error_at {
            if at.elapsed() >= Self::PRESS_ERROR_TTL {
                self.press_error = None;
                self.press_error_at = None;
            }
        }
    }

    fn report(&mut self, msg: String) {
        self.press_error = Some(msg);
        self.press_error_at = Some(Instant::now());
    }

    /// Apply an input. Returns true when a press reached a player's queue.
    pub fn handle_input(&mut self, action: InputAction) -> bool {
        match action {
            InputAction::Quit => {
                if !self.game_over {
                    self.handle.stop();
                }
                self.quit = true;
                false
            }
            InputAction::ToggleHelp => {
                self.help_open = !self.help_open;
                false
            }
            InputAction::Press { .. } if self.help_open || self.game_over => false,
            InputAction::Press { player, slot } => {
                // The render loop must not block, so a full queue drops the press.
                match self.handle.try_press(player, slot) {
                    Ok(()) => true,
                    Err(PressError::Full) => {
                        log::debug!("player {player} press on slot {slot} dropped, queue full");
                        false
                    }
                    Err(err) => {
                        self.report(format!("P{}: {err}", player + 1));
                        false
                    }
                }
            }
        }
    }
}
