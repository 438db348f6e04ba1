use crate::board::Board;
use crate::config::{Config, ConfigError};
use crate::deck::Deck;
use crate::dealer::{ClaimQueue, Dealer};
use crate::display::DisplaySink;
use crate::evaluator::SetEvaluator;
use crate::player::{AgentKind, Player, PlayerSettings, PressError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use crate::dealer::Outcome;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum GameError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot start thread {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// A fully wired game: board, players and dealer built from one [`Config`].
///
/// ```
/// use std::sync::Arc;
/// use set_rs::config::Config;
/// use set_rs::display::NullDisplay;
/// use set_rs::evaluator::FeatureEvaluator;
/// use set_rs::game::Game;
///
/// let mut game = Game::new(
///     Config::default(),
///     Arc::new(FeatureEvaluator::standard()),
///     Arc::new(NullDisplay),
/// ).unwrap();
/// assert_eq!(game.dealer_mut().deal(), 12);
/// assert_eq!(game.board().card_count(), 12);
/// ```
#[derive(Debug)]
pub struct Game {
    config: Config,
    board: Arc<Board>,
    claims: Arc<ClaimQueue>,
    players: Vec<Arc<Player>>,
    stop: Arc<AtomicBool>,
    dealer: Dealer,
}

impl Game {
    pub fn new(
        config: Config,
        evaluator: Arc<dyn SetEvaluator>,
        display: Arc<dyn DisplaySink>,
    ) -> Result<Self, GameError> {
        config.validate()?;
        let board = Arc::new(
            Board::new(
                config.table_size,
                config.deck_size,
                config.players,
                evaluator,
                Arc::clone(&display),
            )
            .with_delay(config.table_delay()),
        );
        let claims = Arc::new(ClaimQueue::new());
        let players: Vec<Arc<Player>> = (0..config.players)
            .map(|id| {
                let kind = if config.is_human(id) { AgentKind::Human } else { AgentKind::Bot };
                let mut settings = PlayerSettings::new(kind)
                    .with_freezes(config.point_freeze(), config.penalty_freeze());
                settings.name = config.player_name(id);
                settings.bot_delay = config.bot_delay();
                settings.seed = config.seed;
                Arc::new(Player::new(
                    id,
                    settings,
                    Arc::clone(&board),
                    Arc::clone(&claims),
                    Arc::clone(&display),
                ))
            })
            .collect();
        let stop = Arc::new(AtomicBool::new(false));
        let dealer = Dealer::new(
            &config,
            Arc::clone(&board),
            players.clone(),
            Arc::clone(&claims),
            display,
            Arc::clone(&stop),
        );
        Ok(Self { config, board, claims, players, stop, dealer })
    }

    /// Play with a fixed deck instead of the full one. The deck is still
    /// shuffled at the start of every round.
    pub fn with_deck(mut self, deck: Deck) -> Self {
        self.dealer = self.dealer.with_deck(deck);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn board(&self) -> &Arc<Board> {
        &self.board
    }

    pub fn players(&self) -> &[Arc<Player>] {
        &self.players
    }

    pub fn dealer_mut(&mut self) -> &mut Dealer {
        &mut self.dealer
    }

    pub fn handle(&self) -> GameHandle {
        GameHandle {
            players: self.players.clone(),
            claims: Arc::clone(&self.claims),
            stop: Arc::clone(&self.stop),
        }
    }

    /// Run to completion on the calling thread.
    pub fn run(self) -> Result<Outcome, GameError> {
        self.dealer.run()
    }
}

/// Outside access to a running game: key presses for human players and the
/// stop switch.
#[derive(Debug, Clone)]
pub struct GameHandle {
    players: Vec<Arc<Player>>,
    claims: Arc<ClaimQueue>,
    stop: Arc<AtomicBool>,
}

impl GameHandle {
    fn player(&self, player: usize) -> Result<&Arc<Player>, PressError> {
        self.players.get(player).ok_or(PressError::PlayerOutOfRange(player))
    }

    /// Queue a press, waiting while the player's queue is full.
    pub fn press(&self, player: usize, slot: usize) -> Result<(), PressError> {
        self.player(player)?.press(slot)
    }

    /// Queue a press or fail with [`PressError::Full`].
    pub fn try_press(&self, player: usize, slot: usize) -> Result<(), PressError> {
        self.player(player)?.try_press(slot)
    }

    pub fn players(&self) -> &[Arc<Player>] {
        &self.players
    }

    /// Ask the dealer to end the game at its next check.
    pub fn stop(&self) {
        log::info!("stop requested");
        self.stop.store(true, Ordering::Release);
        self.claims.notify();
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }
}
