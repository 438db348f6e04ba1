use clap::Parser;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use ratatui::prelude::*;
use set_rs::config::Config;
use set_rs::display::{DisplaySink, LogDisplay};
use set_rs::evaluator::FeatureEvaluator;
use set_rs::game::{Game, GameError, Outcome};
use set_rs::tui::app::{check_keyboard_players, AppState};
use set_rs::tui::{controller, view::TuiDisplay};
use std::error::Error;
use std::fs::File;
use std::io::{self, IsTerminal, Stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "set-rs", version, about = "Real-time Set for the terminal")]
struct Args {
    /// TOML settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of players
    #[arg(long)]
    players: Option<usize>,

    /// How many of the players use the keyboard (at most 2 in the TUI)
    #[arg(long)]
    humans: Option<usize>,

    /// Seed for shuffles and bots
    #[arg(long)]
    seed: Option<u64>,

    /// Log every valid claim on the table after each deal
    #[arg(long)]
    hints: bool,

    /// Run bots only, logging to stderr instead of drawing the table
    #[arg(long)]
    headless: bool,

    /// Log destination in TUI mode
    #[arg(long, default_value = "set-rs.log")]
    log_file: PathBuf,

    /// Stop a headless game after this many seconds
    #[arg(long)]
    duration_secs: Option<u64>,
}

impl Args {
    fn config(&self) -> Result<Config, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(players) = self.players {
            config.players = players;
            config.human_players = config.human_players.min(players);
        }
        if let Some(humans) = self.humans {
            config.human_players = humans;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.hints |= self.hints;
        if self.headless {
            config.human_players = 0;
        }
        config.validate()?;
        Ok(config)
    }
}

fn init_logging(target: Option<File>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(file) = target {
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
}

fn build_game(config: Config, display: Arc<dyn DisplaySink>) -> Result<Game, GameError> {
    let evaluator = Arc::new(FeatureEvaluator::new(config.feature_size, config.feature_count));
    Game::new(config, evaluator, display)
}

fn print_outcome(names: &[String], outcome: &Outcome) {
    for (id, score) in outcome.scores.iter().enumerate() {
        println!("{}: {score}", names[id]);
    }
    let winners: Vec<&str> = outcome.winners.iter().map(|&w| names[w].as_str()).collect();
    println!("winners: {}", winners.join(", "));
}

fn run_headless(args: &Args, config: Config) -> Result<(), Box<dyn Error>> {
    init_logging(None);
    let names: Vec<String> = (0..config.players).map(|id| config.player_name(id)).collect();
    let game = build_game(config, Arc::new(LogDisplay))?;
    if let Some(secs) = args.duration_secs {
        let handle = game.handle();
        thread::Builder::new().name("timer".into()).spawn(move || {
            thread::sleep(Duration::from_secs(secs));
            handle.stop();
        })?;
    }
    let outcome = game.run()?;
    print_outcome(&names, &outcome);
    Ok(())
}

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(terminal.backend_mut(), crossterm::terminal::LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_tui(args: &Args, config: Config) -> Result<(), Box<dyn Error>> {
    if !io::stdout().is_terminal() {
        println!(
            "set-rs requires a real terminal (TTY); use --headless otherwise. Version: {}",
            set_rs::VERSION
        );
        return Ok(());
    }
    check_keyboard_players(config.human_players)?;
    init_logging(Some(File::create(&args.log_file)?));

    let names: Vec<String> = (0..config.players).map(|id| config.player_name(id)).collect();
    let humans = config.human_players;
    let display = Arc::new(TuiDisplay::new(config.table_size, config.players));
    let game = build_game(config, Arc::clone(&display) as Arc<dyn DisplaySink>)?;
    let handle = game.handle();
    let evaluator = Arc::clone(game.board().evaluator());
    let mut app = AppState::new(names.clone(), humans, display, evaluator, handle.clone());
    let dealer = thread::Builder::new().name("dealer".into()).spawn(move || game.run())?;

    let mut terminal = setup_terminal()?;
    let res = controller::run(&mut terminal, &mut app, &dealer, Duration::from_millis(100));

    // Always attempt to restore terminal
    restore_terminal(terminal)?;
    handle.stop();
    let outcome = match dealer.join() {
        Ok(outcome) => outcome?,
        Err(_) => return Err("dealer thread panicked".into()),
    };
    res?;
    print_outcome(&names, &outcome);
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let config = args.config()?;
    if args.headless {
        run_headless(&args, config)
    } else {
        run_tui(&args, config)
    }
}
