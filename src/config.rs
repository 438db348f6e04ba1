use crate::cards::CLAIM_SIZE;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Game settings. Every field has a default, so an empty TOML document is a
/// valid two-player game.
///
/// ```
/// use set_rs::config::Config;
///
/// let cfg = Config::from_toml_str("players = 4\nhuman_players = 1").unwrap();
/// assert_eq!(cfg.players, 4);
/// assert_eq!(cfg.table_size, 12);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct Config {
    pub players: usize,
    /// The first `human_players` ids take input from the keyboard; the rest are bots.
    pub human_players: usize,
    pub player_names: Vec<String>,
    pub table_size: usize,
    pub deck_size: usize,
    pub feature_size: u8,
    pub feature_count: u8,
    pub turn_timeout_ms: u64,
    pub turn_timeout_warning_ms: u64,
    pub point_freeze_ms: u64,
    pub penalty_freeze_ms: u64,
    /// Artificial delay for every card placement and removal.
    pub table_delay_ms: u64,
    /// Pause before each bot key press.
    pub bot_delay_ms: u64,
    pub hints: bool,
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            players: 2,
            human_players: 2,
            player_names: Vec::new(),
            table_size: 12,
            deck_size: 81,
            feature_size: 3,
            feature_count: 4,
            turn_timeout_ms: 60_000,
            turn_timeout_warning_ms: 5_000,
            point_freeze_ms: 1_000,
            penalty_freeze_ms: 3_000,
            table_delay_ms: 0,
            bot_delay_ms: 0,
            hints: false,
            seed: None,
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Config = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));
        if self.players == 0 {
            return invalid("at least one player is required".into());
        }
        if self.human_players > self.players {
            return invalid(format!(
                "{} human players but only {} players",
                self.human_players, self.players
            ));
        }
        if self.table_size < CLAIM_SIZE {
            return invalid(format!("table must hold at least {CLAIM_SIZE} cards"));
        }
        if self.feature_size < 2 || self.feature_count == 0 {
            return invalid("cards need at least one feature with two values".into());
        }
        let capacity = (self.feature_size as usize).saturating_pow(self.feature_count as u32);
        if self.deck_size == 0 || self.deck_size > capacity {
            return invalid(format!(
                "deck size {} outside 1..={capacity} for {} features of {} values",
                self.deck_size, self.feature_count, self.feature_size
            ));
        }
        if self.deck_size > u16::MAX as usize + 1 {
            return invalid(format!("deck size {} too large", self.deck_size));
        }
        if self.turn_timeout_ms == 0 {
            return invalid("turn timeout must be positive".into());
        }
        Ok(())
    }

    /// Display name for `player`, falling back to "Player N" (1-based).
    pub fn player_name(&self, player: usize) -> String {
        self.player_names.get(player).cloned().unwrap_or_else(|| format!("Player {}", player + 1))
    }

    pub fn is_human(&self, player: usize) -> bool {
        player < self.human_players
    }

    pub fn turn_timeout(&self) -> Duration {
        Duration::from_millis(self.turn_timeout_ms)
    }

    pub fn turn_timeout_warning(&self) -> Duration {
        Duration::from_millis(self.turn_timeout_warning_ms)
    }

    pub fn point_freeze(&self) -> Duration {
        Duration::from_millis(self.point_freeze_ms)
    }

    pub fn penalty_freeze(&self) -> Duration {
        Duration::from_millis(self.penalty_freeze_ms)
    }

    pub fn table_delay(&self) -> Duration {
        Duration::from_millis(self.table_delay_ms)
    }

    pub fn bot_delay(&self) -> Duration {
        Duration::from_millis(self.bot_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = Config::from_toml_str("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.turn_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn overrides_and_names() {
        let cfg = Config::from_toml_str(
            r#"
            players = 3
            human_players = 1
            player_names = ["Ada"]
            hints = true
            seed = 7
            "#,
        )
        .unwrap();
        assert_eq!(cfg.player_name(0), "Ada");
        assert_eq!(cfg.player_name(2), "Player 3");
        assert!(cfg.is_human(0));
        assert!(!cfg.is_human(1));
        assert_eq!(cfg.seed, Some(7));
    }

    #[test]
    fn rejects_invalid_combinations() {
        for doc in [
            "players = 0\nhuman_players = 0",
            "players = 1\nhuman_players = 2",
            "table_size = 2",
            "deck_size = 82",
            "deck_size = 0",
            "feature_size = 1",
            "turn_timeout_ms = 0",
        ] {
            assert!(
                matches!(Config::from_toml_str(doc), Err(ConfigError::Invalid(_))),
                "accepted: {doc}"
            );
        }
    }

    #[test]
    fn parse_errors_are_reported() {
        assert!(matches!(Config::from_toml_str("players = \"two\""), Err(ConfigError::Parse(_))));
    }
}
