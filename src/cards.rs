use std::fmt;
use std::str::FromStr;

/// Number of cards in a claim (a "set").
pub const CLAIM_SIZE: usize = 3;

/// A card identifier. Ids run from `0` to `deck_size - 1`; what a card looks
/// like is decided by the [`SetEvaluator`](crate::evaluator::SetEvaluator).
///
/// ```
/// use set_rs::cards::Card;
///
/// let card = Card::new(17);
/// assert_eq!(card.to_string(), "#17");
/// assert_eq!("#17".parse::<Card>().unwrap(), card);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Card(u16);

impl Card {
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    pub const fn id(self) -> u16 {
        self.0
    }

    /// The id as an index into per-card tables.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u16> for Card {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CardParseError {
    #[error("invalid card: '{0}'")]
    Invalid(String),
}

impl FromStr for Card {
    type Err = CardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        let digits = t.strip_prefix('#').unwrap_or(t);
        digits.parse::<u16>().map(Card).map_err(|_| CardParseError::Invalid(s.to_string()))
    }
}

/// Parse multiple cards separated by whitespace or commas.
///
/// ```
/// use set_rs::cards::{parse_cards, Card};
///
/// let cards = parse_cards("#0, 1 #2").unwrap();
/// assert_eq!(cards, vec![Card::new(0), Card::new(1), Card::new(2)]);
/// ```
pub fn parse_cards(input: &str) -> Result<Vec<Card>, CardParseError> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(Card::from_str)
        .collect()
}
