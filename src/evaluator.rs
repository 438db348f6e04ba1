//! Claim validity over card feature vectors.
//!
//! The board and dealer only ever talk to a [`SetEvaluator`]; the crate ships
//! [`FeatureEvaluator`], the classic rule where every feature must be either
//! the same on all three cards or different on all three.

pub(crate) mod combinations;

use crate::cards::{Card, CLAIM_SIZE};
use combinations::Triples;

/// Decides claim validity and enumerates valid claims.
pub trait SetEvaluator: Send + Sync {
    /// True when `cards` form a valid claim.
    fn is_valid(&self, cards: &[Card]) -> bool;

    /// Every valid claim among `cards`, stopping after `limit` are found.
    fn find_all(&self, cards: &[Card], limit: usize) -> Vec<[Card; CLAIM_SIZE]>;

    /// Per-card feature vectors, in input order.
    fn features(&self, cards: &[Card]) -> Vec<Vec<u8>>;

    /// Whether at least one valid claim exists among `cards`.
    fn any_valid(&self, cards: &[Card]) -> bool {
        !self.find_all(cards, 1).is_empty()
    }
}

/// A card id read as `feature_count` digits in base `feature_size`.
///
/// ```
/// use set_rs::cards::Card;
/// use set_rs::evaluator::{FeatureEvaluator, SetEvaluator};
///
/// let eval = FeatureEvaluator::standard();
/// // 0 = 0000, 1 = 0001, 2 = 0002: three features equal, one all different.
/// assert!(eval.is_valid(&[Card::new(0), Card::new(1), Card::new(2)]));
/// assert!(!eval.is_valid(&[Card::new(0), Card::new(1), Card::new(3)]));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureEvaluator {
    feature_size: u8,
    feature_count: u8,
}

impl FeatureEvaluator {
    pub const fn new(feature_size: u8, feature_count: u8) -> Self {
        Self { feature_size, feature_count }
    }

    /// Three values per feature, four features: the 81-card game.
    pub const fn standard() -> Self {
        Self::new(3, 4)
    }

    /// Number of distinct cards this evaluator can describe.
    pub fn deck_capacity(&self) -> usize {
        (self.feature_size as usize).saturating_pow(self.feature_count as u32)
    }

    pub fn card_features(&self, card: Card) -> Vec<u8> {
        let base = self.feature_size.max(1) as usize;
        let mut rest = card.index();
        let mut out = vec![0u8; self.feature_count as usize];
        // Most significant digit first so card 1 reads as [0, 0, 0, 1].
        for slot in out.iter_mut().rev() {
            *slot = (rest % base) as u8;
            rest /= base;
        }
        out
    }
}

impl Default for FeatureEvaluator {
    fn default() -> Self {
        Self::standard()
    }
}

impl SetEvaluator for FeatureEvaluator {
    fn is_valid(&self, cards: &[Card]) -> bool {
        if cards.len() != CLAIM_SIZE {
            return false;
        }
        if cards[0] == cards[1] || cards[1] == cards[2] || cards[0] == cards[2] {
            return false;
        }
        let features = self.features(cards);
        (0..self.feature_count as usize).all(|f| {
            let (a, b, c) = (features[0][f], features[1][f], features[2][f]);
            let all_same = a == b && b == c;
            let all_different = a != b && b != c && a != c;
            all_same || all_different
        })
    }

    fn find_all(&self, cards: &[Card], limit: usize) -> Vec<[Card; CLAIM_SIZE]> {
        let mut found = Vec::new();
        if limit == 0 {
            return found;
        }
        for [i, j, k] in Triples::new(cards.len()) {
            let triple = [cards[i], cards[j], cards[k]];
            if self.is_valid(&triple) {
                found.push(triple);
                if found.len() >= limit {
                    break;
                }
            }
        }
        found
    }

    fn features(&self, cards: &[Card]) -> Vec<Vec<u8>> {
        cards.iter().map(|&c| self.card_features(c)).collect()
    }
}
