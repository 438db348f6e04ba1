use crate::cards::Card;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

/// The dealer's remaining cards. Cards are dealt from the front.
#[derive(Debug, Clone, Default)]
pub struct Deck {
    cards: VecDeque<Card>,
}

impl Deck {
    /// A deck holding every card id below `size`, in order.
    ///
    /// ```
    /// use set_rs::deck::Deck;
    ///
    /// let deck = Deck::full(81);
    /// assert_eq!(deck.len(), 81);
    /// ```
    pub fn full(size: usize) -> Self {
        let size = size.min(u16::MAX as usize + 1);
        Self { cards: (0..size).map(|id| Card::new(id as u16)).collect() }
    }

    pub fn from_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        Self { cards: cards.into_iter().collect() }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Shuffle using a seeded RNG for reproducibility.
    pub fn shuffle_seeded(&mut self, seed: u64) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.shuffle_with(&mut rng);
    }

    /// Shuffle using the provided RNG implementing Rng.
    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.make_contiguous().shuffle(rng);
    }

    /// Draw one card from the front of the deck.
    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop_front()
    }

    /// Put a card back at the end of the deck.
    pub fn put_back(&mut self, card: Card) {
        self.cards.push_back(card);
    }

    pub fn cards(&self) -> Vec<Card> {
        self.cards.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_deck_has_every_id_once() {
        let d = Deck::full(81);
        let mut ids: Vec<u16> = d.cards().iter().map(|c| c.id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 81);
        assert_eq!(ids[80], 80);
    }

    #[test]
    fn seeded_shuffle_is_reproducible() {
        let mut d1 = Deck::full(81);
        let mut d2 = Deck::full(81);
        d1.shuffle_seeded(42);
        d2.shuffle_seeded(42);
        assert_eq!(d1.cards(), d2.cards());
        assert_ne!(d1.cards(), Deck::full(81).cards());
    }

    #[test]
    fn draw_takes_from_front_and_put_back_appends() {
        let mut d = Deck::from_cards([Card::new(5), Card::new(6)]);
        assert_eq!(d.draw(), Some(Card::new(5)));
        d.put_back(Card::new(9));
        assert_eq!(d.cards(), vec![Card::new(6), Card::new(9)]);
        assert_eq!(d.draw(), Some(Card::new(6)));
        assert_eq!(d.draw(), Some(Card::new(9)));
        assert!(d.draw().is_none());
        assert!(d.is_empty());
    }
}
