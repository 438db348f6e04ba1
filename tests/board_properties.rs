use proptest::prelude::*;
use set_rs::board::{Board, Toggle};
use set_rs::cards::Card;
use set_rs::display::NullDisplay;
use set_rs::evaluator::FeatureEvaluator;
use std::sync::Arc;

const SLOTS: usize = 12;
const PLAYERS: usize = 3;

#[derive(Debug, Clone)]
enum Op {
    Place { card: u16, slot: usize },
    Remove { slot: usize },
    Toggle { player: usize, slot: usize },
}

fn any_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u16..81, 0..SLOTS).prop_map(|(card, slot)| Op::Place { card, slot }),
        (0..SLOTS).prop_map(|slot| Op::Remove { slot }),
        (0..PLAYERS, 0..SLOTS).prop_map(|(player, slot)| Op::Toggle { player, slot }),
    ]
}

fn board() -> Board {
    Board::new(SLOTS, 81, PLAYERS, Arc::new(FeatureEvaluator::standard()), Arc::new(NullDisplay))
}

fn apply(b: &Board, op: &Op) {
    // Errors (occupied slot, card already down, empty slot) leave the board as is.
    match *op {
        Op::Place { card, slot } => {
            let _ = b.place_card(Card::new(card), slot);
        }
        Op::Remove { slot } => {
            let _ = b.remove_card(slot);
        }
        Op::Toggle { player, slot } => {
            let _ = b.toggle_marker(player, slot);
        }
    }
}

proptest! {
    #[test]
    fn card_slot_mapping_stays_a_bijection(ops in prop::collection::vec(any_op(), 0..80)) {
        let b = board();
        for op in &ops {
            apply(&b, op);
            for slot in 0..SLOTS {
                if let Some(card) = b.card_at(slot) {
                    prop_assert_eq!(b.slot_of(card), Some(slot));
                }
            }
            for card in 0..81u16 {
                if let Some(slot) = b.slot_of(Card::new(card)) {
                    prop_assert_eq!(b.card_at(slot), Some(Card::new(card)));
                }
            }
        }
    }

    #[test]
    fn markers_never_exceed_three_and_sit_on_cards(ops in prop::collection::vec(any_op(), 0..80)) {
        let b = board();
        for op in &ops {
            apply(&b, op);
            for player in 0..PLAYERS {
                prop_assert!(b.marker_count(player) <= 3);
                for slot in b.markers_of(player).into_iter().flatten() {
                    prop_assert!(b.card_at(slot).is_some());
                }
            }
        }
    }

    #[test]
    fn double_toggle_restores_markers(
        cards in prop::collection::btree_set(0u16..81, SLOTS),
        setup in prop::collection::vec(0..SLOTS, 0..3),
        player in 0..PLAYERS,
        slot in 0..SLOTS,
    ) {
        let b = board();
        for (slot, card) in cards.into_iter().enumerate() {
            b.place_card(Card::new(card), slot).unwrap();
        }
        for s in setup {
            let _ = b.toggle_marker(player, s);
        }
        let before = b.markers_of(player);
        let first = b.toggle_marker(player, slot).unwrap();
        if first == Toggle::Rejected {
            prop_assert_eq!(b.markers_of(player), before);
        } else {
            let second = b.toggle_marker(player, slot).unwrap();
            prop_assert!(second.changed());
            prop_assert_eq!(b.markers_of(player), before);
        }
    }
}
