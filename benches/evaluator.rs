use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use set_rs::cards::Card;
use set_rs::deck::Deck;
use set_rs::evaluator::{FeatureEvaluator, SetEvaluator};

fn bench_is_valid(c: &mut Criterion) {
    let eval = FeatureEvaluator::standard();
    let valid = [Card::new(0), Card::new(40), Card::new(80)];
    let invalid = [Card::new(0), Card::new(1), Card::new(3)];

    let mut g = c.benchmark_group("is_valid");
    g.bench_with_input(BenchmarkId::new("valid", "0,40,80"), &valid, |b, input| {
        b.iter(|| eval.is_valid(black_box(input)))
    });
    g.bench_with_input(BenchmarkId::new("invalid", "0,1,3"), &invalid, |b, input| {
        b.iter(|| eval.is_valid(black_box(input)))
    });
    g.finish();
}

fn bench_find_all(c: &mut Criterion) {
    let eval = FeatureEvaluator::standard();
    let mut g = c.benchmark_group("find_all");
    for table in [12usize, 15, 21] {
        let mut deck = Deck::full(81);
        deck.shuffle_seeded(7);
        let cards: Vec<Card> = (0..table).filter_map(|_| deck.draw()).collect();
        g.bench_with_input(BenchmarkId::new("all", table), &cards, |b, input| {
            b.iter(|| eval.find_all(black_box(input), usize::MAX))
        });
        g.bench_with_input(BenchmarkId::new("first", table), &cards, |b, input| {
            b.iter(|| eval.any_valid(black_box(input)))
        });
    }
    g.finish();
}

criterion_group!(benches, bench_is_valid, bench_find_all);
criterion_main!(benches);
