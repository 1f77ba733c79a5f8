use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use studyduel_core::pool::QuestionPool;
use studyduel_core::rank::plan_settlement;
use studyduel_core::{ArenaTable, QuestionDraft};

fn bench_tier_lookup(c: &mut Criterion) {
    let table = ArenaTable::standard();
    let mut group = c.benchmark_group("tier_for");

    group.bench_function("bronze", |b| b.iter(|| table.tier_for(black_box(120))));
    group.bench_function("boundary", |b| b.iter(|| table.tier_for(black_box(2_000))));
    group.bench_function("champion", |b| b.iter(|| table.tier_for(black_box(9_999))));

    group.finish();
}

fn bench_settlement_plan(c: &mut Criterion) {
    let table = ArenaTable::standard();
    c.bench_function("plan_settlement", |b| {
        b.iter(|| plan_settlement(&table, black_box(480), black_box(true)))
    });
}

fn bench_pool_draw(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_draw");

    for size in [10usize, 100, 1_000] {
        let drafts: Vec<QuestionDraft> = (0..size)
            .map(|i| QuestionDraft::new(format!("Question {i}?"), format!("{i}")))
            .collect();
        let mut pool = QuestionPool::new(drafts);
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        group.bench_function(format!("n={size}"), |b| {
            b.iter(|| pool.draw(&mut rng).map(|item| item.id))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_tier_lookup, bench_settlement_plan, bench_pool_draw);
criterion_main!(benches);
