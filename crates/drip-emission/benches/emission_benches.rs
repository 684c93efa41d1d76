//! Criterion benchmarks for drip-emission.
//!
//! Covers: decaying integration over short and very long spans, linear
//! emission, and the team split.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use drip_core::constants::{amount, DEFAULT_DECAY_PERCENT, DEFAULT_PERIOD_SECONDS, DEFAULT_TOKENS_PER_PERIOD, DEFAULT_TOKENS_PER_SECOND};
use drip_core::traits::EmissionCurve;
use drip_core::types::Address;
use drip_emission::{EmissionSchedule, LinearEmission, TeamAllocation};

const ACTIVATION: u64 = 1_600_000_000;

fn bench_decaying(c: &mut Criterion) {
    let schedule = EmissionSchedule::new(
        DEFAULT_PERIOD_SECONDS,
        amount(DEFAULT_TOKENS_PER_PERIOD),
        DEFAULT_DECAY_PERCENT,
        ACTIVATION,
    )
    .unwrap();

    c.bench_function("decaying_half_period", |b| {
        b.iter(|| schedule.emitted_between(black_box(ACTIVATION), black_box(ACTIVATION + DEFAULT_PERIOD_SECONDS / 2)))
    });

    // runs until the per-period amount reaches zero
    c.bench_function("decaying_until_exhausted", |b| {
        b.iter(|| schedule.emitted_between(black_box(ACTIVATION), black_box(u64::MAX)))
    });
}

fn bench_linear(c: &mut Criterion) {
    let curve = LinearEmission::new(amount(DEFAULT_TOKENS_PER_SECOND));

    c.bench_function("linear_one_day", |b| {
        b.iter(|| curve.emitted_between(black_box(ACTIVATION), black_box(ACTIVATION + 86_400)))
    });
}

fn bench_team_split(c: &mut Criterion) {
    let team = TeamAllocation::from_pairs(&[
        (Address([1; 20]), 32),
        (Address([2; 20]), 16),
        (Address([3; 20]), 16),
        (Address([4; 20]), 33),
        (Address([5; 20]), 3),
    ])
    .unwrap();
    let total = amount(DEFAULT_TOKENS_PER_PERIOD);

    c.bench_function("team_split_five_members", |b| {
        b.iter(|| team.split(black_box(total)))
    });
}

criterion_group!(benches, bench_decaying, bench_linear, bench_team_split);
criterion_main!(benches);
