//! Driver and runner benchmarks.
//!
//! Measures a full level-one match at a steady 60 fps, the same match fed
//! jittered frames, and the looping runner catching up over long updates.
//!
//! Run with: `cargo bench --bench driver_benchmarks`

use std::convert::Infallible;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use sblp_engine::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn fresh_driver() -> FixedStepDriver {
    let simulation = Simulation::new(&level_one(), RemovalConfig::default());
    FixedStepDriver::new(simulation, DriverConfig::default())
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_level_one(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_one");

    group.bench_function("steady_16ms_frames_8s", |b| {
        b.iter(|| {
            let mut driver = fresh_driver();
            for _ in 0..500 {
                driver.advance(16).unwrap();
            }
            black_box(driver.simulation().bullets().len())
        });
    });

    group.bench_function("jittered_frames_8s", |b| {
        b.iter(|| {
            let mut driver = fresh_driver();
            let mut rng = Pcg32::seed_from_u64(7);
            while driver.real_time() < 8000 {
                driver.advance(rng.gen_range(5..=40)).unwrap();
            }
            black_box(driver.simulation().bullets().len())
        });
    });

    group.bench_function("state_hash_mid_match", |b| {
        let mut driver = fresh_driver();
        driver.advance(4500).unwrap();
        b.iter(|| black_box(driver.state_hash()));
    });

    group.finish();
}

fn bench_looping_catch_up(c: &mut Criterion) {
    let mut group = c.benchmark_group("looping_catch_up");

    for dt in [16, 1_000, 60_000] {
        group.bench_with_input(BenchmarkId::new("sprayer", dt), &dt, |b, &dt| {
            b.iter(|| {
                let mut runner = LoopingRunner::new(FirePattern::Sprayer.script());
                let fired = runner
                    .update(dt, |event, firing| {
                        black_box((event, firing));
                        Ok::<_, Infallible>(())
                    })
                    .unwrap();
                black_box(fired)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_level_one, bench_looping_catch_up);
criterion_main!(benches);
