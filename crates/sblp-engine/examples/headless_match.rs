//! Headless match: plays level one with jittered frame deltas.
//!
//! A manual time source stands in for the wall clock and is stepped by a
//! seeded PCG generator, so every run with the same seed and config prints
//! the same state hash regardless of machine speed.
//!
//! Run with:
//!
//! ```text
//! RUST_LOG=info cargo run --example headless_match -- [config.json] [seed]
//! ```

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use sblp_engine::prelude::*;

/// Default jitter seed.
const SEED: u64 = 0x5b1f;
/// Simulated real time after which the match stops if the level is not over.
const TIME_LIMIT_MS: Millis = 15_000;
/// Frame delta range, roughly 25 to 200 fps.
const MIN_FRAME_MS: u32 = 5;
const MAX_FRAME_MS: u32 = 40;

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => EngineConfig::from_json_str(&std::fs::read_to_string(&path)?)?,
        None => EngineConfig::default(),
    };
    let seed = match args.next() {
        Some(seed) => seed.parse()?,
        None => SEED,
    };

    let level = level_one();
    let simulation = Simulation::new(&level, config.removal);
    let mut driver = FixedStepDriver::new(simulation, config.driver);
    let mut rng = Pcg32::seed_from_u64(seed);
    // Start just short of the counter wrapping.
    let time_source = ManualTimeSource::new(u32::MAX - 5_000);
    let mut clock = Clock::new(&time_source);

    let mut frames = 0u64;
    let mut peak_bullets = 0;
    let mut next_summary = 1000;
    while driver.real_time() < TIME_LIMIT_MS {
        time_source.advance(rng.gen_range(MIN_FRAME_MS..=MAX_FRAME_MS));
        driver.advance(clock.update(&time_source))?;
        frames += 1;

        let sim = driver.simulation();
        peak_bullets = peak_bullets.max(sim.bullets().len());
        if driver.real_time() >= next_summary {
            tracing::info!(
                time_ms = driver.logical_time(),
                ticks = driver.tick_count(),
                frames,
                enemies = sim.enemies().len(),
                bullets = sim.bullets().len(),
                "summary"
            );
            next_summary += 1000;
        }
        if sim.is_level_complete() {
            tracing::info!(time_ms = driver.logical_time(), "level complete");
            break;
        }
    }

    println!(
        "{}: {} frames, {} ticks, peak {} bullets",
        level.name,
        frames,
        driver.tick_count(),
        peak_bullets
    );
    println!("state hash: {}", driver.state_hash());
    Ok(())
}
