//! Fixed-timestep driver.
//!
//! The [`FixedStepDriver`] turns variable frame deltas into a whole number of
//! fixed simulation ticks. Real time accumulates every frame; logical time
//! follows it one step at a time, and the simulation only ever sees ticks of
//! exactly `step_ms`. Whatever real time is left over is exposed as
//! [`tween`](FixedStepDriver::tween) so presentation can extrapolate between
//! ticks.
//!
//! Because ticks are fixed and the simulation has no other input, the tick
//! count after any sequence of frames depends only on the frames' total, not
//! on how it was chunked.
//!
//! # Example
//!
//! ```
//! use sblp_engine::prelude::*;
//!
//! let level = level_one();
//! let simulation = Simulation::new(&level, RemovalConfig::default());
//! let mut driver = FixedStepDriver::new(simulation, DriverConfig::default());
//!
//! // 100ms of frames at a 16ms step runs six ticks.
//! let ticks = driver.advance(100).unwrap();
//! assert_eq!(ticks, 6);
//! assert_eq!(driver.logical_time(), 96);
//! assert!((driver.tween() - 0.004).abs() < 1e-6);
//! ```

use std::time::{Duration, Instant};

use sblp_core::timeline::Millis;
use serde::{Deserialize, Serialize};

use crate::simulation::Simulation;
use crate::EngineError;

// ---------------------------------------------------------------------------
// DriverConfig
// ---------------------------------------------------------------------------

/// Configuration for the fixed-timestep driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Length of one tick in milliseconds. Must be positive.
    pub step_ms: Millis,
    /// Upper bound on ticks run by one [`advance`](FixedStepDriver::advance).
    /// When a frame needs more, the backlog beyond the cap is dropped.
    pub max_ticks_per_advance: Option<u32>,
}

impl Default for DriverConfig {
    /// 60 Hz in whole milliseconds, no tick cap.
    fn default() -> Self {
        Self {
            step_ms: 1000 / 60,
            max_ticks_per_advance: None,
        }
    }
}

// ---------------------------------------------------------------------------
// FrameDiagnostics
// ---------------------------------------------------------------------------

/// Timing diagnostics for the last frame.
#[derive(Debug, Clone, Default)]
pub struct FrameDiagnostics {
    /// Ticks run during the frame.
    pub ticks: u32,
    /// Backlog dropped during the frame because of the tick cap.
    pub dropped_ms: Millis,
    /// Wall-clock time spent in `advance`.
    pub total_time: Duration,
}

// ---------------------------------------------------------------------------
// FixedStepDriver
// ---------------------------------------------------------------------------

/// Drives a [`Simulation`] with fixed ticks from variable frame deltas.
#[derive(Debug, Clone)]
pub struct FixedStepDriver {
    simulation: Simulation,
    config: DriverConfig,
    /// Sum of every frame delta.
    real_time: Millis,
    /// Sum of every tick run.
    logical_time: Millis,
    /// Real time discarded by the tick cap; never simulated.
    dropped_ms: Millis,
    last_diagnostics: FrameDiagnostics,
}

impl FixedStepDriver {
    /// Wrap `simulation`. Real and logical time start at 0.
    ///
    /// # Panics
    ///
    /// Panics if `config.step_ms` is not positive.
    pub fn new(simulation: Simulation, config: DriverConfig) -> Self {
        assert!(
            config.step_ms > 0,
            "step_ms must be positive, got {}",
            config.step_ms
        );
        Self {
            simulation,
            config,
            real_time: 0,
            logical_time: 0,
            dropped_ms: 0,
            last_diagnostics: FrameDiagnostics::default(),
        }
    }

    /// Account for `frame_delta` milliseconds of real time and run every tick
    /// that is now due. Returns the number of ticks run.
    ///
    /// A tick runs while logical time trails real time by more than one
    /// step. A negative delta is treated as zero.
    ///
    /// # Errors
    ///
    /// Propagates the first error raised by a tick. Ticks that completed
    /// before it stay applied.
    pub fn advance(&mut self, frame_delta: Millis) -> Result<u32, EngineError> {
        let frame_start = Instant::now();
        let frame_delta = if frame_delta < 0 {
            tracing::warn!(frame_delta, "negative frame delta clamped to zero");
            0
        } else {
            frame_delta
        };
        self.real_time += frame_delta;

        let step = self.config.step_ms;
        let mut ticks = 0u32;
        let mut dropped = 0;
        while self.logical_time < self.effective_time() - step {
            if self.config.max_ticks_per_advance.is_some_and(|cap| ticks >= cap) {
                dropped = self.effective_time() - self.logical_time - step;
                self.dropped_ms += dropped;
                tracing::warn!(
                    ticks,
                    dropped_ms = dropped,
                    "tick cap reached; dropping backlog"
                );
                break;
            }
            self.logical_time += step;
            self.simulation.step(step)?;
            ticks += 1;
        }

        self.last_diagnostics = FrameDiagnostics {
            ticks,
            dropped_ms: dropped,
            total_time: frame_start.elapsed(),
        };
        Ok(ticks)
    }

    /// Real time not yet simulated, in seconds.
    ///
    /// Lies in `[0, step]` after every [`advance`](Self::advance). A renderer
    /// extrapolates positions by `tween * velocity`.
    pub fn tween(&self) -> f32 {
        (self.effective_time() - self.logical_time) as f32 / 1000.0
    }

    /// Real time minus the backlog dropped by the tick cap.
    fn effective_time(&self) -> Millis {
        self.real_time - self.dropped_ms
    }

    // -- accessors ----------------------------------------------------------

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Mutable access to the simulation, for setup and hit logic between
    /// frames.
    pub fn simulation_mut(&mut self) -> &mut Simulation {
        &mut self.simulation
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Sum of every frame delta passed to [`advance`](Self::advance).
    pub fn real_time(&self) -> Millis {
        self.real_time
    }

    /// Simulated time; always a multiple of the step.
    pub fn logical_time(&self) -> Millis {
        self.logical_time
    }

    /// Total real time discarded by the tick cap.
    pub fn dropped_ms(&self) -> Millis {
        self.dropped_ms
    }

    pub fn tick_count(&self) -> u64 {
        self.simulation.tick_count()
    }

    pub fn last_diagnostics(&self) -> &FrameDiagnostics {
        &self.last_diagnostics
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Enemy;
    use crate::level::field_bounds;
    use crate::math::Vec2;
    use crate::simulation::RemovalConfig;

    fn driver(config: DriverConfig) -> FixedStepDriver {
        FixedStepDriver::new(
            Simulation::empty(field_bounds(), RemovalConfig::default()),
            config,
        )
    }

    // -- 1. Construction and defaults ---------------------------------------

    #[test]
    fn new_driver_starts_at_zero() {
        let d = driver(DriverConfig::default());
        assert_eq!(d.real_time(), 0);
        assert_eq!(d.logical_time(), 0);
        assert_eq!(d.tick_count(), 0);
        assert_eq!(d.tween(), 0.0);
    }

    #[test]
    fn default_step_is_sixty_hz_in_whole_ms() {
        assert_eq!(DriverConfig::default().step_ms, 16);
        assert_eq!(DriverConfig::default().max_ticks_per_advance, None);
    }

    #[test]
    #[should_panic(expected = "step_ms must be positive")]
    fn zero_step_panics() {
        let _ = driver(DriverConfig {
            step_ms: 0,
            ..Default::default()
        });
    }

    #[test]
    #[should_panic(expected = "step_ms must be positive")]
    fn negative_step_panics() {
        let _ = driver(DriverConfig {
            step_ms: -16,
            ..Default::default()
        });
    }

    // -- 2. Accumulation ----------------------------------------------------

    #[test]
    fn logical_time_trails_real_time_by_up_to_one_step() {
        let mut d = driver(DriverConfig::default());
        assert_eq!(d.advance(16).unwrap(), 0, "exactly one step is not yet due");
        assert_eq!(d.advance(1).unwrap(), 1);
        assert_eq!(d.logical_time(), 16);
        assert_eq!(d.real_time(), 17);
        assert!((d.tween() - 0.001).abs() < 1e-6);
    }

    #[test]
    fn long_frame_runs_many_ticks() {
        let mut d = driver(DriverConfig::default());
        assert_eq!(d.advance(1000).unwrap(), 62);
        assert_eq!(d.logical_time(), 992);
        assert_eq!(d.tick_count(), 62);
        assert_eq!(d.simulation().time(), d.logical_time());
        assert_eq!(d.last_diagnostics().ticks, 62);
    }

    #[test]
    fn chunked_frames_match_one_long_frame() {
        let mut whole = driver(DriverConfig::default());
        whole.advance(500).unwrap();

        let mut chunked = driver(DriverConfig::default());
        for delta in [7, 33, 1, 16, 16, 100, 27, 300] {
            chunked.advance(delta).unwrap();
        }

        assert_eq!(whole.tick_count(), chunked.tick_count());
        assert_eq!(whole.logical_time(), chunked.logical_time());
        assert_eq!(whole.tween(), chunked.tween());
    }

    #[test]
    fn negative_delta_is_ignored() {
        let mut d = driver(DriverConfig::default());
        d.advance(40).unwrap();
        assert_eq!(d.advance(-100).unwrap(), 0);
        assert_eq!(d.real_time(), 40);
        assert_eq!(d.logical_time(), 32);
    }

    #[test]
    fn tween_stays_within_one_step() {
        let mut d = driver(DriverConfig::default());
        for delta in [3, 50, 16, 0, 17, 250, 1] {
            d.advance(delta).unwrap();
            assert!(d.tween() >= 0.0 && d.tween() <= 0.016, "tween {}", d.tween());
        }
    }

    // -- 3. Tick cap --------------------------------------------------------

    #[test]
    fn tick_cap_drops_backlog() {
        let mut d = driver(DriverConfig {
            step_ms: 10,
            max_ticks_per_advance: Some(5),
        });
        assert_eq!(d.advance(1000).unwrap(), 5);
        assert_eq!(d.logical_time(), 50);
        assert_eq!(d.dropped_ms(), 940);
        assert_eq!(d.last_diagnostics().dropped_ms, 940);
        assert!((d.tween() - 0.010).abs() < 1e-6);

        // The next frame resumes from the re-synced time.
        assert_eq!(d.advance(10).unwrap(), 1);
        assert_eq!(d.real_time(), 1010);
        assert_eq!(d.logical_time(), 60);
    }

    #[test]
    fn tick_cap_not_hit_drops_nothing() {
        let mut d = driver(DriverConfig {
            step_ms: 10,
            max_ticks_per_advance: Some(5),
        });
        assert_eq!(d.advance(60).unwrap(), 5);
        assert_eq!(d.dropped_ms(), 0);
    }

    // -- 4. Simulation is stepped -------------------------------------------

    #[test]
    fn ticks_move_entities_by_whole_steps() {
        let mut d = driver(DriverConfig::default());
        let handle = d
            .simulation_mut()
            .spawn_enemy(Enemy::new(Vec2::new(100.0, 50.0), Vec2::new(-100.0, 0.0), 1));
        d.advance(33).unwrap();
        assert_eq!(d.tick_count(), 2);
        let enemy = d.simulation().enemies().get(handle).unwrap();
        let mut expected = Vec2::new(100.0, 50.0);
        expected += Vec2::new(-100.0, 0.0) * 0.016;
        expected += Vec2::new(-100.0, 0.0) * 0.016;
        assert_eq!(enemy.position, expected);
    }
}
