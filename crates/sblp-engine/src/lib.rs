//! SBLP Engine -- deterministic arcade-shooter simulation on script timelines.
//!
//! This crate builds on [`sblp_core`] to provide the game itself: script
//! payloads and fire patterns, levels, the per-tick [`Simulation`], the
//! [`FixedStepDriver`] that feeds it from variable frame deltas, and the
//! menu and match screens around it.
//!
//! [`Simulation`]: simulation::Simulation
//! [`FixedStepDriver`]: driver::FixedStepDriver
//!
//! # Quick Start
//!
//! ```
//! use sblp_engine::prelude::*;
//!
//! let simulation = Simulation::new(&level_one(), RemovalConfig::default());
//! let mut driver = FixedStepDriver::new(simulation, DriverConfig::default());
//!
//! // The first wave enters one second in.
//! for _ in 0..70 {
//!     driver.advance(16).unwrap();
//! }
//! assert_eq!(driver.simulation().enemies().len(), 3);
//!
//! let view = driver.frame_view();
//! assert_eq!(view.enemies.len(), 3);
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod driver;
pub mod entity;
pub mod event;
pub mod input;
pub mod level;
pub mod math;
pub mod patterns;
pub mod screen;
pub mod simulation;
pub mod snapshot;

/// Re-export the core crate for convenience.
pub use sblp_core;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while building or running a simulation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// Script data failed validation.
    #[error(transparent)]
    Timeline(#[from] sblp_core::TimelineError),

    /// A script holds an event that makes no sense in its context, such as
    /// a spawn inside an enemy's fire pattern.
    #[error("{event} event is not supported in a {script} script")]
    UnsupportedEvent {
        event: &'static str,
        script: &'static str,
    },

    /// Configuration failed to parse or validate.
    #[error("invalid configuration: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use sblp_core::prelude::*;

    pub use crate::config::EngineConfig;
    pub use crate::driver::{DriverConfig, FixedStepDriver, FrameDiagnostics};
    pub use crate::entity::{Bullet, Enemy};
    pub use crate::event::{
        BulletSpawn, BulletType, FireControlScript, FireEvent, LevelScript, ScriptEvent,
        SpawnEvent,
    };
    pub use crate::input::{Key, KeyRepeat};
    pub use crate::level::{level_one, v_formation, LevelDescription};
    pub use crate::math::{Rect, Vec2};
    pub use crate::patterns::FirePattern;
    pub use crate::screen::{GameScreen, MainMenu, MenuEntry, Navigator, Screen, Transition};
    pub use crate::simulation::{RemovalConfig, Simulation, TickReport};
    pub use crate::snapshot::{FrameView, SimulationSnapshot, SpriteKind, SpriteView};
    pub use crate::EngineError;
}
