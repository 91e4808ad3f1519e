//! Read-only captures of the simulation, with BLAKE3 hashing.
//!
//! - [`SimulationSnapshot`] records everything that affects future ticks:
//!   times, entities and runner progress. Its `hash` is a BLAKE3 digest of
//!   the canonical JSON encoding of the rest of the snapshot, so two runs are
//!   deterministic exactly when their hashes match.
//! - [`FrameView`] is what presentation needs for one frame: each entity's
//!   kind, bounds and a position extrapolated by the driver's tween.
//!
//! # Usage
//!
//! ```
//! use sblp_engine::prelude::*;
//!
//! let run = || {
//!     let simulation = Simulation::new(&level_one(), RemovalConfig::default());
//!     let mut driver = FixedStepDriver::new(simulation, DriverConfig::default());
//!     for _ in 0..120 {
//!         driver.advance(17).unwrap();
//!     }
//!     driver.state_hash()
//! };
//!
//! let hash = run();
//! assert_eq!(hash.len(), 64); // BLAKE3 hex digest
//! assert_eq!(hash, run());
//! ```
//!
//! Snapshots are one-way: scripts are shared static data and are not
//! serialized, so a snapshot cannot be restored into a simulation.

use serde::{Deserialize, Serialize};

use sblp_core::timeline::Millis;

use crate::driver::FixedStepDriver;
use crate::entity::{Bullet, Enemy};
use crate::event::BulletType;
use crate::math::{Rect, Vec2};
use crate::simulation::Simulation;

// ---------------------------------------------------------------------------
// SimulationSnapshot
// ---------------------------------------------------------------------------

/// Progress of an enemy's fire control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FireControlSnapshot {
    pub elapsed: Millis,
    pub loops_completed: u64,
    pub total_duration: Millis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySnapshot {
    /// Raw arena handle.
    pub handle: u64,
    pub position: Vec2,
    pub velocity: Vec2,
    pub hp: i32,
    pub fire_control: Option<FireControlSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulletSnapshot {
    /// Raw arena handle.
    pub handle: u64,
    pub bullet: Bullet,
}

/// Progress of a level script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptSnapshot {
    pub cursor: usize,
    pub remaining: usize,
    pub last_time: Millis,
}

/// A serializable capture of the full simulation state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    pub time: Millis,
    pub tick_counter: u64,
    /// In storage order.
    pub bullets: Vec<BulletSnapshot>,
    /// In storage order.
    pub enemies: Vec<EnemySnapshot>,
    pub scripts: Vec<ScriptSnapshot>,
    /// BLAKE3 hex digest (64 lowercase hex chars) of every other field.
    pub hash: String,
}

/// Compute the BLAKE3 hex digest of the hashable simulation state.
fn compute_hash(
    time: Millis,
    tick_counter: u64,
    bullets: &[BulletSnapshot],
    enemies: &[EnemySnapshot],
    scripts: &[ScriptSnapshot],
) -> String {
    #[derive(Serialize)]
    struct HashableState<'a> {
        time: Millis,
        tick_counter: u64,
        bullets: &'a [BulletSnapshot],
        enemies: &'a [EnemySnapshot],
        scripts: &'a [ScriptSnapshot],
    }

    let json_bytes = serde_json::to_vec(&HashableState {
        time,
        tick_counter,
        bullets,
        enemies,
        scripts,
    })
    .expect("SimulationSnapshot state should always be JSON-serializable");

    blake3::hash(&json_bytes).to_hex().to_string()
}

impl SimulationSnapshot {
    /// Recompute the digest and compare it with the recorded one.
    pub fn verify(&self) -> bool {
        compute_hash(
            self.time,
            self.tick_counter,
            &self.bullets,
            &self.enemies,
            &self.scripts,
        ) == self.hash
    }
}

impl Simulation {
    /// Capture the current state.
    pub fn capture_snapshot(&self) -> SimulationSnapshot {
        let bullets: Vec<_> = self
            .bullets()
            .iter()
            .map(|(handle, bullet)| BulletSnapshot {
                handle: handle.to_raw(),
                bullet: bullet.clone(),
            })
            .collect();
        let enemies: Vec<_> = self
            .enemies()
            .iter()
            .map(|(handle, enemy)| EnemySnapshot {
                handle: handle.to_raw(),
                position: enemy.position,
                velocity: enemy.velocity,
                hp: enemy.hp,
                fire_control: enemy.fire_control.as_ref().map(|r| FireControlSnapshot {
                    elapsed: r.elapsed(),
                    loops_completed: r.loops_completed(),
                    total_duration: r.timeline().total_duration(),
                }),
            })
            .collect();
        let scripts: Vec<_> = self
            .scripts()
            .iter()
            .map(|r| ScriptSnapshot {
                cursor: r.cursor(),
                remaining: r.remaining(),
                last_time: r.last_time(),
            })
            .collect();

        let hash = compute_hash(self.time(), self.tick_count(), &bullets, &enemies, &scripts);
        SimulationSnapshot {
            time: self.time(),
            tick_counter: self.tick_count(),
            bullets,
            enemies,
            scripts,
            hash,
        }
    }

    /// BLAKE3 hex digest of the current state.
    pub fn state_hash(&self) -> String {
        self.capture_snapshot().hash
    }

    /// Presentation view with positions extrapolated by `tween` seconds.
    pub fn frame_view(&self, tween: f32) -> FrameView {
        FrameView {
            tween,
            bullets: self
                .bullets()
                .values()
                .iter()
                .map(|b| SpriteView::of_bullet(b, tween))
                .collect(),
            enemies: self
                .enemies()
                .values()
                .iter()
                .map(|e| SpriteView::of_enemy(e, tween))
                .collect(),
        }
    }
}

impl FixedStepDriver {
    pub fn capture_snapshot(&self) -> SimulationSnapshot {
        self.simulation().capture_snapshot()
    }

    /// BLAKE3 hex digest of the simulation state. Real time and the tween
    /// are not part of it.
    pub fn state_hash(&self) -> String {
        self.simulation().state_hash()
    }

    /// Presentation view for the current frame.
    pub fn frame_view(&self) -> FrameView {
        self.simulation().frame_view(self.tween())
    }
}

// ---------------------------------------------------------------------------
// FrameView
// ---------------------------------------------------------------------------

/// What a sprite depicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpriteKind {
    Enemy,
    Bullet(BulletType),
}

/// One entity as presentation sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteView {
    pub kind: SpriteKind,
    /// Position at the last tick.
    pub position: Vec2,
    pub velocity: Vec2,
    /// `position + tween * velocity`.
    pub render_position: Vec2,
    /// Bounding box at `position`.
    pub bounds: Rect,
}

impl SpriteView {
    fn of_bullet(bullet: &Bullet, tween: f32) -> Self {
        Self {
            kind: SpriteKind::Bullet(bullet.bullet_type),
            position: bullet.position,
            velocity: bullet.velocity,
            render_position: bullet.position + tween * bullet.velocity,
            bounds: bullet.bounding_box(),
        }
    }

    fn of_enemy(enemy: &Enemy, tween: f32) -> Self {
        Self {
            kind: SpriteKind::Enemy,
            position: enemy.position,
            velocity: enemy.velocity,
            render_position: enemy.position + tween * enemy.velocity,
            bounds: enemy.bounding_box(),
        }
    }
}

/// Everything presentation draws for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameView {
    /// Seconds of real time past the last tick.
    pub tween: f32,
    pub bullets: Vec<SpriteView>,
    pub enemies: Vec<SpriteView>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
