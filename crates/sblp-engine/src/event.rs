//! Script payloads.
//!
//! Every script in the engine -- a level's spawn plan or an enemy's fire
//! pattern -- is a [`Timeline`] of [`ScriptEvent`]s. The enum is closed: a
//! runner handling a script matches it exhaustively, and an event that makes
//! no sense for that kind of script is reported as
//! [`EngineError::UnsupportedEvent`](crate::EngineError::UnsupportedEvent).

use std::sync::Arc;

use sblp_core::timeline::Timeline;
use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// A looping timeline describing a weapon's bullet emission.
pub type FireControlScript = Timeline<ScriptEvent>;

/// A one-shot timeline describing when a level spawns its enemies.
pub type LevelScript = Timeline<ScriptEvent>;

// ---------------------------------------------------------------------------
// BulletType
// ---------------------------------------------------------------------------

/// Bullet kinds, each with its own sprite and hit box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BulletType {
    Pointy,
    Fireball,
}

impl BulletType {
    /// Half width and half height of the bullet's bounding box.
    pub fn half_extents(self) -> Vec2 {
        match self {
            BulletType::Pointy => Vec2::new(2.0, 2.0),
            BulletType::Fireball => Vec2::new(4.0, 4.0),
        }
    }
}

// ---------------------------------------------------------------------------
// FireEvent
// ---------------------------------------------------------------------------

/// One bullet emitted by a [`FireEvent`], relative to its spawner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BulletSpawn {
    pub bullet_type: BulletType,
    /// Offset from the spawner's position.
    pub relative_position: Vec2,
    /// Added to the spawner's velocity at the firing instant.
    pub relative_velocity: Vec2,
}

impl BulletSpawn {
    /// A bullet leaving the spawner's centre with the given relative velocity.
    pub const fn aimed(bullet_type: BulletType, dx: f32, dy: f32) -> Self {
        Self {
            bullet_type,
            relative_position: Vec2::ZERO,
            relative_velocity: Vec2::new(dx, dy),
        }
    }
}

/// A volley: every bullet spawned at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireEvent {
    pub bullets: Vec<BulletSpawn>,
}

impl FireEvent {
    pub fn new(bullets: impl Into<Vec<BulletSpawn>>) -> Self {
        Self {
            bullets: bullets.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// SpawnEvent
// ---------------------------------------------------------------------------

/// One enemy entering the level.
#[derive(Debug, Clone)]
pub struct SpawnEvent {
    /// Centre of the enemy at its spawn instant.
    pub center: Vec2,
    pub velocity: Vec2,
    pub hp: i32,
    /// Weapon script; `None` for an enemy that never fires.
    pub fire_control: Option<Arc<FireControlScript>>,
}

// ---------------------------------------------------------------------------
// ScriptEvent
// ---------------------------------------------------------------------------

/// Payload of every engine timeline.
#[derive(Debug, Clone)]
pub enum ScriptEvent {
    /// Emit a volley from the script's owner.
    Fire(FireEvent),
    /// Bring an enemy into the level.
    Spawn(SpawnEvent),
}

impl ScriptEvent {
    /// Short name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ScriptEvent::Fire(_) => "fire",
            ScriptEvent::Spawn(_) => "spawn",
        }
    }
}

impl From<FireEvent> for ScriptEvent {
    fn from(event: FireEvent) -> Self {
        ScriptEvent::Fire(event)
    }
}

impl From<SpawnEvent> for ScriptEvent {
    fn from(event: SpawnEvent) -> Self {
        ScriptEvent::Spawn(event)
    }
}
