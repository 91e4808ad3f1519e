//! Bullets and enemies.

use std::sync::Arc;

use sblp_core::runner::LoopingRunner;
use sblp_core::timeline::Millis;
use serde::{Deserialize, Serialize};

use crate::event::{BulletType, FireControlScript, ScriptEvent, SpawnEvent};
use crate::math::{Rect, Vec2};

/// Half width and half height of an enemy's bounding box.
pub const ENEMY_HALF_EXTENTS: Vec2 = Vec2::new(8.0, 8.0);

/// Milliseconds to seconds, the unit velocities are expressed in.
pub fn seconds(ms: Millis) -> f32 {
    ms as f32 / 1000.0
}

// ---------------------------------------------------------------------------
// Bullet
// ---------------------------------------------------------------------------

/// A live bullet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    pub bullet_type: BulletType,
    pub position: Vec2,
    /// Units per second.
    pub velocity: Vec2,
    /// Set by hit logic; the bullet is removed at the end of the tick.
    pub dead: bool,
}

impl Bullet {
    pub fn new(bullet_type: BulletType, position: Vec2, velocity: Vec2) -> Self {
        Self {
            bullet_type,
            position,
            velocity,
            dead: false,
        }
    }

    pub fn bounding_box(&self) -> Rect {
        Rect::from_center(self.position, self.bullet_type.half_extents())
    }

    /// Straight-line motion over `dt`.
    pub fn integrate(&mut self, dt: Millis) {
        self.position += self.velocity * seconds(dt);
    }
}

// ---------------------------------------------------------------------------
// Enemy
// ---------------------------------------------------------------------------

/// A live enemy.
#[derive(Debug, Clone)]
pub struct Enemy {
    pub position: Vec2,
    /// Units per second.
    pub velocity: Vec2,
    pub hp: i32,
    /// Weapon playback, bound to the enemy's fire-control script.
    pub fire_control: Option<LoopingRunner<ScriptEvent>>,
}

impl Enemy {
    pub fn new(position: Vec2, velocity: Vec2, hp: i32) -> Self {
        Self {
            position,
            velocity,
            hp,
            fire_control: None,
        }
    }

    /// Arm the enemy with a fresh runner over `script`.
    pub fn with_fire_control(mut self, script: Arc<FireControlScript>) -> Self {
        self.fire_control = Some(LoopingRunner::new(script));
        self
    }

    /// The enemy described by a spawn event, at its spawn instant.
    pub fn from_spawn(spawn: &SpawnEvent) -> Self {
        let enemy = Self::new(spawn.center, spawn.velocity, spawn.hp);
        match &spawn.fire_control {
            Some(script) => enemy.with_fire_control(Arc::clone(script)),
            None => enemy,
        }
    }

    pub fn bounding_box(&self) -> Rect {
        Rect::from_center(self.position, ENEMY_HALF_EXTENTS)
    }

    pub fn is_defeated(&self) -> bool {
        self.hp <= 0
    }

    /// Straight-line motion over `dt`.
    pub fn integrate(&mut self, dt: Millis) {
        self.position += self.velocity * seconds(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::FirePattern;

    #[test]
    fn bullet_integrates_in_seconds() {
        let mut b = Bullet::new(BulletType::Pointy, Vec2::ZERO, Vec2::new(-100.0, 50.0));
        b.integrate(500);
        assert_eq!(b.position, Vec2::new(-50.0, 25.0));
    }

    #[test]
    fn bounding_boxes_follow_position() {
        let b = Bullet::new(BulletType::Fireball, Vec2::new(10.0, 10.0), Vec2::ZERO);
        assert_eq!(b.bounding_box().width(), 8.0);
        let e = Enemy::new(Vec2::new(100.0, 50.0), Vec2::ZERO, 1);
        assert_eq!(e.bounding_box().center(), Vec2::new(100.0, 50.0));
        assert_eq!(e.bounding_box().width(), 16.0);
    }

    #[test]
    fn enemy_from_spawn_binds_fresh_runner() {
        let spawn = SpawnEvent {
            center: Vec2::new(220.0, 75.0),
            velocity: Vec2::new(-100.0, 0.0),
            hp: 1,
            fire_control: Some(FirePattern::Shotgunner.script()),
        };
        let enemy = Enemy::from_spawn(&spawn);
        let runner = enemy.fire_control.as_ref().unwrap();
        assert_eq!(runner.elapsed(), 0);
        assert_eq!(runner.timeline().total_duration(), 1000);
        assert!(!enemy.is_defeated());
    }

    #[test]
    fn enemy_without_script_never_fires() {
        let spawn = SpawnEvent {
            center: Vec2::ZERO,
            velocity: Vec2::ZERO,
            hp: 0,
            fire_control: None,
        };
        let enemy = Enemy::from_spawn(&spawn);
        assert!(enemy.fire_control.is_none());
        assert!(enemy.is_defeated());
    }
}
