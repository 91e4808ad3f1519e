//! Simulation state and the per-tick update.
//!
//! The [`Simulation`] owns every live bullet and enemy together with the
//! runners that drive them. One call to [`Simulation::step`] advances the
//! whole state by one fixed tick:
//!
//! 1. Record the bullet and enemy watermarks (counts before any spawn).
//! 2. Run each level script to the new time. A spawned enemy is immediately
//!    advanced by the part of the tick after its spawn instant.
//! 3. Enemies below the watermark run their fire control for the full tick,
//!    then move.
//! 4. Bullets below the watermark move.
//! 5. Dead or out-of-bounds entities are removed; finished scripts dropped.
//!
//! Entities created during a tick are appended after the watermarks, so they
//! are never advanced twice in the tick that created them: their spawn
//! already placed them where they belong at the end of the tick.

use std::sync::Arc;

use sblp_core::arena::{Arena, Handle};
use sblp_core::runner::{Firing, SequentialRunner};
use sblp_core::timeline::Millis;
use serde::{Deserialize, Serialize};

use crate::entity::{seconds, Bullet, Enemy};
use crate::event::{LevelScript, ScriptEvent, SpawnEvent};
use crate::level::LevelDescription;
use crate::math::{Rect, Vec2};
use crate::EngineError;

// ---------------------------------------------------------------------------
// RemovalConfig
// ---------------------------------------------------------------------------

/// When entities leave the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemovalConfig {
    /// Entities whose position is further than this outside the level
    /// bounds are removed.
    pub cull_margin: f32,
}

impl Default for RemovalConfig {
    fn default() -> Self {
        Self { cull_margin: 64.0 }
    }
}

// ---------------------------------------------------------------------------
// TickReport
// ---------------------------------------------------------------------------

/// What happened during the last tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// Tick number, starting at 1 for the first tick.
    pub tick: u64,
    /// Logical time at the end of the tick.
    pub time: Millis,
    pub enemies_spawned: usize,
    pub bullets_spawned: usize,
    pub enemies_removed: usize,
    pub bullets_removed: usize,
    pub scripts_finished: usize,
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// Every live entity plus the scripts that spawn them.
#[derive(Debug, Clone)]
pub struct Simulation {
    bullets: Arena<Bullet>,
    enemies: Arena<Enemy>,
    /// Level scripts still playing.
    scripts: Vec<SequentialRunner<ScriptEvent>>,
    bounds: Rect,
    removal: RemovalConfig,
    /// Logical time in milliseconds.
    time: Millis,
    tick_counter: u64,
    last_report: TickReport,
}

impl Simulation {
    /// An empty simulation framed by `bounds`, with no scripts.
    pub fn empty(bounds: Rect, removal: RemovalConfig) -> Self {
        Self {
            bullets: Arena::new(),
            enemies: Arena::new(),
            scripts: Vec::new(),
            bounds,
            removal,
            time: 0,
            tick_counter: 0,
            last_report: TickReport::default(),
        }
    }

    /// A simulation playing `level` from its start.
    pub fn new(level: &LevelDescription, removal: RemovalConfig) -> Self {
        let mut simulation = Self::empty(level.bounds, removal);
        simulation.add_script(Arc::clone(&level.script));
        tracing::debug!(
            level = %level.name,
            spawns = level.spawn_count(),
            "level started"
        );
        simulation
    }

    /// Start playing another level script. Its offsets are measured from
    /// time 0, not from the current time.
    pub fn add_script(&mut self, script: Arc<LevelScript>) {
        self.scripts.push(SequentialRunner::new(script));
    }

    /// Insert an enemy directly, outside any script.
    pub fn spawn_enemy(&mut self, enemy: Enemy) -> Handle {
        self.enemies.insert(enemy)
    }

    /// Insert a bullet directly, outside any script.
    pub fn spawn_bullet(&mut self, bullet: Bullet) -> Handle {
        self.bullets.insert(bullet)
    }

    /// Remove `amount` hp from an enemy. Returns `false` if the enemy is
    /// gone. A defeated enemy is removed at the end of the next tick.
    pub fn damage_enemy(&mut self, handle: Handle, amount: i32) -> bool {
        match self.enemies.get_mut(handle) {
            Some(enemy) => {
                enemy.hp -= amount;
                true
            }
            None => false,
        }
    }

    /// Mark a bullet dead. Returns `false` if the bullet is gone.
    pub fn kill_bullet(&mut self, handle: Handle) -> bool {
        match self.bullets.get_mut(handle) {
            Some(bullet) => {
                bullet.dead = true;
                true
            }
            None => false,
        }
    }

    /// Advance the simulation by one tick of `dt` milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnsupportedEvent`] when a script holds an event
    /// that makes no sense in its context. The tick is abandoned at that
    /// point; entities spawned before the error stay in place.
    pub fn step(&mut self, dt: Millis) -> Result<&TickReport, EngineError> {
        let dt = if dt < 0 {
            tracing::warn!(dt, "negative tick length clamped to zero");
            0
        } else {
            dt
        };

        let bullet_watermark = self.bullets.watermark();
        let enemy_watermark = self.enemies.watermark();
        self.time += dt;
        self.tick_counter += 1;

        let Self {
            bullets,
            enemies,
            scripts,
            time,
            ..
        } = self;

        // Level scripts.
        for runner in scripts.iter_mut() {
            runner.update_to(*time, |event, firing| match event {
                ScriptEvent::Spawn(spawn) => {
                    spawn_from_script(spawn, firing, dt, enemies, bullets).map(|_| ())
                }
                ScriptEvent::Fire(_) => Err(EngineError::UnsupportedEvent {
                    event: event.kind(),
                    script: "level",
                }),
            })?;
        }
        let enemies_spawned = enemies.len() - enemy_watermark;

        // Enemies that existed before this tick.
        for enemy in &mut enemies.values_mut()[..enemy_watermark] {
            advance_enemy(enemy, dt, bullets)?;
        }

        // Bullets that existed before this tick.
        for bullet in &mut bullets.values_mut()[..bullet_watermark] {
            bullet.integrate(dt);
        }
        let bullets_spawned = bullets.len() - bullet_watermark;

        // Removal.
        let keep_area = self.bounds.expanded(self.removal.cull_margin);
        let bullets_removed = self
            .bullets
            .retain(|_, b| !b.dead && keep_area.contains(b.position));
        let enemies_removed = self
            .enemies
            .retain(|_, e| !e.is_defeated() && keep_area.contains(e.position));
        let scripts_before = self.scripts.len();
        self.scripts.retain(|runner| !runner.is_done());
        let scripts_finished = scripts_before - self.scripts.len();
        if scripts_finished > 0 {
            tracing::debug!(
                time = self.time,
                remaining = self.scripts.len(),
                "level script finished"
            );
        }

        self.last_report = TickReport {
            tick: self.tick_counter,
            time: self.time,
            enemies_spawned,
            bullets_spawned,
            enemies_removed,
            bullets_removed,
            scripts_finished,
        };
        tracing::trace!(report = ?self.last_report, "tick");
        Ok(&self.last_report)
    }

    // -- accessors ----------------------------------------------------------

    pub fn bullets(&self) -> &Arena<Bullet> {
        &self.bullets
    }

    pub fn enemies(&self) -> &Arena<Enemy> {
        &self.enemies
    }

    /// Level scripts still playing.
    pub fn scripts(&self) -> &[SequentialRunner<ScriptEvent>] {
        &self.scripts
    }

    /// Logical time in milliseconds.
    pub fn time(&self) -> Millis {
        self.time
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn removal(&self) -> RemovalConfig {
        self.removal
    }

    pub fn last_report(&self) -> &TickReport {
        &self.last_report
    }

    /// `true` once every script has finished and every enemy is gone.
    pub fn is_level_complete(&self) -> bool {
        self.scripts.is_empty() && self.enemies.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Entity updates
// ---------------------------------------------------------------------------

/// Create the enemy a level script asked for and bring it up to the end of
/// the tick.
fn spawn_from_script(
    spawn: &SpawnEvent,
    firing: Firing,
    dt: Millis,
    enemies: &mut Arena<Enemy>,
    bullets: &mut Arena<Bullet>,
) -> Result<Handle, EngineError> {
    let mut enemy = Enemy::from_spawn(spawn);
    // A script added late reports its whole backlog; the enemy only lives
    // through the current tick.
    advance_enemy(&mut enemy, firing.dt_post.min(dt), bullets)?;
    Ok(enemies.insert(enemy))
}

/// Run an enemy's fire control over `dt`, spawning its bullets, then move it.
///
/// A bullet fired `dt_pre` into the window leaves from where the enemy was at
/// that instant and travels at its own velocity for the remaining `dt_post`.
pub(crate) fn advance_enemy(
    enemy: &mut Enemy,
    dt: Millis,
    bullets: &mut Arena<Bullet>,
) -> Result<usize, EngineError> {
    let Enemy {
        position,
        velocity,
        fire_control,
        ..
    } = enemy;

    let mut fired = 0;
    if let Some(runner) = fire_control {
        runner.update(dt, |event, firing| match event {
            ScriptEvent::Fire(fire) => {
                for spawn in &fire.bullets {
                    let bullet_velocity = *velocity + spawn.relative_velocity;
                    let origin = *position + spawn.relative_position;
                    let at = bullet_spawn_position(origin, *velocity, bullet_velocity, firing);
                    bullets.insert(Bullet::new(spawn.bullet_type, at, bullet_velocity));
                }
                fired += fire.bullets.len();
                Ok(())
            }
            ScriptEvent::Spawn(_) => Err(EngineError::UnsupportedEvent {
                event: event.kind(),
                script: "fire control",
            }),
        })?;
    }

    *position += *velocity * seconds(dt);
    Ok(fired)
}

/// Where a bullet fired inside an update window is at the window's end.
pub fn bullet_spawn_position(
    spawner_position: Vec2,
    spawner_velocity: Vec2,
    bullet_velocity: Vec2,
    firing: Firing,
) -> Vec2 {
    spawner_position + spawner_velocity * firing.pre_seconds() + bullet_velocity * firing.post_seconds()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
