//! End-to-end simulation tests: spawning, sub-tick placement, removal and
//! fixed-step determinism, driven through the public API.

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use sblp_engine::level::field_bounds;
use sblp_engine::prelude::*;

// -- Helpers ----------------------------------------------------------------

fn level_one_driver() -> FixedStepDriver {
    let simulation = Simulation::new(&level_one(), RemovalConfig::default());
    FixedStepDriver::new(simulation, DriverConfig::default())
}

fn single_spawn_level(offset: Millis, spawn: SpawnEvent) -> LevelDescription {
    LevelDescription::from_waves("single", field_bounds(), [(offset, vec![spawn])]).unwrap()
}

/// A looping gun firing one level shot `delay` into every `delay + tail`.
fn gun(delay: Millis, tail: Millis) -> Arc<FireControlScript> {
    let volley = FireEvent::new([BulletSpawn::aimed(BulletType::Pointy, -50.0, 0.0)]);
    Arc::new(Timeline::paced([(delay, ScriptEvent::Fire(volley))], tail, true).unwrap())
}

// -- Spawning ---------------------------------------------------------------

#[test]
fn spawned_enemy_gets_remainder_then_full_steps() {
    let center = Vec2::new(150.0, 75.0);
    let velocity = Vec2::new(-100.0, 0.0);
    let level = single_spawn_level(
        1000,
        SpawnEvent {
            center,
            velocity,
            hp: 1,
            fire_control: None,
        },
    );
    let mut sim = Simulation::new(&level, RemovalConfig::default());

    // 16ms ticks: the entry at 1000ms is due in the tick ending at 1008ms.
    for _ in 0..62 {
        sim.step(16).unwrap();
    }
    assert!(sim.enemies().is_empty());

    sim.step(16).unwrap();
    assert_eq!(sim.time(), 1008);
    let mut expected = center;
    expected += velocity * 0.008;
    assert_eq!(sim.enemies().values()[0].position, expected);

    sim.step(16).unwrap();
    expected += velocity * 0.016;
    assert_eq!(sim.enemies().values()[0].position, expected);
}

#[test]
fn spawn_tick_fires_weapon_for_remainder_only() {
    let level = single_spawn_level(
        1000,
        SpawnEvent {
            center: Vec2::new(150.0, 75.0),
            velocity: Vec2::ZERO,
            hp: 1,
            fire_control: Some(gun(4, 96)),
        },
    );
    let mut sim = Simulation::new(&level, RemovalConfig::default());
    for _ in 0..63 {
        sim.step(16).unwrap();
    }
    // Spawned 8ms before the tick ended; the gun's first shot 4ms later.
    let bullet = &sim.bullets().values()[0];
    assert_eq!(sim.bullets().len(), 1);
    assert_eq!(
        bullet.position,
        Vec2::new(150.0, 75.0) + Vec2::new(-50.0, 0.0) * 0.004
    );
    let enemy = &sim.enemies().values()[0];
    assert_eq!(enemy.fire_control.as_ref().unwrap().elapsed(), 8);
}

#[test]
fn bullet_placement_splits_the_tick_exactly() {
    let p = Vec2::new(120.0, 60.0);
    let v = Vec2::new(-100.0, 20.0);
    let mut simulation = Simulation::empty(field_bounds(), RemovalConfig::default());
    simulation.spawn_enemy(Enemy::new(p, v, 1).with_fire_control(gun(30, 970)));
    let mut driver = FixedStepDriver::new(
        simulation,
        DriverConfig {
            step_ms: 100,
            ..Default::default()
        },
    );

    assert_eq!(driver.advance(101).unwrap(), 1);

    let bullet = &driver.simulation().bullets().values()[0];
    let bv = v + Vec2::new(-50.0, 0.0);
    assert_eq!(bullet.velocity, bv);
    assert_eq!(bullet.position, p + v * 0.030 + bv * 0.070);
}

#[test]
fn long_tick_fires_every_loop_it_spans() {
    let mut sim = Simulation::empty(field_bounds(), RemovalConfig::default());
    sim.spawn_enemy(
        Enemy::new(Vec2::new(100.0, 75.0), Vec2::ZERO, 1)
            .with_fire_control(FirePattern::Shotgunner.script()),
    );
    let report = sim.step(2000).unwrap().clone();
    assert_eq!(report.bullets_spawned, 10);

    // The first fan has travelled a full second, the second not at all.
    let level_shots: Vec<_> = sim
        .bullets()
        .values()
        .iter()
        .filter(|b| b.velocity.y == 0.0)
        .map(|b| b.position)
        .collect();
    assert_eq!(
        level_shots,
        vec![Vec2::new(100.0, 75.0) + Vec2::new(-100.0, 0.0) * 1.0, Vec2::new(100.0, 75.0)]
    );
}

// -- Removal ----------------------------------------------------------------

#[test]
fn destroyed_enemy_stops_firing() {
    let mut sim = Simulation::empty(field_bounds(), RemovalConfig::default());
    let handle = sim.spawn_enemy(
        Enemy::new(Vec2::new(100.0, 75.0), Vec2::ZERO, 2)
            .with_fire_control(FirePattern::Sprayer.script()),
    );
    sim.step(150).unwrap();
    assert_eq!(sim.bullets().len(), 1);

    assert!(sim.damage_enemy(handle, 2));
    // Still present until the end of the tick in which it matched.
    assert!(sim.enemies().contains(handle));
    let report = sim.step(16).unwrap().clone();
    assert_eq!(report.enemies_removed, 1);
    assert!(!sim.enemies().contains(handle));

    let bullets = sim.bullets().len();
    sim.step(1000).unwrap();
    assert!(sim.bullets().len() <= bullets, "a removed enemy must not fire");
}

#[test]
fn entities_leaving_the_field_are_culled() {
    let mut sim = Simulation::empty(field_bounds(), RemovalConfig { cull_margin: 10.0 });
    let enemy = sim.spawn_enemy(Enemy::new(Vec2::new(0.0, 75.0), Vec2::new(-100.0, 0.0), 1));
    sim.step(100).unwrap();
    assert!(sim.enemies().contains(enemy), "-10 is on the margin");
    sim.step(16).unwrap();
    assert!(!sim.enemies().contains(enemy));
}

// -- Level one --------------------------------------------------------------

#[test]
fn level_one_plays_to_completion() {
    let mut driver = level_one_driver();
    let mut spawned = 0;
    let mut peak_bullets = 0;

    while !driver.simulation().is_level_complete() {
        assert!(driver.real_time() < 20_000, "level one should finish");
        if driver.advance(16).unwrap() > 0 {
            spawned += driver.simulation().last_report().enemies_spawned;
        }
        peak_bullets = peak_bullets.max(driver.simulation().bullets().len());
    }

    assert_eq!(spawned, 12);
    assert!(peak_bullets > 0);
    assert!(driver.simulation().scripts().is_empty());
}

#[test]
fn level_one_waves_arrive_on_schedule() {
    let mut driver = level_one_driver();
    driver.advance(1000).unwrap();
    assert!(driver.simulation().enemies().is_empty());
    driver.advance(16).unwrap();
    assert_eq!(driver.simulation().enemies().len(), 3);

    let view = driver.frame_view();
    assert_eq!(view.enemies.len(), 3);
    for sprite in &view.enemies {
        assert_eq!(sprite.kind, SpriteKind::Enemy);
        assert_eq!(
            sprite.render_position,
            sprite.position + view.tween * sprite.velocity
        );
    }
}

// -- Determinism ------------------------------------------------------------

fn run_jittered(seed: u64, duration: Millis) -> FixedStepDriver {
    let mut driver = level_one_driver();
    let mut rng = Pcg32::seed_from_u64(seed);
    while driver.real_time() < duration {
        driver.advance(rng.gen_range(1..=50)).unwrap();
    }
    driver
}

#[test]
fn same_frames_same_hash() {
    let a = run_jittered(11, 6000);
    let b = run_jittered(11, 6000);
    assert_eq!(a.state_hash(), b.state_hash());
    assert_eq!(a.real_time(), b.real_time());
}

#[test]
fn frame_pacing_does_not_change_the_simulation() {
    let jittered = run_jittered(23, 6000);

    let mut steady = level_one_driver();
    steady.advance(jittered.real_time()).unwrap();

    assert_eq!(steady.tick_count(), jittered.tick_count());
    assert_eq!(steady.state_hash(), jittered.state_hash());
    assert_eq!(steady.tween(), jittered.tween());
}

#[test]
fn snapshot_hash_is_blake3_hex() {
    let driver = run_jittered(3, 2500);
    let snapshot = driver.capture_snapshot();
    assert_eq!(snapshot.hash.len(), 64);
    assert!(snapshot.hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    assert_eq!(snapshot.hash, driver.state_hash());
    assert!(snapshot.verify());
    assert_eq!(snapshot.enemies.len(), driver.simulation().enemies().len());
}
