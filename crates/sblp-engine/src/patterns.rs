//! Built-in enemy fire patterns.
//!
//! Patterns are plain constant tables of `(delay, volley)` steps. Each table is
//! turned into a shared looping [`FireControlScript`] the first time it is
//! requested and reused by every enemy that fires it afterwards.

use std::sync::{Arc, LazyLock};

use sblp_core::timeline::{Millis, Timeline};
use serde::{Deserialize, Serialize};

use crate::event::{BulletSpawn, BulletType, FireControlScript, FireEvent, ScriptEvent};

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

const fn pointy(dx: f32, dy: f32) -> BulletSpawn {
    BulletSpawn::aimed(BulletType::Pointy, dx, dy)
}

// Aim directions, top to bottom. The enemies fly leftwards, so every shot
// has a negative x component.
const UP_2: BulletSpawn = pointy(-70.0, -100.0);
const UP_1: BulletSpawn = pointy(-90.0, -50.0);
const LEVEL: BulletSpawn = pointy(-100.0, 0.0);
const DOWN_1: BulletSpawn = pointy(-90.0, 50.0);
const DOWN_2: BulletSpawn = pointy(-70.0, 100.0);

const FAN: &[BulletSpawn] = &[UP_2, UP_1, LEVEL, DOWN_1, DOWN_2];

/// A pattern as data: volleys separated by delays, then idle time before the
/// pattern repeats.
struct PatternTable {
    steps: &'static [(Millis, &'static [BulletSpawn])],
    tail: Millis,
}

const SPRAYER: PatternTable = PatternTable {
    steps: &[
        (100, &[UP_2]),
        (100, &[UP_1]),
        (100, &[LEVEL]),
        (100, &[DOWN_1]),
        (100, &[DOWN_2]),
        (100, &[DOWN_1]),
        (100, &[LEVEL]),
        (100, &[UP_1]),
    ],
    tail: 0,
};

const SCANNER_DOWN: PatternTable = PatternTable {
    steps: &[
        (100, &[UP_2]),
        (100, &[UP_1]),
        (100, &[LEVEL]),
        (100, &[DOWN_1]),
        (100, &[DOWN_2]),
    ],
    tail: 0,
};

const SCANNER_UP: PatternTable = PatternTable {
    steps: &[
        (100, &[DOWN_2]),
        (100, &[DOWN_1]),
        (100, &[LEVEL]),
        (100, &[UP_1]),
        (100, &[UP_2]),
    ],
    tail: 0,
};

const DOUBLE_SPRAYER: PatternTable = PatternTable {
    steps: &[
        (150, &[UP_2, UP_1]),
        (150, &[UP_1, LEVEL]),
        (150, &[LEVEL, DOWN_1]),
        (150, &[DOWN_1, DOWN_2]),
        (150, &[LEVEL, DOWN_1]),
        (150, &[UP_1, LEVEL]),
    ],
    tail: 0,
};

const SHOTGUNNER: PatternTable = PatternTable {
    steps: &[(1000, FAN)],
    tail: 0,
};

const PULSE_SHOTGUNNER: PatternTable = PatternTable {
    steps: &[(500, FAN), (500, FAN), (500, FAN)],
    tail: 1500,
};

// ---------------------------------------------------------------------------
// FirePattern
// ---------------------------------------------------------------------------

/// The built-in fire patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FirePattern {
    /// Sweeps one shot at a time down then back up.
    Sprayer,
    /// Sweeps one shot at a time from top to bottom.
    ScannerDown,
    /// Sweeps one shot at a time from bottom to top.
    ScannerUp,
    /// Sweeps paired shots down and back.
    DoubleSprayer,
    /// A five-way fan every second.
    Shotgunner,
    /// Three fans in quick succession, then a long pause.
    PulseShotgunner,
}

impl FirePattern {
    pub const ALL: [FirePattern; 6] = [
        FirePattern::Sprayer,
        FirePattern::ScannerDown,
        FirePattern::ScannerUp,
        FirePattern::DoubleSprayer,
        FirePattern::Shotgunner,
        FirePattern::PulseShotgunner,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FirePattern::Sprayer => "sprayer",
            FirePattern::ScannerDown => "scanner_down",
            FirePattern::ScannerUp => "scanner_up",
            FirePattern::DoubleSprayer => "double_sprayer",
            FirePattern::Shotgunner => "shotgunner",
            FirePattern::PulseShotgunner => "pulse_shotgunner",
        }
    }

    fn table(self) -> &'static PatternTable {
        match self {
            FirePattern::Sprayer => &SPRAYER,
            FirePattern::ScannerDown => &SCANNER_DOWN,
            FirePattern::ScannerUp => &SCANNER_UP,
            FirePattern::DoubleSprayer => &DOUBLE_SPRAYER,
            FirePattern::Shotgunner => &SHOTGUNNER,
            FirePattern::PulseShotgunner => &PULSE_SHOTGUNNER,
        }
    }

    /// The shared script for this pattern.
    pub fn script(self) -> Arc<FireControlScript> {
        static SCRIPTS: LazyLock<[Arc<FireControlScript>; 6]> =
            LazyLock::new(|| FirePattern::ALL.map(|p| Arc::new(p.build())));

        // `ALL` lists the variants in declaration order.
        Arc::clone(&SCRIPTS[self as usize])
    }

    fn build(self) -> FireControlScript {
        let table = self.table();
        let steps = table
            .steps
            .iter()
            .map(|&(delay, volley)| (delay, ScriptEvent::Fire(FireEvent::new(volley))));
        // The tables above are compile-time data; a malformed one is a bug.
        Timeline::paced(steps, table.tail, true)
            .unwrap_or_else(|e| panic!("fire pattern '{}' is malformed: {e}", self.name()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn volley_sizes(script: &FireControlScript) -> Vec<usize> {
        script
            .entries()
            .iter()
            .map(|e| match &e.payload {
                ScriptEvent::Fire(fire) => fire.bullets.len(),
                ScriptEvent::Spawn(_) => panic!("fire pattern contains a spawn"),
            })
            .collect()
    }

    #[test]
    fn every_pattern_builds_and_loops() {
        for pattern in FirePattern::ALL {
            let script = pattern.script();
            assert!(script.is_looping(), "{} should loop", pattern.name());
            assert!(script.total_duration() > 0);
        }
    }

    #[test]
    fn scripts_are_shared() {
        let a = FirePattern::Sprayer.script();
        let b = FirePattern::Sprayer.script();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &FirePattern::ScannerUp.script()));
    }

    #[test]
    fn sprayer_timing() {
        let script = FirePattern::Sprayer.script();
        assert_eq!(
            script.offsets().collect::<Vec<_>>(),
            vec![100, 200, 300, 400, 500, 600, 700, 800]
        );
        assert_eq!(script.total_duration(), 800);
        assert_eq!(volley_sizes(&script), vec![1; 8]);
    }

    #[test]
    fn scanners_sweep_in_opposite_directions() {
        let first_dy = |pattern: FirePattern| match &pattern.script().entries()[0].payload {
            ScriptEvent::Fire(fire) => fire.bullets[0].relative_velocity.y,
            ScriptEvent::Spawn(_) => unreachable!(),
        };
        assert_eq!(first_dy(FirePattern::ScannerDown), -100.0);
        assert_eq!(first_dy(FirePattern::ScannerUp), 100.0);
    }

    #[test]
    fn double_sprayer_fires_pairs() {
        let script = FirePattern::DoubleSprayer.script();
        assert_eq!(script.total_duration(), 900);
        assert_eq!(volley_sizes(&script), vec![2; 6]);
    }

    #[test]
    fn shotgunner_fires_fan_on_boundary() {
        let script = FirePattern::Shotgunner.script();
        assert_eq!(script.offsets().collect::<Vec<_>>(), vec![1000]);
        assert_eq!(script.total_duration(), 1000);
        assert_eq!(volley_sizes(&script), vec![5]);
    }

    #[test]
    fn pulse_shotgunner_pauses_after_bursts() {
        let script = FirePattern::PulseShotgunner.script();
        assert_eq!(
            script.offsets().collect::<Vec<_>>(),
            vec![500, 1000, 1500]
        );
        assert_eq!(script.total_duration(), 3000);
        assert_eq!(volley_sizes(&script), vec![5, 5, 5]);
    }
}
