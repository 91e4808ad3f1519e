//! Level descriptions and the built-in level.
//!
//! A level is a name, the rectangle the camera frames, and a one-shot
//! [`LevelScript`] that spawns enemies. Waves share an offset: every enemy of
//! a wave enters on the same instant, in formation order.

use std::sync::{Arc, LazyLock};

use sblp_core::timeline::{Millis, Timeline, TimelineEntry};

use crate::event::{LevelScript, ScriptEvent, SpawnEvent};
use crate::math::{Rect, Vec2};
use crate::patterns::FirePattern;
use crate::EngineError;

/// Width of the playfield in world units.
pub const FIELD_WIDTH: f32 = 200.0;
/// Height of the playfield in world units.
pub const FIELD_HEIGHT: f32 = 150.0;

/// x coordinate where formation leaders enter, just past the right edge.
const ENTRY_X: f32 = 220.0;
/// Spacing between ranks of a formation, along both axes.
const RANK_SPACING: f32 = 20.0;
const FORMATION_VELOCITY: Vec2 = Vec2::new(-100.0, 0.0);
const FORMATION_HP: i32 = 1;

// ---------------------------------------------------------------------------
// LevelDescription
// ---------------------------------------------------------------------------

/// Static description of a level.
#[derive(Debug, Clone)]
pub struct LevelDescription {
    pub name: String,
    /// Camera framing; also the reference rectangle for culling.
    pub bounds: Rect,
    pub script: Arc<LevelScript>,
}

impl LevelDescription {
    /// Build a level from `(offset, spawns)` waves, in time order.
    pub fn from_waves(
        name: impl Into<String>,
        bounds: Rect,
        waves: impl IntoIterator<Item = (Millis, Vec<SpawnEvent>)>,
    ) -> Result<Self, EngineError> {
        let entries = waves
            .into_iter()
            .flat_map(|(offset, spawns)| {
                spawns
                    .into_iter()
                    .map(move |spawn| TimelineEntry::new(offset, ScriptEvent::Spawn(spawn)))
            })
            .collect();
        Ok(Self {
            name: name.into(),
            bounds,
            script: Arc::new(Timeline::once(entries)?),
        })
    }

    /// Number of enemies the level spawns.
    pub fn spawn_count(&self) -> usize {
        self.script
            .entries()
            .iter()
            .filter(|e| matches!(e.payload, ScriptEvent::Spawn(_)))
            .count()
    }
}

/// The playfield rectangle shared by the built-in levels.
pub fn field_bounds() -> Rect {
    Rect::from_origin_size(Vec2::ZERO, FIELD_WIDTH, FIELD_HEIGHT)
}

// ---------------------------------------------------------------------------
// Formations
// ---------------------------------------------------------------------------

/// A V formation of `count` enemies flying left along row `row_y`.
///
/// The leader enters at the right edge; each further rank trails 20 units
/// behind and 20 units wider, alternating above and below the row.
///
/// # Panics
///
/// Panics if `count` is zero.
pub fn v_formation(count: usize, row_y: f32, pattern: Option<FirePattern>) -> Vec<SpawnEvent> {
    assert!(count > 0, "a formation needs at least one enemy");
    (0..count)
        .map(|i| {
            let rank = i.div_ceil(2) as f32;
            let side = if i % 2 == 1 { 1.0 } else { -1.0 };
            SpawnEvent {
                center: Vec2::new(
                    ENTRY_X + RANK_SPACING * rank,
                    row_y + side * RANK_SPACING * rank,
                ),
                velocity: FORMATION_VELOCITY,
                hp: FORMATION_HP,
                fire_control: pattern.map(FirePattern::script),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Level one
// ---------------------------------------------------------------------------

struct Wave {
    offset: Millis,
    row_y: f32,
    size: usize,
    pattern: FirePattern,
}

const LEVEL_ONE_WAVES: &[Wave] = &[
    Wave { offset: 1000, row_y: 75.0, size: 3, pattern: FirePattern::Sprayer },
    Wave { offset: 2000, row_y: 25.0, size: 3, pattern: FirePattern::ScannerDown },
    Wave { offset: 3000, row_y: 125.0, size: 3, pattern: FirePattern::ScannerUp },
    Wave { offset: 4000, row_y: 75.0, size: 3, pattern: FirePattern::Shotgunner },
];

/// The first level: four waves of three.
pub fn level_one() -> LevelDescription {
    static LEVEL_ONE: LazyLock<LevelDescription> = LazyLock::new(|| {
        let waves = LEVEL_ONE_WAVES
            .iter()
            .map(|w| (w.offset, v_formation(w.size, w.row_y, Some(w.pattern))));
        LevelDescription::from_waves("Level 1", field_bounds(), waves)
            .unwrap_or_else(|e| panic!("level one table is malformed: {e}"))
    });
    LEVEL_ONE.clone()
}
