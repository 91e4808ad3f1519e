//! SBLP Core -- timelines, script runners, clocks and entity storage.
//!
//! This crate holds the deterministic building blocks the SBLP engine is made
//! of. Nothing here knows about bullets or enemies: timelines are generic over
//! their payload, runners report *when* an entry fires inside an update window
//! and leave *what* happens to the caller.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use sblp_core::prelude::*;
//!
//! // Fire "pew" 100ms into every 250ms pass.
//! let pattern = Arc::new(Timeline::paced([(100, "pew")], 150, true).unwrap());
//! let mut runner = LoopingRunner::new(pattern);
//!
//! let mut shots = Vec::new();
//! runner
//!     .update(600, |payload, firing| {
//!         shots.push((*payload, firing.dt_post));
//!         Ok::<_, std::convert::Infallible>(())
//!     })
//!     .unwrap();
//!
//! // Instants 100, 350 and 600 all fall inside the 600ms window.
//! assert_eq!(shots, vec![("pew", 500), ("pew", 250), ("pew", 0)]);
//! assert_eq!(runner.elapsed(), 100);
//! ```

#![deny(unsafe_code)]

pub mod arena;
pub mod clock;
pub mod runner;
pub mod timeline;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Malformed timeline data.
///
/// Timelines are static script data, so every variant is a programming error
/// in the script tables rather than a runtime condition to recover from.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimelineError {
    /// An entry is scheduled before the timeline start.
    #[error("timeline entry {index} has negative offset {offset}ms")]
    NegativeOffset { index: usize, offset: timeline::Millis },

    /// Entries are not sorted by offset.
    #[error("timeline entry {index} at {offset}ms comes after an entry at {previous}ms")]
    Unsorted {
        index: usize,
        offset: timeline::Millis,
        previous: timeline::Millis,
    },

    /// A paced step (or the tail) has a negative delay.
    #[error("negative delay {delay}ms before timeline step {index}")]
    NegativeDelay { index: usize, delay: timeline::Millis },

    /// The total duration ends before the last entry.
    #[error("total duration {total_duration}ms ends before the last entry at {last_offset}ms")]
    DurationTooShort {
        total_duration: timeline::Millis,
        last_offset: timeline::Millis,
    },

    /// A looping timeline must take time to loop.
    #[error("looping timeline needs a positive total duration, got {total_duration}ms")]
    NonPositiveLoop { total_duration: timeline::Millis },

    /// Offset 0 of a looping timeline is never inside a playback window; the
    /// same instant is expressed as offset `total_duration`.
    #[error("looping timeline entry {index} is at offset 0; schedule it at the total duration instead")]
    LoopingEntryAtZero { index: usize },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::arena::{Arena, Handle};
    pub use crate::clock::{Clock, ManualTimeSource, SystemTimeSource, TimeSource};
    pub use crate::runner::{Firing, LoopingRunner, SequentialRunner};
    pub use crate::timeline::{Millis, Timeline, TimelineEntry};
    pub use crate::TimelineError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    enum Cue {
        Spawn(&'static str),
        Shoot,
    }

    #[test]
    fn shared_timeline_drives_independent_runners() {
        let pattern = Arc::new(Timeline::paced([(100, Cue::Shoot)], 100, true).unwrap());
        let mut early = LoopingRunner::new(Arc::clone(&pattern));
        let mut late = LoopingRunner::new(Arc::clone(&pattern));

        let mut early_shots = 0;
        let mut late_shots = 0;
        early
            .update(450, |_, _| {
                early_shots += 1;
                Ok::<_, TimelineError>(())
            })
            .unwrap();
        late.update(150, |_, _| {
            late_shots += 1;
            Ok::<_, TimelineError>(())
        })
        .unwrap();

        assert_eq!(early_shots, 2);
        assert_eq!(late_shots, 1);
        assert_eq!(Arc::strong_count(&pattern), 3);
    }

    #[test]
    fn runners_feed_an_arena() {
        let level = Arc::new(
            Timeline::once(vec![
                TimelineEntry::new(10, Cue::Spawn("a")),
                TimelineEntry::new(20, Cue::Spawn("b")),
            ])
            .unwrap(),
        );
        let mut runner = SequentialRunner::new(level);
        let mut arena = Arena::new();

        for time in [16, 32] {
            runner
                .update_to(time, |cue, firing| match cue {
                    Cue::Spawn(name) => {
                        arena.insert((*name, firing.dt_post));
                        Ok(())
                    }
                    Cue::Shoot => Err("shoot cue in a spawn script"),
                })
                .unwrap();
        }

        assert!(runner.is_done());
        assert_eq!(arena.values(), &[("a", 6), ("b", 12)]);
    }

    #[test]
    fn error_display_is_descriptive() {
        let err = TimelineError::Unsorted {
            index: 3,
            offset: 10,
            previous: 20,
        };
        assert_eq!(
            err.to_string(),
            "timeline entry 3 at 10ms comes after an entry at 20ms"
        );
    }
}
