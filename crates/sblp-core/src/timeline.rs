//! Immutable, time-sorted event schedules.
//!
//! A [`Timeline`] is the static half of script playback: *what* happens and
//! *when*, as offsets in milliseconds from the timeline start. Runners in
//! [`crate::runner`] hold the mutable half (how far playback has got), so one
//! timeline can be shared by any number of runners.
//!
//! # Example
//!
//! ```
//! use sblp_core::timeline::Timeline;
//!
//! // Wait 100ms, emit "a"; wait 100ms, emit "b"; then idle 300ms and repeat.
//! let timeline = Timeline::paced([(100, "a"), (100, "b")], 300, true).unwrap();
//! assert_eq!(timeline.offsets().collect::<Vec<_>>(), vec![100, 200]);
//! assert_eq!(timeline.total_duration(), 500);
//! ```

use serde::{Deserialize, Serialize};

use crate::TimelineError;

/// Simulation time and durations, in whole milliseconds.
pub type Millis = i64;

// ---------------------------------------------------------------------------
// TimelineEntry
// ---------------------------------------------------------------------------

/// One scheduled event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry<P> {
    /// Milliseconds from the timeline start.
    pub offset: Millis,
    pub payload: P,
}

impl<P> TimelineEntry<P> {
    pub fn new(offset: Millis, payload: P) -> Self {
        Self { offset, payload }
    }
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

/// An ordered, immutable sequence of [`TimelineEntry`]s.
///
/// Invariants, checked on construction:
///
/// - offsets are non-negative and non-decreasing;
/// - `total_duration` is at least the last offset;
/// - a looping timeline has a positive `total_duration` and no entry at
///   offset 0 (offset `total_duration` is the loop-boundary instant instead).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline<P> {
    entries: Vec<TimelineEntry<P>>,
    total_duration: Millis,
    looping: bool,
}

impl<P> Timeline<P> {
    /// Build a timeline from explicit entries.
    pub fn from_entries(
        entries: Vec<TimelineEntry<P>>,
        total_duration: Millis,
        looping: bool,
    ) -> Result<Self, TimelineError> {
        let mut previous = 0;
        for (index, entry) in entries.iter().enumerate() {
            if entry.offset < 0 {
                return Err(TimelineError::NegativeOffset {
                    index,
                    offset: entry.offset,
                });
            }
            if entry.offset < previous {
                return Err(TimelineError::Unsorted {
                    index,
                    offset: entry.offset,
                    previous,
                });
            }
            if looping && entry.offset == 0 {
                return Err(TimelineError::LoopingEntryAtZero { index });
            }
            previous = entry.offset;
        }

        if looping && total_duration <= 0 {
            return Err(TimelineError::NonPositiveLoop { total_duration });
        }
        if total_duration < previous {
            return Err(TimelineError::DurationTooShort {
                total_duration,
                last_offset: previous,
            });
        }

        Ok(Self {
            entries,
            total_duration,
            looping,
        })
    }

    /// Build a one-shot timeline that ends at its last entry.
    pub fn once(entries: Vec<TimelineEntry<P>>) -> Result<Self, TimelineError> {
        let total_duration = entries.last().map_or(0, |e| e.offset);
        Self::from_entries(entries, total_duration, false)
    }

    /// Build a timeline from `(delay, payload)` steps.
    ///
    /// Each payload lands `delay` milliseconds after the previous one (the
    /// first after the timeline start). `tail` is idle time appended after
    /// the last payload before the timeline ends or loops.
    pub fn paced(
        steps: impl IntoIterator<Item = (Millis, P)>,
        tail: Millis,
        looping: bool,
    ) -> Result<Self, TimelineError> {
        let mut cursor: Millis = 0;
        let mut entries = Vec::new();
        for (index, (delay, payload)) in steps.into_iter().enumerate() {
            if delay < 0 {
                return Err(TimelineError::NegativeDelay { index, delay });
            }
            cursor += delay;
            entries.push(TimelineEntry::new(cursor, payload));
        }
        if tail < 0 {
            return Err(TimelineError::NegativeDelay {
                index: entries.len(),
                delay: tail,
            });
        }
        Self::from_entries(entries, cursor + tail, looping)
    }

    pub fn entries(&self) -> &[TimelineEntry<P>] {
        &self.entries
    }

    /// Offsets of all entries, in order.
    pub fn offsets(&self) -> impl Iterator<Item = Millis> + '_ {
        self.entries.iter().map(|e| e.offset)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Length of one pass through the timeline.
    pub fn total_duration(&self) -> Millis {
        self.total_duration
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
