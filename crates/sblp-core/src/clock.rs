//! Wall-clock sampling.
//!
//! A [`Clock`] turns successive millisecond readings from a [`TimeSource`] into
//! a per-frame delta and a monotonic elapsed time. Readings are 32-bit and
//! allowed to wrap, as multimedia timers do after ~49 days.

use std::cell::Cell;
use std::time::Instant;

use crate::timeline::Millis;

// ---------------------------------------------------------------------------
// TimeSource
// ---------------------------------------------------------------------------

/// A millisecond counter.
pub trait TimeSource {
    /// Current reading. Only differences between readings are meaningful.
    fn now_ms(&self) -> u32;
}

/// Reads the monotonic system clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> u32 {
        // Truncation wraps the counter, which Clock handles.
        self.origin.elapsed().as_millis() as u32
    }
}

/// A hand-driven counter for tests and headless runs.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    now: Cell<u32>,
}

impl ManualTimeSource {
    pub fn new(start: u32) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Move the counter forward, wrapping at `u32::MAX`.
    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }

    pub fn set(&self, ms: u32) {
        self.now.set(ms);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Frame delta and elapsed time derived from a [`TimeSource`].
///
/// Cloning a clock copies its full state, so a clone continues from the same
/// reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clock {
    previous: u32,
    delta_ms: Millis,
    elapsed_ms: Millis,
}

impl Clock {
    /// Start a clock at the source's current reading.
    pub fn new(source: &impl TimeSource) -> Self {
        Self::starting_at(source.now_ms())
    }

    /// Start a clock at an explicit reading.
    pub fn starting_at(reading: u32) -> Self {
        Self {
            previous: reading,
            delta_ms: 0,
            elapsed_ms: 0,
        }
    }

    /// Sample the source and return the delta since the previous sample.
    pub fn update(&mut self, source: &impl TimeSource) -> Millis {
        self.update_at(source.now_ms())
    }

    /// Record an explicit reading and return the delta since the previous one.
    ///
    /// The difference is taken modulo 2^32, so a counter that wrapped still
    /// yields the true short delta. A reading behind the previous one yields a
    /// zero delta and keeps elapsed time monotonic.
    pub fn update_at(&mut self, reading: u32) -> Millis {
        let raw = reading.wrapping_sub(self.previous) as i32;
        let delta = if raw < 0 {
            tracing::warn!(
                previous = self.previous,
                reading,
                "time source went backwards; clamping frame delta to zero"
            );
            0
        } else {
            Millis::from(raw)
        };
        self.previous = reading;
        self.delta_ms = delta;
        self.elapsed_ms += delta;
        delta
    }

    /// Delta produced by the latest update.
    pub fn delta_ms(&self) -> Millis {
        self.delta_ms
    }

    /// Sum of all deltas since the clock started.
    pub fn elapsed_ms(&self) -> Millis {
        self.elapsed_ms
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
