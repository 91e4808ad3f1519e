//! Timeline playback.
//!
//! Two runners share the same firing contract: every due entry is handed to a
//! caller-supplied callback together with a [`Firing`] describing *where inside
//! the update window* the entry's instant lies. Callers use that to place
//! spawned objects with sub-update precision instead of snapping them to the
//! window start.
//!
//! - [`SequentialRunner`] plays a timeline once, front to back, with a cursor.
//! - [`LoopingRunner`] replays a looping timeline forever and catches up on
//!   every loop boundary crossed by a single long update.
//!
//! Callbacks return `Result`; the first error stops playback and is returned
//! to the caller unchanged.

use std::sync::Arc;

use crate::timeline::{Millis, Timeline};

// ---------------------------------------------------------------------------
// Firing
// ---------------------------------------------------------------------------

/// Timing of one entry firing inside an update window.
///
/// `dt_pre + dt_post` is the part of the update window that the entry splits:
/// the whole `dt` for a [`LoopingRunner`], the span since the previous
/// `update_to` for a [`SequentialRunner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Firing {
    /// The entry's offset within its timeline.
    pub offset: Millis,
    /// Time from the window start to the entry's instant.
    pub dt_pre: Millis,
    /// Time from the entry's instant to the window end.
    pub dt_post: Millis,
    /// Which pass through the timeline fired this entry (0 for one-shot).
    pub loop_index: u64,
}

impl Firing {
    /// `dt_pre` in seconds.
    pub fn pre_seconds(&self) -> f32 {
        self.dt_pre as f32 / 1000.0
    }

    /// `dt_post` in seconds.
    pub fn post_seconds(&self) -> f32 {
        self.dt_post as f32 / 1000.0
    }
}

// ---------------------------------------------------------------------------
// SequentialRunner
// ---------------------------------------------------------------------------

/// Plays a timeline once with a monotonic cursor.
#[derive(Debug, Clone)]
pub struct SequentialRunner<P> {
    timeline: Arc<Timeline<P>>,
    /// Index of the next entry to fire.
    next: usize,
    /// Time passed to the latest `update_to`.
    last_time: Millis,
}

impl<P> SequentialRunner<P> {
    pub fn new(timeline: Arc<Timeline<P>>) -> Self {
        Self {
            timeline,
            next: 0,
            last_time: 0,
        }
    }

    /// Fire, in order, every unfired entry with `offset < time`.
    ///
    /// Each entry fires exactly once, however many become due in one call and
    /// whether or not they share an offset. Returns the number of entries
    /// fired. Calling with a time earlier than a previous call fires nothing.
    pub fn update_to<E>(
        &mut self,
        time: Millis,
        mut fire: impl FnMut(&P, Firing) -> Result<(), E>,
    ) -> Result<usize, E> {
        let window_start = self.last_time;
        self.last_time = self.last_time.max(time);

        let entries = self.timeline.entries();
        let mut fired = 0;
        while self.next < entries.len() && entries[self.next].offset < time {
            let entry = &entries[self.next];
            // Consume before firing: an entry never fires twice, even if the
            // callback fails.
            self.next += 1;
            let firing = Firing {
                offset: entry.offset,
                dt_pre: (entry.offset - window_start).max(0),
                dt_post: time - entry.offset,
                loop_index: 0,
            };
            fire(&entry.payload, firing)?;
            fired += 1;
        }
        Ok(fired)
    }

    /// `true` once every entry has fired.
    pub fn is_done(&self) -> bool {
        self.next >= self.timeline.len()
    }

    /// Index of the next entry to fire.
    pub fn cursor(&self) -> usize {
        self.next
    }

    /// Entries not yet fired.
    pub fn remaining(&self) -> usize {
        self.timeline.len() - self.next
    }

    pub fn last_time(&self) -> Millis {
        self.last_time
    }

    pub fn timeline(&self) -> &Arc<Timeline<P>> {
        &self.timeline
    }
}

// ---------------------------------------------------------------------------
// LoopingRunner
// ---------------------------------------------------------------------------

/// Replays a looping timeline.
///
/// Keeps only the elapsed time within the current pass: entries are replayed
/// every pass, so there is no cursor to advance.
#[derive(Debug, Clone)]
pub struct LoopingRunner<P> {
    timeline: Arc<Timeline<P>>,
    /// Time into the current pass, in `[0, total_duration]`.
    elapsed: Millis,
    /// Passes completed since the runner started.
    loops_completed: u64,
}

impl<P> LoopingRunner<P> {
    /// Bind a runner to a looping timeline.
    ///
    /// # Panics
    ///
    /// Panics if the timeline is not looping or its total duration is not
    /// positive. Such a timeline would never advance past its first pass.
    pub fn new(timeline: Arc<Timeline<P>>) -> Self {
        assert!(
            timeline.is_looping() && timeline.total_duration() > 0,
            "looping runner needs a looping timeline with positive duration, got looping={} total_duration={}",
            timeline.is_looping(),
            timeline.total_duration()
        );
        Self {
            timeline,
            elapsed: 0,
            loops_completed: 0,
        }
    }

    /// Advance by `dt` and fire every entry whose instant falls in
    /// `(elapsed, elapsed + dt]`, wrapping as many times as needed.
    ///
    /// Within a pass entries fire in timeline order; entries of an earlier
    /// pass fire before those of a later one. For every firing
    /// `dt_pre + dt_post == dt`. Returns the number of entries fired.
    /// A non-positive `dt` fires nothing.
    pub fn update<E>(
        &mut self,
        dt: Millis,
        mut fire: impl FnMut(&P, Firing) -> Result<(), E>,
    ) -> Result<usize, E> {
        if dt <= 0 {
            return Ok(0);
        }

        let total = self.timeline.total_duration();
        let entries = self.timeline.entries();
        let mut prev = self.elapsed;
        let mut now = self.elapsed + dt;
        // Time of the update window already covered by earlier passes.
        let mut covered: Millis = 0;
        let mut fired = 0;
        let first_loop = self.loops_completed;

        loop {
            for entry in entries {
                if prev < entry.offset && entry.offset <= now {
                    let firing = Firing {
                        offset: entry.offset,
                        dt_pre: covered + (entry.offset - prev),
                        dt_post: now - entry.offset,
                        loop_index: self.loops_completed,
                    };
                    fire(&entry.payload, firing)?;
                    fired += 1;
                }
            }

            if now <= total {
                self.elapsed = now;
                break;
            }

            covered += total - prev;
            prev = 0;
            now -= total;
            self.loops_completed += 1;
        }

        if self.loops_completed > first_loop + 1 {
            tracing::debug!(
                dt,
                loops = self.loops_completed - first_loop,
                fired,
                "looping runner caught up across several passes"
            );
        }

        Ok(fired)
    }

    /// Time into the current pass.
    pub fn elapsed(&self) -> Millis {
        self.elapsed
    }

    /// Passes completed since the runner started.
    pub fn loops_completed(&self) -> u64 {
        self.loops_completed
    }

    pub fn timeline(&self) -> &Arc<Timeline<P>> {
        &self.timeline
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
