//! Keyboard impulses with held-key repeat.
//!
//! A press produces one impulse on the frame it happens. While a key stays
//! held, further impulses arrive every `interval` milliseconds after the
//! press, counted per frame window so the result does not depend on frame
//! pacing.

use std::collections::BTreeMap;

use sblp_core::timeline::Millis;
use serde::{Deserialize, Serialize};

/// Keys the screens react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Escape,
}

/// Turns press/release events into a stream of impulses.
#[derive(Debug, Clone)]
pub struct KeyRepeat {
    interval: Millis,
    /// Held keys and the time they went down.
    held: BTreeMap<Key, Millis>,
    /// Keys pressed since the last drain, in press order.
    tapped: Vec<Key>,
}

impl KeyRepeat {
    /// # Panics
    ///
    /// Panics if `interval` is not positive.
    pub fn new(interval: Millis) -> Self {
        assert!(interval > 0, "repeat interval must be positive, got {interval}");
        Self {
            interval,
            held: BTreeMap::new(),
            tapped: Vec::new(),
        }
    }

    /// Record a key going down at `now`. A press of a key already held is
    /// ignored (OS auto-repeat).
    pub fn press(&mut self, key: Key, now: Millis) {
        if self.held.contains_key(&key) {
            return;
        }
        self.held.insert(key, now);
        self.tapped.push(key);
    }

    pub fn release(&mut self, key: Key) {
        self.held.remove(&key);
    }

    /// Release every key, e.g. when focus is lost.
    pub fn release_all(&mut self) {
        self.held.clear();
        self.tapped.clear();
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains_key(&key)
    }

    pub fn interval(&self) -> Millis {
        self.interval
    }

    /// Impulses for the frame `(now - delta, now]`.
    ///
    /// Fresh presses come first, in press order, then repeats of held keys
    /// in key order. Repeats fall on `since + k * interval` for `k >= 1`.
    pub fn drain(&mut self, now: Millis, delta: Millis) -> Vec<Key> {
        let mut impulses = std::mem::take(&mut self.tapped);
        for (&key, &since) in &self.held {
            let start = (now - delta).max(since);
            let before = (start - since).div_euclid(self.interval);
            let after = (now - since).div_euclid(self.interval);
            let repeats = (after - before).max(0);
            impulses.extend(std::iter::repeat(key).take(repeats as usize));
        }
        impulses
    }
}
