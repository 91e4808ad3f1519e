//! Generational arena for simulation entities.
//!
//! An [`Arena`] stores its values densely in insertion order, which is the
//! order the simulation iterates them in every tick. Each value is addressed by
//! a [`Handle`] that packs a *generation* counter in the high 32 bits and a
//! *slot* in the low 32 bits. The generation is bumped every time a slot is
//! recycled, so a handle to a removed value is detected immediately instead of
//! silently aliasing whatever took its place.
//!
//! Removal through [`Arena::retain`] compacts the dense storage while keeping
//! the relative order of survivors, so a length recorded before a batch of
//! insertions (a *watermark*) still separates old values from new ones until
//! the next compaction.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// A generational handle into an [`Arena`].
///
/// Layout: `[generation: u32 | slot: u32]`
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle(u64);

impl Handle {
    /// Construct a `Handle` from a slot and generation.
    #[inline]
    pub fn new(slot: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | slot as u64)
    }

    /// The slot portion (low 32 bits).
    #[inline]
    pub fn slot(self) -> u32 {
        self.0 as u32
    }

    /// The generation portion (high 32 bits).
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Raw `u64` representation.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Reconstruct from a raw `u64`.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.slot(), self.generation())
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.slot(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// SlotAllocator
// ---------------------------------------------------------------------------

/// Hands out slots with generational tracking.
///
/// Free slots are recycled FIFO so generations spread over all slots instead
/// of piling up on one hot slot.
#[derive(Debug, Clone, Default)]
struct SlotAllocator {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free_slots: VecDeque<u32>,
}

impl SlotAllocator {
    fn allocate(&mut self) -> Handle {
        if let Some(slot) = self.free_slots.pop_front() {
            // Generation was already bumped on release.
            self.alive[slot as usize] = true;
            Handle::new(slot, self.generations[slot as usize])
        } else {
            let slot = self.generations.len() as u32;
            self.generations.push(0);
            self.alive.push(true);
            Handle::new(slot, 0)
        }
    }

    fn release(&mut self, handle: Handle) -> bool {
        if !self.is_alive(handle) {
            return false;
        }
        let idx = handle.slot() as usize;
        self.alive[idx] = false;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.free_slots.push_back(handle.slot());
        true
    }

    fn is_alive(&self, handle: Handle) -> bool {
        let idx = handle.slot() as usize;
        idx < self.generations.len()
            && self.alive[idx]
            && self.generations[idx] == handle.generation()
    }
}

// ---------------------------------------------------------------------------
// Arena
// ---------------------------------------------------------------------------

/// Dense, insertion-ordered storage addressed by generational [`Handle`]s.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    slots: SlotAllocator,
    /// Values in insertion order.
    values: Vec<T>,
    /// Handle of each value, parallel to `values`.
    handles: Vec<Handle>,
    /// Dense position of each live slot.
    positions: Vec<usize>,
}

impl<T> Arena<T> {
    /// Create a new, empty arena.
    pub fn new() -> Self {
        Self {
            slots: SlotAllocator::default(),
            values: Vec::new(),
            handles: Vec::new(),
            positions: Vec::new(),
        }
    }

    /// Append a value and return its handle.
    pub fn insert(&mut self, value: T) -> Handle {
        let handle = self.slots.allocate();
        let slot = handle.slot() as usize;
        if slot >= self.positions.len() {
            self.positions.resize(slot + 1, 0);
        }
        self.positions[slot] = self.values.len();
        self.values.push(value);
        self.handles.push(handle);
        handle
    }

    /// Returns `true` if `handle` refers to a value still in the arena.
    pub fn contains(&self, handle: Handle) -> bool {
        self.slots.is_alive(handle)
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        if !self.contains(handle) {
            return None;
        }
        self.values.get(self.positions[handle.slot() as usize])
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        if !self.contains(handle) {
            return None;
        }
        self.values.get_mut(self.positions[handle.slot() as usize])
    }

    /// Number of values currently stored.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The current length, recorded before a batch of insertions.
    ///
    /// Values at dense positions `< watermark` existed before the batch; values
    /// inserted afterwards sit at or above it. Only [`retain`](Self::retain)
    /// and [`remove`](Self::remove) invalidate a watermark.
    pub fn watermark(&self) -> usize {
        self.values.len()
    }

    /// Values in insertion order.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Mutable values in insertion order.
    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Handles in insertion order, parallel to [`values`](Self::values).
    pub fn handles(&self) -> &[Handle] {
        &self.handles
    }

    /// Iterate `(handle, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.handles.iter().copied().zip(self.values.iter())
    }

    /// Iterate `(handle, value)` pairs mutably in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> {
        self.handles.iter().copied().zip(self.values.iter_mut())
    }

    /// Remove a single value, shifting later values down by one.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        if !self.slots.release(handle) {
            return None;
        }
        let position = self.positions[handle.slot() as usize];
        let value = self.values.remove(position);
        self.handles.remove(position);
        for later in &self.handles[position..] {
            self.positions[later.slot() as usize] -= 1;
        }
        Some(value)
    }

    /// Keep only the values for which `keep` returns `true`.
    ///
    /// Survivors keep their relative order. Handles of removed values become
    /// stale. Returns the number of values removed.
    pub fn retain(&mut self, mut keep: impl FnMut(Handle, &T) -> bool) -> usize {
        let len = self.values.len();
        let mut write = 0;
        for read in 0..len {
            let handle = self.handles[read];
            if keep(handle, &self.values[read]) {
                if write != read {
                    self.values.swap(write, read);
                    self.handles.swap(write, read);
                }
                self.positions[handle.slot() as usize] = write;
                write += 1;
            } else {
                self.slots.release(handle);
            }
        }
        self.values.truncate(write);
        self.handles.truncate(write);
        len - write
    }

    /// Remove every value. Outstanding handles become stale.
    pub fn clear(&mut self) {
        for handle in self.handles.drain(..) {
            self.slots.release(handle);
        }
        self.values.clear();
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
