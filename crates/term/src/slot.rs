//! SnapshotSlot: the renderer side of `core::Engine`.
//!
//! The engine presents synchronously on every state change; the UI loop draws at
//! its own tick. The slot keeps the latest snapshot plus a dirty flag so a frame
//! is only rebuilt when something changed.

use crate::core::{GameSnapshot, Renderer};

#[derive(Debug, Default)]
pub struct SnapshotSlot {
    latest: GameSnapshot,
    dirty: bool,
    presents: u64,
}

impl SnapshotSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently presented snapshot.
    pub fn latest(&self) -> &GameSnapshot {
        &self.latest
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Return the latest snapshot if it has not been taken since the last present.
    pub fn take_dirty(&mut self) -> Option<&GameSnapshot> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(&self.latest)
    }

    /// Request a redraw without a new snapshot (resize, settle end).
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Number of snapshots presented so far.
    pub fn presents(&self) -> u64 {
        self.presents
    }
}

impl Renderer for SnapshotSlot {
    fn present(&mut self, snapshot: &GameSnapshot) {
        self.latest.clone_from(snapshot);
        self.dirty = true;
        self.presents += 1;
    }
}
