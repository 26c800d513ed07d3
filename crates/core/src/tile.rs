//! Tile records and the id-keyed tile arena.
//!
//! The board only stores [`TileId`]s; the value and animation flags of each tile
//! live here, so there is a single owner for every piece of tile state.

use arrayvec::ArrayVec;

use crate::types::{TileId, CELL_COUNT};

/// A numbered tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    pub id: TileId,
    pub value: u32,
    /// Source ids when this tile was produced by the most recent merge.
    pub merged_from: Option<[TileId; 2]>,
    /// Spawned by the most recent update.
    pub is_new: bool,
}

impl Tile {
    /// A tile that just appeared on an empty cell.
    pub fn spawned(id: TileId, value: u32) -> Self {
        Self {
            id,
            value,
            merged_from: None,
            is_new: true,
        }
    }

    /// A plain tile with no animation flags.
    pub fn plain(id: TileId, value: u32) -> Self {
        Self {
            id,
            value,
            merged_from: None,
            is_new: false,
        }
    }

    /// The tile produced by merging `a` into `b`.
    pub fn merged(id: TileId, a: Tile, b: Tile) -> Self {
        Self {
            id,
            value: a.value + b.value,
            merged_from: Some([a.id, b.id]),
            is_new: false,
        }
    }

    /// Same tile with the per-update animation flags cleared.
    pub fn settled(self) -> Self {
        Self {
            merged_from: None,
            is_new: false,
            ..self
        }
    }

    pub fn is_merge_result(&self) -> bool {
        self.merged_from.is_some()
    }

    /// Whether two cells hold the same occupant (same id and value).
    pub fn same_occupant(a: Option<&Tile>, b: Option<&Tile>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => a.id == b.id && a.value == b.value,
            _ => false,
        }
    }
}

/// Monotonic id source for one game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IdAllocator {
    last: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> TileId {
        self.last = self.last.wrapping_add(1);
        TileId(self.last)
    }

    /// Last id handed out (0 when none yet).
    pub fn last(&self) -> u32 {
        self.last
    }
}

/// Tiles currently on the board, keyed by id.
///
/// At most one tile per cell, so a fixed-capacity vector with linear lookup is
/// enough and never allocates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileArena {
    tiles: ArrayVec<Tile, CELL_COUNT>,
}

impl TileArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: TileId) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.id == id)
    }

    /// Insert or replace a tile. Returns false if the arena is full.
    pub fn insert(&mut self, tile: Tile) -> bool {
        if let Some(slot) = self.tiles.iter_mut().find(|t| t.id == tile.id) {
            *slot = tile;
            return true;
        }
        self.tiles.try_push(tile).is_ok()
    }

    pub fn remove(&mut self, id: TileId) -> Option<Tile> {
        let pos = self.tiles.iter().position(|t| t.id == id)?;
        Some(self.tiles.swap_remove(pos))
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }
}
