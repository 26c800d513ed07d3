use std::hash::{Hash, Hasher};

use arrayvec::ArrayVec;

use crate::tile::Tile;
use crate::types::{Phase, TerminalState, TileId, CELL_COUNT, GRID_SIZE};

/// Stable 64-bit FNV-1a hasher for deterministic `state_hash`.
///
/// `DefaultHasher` output is not guaranteed stable across Rust versions/platforms.
#[derive(Debug, Clone)]
pub struct Fnv1aHasher {
    state: u64,
}

impl Fnv1aHasher {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self {
            state: Self::OFFSET_BASIS,
        }
    }
}

impl Default for Fnv1aHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for Fnv1aHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state ^= b as u64;
            self.state = self.state.wrapping_mul(Self::PRIME);
        }
    }
}

/// One occupied cell as seen by a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileSnapshot {
    pub row: u8,
    pub col: u8,
    pub id: TileId,
    pub value: u32,
    pub is_new: bool,
    pub is_merge_result: bool,
    pub merged_from: Option<[TileId; 2]>,
}

impl TileSnapshot {
    pub fn from_tile(row: usize, col: usize, tile: &Tile) -> Self {
        Self {
            row: row as u8,
            col: col as u8,
            id: tile.id,
            value: tile.value,
            is_new: tile.is_new,
            is_merge_result: tile.is_merge_result(),
            merged_from: tile.merged_from,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSnapshot {
    /// Occupied cells, row-major.
    pub tiles: ArrayVec<TileSnapshot, CELL_COUNT>,
    /// Values by cell, 0 for empty.
    pub grid: [[u32; GRID_SIZE]; GRID_SIZE],
    pub score: u32,
    pub won: bool,
    pub keep_playing: bool,
    pub terminal: TerminalState,
    pub phase: Phase,
    pub episode_id: u32,
    pub move_count: u32,
    pub seed: u32,
}

impl GameSnapshot {
    pub fn clear(&mut self) {
        self.tiles.clear();
        self.grid = [[0; GRID_SIZE]; GRID_SIZE];
        self.score = 0;
        self.won = false;
        self.keep_playing = false;
        self.terminal = TerminalState::None;
        self.phase = Phase::Idle;
        self.episode_id = 0;
        self.move_count = 0;
        self.seed = 0;
    }

    /// Value at (row, col), 0 when empty or out of bounds.
    pub fn value_at(&self, row: usize, col: usize) -> u32 {
        self.grid
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(0)
    }

    pub fn tile_at(&self, row: usize, col: usize) -> Option<&TileSnapshot> {
        self.tiles
            .iter()
            .find(|t| t.row as usize == row && t.col as usize == col)
    }

    pub fn max_tile(&self) -> u32 {
        self.tiles.iter().map(|t| t.value).max().unwrap_or(0)
    }

    /// Sum of all tile values on the board.
    pub fn total_value(&self) -> u32 {
        self.tiles.iter().map(|t| t.value).sum()
    }

    pub fn empty_count(&self) -> usize {
        CELL_COUNT - self.tiles.len()
    }

    /// Accepts moves right now.
    pub fn playable(&self) -> bool {
        self.phase == Phase::Playing
    }

    /// Stable hash of the observable game state.
    ///
    /// Covers grid values, tile ids, score, flags and the episode, so two
    /// snapshots hash equal iff a renderer could not tell them apart.
    pub fn state_hash(&self) -> u64 {
        let mut hasher = Fnv1aHasher::new();
        self.grid.hash(&mut hasher);
        for tile in &self.tiles {
            tile.id.hash(&mut hasher);
        }
        self.score.hash(&mut hasher);
        self.won.hash(&mut hasher);
        self.keep_playing.hash(&mut hasher);
        self.terminal.as_str().hash(&mut hasher);
        self.episode_id.hash(&mut hasher);
        self.move_count.hash(&mut hasher);
        self.seed.hash(&mut hasher);
        hasher.finish()
    }
}

impl Default for GameSnapshot {
    fn default() -> Self {
        Self {
            tiles: ArrayVec::new(),
            grid: [[0; GRID_SIZE]; GRID_SIZE],
            score: 0,
            won: false,
            keep_playing: false,
            terminal: TerminalState::None,
            phase: Phase::Idle,
            episode_id: 0,
            move_count: 0,
            seed: 0,
        }
    }
}
