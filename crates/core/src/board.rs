//! Board module - manages the game grid
//!
//! The board is a 4x4 grid where each cell is empty or holds the id of a tile.
//! Uses a flat array, row-major (`row * GRID_SIZE + col`), origin top-left.
//! Tile values live in the [`crate::tile::TileArena`]; the board never stores them.

use arrayvec::ArrayVec;

use crate::types::{Direction, TileId, CELL_COUNT, GRID_SIZE};

/// Cell content: a tile id or empty.
pub type Cell = Option<TileId>;

/// The game board - 4 columns x 4 rows using flat array storage
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Board {
    cells: [Cell; CELL_COUNT],
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Self {
            cells: [None; CELL_COUNT],
        }
    }

    /// Calculate flat index from (row, col)
    #[inline(always)]
    pub fn index(row: usize, col: usize) -> Option<usize> {
        if row >= GRID_SIZE || col >= GRID_SIZE {
            return None;
        }
        Some(row * GRID_SIZE + col)
    }

    /// (row, col) of a flat index
    #[inline(always)]
    pub fn position(index: usize) -> (usize, usize) {
        (index / GRID_SIZE, index % GRID_SIZE)
    }

    /// Get cell at (row, col). Returns None if out of bounds
    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        Self::index(row, col).map(|idx| self.cells[idx])
    }

    /// Set cell at (row, col). Returns false if out of bounds
    pub fn set(&mut self, row: usize, col: usize, cell: Cell) -> bool {
        match Self::index(row, col) {
            Some(idx) => {
                self.cells[idx] = cell;
                true
            }
            None => false,
        }
    }

    pub fn cell(&self, index: usize) -> Cell {
        self.cells.get(index).copied().flatten()
    }

    pub fn set_cell(&mut self, index: usize, cell: Cell) {
        if let Some(slot) = self.cells.get_mut(index) {
            *slot = cell;
        }
    }

    /// Flat indices of one line, ordered from the edge tiles slide toward.
    ///
    /// `line` is a row for left/right and a column for up/down. Reading and
    /// writing through the same indices takes care of the reversed orientation
    /// for right/down.
    pub fn line_indices(direction: Direction, line: usize) -> [usize; GRID_SIZE] {
        std::array::from_fn(|k| {
            let along = if direction.is_reversed() {
                GRID_SIZE - 1 - k
            } else {
                k
            };
            if direction.is_horizontal() {
                line * GRID_SIZE + along
            } else {
                along * GRID_SIZE + line
            }
        })
    }

    /// Read one line in slide order.
    pub fn read_line(&self, direction: Direction, line: usize) -> [Cell; GRID_SIZE] {
        Self::line_indices(direction, line).map(|i| self.cells[i])
    }

    /// Write one line given in slide order.
    pub fn write_line(&mut self, direction: Direction, line: usize, cells: [Cell; GRID_SIZE]) {
        for (i, cell) in Self::line_indices(direction, line).into_iter().zip(cells) {
            self.cells[i] = cell;
        }
    }

    /// Flat indices of empty cells, in row-major order.
    pub fn empty_cells(&self) -> ArrayVec<usize, CELL_COUNT> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|c| c.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|c| c.is_none())
    }

    /// Occupied cells as `(row, col, id)`, row-major.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize, TileId)> + '_ {
        self.cells.iter().enumerate().filter_map(|(i, c)| {
            let (row, col) = Self::position(i);
            c.map(|id| (row, col, id))
        })
    }

    /// Get a reference to the internal cells array
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Clear the entire board
    pub fn clear(&mut self) {
        self.cells = [None; CELL_COUNT];
    }
}
