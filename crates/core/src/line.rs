//! Line resolution - the slide and merge rule for a single row or column.
//!
//! A line is given in slide order (index 0 is the edge tiles move toward).
//! Occupied cells are compacted toward index 0 and equal neighbours merge
//! pairwise, left to right, each tile at most once:
//!
//! - `[2, 2, _, _]` → `[4, _, _, _]`
//! - `[2, 2, 2, 2]` → `[4, 4, _, _]`
//! - `[4, 2, 2, _]` → `[4, 4, _, _]` (the new 4 does not merge again)

use arrayvec::ArrayVec;

use crate::tile::{IdAllocator, Tile};
use crate::types::{TileId, GRID_SIZE};

/// Most merges a single line can produce.
pub const MAX_LINE_MERGES: usize = GRID_SIZE / 2;

/// One merge: two source tiles replaced by a fresh tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MergeRecord {
    pub result: Tile,
    pub sources: [TileId; 2],
}

/// Result of sliding one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineOutcome {
    /// Compacted line in slide order, padded with empties.
    pub cells: [Option<Tile>; GRID_SIZE],
    pub merges: ArrayVec<MergeRecord, MAX_LINE_MERGES>,
}

impl LineOutcome {
    /// Points earned: the sum of merged values.
    pub fn score(&self) -> u32 {
        self.merges.iter().map(|m| m.result.value).sum()
    }

    /// Whether any cell differs in occupant id or value from `before`.
    pub fn changed_from(&self, before: &[Option<Tile>; GRID_SIZE]) -> bool {
        before
            .iter()
            .zip(self.cells.iter())
            .any(|(a, b)| !Tile::same_occupant(a.as_ref(), b.as_ref()))
    }
}

/// Slide one line toward index 0, merging equal neighbours once.
///
/// Merge results take ids from `ids`; tiles that only move keep theirs.
pub fn slide_line(line: &[Option<Tile>; GRID_SIZE], ids: &mut IdAllocator) -> LineOutcome {
    let occupied: ArrayVec<Tile, GRID_SIZE> = line.iter().flatten().copied().collect();

    let mut cells = [None; GRID_SIZE];
    let mut merges = ArrayVec::new();
    let mut write = 0;
    let mut read = 0;

    while read < occupied.len() {
        let current = occupied[read];
        match occupied.get(read + 1) {
            Some(next) if next.value == current.value => {
                let result = Tile::merged(ids.allocate(), current, *next);
                merges.push(MergeRecord {
                    result,
                    sources: [current.id, next.id],
                });
                cells[write] = Some(result);
                // Both sources are consumed.
                read += 2;
            }
            _ => {
                cells[write] = Some(current);
                read += 1;
            }
        }
        write += 1;
    }

    LineOutcome { cells, merges }
}
