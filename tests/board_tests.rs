//! Board and line resolution through the public API.

use tui_2048::core::{slide_line, Board, IdAllocator, Tile};
use tui_2048::types::{Direction, TileId, CELL_COUNT, GRID_SIZE};

fn line_of(values: [u32; GRID_SIZE], ids: &mut IdAllocator) -> [Option<Tile>; GRID_SIZE] {
    values.map(|v| (v != 0).then(|| Tile::plain(ids.allocate(), v)))
}

fn values(cells: &[Option<Tile>; GRID_SIZE]) -> [u32; GRID_SIZE] {
    cells.map(|c| c.map(|t| t.value).unwrap_or(0))
}

#[test]
fn test_board_new_empty() {
    let board = Board::new();
    assert!(board.is_empty());
    assert!(!board.is_full());
    assert_eq!(board.empty_cells().len(), CELL_COUNT);
    assert_eq!(board.occupied().count(), 0);
}

#[test]
fn test_board_get_out_of_bounds() {
    let board = Board::new();
    assert_eq!(board.get(GRID_SIZE, 0), None);
    assert_eq!(board.get(0, GRID_SIZE), None);
    assert_eq!(board.get(3, 3), Some(None));
    assert_eq!(Board::index(4, 0), None);
}

#[test]
fn test_board_set_and_occupied_order() {
    let mut board = Board::new();
    assert!(board.set(2, 1, Some(TileId(7))));
    assert!(board.set(0, 3, Some(TileId(9))));
    assert!(!board.set(4, 0, Some(TileId(1))));

    let occupied: Vec<_> = board.occupied().collect();
    assert_eq!(occupied, vec![(0, 3, TileId(9)), (2, 1, TileId(7))]);
    assert_eq!(board.empty_cells().len(), CELL_COUNT - 2);

    board.clear();
    assert!(board.is_empty());
}

#[test]
fn test_lines_cover_every_cell_once_per_direction() {
    for dir in Direction::ALL {
        let mut seen = [0u8; CELL_COUNT];
        for line in 0..GRID_SIZE {
            for i in Board::line_indices(dir, line) {
                seen[i] += 1;
            }
        }
        assert!(seen.iter().all(|&n| n == 1), "{dir}");
    }
}

#[test]
fn test_up_line_reads_column_top_down() {
    let mut board = Board::new();
    board.set(0, 2, Some(TileId(1)));
    board.set(3, 2, Some(TileId(2)));

    let up = board.read_line(Direction::Up, 2);
    assert_eq!(up, [Some(TileId(1)), None, None, Some(TileId(2))]);
    let down = board.read_line(Direction::Down, 2);
    assert_eq!(down, [Some(TileId(2)), None, None, Some(TileId(1))]);
}

#[test]
fn test_slide_line_examples() {
    let cases = [
        ([2, 2, 0, 0], [4, 0, 0, 0]),
        ([2, 2, 2, 2], [4, 4, 0, 0]),
        ([4, 2, 2, 0], [4, 4, 0, 0]),
        ([0, 0, 0, 2], [2, 0, 0, 0]),
        ([2, 0, 2, 4], [4, 4, 0, 0]),
        ([8, 8, 8, 0], [16, 8, 0, 0]),
        ([2, 4, 8, 16], [2, 4, 8, 16]),
    ];
    for (input, expect) in cases {
        let mut ids = IdAllocator::new();
        let line = line_of(input, &mut ids);
        let out = slide_line(&line, &mut ids);
        assert_eq!(values(&out.cells), expect, "{input:?}");
        assert_eq!(out.changed_from(&line), input != expect, "{input:?}");
    }
}

#[test]
fn test_slide_line_keeps_ids_of_moving_tiles() {
    let mut ids = IdAllocator::new();
    let line = line_of([0, 2, 0, 4], &mut ids);
    let out = slide_line(&line, &mut ids);

    assert_eq!(out.cells[0].map(|t| t.id), line[1].map(|t| t.id));
    assert_eq!(out.cells[1].map(|t| t.id), line[3].map(|t| t.id));
    assert!(out.merges.is_empty());
    assert_eq!(out.score(), 0);
}

#[test]
fn test_merge_allocates_fresh_id_and_records_sources() {
    let mut ids = IdAllocator::new();
    let line = line_of([2, 2, 0, 0], &mut ids);
    let last_before = ids.last();
    let out = slide_line(&line, &mut ids);

    let merged = out.cells[0].unwrap();
    assert_eq!(merged.id, TileId(last_before + 1));
    assert_eq!(
        merged.merged_from,
        Some([line[0].unwrap().id, line[1].unwrap().id])
    );
    assert_eq!(out.merges[0].sources, merged.merged_from.unwrap());
    assert_eq!(out.score(), 4);
}
