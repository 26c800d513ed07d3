//! Game state module - manages the complete game state
//!
//! This module ties together the board, the tile arena, the id allocator and the
//! spawner. It implements the move algorithm, win/game-over detection and the
//! session lifecycle. Everything is synchronous: every call has fully settled
//! (slide, merge, spawn, terminal check) when it returns.

use arrayvec::ArrayVec;
use tracing::{debug, info};

use crate::board::Board;
use crate::line::{slide_line, LineOutcome, MergeRecord, MAX_LINE_MERGES};
use crate::rng::TileSpawner;
use crate::snapshot::{GameSnapshot, TileSnapshot};
use crate::tile::{IdAllocator, Tile, TileArena};
use crate::types::*;

/// Most merges a single move can produce.
pub const MAX_MOVE_MERGES: usize = GRID_SIZE * MAX_LINE_MERGES;

/// Result of one `apply_move` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub direction: Direction,
    /// Whether any cell changed. `false` means nothing was mutated.
    pub moved: bool,
    /// Points earned by this move.
    pub score_delta: u32,
    pub merges: ArrayVec<MergeRecord, MAX_MOVE_MERGES>,
    /// Tile added after the slide, if there was room.
    pub spawned: Option<TileSnapshot>,
    /// Terminal state after the move settled.
    pub terminal: TerminalState,
}

impl MoveOutcome {
    fn unchanged(direction: Direction, terminal: TerminalState) -> Self {
        Self {
            direction,
            moved: false,
            score_delta: 0,
            merges: ArrayVec::new(),
            spawned: None,
            terminal,
        }
    }
}

/// Slide result for every line of a move, not yet committed.
struct MovePlan {
    lines: [LineOutcome; GRID_SIZE],
    ids: IdAllocator,
    moved: bool,
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    board: Board,
    tiles: TileArena,
    ids: IdAllocator,
    spawner: TileSpawner,
    score: u32,
    /// Set the first time 2048 is formed; only a new game clears it.
    won: bool,
    keep_playing: bool,
    started: bool,
    /// Monotonic episode id (increments on every new game).
    episode_id: u32,
    /// Moves that changed the board in this episode.
    move_count: u32,
}

impl GameState {
    /// Create an idle engine with the given RNG seed. Call [`GameState::new_game`]
    /// before anything else.
    pub fn new(seed: u32) -> Self {
        Self {
            board: Board::new(),
            tiles: TileArena::new(),
            ids: IdAllocator::new(),
            spawner: TileSpawner::new(seed),
            score: 0,
            won: false,
            keep_playing: false,
            started: false,
            episode_id: 0,
            move_count: 0,
        }
    }

    /// Build a started game from literal values (0 = empty).
    ///
    /// Tiles get ids in row-major order. A tile of 2048 or more marks the game
    /// as won; during play only a merge that forms exactly 2048 does.
    pub fn from_grid(seed: u32, grid: [[u32; GRID_SIZE]; GRID_SIZE]) -> Result<Self, EngineError> {
        let mut state = Self::new(seed);
        for (row, values) in grid.iter().enumerate() {
            for (col, &value) in values.iter().enumerate() {
                if value == 0 {
                    continue;
                }
                if value < 2 || !value.is_power_of_two() {
                    return Err(EngineError::InvalidArgument(format!(
                        "tile value {value} at ({row}, {col}) is not a power of two >= 2"
                    )));
                }
                let tile = Tile::plain(state.ids.allocate(), value);
                state.board.set(row, col, Some(tile.id));
                state.tiles.insert(tile);
            }
        }
        state.started = true;
        state.episode_id = 1;
        state.won = state.tiles.iter().any(|t| t.value >= WIN_VALUE);
        Ok(state)
    }

    /// Discard the board and seed a fresh one.
    ///
    /// Tile ids restart for the new episode. The spawner keeps its stream, so
    /// consecutive games differ while staying reproducible from the seed.
    pub fn new_game(&mut self) {
        self.board.clear();
        self.tiles.clear();
        self.ids = IdAllocator::new();
        self.score = 0;
        self.won = false;
        self.keep_playing = false;
        self.move_count = 0;
        self.started = true;
        self.episode_id = self.episode_id.wrapping_add(1);

        for _ in 0..START_TILES {
            self.spawn_random_tile();
        }

        info!(
            episode_id = self.episode_id,
            seed = self.spawner.seed(),
            "new game"
        );
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn phase(&self) -> Phase {
        if !self.started {
            return Phase::Idle;
        }
        Phase::from(self.terminal_state())
    }

    pub fn seed(&self) -> u32 {
        self.spawner.seed()
    }

    pub fn episode_id(&self) -> u32 {
        self.episode_id
    }

    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    pub fn keep_playing(&self) -> bool {
        self.keep_playing
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// Value at (row, col), 0 when empty or out of bounds.
    pub fn value_at(&self, row: usize, col: usize) -> u32 {
        self.board
            .get(row, col)
            .flatten()
            .and_then(|id| self.tiles.get(id))
            .map_or(0, |t| t.value)
    }

    pub fn score(&self) -> Result<u32, EngineError> {
        self.ensure_started()?;
        Ok(self.score)
    }

    pub fn is_won(&self) -> Result<bool, EngineError> {
        self.ensure_started()?;
        Ok(self.won)
    }

    /// True iff no empty cell remains and no two adjacent tiles are equal.
    pub fn is_game_over(&self) -> Result<bool, EngineError> {
        self.ensure_started()?;
        Ok(self.is_stuck())
    }

    pub fn terminal(&self) -> Result<TerminalState, EngineError> {
        self.ensure_started()?;
        Ok(self.terminal_state())
    }

    /// Whether sliding in `direction` would change the board.
    ///
    /// Geometry only: a won-but-undismissed game may report `true` here while
    /// `apply_move` still rejects the move.
    pub fn can_move(&self, direction: Direction) -> Result<bool, EngineError> {
        self.ensure_started()?;
        Ok(self.plan_move(direction).moved)
    }

    /// Whether any direction would change the board.
    pub fn has_moves(&self) -> Result<bool, EngineError> {
        self.ensure_started()?;
        Ok(!self.is_stuck())
    }

    /// Slide every line toward `direction`, merge, then spawn one tile.
    ///
    /// A move that changes nothing returns `moved = false` and leaves score,
    /// tiles and the RNG untouched. Moves are also rejected this way while the
    /// game reports `Won` or `GameOver`.
    pub fn apply_move(&mut self, direction: Direction) -> Result<MoveOutcome, EngineError> {
        self.ensure_started()?;

        let terminal = self.terminal_state();
        if terminal.is_terminal() {
            debug!(%direction, terminal = terminal.as_str(), "move rejected");
            return Ok(MoveOutcome::unchanged(direction, terminal));
        }

        let plan = self.plan_move(direction);
        if !plan.moved {
            debug!(%direction, "move changed nothing");
            return Ok(MoveOutcome::unchanged(direction, terminal));
        }

        let mut merges = ArrayVec::<MergeRecord, MAX_MOVE_MERGES>::new();
        self.ids = plan.ids;
        self.tiles.clear();
        for (line, outcome) in plan.lines.iter().enumerate() {
            self.board
                .write_line(direction, line, outcome.cells.map(|c| c.map(|t| t.id)));
            for tile in outcome.cells.iter().flatten() {
                self.tiles.insert(*tile);
            }
            merges.extend(outcome.merges.iter().copied());
        }

        let score_delta: u32 = merges.iter().map(|m| m.result.value).sum();
        self.score = self.score.saturating_add(score_delta);
        self.move_count += 1;

        if !self.won && merges.iter().any(|m| m.result.value == WIN_VALUE) {
            self.won = true;
            info!(score = self.score, moves = self.move_count, "reached 2048");
        }

        let spawned = self.spawn_random_tile();
        let terminal = self.terminal_state();
        if terminal == TerminalState::GameOver {
            info!(score = self.score, moves = self.move_count, "game over");
        }

        debug!(
            %direction,
            score_delta,
            merges = merges.len(),
            spawned = spawned.map(|t| t.value),
            terminal = terminal.as_str(),
            "move applied"
        );

        Ok(MoveOutcome {
            direction,
            moved: true,
            score_delta,
            merges,
            spawned,
            terminal,
        })
    }

    /// Dismiss the win notice. Returns whether that changed anything:
    /// `Ok(false)` when the game has not been won or was already dismissed.
    pub fn set_keep_playing(&mut self) -> Result<bool, EngineError> {
        self.ensure_started()?;
        if !self.won || self.keep_playing {
            return Ok(false);
        }
        self.keep_playing = true;
        info!(score = self.score, "keep playing after win");
        Ok(true)
    }

    /// Apply a game action. Returns whether the state changed.
    pub fn apply_action(&mut self, action: GameAction) -> Result<bool, EngineError> {
        match action {
            GameAction::Move(direction) => self.apply_move(direction).map(|o| o.moved),
            GameAction::KeepPlaying => self.set_keep_playing(),
            GameAction::NewGame => {
                self.new_game();
                Ok(true)
            }
        }
    }

    pub fn snapshot_into(&self, out: &mut GameSnapshot) -> Result<(), EngineError> {
        self.ensure_started()?;

        out.clear();
        for (row, col, id) in self.board.occupied() {
            if let Some(tile) = self.tiles.get(id) {
                out.tiles.push(TileSnapshot::from_tile(row, col, tile));
                out.grid[row][col] = tile.value;
            }
        }
        out.score = self.score;
        out.won = self.won;
        out.keep_playing = self.keep_playing;
        out.terminal = self.terminal_state();
        out.phase = self.phase();
        out.episode_id = self.episode_id;
        out.move_count = self.move_count;
        out.seed = self.spawner.seed();
        Ok(())
    }

    pub fn snapshot(&self) -> Result<GameSnapshot, EngineError> {
        let mut s = GameSnapshot::default();
        self.snapshot_into(&mut s)?;
        Ok(s)
    }

    fn ensure_started(&self) -> Result<(), EngineError> {
        if self.started {
            Ok(())
        } else {
            Err(EngineError::UninitializedState)
        }
    }

    fn terminal_state(&self) -> TerminalState {
        if self.won && !self.keep_playing {
            TerminalState::Won
        } else if self.is_stuck() {
            TerminalState::GameOver
        } else {
            TerminalState::None
        }
    }

    fn is_stuck(&self) -> bool {
        if !self.board.is_full() {
            return false;
        }
        for row in 0..GRID_SIZE {
            for col in 0..GRID_SIZE {
                let value = self.value_at(row, col);
                if col + 1 < GRID_SIZE && self.value_at(row, col + 1) == value {
                    return false;
                }
                if row + 1 < GRID_SIZE && self.value_at(row + 1, col) == value {
                    return false;
                }
            }
        }
        true
    }

    /// Slide all lines on a copy of the id allocator; nothing is mutated.
    fn plan_move(&self, direction: Direction) -> MovePlan {
        let mut ids = self.ids;
        let mut moved = false;
        let lines = std::array::from_fn(|line| {
            let before = self
                .board
                .read_line(direction, line)
                .map(|cell| cell.and_then(|id| self.tiles.get(id)).map(|t| t.settled()));
            let outcome = slide_line(&before, &mut ids);
            moved |= outcome.changed_from(&before);
            outcome
        });
        MovePlan { lines, ids, moved }
    }

    /// Place one tile on a random empty cell. Returns `None` when the board is full.
    fn spawn_random_tile(&mut self) -> Option<TileSnapshot> {
        let empty = self.board.empty_cells();
        let index = self.spawner.pick(&empty)?;
        let value = self.spawner.next_value();
        let tile = Tile::spawned(self.ids.allocate(), value);
        self.board.set_cell(index, Some(tile.id));
        self.tiles.insert(tile);
        let (row, col) = Board::position(index);
        Some(TileSnapshot::from_tile(row, col, &tile))
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(state: &GameState) -> [[u32; GRID_SIZE]; GRID_SIZE] {
        std::array::from_fn(|row| std::array::from_fn(|col| state.value_at(row, col)))
    }

    fn total(state: &GameState) -> u32 {
        state.tiles().map(|t| t.value).sum()
    }

    const STUCK: [[u32; 4]; 4] = [
        [2, 4, 2, 4],
        [4, 2, 4, 2],
        [2, 4, 2, 4],
        [4, 2, 4, 2],
    ];

    #[test]
    fn test_new_state_is_idle() {
        let mut state = GameState::new(12345);
        assert!(!state.started());
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.score(), Err(EngineError::UninitializedState));
        assert_eq!(state.terminal(), Err(EngineError::UninitializedState));
        assert_eq!(state.snapshot(), Err(EngineError::UninitializedState));
        assert_eq!(
            state.apply_move(Direction::Left),
            Err(EngineError::UninitializedState)
        );
        assert_eq!(state.set_keep_playing(), Err(EngineError::UninitializedState));
        assert!(state.board().is_empty());
    }

    #[test]
    fn test_new_game_seeds_two_tiles() {
        let mut state = GameState::new(12345);
        state.new_game();
        assert_eq!(state.phase(), Phase::Playing);
        assert_eq!(state.tiles().count(), START_TILES);
        assert_eq!(state.score(), Ok(0));
        assert_eq!(state.episode_id(), 1);
        for tile in state.tiles() {
            assert!(tile.value == 2 || tile.value == 4);
            assert!(tile.is_new);
        }
    }

    #[test]
    fn test_new_game_increments_episode_and_resets_ids() {
        let mut state = GameState::new(7);
        state.new_game();
        state.new_game();
        assert_eq!(state.episode_id(), 2);
        let mut ids: Vec<u32> = state.tiles().map(|t| t.id.get()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_pair_merges_and_scores() {
        let mut state =
            GameState::from_grid(1, [[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
        let outcome = state.apply_move(Direction::Left).unwrap();

        assert!(outcome.moved);
        assert_eq!(outcome.score_delta, 4);
        assert_eq!(state.score(), Ok(4));
        assert_eq!(state.value_at(0, 0), 4);
        let spawned = outcome.spawned.expect("a tile spawns after a move");
        assert_eq!(total(&state), 4 + spawned.value);
        assert_eq!(state.move_count(), 1);
    }

    #[test]
    fn test_right_slides_toward_right_edge() {
        let mut state =
            GameState::from_grid(1, [[2, 0, 2, 8], [0; 4], [0; 4], [0; 4]]).unwrap();
        state.apply_move(Direction::Right).unwrap();
        assert_eq!(state.value_at(0, 3), 8);
        assert_eq!(state.value_at(0, 2), 4);
    }

    #[test]
    fn test_down_slides_columns() {
        let mut state =
            GameState::from_grid(1, [[4, 0, 0, 0], [4, 0, 0, 0], [0; 4], [2, 0, 0, 0]]).unwrap();
        state.apply_move(Direction::Down).unwrap();
        assert_eq!(state.value_at(3, 0), 2);
        assert_eq!(state.value_at(2, 0), 8);
    }

    #[test]
    fn test_right_pairs_from_right_edge() {
        let mut state =
            GameState::from_grid(1, [[2, 2, 2, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
        let outcome = state.apply_move(Direction::Right).unwrap();
        assert_eq!(outcome.score_delta, 4);
        assert_eq!(state.value_at(0, 3), 4);
        assert_eq!(state.value_at(0, 2), 2);
    }

    #[test]
    fn test_down_pairs_from_bottom_edge() {
        let mut state =
            GameState::from_grid(1, [[2, 0, 0, 0], [2, 0, 0, 0], [2, 0, 0, 0], [0; 4]]).unwrap();
        let outcome = state.apply_move(Direction::Down).unwrap();
        assert_eq!(outcome.score_delta, 4);
        assert_eq!(state.value_at(3, 0), 4);
        assert_eq!(state.value_at(2, 0), 2);
    }

    #[test]
    fn test_noop_move_changes_nothing() {
        let mut state =
            GameState::from_grid(5, [[2, 4, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
        let before = state.snapshot().unwrap();
        assert_eq!(state.can_move(Direction::Left), Ok(false));

        let outcome = state.apply_move(Direction::Left).unwrap();
        assert!(!outcome.moved);
        assert!(outcome.spawned.is_none());
        assert_eq!(state.snapshot().unwrap(), before);

        // Repeating it is equally a no-op.
        assert!(!state.apply_move(Direction::Left).unwrap().moved);
        assert_eq!(state.snapshot().unwrap(), before);
    }

    #[test]
    fn test_sliding_keeps_ids_and_merges_allocate_fresh() {
        let mut state =
            GameState::from_grid(3, [[4, 2, 2, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
        let outcome = state.apply_move(Direction::Left).unwrap();

        let first = state.board().get(0, 0).flatten();
        assert_eq!(first, Some(TileId(1)));
        assert_eq!(outcome.merges.len(), 1);
        assert_eq!(outcome.merges[0].sources, [TileId(2), TileId(3)]);
        assert_eq!(outcome.merges[0].result.id, TileId(4));
        assert_eq!(outcome.spawned.map(|t| t.id), Some(TileId(5)));
        assert!(state.tile(TileId(2)).is_none());
        assert!(state.tile(TileId(4)).unwrap().is_merge_result());
    }

    #[test]
    fn test_flags_clear_on_next_move() {
        let mut state =
            GameState::from_grid(3, [[2, 2, 0, 0], [0; 4], [0; 4], [8, 0, 0, 0]]).unwrap();
        state.apply_move(Direction::Left).unwrap();
        assert!(state.tiles().any(|t| t.is_merge_result()));
        assert_eq!(state.tiles().filter(|t| t.is_new).count(), 1);

        let mut moved = false;
        for dir in Direction::ALL {
            if state.apply_move(dir).unwrap().moved {
                moved = true;
                break;
            }
        }
        assert!(moved);
        assert_eq!(state.tiles().filter(|t| t.is_new).count(), 1);
    }

    #[test]
    fn test_game_over_detection() {
        let state = GameState::from_grid(1, STUCK).unwrap();
        assert_eq!(state.is_game_over(), Ok(true));
        assert_eq!(state.has_moves(), Ok(false));
        assert_eq!(state.terminal(), Ok(TerminalState::GameOver));
        assert_eq!(state.phase(), Phase::GameOver);

        let mut pair = STUCK;
        pair[0][1] = 2;
        let state = GameState::from_grid(1, pair).unwrap();
        assert_eq!(state.is_game_over(), Ok(false));
        assert_eq!(state.can_move(Direction::Left), Ok(true));
    }

    #[test]
    fn test_moves_rejected_when_game_over() {
        let mut state = GameState::from_grid(1, STUCK).unwrap();
        let outcome = state.apply_move(Direction::Up).unwrap();
        assert!(!outcome.moved);
        assert_eq!(outcome.terminal, TerminalState::GameOver);
    }

    #[test]
    fn test_win_then_keep_playing() {
        let mut state =
            GameState::from_grid(9, [[1024, 1024, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
        assert_eq!(state.set_keep_playing(), Ok(false));

        let outcome = state.apply_move(Direction::Left).unwrap();
        assert!(outcome.moved);
        assert_eq!(outcome.terminal, TerminalState::Won);
        assert_eq!(state.is_won(), Ok(true));
        assert_eq!(state.phase(), Phase::Won);

        // Blocked until dismissed.
        let before = state.snapshot().unwrap();
        assert!(!state.apply_move(Direction::Right).unwrap().moved);
        assert_eq!(state.snapshot().unwrap(), before);

        assert_eq!(state.set_keep_playing(), Ok(true));
        assert_eq!(state.terminal(), Ok(TerminalState::None));
        assert_eq!(state.phase(), Phase::Playing);
        assert!(state.is_won().unwrap());
        assert_eq!(state.set_keep_playing(), Ok(false));
        assert!(state.apply_move(Direction::Right).unwrap().moved);
    }

    #[test]
    fn test_from_grid_large_tile_counts_as_won() {
        let state =
            GameState::from_grid(1, [[4096, 0, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
        assert_eq!(state.terminal(), Ok(TerminalState::Won));
    }

    #[test]
    fn test_from_grid_rejects_bad_values() {
        let err = GameState::from_grid(1, [[3, 0, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(_)));
        assert!(GameState::from_grid(1, [[1, 0, 0, 0], [0; 4], [0; 4], [0; 4]]).is_err());
    }

    #[test]
    fn test_from_grid_with_2048_is_won() {
        let state = GameState::from_grid(1, [[2048, 0, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
        assert_eq!(state.terminal(), Ok(TerminalState::Won));
    }

    #[test]
    fn test_same_seed_same_game() {
        let mut a = GameState::new(42);
        let mut b = GameState::new(42);
        a.new_game();
        b.new_game();
        for dir in [Direction::Left, Direction::Up, Direction::Right, Direction::Down].repeat(10) {
            assert_eq!(a.apply_move(dir), b.apply_move(dir));
        }
        assert_eq!(a.snapshot(), b.snapshot());
        assert_eq!(grid(&a), grid(&b));
    }

    #[test]
    fn test_apply_action_dispatch() {
        let mut state = GameState::new(1);
        assert_eq!(state.apply_action(GameAction::NewGame), Ok(true));
        assert_eq!(state.apply_action(GameAction::KeepPlaying), Ok(false));
        assert_eq!(state.episode_id(), 1);
    }

    #[test]
    fn test_snapshot_matches_state() {
        let mut state = GameState::new(77);
        state.new_game();
        let snap = state.snapshot().unwrap();
        assert_eq!(snap.tiles.len(), 2);
        assert_eq!(snap.grid, grid(&state));
        assert_eq!(snap.phase, Phase::Playing);
        assert_eq!(snap.seed, 77);
        assert!(snap.tiles.iter().all(|t| t.is_new));
    }
}
