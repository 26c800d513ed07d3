//! Core types module - shared data structures and constants
//!
//! This crate defines the vocabulary shared by the engine, the terminal renderer,
//! the input layer and the JSON bridge. It contains no game logic.
//!
//! # Grid
//!
//! - **Size**: 4x4 cells, row-major, origin at the top-left
//! - **Coordinates**: `(row, col)`, both zero-indexed, row grows downward
//! - **Start**: two tiles are seeded on a new game
//!
//! # Timing Constants
//!
//! The engine itself is untimed. These values are used by renderers to pace
//! animations and to gate input while a move settles:
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `TICK_MS` | 16 | Render loop timestep (~60 FPS) |
//! | `ANIM_DURATION_MS` | 160 | Slide/merge animation length |
//! | `SETTLE_MS` | 190 | Moves are ignored this long after a move |
//!
//! # Examples
//!
//! ```
//! use tui_2048_types::{Direction, GameAction, GRID_SIZE, WIN_VALUE};
//!
//! let dir: Direction = "left".parse().unwrap();
//! assert_eq!(dir, Direction::Left);
//! assert!(dir.is_horizontal());
//!
//! let action: GameAction = "keepPlaying".parse().unwrap();
//! assert_eq!(action, GameAction::KeepPlaying);
//!
//! assert!("diagonal".parse::<Direction>().is_err());
//! assert_eq!(GRID_SIZE, 4);
//! assert_eq!(WIN_VALUE, 2048);
//! ```

use std::fmt;
use std::str::FromStr;

/// Side length of the square grid.
pub const GRID_SIZE: usize = 4;

/// Total number of cells on the grid.
pub const CELL_COUNT: usize = GRID_SIZE * GRID_SIZE;

/// Tiles seeded by a new game.
pub const START_TILES: usize = 2;

/// Tile value that wins the game.
pub const WIN_VALUE: u32 = 2048;

/// Spawned tile values.
pub const SPAWN_LOW_VALUE: u32 = 2;
pub const SPAWN_HIGH_VALUE: u32 = 4;

/// Chance (out of 100) that a spawned tile is a 4.
pub const SPAWN_HIGH_PERCENT: u32 = 10;

/// Render loop timestep in milliseconds.
pub const TICK_MS: u32 = 16;

/// Slide/merge animation length in milliseconds.
pub const ANIM_DURATION_MS: u32 = 160;

/// Settle period after a move before the next move is accepted.
pub const SETTLE_MS: u32 = ANIM_DURATION_MS + 30;

/// Engine error kinds.
///
/// Stuck or full boards are terminal states, not errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// An input outside the closed set the engine accepts.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A query or move issued before the first `new_game`.
    #[error("game has not been started; call new_game first")]
    UninitializedState,
}

/// Stable tile identity.
///
/// Assigned when a tile is spawned or produced by a merge and kept while the tile
/// slides. Unique within one game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub u32);

impl TileId {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The four slide directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// All directions in a fixed order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Rows slide for left/right, columns for up/down.
    pub fn is_horizontal(&self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    /// Whether tiles slide toward the high index end of a line (right/down).
    pub fn is_reversed(&self) -> bool {
        matches!(self, Direction::Right | Direction::Down)
    }

    /// Lowercase name used by the JSON bridge.
    ///
    /// ```
    /// use tui_2048_types::Direction;
    ///
    /// assert_eq!(Direction::Up.as_str(), "up");
    /// assert_eq!(Direction::Right.as_str(), "right");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl FromStr for Direction {
    type Err = EngineError;

    /// Parse a direction (case-insensitive). Unknown names fail with
    /// [`EngineError::InvalidArgument`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            _ => Err(EngineError::InvalidArgument(format!(
                "unknown direction: {s:?}"
            ))),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Actions a player or remote controller can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameAction {
    /// Slide all tiles in a direction
    Move(Direction),
    /// Dismiss the win notice and continue the session
    KeepPlaying,
    /// Discard the board and start over
    NewGame,
}

impl GameAction {
    pub fn is_move(&self) -> bool {
        matches!(self, GameAction::Move(_))
    }

    /// camelCase name used by the JSON bridge.
    pub fn as_str(&self) -> &'static str {
        match self {
            GameAction::Move(dir) => dir.as_str(),
            GameAction::KeepPlaying => "keepPlaying",
            GameAction::NewGame => "newGame",
        }
    }
}

impl FromStr for GameAction {
    type Err = EngineError;

    /// Parse an action (case-insensitive).
    ///
    /// ```
    /// use tui_2048_types::{Direction, GameAction};
    ///
    /// assert_eq!("newGame".parse(), Ok(GameAction::NewGame));
    /// assert_eq!("DOWN".parse(), Ok(GameAction::Move(Direction::Down)));
    /// assert!("undo".parse::<GameAction>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keepplaying" => Ok(GameAction::KeepPlaying),
            "newgame" => Ok(GameAction::NewGame),
            other => other
                .parse::<Direction>()
                .map(GameAction::Move)
                .map_err(|_| EngineError::InvalidArgument(format!("unknown action: {s:?}"))),
        }
    }
}

/// Terminal condition reported to renderers after every update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TerminalState {
    /// Play continues
    #[default]
    None,
    /// 2048 was formed and the player has not chosen to keep playing
    Won,
    /// Board is full and no adjacent pair can merge
    GameOver,
}

impl TerminalState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TerminalState::None)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TerminalState::None => "none",
            TerminalState::Won => "won",
            TerminalState::GameOver => "game_over",
        }
    }
}

/// Session lifecycle.
///
/// `Idle → Playing → {Playing, Won, GameOver}`; `Won → Playing` once the player
/// keeps playing; `GameOver` leaves only through a new game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Idle,
    Playing,
    Won,
    GameOver,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Playing => "playing",
            Phase::Won => "won",
            Phase::GameOver => "game_over",
        }
    }
}

impl From<TerminalState> for Phase {
    fn from(value: TerminalState) -> Self {
        match value {
            TerminalState::None => Phase::Playing,
            TerminalState::Won => Phase::Won,
            TerminalState::GameOver => Phase::GameOver,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settle_covers_animation() {
        assert!(SETTLE_MS > ANIM_DURATION_MS);
        assert_eq!(CELL_COUNT, 16);
        assert!(START_TILES <= CELL_COUNT);
    }

    #[test]
    fn direction_parse_is_case_insensitive() {
        assert_eq!("UP".parse::<Direction>(), Ok(Direction::Up));
        assert_eq!(" Right ".parse::<Direction>(), Ok(Direction::Right));
        for dir in Direction::ALL {
            assert_eq!(dir.as_str().parse::<Direction>(), Ok(dir));
        }
    }

    #[test]
    fn unknown_direction_is_invalid_argument() {
        let err = "sideways".parse::<Direction>().unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(_)));
    }

    #[test]
    fn direction_orientation() {
        assert!(Direction::Left.is_horizontal());
        assert!(!Direction::Up.is_horizontal());
        assert!(Direction::Down.is_reversed());
        assert!(!Direction::Left.is_reversed());
    }

    #[test]
    fn action_names() {
        assert_eq!(GameAction::KeepPlaying.as_str(), "keepPlaying");
        assert_eq!(GameAction::Move(Direction::Left).as_str(), "left");
        assert!(GameAction::Move(Direction::Up).is_move());
        assert!(!GameAction::NewGame.is_move());
        assert!(matches!(
            "rotateCw".parse::<GameAction>(),
            Err(EngineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn terminal_maps_to_phase() {
        assert_eq!(Phase::from(TerminalState::None), Phase::Playing);
        assert_eq!(Phase::from(TerminalState::Won), Phase::Won);
        assert_eq!(Phase::from(TerminalState::GameOver), Phase::GameOver);
        assert!(!TerminalState::None.is_terminal());
        assert_eq!(TerminalState::GameOver.as_str(), "game_over");
    }
}
