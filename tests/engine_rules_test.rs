use std::collections::HashSet;

use tui_2048::core::{Engine, GameSnapshot, GameState, NullRenderer};
use tui_2048::types::{Direction, EngineError, Phase, TerminalState, TileId};

const ORDER: [Direction; 4] = [Direction::Left, Direction::Down, Direction::Right, Direction::Up];

fn total(snap: &GameSnapshot) -> u32 {
    snap.total_value()
}

/// Play a seeded game with a fixed direction preference and check every move.
fn play_and_check(seed: u32, max_moves: usize) -> GameSnapshot {
    let mut state = GameState::new(seed);
    state.new_game();
    let mut seen: HashSet<TileId> = state.snapshot().unwrap().tiles.iter().map(|t| t.id).collect();

    for _ in 0..max_moves {
        if state.terminal().unwrap() == TerminalState::Won {
            assert!(state.set_keep_playing().unwrap());
        }
        let Some(dir) = ORDER.into_iter().find(|d| state.can_move(*d).unwrap()) else {
            break;
        };

        let before = state.snapshot().unwrap();
        let before_ids: HashSet<TileId> = before.tiles.iter().map(|t| t.id).collect();
        let outcome = state.apply_move(dir).unwrap();
        let after = state.snapshot().unwrap();

        assert!(outcome.moved, "can_move said {dir} was legal");
        let merged: u32 = outcome.merges.iter().map(|m| m.result.value).sum();
        assert_eq!(outcome.score_delta, merged);
        assert_eq!(after.score, before.score + merged);

        let spawned = outcome.spawned.expect("a changed board always has room");
        assert!(spawned.value == 2 || spawned.value == 4);
        assert_eq!(total(&after), total(&before) + spawned.value);
        assert_eq!(after.tiles.iter().filter(|t| t.is_new).count(), 1);

        for m in &outcome.merges {
            // Sources come from the board before the move, never from this move's merges.
            assert!(m.sources.iter().all(|s| before_ids.contains(s)));
            assert_eq!(m.result.value, 2 * before_value(&before, m.sources[0]));
        }
        let sources: Vec<TileId> = outcome.merges.iter().flat_map(|m| m.sources).collect();
        let unique: HashSet<TileId> = sources.iter().copied().collect();
        assert_eq!(sources.len(), unique.len(), "a tile fed two merges");

        for t in &after.tiles {
            if !before_ids.contains(&t.id) {
                assert!(seen.insert(t.id), "id {} reused", t.id);
            }
        }
        let ids: HashSet<TileId> = after.tiles.iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), after.tiles.len());
    }

    state.snapshot().unwrap()
}

fn before_value(snap: &GameSnapshot, id: TileId) -> u32 {
    snap.tiles
        .iter()
        .find(|t| t.id == id)
        .map(|t| t.value)
        .unwrap_or(0)
}

#[test]
fn seeded_games_keep_every_invariant() {
    for seed in 1..=12 {
        let end = play_and_check(seed, 400);
        assert!(end.move_count > 0);
    }
}

#[test]
fn same_seed_same_inputs_same_snapshots() {
    let mut a = GameState::new(2024);
    let mut b = GameState::new(2024);
    a.new_game();
    b.new_game();
    for i in 0..200 {
        let dir = ORDER[i % 4];
        assert_eq!(a.apply_move(dir).unwrap(), b.apply_move(dir).unwrap());
        assert_eq!(a.snapshot().unwrap(), b.snapshot().unwrap());
    }
}

#[test]
fn documented_line_examples() {
    let cases: [([u32; 4], [u32; 4], u32); 3] = [
        ([2, 2, 0, 0], [4, 0, 0, 0], 4),
        ([2, 2, 2, 2], [4, 4, 0, 0], 8),
        ([4, 2, 2, 0], [4, 4, 0, 0], 4),
    ];
    for (row, expect, score) in cases {
        let mut state = GameState::from_grid(1, [row, [0; 4], [0; 4], [0; 4]]).unwrap();
        let outcome = state.apply_move(Direction::Left).unwrap();
        assert!(outcome.moved);
        assert_eq!(outcome.score_delta, score);
        for (col, v) in expect.iter().enumerate() {
            assert_eq!(state.value_at(0, col), *v, "row {row:?} col {col}");
        }
    }
}

#[test]
fn reversed_directions_pair_from_the_leading_edge() {
    // An odd run keeps its leftover tile on the far side of the merge.
    let mut state = GameState::from_grid(1, [[2, 2, 2, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
    assert_eq!(state.apply_move(Direction::Right).unwrap().score_delta, 4);
    assert_eq!([2, 3].map(|c| state.value_at(0, c)), [2, 4]);

    let column = [[0, 0, 0, 8], [0, 0, 0, 8], [0, 0, 0, 8], [0; 4]];
    let mut state = GameState::from_grid(1, column).unwrap();
    assert_eq!(state.apply_move(Direction::Down).unwrap().score_delta, 16);
    assert_eq!([2, 3].map(|r| state.value_at(r, 3)), [8, 16]);

    let mut state = GameState::from_grid(1, column).unwrap();
    state.apply_move(Direction::Up).unwrap();
    assert_eq!([0, 1].map(|r| state.value_at(r, 3)), [16, 8]);
}

#[test]
fn noop_move_is_repeatable_and_inert() {
    let mut state = GameState::from_grid(3, [[2, 4, 8, 16], [0; 4], [0; 4], [0; 4]]).unwrap();
    let hash = state.snapshot().unwrap().state_hash();
    for _ in 0..3 {
        let outcome = state.apply_move(Direction::Left).unwrap();
        assert!(!outcome.moved);
        assert!(outcome.spawned.is_none());
        assert_eq!(outcome.score_delta, 0);
        assert_eq!(state.snapshot().unwrap().state_hash(), hash);
    }
    assert_eq!(state.move_count(), 0);
}

#[test]
fn game_over_on_full_board_without_pairs() {
    let stuck = [[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]];
    let state = GameState::from_grid(1, stuck).unwrap();
    assert!(state.is_game_over().unwrap());
    assert_eq!(state.terminal().unwrap(), TerminalState::GameOver);
    assert_eq!(state.phase(), Phase::GameOver);
    for dir in Direction::ALL {
        assert!(!state.can_move(dir).unwrap());
    }

    let mut open = stuck;
    open[3][3] = 4; // pairs with its left and upper neighbours
    let state = GameState::from_grid(1, open).unwrap();
    assert!(!state.is_game_over().unwrap());
    assert!(state.has_moves().unwrap());
}

#[test]
fn win_is_reported_once_then_suppressed() {
    let grid = [[1024, 1024, 1024, 1024], [0; 4], [0; 4], [0; 4]];
    let mut state = GameState::from_grid(8, grid).unwrap();
    assert!(!state.is_won().unwrap());

    let outcome = state.apply_move(Direction::Left).unwrap();
    assert_eq!(outcome.terminal, TerminalState::Won);
    assert!(state.is_won().unwrap());
    assert_eq!(state.phase(), Phase::Won);

    // Frozen until dismissed.
    let rejected = state.apply_move(Direction::Right).unwrap();
    assert!(!rejected.moved);
    assert_eq!(state.value_at(0, 0), 2048);

    assert!(state.set_keep_playing().unwrap());
    assert_eq!(state.terminal().unwrap(), TerminalState::None);
    assert_eq!(state.phase(), Phase::Playing);

    // 2048 + 2048 is a later win-sized merge; it must not re-trigger.
    let outcome = state.apply_move(Direction::Left).unwrap();
    assert!(outcome.moved);
    assert_eq!(state.value_at(0, 0), 4096);
    assert_ne!(outcome.terminal, TerminalState::Won);
    assert!(state.is_won().unwrap());
}

#[test]
fn keep_playing_without_win_is_a_noop() {
    let mut state = GameState::from_grid(1, [[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
    assert!(!state.set_keep_playing().unwrap());
    assert!(!state.keep_playing());
}

#[test]
fn every_query_fails_before_new_game() {
    let mut state = GameState::new(1);
    assert_eq!(state.phase(), Phase::Idle);
    assert_eq!(state.score(), Err(EngineError::UninitializedState));
    assert_eq!(state.is_won(), Err(EngineError::UninitializedState));
    assert_eq!(state.is_game_over(), Err(EngineError::UninitializedState));
    assert_eq!(state.terminal(), Err(EngineError::UninitializedState));
    assert_eq!(state.can_move(Direction::Up), Err(EngineError::UninitializedState));
    assert_eq!(state.set_keep_playing(), Err(EngineError::UninitializedState));
    assert!(matches!(
        state.apply_move(Direction::Up),
        Err(EngineError::UninitializedState)
    ));
    assert!(state.snapshot().is_err());
}

#[test]
fn engine_presents_after_each_change() {
    let mut hashes = Vec::new();
    {
        let mut engine = Engine::new(77, |s: &GameSnapshot| hashes.push(s.state_hash()));
        engine.new_game();
        for dir in ORDER {
            engine.apply_move(dir).unwrap();
        }
    }
    assert!(hashes.len() >= 2);

    let mut engine = Engine::new(77, NullRenderer);
    engine.new_game();
    assert_eq!(engine.state().snapshot().unwrap().state_hash(), hashes[0]);
}
