//! Input mapping, swipe detection and the settle gate working together.

use crossterm::event::{
    KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use tui_2048::core::{Engine, GameState, NullRenderer};
use tui_2048::input::{handle_key_event, should_quit, MoveGate, SwipeTracker};
use tui_2048::types::{Direction, GameAction, TICK_MS};

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
    MouseEvent {
        kind,
        column,
        row,
        modifiers: KeyModifiers::NONE,
    }
}

#[test]
fn every_layout_maps_to_the_same_moves() {
    let layouts = [
        [KeyCode::Up, KeyCode::Down, KeyCode::Left, KeyCode::Right],
        [
            KeyCode::Char('k'),
            KeyCode::Char('j'),
            KeyCode::Char('h'),
            KeyCode::Char('l'),
        ],
        [
            KeyCode::Char('W'),
            KeyCode::Char('S'),
            KeyCode::Char('A'),
            KeyCode::Char('D'),
        ],
    ];
    let expected = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];
    for layout in layouts {
        for (code, dir) in layout.into_iter().zip(expected) {
            assert_eq!(handle_key_event(key(code)), Some(GameAction::Move(dir)));
        }
    }
}

#[test]
fn ctrl_c_quits_instead_of_keep_playing() {
    let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
    assert!(should_quit(ctrl_c));
    assert_eq!(handle_key_event(ctrl_c), None);
    assert_eq!(
        handle_key_event(key(KeyCode::Char('c'))),
        Some(GameAction::KeepPlaying)
    );
    assert!(should_quit(key(KeyCode::Esc)));
}

#[test]
fn gate_serializes_moves_during_settle() {
    let state = GameState::from_grid(5, [[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]).unwrap();
    let mut engine = Engine::with_state(state, NullRenderer);
    let mut gate = MoveGate::new(TICK_MS * 3);
    let left = GameAction::Move(Direction::Left);
    let right = GameAction::Move(Direction::Right);

    assert!(gate.admit(left));
    let changed = engine.apply_action(left).unwrap();
    gate.on_applied(left, changed);
    assert!(changed);

    // Inputs arriving during the animation are dropped, not queued.
    assert!(!gate.admit(right));
    gate.update(TICK_MS);
    gate.update(TICK_MS);
    assert!(!gate.admit(right));
    gate.update(TICK_MS);
    assert!(gate.admit(right));

    assert!(gate.admit(GameAction::NewGame));
    gate.on_applied(left, true);
    gate.on_applied(GameAction::NewGame, true);
    assert!(!gate.is_settling());
}

#[test]
fn swipe_feeds_a_move() {
    let state = GameState::from_grid(5, [[0, 0, 0, 2], [0; 4], [0; 4], [0; 4]]).unwrap();
    let mut engine = Engine::with_state(state, NullRenderer);
    let mut swipe = SwipeTracker::new();

    swipe.handle_mouse_event(mouse(MouseEventKind::Down(MouseButton::Left), 40, 10));
    swipe.handle_mouse_event(mouse(MouseEventKind::Drag(MouseButton::Left), 30, 10));
    let dir = swipe
        .handle_mouse_event(mouse(MouseEventKind::Up(MouseButton::Left), 20, 11))
        .unwrap();
    assert_eq!(dir, Direction::Left);

    assert!(engine.apply_move(dir).unwrap().moved);
    assert_eq!(engine.state().value_at(0, 0), 2);
}
