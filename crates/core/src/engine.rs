//! Renderer contract and the engine wrapper that drives it.
//!
//! [`Engine`] owns a [`GameState`] and a [`Renderer`]. Every successful state
//! change presents a fresh snapshot synchronously, after the spawn and the
//! terminal check, so the renderer never sees a half-applied move.

use crate::game_state::{GameState, MoveOutcome};
use crate::snapshot::GameSnapshot;
use crate::types::{Direction, EngineError, GameAction, Phase};

/// Receives the board after every update.
pub trait Renderer {
    fn present(&mut self, snapshot: &GameSnapshot);
}

impl<F> Renderer for F
where
    F: FnMut(&GameSnapshot),
{
    fn present(&mut self, snapshot: &GameSnapshot) {
        self(snapshot)
    }
}

/// A renderer that ignores every update (headless runs, benches).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn present(&mut self, _snapshot: &GameSnapshot) {}
}

#[derive(Debug)]
pub struct Engine<R: Renderer> {
    state: GameState,
    renderer: R,
    scratch: GameSnapshot,
}

impl<R: Renderer> Engine<R> {
    pub fn new(seed: u32, renderer: R) -> Self {
        Self::with_state(GameState::new(seed), renderer)
    }

    /// Wrap an existing state (e.g. one built with [`GameState::from_grid`]).
    pub fn with_state(state: GameState, renderer: R) -> Self {
        Self {
            state,
            renderer,
            scratch: GameSnapshot::default(),
        }
    }

    pub fn new_game(&mut self) {
        self.state.new_game();
        self.present();
    }

    /// Apply a move; the renderer is only notified when the board changed.
    pub fn apply_move(&mut self, direction: Direction) -> Result<MoveOutcome, EngineError> {
        let outcome = self.state.apply_move(direction)?;
        if outcome.moved {
            self.present();
        }
        Ok(outcome)
    }

    pub fn set_keep_playing(&mut self) -> Result<bool, EngineError> {
        let changed = self.state.set_keep_playing()?;
        if changed {
            self.present();
        }
        Ok(changed)
    }

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

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn into_parts(self) -> (GameState, R) {
        (self.state, self.renderer)
    }

    fn present(&mut self) {
        if self.state.snapshot_into(&mut self.scratch).is_ok() {
            self.renderer.present(&self.scratch);
        }
    }
}
