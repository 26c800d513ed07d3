//! RNG module - deterministic tile spawning
//!
//! A small LCG drives every random choice the engine makes, so a game is fully
//! reproducible from its seed. [`TileSpawner`] layers the 2048 spawn rules on top:
//! a uniformly random empty cell and a value of 2 (90%) or 4 (10%).

use crate::types::{SPAWN_HIGH_PERCENT, SPAWN_HIGH_VALUE, SPAWN_LOW_VALUE};

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    ///
    /// Uses the high bits (multiply-shift) since the low bits of an LCG cycle with
    /// short periods.
    pub fn next_range(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        ((self.next_u32() as u64 * max as u64) >> 32) as u32
    }

    /// Current internal state (used to restart with the same sequence)
    pub fn state(&self) -> u32 {
        self.state
    }
}

/// Chooses where new tiles appear and what value they carry.
#[derive(Debug, Clone)]
pub struct TileSpawner {
    rng: SimpleRng,
    seed: u32,
}

impl TileSpawner {
    pub fn new(seed: u32) -> Self {
        Self {
            rng: SimpleRng::new(seed),
            seed,
        }
    }

    /// Seed this spawner was created with.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Value for a freshly spawned tile: 2 with probability 0.9, otherwise 4.
    pub fn next_value(&mut self) -> u32 {
        if self.rng.next_range(100) < SPAWN_HIGH_PERCENT {
            SPAWN_HIGH_VALUE
        } else {
            SPAWN_LOW_VALUE
        }
    }

    /// Pick one of `candidates` uniformly. Returns `None` when there is none.
    pub fn pick<T: Copy>(&mut self, candidates: &[T]) -> Option<T> {
        if candidates.is_empty() {
            return None;
        }
        let i = self.rng.next_range(candidates.len() as u32) as usize;
        candidates.get(i).copied()
    }
}

impl Default for TileSpawner {
    fn default() -> Self {
        Self::new(1)
    }
}
