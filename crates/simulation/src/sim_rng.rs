//! Deterministic per-game RNG.
//!
//! Each game owns exactly one `SimRng`, seeded once from the room seed.
//! World generation draws from it first and the tick loop continues the same
//! stream, so identical seeds produce identical worlds and identical traffic.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Debug)]
pub struct SimRng(pub ChaCha8Rng);

impl SimRng {
    pub fn from_seed_u64(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }

    /// A raw draw handed to branch resolution.
    pub fn next_draw(&mut self) -> u32 {
        self.0.gen()
    }

    /// Position in the keystream, for determinism checks.
    pub fn word_pos(&self) -> u128 {
        self.0.get_word_pos()
    }
}
