use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Random-number source for @random
///
/// Predictable mode is entered when a game seeds the generator with a
/// negative @random operand; uniform mode is the gameplay default.
pub enum RandMode {
    Predictable,
    RandomUniform,
}

pub struct ZRand {
    rng: Box<dyn RngCore>,
    pub mode: RandMode,
}

impl ZRand {
    pub fn new_uniform() -> ZRand {
        ZRand {
            rng: Box::new(StdRng::from_entropy()),
            mode: RandMode::RandomUniform,
        }
    }

    pub fn new_predictable(seed: u64) -> ZRand {
        ZRand {
            rng: Box::new(StdRng::seed_from_u64(seed)),
            mode: RandMode::Predictable,
        }
    }

    /// Reseed with entropy, back to uniform mode (@random 0)
    pub fn reseed(&mut self) {
        self.rng = Box::new(StdRng::from_entropy());
        self.mode = RandMode::RandomUniform;
    }

    /// Enter predictable mode with the given seed (@random with a
    /// negative operand)
    pub fn seed(&mut self, seed: u64) {
        self.rng = Box::new(StdRng::seed_from_u64(seed));
        self.mode = RandMode::Predictable;
    }

    /// Draw uniformly from 1..=range (range >= 1)
    pub fn next_in_range(&mut self, range: u16) -> u16 {
        debug_assert!(range >= 1);
        self.rng.gen_range(1..=range)
    }
}
