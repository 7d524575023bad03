//! Fair coin used when a round ends with neither value in the majority.

use std::sync::{Mutex, PoisonError};

use benor_types::Value;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of unbiased binary values.
pub trait Coin: Send + Sync {
    /// Flip the coin. Must return [`Value::Zero`] or [`Value::One`].
    fn flip(&self) -> Value;
}

/// Coin backed by the thread-local OS-seeded RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomCoin;

impl Coin for RandomCoin {
    fn flip(&self) -> Value {
        Value::from_bit(rand::thread_rng().gen_bool(0.5))
    }
}

/// Reproducible coin for replaying a run from a fixed seed.
pub struct SeededCoin {
    rng: Mutex<StdRng>,
}

impl SeededCoin {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Coin for SeededCoin {
    fn flip(&self) -> Value {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        Value::from_bit(rng.gen_bool(0.5))
    }
}
