//! Randomness used to pick markets, notionals, accounts and cooldowns.
//!
//! Injected through [`RandomSource`] so cycles can be replayed in tests.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub trait RandomSource: Send {
    /// Uniform integer in `[low, high]`.
    fn uniform_inclusive(&mut self, low: u64, high: u64) -> u64;

    /// Uniform index in `[0, len)`. `len` must be positive.
    fn index(&mut self, len: usize) -> usize;

    /// Two distinct uniform indices in `[0, len)`. `len` must be at least 2.
    fn distinct_pair(&mut self, len: usize) -> (usize, usize) {
        let first = self.index(len);
        let mut second = self.index(len - 1);
        if second >= first {
            second += 1;
        }
        (first, second)
    }
}

/// `rand`-backed source.
pub struct RngSource<R = StdRng> {
    rng: R,
}

impl RngSource<StdRng> {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng + Send> RandomSource for RngSource<R> {
    fn uniform_inclusive(&mut self, low: u64, high: u64) -> u64 {
        self.rng.gen_range(low..=high)
    }

    fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

/// Replays a fixed script of draws.
///
/// `uniform_inclusive` clamps the next value into range, `index` reduces it
/// modulo `len`. An exhausted script yields the lower bound.
#[derive(Debug, Default, Clone)]
pub struct ScriptedRandom {
    values: VecDeque<u64>,
}

impl ScriptedRandom {
    pub fn new(values: impl IntoIterator<Item = u64>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    pub fn push(&mut self, values: impl IntoIterator<Item = u64>) {
        self.values.extend(values);
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn uniform_inclusive(&mut self, low: u64, high: u64) -> u64 {
        self.values.pop_front().unwrap_or(low).clamp(low, high)
    }

    fn index(&mut self, len: usize) -> usize {
        let value = self.values.pop_front().unwrap_or(0);
        (value % len as u64) as usize
    }
}
