//! Shared uniform random source for the simulator and signal generator.
//!
//! Everything random in the service draws from an [`Entropy`] handle so a run
//! can be reproduced from a seed, or scripted draw by draw in tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex, PoisonError};

/// A source of uniform draws in `[0, 1)`.
pub trait RandomSource: Send {
    fn next_f64(&mut self) -> f64;
}

impl RandomSource for StdRng {
    fn next_f64(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Replays a fixed list of draws, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct SequenceSource {
    values: Vec<f64>,
    position: usize,
}

impl SequenceSource {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, position: 0 }
    }
}

impl RandomSource for SequenceSource {
    fn next_f64(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.position % self.values.len()];
        self.position += 1;
        value
    }
}

/// Cloneable handle to a shared random source.
#[derive(Clone)]
pub struct Entropy {
    source: Arc<Mutex<Box<dyn RandomSource>>>,
}

impl Entropy {
    /// Wrap any random source.
    pub fn from_source(source: impl RandomSource + 'static) -> Self {
        Self {
            source: Arc::new(Mutex::new(Box::new(source))),
        }
    }

    /// Deterministic source for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self::from_source(StdRng::seed_from_u64(seed))
    }

    /// Source seeded from the operating system.
    pub fn from_os() -> Self {
        Self::from_source(StdRng::from_entropy())
    }

    /// Seeded when a seed is given, OS-seeded otherwise.
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_os(),
        }
    }

    /// Uniform draw in `[0, 1)`.
    pub fn uniform(&self) -> f64 {
        let mut source = self.source.lock().unwrap_or_else(PoisonError::into_inner);
        source.next_f64().clamp(0.0, 1.0 - f64::EPSILON)
    }

    /// Uniform integer in `[0, n)`.
    pub fn below(&self, n: u32) -> u32 {
        (self.uniform() * n as f64).floor() as u32
    }

    /// Pick an element uniformly.
    pub fn pick<'a, T>(&self, items: &'a [T]) -> &'a T {
        &items[self.below(items.len() as u32) as usize]
    }
}

impl std::fmt::Debug for Entropy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entropy").finish_non_exhaustive()
    }
}
