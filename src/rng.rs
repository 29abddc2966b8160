//! # RandomNumberGenerator
//!
//! A thin wrapper around the `rand` crate's `StdRng` used by every stochastic
//! step of the optimizer: genome construction, selection, crossover and
//! mutation.
//!
//! A run seeded with [`RandomNumberGenerator::from_seed`] is reproducible. When
//! work fans out across rayon threads, each task receives its own generator via
//! [`RandomNumberGenerator::fork`], drawn sequentially from the parent, so the
//! parallel path stays reproducible too.
//!
//! ## Example
//!
//! ```rust
//! use resource_optimizer::rng::RandomNumberGenerator;
//!
//! let mut rng = RandomNumberGenerator::from_seed(7);
//! let draw = rng.unit();
//! assert!((0.0..1.0).contains(&draw));
//! assert!((10..=20).contains(&rng.range_i64(10, 20)));
//! ```

use rand::{
    distributions::{Distribution, WeightedIndex},
    rngs::StdRng,
    Rng, SeedableRng,
};

#[derive(Debug, Clone)]
pub struct RandomNumberGenerator {
    pub rng: StdRng,
}

impl RandomNumberGenerator {
    /// Creates a new generator seeded from system entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a new generator with a fixed seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Derives an independent child generator from this one.
    pub fn fork(&mut self) -> Self {
        Self::from_seed(self.rng.gen())
    }

    /// A single draw in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Returns `true` with probability `p` (clamped to `[0, 1]`).
    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// Uniform integer in the inclusive range.
    pub fn range_i64(&mut self, low: i64, high: i64) -> i64 {
        self.rng.gen_range(low..=high)
    }

    /// Draws an index with probability proportional to `weights`.
    ///
    /// Returns `None` when the weights are empty, negative, or all zero.
    pub fn weighted_index(&mut self, weights: &[f64]) -> Option<usize> {
        let dist = WeightedIndex::new(weights).ok()?;
        Some(dist.sample(&mut self.rng))
    }
}

impl Default for RandomNumberGenerator {
    fn default() -> Self {
        Self::new()
    }
}
