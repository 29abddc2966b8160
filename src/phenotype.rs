//! # Phenotype Trait
//!
//! The `Phenotype` trait defines the interface for the individuals the
//! evolution launcher works with. In this crate the only production
//! implementor is [`Genome`](crate::optimizer::Genome), but the launcher,
//! selection and breeding code is written against the trait so it can be
//! exercised in isolation.
//!
//! Unlike a free-standing value, a candidate allocation only makes sense
//! relative to the tasks and resources it was built from. That problem data is
//! the associated `Context`: it is shared read-only by every individual and
//! passed into construction and mutation.
//!
//! ## Example
//!
//! ```rust
//! use resource_optimizer::phenotype::Phenotype;
//! use resource_optimizer::rng::RandomNumberGenerator;
//!
//! #[derive(Clone, Debug)]
//! struct Level {
//!     value: f64,
//! }
//!
//! impl Phenotype for Level {
//!     type Context = (f64, f64);
//!
//!     fn random(bounds: &Self::Context, rng: &mut RandomNumberGenerator) -> Self {
//!         Level { value: bounds.0 + rng.unit() * (bounds.1 - bounds.0) }
//!     }
//!
//!     fn crossover(&mut self, other: &Self, _rng: &mut RandomNumberGenerator) {
//!         self.value = (self.value + other.value) / 2.0;
//!     }
//!
//!     fn mutate(&mut self, bounds: &Self::Context, rate: f64, rng: &mut RandomNumberGenerator) {
//!         if rng.chance(rate) {
//!             self.value = (self.value + rng.unit() - 0.5).clamp(bounds.0, bounds.1);
//!         }
//!     }
//! }
//! ```

use std::fmt::Debug;

use crate::rng::RandomNumberGenerator;

/// Trait for types that represent individuals in the evolutionary search.
///
/// Types implementing this trait must be `Clone`, `Debug`, `Send` and `Sync` so
/// populations can be scored and bred on rayon worker threads.
pub trait Phenotype: Clone + Debug + Send + Sync {
    /// Read-only problem data shared by every individual of a run.
    type Context: Send + Sync;

    /// Builds a random but valid individual.
    fn random(ctx: &Self::Context, rng: &mut RandomNumberGenerator) -> Self;

    /// Exchanges genetic material with `other`, leaving the offspring in `self`.
    ///
    /// Implementations must keep the individual structurally valid (for
    /// genomes: exactly one allocation per task).
    fn crossover(&mut self, other: &Self, rng: &mut RandomNumberGenerator);

    /// Applies random changes, each gene being touched with probability
    /// `mutation_rate`.
    fn mutate(
        &mut self,
        ctx: &Self::Context,
        mutation_rate: f64,
        rng: &mut RandomNumberGenerator,
    );
}
