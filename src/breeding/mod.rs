//! # BreedStrategy
//!
//! Breeding turns the selected mating pool into offspring through crossover
//! and mutation.
pub mod standard;

use std::fmt::Debug;

use crate::{
    error::Result, evolution::options::EvolutionOptions, phenotype::Phenotype,
    rng::RandomNumberGenerator,
};

pub use standard::StandardBreeding;

pub trait BreedStrategy<P: Phenotype>: Debug + Send + Sync {
    /// Produces exactly `parents.len()` offspring.
    ///
    /// # Errors
    ///
    /// Returns `OptimizerError::EmptyPopulation` if `parents` is empty.
    fn breed(
        &self,
        parents: &[P],
        ctx: &P::Context,
        options: &EvolutionOptions,
        rng: &mut RandomNumberGenerator,
    ) -> Result<Vec<P>>;
}
