use std::fmt::Debug;

use crate::error::{OptimizerError, Result};
use crate::phenotype::Phenotype;
use crate::rng::RandomNumberGenerator;

/// Trait for selection strategies.
///
/// Strategies choose individuals from a scored population. Fitness is always
/// higher-is-better in this crate.
pub trait SelectionStrategy<P>: Debug + Send + Sync
where
    P: Phenotype,
{
    /// Selects up to `num_to_select` individuals.
    ///
    /// Strategies that do not allow duplicates return at most
    /// `population.len()` individuals.
    ///
    /// # Errors
    ///
    /// Returns an error if the population is empty or the fitness vector
    /// length doesn't match the population length.
    fn select(
        &self,
        population: &[P],
        fitness: &[f64],
        num_to_select: usize,
        rng: &mut RandomNumberGenerator,
    ) -> Result<Vec<P>>;
}

pub(crate) fn validate_inputs<P>(population: &[P], fitness: &[f64]) -> Result<()> {
    if population.is_empty() {
        return Err(OptimizerError::EmptyPopulation);
    }

    if fitness.len() != population.len() {
        return Err(OptimizerError::Configuration(format!(
            "Fitness vector length ({}) doesn't match population length ({})",
            fitness.len(),
            population.len()
        )));
    }

    Ok(())
}

/// Descending order with NaN sorted last.
pub(crate) fn by_fitness_desc(a: f64, b: f64) -> std::cmp::Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => std::cmp::Ordering::Equal,
        (true, false) => std::cmp::Ordering::Greater,
        (false, true) => std::cmp::Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(std::cmp::Ordering::Equal),
    }
}

/// Walks a cumulative probability table for a uniform draw.
pub(crate) fn pick_cumulative(cumulative_probs: &[f64], rng: &mut RandomNumberGenerator) -> usize {
    let r = rng.unit();
    cumulative_probs
        .iter()
        .position(|&prob| r <= prob)
        .unwrap_or(cumulative_probs.len().saturating_sub(1))
}
