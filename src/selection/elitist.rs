use crate::error::Result;
use crate::phenotype::Phenotype;
use crate::rng::RandomNumberGenerator;
use crate::selection::selection_strategy::{by_fitness_desc, validate_inputs, SelectionStrategy};

/// Deterministic truncation selection: the `n` fittest individuals, best
/// first. Used for elitism.
#[derive(Debug, Clone, Default)]
pub struct ElitistSelection;

impl ElitistSelection {
    pub fn new() -> Self {
        Self
    }

    /// Population indices ordered from best to worst. Ties keep population
    /// order.
    pub fn ranked_indices(fitness: &[f64]) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..fitness.len()).collect();
        indices.sort_by(|&a, &b| by_fitness_desc(fitness[a], fitness[b]));
        indices
    }
}

impl<P> SelectionStrategy<P> for ElitistSelection
where
    P: Phenotype,
{
    fn select(
        &self,
        population: &[P],
        fitness: &[f64],
        num_to_select: usize,
        _rng: &mut RandomNumberGenerator,
    ) -> Result<Vec<P>> {
        validate_inputs(population, fitness)?;

        Ok(Self::ranked_indices(fitness)
            .into_iter()
            .take(num_to_select)
            .map(|idx| population[idx].clone())
            .collect())
    }
}
