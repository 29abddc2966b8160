use std::collections::HashSet;

use crate::error::{OptimizerError, Result};
use crate::phenotype::Phenotype;
use crate::rng::RandomNumberGenerator;
use crate::selection::selection_strategy::{
    by_fitness_desc, pick_cumulative, validate_inputs, SelectionStrategy,
};

/// Linear ranking selection.
///
/// Selection probability depends only on rank position, not on the fitness
/// magnitude, which keeps one dominant genome from taking over the mating pool.
/// The best individual gets probability `s / n` and the worst `(2 - s) / n`,
/// where `s` is the selection pressure in `[1.0, 2.0]`.
#[derive(Debug, Clone)]
pub struct RankBasedSelection {
    selection_pressure: f64,
    allow_duplicates: bool,
}

impl RankBasedSelection {
    /// # Errors
    ///
    /// Returns `OptimizerError::Configuration` if `selection_pressure` is not in
    /// `[1.0, 2.0]`.
    pub fn new(selection_pressure: f64, allow_duplicates: bool) -> Result<Self> {
        if !(1.0..=2.0).contains(&selection_pressure) {
            return Err(OptimizerError::Configuration(
                "Selection pressure must be in the range [1.0, 2.0]".to_string(),
            ));
        }

        Ok(Self {
            selection_pressure,
            allow_duplicates,
        })
    }

    pub fn with_duplicates(mut self) -> Self {
        self.allow_duplicates = true;
        self
    }

    /// Cumulative probabilities indexed by population position.
    fn calculate_probabilities(&self, fitness: &[f64]) -> Vec<f64> {
        let n = fitness.len();
        if n == 1 {
            return vec![1.0];
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| by_fitness_desc(fitness[a], fitness[b]));

        // order[0] is the best; it receives the highest linear rank.
        let mut rank_of = vec![0usize; n];
        for (position, &idx) in order.iter().enumerate() {
            rank_of[idx] = n - 1 - position;
        }

        let s = self.selection_pressure;
        let nf = n as f64;
        let mut cumulative = 0.0;
        let mut probs: Vec<f64> = rank_of
            .iter()
            .map(|&rank| {
                cumulative += (2.0 - s) / nf + 2.0 * rank as f64 * (s - 1.0) / (nf * (nf - 1.0));
                cumulative
            })
            .collect();

        if let Some(last) = probs.last_mut() {
            *last = 1.0;
        }

        probs
    }
}

impl Default for RankBasedSelection {
    fn default() -> Self {
        Self {
            selection_pressure: 1.5,
            allow_duplicates: false,
        }
    }
}

impl<P> SelectionStrategy<P> for RankBasedSelection
where
    P: Phenotype,
{
    fn select(
        &self,
        population: &[P],
        fitness: &[f64],
        num_to_select: usize,
        rng: &mut RandomNumberGenerator,
    ) -> Result<Vec<P>> {
        validate_inputs(population, fitness)?;

        let cumulative_probs = self.calculate_probabilities(fitness);

        let mut selected = Vec::with_capacity(num_to_select);
        let mut selected_indices = HashSet::new();

        while selected.len() < num_to_select {
            if !self.allow_duplicates && selected_indices.len() >= population.len() {
                break;
            }

            let idx = pick_cumulative(&cumulative_probs, rng);
            if self.allow_duplicates || selected_indices.insert(idx) {
                selected.push(population[idx].clone());
            }
        }

        Ok(selected)
    }
}
