use std::collections::HashSet;

use crate::error::{OptimizerError, Result};
use crate::phenotype::Phenotype;
use crate::rng::RandomNumberGenerator;
use crate::selection::selection_strategy::{pick_cumulative, validate_inputs, SelectionStrategy};

/// Fitness-proportionate selection.
///
/// Requires non-negative fitness values. When every individual scores zero the
/// wheel degenerates to uniform selection instead of failing.
#[derive(Debug, Clone, Default)]
pub struct RouletteWheelSelection {
    allow_duplicates: bool,
}

impl RouletteWheelSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duplicates(allow_duplicates: bool) -> Self {
        Self { allow_duplicates }
    }

    /// Cumulative selection probabilities, last entry pinned to 1.0.
    ///
    /// # Errors
    ///
    /// Returns an error if any fitness value is negative or not finite.
    fn calculate_probabilities(&self, fitness: &[f64]) -> Result<Vec<f64>> {
        if fitness.iter().any(|&f| !f.is_finite() || f < 0.0) {
            return Err(OptimizerError::Configuration(
                "Roulette wheel selection requires finite, non-negative fitness values"
                    .to_string(),
            ));
        }

        let sum: f64 = fitness.iter().sum();
        let n = fitness.len() as f64;

        let mut cumulative = 0.0;
        let mut probs: Vec<f64> = fitness
            .iter()
            .map(|&f| {
                cumulative += if sum > 0.0 { f / sum } else { 1.0 / n };
                cumulative
            })
            .collect();

        if let Some(last) = probs.last_mut() {
            *last = 1.0;
        }

        Ok(probs)
    }
}

impl<P> SelectionStrategy<P> for RouletteWheelSelection
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

        let cumulative_probs = self.calculate_probabilities(fitness)?;

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::test_support::population;

    #[test]
    fn test_probabilities_proportional_to_fitness() {
        let selection = RouletteWheelSelection::new();
        let probs = selection.calculate_probabilities(&[1.0, 3.0]).unwrap();

        assert!((probs[0] - 0.25).abs() < 1e-12);
        assert_eq!(probs[1], 1.0);
    }

    #[test]
    fn test_zero_fitness_is_uniform() {
        let selection = RouletteWheelSelection::new();
        let probs = selection.calculate_probabilities(&[0.0, 0.0, 0.0, 0.0]).unwrap();

        assert!((probs[0] - 0.25).abs() < 1e-12);
        assert!((probs[2] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_negative_fitness_rejected() {
        let population = population(&[1.0, 2.0]);
        let mut rng = RandomNumberGenerator::from_seed(1);

        let result = RouletteWheelSelection::new().select(&population, &[0.5, -0.1], 1, &mut rng);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_weight_never_selected() {
        let population = population(&[1.0, 2.0, 3.0]);
        let fitness = vec![0.0, 1.0, 0.0];
        let mut rng = RandomNumberGenerator::from_seed(7);

        let selected = RouletteWheelSelection::with_duplicates(true)
            .select(&population, &fitness, 25, &mut rng)
            .unwrap();

        assert_eq!(selected.len(), 25);
        assert!(selected.iter().all(|s| s.value == 2.0));
    }

    #[test]
    fn test_without_duplicates_caps_at_population() {
        let population = population(&[1.0, 2.0, 3.0]);
        let mut rng = RandomNumberGenerator::from_seed(9);

        let selected = RouletteWheelSelection::new()
            .select(&population, &[0.2, 0.3, 0.5], 10, &mut rng)
            .unwrap();
        assert_eq!(selected.len(), 3);
    }
}
