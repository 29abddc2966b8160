use std::collections::HashSet;

use crate::error::{OptimizerError, Result};
use crate::phenotype::Phenotype;
use crate::rng::RandomNumberGenerator;
use crate::selection::selection_strategy::{validate_inputs, SelectionStrategy};

/// Tournament selection.
///
/// Repeatedly samples `tournament_size` individuals uniformly and keeps the
/// fittest. Larger tournaments increase selection pressure; a tournament of
/// one is uniform random selection.
#[derive(Debug, Clone)]
pub struct TournamentSelection {
    tournament_size: usize,
    allow_duplicates: bool,
}

impl TournamentSelection {
    /// # Errors
    ///
    /// Returns `OptimizerError::Configuration` if `tournament_size` is 0.
    pub fn new(tournament_size: usize, allow_duplicates: bool) -> Result<Self> {
        if tournament_size < 1 {
            return Err(OptimizerError::Configuration(
                "Tournament size must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            tournament_size,
            allow_duplicates,
        })
    }

    pub fn tournament_size(&self) -> usize {
        self.tournament_size
    }

    /// Runs a single tournament among the non-excluded indices and returns the
    /// winner's index.
    fn run_tournament(
        &self,
        fitness: &[f64],
        rng: &mut RandomNumberGenerator,
        excluded: &HashSet<usize>,
    ) -> Result<usize> {
        let eligible: Vec<usize> = (0..fitness.len())
            .filter(|i| !excluded.contains(i))
            .collect();

        if eligible.is_empty() {
            return Err(OptimizerError::Configuration(
                "No eligible individuals for tournament selection".to_string(),
            ));
        }

        let mut best_idx = eligible[rng.index(eligible.len())];
        for _ in 1..self.tournament_size {
            let challenger = eligible[rng.index(eligible.len())];
            if fitness[challenger] > fitness[best_idx] {
                best_idx = challenger;
            }
        }

        Ok(best_idx)
    }
}

impl Default for TournamentSelection {
    fn default() -> Self {
        Self {
            tournament_size: 3,
            allow_duplicates: true,
        }
    }
}

impl<P> SelectionStrategy<P> for TournamentSelection
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

        let mut selected = Vec::with_capacity(num_to_select);
        let mut selected_indices = HashSet::new();
        let no_exclusions = HashSet::new();

        while selected.len() < num_to_select {
            if self.allow_duplicates {
                let winner = self.run_tournament(fitness, rng, &no_exclusions)?;
                selected.push(population[winner].clone());
                continue;
            }

            if selected_indices.len() >= population.len() {
                break;
            }
            let winner = self.run_tournament(fitness, rng, &selected_indices)?;
            selected_indices.insert(winner);
            selected.push(population[winner].clone());
        }

        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::test_support::{population, Scalar};

    #[test]
    fn test_tournament_selection() {
        let population = population(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let fitness = vec![0.5, 0.8, 0.3, 0.9, 0.1];
        let mut rng = RandomNumberGenerator::from_seed(1);

        let selected = TournamentSelection::default()
            .select(&population, &fitness, 7, &mut rng)
            .unwrap();
        assert_eq!(selected.len(), 7);
    }

    #[test]
    fn test_full_size_tournament_without_duplicates_is_elitist() {
        let population = population(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let fitness = vec![0.5, 0.8, 0.3, 0.9, 0.1];
        let mut rng = RandomNumberGenerator::from_seed(2);

        // A large tournament over the remaining pool almost surely finds the
        // best remaining individual.
        let selection = TournamentSelection::new(200, false).unwrap();
        let selected = selection.select(&population, &fitness, 2, &mut rng).unwrap();

        assert_eq!(selected, vec![Scalar { value: 4.0 }, Scalar { value: 2.0 }]);
    }

    #[test]
    fn test_without_duplicates_caps_at_population() {
        let population = population(&[1.0, 2.0, 3.0]);
        let fitness = vec![0.5, 0.8, 0.3];
        let mut rng = RandomNumberGenerator::from_seed(3);

        let selection = TournamentSelection::new(2, false).unwrap();
        let selected = selection.select(&population, &fitness, 10, &mut rng).unwrap();
        assert_eq!(selected.len(), 3);
    }

    #[test]
    fn test_empty_population_and_mismatch() {
        let mut rng = RandomNumberGenerator::from_seed(4);
        let selection = TournamentSelection::default();

        let empty: Vec<Scalar> = Vec::new();
        assert!(matches!(
            selection.select(&empty, &[], 3, &mut rng),
            Err(OptimizerError::EmptyPopulation)
        ));

        let population = population(&[1.0, 2.0]);
        assert!(selection.select(&population, &[0.5], 1, &mut rng).is_err());
    }

    #[test]
    fn test_invalid_size() {
        assert!(TournamentSelection::new(0, true).is_err());
    }

    #[test]
    fn test_run_tournament_with_excluded() {
        let fitness = vec![0.5, 0.8, 0.3, 0.9, 0.1];
        let mut rng = RandomNumberGenerator::from_seed(42);
        let selection = TournamentSelection::default();

        let excluded: HashSet<usize> = [0, 1, 2, 4].into_iter().collect();
        assert_eq!(selection.run_tournament(&fitness, &mut rng, &excluded).unwrap(), 3);

        let excluded: HashSet<usize> = (0..fitness.len()).collect();
        assert!(selection.run_tournament(&fitness, &mut rng, &excluded).is_err());
    }
}
