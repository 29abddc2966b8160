use std::marker::PhantomData;

use rayon::prelude::*;
use tracing::{debug, info};

use super::{challenge::Challenge, convergence::has_converged, options::EvolutionOptions};
use crate::{
    breeding::BreedStrategy,
    error::{OptimizerError, Result},
    phenotype::Phenotype,
    rng::RandomNumberGenerator,
    selection::{self, ElitistSelection, SelectionStrategy},
};

/// Outcome of a run: the best individual ever scored plus the trace needed to
/// judge how the search behaved.
#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionResult<P: Phenotype> {
    pub best: P,
    pub best_score: f64,
    /// Best fitness of each generation, in order.
    pub fitness_history: Vec<f64>,
    pub generations_run: usize,
    pub converged: bool,
}

/// A scored population. Built once per generation and never mutated; the next
/// generation is a fresh snapshot.
#[derive(Debug, Clone)]
pub struct Generation<P: Phenotype> {
    index: usize,
    individuals: Vec<P>,
    fitness: Vec<f64>,
}

impl<P: Phenotype> Generation<P> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn individuals(&self) -> &[P] {
        &self.individuals
    }

    pub fn fitness(&self) -> &[f64] {
        &self.fitness
    }

    /// Index and score of the fittest individual.
    pub fn best(&self) -> Option<(usize, f64)> {
        ElitistSelection::ranked_indices(&self.fitness)
            .first()
            .map(|&idx| (idx, self.fitness[idx]))
    }
}

/// Runs the generational loop: evaluate, record, check convergence, then
/// build the next population from elites plus bred offspring.
#[derive(Debug, Clone)]
pub struct EvolutionLauncher<P, B, C>
where
    P: Phenotype,
    B: BreedStrategy<P>,
    C: Challenge<P>,
{
    breeding: B,
    challenge: C,
    _marker: PhantomData<P>,
}

impl<P, B, C> EvolutionLauncher<P, B, C>
where
    P: Phenotype,
    B: BreedStrategy<P>,
    C: Challenge<P>,
{
    pub fn new(breeding: B, challenge: C) -> Self {
        Self {
            breeding,
            challenge,
            _marker: PhantomData,
        }
    }

    pub fn challenge(&self) -> &C {
        &self.challenge
    }

    /// Evolves a random initial population built from `ctx`.
    ///
    /// # Errors
    ///
    /// Returns an error if selection or breeding fails, or if the challenge
    /// produces a non-finite score.
    pub fn evolve(
        &self,
        ctx: &P::Context,
        options: &EvolutionOptions,
        rng: &mut RandomNumberGenerator,
    ) -> Result<EvolutionResult<P>> {
        let initial = (0..options.population_size())
            .map(|_| P::random(ctx, rng))
            .collect();
        self.evolve_from(initial, ctx, options, rng)
    }

    /// Evolves starting from `initial`.
    ///
    /// # Errors
    ///
    /// Returns `OptimizerError::EmptyPopulation` for an empty `initial`,
    /// `OptimizerError::Evolution` when its size differs from the configured
    /// population size, and the errors of [`evolve`](Self::evolve) otherwise.
    pub fn evolve_from(
        &self,
        initial: Vec<P>,
        ctx: &P::Context,
        options: &EvolutionOptions,
        rng: &mut RandomNumberGenerator,
    ) -> Result<EvolutionResult<P>> {
        if initial.is_empty() {
            return Err(OptimizerError::EmptyPopulation);
        }
        if initial.len() != options.population_size() {
            return Err(OptimizerError::Evolution(format!(
                "Initial population has {} members, expected {}",
                initial.len(),
                options.population_size()
            )));
        }

        let parent_selection =
            selection::for_method::<P>(options.selection_method(), options.tournament_size())?;
        let survivor_selection = ElitistSelection::new();

        info!(
            population_size = initial.len(),
            max_generations = options.max_generations(),
            fitness_function = %options.fitness_function(),
            "Starting evolution"
        );

        let mut generation = self.evaluate(0, initial, options)?;
        let mut best: Option<(P, f64)> = None;
        let mut fitness_history = Vec::with_capacity(options.max_generations());
        let mut converged = false;

        loop {
            let (best_idx, best_score) = generation
                .best()
                .ok_or(OptimizerError::EmptyPopulation)?;

            if best.as_ref().map_or(true, |(_, score)| best_score > *score) {
                best = Some((generation.individuals[best_idx].clone(), best_score));
            }
            fitness_history.push(best_score);

            debug!(
                generation = generation.index,
                best_fitness = best_score,
                "Generation evaluated"
            );

            if has_converged(&fitness_history, options.convergence_threshold()) {
                converged = true;
                info!(generation = generation.index, "Evolution converged");
                break;
            }
            if generation.index + 1 >= options.max_generations() {
                break;
            }

            let next = self.next_population(
                &generation,
                parent_selection.as_ref(),
                &survivor_selection,
                ctx,
                options,
                rng,
            )?;
            generation = self.evaluate(generation.index + 1, next, options)?;
        }

        let (best, best_score) = best.ok_or(OptimizerError::EmptyPopulation)?;
        let generations_run = fitness_history.len();

        info!(
            generations_run,
            converged,
            best_fitness = best_score,
            "Evolution finished"
        );

        Ok(EvolutionResult {
            best,
            best_score,
            fitness_history,
            generations_run,
            converged,
        })
    }

    fn evaluate(
        &self,
        index: usize,
        individuals: Vec<P>,
        options: &EvolutionOptions,
    ) -> Result<Generation<P>> {
        let score = |individual: &P| -> Result<f64> {
            let score = self.challenge.score(individual);
            if !score.is_finite() {
                return Err(OptimizerError::FitnessCalculation(format!(
                    "Non-finite fitness score encountered: {}",
                    score
                )));
            }
            Ok(score)
        };

        let fitness = if individuals.len() >= options.parallel_threshold() {
            individuals.par_iter().map(score).collect::<Result<Vec<_>>>()?
        } else {
            individuals.iter().map(score).collect::<Result<Vec<_>>>()?
        };

        Ok(Generation {
            index,
            individuals,
            fitness,
        })
    }

    fn next_population(
        &self,
        current: &Generation<P>,
        parent_selection: &dyn SelectionStrategy<P>,
        survivor_selection: &ElitistSelection,
        ctx: &P::Context,
        options: &EvolutionOptions,
        rng: &mut RandomNumberGenerator,
    ) -> Result<Vec<P>> {
        let size = current.individuals.len();
        let elite_count = options.elite_count().min(size.saturating_sub(1));

        let mut next = survivor_selection.select(
            &current.individuals,
            &current.fitness,
            elite_count,
            rng,
        )?;

        let parents = parent_selection.select(
            &current.individuals,
            &current.fitness,
            size - next.len(),
            rng,
        )?;

        let offspring = self
            .breeding
            .breed(&parents, ctx, options, rng)
            .map_err(|e| {
                OptimizerError::Breeding(format!(
                    "Failed to breed generation {}: {}",
                    current.index + 1,
                    e
                ))
            })?;

        next.extend(offspring);
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breeding::StandardBreeding;
    use crate::selection::test_support::Scalar;

    #[derive(Debug, Clone)]
    struct Closeness {
        target: f64,
    }

    impl Challenge<Scalar> for Closeness {
        fn score(&self, phenotype: &Scalar) -> f64 {
            1.0 / (1.0 + (phenotype.value - self.target).abs())
        }
    }

    #[derive(Debug, Clone)]
    struct Broken;

    impl Challenge<Scalar> for Broken {
        fn score(&self, _phenotype: &Scalar) -> f64 {
            f64::NAN
        }
    }

    fn options(max_generations: usize, threshold: f64) -> EvolutionOptions {
        EvolutionOptions::builder()
            .population_size(20)
            .max_generations(max_generations)
            .mutation_rate(0.3)
            .convergence_threshold(threshold)
            .seed(3)
            .build()
            .unwrap()
    }

    #[test]
    fn test_runs_to_generation_cap_without_convergence() {
        let launcher = EvolutionLauncher::new(StandardBreeding::new(), Closeness { target: 7.0 });
        let mut rng = RandomNumberGenerator::from_seed(3);

        let result = launcher
            .evolve(&(0.0, 10.0), &options(6, 0.0), &mut rng)
            .unwrap();

        assert_eq!(result.generations_run, 6);
        assert_eq!(result.fitness_history.len(), 6);
        assert!(!result.converged);
    }

    #[test]
    fn test_best_is_best_ever_and_history_monotone_with_elitism() {
        let launcher = EvolutionLauncher::new(StandardBreeding::new(), Closeness { target: 7.0 });
        let mut rng = RandomNumberGenerator::from_seed(11);

        let result = launcher
            .evolve(&(0.0, 10.0), &options(30, 0.0), &mut rng)
            .unwrap();

        let max = result
            .fitness_history
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(result.best_score, max);
        assert!(result
            .fitness_history
            .windows(2)
            .all(|pair| pair[1] >= pair[0]));
    }

    #[test]
    fn test_converges_on_flat_landscape() {
        #[derive(Debug, Clone)]
        struct Flat;
        impl Challenge<Scalar> for Flat {
            fn score(&self, _phenotype: &Scalar) -> f64 {
                0.5
            }
        }

        let launcher = EvolutionLauncher::new(StandardBreeding::new(), Flat);
        let mut rng = RandomNumberGenerator::from_seed(1);

        let result = launcher
            .evolve(&(0.0, 1.0), &options(100, 1e-9), &mut rng)
            .unwrap();

        assert!(result.converged);
        assert_eq!(result.generations_run, 10);
    }

    #[test]
    fn test_non_finite_score_is_an_error() {
        let launcher = EvolutionLauncher::new(StandardBreeding::new(), Broken);
        let mut rng = RandomNumberGenerator::from_seed(1);

        let result = launcher.evolve(&(0.0, 1.0), &options(5, 0.0), &mut rng);
        assert!(matches!(result, Err(OptimizerError::FitnessCalculation(_))));
    }

    #[test]
    fn test_empty_initial_population() {
        let launcher = EvolutionLauncher::new(StandardBreeding::new(), Closeness { target: 1.0 });
        let mut rng = RandomNumberGenerator::from_seed(1);

        let result = launcher.evolve_from(Vec::new(), &(0.0, 1.0), &options(5, 0.0), &mut rng);
        assert!(matches!(result, Err(OptimizerError::EmptyPopulation)));
    }

    #[test]
    fn test_initial_population_size_must_match() {
        let launcher = EvolutionLauncher::new(StandardBreeding::new(), Closeness { target: 1.0 });
        let mut rng = RandomNumberGenerator::from_seed(1);
        let initial = vec![Scalar { value: 0.5 }; 3];

        let result = launcher.evolve_from(initial, &(0.0, 1.0), &options(5, 0.0), &mut rng);
        assert!(matches!(result, Err(OptimizerError::Evolution(_))));
    }

    #[test]
    fn test_generation_best() {
        let generation = Generation {
            index: 0,
            individuals: vec![Scalar { value: 1.0 }, Scalar { value: 2.0 }],
            fitness: vec![0.2, 0.9],
        };
        assert_eq!(generation.best(), Some((1, 0.9)));
    }
}
