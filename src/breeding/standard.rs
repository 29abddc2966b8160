//! # StandardBreeding
//!
//! Parents are paired in selection order. Each pair produces two children:
//! with probability `crossover_rate` each child takes segments from the other
//! parent, then every child is mutated gene by gene with `mutation_rate`.
use rayon::prelude::*;

use super::BreedStrategy;
use crate::{
    error::{OptimizerError, Result},
    evolution::options::EvolutionOptions,
    phenotype::Phenotype,
    rng::RandomNumberGenerator,
};

#[derive(Debug, Clone, Default)]
pub struct StandardBreeding;

impl StandardBreeding {
    pub fn new() -> Self {
        Self
    }

    fn breed_pair<P: Phenotype>(
        first: &P,
        second: &P,
        ctx: &P::Context,
        options: &EvolutionOptions,
        rng: &mut RandomNumberGenerator,
    ) -> [P; 2] {
        let mut child_a = first.clone();
        let mut child_b = second.clone();

        if rng.chance(options.crossover_rate()) {
            child_a.crossover(second, rng);
            child_b.crossover(first, rng);
        }

        child_a.mutate(ctx, options.mutation_rate(), rng);
        child_b.mutate(ctx, options.mutation_rate(), rng);

        [child_a, child_b]
    }
}

impl<P> BreedStrategy<P> for StandardBreeding
where
    P: Phenotype,
{
    /// Uses rayon when the mating pool reaches `parallel_threshold`. Each pair
    /// then gets a generator forked from `rng` up front, so seeded runs stay
    /// reproducible on the parallel path too.
    fn breed(
        &self,
        parents: &[P],
        ctx: &P::Context,
        options: &EvolutionOptions,
        rng: &mut RandomNumberGenerator,
    ) -> Result<Vec<P>> {
        if parents.is_empty() {
            return Err(OptimizerError::EmptyPopulation);
        }

        let pair_count = parents.len().div_ceil(2);
        let partner = |i: usize| &parents[(2 * i + 1) % parents.len()];

        let mut children: Vec<P> = if parents.len() >= options.parallel_threshold() {
            let pair_rngs: Vec<RandomNumberGenerator> =
                (0..pair_count).map(|_| rng.fork()).collect();

            pair_rngs
                .into_par_iter()
                .enumerate()
                .flat_map_iter(|(i, mut pair_rng)| {
                    Self::breed_pair(&parents[2 * i], partner(i), ctx, options, &mut pair_rng)
                })
                .collect()
        } else {
            (0..pair_count)
                .flat_map(|i| Self::breed_pair(&parents[2 * i], partner(i), ctx, options, rng))
                .collect()
        };

        children.truncate(parents.len());
        Ok(children)
    }
}
