//! # EvolutionOptions
//!
//! Configuration of a single GA run: population size, generation cap,
//! operator rates, the objective, the parent selection method and the
//! convergence threshold.
//!
//! Options are only obtainable through [`EvolutionOptionsBuilder::build`],
//! which validates every field, so a launcher never sees an invalid
//! configuration.
//!
//! ## Example
//!
//! ```rust
//! use resource_optimizer::evolution::{EvolutionOptions, FitnessFunction, SelectionMethod};
//!
//! let options = EvolutionOptions::builder()
//!     .population_size(40)
//!     .max_generations(150)
//!     .mutation_rate(0.05)
//!     .fitness_function(FitnessFunction::Cost)
//!     .selection_method(SelectionMethod::Rank)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(options.elite_count(), 4);
//!
//! let invalid = EvolutionOptions::builder().mutation_rate(1.5).build();
//! assert!(invalid.is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{OptimizerError, Result};

/// The objective a run optimizes. Every variant produces higher-is-better
/// scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessFunction {
    Cost,
    Time,
    Quality,
    Composite,
}

impl fmt::Display for FitnessFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cost => "cost",
            Self::Time => "time",
            Self::Quality => "quality",
            Self::Composite => "composite",
        };
        f.write_str(name)
    }
}

impl FromStr for FitnessFunction {
    type Err = OptimizerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cost" => Ok(Self::Cost),
            "time" => Ok(Self::Time),
            "quality" => Ok(Self::Quality),
            "composite" => Ok(Self::Composite),
            other => Err(OptimizerError::Configuration(format!(
                "Unknown fitness function '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMethod {
    Tournament,
    Roulette,
    Rank,
}

impl FromStr for SelectionMethod {
    type Err = OptimizerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "tournament" => Ok(Self::Tournament),
            "roulette" => Ok(Self::Roulette),
            "rank" => Ok(Self::Rank),
            other => Err(OptimizerError::Configuration(format!(
                "Unknown selection method '{}'",
                other
            ))),
        }
    }
}

/// Fitness caching mode used while scoring populations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheType {
    #[default]
    None,
    /// One mutex-protected cache shared by all threads.
    Global,
    /// One cache per rayon worker, no locking.
    ThreadLocal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionOptions {
    population_size: usize,
    max_generations: usize,
    mutation_rate: f64,
    crossover_rate: f64,
    elitism_rate: f64,
    fitness_function: FitnessFunction,
    selection_method: SelectionMethod,
    tournament_size: usize,
    convergence_threshold: f64,
    /// Minimum population size for rayon-parallel scoring and breeding.
    parallel_threshold: usize,
    cache_type: CacheType,
    seed: Option<u64>,
}

impl EvolutionOptions {
    pub fn builder() -> EvolutionOptionsBuilder {
        EvolutionOptionsBuilder::default()
    }

    /// Returns a builder pre-filled with these options, for per-request
    /// overrides.
    pub fn to_builder(&self) -> EvolutionOptionsBuilder {
        EvolutionOptionsBuilder {
            population_size: Some(self.population_size),
            max_generations: Some(self.max_generations),
            mutation_rate: Some(self.mutation_rate),
            crossover_rate: Some(self.crossover_rate),
            elitism_rate: Some(self.elitism_rate),
            fitness_function: Some(self.fitness_function),
            selection_method: Some(self.selection_method),
            tournament_size: Some(self.tournament_size),
            convergence_threshold: Some(self.convergence_threshold),
            parallel_threshold: Some(self.parallel_threshold),
            cache_type: Some(self.cache_type),
            seed: self.seed,
        }
    }

    pub fn population_size(&self) -> usize {
        self.population_size
    }

    pub fn max_generations(&self) -> usize {
        self.max_generations
    }

    pub fn mutation_rate(&self) -> f64 {
        self.mutation_rate
    }

    pub fn crossover_rate(&self) -> f64 {
        self.crossover_rate
    }

    pub fn elitism_rate(&self) -> f64 {
        self.elitism_rate
    }

    pub fn fitness_function(&self) -> FitnessFunction {
        self.fitness_function
    }

    pub fn selection_method(&self) -> SelectionMethod {
        self.selection_method
    }

    pub fn tournament_size(&self) -> usize {
        self.tournament_size
    }

    pub fn convergence_threshold(&self) -> f64 {
        self.convergence_threshold
    }

    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }

    pub fn cache_type(&self) -> CacheType {
        self.cache_type
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Number of genomes carried unchanged into the next generation.
    ///
    /// Always leaves room for at least one offspring.
    pub fn elite_count(&self) -> usize {
        let elites = (self.elitism_rate * self.population_size as f64).round() as usize;
        elites.min(self.population_size.saturating_sub(1))
    }
}

impl Default for EvolutionOptions {
    fn default() -> Self {
        Self {
            population_size: 50,
            max_generations: 100,
            mutation_rate: 0.1,
            crossover_rate: 0.8,
            elitism_rate: 0.1,
            fitness_function: FitnessFunction::Composite,
            selection_method: SelectionMethod::Tournament,
            tournament_size: 3,
            convergence_threshold: 1e-6,
            parallel_threshold: 64,
            cache_type: CacheType::None,
            seed: None,
        }
    }
}

/// Builder for `EvolutionOptions`. Unset fields take the defaults.
#[derive(Debug, Clone, Default)]
pub struct EvolutionOptionsBuilder {
    population_size: Option<usize>,
    max_generations: Option<usize>,
    mutation_rate: Option<f64>,
    crossover_rate: Option<f64>,
    elitism_rate: Option<f64>,
    fitness_function: Option<FitnessFunction>,
    selection_method: Option<SelectionMethod>,
    tournament_size: Option<usize>,
    convergence_threshold: Option<f64>,
    parallel_threshold: Option<usize>,
    cache_type: Option<CacheType>,
    seed: Option<u64>,
}

impl EvolutionOptionsBuilder {
    pub fn population_size(mut self, value: usize) -> Self {
        self.population_size = Some(value);
        self
    }

    pub fn max_generations(mut self, value: usize) -> Self {
        self.max_generations = Some(value);
        self
    }

    pub fn mutation_rate(mut self, value: f64) -> Self {
        self.mutation_rate = Some(value);
        self
    }

    pub fn crossover_rate(mut self, value: f64) -> Self {
        self.crossover_rate = Some(value);
        self
    }

    pub fn elitism_rate(mut self, value: f64) -> Self {
        self.elitism_rate = Some(value);
        self
    }

    pub fn fitness_function(mut self, value: FitnessFunction) -> Self {
        self.fitness_function = Some(value);
        self
    }

    pub fn selection_method(mut self, value: SelectionMethod) -> Self {
        self.selection_method = Some(value);
        self
    }

    pub fn tournament_size(mut self, value: usize) -> Self {
        self.tournament_size = Some(value);
        self
    }

    pub fn convergence_threshold(mut self, value: f64) -> Self {
        self.convergence_threshold = Some(value);
        self
    }

    pub fn parallel_threshold(mut self, value: usize) -> Self {
        self.parallel_threshold = Some(value);
        self
    }

    pub fn cache_type(mut self, value: CacheType) -> Self {
        self.cache_type = Some(value);
        self
    }

    pub fn seed(mut self, value: u64) -> Self {
        self.seed = Some(value);
        self
    }

    /// Validates and builds the options.
    ///
    /// # Errors
    ///
    /// Returns `OptimizerError::Configuration` when a rate is outside `[0, 1]`,
    /// the population has fewer than two members, the generation cap or the
    /// tournament size is zero, or the convergence threshold is negative or
    /// not finite.
    pub fn build(self) -> Result<EvolutionOptions> {
        let defaults = EvolutionOptions::default();
        let options = EvolutionOptions {
            population_size: self.population_size.unwrap_or(defaults.population_size),
            max_generations: self.max_generations.unwrap_or(defaults.max_generations),
            mutation_rate: self.mutation_rate.unwrap_or(defaults.mutation_rate),
            crossover_rate: self.crossover_rate.unwrap_or(defaults.crossover_rate),
            elitism_rate: self.elitism_rate.unwrap_or(defaults.elitism_rate),
            fitness_function: self.fitness_function.unwrap_or(defaults.fitness_function),
            selection_method: self.selection_method.unwrap_or(defaults.selection_method),
            tournament_size: self.tournament_size.unwrap_or(defaults.tournament_size),
            convergence_threshold: self
                .convergence_threshold
                .unwrap_or(defaults.convergence_threshold),
            parallel_threshold: self
                .parallel_threshold
                .unwrap_or(defaults.parallel_threshold),
            cache_type: self.cache_type.unwrap_or(defaults.cache_type),
            seed: self.seed,
        };

        if options.population_size < 2 {
            return Err(OptimizerError::Configuration(
                "Population size must be at least 2".to_string(),
            ));
        }
        if options.max_generations == 0 {
            return Err(OptimizerError::Configuration(
                "Maximum generations cannot be zero".to_string(),
            ));
        }
        for (name, rate) in [
            ("Mutation rate", options.mutation_rate),
            ("Crossover rate", options.crossover_rate),
            ("Elitism rate", options.elitism_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(OptimizerError::Configuration(format!(
                    "{} must be in [0, 1], got {}",
                    name, rate
                )));
            }
        }
        if options.tournament_size == 0 {
            return Err(OptimizerError::Configuration(
                "Tournament size must be at least 1".to_string(),
            ));
        }
        if !options.convergence_threshold.is_finite() || options.convergence_threshold < 0.0 {
            return Err(OptimizerError::Configuration(format!(
                "Convergence threshold must be a non-negative number, got {}",
                options.convergence_threshold
            )));
        }

        Ok(options)
    }
}
