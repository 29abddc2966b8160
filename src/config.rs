//! Engine settings.
//!
//! Defaults can be overridden from `RESOPT_*` environment variables, with a
//! `.env` file filling in variables the process does not set. An
//! absent or unparsable variable keeps its default, and a combination the
//! options builder rejects falls back to the default GA options.

use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{map_optimization_goal, OptimizationRequest};
use crate::error::{OptimizerError, Result};
use crate::evolution::{CacheType, EvolutionOptions, SelectionMethod};
use crate::ml::TrainingOptions;

pub const ENV_POPULATION_SIZE: &str = "RESOPT_POPULATION_SIZE";
pub const ENV_MAX_GENERATIONS: &str = "RESOPT_MAX_GENERATIONS";
pub const ENV_MUTATION_RATE: &str = "RESOPT_MUTATION_RATE";
pub const ENV_CROSSOVER_RATE: &str = "RESOPT_CROSSOVER_RATE";
pub const ENV_ELITISM_RATE: &str = "RESOPT_ELITISM_RATE";
pub const ENV_SELECTION_METHOD: &str = "RESOPT_SELECTION_METHOD";
pub const ENV_PARALLEL_THRESHOLD: &str = "RESOPT_PARALLEL_THRESHOLD";
pub const ENV_CACHE_TYPE: &str = "RESOPT_CACHE_TYPE";
pub const ENV_EPOCHS: &str = "RESOPT_EPOCHS";
pub const ENV_LEARNING_RATE: &str = "RESOPT_LEARNING_RATE";
pub const ENV_TRAINING_DATASET: &str = "RESOPT_TRAINING_DATASET";
pub const ENV_MIN_MODEL_CONFIDENCE: &str = "RESOPT_MIN_MODEL_CONFIDENCE";
pub const ENV_TRAINING_SEED: &str = "RESOPT_TRAINING_SEED";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    pub evolution: EvolutionOptions,
    pub training: TrainingOptions,
    /// Dataset the models warm up on; `None` uses every stored point.
    #[serde(default)]
    pub training_dataset_id: Option<String>,
    /// Model accuracy required before predictions feed the fitness.
    pub min_model_confidence: f64,
    /// Weight of constraint penalties on the fitness.
    pub penalty_weight: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            evolution: EvolutionOptions::default(),
            training: TrainingOptions::default(),
            training_dataset_id: None,
            min_model_confidence: 0.5,
            penalty_weight: 1.0,
        }
    }
}

impl EngineSettings {
    /// Reads the process environment after loading a `.env` file from the
    /// working directory, if there is one.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), with the variables of the file at
    /// `path` as fallbacks. The process environment is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `OptimizerError::Configuration` if the file cannot be read or
    /// parsed.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let invalid = |e: dotenvy::Error| {
            OptimizerError::Configuration(format!("Failed to load {}: {}", path.display(), e))
        };
        let file: HashMap<String, String> = dotenvy::from_path_iter(path)
            .map_err(invalid)?
            .collect::<std::result::Result<_, _>>()
            .map_err(invalid)?;

        Ok(Self::from_lookup(|key| {
            env::var(key).ok().or_else(|| file.get(key).cloned())
        }))
    }

    /// Builds settings from `lookup`, which maps a variable name to its raw
    /// value.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parsed = |key: &str| -> Option<String> { lookup(key).map(|v| v.trim().to_string()) };

        let mut builder = defaults.evolution.to_builder();
        if let Some(value) = parse(&parsed, ENV_POPULATION_SIZE) {
            builder = builder.population_size(value);
        }
        if let Some(value) = parse(&parsed, ENV_MAX_GENERATIONS) {
            builder = builder.max_generations(value);
        }
        if let Some(value) = parse(&parsed, ENV_MUTATION_RATE) {
            builder = builder.mutation_rate(value);
        }
        if let Some(value) = parse(&parsed, ENV_CROSSOVER_RATE) {
            builder = builder.crossover_rate(value);
        }
        if let Some(value) = parse(&parsed, ENV_ELITISM_RATE) {
            builder = builder.elitism_rate(value);
        }
        if let Some(value) = parse::<SelectionMethod, _>(&parsed, ENV_SELECTION_METHOD) {
            builder = builder.selection_method(value);
        }
        if let Some(value) = parse(&parsed, ENV_PARALLEL_THRESHOLD) {
            builder = builder.parallel_threshold(value);
        }
        if let Some(value) = parsed(ENV_CACHE_TYPE).and_then(|raw| parse_cache_type(&raw)) {
            builder = builder.cache_type(value);
        }

        let evolution = builder.build().unwrap_or_else(|e| {
            warn!(error = %e, "Invalid GA settings in environment; using defaults");
            defaults.evolution.clone()
        });

        let training = TrainingOptions {
            epochs: parse(&parsed, ENV_EPOCHS)
                .filter(|&e: &usize| e > 0)
                .unwrap_or(defaults.training.epochs),
            learning_rate: parse(&parsed, ENV_LEARNING_RATE)
                .filter(|&lr: &f64| lr.is_finite() && lr > 0.0)
                .unwrap_or(defaults.training.learning_rate),
            seed: parse(&parsed, ENV_TRAINING_SEED).or(defaults.training.seed),
            ..defaults.training
        };

        Self {
            evolution,
            training,
            training_dataset_id: parsed(ENV_TRAINING_DATASET).filter(|id| !id.is_empty()),
            min_model_confidence: parse(&parsed, ENV_MIN_MODEL_CONFIDENCE)
                .filter(|c: &f64| (0.0..=1.0).contains(c))
                .unwrap_or(defaults.min_model_confidence),
            penalty_weight: defaults.penalty_weight,
        }
    }

    /// GA options for `request`: these settings, the request's goal as the
    /// objective, then the request's preferences on top.
    ///
    /// # Errors
    ///
    /// Returns `OptimizerError::Configuration` if the preferences produce an
    /// invalid combination.
    pub fn evolution_options_for(&self, request: &OptimizationRequest) -> Result<EvolutionOptions> {
        let preferences = &request.preferences;
        let mut builder = self
            .evolution
            .to_builder()
            .fitness_function(map_optimization_goal(&request.optimization_goal));

        if let Some(value) = preferences.population_size {
            builder = builder.population_size(value);
        }
        if let Some(value) = preferences.max_generations {
            builder = builder.max_generations(value);
        }
        if let Some(value) = preferences.mutation_rate {
            builder = builder.mutation_rate(value);
        }
        if let Some(value) = preferences.crossover_rate {
            builder = builder.crossover_rate(value);
        }
        if let Some(value) = preferences.elitism_rate {
            builder = builder.elitism_rate(value);
        }
        if let Some(value) = preferences.selection_method {
            builder = builder.selection_method(value);
        }
        if let Some(value) = preferences.tournament_size {
            builder = builder.tournament_size(value);
        }
        if let Some(value) = preferences.convergence_threshold {
            builder = builder.convergence_threshold(value);
        }
        if let Some(value) = preferences.seed {
            builder = builder.seed(value);
        }

        builder.build()
    }
}

fn parse<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparsable setting");
            None
        }
    }
}

fn parse_cache_type(raw: &str) -> Option<CacheType> {
    match raw.to_lowercase().as_str() {
        "none" => Some(CacheType::None),
        "global" => Some(CacheType::Global),
        "thread_local" | "threadlocal" => Some(CacheType::ThreadLocal),
        other => {
            warn!(value = other, "Ignoring unknown cache type");
            None
        }
    }
}
