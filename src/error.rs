//! # Error Types
//!
//! This module defines the error type shared by every layer of the optimizer:
//! option validation, genome construction, evolution, model training and the
//! external store boundary.
//!
//! The orchestrator never lets these errors escape to its caller; it folds them
//! into a failed [`OptimizationResult`](crate::domain::OptimizationResult). Lower
//! layers return them through the crate-wide [`Result`] alias.
//!
//! ## Examples
//!
//! Adding context to a foreign error:
//!
//! ```rust
//! use resource_optimizer::error::{Result, ResultExt};
//!
//! fn parse_limit(raw: &str) -> Result<f64> {
//!     raw.parse::<f64>().context("Failed to parse budget limit")
//! }
//!
//! assert!(parse_limit("12.5").is_ok());
//! assert!(parse_limit("twelve").is_err());
//! ```
//!
//! Converting an `Option` into a `Result`:
//!
//! ```rust
//! use resource_optimizer::error::{OptimizerError, OptionExt};
//!
//! fn best(scores: &[f64]) -> resource_optimizer::error::Result<f64> {
//!     scores
//!         .iter()
//!         .cloned()
//!         .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))))
//!         .ok_or_else_optimizer(|| OptimizerError::EmptyPopulation)
//! }
//!
//! assert_eq!(best(&[0.2, 0.7]).unwrap(), 0.7);
//! ```

use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Errors raised inside the optimization engine.
#[derive(Error, Debug)]
pub enum OptimizerError {
    /// Invalid GA or training configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A malformed optimization request.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The problem has no constructible genome (no tasks, no resources, or
    /// nothing available to assign).
    #[error("Infeasible problem: {0}")]
    InfeasibleProblem(String),

    #[error("Empty population error: Cannot operate on an empty population")]
    EmptyPopulation,

    #[error("Breeding error: {0}")]
    Breeding(String),

    #[error("Evolution error: {0}")]
    Evolution(String),

    /// A fitness evaluation produced NaN or infinity.
    #[error("Fitness calculation error: {0}")]
    FitnessCalculation(String),

    /// Training or inference failed in the model manager.
    #[error("Model error: {0}")]
    Model(String),

    /// The external project store failed. The message preserves the underlying
    /// cause for diagnostics.
    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl OptimizerError {
    /// Whether the error was caused by the caller's input rather than the
    /// engine or its collaborators.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::InfeasibleProblem(_) | Self::Configuration(_)
        )
    }
}

/// A specialized Result type for optimizer operations.
pub type Result<T> = std::result::Result<T, OptimizerError>;

/// Extension trait for Result to add context to errors.
pub trait ResultExt<T, E> {
    /// Converts the error to an [`OptimizerError::Other`] prefixed with `context`.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static;

    /// Converts the error to an [`OptimizerError::Store`] prefixed with `context`.
    fn store_context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| OptimizerError::Other(format!("{}: {}", context, e)))
    }

    fn store_context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| OptimizerError::Store(format!("{}: {}", context, e)))
    }
}

/// Extension trait for Option to convert to Result with a custom error.
pub trait OptionExt<T> {
    fn ok_or_else_optimizer<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> OptimizerError;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_else_optimizer<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> OptimizerError,
    {
        self.ok_or_else(err_fn)
    }
}
