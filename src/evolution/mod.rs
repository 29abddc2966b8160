//! The generational loop and its configuration.

pub mod challenge;
pub mod convergence;
pub mod launcher;
pub mod options;

pub use challenge::Challenge;
pub use convergence::{has_converged, variance, CONVERGENCE_WINDOW};
pub use launcher::{EvolutionLauncher, EvolutionResult, Generation};
pub use options::{
    CacheType, EvolutionOptions, EvolutionOptionsBuilder, FitnessFunction, SelectionMethod,
};
