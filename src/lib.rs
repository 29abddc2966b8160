pub mod analysis;
pub mod breeding;
pub mod caching;
pub mod config;
pub mod constraints;
pub mod domain;
pub mod error;
pub mod evolution;
pub mod features;
pub mod ml;
pub mod optimizer;
pub mod orchestrator;
pub mod phenotype;
pub mod rng;
pub mod selection;
pub mod store;

// Re-export commonly used types for convenience
pub use config::EngineSettings;
pub use domain::{
    Allocation, OptimizationGoal, OptimizationRequest, OptimizationResult, OptimizationStatus,
    Resource, Task,
};
pub use error::{OptimizerError, OptionExt, Result, ResultExt};
pub use orchestrator::ResourceOptimizer;
pub use store::{InMemoryStore, ProjectStore};
