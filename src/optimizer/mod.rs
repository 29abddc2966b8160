//! # Optimizer Module
//!
//! The allocation problem as seen by the genetic algorithm:
//!
//! - [`estimator`]: per task/resource cost, duration and quality estimates
//! - [`genome`]: the plan phenotype and the context it evolves in
//! - [`fitness`]: the cost, time, quality and composite objectives

pub mod estimator;
pub mod fitness;
pub mod genome;

pub use estimator::{CostEstimator, EstimateSource, ModelPrediction, PairEstimate};
pub use fitness::{AllocationFitness, FitnessScores, COST_WEIGHT, QUALITY_WEIGHT, TIME_WEIGHT};
pub use genome::{Genome, GenomeContext, MAX_PERCENTAGE, MIN_PERCENTAGE, PERCENTAGE_STEP};
