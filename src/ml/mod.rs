//! # ML Module
//!
//! Regression models that predict task outcomes from historical data, and
//! the registry that owns the trained instances.
//!
//! - [`network`]: dense feed-forward networks with SGD training.
//! - [`manager`]: the two model architectures, training and accuracy.
//! - [`registry`]: per-id model state, lineage and training serialization.

pub mod manager;
pub mod network;
pub mod registry;

pub use manager::{
    build_duration_prediction_model, build_model, build_resource_allocation_model, ModelKind,
    ModelManager, ModelMetadata, ModelStatus, RegressionModel, TrainingOptions,
    DURATION_PREDICTION_MODEL_ID, RESOURCE_ALLOCATION_MODEL_ID,
};
pub use network::{Activation, LayerSpec, Network};
pub use registry::{ModelRegistry, ModelState};
