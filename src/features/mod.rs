//! # Features Module
//!
//! Converts historical project records into training data for the models and
//! task/resource pairs into inference inputs. Both paths share one fixed
//! layout ([`schema`]) and one policy for missing values: fill with the
//! dataset default, never with zero.

pub mod builder;
pub mod dataset;
pub mod schema;

pub use builder::{FeatureBuilder, HistoricalRecord, PriorProjectOutcome};
pub use dataset::{FeatureStats, NormalizationParams, SplitRatio, TrainingDataPoint, TrainingDataset};
pub use schema::{
    allocation_targets, Feature, Label, ALLOCATION_TARGET_COUNT, FEATURE_COUNT, LABEL_COUNT,
};
