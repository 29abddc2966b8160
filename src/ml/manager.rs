//! # ModelManager
//!
//! Builds the two regression models and trains them on a
//! [`TrainingDataset`]. A trained model carries the dataset's normalization
//! parameters and feature defaults; inference reuses them verbatim.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::network::{Activation, LayerSpec, Network};
use crate::error::Result;
use crate::features::{
    FeatureStats, NormalizationParams, TrainingDataPoint, TrainingDataset, ALLOCATION_TARGET_COUNT,
    FEATURE_COUNT, LABEL_COUNT,
};
use crate::rng::RandomNumberGenerator;

pub const RESOURCE_ALLOCATION_MODEL_ID: &str = "resource_allocation";
pub const DURATION_PREDICTION_MODEL_ID: &str = "duration_prediction";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Scores how efficiently a resource serves a task.
    ResourceAllocation,
    /// Predicts the six outcome labels of a task.
    DurationPrediction,
}

impl ModelKind {
    pub fn model_id(self) -> &'static str {
        match self {
            Self::ResourceAllocation => RESOURCE_ALLOCATION_MODEL_ID,
            Self::DurationPrediction => DURATION_PREDICTION_MODEL_ID,
        }
    }

    pub fn output_size(self) -> usize {
        match self {
            Self::ResourceAllocation => ALLOCATION_TARGET_COUNT,
            Self::DurationPrediction => LABEL_COUNT,
        }
    }

    fn targets(self, point: &TrainingDataPoint) -> Vec<f64> {
        match self {
            Self::ResourceAllocation => point.allocation_targets(),
            Self::DurationPrediction => point.labels().to_vec(),
        }
    }

    fn target_stats(self, normalization: &NormalizationParams) -> &[FeatureStats] {
        match self {
            Self::ResourceAllocation => &normalization.allocation_targets,
            Self::DurationPrediction => &normalization.labels,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.model_id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    Trained,
    InsufficientData,
    /// The training loss became NaN or infinite.
    Diverged,
}

/// Outcome of one training call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_id: String,
    pub version: u32,
    pub kind: ModelKind,
    /// `1 - MAE / mean|y|` averaged over outputs, in `[0, 1]`.
    pub accuracy: f64,
    /// Final mean squared error on the normalized training split.
    pub loss: f64,
    pub status: ModelStatus,
    pub sample_count: usize,
    pub trained_at: DateTime<Utc>,
    pub dataset_id: String,
}

impl ModelMetadata {
    pub fn is_trained(&self) -> bool {
        self.status == ModelStatus::Trained
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingOptions {
    pub epochs: usize,
    pub learning_rate: f64,
    pub batch_size: usize,
    pub dropout: f64,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            epochs: 150,
            learning_rate: 0.01,
            batch_size: 16,
            dropout: 0.2,
            seed: None,
        }
    }
}

/// Normalization state captured at training time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FittedState {
    normalization: NormalizationParams,
    feature_defaults: Vec<f64>,
}

/// A network together with what it needs to turn raw features into raw
/// predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionModel {
    kind: ModelKind,
    network: Network,
    fitted: Option<FittedState>,
}

impl RegressionModel {
    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    pub fn feature_defaults(&self) -> Option<&[f64]> {
        self.fitted.as_ref().map(|f| f.feature_defaults.as_slice())
    }

    /// Denormalized outputs for raw `features`, or `None` before training or
    /// for a wrongly sized input.
    pub fn predict(&self, features: &[f64]) -> Option<Vec<f64>> {
        let fitted = self.fitted.as_ref()?;
        if features.len() != self.network.input_size() {
            return None;
        }

        let normalized = fitted.normalization.normalize_features(features);
        let output = self.network.predict(&normalized);
        let stats = self.kind.target_stats(&fitted.normalization);
        Some(NormalizationParams::denormalize_targets(stats, &output))
    }
}

/// Untrained 14 → 32 (ReLU) → dropout → 16 (ReLU) → 10 network.
///
/// # Errors
///
/// Returns an error only for an invalid dropout rate.
pub fn build_resource_allocation_model(
    options: &TrainingOptions,
    rng: &mut RandomNumberGenerator,
) -> Result<RegressionModel> {
    let network = Network::new(
        FEATURE_COUNT,
        &[
            LayerSpec::new(32, Activation::Relu).with_dropout(options.dropout),
            LayerSpec::new(16, Activation::Relu),
            LayerSpec::new(ALLOCATION_TARGET_COUNT, Activation::Linear),
        ],
        rng,
    )?;

    Ok(RegressionModel {
        kind: ModelKind::ResourceAllocation,
        network,
        fitted: None,
    })
}

/// Untrained 14 → 24 (tanh) → dropout → 12 (ReLU) → 6 network.
///
/// # Errors
///
/// Returns an error only for an invalid dropout rate.
pub fn build_duration_prediction_model(
    options: &TrainingOptions,
    rng: &mut RandomNumberGenerator,
) -> Result<RegressionModel> {
    let network = Network::new(
        FEATURE_COUNT,
        &[
            LayerSpec::new(24, Activation::Tanh).with_dropout(options.dropout),
            LayerSpec::new(12, Activation::Relu),
            LayerSpec::new(LABEL_COUNT, Activation::Linear),
        ],
        rng,
    )?;

    Ok(RegressionModel {
        kind: ModelKind::DurationPrediction,
        network,
        fitted: None,
    })
}

/// Builds an untrained model of `kind`.
///
/// # Errors
///
/// Returns an error only for an invalid dropout rate.
pub fn build_model(
    kind: ModelKind,
    options: &TrainingOptions,
    rng: &mut RandomNumberGenerator,
) -> Result<RegressionModel> {
    match kind {
        ModelKind::ResourceAllocation => build_resource_allocation_model(options, rng),
        ModelKind::DurationPrediction => build_duration_prediction_model(options, rng),
    }
}

/// Mean of per-output `1 - MAE / mean|y|`, clamped to `[0, 1]`.
fn accuracy(predictions: &[Vec<f64>], targets: &[Vec<f64>]) -> f64 {
    let outputs = targets.first().map_or(0, Vec::len);
    if outputs == 0 || predictions.len() != targets.len() {
        return 0.0;
    }

    let n = targets.len() as f64;
    let per_output: f64 = (0..outputs)
        .map(|j| {
            let mae = predictions
                .iter()
                .zip(targets)
                .map(|(p, t)| (p[j] - t[j]).abs())
                .sum::<f64>()
                / n;
            let scale = targets.iter().map(|t| t[j].abs()).sum::<f64>() / n;

            if scale < 1e-9 {
                if mae < 1e-9 {
                    1.0
                } else {
                    0.0
                }
            } else {
                (1.0 - mae / scale).clamp(0.0, 1.0)
            }
        })
        .sum();

    per_output / outputs as f64
}

#[derive(Debug, Clone, Default)]
pub struct ModelManager {
    options: TrainingOptions,
}

impl ModelManager {
    pub fn new(options: TrainingOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TrainingOptions {
        &self.options
    }

    /// Trains `model` on `dataset`.
    ///
    /// Never fails: an empty dataset yields `InsufficientData` metadata with
    /// zero accuracy and leaves the model unfitted. Accuracy is measured on the
    /// validation split, or on the training split when there is none.
    pub fn train_model(
        &self,
        model_id: &str,
        model: &mut RegressionModel,
        dataset: &TrainingDataset,
        rng: &mut RandomNumberGenerator,
    ) -> ModelMetadata {
        let mut metadata = ModelMetadata {
            model_id: model_id.to_string(),
            version: 1,
            kind: model.kind,
            accuracy: 0.0,
            loss: 0.0,
            status: ModelStatus::InsufficientData,
            sample_count: dataset.len(),
            trained_at: Utc::now(),
            dataset_id: dataset.id.clone(),
        };

        if dataset.is_empty() {
            warn!(model_id, dataset_id = %dataset.id, "No training data; model left untrained");
            return metadata;
        }

        let kind = model.kind;
        let normalization = dataset.normalization();
        let stats = kind.target_stats(normalization);
        let rows = |points: &[TrainingDataPoint]| -> Vec<(Vec<f64>, Vec<f64>)> {
            points
                .iter()
                .map(|p| {
                    (
                        normalization.normalize_features(p.features()),
                        NormalizationParams::normalize_targets(stats, &kind.targets(p)),
                    )
                })
                .collect()
        };

        let (train, validation, _test) = dataset.partitions();
        let train_rows = rows(train);
        let loss = model.network.fit(
            &train_rows,
            self.options.epochs,
            self.options.batch_size,
            self.options.learning_rate,
            rng,
        );
        if !loss.is_finite() {
            warn!(model_id, dataset_id = %dataset.id, "Training loss diverged; model left untrained");
            metadata.status = ModelStatus::Diverged;
            return metadata;
        }

        model.fitted = Some(FittedState {
            normalization: normalization.clone(),
            feature_defaults: dataset.feature_defaults().to_vec(),
        });

        let evaluation = if validation.is_empty() { train } else { validation };
        let predictions: Vec<Vec<f64>> = evaluation
            .iter()
            .filter_map(|p| model.predict(p.features()))
            .collect();
        let targets: Vec<Vec<f64>> = evaluation.iter().map(|p| kind.targets(p)).collect();

        metadata.accuracy = accuracy(&predictions, &targets);
        metadata.loss = loss;
        metadata.status = ModelStatus::Trained;

        info!(
            model_id,
            accuracy = metadata.accuracy,
            loss,
            samples = dataset.len(),
            "Model trained"
        );

        metadata
    }
}
