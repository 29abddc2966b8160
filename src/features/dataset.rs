//! Training data points, train/validation/test splits and normalization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::schema::{allocation_targets, Feature, FEATURE_COUNT, LABEL_COUNT};
use crate::error::{OptimizerError, Result};

/// One historical outcome as fixed-order vectors. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingDataPoint {
    features: Vec<f64>,
    labels: Vec<f64>,
    timestamp: DateTime<Utc>,
}

impl TrainingDataPoint {
    /// # Errors
    ///
    /// Returns `OptimizerError::Validation` if either vector has the wrong
    /// length or holds a non-finite value.
    pub fn new(features: Vec<f64>, labels: Vec<f64>, timestamp: DateTime<Utc>) -> Result<Self> {
        if features.len() != FEATURE_COUNT || labels.len() != LABEL_COUNT {
            return Err(OptimizerError::Validation(format!(
                "Expected {} features and {} labels, got {} and {}",
                FEATURE_COUNT,
                LABEL_COUNT,
                features.len(),
                labels.len()
            )));
        }
        if features.iter().chain(labels.iter()).any(|v| !v.is_finite()) {
            return Err(OptimizerError::Validation(
                "Training data must be finite".to_string(),
            ));
        }

        Ok(Self {
            features,
            labels,
            timestamp,
        })
    }

    pub fn features(&self) -> &[f64] {
        &self.features
    }

    pub fn labels(&self) -> &[f64] {
        &self.labels
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn allocation_targets(&self) -> Vec<f64> {
        allocation_targets(&self.features, &self.labels)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatio {
    pub train: f64,
    pub validation: f64,
    pub test: f64,
}

impl SplitRatio {
    /// # Errors
    ///
    /// Returns `OptimizerError::Configuration` if a share is negative, the
    /// training share is zero, or the shares don't sum to one.
    pub fn new(train: f64, validation: f64, test: f64) -> Result<Self> {
        let shares = [train, validation, test];
        if shares.iter().any(|s| !s.is_finite() || *s < 0.0) || train <= 0.0 {
            return Err(OptimizerError::Configuration(format!(
                "Invalid split ratio {}/{}/{}",
                train, validation, test
            )));
        }
        if (shares.iter().sum::<f64>() - 1.0).abs() > 1e-6 {
            return Err(OptimizerError::Configuration(
                "Split ratio shares must sum to 1".to_string(),
            ));
        }

        Ok(Self {
            train,
            validation,
            test,
        })
    }
}

impl Default for SplitRatio {
    fn default() -> Self {
        Self {
            train: 0.7,
            validation: 0.15,
            test: 0.15,
        }
    }
}

/// Column statistics used for z-score normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureStats {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl FeatureStats {
    pub fn from_column(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                mean: 0.0,
                std: 1.0,
                min: 0.0,
                max: 0.0,
            };
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();

        Self {
            mean,
            std,
            min: values.iter().cloned().fold(f64::INFINITY, f64::min),
            max: values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        }
    }

    /// Constant columns keep a unit scale so they normalize to zero.
    fn scale(&self) -> f64 {
        if self.std > 1e-9 {
            self.std
        } else {
            1.0
        }
    }

    pub fn normalize(&self, value: f64) -> f64 {
        (value - self.mean) / self.scale()
    }

    pub fn denormalize(&self, value: f64) -> f64 {
        value * self.scale() + self.mean
    }
}

/// Per-column statistics computed once per dataset and stored with the
/// trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationParams {
    pub features: Vec<FeatureStats>,
    pub labels: Vec<FeatureStats>,
    pub allocation_targets: Vec<FeatureStats>,
}

fn column_stats(rows: &[Vec<f64>], width: usize) -> Vec<FeatureStats> {
    (0..width)
        .map(|col| {
            let column: Vec<f64> = rows.iter().filter_map(|row| row.get(col).copied()).collect();
            FeatureStats::from_column(&column)
        })
        .collect()
}

fn apply(stats: &[FeatureStats], values: &[f64], f: impl Fn(&FeatureStats, f64) -> f64) -> Vec<f64> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| stats.get(i).map_or(v, |s| f(s, v)))
        .collect()
}

impl NormalizationParams {
    pub fn compute(points: &[TrainingDataPoint]) -> Self {
        let features: Vec<Vec<f64>> = points.iter().map(|p| p.features.clone()).collect();
        let labels: Vec<Vec<f64>> = points.iter().map(|p| p.labels.clone()).collect();
        let targets: Vec<Vec<f64>> = points.iter().map(|p| p.allocation_targets()).collect();

        Self {
            features: column_stats(&features, FEATURE_COUNT),
            labels: column_stats(&labels, LABEL_COUNT),
            allocation_targets: column_stats(&targets, super::schema::ALLOCATION_TARGET_COUNT),
        }
    }

    pub fn normalize_features(&self, features: &[f64]) -> Vec<f64> {
        apply(&self.features, features, FeatureStats::normalize)
    }

    pub fn normalize_targets(stats: &[FeatureStats], targets: &[f64]) -> Vec<f64> {
        apply(stats, targets, FeatureStats::normalize)
    }

    pub fn denormalize_targets(stats: &[FeatureStats], targets: &[f64]) -> Vec<f64> {
        apply(stats, targets, FeatureStats::denormalize)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingDataset {
    pub id: String,
    data_points: Vec<TrainingDataPoint>,
    split: SplitRatio,
    normalization: NormalizationParams,
    feature_defaults: Vec<f64>,
}

impl TrainingDataset {
    /// Orders points oldest first and computes normalization parameters.
    ///
    /// Feature defaults are the column means, or the schema fallbacks for an
    /// empty dataset.
    pub fn new(id: impl Into<String>, mut data_points: Vec<TrainingDataPoint>, split: SplitRatio) -> Self {
        data_points.sort_by_key(|p| p.timestamp);
        let normalization = NormalizationParams::compute(&data_points);

        let feature_defaults = if data_points.is_empty() {
            Feature::ALL.iter().map(|f| f.fallback()).collect()
        } else {
            normalization.features.iter().map(|s| s.mean).collect()
        };

        Self {
            id: id.into(),
            data_points,
            split,
            normalization,
            feature_defaults,
        }
    }

    pub fn data_points(&self) -> &[TrainingDataPoint] {
        &self.data_points
    }

    pub fn len(&self) -> usize {
        self.data_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data_points.is_empty()
    }

    pub fn split(&self) -> SplitRatio {
        self.split
    }

    pub fn normalization(&self) -> &NormalizationParams {
        &self.normalization
    }

    pub fn feature_defaults(&self) -> &[f64] {
        &self.feature_defaults
    }

    /// Chronological train/validation/test partitions. A non-empty dataset
    /// always has at least one training point.
    pub fn partitions(&self) -> (&[TrainingDataPoint], &[TrainingDataPoint], &[TrainingDataPoint]) {
        let n = self.data_points.len();
        if n == 0 {
            return (&[], &[], &[]);
        }

        let train = ((n as f64 * self.split.train).round() as usize).clamp(1, n);
        let validation = ((n as f64 * self.split.validation).round() as usize).min(n - train);

        let (train_points, rest) = self.data_points.split_at(train);
        let (validation_points, test_points) = rest.split_at(validation);
        (train_points, validation_points, test_points)
    }
}
