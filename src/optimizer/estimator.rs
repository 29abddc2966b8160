//! Cost, duration and quality estimates for task/resource pairs.
//!
//! A resource with an hourly rate is costed directly. A resource without one
//! has no cost history to rely on, so the duration model fills in when it is
//! confident enough; otherwise a flat share of the task baseline is used.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Resource, ResourceCategory, Task};
use crate::features::{FeatureBuilder, Label};
use crate::ml::RegressionModel;

pub const HOURS_PER_DAY: f64 = 8.0;
/// Share of the task baseline charged for a resource without a rate.
pub const HEURISTIC_BASELINE_SHARE: f64 = 0.6;
/// Quality assumed when a resource carries no proficiency or condition.
pub const DEFAULT_QUALITY: f64 = 0.7;
/// Quality multiplier for a resource outside the task's required category.
pub const INCOMPATIBLE_QUALITY_FACTOR: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateSource {
    HourlyRate,
    Model,
    Heuristic,
}

/// Estimate for a full-time (100 %) booking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairEstimate {
    pub daily_rate: f64,
    pub base_days: f64,
    pub quality: f64,
    pub source: EstimateSource,
}

impl PairEstimate {
    /// Working days at `percentage`: a part-time booking stretches the task
    /// by `sqrt(100 / percentage)`.
    pub fn effective_days(&self, percentage: f64) -> f64 {
        let pct = percentage.clamp(1.0, 100.0);
        self.base_days * (100.0 / pct).sqrt()
    }

    pub fn cost(&self, percentage: f64) -> f64 {
        let pct = percentage.clamp(1.0, 100.0);
        self.daily_rate * self.effective_days(pct) * pct / 100.0
    }

    /// Quality delivered at `percentage`; thin bookings lose focus.
    pub fn quality_at(&self, percentage: f64) -> f64 {
        self.quality * (0.5 + 0.5 * percentage.clamp(0.0, 100.0) / 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPrediction {
    pub duration_days: f64,
    pub cost: f64,
    pub quality: f64,
}

#[derive(Debug, Clone, Default)]
pub struct CostEstimator {
    duration_model: Option<Arc<RegressionModel>>,
    model_accuracy: f64,
    min_confidence: f64,
}

impl CostEstimator {
    /// An estimator that never consults a model.
    pub fn heuristic() -> Self {
        Self::default()
    }

    pub fn with_model(model: Arc<RegressionModel>, accuracy: f64, min_confidence: f64) -> Self {
        Self {
            duration_model: Some(model),
            model_accuracy: accuracy,
            min_confidence,
        }
    }

    pub fn model_accuracy(&self) -> f64 {
        self.model_accuracy
    }

    pub fn is_confident(&self) -> bool {
        self.duration_model
            .as_ref()
            .is_some_and(|model| model.is_fitted() && self.model_accuracy >= self.min_confidence)
    }

    /// Model outputs for the pair, when a confident model is available and its
    /// outputs are usable.
    pub fn predict(&self, task: &Task, resource: &Resource) -> Option<ModelPrediction> {
        if !self.is_confident() {
            return None;
        }
        let model = self.duration_model.as_ref()?;
        let builder = FeatureBuilder::with_feature_defaults(model.feature_defaults()?);
        let output = model.predict(&builder.assignment_features(task, resource))?;

        let prediction = ModelPrediction {
            duration_days: *output.get(Label::ActualDurationDays.index())?,
            cost: *output.get(Label::ActualCost.index())?,
            quality: *output.get(Label::QualityScore.index())?,
        };

        let usable = prediction.duration_days.is_finite()
            && prediction.duration_days > 0.0
            && prediction.cost.is_finite()
            && prediction.cost > 0.0;
        if !usable {
            debug!(task = %task.name, resource = %resource.name, "Discarded unusable model prediction");
            return None;
        }

        Some(prediction)
    }

    pub fn assess(&self, task: &Task, resource: &Resource) -> PairEstimate {
        let planned_days = task.planned_duration_days() as f64;
        let quality = base_quality(task, resource);

        if resource.hourly_cost > 0.0 {
            let efficiency = resource
                .metadata_f64("efficiency")
                .filter(|e| *e > 0.0)
                .unwrap_or(1.0);
            return PairEstimate {
                daily_rate: resource.hourly_cost * HOURS_PER_DAY,
                base_days: planned_days / efficiency,
                quality,
                source: EstimateSource::HourlyRate,
            };
        }

        if let Some(prediction) = self.predict(task, resource) {
            let base_days = prediction.duration_days.max(1.0);
            return PairEstimate {
                daily_rate: prediction.cost / base_days,
                base_days,
                quality: (0.5 * quality + 0.5 * prediction.quality).clamp(0.0, 1.0),
                source: EstimateSource::Model,
            };
        }

        PairEstimate {
            daily_rate: task.baseline_cost().max(0.0) * HEURISTIC_BASELINE_SHARE / planned_days,
            base_days: planned_days,
            quality,
            source: EstimateSource::Heuristic,
        }
    }
}

/// Proficiency (workers) or condition (equipment), scaled down when the
/// resource is outside the task's required category.
fn base_quality(task: &Task, resource: &Resource) -> f64 {
    let attribute = match resource.category() {
        ResourceCategory::Worker => resource.metadata_f64("proficiency"),
        ResourceCategory::Equipment => resource.metadata_f64("condition"),
        ResourceCategory::Material | ResourceCategory::Unknown => None,
    };
    let quality = attribute.unwrap_or(DEFAULT_QUALITY).clamp(0.0, 1.0);

    if task.accepts(resource.category()) {
        quality
    } else {
        quality * INCOMPATIBLE_QUALITY_FACTOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResourceType;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn task() -> Task {
        Task::new(
            Uuid::new_v4(),
            "Pour slab",
            100.0,
            150.0,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
        )
        .with_required_category(ResourceCategory::Worker)
    }

    #[test]
    fn test_hourly_rate_estimate() {
        let worker = Resource::new("mason", ResourceType::Human, 50.0);
        let estimate = CostEstimator::heuristic().assess(&task(), &worker);

        assert_eq!(estimate.source, EstimateSource::HourlyRate);
        assert_eq!(estimate.daily_rate, 400.0);
        assert_eq!(estimate.base_days, 5.0);
        assert_eq!(estimate.cost(100.0), 2000.0);
        assert_eq!(estimate.quality, DEFAULT_QUALITY);
    }

    #[test]
    fn test_part_time_is_cheaper_but_slower() {
        let worker = Resource::new("mason", ResourceType::Human, 50.0);
        let estimate = CostEstimator::heuristic().assess(&task(), &worker);

        assert!((estimate.effective_days(25.0) - 10.0).abs() < 1e-9);
        assert!((estimate.cost(25.0) - 1000.0).abs() < 1e-9);
        assert!(estimate.quality_at(25.0) < estimate.quality_at(100.0));
    }

    #[test]
    fn test_efficiency_shortens_duration() {
        let worker = Resource::new("mason", ResourceType::Human, 50.0)
            .with_metadata("efficiency", serde_json::json!(1.25));
        let estimate = CostEstimator::heuristic().assess(&task(), &worker);
        assert_eq!(estimate.base_days, 4.0);
    }

    #[test]
    fn test_heuristic_without_rate_or_model() {
        let material = Resource::new("concrete", ResourceType::Material, 0.0);
        let estimate = CostEstimator::heuristic().assess(&task(), &material);

        assert_eq!(estimate.source, EstimateSource::Heuristic);
        assert!((estimate.cost(100.0) - 9000.0).abs() < 1e-9);
        assert!((estimate.quality - DEFAULT_QUALITY * INCOMPATIBLE_QUALITY_FACTOR).abs() < 1e-12);
    }

    #[test]
    fn test_not_confident_without_model() {
        let estimator = CostEstimator::heuristic();
        assert!(!estimator.is_confident());
        let material = Resource::new("sand", ResourceType::Material, 0.0);
        assert!(estimator.predict(&task(), &material).is_none());
    }
}
