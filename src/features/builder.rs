use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::dataset::TrainingDataPoint;
use super::schema::{season_of, Feature, Label, FEATURE_COUNT, LABEL_COUNT};
use crate::domain::{Resource, ResourceCategory, Task};

/// Outcome of an earlier project by the same team or on the same site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorProjectOutcome {
    pub delay_days: f64,
    pub cost_overrun_pct: f64,
}

/// A completed task as exported by the project service. Every field may be
/// missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoricalRecord {
    pub task_complexity: Option<f64>,
    pub planned_duration_days: Option<f64>,
    pub required_skills: Option<f64>,
    pub budget: Option<f64>,
    pub worker_experience_years: Option<f64>,
    pub worker_proficiency: Option<f64>,
    pub equipment_age_years: Option<f64>,
    pub equipment_condition: Option<f64>,
    pub started_on: Option<NaiveDate>,
    pub weather_severity: Option<f64>,
    pub site_accessibility: Option<f64>,
    pub prior_projects: Vec<PriorProjectOutcome>,

    pub actual_duration_days: Option<f64>,
    pub actual_cost: Option<f64>,
    pub quality_score: Option<f64>,
    pub success_rate: Option<f64>,
    pub delay_days: Option<f64>,
    pub cost_overrun_pct: Option<f64>,

    pub recorded_at: Option<DateTime<Utc>>,
}

impl HistoricalRecord {
    fn raw_features(&self) -> [Option<f64>; FEATURE_COUNT] {
        let priors = &self.prior_projects;
        let prior_mean = |f: fn(&PriorProjectOutcome) -> f64| {
            if priors.is_empty() {
                None
            } else {
                Some(priors.iter().map(f).sum::<f64>() / priors.len() as f64)
            }
        };

        [
            self.task_complexity,
            self.planned_duration_days,
            self.required_skills,
            self.budget,
            self.worker_experience_years,
            self.worker_proficiency,
            self.equipment_age_years,
            self.equipment_condition,
            self.started_on.map(season_of),
            self.weather_severity,
            self.site_accessibility,
            prior_mean(|p| p.delay_days),
            prior_mean(|p| p.cost_overrun_pct),
            Some(priors.len() as f64),
        ]
    }

    fn raw_labels(&self) -> [Option<f64>; LABEL_COUNT] {
        [
            self.actual_duration_days,
            self.actual_cost,
            self.quality_score,
            self.success_rate,
            self.delay_days,
            self.cost_overrun_pct,
        ]
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn column_means<const N: usize>(
    rows: &[[Option<f64>; N]],
    fallback: impl Fn(usize) -> f64,
) -> Vec<f64> {
    (0..N)
        .map(|col| {
            let present: Vec<f64> = rows.iter().filter_map(|row| finite(row[col])).collect();
            if present.is_empty() {
                fallback(col)
            } else {
                present.iter().sum::<f64>() / present.len() as f64
            }
        })
        .collect()
}

/// Turns raw records into fixed-order vectors, filling gaps with dataset
/// defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureBuilder {
    feature_defaults: Vec<f64>,
    label_defaults: Vec<f64>,
}

impl FeatureBuilder {
    /// A builder that fills gaps with the schema fallbacks.
    pub fn new() -> Self {
        Self {
            feature_defaults: Feature::ALL.iter().map(|f| f.fallback()).collect(),
            label_defaults: Label::ALL.iter().map(|l| l.fallback()).collect(),
        }
    }

    /// A builder that fills gaps with defaults stored alongside a trained
    /// model.
    pub fn with_feature_defaults(feature_defaults: &[f64]) -> Self {
        let mut builder = Self::new();
        if feature_defaults.len() == FEATURE_COUNT {
            builder.feature_defaults = feature_defaults.to_vec();
        }
        builder
    }

    /// Learns defaults from `records`: the mean of the present values, or the
    /// schema fallback when no record carries the field.
    pub fn fit(records: &[HistoricalRecord]) -> Self {
        let features: Vec<_> = records.iter().map(HistoricalRecord::raw_features).collect();
        let labels: Vec<_> = records.iter().map(HistoricalRecord::raw_labels).collect();

        Self {
            feature_defaults: column_means(&features, |i| Feature::ALL[i].fallback()),
            label_defaults: column_means(&labels, |i| Label::ALL[i].fallback()),
        }
    }

    pub fn feature_defaults(&self) -> &[f64] {
        &self.feature_defaults
    }

    /// Builds a training point, or `None` when the record has neither an
    /// actual duration nor an actual cost.
    pub fn build(&self, record: &HistoricalRecord) -> Option<TrainingDataPoint> {
        let raw_labels = record.raw_labels();
        let has_primary = Label::ALL
            .iter()
            .any(|l| l.is_primary() && finite(raw_labels[l.index()]).is_some());
        if !has_primary {
            return None;
        }

        let features = self.fill(&record.raw_features(), &self.feature_defaults);
        let labels = self.fill(&raw_labels, &self.label_defaults);

        TrainingDataPoint::new(features, labels, record.recorded_at.unwrap_or_else(Utc::now)).ok()
    }

    pub fn build_all(&self, records: &[HistoricalRecord]) -> Vec<TrainingDataPoint> {
        let points: Vec<_> = records.iter().filter_map(|r| self.build(r)).collect();
        if points.len() < records.len() {
            debug!(
                skipped = records.len() - points.len(),
                "Skipped records without outcome labels"
            );
        }
        points
    }

    /// Inference features for running `task` with `resource`.
    pub fn assignment_features(&self, task: &Task, resource: &Resource) -> Vec<f64> {
        let mut raw: [Option<f64>; FEATURE_COUNT] = [None; FEATURE_COUNT];
        let mut set = |feature: Feature, value: Option<f64>| raw[feature.index()] = value;

        set(Feature::TaskComplexity, task.complexity);
        set(
            Feature::PlannedDurationDays,
            Some(task.planned_duration_days() as f64),
        );
        set(Feature::Budget, Some(task.baseline_cost()));
        set(Feature::Season, Some(season_of(task.planned_start)));

        match resource.category() {
            ResourceCategory::Worker => {
                set(
                    Feature::WorkerExperienceYears,
                    resource.metadata_f64("experience_years"),
                );
                set(Feature::WorkerProficiency, resource.metadata_f64("proficiency"));
            }
            ResourceCategory::Equipment => {
                set(Feature::EquipmentAgeYears, resource.metadata_f64("age_years"));
                set(Feature::EquipmentCondition, resource.metadata_f64("condition"));
            }
            ResourceCategory::Material | ResourceCategory::Unknown => {}
        }

        self.fill(&raw, &self.feature_defaults)
    }

    fn fill(&self, raw: &[Option<f64>], defaults: &[f64]) -> Vec<f64> {
        raw.iter()
            .zip(defaults)
            .map(|(value, default)| finite(*value).unwrap_or(*default))
            .collect()
    }
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new()
    }
}
