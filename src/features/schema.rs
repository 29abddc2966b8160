//! Fixed feature and label layout shared by training and inference.
//!
//! Vector positions never change; a model trained on one layout cannot be
//! fed another.

use chrono::{Datelike, NaiveDate};

pub const FEATURE_COUNT: usize = 14;
pub const LABEL_COUNT: usize = 6;
pub const ALLOCATION_TARGET_COUNT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    TaskComplexity,
    PlannedDurationDays,
    RequiredSkills,
    Budget,
    WorkerExperienceYears,
    WorkerProficiency,
    EquipmentAgeYears,
    EquipmentCondition,
    Season,
    WeatherSeverity,
    SiteAccessibility,
    PriorAvgDelayDays,
    PriorAvgCostOverrunPct,
    PriorProjectCount,
}

impl Feature {
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::TaskComplexity,
        Feature::PlannedDurationDays,
        Feature::RequiredSkills,
        Feature::Budget,
        Feature::WorkerExperienceYears,
        Feature::WorkerProficiency,
        Feature::EquipmentAgeYears,
        Feature::EquipmentCondition,
        Feature::Season,
        Feature::WeatherSeverity,
        Feature::SiteAccessibility,
        Feature::PriorAvgDelayDays,
        Feature::PriorAvgCostOverrunPct,
        Feature::PriorProjectCount,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::TaskComplexity => "task_complexity",
            Self::PlannedDurationDays => "planned_duration_days",
            Self::RequiredSkills => "required_skills",
            Self::Budget => "budget",
            Self::WorkerExperienceYears => "worker_experience_years",
            Self::WorkerProficiency => "worker_proficiency",
            Self::EquipmentAgeYears => "equipment_age_years",
            Self::EquipmentCondition => "equipment_condition",
            Self::Season => "season",
            Self::WeatherSeverity => "weather_severity",
            Self::SiteAccessibility => "site_accessibility",
            Self::PriorAvgDelayDays => "prior_avg_delay_days",
            Self::PriorAvgCostOverrunPct => "prior_avg_cost_overrun_pct",
            Self::PriorProjectCount => "prior_project_count",
        }
    }

    /// Value used when no record in a dataset carries the feature.
    pub fn fallback(self) -> f64 {
        match self {
            Self::TaskComplexity => 3.0,
            Self::PlannedDurationDays => 5.0,
            Self::RequiredSkills => 2.0,
            Self::Budget => 10_000.0,
            Self::WorkerExperienceYears => 5.0,
            Self::WorkerProficiency => 0.7,
            Self::EquipmentAgeYears => 3.0,
            Self::EquipmentCondition => 0.8,
            Self::Season => 1.0,
            Self::WeatherSeverity => 0.3,
            Self::SiteAccessibility => 0.7,
            Self::PriorAvgDelayDays => 0.0,
            Self::PriorAvgCostOverrunPct => 0.0,
            Self::PriorProjectCount => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    ActualDurationDays,
    ActualCost,
    QualityScore,
    SuccessRate,
    DelayDays,
    CostOverrunPct,
}

impl Label {
    pub const ALL: [Label; LABEL_COUNT] = [
        Label::ActualDurationDays,
        Label::ActualCost,
        Label::QualityScore,
        Label::SuccessRate,
        Label::DelayDays,
        Label::CostOverrunPct,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::ActualDurationDays => "actual_duration_days",
            Self::ActualCost => "actual_cost",
            Self::QualityScore => "quality_score",
            Self::SuccessRate => "success_rate",
            Self::DelayDays => "delay_days",
            Self::CostOverrunPct => "cost_overrun_pct",
        }
    }

    /// Duration and cost; a record without either is not a usable outcome.
    pub fn is_primary(self) -> bool {
        matches!(self, Self::ActualDurationDays | Self::ActualCost)
    }

    pub fn fallback(self) -> f64 {
        match self {
            Self::ActualDurationDays => 5.0,
            Self::ActualCost => 10_000.0,
            Self::QualityScore => 0.8,
            Self::SuccessRate => 0.9,
            Self::DelayDays => 0.0,
            Self::CostOverrunPct => 0.0,
        }
    }
}

pub const ALLOCATION_TARGET_NAMES: [&str; ALLOCATION_TARGET_COUNT] = [
    "actual_duration_days",
    "actual_cost",
    "quality_score",
    "success_rate",
    "delay_days",
    "cost_overrun_pct",
    "cost_per_day",
    "quality_per_1k_cost",
    "on_time",
    "duration_efficiency",
];

/// Targets of the resource-allocation model: the six labels followed by four
/// efficiency ratios derived from them.
pub fn allocation_targets(features: &[f64], labels: &[f64]) -> Vec<f64> {
    let label = |l: Label| labels.get(l.index()).copied().unwrap_or_else(|| l.fallback());
    let duration = label(Label::ActualDurationDays).max(1.0);
    let cost = label(Label::ActualCost).max(1.0);
    let planned = features
        .get(Feature::PlannedDurationDays.index())
        .copied()
        .unwrap_or_else(|| Feature::PlannedDurationDays.fallback());

    let mut targets: Vec<f64> = Label::ALL.iter().map(|&l| label(l)).collect();
    targets.push(cost / duration);
    targets.push(label(Label::QualityScore) * 1000.0 / cost);
    targets.push(if label(Label::DelayDays) <= 0.0 { 1.0 } else { 0.0 });
    targets.push(planned / duration);
    targets
}

/// 0 winter, 1 spring, 2 summer, 3 autumn.
pub fn season_of(date: NaiveDate) -> f64 {
    match date.month() {
        3..=5 => 1.0,
        6..=8 => 2.0,
        9..=11 => 3.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_follow_declaration_order() {
        for (i, feature) in Feature::ALL.iter().enumerate() {
            assert_eq!(feature.index(), i);
        }
        for (i, label) in Label::ALL.iter().enumerate() {
            assert_eq!(label.index(), i);
        }
        assert_eq!(Feature::PriorProjectCount.name(), "prior_project_count");
    }

    #[test]
    fn test_allocation_targets() {
        let mut features = vec![0.0; FEATURE_COUNT];
        features[Feature::PlannedDurationDays.index()] = 8.0;
        let labels = vec![10.0, 5000.0, 0.9, 1.0, 2.0, 5.0];

        let targets = allocation_targets(&features, &labels);

        assert_eq!(targets.len(), ALLOCATION_TARGET_COUNT);
        assert_eq!(&targets[..LABEL_COUNT], labels.as_slice());
        assert!((targets[6] - 500.0).abs() < 1e-9);
        assert!((targets[7] - 0.18).abs() < 1e-9);
        assert_eq!(targets[8], 0.0);
        assert!((targets[9] - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_season_of() {
        let date = |m| NaiveDate::from_ymd_opt(2024, m, 1).unwrap();
        assert_eq!(season_of(date(1)), 0.0);
        assert_eq!(season_of(date(4)), 1.0);
        assert_eq!(season_of(date(7)), 2.0);
        assert_eq!(season_of(date(10)), 3.0);
        assert_eq!(season_of(date(12)), 0.0);
    }
}
