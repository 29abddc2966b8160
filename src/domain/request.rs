//! Optimization request types

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{OptimizerError, Result};
use crate::evolution::{FitnessFunction, SelectionMethod};

/// Default cap on the summed allocation percentage of one resource.
pub const DEFAULT_RESOURCE_CAP: f64 = 100.0;

/// What the caller wants optimized. Unrecognized goals are kept verbatim and
/// optimized with the composite objective.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OptimizationGoal {
    MinimizeCost,
    MinimizeDuration,
    MaximizeQuality,
    BalanceCostTime,
    Other(String),
}

impl From<&str> for OptimizationGoal {
    fn from(value: &str) -> Self {
        match value {
            "minimize_cost" => Self::MinimizeCost,
            "minimize_duration" => Self::MinimizeDuration,
            "maximize_quality" => Self::MaximizeQuality,
            "balance_cost_time" => Self::BalanceCostTime,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for OptimizationGoal {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<OptimizationGoal> for String {
    fn from(goal: OptimizationGoal) -> Self {
        goal.to_string()
    }
}

impl fmt::Display for OptimizationGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinimizeCost => f.write_str("minimize_cost"),
            Self::MinimizeDuration => f.write_str("minimize_duration"),
            Self::MaximizeQuality => f.write_str("maximize_quality"),
            Self::BalanceCostTime => f.write_str("balance_cost_time"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// Maps a goal onto the objective the GA optimizes.
pub fn map_optimization_goal(goal: &OptimizationGoal) -> FitnessFunction {
    match goal {
        OptimizationGoal::MinimizeCost => FitnessFunction::Cost,
        OptimizationGoal::MinimizeDuration => FitnessFunction::Time,
        OptimizationGoal::MaximizeQuality => FitnessFunction::Quality,
        OptimizationGoal::BalanceCostTime | OptimizationGoal::Other(_) => {
            FitnessFunction::Composite
        }
    }
}

/// Advisory limits. Breaches lower fitness and raise warnings but never
/// reject a plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default)]
    pub budget_limit: Option<f64>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    /// Maximum summed allocation percentage per resource.
    #[serde(default)]
    pub resource_caps: HashMap<Uuid, f64>,
}

impl Constraints {
    pub fn cap_for(&self, resource_id: &Uuid) -> f64 {
        self.resource_caps
            .get(resource_id)
            .copied()
            .unwrap_or(DEFAULT_RESOURCE_CAP)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeHorizon {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeHorizon {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn is_valid(&self) -> bool {
        self.start < self.end
    }

    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start <= end && start <= self.end
    }
}

/// Per-request overrides of the engine's GA settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationPreferences {
    #[serde(default)]
    pub population_size: Option<usize>,
    #[serde(default)]
    pub max_generations: Option<usize>,
    #[serde(default)]
    pub mutation_rate: Option<f64>,
    #[serde(default)]
    pub crossover_rate: Option<f64>,
    #[serde(default)]
    pub elitism_rate: Option<f64>,
    #[serde(default)]
    pub selection_method: Option<SelectionMethod>,
    #[serde(default)]
    pub tournament_size: Option<usize>,
    #[serde(default)]
    pub convergence_threshold: Option<f64>,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationRequest {
    pub id: Uuid,
    pub project_ids: Vec<Uuid>,
    pub optimization_goal: OptimizationGoal,
    #[serde(default)]
    pub constraints: Constraints,
    #[serde(default)]
    pub preferences: OptimizationPreferences,
    pub time_horizon: TimeHorizon,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
}

impl OptimizationRequest {
    pub fn new(
        project_ids: Vec<Uuid>,
        optimization_goal: OptimizationGoal,
        time_horizon: TimeHorizon,
        requested_by: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_ids,
            optimization_goal,
            constraints: Constraints::default(),
            preferences: OptimizationPreferences::default(),
            time_horizon,
            requested_by: requested_by.into(),
            requested_at: Utc::now(),
        }
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_preferences(mut self, preferences: OptimizationPreferences) -> Self {
        self.preferences = preferences;
        self
    }

    /// Parses a request from its JSON wire form and validates it.
    ///
    /// # Errors
    ///
    /// Returns `OptimizerError::Serialization` for malformed JSON and the
    /// errors of [`validate`](Self::validate) otherwise.
    pub fn from_json(raw: &str) -> Result<Self> {
        let request: Self = serde_json::from_str(raw)?;
        request.validate()?;
        Ok(request)
    }

    /// # Errors
    ///
    /// Returns `OptimizerError::Validation` when no project is named, the
    /// horizon is empty or inverted, or the budget is not a positive number.
    pub fn validate(&self) -> Result<()> {
        if self.project_ids.is_empty() {
            return Err(OptimizerError::Validation(
                "At least one project id is required".to_string(),
            ));
        }
        if !self.time_horizon.is_valid() {
            return Err(OptimizerError::Validation(format!(
                "Time horizon start {} must be before end {}",
                self.time_horizon.start, self.time_horizon.end
            )));
        }
        if let Some(budget) = self.constraints.budget_limit {
            if !budget.is_finite() || budget <= 0.0 {
                return Err(OptimizerError::Validation(format!(
                    "Budget limit must be positive, got {}",
                    budget
                )));
            }
        }
        Ok(())
    }
}
