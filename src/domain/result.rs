//! Optimization result types
//!
//! A result is created once per request and never mutated afterwards;
//! re-optimizing produces a new result.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::allocation::Allocation;
use super::request::OptimizationRequest;
use crate::error::Result;
use crate::evolution::FitnessFunction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationStatus {
    Success,
    /// The run finished but the result could not be persisted.
    Partial,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningCategory {
    BudgetOverrun,
    DeadlineOverrun,
    ResourceOverAllocation,
}

impl fmt::Display for WarningCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BudgetOverrun => "budget_overrun",
            Self::DeadlineOverrun => "deadline_overrun",
            Self::ResourceOverAllocation => "resource_over_allocation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

/// A constraint breach found in the recommended plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    pub category: WarningCategory,
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub details: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationMetrics {
    pub baseline_cost: f64,
    pub total_estimated_cost: f64,
    /// Never negative; a plan dearer than the baseline saves nothing.
    pub cost_savings: f64,
    pub cost_savings_percentage: f64,
    pub resource_utilization_avg: f64,
    pub estimated_duration_days: i64,
    pub resources_used: usize,
    pub tasks_covered: usize,
}

/// A labeled what-if view derived from the fitness trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeScenario {
    pub name: String,
    pub description: String,
    pub fitness: f64,
    /// Multiplier on the recommended plan's cost.
    pub cost_factor: f64,
    /// Multiplier on the recommended plan's duration.
    pub duration_factor: f64,
    #[serde(default)]
    pub estimated_cost: Option<f64>,
    #[serde(default)]
    pub estimated_duration_days: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub id: Uuid,
    pub request_id: Uuid,
    pub project_ids: Vec<Uuid>,
    pub status: OptimizationStatus,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub error_cause: Option<String>,
    pub confidence_score: f64,
    pub fitness_function: FitnessFunction,
    pub recommendations: Vec<Allocation>,
    pub metrics: OptimizationMetrics,
    pub warnings: Vec<Warning>,
    pub alternatives: Vec<AlternativeScenario>,
    pub fitness_history: Vec<f64>,
    pub generations_run: usize,
    pub converged: bool,
    pub best_fitness: f64,
    pub created_at: DateTime<Utc>,
}

impl OptimizationResult {
    /// A failed result carrying no plan.
    pub fn failed(
        request: &OptimizationRequest,
        fitness_function: FitnessFunction,
        reason: impl Into<String>,
        error_cause: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_id: request.id,
            project_ids: request.project_ids.clone(),
            status: OptimizationStatus::Failed,
            reason: Some(reason.into()),
            error_cause,
            confidence_score: 0.0,
            fitness_function,
            recommendations: Vec::new(),
            metrics: OptimizationMetrics::default(),
            warnings: Vec::new(),
            alternatives: Vec::new(),
            fitness_history: Vec::new(),
            generations_run: 0,
            converged: false,
            best_fitness: 0.0,
            created_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OptimizationStatus::Success
    }

    pub fn has_critical_warnings(&self) -> bool {
        self.warnings.iter().any(|w| w.severity == Severity::Critical)
    }

    /// # Errors
    ///
    /// Returns `OptimizerError::Serialization` if a field cannot be encoded.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::request::{OptimizationGoal, TimeHorizon};
    use chrono::NaiveDate;

    #[test]
    fn test_failed_result() {
        let request = OptimizationRequest::new(
            vec![Uuid::new_v4()],
            OptimizationGoal::MinimizeCost,
            TimeHorizon::new(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            ),
            "planner",
        );

        let result = OptimizationResult::failed(
            &request,
            FitnessFunction::Cost,
            "No tasks found",
            None,
        );

        assert_eq!(result.status, OptimizationStatus::Failed);
        assert_eq!(result.request_id, request.id);
        assert!(result.recommendations.is_empty());
        assert!(!result.is_success());

        let json = result.to_json().unwrap();
        assert!(json.contains("\"status\":\"failed\""));
        assert!(json.contains("No tasks found"));
    }

    #[test]
    fn test_warning_wire_shape() {
        let warning = Warning {
            category: WarningCategory::ResourceOverAllocation,
            severity: Severity::Medium,
            message: "over".to_string(),
            details: serde_json::json!({ "allocated_percentage": 120.0 }),
        };

        let value = serde_json::to_value(&warning).unwrap();
        assert_eq!(value["category"], "resource_over_allocation");
        assert_eq!(value["severity"], "medium");
        assert!(Severity::Critical > Severity::High);
    }
}
