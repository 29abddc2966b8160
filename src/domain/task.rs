//! Task domain types
//!
//! Project work items that need resources.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::resource::ResourceCategory;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub volume: f64,
    pub unit: String,
    pub unit_price: f64,
    pub planned_start: NaiveDate,
    pub planned_end: NaiveDate,
    /// Resource category the task is best served by.
    #[serde(default)]
    pub required_category: Option<ResourceCategory>,
    /// Relative difficulty, 1 (routine) to 5 (specialist).
    #[serde(default)]
    pub complexity: Option<f64>,
}

impl Task {
    pub fn new(
        project_id: Uuid,
        name: impl Into<String>,
        volume: f64,
        unit_price: f64,
        planned_start: NaiveDate,
        planned_end: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            name: name.into(),
            volume,
            unit: "unit".to_string(),
            unit_price,
            planned_start,
            planned_end,
            required_category: None,
            complexity: None,
        }
    }

    pub fn with_required_category(mut self, category: ResourceCategory) -> Self {
        self.required_category = Some(category);
        self
    }

    pub fn with_complexity(mut self, complexity: f64) -> Self {
        self.complexity = Some(complexity);
        self
    }

    /// Cost of the task at its contracted unit price.
    pub fn baseline_cost(&self) -> f64 {
        self.volume * self.unit_price
    }

    /// Length of the planned window in days, inclusive and at least one.
    pub fn planned_duration_days(&self) -> i64 {
        ((self.planned_end - self.planned_start).num_days() + 1).max(1)
    }

    /// Whether a resource of `category` suits this task.
    pub fn accepts(&self, category: ResourceCategory) -> bool {
        self.required_category.map_or(true, |required| required == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    #[test]
    fn test_baseline_and_duration() {
        let task = Task::new(Uuid::new_v4(), "Pour slab", 100.0, 150.0, date(1), date(5));
        assert_eq!(task.baseline_cost(), 15_000.0);
        assert_eq!(task.planned_duration_days(), 5);
    }

    #[test]
    fn test_inverted_window_counts_one_day() {
        let task = Task::new(Uuid::new_v4(), "Inspect", 1.0, 10.0, date(5), date(1));
        assert_eq!(task.planned_duration_days(), 1);
    }

    #[test]
    fn test_accepts() {
        let open = Task::new(Uuid::new_v4(), "Clean", 1.0, 1.0, date(1), date(2));
        assert!(open.accepts(ResourceCategory::Material));

        let skilled = open.with_required_category(ResourceCategory::Worker);
        assert!(skilled.accepts(ResourceCategory::Worker));
        assert!(!skilled.accepts(ResourceCategory::Equipment));
    }
}
