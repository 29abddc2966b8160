//! Allocation domain types
//!
//! An allocation books one resource onto one task for a date range. It is the
//! gene of the optimizer's genome.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::resource::ResourceCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStatus {
    Planned,
    Confirmed,
    Active,
    Completed,
    Cancelled,
}

impl Default for AllocationStatus {
    fn default() -> Self {
        Self::Planned
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: Uuid,
    pub resource_id: Uuid,
    pub resource_type: ResourceCategory,
    pub project_id: Uuid,
    pub task_id: Uuid,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Share of the resource's working day, 0 to 100.
    pub allocation_percentage: f64,
    pub estimated_cost: f64,
    #[serde(default)]
    pub status: AllocationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub updated_by: Option<String>,
}

impl Allocation {
    /// Length of the booking in days, inclusive and at least one.
    pub fn duration_days(&self) -> i64 {
        ((self.end - self.start).num_days() + 1).max(1)
    }

    /// Stamps the audit fields for a recommendation issued by `actor`.
    pub fn issued_by(mut self, actor: &str, at: DateTime<Utc>) -> Self {
        self.created_by = Some(actor.to_string());
        self.updated_by = Some(actor.to_string());
        self.created_at = at;
        self.updated_at = at;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&AllocationStatus::Confirmed).unwrap();
        assert_eq!(json, "\"confirmed\"");
        assert_eq!(AllocationStatus::default(), AllocationStatus::Planned);
    }

    #[test]
    fn test_duration_days() {
        let now = Utc::now();
        let allocation = Allocation {
            id: Uuid::new_v4(),
            resource_id: Uuid::new_v4(),
            resource_type: ResourceCategory::Worker,
            project_id: Uuid::new_v4(),
            task_id: Uuid::new_v4(),
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            allocation_percentage: 50.0,
            estimated_cost: 600.0,
            status: AllocationStatus::Planned,
            created_at: now,
            updated_at: now,
            created_by: None,
            updated_by: None,
        };
        assert_eq!(allocation.duration_days(), 3);

        let issued = allocation.issued_by("planner", now);
        assert_eq!(issued.created_by.as_deref(), Some("planner"));
    }
}
