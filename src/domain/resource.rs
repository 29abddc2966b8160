//! Resource domain types
//!
//! Workers, equipment and materials that can be allocated to tasks.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of resource as recorded by the resource catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Human,
    Equipment,
    Material,
    #[serde(other)]
    Unknown,
}

/// Resource kind as seen by allocations and task requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    Worker,
    Equipment,
    Material,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Worker => "worker",
            Self::Equipment => "equipment",
            Self::Material => "material",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Maps a catalogue resource type to its allocation category.
pub fn map_resource_type(resource_type: ResourceType) -> ResourceCategory {
    match resource_type {
        ResourceType::Human => ResourceCategory::Worker,
        ResourceType::Equipment => ResourceCategory::Equipment,
        ResourceType::Material => ResourceCategory::Material,
        ResourceType::Unknown => ResourceCategory::Unknown,
    }
}

/// String form of [`map_resource_type`]. Names other than `human` pass
/// through unchanged, so unrecognized types survive the mapping.
pub fn map_resource_type_name(name: &str) -> String {
    match name {
        "human" => "worker".to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    Available,
    Allocated,
    Maintenance,
    Unavailable,
}

impl Default for ResourceStatus {
    fn default() -> Self {
        Self::Available
    }
}

/// Inclusive date range in which a resource can be booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl AvailabilityWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start <= start && end <= self.end
    }

    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start <= end && start <= self.end
    }
}

/// Resource entity. Read-only to the optimizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    pub name: String,
    pub resource_type: ResourceType,
    pub hourly_cost: f64,
    /// Empty means always available.
    #[serde(default)]
    pub availability: Vec<AvailabilityWindow>,
    #[serde(default)]
    pub status: ResourceStatus,
    /// Free-form attributes: `experience_years`, `proficiency`,
    /// `efficiency`, `age_years`, `condition`.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Resource {
    pub fn new(name: impl Into<String>, resource_type: ResourceType, hourly_cost: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            resource_type,
            hourly_cost,
            availability: Vec::new(),
            status: ResourceStatus::Available,
            metadata: HashMap::new(),
        }
    }

    pub fn with_status(mut self, status: ResourceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_availability(mut self, window: AvailabilityWindow) -> Self {
        self.availability.push(window);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Allocation category, always derived from the resource type.
    pub fn category(&self) -> ResourceCategory {
        map_resource_type(self.resource_type)
    }

    pub fn is_available(&self) -> bool {
        self.status == ResourceStatus::Available
    }

    /// Numeric metadata attribute, if present and numeric.
    pub fn metadata_f64(&self, key: &str) -> Option<f64> {
        self.metadata.get(key).and_then(serde_json::Value::as_f64)
    }

    /// Whether the resource can be booked for the whole range.
    pub fn available_between(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.availability.is_empty() || self.availability.iter().any(|w| w.contains(start, end))
    }

    /// Whether any availability window touches the range.
    pub fn available_during(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.availability.is_empty() || self.availability.iter().any(|w| w.overlaps(start, end))
    }
}
