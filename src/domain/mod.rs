//! Domain types shared by the optimizer, the models and the store boundary.
//!
//! All types serialize with `snake_case` enum names, matching the JSON
//! documents exchanged with the project service.

pub mod allocation;
pub mod request;
pub mod resource;
pub mod result;
pub mod task;

pub use allocation::{Allocation, AllocationStatus};
pub use request::{
    map_optimization_goal, Constraints, OptimizationGoal, OptimizationPreferences,
    OptimizationRequest, TimeHorizon, DEFAULT_RESOURCE_CAP,
};
pub use resource::{
    map_resource_type, map_resource_type_name, AvailabilityWindow, Resource, ResourceCategory,
    ResourceStatus, ResourceType,
};
pub use result::{
    AlternativeScenario, OptimizationMetrics, OptimizationResult, OptimizationStatus, Severity,
    Warning, WarningCategory,
};
pub use task::Task;
