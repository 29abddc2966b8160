//! # Allocation Constraints
//!
//! Budget, deadline and per-resource capacity limits of an optimization
//! request, checked against a [`Genome`].

use std::collections::HashMap;

use chrono::NaiveDate;
use serde_json::json;
use uuid::Uuid;

use crate::constraints::{Constraint, ConstraintManager, ConstraintViolation};
use crate::domain::{Constraints, Severity, WarningCategory, DEFAULT_RESOURCE_CAP};
use crate::optimizer::Genome;

/// Capacity breaches above this multiple of the cap are raised as high.
pub const OVER_ALLOCATION_HIGH_RATIO: f64 = 1.5;
/// Days late at which the deadline penalty reaches one half.
const DEADLINE_PENALTY_HALF_DAYS: f64 = 7.0;

/// Fails for every allocation at which the running cost, accumulated in task
/// order, is above the limit.
///
/// Each violation's penalty is the relative overshoot of the running total at
/// that allocation. The constraint penalizes a plan once, by its largest
/// overshoot, so a long tail of over-budget allocations is not counted twice.
#[derive(Debug, Clone)]
pub struct BudgetConstraint {
    limit: f64,
}

impl BudgetConstraint {
    pub fn new(limit: f64) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> f64 {
        self.limit
    }
}

impl Constraint<Genome> for BudgetConstraint {
    fn check(&self, genome: &Genome) -> Vec<ConstraintViolation> {
        let mut running = 0.0;
        genome
            .allocations()
            .iter()
            .filter_map(|allocation| {
                running += allocation.estimated_cost;
                (running > self.limit).then(|| {
                    ConstraintViolation::new(
                        "Budget",
                        WarningCategory::BudgetOverrun,
                        Severity::Critical,
                        format!(
                            "Cumulative cost {:.2} at task {} exceeds the budget limit of {:.2}",
                            running, allocation.task_id, self.limit
                        ),
                    )
                    .with_penalty((running - self.limit) / self.limit.max(1.0))
                    .with_details(json!({
                        "budget_limit": self.limit,
                        "cumulative_cost": running,
                        "overrun": running - self.limit,
                        "allocation_id": allocation.id,
                        "task_id": allocation.task_id,
                    }))
                })
            })
            .collect()
    }

    fn penalty_score(&self, violations: &[ConstraintViolation]) -> f64 {
        violations
            .iter()
            .map(ConstraintViolation::penalty)
            .fold(0.0, f64::max)
    }
}

/// One violation per allocation ending after the deadline.
#[derive(Debug, Clone)]
pub struct DeadlineConstraint {
    deadline: NaiveDate,
}

impl DeadlineConstraint {
    pub fn new(deadline: NaiveDate) -> Self {
        Self { deadline }
    }
}

impl Constraint<Genome> for DeadlineConstraint {
    fn check(&self, genome: &Genome) -> Vec<ConstraintViolation> {
        genome
            .allocations()
            .iter()
            .filter(|allocation| allocation.end > self.deadline)
            .map(|allocation| {
                let days_late = (allocation.end - self.deadline).num_days();
                ConstraintViolation::new(
                    "Deadline",
                    WarningCategory::DeadlineOverrun,
                    Severity::High,
                    format!(
                        "Allocation for task {} ends {} day(s) after the deadline {}",
                        allocation.task_id, days_late, self.deadline
                    ),
                )
                .with_penalty(days_late as f64 / (days_late as f64 + DEADLINE_PENALTY_HALF_DAYS))
                .with_details(json!({
                    "deadline": self.deadline,
                    "allocation_end": allocation.end,
                    "days_late": days_late,
                    "allocation_id": allocation.id,
                    "task_id": allocation.task_id,
                }))
            })
            .collect()
    }
}

/// Caps the summed allocation percentage of each resource.
#[derive(Debug, Clone)]
pub struct ResourceCapacityConstraint {
    caps: HashMap<Uuid, f64>,
    default_cap: f64,
}

impl ResourceCapacityConstraint {
    pub fn new(caps: HashMap<Uuid, f64>) -> Self {
        Self {
            caps,
            default_cap: DEFAULT_RESOURCE_CAP,
        }
    }

    pub fn with_default_cap(mut self, cap: f64) -> Self {
        self.default_cap = cap;
        self
    }

    pub fn cap_for(&self, resource_id: &Uuid) -> f64 {
        self.caps.get(resource_id).copied().unwrap_or(self.default_cap)
    }
}

impl Constraint<Genome> for ResourceCapacityConstraint {
    fn check(&self, genome: &Genome) -> Vec<ConstraintViolation> {
        // Resources in order of first appearance, so reports are stable.
        let mut order: Vec<Uuid> = Vec::new();
        let mut totals: HashMap<Uuid, (f64, usize)> = HashMap::new();
        for allocation in genome.allocations() {
            let entry = totals.entry(allocation.resource_id).or_insert_with(|| {
                order.push(allocation.resource_id);
                (0.0, 0)
            });
            entry.0 += allocation.allocation_percentage;
            entry.1 += 1;
        }

        order
            .into_iter()
            .filter_map(|resource_id| {
                let (allocated, count) = totals[&resource_id];
                let cap = self.cap_for(&resource_id);
                if allocated <= cap {
                    return None;
                }

                let severity = if allocated > cap * OVER_ALLOCATION_HIGH_RATIO {
                    Severity::High
                } else {
                    Severity::Medium
                };
                Some(
                    ConstraintViolation::new(
                        "ResourceCapacity",
                        WarningCategory::ResourceOverAllocation,
                        severity,
                        format!(
                            "Resource {} is allocated {:.0}% against a cap of {:.0}%",
                            resource_id, allocated, cap
                        ),
                    )
                    .with_penalty((allocated - cap) / cap.max(1.0))
                    .with_details(json!({
                        "resource_id": resource_id,
                        "allocated_percentage": allocated,
                        "cap": cap,
                        "allocation_count": count,
                    })),
                )
            })
            .collect()
    }
}

/// The constraints of a request. Capacity is always checked; budget and
/// deadline only when set.
pub fn allocation_constraints(constraints: &Constraints) -> ConstraintManager<Genome> {
    let mut manager = ConstraintManager::new();
    if let Some(limit) = constraints.budget_limit {
        manager.add_constraint(BudgetConstraint::new(limit));
    }
    if let Some(deadline) = constraints.deadline {
        manager.add_constraint(DeadlineConstraint::new(deadline));
    }
    manager.add_constraint(ResourceCapacityConstraint::new(
        constraints.resource_caps.clone(),
    ));
    manager
}
