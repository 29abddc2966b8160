//! Summary figures for a recommended plan.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::domain::{Allocation, OptimizationMetrics, Resource, Task};

/// Summarizes `allocations` against the tasks they cover and the resource
/// pool they were drawn from.
///
/// Savings are measured against the task baseline (Σ volume × unit price)
/// and never go below zero. Utilization is the mean of each resource's summed
/// allocation percentage capped at 100, taken over every resource in
/// `resources` plus any booked resource missing from it. Idle pool members
/// count as 0 %.
pub fn calculate_metrics(
    allocations: &[Allocation],
    tasks: &[Task],
    resources: &[Resource],
) -> OptimizationMetrics {
    let baseline_cost: f64 = tasks.iter().map(Task::baseline_cost).sum::<f64>().max(0.0);
    let total_estimated_cost: f64 = allocations
        .iter()
        .map(|a| a.estimated_cost.max(0.0))
        .sum();

    let cost_savings = (baseline_cost - total_estimated_cost).max(0.0);
    let cost_savings_percentage = if baseline_cost > 0.0 {
        cost_savings / baseline_cost * 100.0
    } else {
        0.0
    };

    let mut load: HashMap<Uuid, f64> = HashMap::new();
    for allocation in allocations {
        *load.entry(allocation.resource_id).or_insert(0.0) +=
            allocation.allocation_percentage.max(0.0);
    }
    let resources_used = load.len();
    for resource in resources {
        load.entry(resource.id).or_insert(0.0);
    }
    let resource_utilization_avg = if load.is_empty() {
        0.0
    } else {
        load.values().map(|pct| pct.min(100.0)).sum::<f64>() / load.len() as f64
    };

    let estimated_duration_days = match (
        allocations.iter().map(|a| a.start).min(),
        allocations.iter().map(|a| a.end).max(),
    ) {
        (Some(start), Some(end)) => ((end - start).num_days() + 1).max(0),
        _ => 0,
    };

    let task_ids: HashSet<Uuid> = tasks.iter().map(|t| t.id).collect();
    let tasks_covered = allocations
        .iter()
        .map(|a| a.task_id)
        .filter(|id| task_ids.contains(id))
        .collect::<HashSet<_>>()
        .len();

    OptimizationMetrics {
        baseline_cost,
        total_estimated_cost,
        cost_savings,
        cost_savings_percentage,
        resource_utilization_avg,
        estimated_duration_days,
        resources_used,
        tasks_covered,
    }
}
