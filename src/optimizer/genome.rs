//! # Genome
//!
//! A candidate plan: one [`Allocation`] per task, in task order. The shared
//! [`GenomeContext`] holds the tasks, the resources and the per-pair
//! estimates every genome of a run is built and mutated against.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use super::estimator::{CostEstimator, PairEstimate};
use crate::caching::CacheKey;
use crate::domain::{Allocation, AllocationStatus, Resource, Task};
use crate::error::{OptimizerError, Result};
use crate::phenotype::Phenotype;
use crate::rng::RandomNumberGenerator;

pub const MIN_PERCENTAGE: f64 = 10.0;
pub const MAX_PERCENTAGE: f64 = 100.0;
/// Granularity of allocation percentages.
pub const PERCENTAGE_STEP: f64 = 5.0;
/// Candidate weight of a resource in the task's required category.
pub const COMPATIBLE_WEIGHT: f64 = 3.0;
pub const INCOMPATIBLE_WEIGHT: f64 = 1.0;

/// Problem data shared read-only by every genome of a run.
#[derive(Debug, Clone)]
pub struct GenomeContext {
    tasks: Vec<Task>,
    resources: Vec<Resource>,
    resource_index: HashMap<Uuid, usize>,
    /// Available, availability-compatible resource indices per task.
    candidates: Vec<Vec<usize>>,
    candidate_weights: Vec<Vec<f64>>,
    /// Estimates indexed `[task][resource]`.
    estimates: Vec<Vec<PairEstimate>>,
    issued_at: DateTime<Utc>,
}

impl GenomeContext {
    /// # Errors
    ///
    /// Returns `OptimizerError::InfeasibleProblem` when there are no tasks,
    /// no resources, or no resource is available.
    pub fn new(
        tasks: Vec<Task>,
        resources: Vec<Resource>,
        estimator: &CostEstimator,
    ) -> Result<Self> {
        if tasks.is_empty() {
            return Err(OptimizerError::InfeasibleProblem(
                "Cannot build a plan without tasks".to_string(),
            ));
        }
        if resources.is_empty() {
            return Err(OptimizerError::InfeasibleProblem(
                "Cannot build a plan without resources".to_string(),
            ));
        }

        let available: Vec<usize> = (0..resources.len())
            .filter(|&r| resources[r].is_available())
            .collect();
        if available.is_empty() {
            return Err(OptimizerError::InfeasibleProblem(
                "No resource is available for allocation".to_string(),
            ));
        }

        let candidates: Vec<Vec<usize>> = tasks
            .iter()
            .map(|task| {
                let fitting: Vec<usize> = available
                    .iter()
                    .copied()
                    .filter(|&r| resources[r].available_during(task.planned_start, task.planned_end))
                    .collect();
                if fitting.is_empty() {
                    available.clone()
                } else {
                    fitting
                }
            })
            .collect();

        let candidate_weights = tasks
            .iter()
            .zip(&candidates)
            .map(|(task, indices)| {
                indices
                    .iter()
                    .map(|&r| {
                        if task.accepts(resources[r].category()) {
                            COMPATIBLE_WEIGHT
                        } else {
                            INCOMPATIBLE_WEIGHT
                        }
                    })
                    .collect()
            })
            .collect();

        let estimates = tasks
            .iter()
            .map(|task| resources.iter().map(|r| estimator.assess(task, r)).collect())
            .collect();

        let resource_index = resources
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id, i))
            .collect();

        Ok(Self {
            tasks,
            resources,
            resource_index,
            candidates,
            candidate_weights,
            estimates,
            issued_at: Utc::now(),
        })
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn resource(&self, id: &Uuid) -> Option<&Resource> {
        self.resource_index.get(id).map(|&i| &self.resources[i])
    }

    pub fn resource_position(&self, id: &Uuid) -> Option<usize> {
        self.resource_index.get(id).copied()
    }

    pub fn candidates(&self, task: usize) -> &[usize] {
        &self.candidates[task]
    }

    pub fn estimate(&self, task: usize, resource: usize) -> &PairEstimate {
        &self.estimates[task][resource]
    }

    /// Σ volume × unit price over all tasks.
    pub fn baseline_cost(&self) -> f64 {
        self.tasks.iter().map(Task::baseline_cost).sum()
    }

    /// Days from the earliest planned start to the latest planned end.
    pub fn planned_span_days(&self) -> i64 {
        let start = self.tasks.iter().map(|t| t.planned_start).min();
        let end = self.tasks.iter().map(|t| t.planned_end).max();
        match (start, end) {
            (Some(start), Some(end)) => ((end - start).num_days() + 1).max(1),
            _ => 1,
        }
    }

    /// Planned start, moved into the first availability window that touches
    /// the task when the resource is booked in windows.
    fn default_start(&self, task: usize, resource: usize) -> NaiveDate {
        let task = &self.tasks[task];
        self.resources[resource]
            .availability
            .iter()
            .find(|w| w.overlaps(task.planned_start, task.planned_end))
            .map_or(task.planned_start, |w| w.start.max(task.planned_start))
    }

    fn end_for(&self, task: usize, resource: usize, percentage: f64, start: NaiveDate) -> NaiveDate {
        let days = self.estimates[task][resource].effective_days(percentage).ceil().max(1.0);
        start + Duration::days(days as i64 - 1)
    }

    fn allocation(
        &self,
        task: usize,
        resource: usize,
        percentage: f64,
        start: NaiveDate,
    ) -> Allocation {
        let t = &self.tasks[task];
        let r = &self.resources[resource];
        Allocation {
            id: Uuid::new_v4(),
            resource_id: r.id,
            resource_type: r.category(),
            project_id: t.project_id,
            task_id: t.id,
            start,
            end: self.end_for(task, resource, percentage, start),
            allocation_percentage: percentage,
            estimated_cost: self.estimates[task][resource].cost(percentage),
            status: AllocationStatus::Planned,
            created_at: self.issued_at,
            updated_at: self.issued_at,
            created_by: None,
            updated_by: None,
        }
    }

    fn fits(&self, resource: usize, allocation: &Allocation) -> bool {
        self.resources[resource].available_between(allocation.start, allocation.end)
    }

    /// Recomputes dates and cost after a gene changed, keeping its identity.
    fn rebuild(
        &self,
        task: usize,
        resource: usize,
        percentage: f64,
        start: NaiveDate,
        previous: &Allocation,
    ) -> Allocation {
        Allocation {
            id: previous.id,
            created_at: previous.created_at,
            ..self.allocation(task, resource, percentage, start)
        }
    }
}

fn random_percentage(rng: &mut RandomNumberGenerator) -> f64 {
    let steps = ((MAX_PERCENTAGE - MIN_PERCENTAGE) / PERCENTAGE_STEP) as i64;
    MIN_PERCENTAGE + rng.range_i64(0, steps) as f64 * PERCENTAGE_STEP
}

#[derive(Debug, Clone, PartialEq)]
pub struct Genome {
    allocations: Vec<Allocation>,
}

impl Genome {
    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    pub fn into_allocations(self) -> Vec<Allocation> {
        self.allocations
    }

    pub fn len(&self) -> usize {
        self.allocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }

    pub fn total_cost(&self) -> f64 {
        self.allocations.iter().map(|a| a.estimated_cost).sum()
    }

    /// Days from the earliest allocation start to the latest end.
    pub fn span_days(&self) -> i64 {
        let start = self.allocations.iter().map(|a| a.start).min();
        let end = self.allocations.iter().map(|a| a.end).max();
        match (start, end) {
            (Some(start), Some(end)) => ((end - start).num_days() + 1).max(1),
            _ => 0,
        }
    }

    fn reassign(&mut self, ctx: &GenomeContext, task: usize, rng: &mut RandomNumberGenerator) {
        let current = &self.allocations[task];
        let alternatives: Vec<usize> = ctx
            .candidates(task)
            .iter()
            .copied()
            .filter(|&r| ctx.resources[r].id != current.resource_id)
            .collect();
        if alternatives.is_empty() {
            return;
        }

        let resource = alternatives[rng.index(alternatives.len())];
        let start = ctx.default_start(task, resource);
        self.allocations[task] =
            ctx.rebuild(task, resource, current.allocation_percentage, start, current);
    }

    /// Changes the percentage by one to four steps. A resize that pushes a
    /// fitting booking out of the resource's availability is reverted.
    fn perturb_percentage(
        &mut self,
        ctx: &GenomeContext,
        task: usize,
        resource: usize,
        rng: &mut RandomNumberGenerator,
    ) {
        let current = &self.allocations[task];
        let delta = rng.range_i64(1, 4) as f64 * PERCENTAGE_STEP;
        let delta = if rng.chance(0.5) { delta } else { -delta };
        let percentage = (current.allocation_percentage + delta).clamp(MIN_PERCENTAGE, MAX_PERCENTAGE);
        if percentage == current.allocation_percentage {
            return;
        }

        let resized = ctx.rebuild(task, resource, percentage, current.start, current);
        if ctx.fits(resource, &resized) || !ctx.fits(resource, current) {
            self.allocations[task] = resized;
        }
    }

    /// Moves the booking by one day; a shift that leaves the resource's
    /// availability or starts before the plan is reverted.
    fn shift_window(
        &mut self,
        ctx: &GenomeContext,
        task: usize,
        resource: usize,
        rng: &mut RandomNumberGenerator,
    ) {
        let current = &self.allocations[task];
        let offset = if rng.chance(0.5) { 1 } else { -1 };
        let start = current.start + Duration::days(offset);

        let shifted = ctx.rebuild(task, resource, current.allocation_percentage, start, current);
        let valid = shifted.start >= ctx.tasks[task].planned_start && ctx.fits(resource, &shifted);
        if valid {
            self.allocations[task] = shifted;
        }
    }
}

impl From<Vec<Allocation>> for Genome {
    fn from(allocations: Vec<Allocation>) -> Self {
        Self { allocations }
    }
}

impl Phenotype for Genome {
    type Context = GenomeContext;

    fn random(ctx: &GenomeContext, rng: &mut RandomNumberGenerator) -> Self {
        let allocations = (0..ctx.tasks.len())
            .map(|task| {
                let candidates = &ctx.candidates[task];
                let pick = rng
                    .weighted_index(&ctx.candidate_weights[task])
                    .unwrap_or_else(|| rng.index(candidates.len()));
                let resource = candidates[pick];
                let percentage = random_percentage(rng);
                ctx.allocation(task, resource, percentage, ctx.default_start(task, resource))
            })
            .collect();

        Self { allocations }
    }

    /// Multi-point crossover over task positions; every position keeps exactly
    /// one allocation for its task.
    fn crossover(&mut self, other: &Self, rng: &mut RandomNumberGenerator) {
        let len = self.allocations.len().min(other.allocations.len());
        if len == 0 {
            return;
        }
        if len == 1 {
            if rng.chance(0.5) {
                self.allocations[0] = other.allocations[0].clone();
            }
            return;
        }

        let point_count = rng.range_i64(1, (len as i64 - 1).min(3)) as usize;
        let mut points: Vec<usize> = (0..point_count)
            .map(|_| 1 + rng.index(len - 1))
            .collect();
        points.sort_unstable();
        points.dedup();

        let mut take_other = false;
        let mut next_point = points.iter().peekable();
        for position in 0..len {
            while next_point.next_if(|&&p| p == position).is_some() {
                take_other = !take_other;
            }
            if take_other {
                self.allocations[position] = other.allocations[position].clone();
            }
        }
    }

    fn mutate(&mut self, ctx: &GenomeContext, mutation_rate: f64, rng: &mut RandomNumberGenerator) {
        for task in 0..self.allocations.len().min(ctx.tasks.len()) {
            if !rng.chance(mutation_rate) {
                continue;
            }

            // Genes pointing at resources outside the context can only be
            // reassigned.
            let Some(resource) = ctx.resource_position(&self.allocations[task].resource_id) else {
                self.reassign(ctx, task, rng);
                continue;
            };

            match rng.index(3) {
                0 => self.reassign(ctx, task, rng),
                1 => self.perturb_percentage(ctx, task, resource, rng),
                _ => self.shift_window(ctx, task, resource, rng),
            }
        }
    }
}

impl CacheKey for Genome {
    type Key = Vec<(Uuid, u32, NaiveDate)>;

    fn cache_key(&self) -> Self::Key {
        self.allocations
            .iter()
            .map(|a| (a.resource_id, (a.allocation_percentage * 10.0).round() as u32, a.start))
            .collect()
    }
}
