//! Fitness of a candidate plan.
//!
//! Three sub-scores, each in (0, 1] with higher meaning better, are combined
//! according to the run's [`FitnessFunction`]:
//!
//! - **cost**: `1 / (1 + total / baseline)`, where the baseline is the sum of
//!   `volume × unit_price` over all tasks;
//! - **time**: `1 / (1 + span / planned_span)`;
//! - **quality**: mean delivered quality of the allocations.
//!
//! Cost and duration of each allocation come from the [`CostEstimator`]
//! captured in the [`GenomeContext`], so model predictions reach the fitness
//! only through the per-pair estimates.
//!
//! [`CostEstimator`]: super::estimator::CostEstimator

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::estimator::DEFAULT_QUALITY;
use super::genome::{Genome, GenomeContext};
use crate::evolution::{Challenge, FitnessFunction};

pub const COST_WEIGHT: f64 = 0.40;
pub const TIME_WEIGHT: f64 = 0.35;
pub const QUALITY_WEIGHT: f64 = 0.25;

/// Keeps every sub-score strictly positive.
const SCORE_FLOOR: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessScores {
    pub cost: f64,
    pub time: f64,
    pub quality: f64,
    pub composite: f64,
}

impl FitnessScores {
    pub fn get(&self, function: FitnessFunction) -> f64 {
        match function {
            FitnessFunction::Cost => self.cost,
            FitnessFunction::Time => self.time,
            FitnessFunction::Quality => self.quality,
            FitnessFunction::Composite => self.composite,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AllocationFitness {
    ctx: Arc<GenomeContext>,
    function: FitnessFunction,
    baseline: f64,
    planned_span: f64,
}

impl AllocationFitness {
    pub fn new(ctx: Arc<GenomeContext>, function: FitnessFunction) -> Self {
        let baseline = ctx.baseline_cost().max(1.0);
        let planned_span = ctx.planned_span_days() as f64;
        Self {
            ctx,
            function,
            baseline,
            planned_span,
        }
    }

    pub fn function(&self) -> FitnessFunction {
        self.function
    }

    pub fn evaluate(&self, genome: &Genome) -> FitnessScores {
        let total_cost = genome.total_cost().max(0.0);
        let cost = (1.0 / (1.0 + total_cost / self.baseline)).max(SCORE_FLOOR);

        let span = genome.span_days() as f64;
        let time = (1.0 / (1.0 + span / self.planned_span)).max(SCORE_FLOOR);

        let quality = self.quality(genome).clamp(SCORE_FLOOR, 1.0);

        FitnessScores {
            cost,
            time,
            quality,
            composite: COST_WEIGHT * cost + TIME_WEIGHT * time + QUALITY_WEIGHT * quality,
        }
    }

    fn quality(&self, genome: &Genome) -> f64 {
        if genome.is_empty() {
            return SCORE_FLOOR;
        }

        let total: f64 = genome
            .allocations()
            .iter()
            .enumerate()
            .map(|(task, allocation)| {
                match self.ctx.resource_position(&allocation.resource_id) {
                    Some(resource) if task < self.ctx.tasks().len() => self
                        .ctx
                        .estimate(task, resource)
                        .quality_at(allocation.allocation_percentage),
                    _ => DEFAULT_QUALITY * 0.5,
                }
            })
            .sum();

        total / genome.len() as f64
    }
}

impl Challenge<Genome> for AllocationFitness {
    fn score(&self, genome: &Genome) -> f64 {
        self.evaluate(genome).get(self.function)
    }
}
