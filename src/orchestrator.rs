//! # ResourceOptimizer
//!
//! Runs one optimization request end to end: validate, fetch, warm the
//! models, evolve, analyze, persist. Every failure is folded into the
//! returned [`OptimizationResult`]; nothing escapes to the caller.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::analysis::{calculate_metrics, detect_warnings, generate_alternatives, with_estimates};
use crate::breeding::StandardBreeding;
use crate::caching::with_cache;
use crate::config::EngineSettings;
use crate::constraints::{allocation_constraints, PenaltyAdjustedChallenge};
use crate::domain::{
    map_optimization_goal, OptimizationRequest, OptimizationResult, OptimizationStatus, Severity,
};
use crate::error::{OptimizerError, Result};
use crate::evolution::EvolutionLauncher;
use crate::features::{SplitRatio, TrainingDataset};
use crate::ml::{
    ModelKind, ModelManager, ModelRegistry, DURATION_PREDICTION_MODEL_ID,
    RESOURCE_ALLOCATION_MODEL_ID,
};
use crate::optimizer::{AllocationFitness, CostEstimator, Genome, GenomeContext};
use crate::rng::RandomNumberGenerator;
use crate::store::ProjectStore;

/// Models trained before a run, in training order.
const WARM_UP_ORDER: [ModelKind; 2] = [ModelKind::DurationPrediction, ModelKind::ResourceAllocation];

/// Confidence weights: search convergence, model accuracy, feasibility.
const CONVERGENCE_WEIGHT: f64 = 0.5;
const MODEL_WEIGHT: f64 = 0.2;
const FEASIBILITY_WEIGHT: f64 = 0.3;
/// Convergence credit of a run stopped by the generation cap.
const UNCONVERGED_CREDIT: f64 = 0.6;
/// Feasibility credit of a plan with critical warnings.
const CRITICAL_WARNING_CREDIT: f64 = 0.5;

/// Blend of convergence, model accuracy (when the models informed the
/// estimates) and feasibility, in `[0, 1]`.
pub fn confidence_score(
    converged: bool,
    model_accuracy: Option<f64>,
    has_critical_warnings: bool,
) -> f64 {
    let convergence = if converged { 1.0 } else { UNCONVERGED_CREDIT };
    let model = model_accuracy.map_or(0.0, |a| a.clamp(0.0, 1.0));
    let feasibility = if has_critical_warnings {
        CRITICAL_WARNING_CREDIT
    } else {
        1.0
    };

    (CONVERGENCE_WEIGHT * convergence + MODEL_WEIGHT * model + FEASIBILITY_WEIGHT * feasibility)
        .clamp(0.0, 1.0)
}

pub struct ResourceOptimizer<S: ProjectStore> {
    store: S,
    registry: Arc<ModelRegistry>,
    manager: ModelManager,
    settings: EngineSettings,
}

impl<S: ProjectStore> ResourceOptimizer<S> {
    pub fn new(store: S, settings: EngineSettings) -> Self {
        Self::with_registry(store, Arc::new(ModelRegistry::new()), settings)
    }

    /// Shares `registry` with other optimizers, so a model trained by one is
    /// used by all.
    pub fn with_registry(store: S, registry: Arc<ModelRegistry>, settings: EngineSettings) -> Self {
        registry.register(RESOURCE_ALLOCATION_MODEL_ID);
        registry.register(DURATION_PREDICTION_MODEL_ID);
        Self {
            store,
            registry,
            manager: ModelManager::new(settings.training),
            settings,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Optimizes `request`. Never fails: input problems and store failures
    /// produce a `Failed` result, and a result that could not be persisted
    /// comes back `Partial`.
    pub fn optimize_resources(&self, request: &OptimizationRequest) -> OptimizationResult {
        let started = Instant::now();
        let fitness_function = map_optimization_goal(&request.optimization_goal);
        info!(
            request_id = %request.id,
            projects = request.project_ids.len(),
            goal = %request.optimization_goal,
            "Starting optimization"
        );

        let mut result = match self.run(request) {
            Ok(result) => result,
            Err(e) if e.is_input_error() => {
                warn!(request_id = %request.id, error = %e, "Optimization rejected");
                return OptimizationResult::failed(request, fitness_function, e.to_string(), None);
            }
            Err(e) => {
                error!(request_id = %request.id, error = %e, "Optimization failed");
                return OptimizationResult::failed(
                    request,
                    fitness_function,
                    "Optimization failed",
                    Some(e.to_string()),
                );
            }
        };

        match self.store.save_optimization_result(&result) {
            Ok(id) => debug!(result_id = %id, "Persisted optimization result"),
            Err(e) => {
                warn!(request_id = %request.id, error = %e, "Failed to persist optimization result");
                result.status = OptimizationStatus::Partial;
                result.reason = Some("Result could not be persisted".to_string());
                result.error_cause = Some(e.to_string());
            }
        }

        info!(
            request_id = %request.id,
            status = ?result.status,
            generations = result.generations_run,
            converged = result.converged,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Optimization finished"
        );
        result
    }

    fn run(&self, request: &OptimizationRequest) -> Result<OptimizationResult> {
        request.validate()?;
        let options = self.settings.evolution_options_for(request)?;

        let (tasks, resources) = self
            .store
            .fetch_tasks_and_resources(&request.project_ids, &request.time_horizon)?;
        if tasks.is_empty() {
            return Err(OptimizerError::InfeasibleProblem(
                "No tasks found for the requested projects within the time horizon".to_string(),
            ));
        }
        if resources.is_empty() {
            return Err(OptimizerError::InfeasibleProblem(
                "No resources available for allocation".to_string(),
            ));
        }

        let mut rng = options
            .seed()
            .map_or_else(RandomNumberGenerator::new, RandomNumberGenerator::from_seed);

        self.warm_models(&mut rng);
        let estimator = self.estimator();
        let model_accuracy = estimator.is_confident().then(|| self.mean_model_accuracy());

        let ctx = Arc::new(GenomeContext::new(tasks, resources, &estimator)?);
        let fitness = AllocationFitness::new(Arc::clone(&ctx), options.fitness_function());
        let penalized = PenaltyAdjustedChallenge::new(
            fitness,
            allocation_constraints(&request.constraints),
            self.settings.penalty_weight,
        );
        let challenge = with_cache::<Genome, _>(penalized, options.cache_type());
        let launcher = EvolutionLauncher::<Genome, _, _>::new(StandardBreeding::new(), challenge);

        let evolution = launcher.evolve(ctx.as_ref(), &options, &mut rng)?;

        let warnings = detect_warnings(&evolution.best, &request.constraints);
        let issued_at = Utc::now();
        let recommendations: Vec<_> = evolution
            .best
            .into_allocations()
            .into_iter()
            .map(|a| a.issued_by(&request.requested_by, issued_at))
            .collect();

        let metrics = calculate_metrics(&recommendations, ctx.tasks(), ctx.resources());
        let alternatives = with_estimates(
            generate_alternatives(&evolution.fitness_history),
            metrics.total_estimated_cost,
            metrics.estimated_duration_days as f64,
        );
        let has_critical = warnings.iter().any(|w| w.severity == Severity::Critical);

        Ok(OptimizationResult {
            id: Uuid::new_v4(),
            request_id: request.id,
            project_ids: request.project_ids.clone(),
            status: OptimizationStatus::Success,
            reason: None,
            error_cause: None,
            confidence_score: confidence_score(evolution.converged, model_accuracy, has_critical),
            fitness_function: options.fitness_function(),
            recommendations,
            metrics,
            warnings,
            alternatives,
            fitness_history: evolution.fitness_history,
            generations_run: evolution.generations_run,
            converged: evolution.converged,
            best_fitness: evolution.best_score,
            created_at: issued_at,
        })
    }

    /// Trains any model that is not ready yet. Training problems only lower
    /// confidence; the run continues on direct estimates.
    ///
    /// Without training data nothing is trained or recorded, so the models
    /// stay untrained until data arrives. A configured training seed makes
    /// the trained weights independent of the run's generator.
    fn warm_models(&self, rng: &mut RandomNumberGenerator) {
        let pending: Vec<(u64, ModelKind)> = (0u64..)
            .zip(WARM_UP_ORDER)
            .filter(|(_, kind)| !self.registry.is_ready(kind.model_id()))
            .collect();
        if pending.is_empty() {
            return;
        }

        let dataset_id = self.settings.training_dataset_id.as_deref();
        let points = match self.store.load_training_data(dataset_id) {
            Ok(points) => points,
            Err(e) => {
                warn!(error = %e, "Could not load training data; using direct estimates");
                return;
            }
        };
        if points.is_empty() {
            debug!(dataset_id = ?dataset_id, "No training data; models stay untrained");
            return;
        }
        let dataset = TrainingDataset::new(
            dataset_id.unwrap_or("all"),
            points,
            SplitRatio::default(),
        );

        for (offset, kind) in pending {
            let mut model_rng = match self.settings.training.seed {
                Some(seed) => RandomNumberGenerator::from_seed(seed.wrapping_add(offset)),
                None => rng.fork(),
            };
            match self
                .registry
                .train(kind.model_id(), kind, &self.manager, &dataset, &mut model_rng)
            {
                Ok(metadata) => debug!(
                    model_id = kind.model_id(),
                    accuracy = metadata.accuracy,
                    status = ?metadata.status,
                    "Model warm-up finished"
                ),
                Err(e) => warn!(model_id = kind.model_id(), error = %e, "Model warm-up failed"),
            }
        }
    }

    fn estimator(&self) -> CostEstimator {
        match self.registry.get(DURATION_PREDICTION_MODEL_ID) {
            Some((model, metadata)) => {
                let estimator = CostEstimator::with_model(
                    model,
                    metadata.accuracy,
                    self.settings.min_model_confidence,
                );
                if !estimator.is_confident() {
                    warn!(
                        accuracy = metadata.accuracy,
                        min_confidence = self.settings.min_model_confidence,
                        "Duration model below confidence threshold; using direct estimates"
                    );
                }
                estimator
            }
            None => CostEstimator::heuristic(),
        }
    }

    /// Mean accuracy of the ready models.
    fn mean_model_accuracy(&self) -> f64 {
        let accuracies: Vec<f64> = [DURATION_PREDICTION_MODEL_ID, RESOURCE_ALLOCATION_MODEL_ID]
            .into_iter()
            .filter_map(|id| self.registry.get(id).map(|(_, metadata)| metadata.accuracy))
            .collect();
        if accuracies.is_empty() {
            0.0
        } else {
            accuracies.iter().sum::<f64>() / accuracies.len() as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_blend() {
        assert!((confidence_score(true, None, false) - 0.8).abs() < 1e-12);
        assert!((confidence_score(true, Some(1.0), false) - 1.0).abs() < 1e-12);
        assert!((confidence_score(false, None, false) - 0.6).abs() < 1e-12);
        assert!((confidence_score(false, Some(0.5), true) - 0.55).abs() < 1e-12);
    }

    #[test]
    fn test_confidence_is_bounded() {
        for converged in [true, false] {
            for critical in [true, false] {
                for accuracy in [None, Some(-3.0), Some(0.4), Some(9.0)] {
                    let score = confidence_score(converged, accuracy, critical);
                    assert!((0.0..=1.0).contains(&score));
                }
            }
        }
    }
}
