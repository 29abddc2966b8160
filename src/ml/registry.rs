use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{debug, info};

use super::manager::{
    build_model, ModelKind, ModelManager, ModelMetadata, ModelStatus, RegressionModel,
};
use crate::error::{OptimizerError, Result};
use crate::features::TrainingDataset;
use crate::rng::RandomNumberGenerator;

/// Lifecycle of a registered model.
#[derive(Debug, Clone)]
pub enum ModelState {
    NotTrained,
    Ready {
        model: Arc<RegressionModel>,
        metadata: ModelMetadata,
    },
}

/// Explicit home of the trained models, passed to whoever needs predictions.
///
/// Readers get shared snapshots; a retrain swaps the snapshot atomically, so
/// an in-flight optimization keeps the model it started with.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: RwLock<HashMap<String, ModelState>>,
    lineage: RwLock<HashMap<String, Vec<ModelMetadata>>>,
    training_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `model_id` as not trained. Existing entries are untouched.
    pub fn register(&self, model_id: &str) {
        self.models
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(model_id.to_string())
            .or_insert(ModelState::NotTrained);
    }

    pub fn state(&self, model_id: &str) -> Option<ModelState> {
        self.models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(model_id)
            .cloned()
    }

    pub fn is_ready(&self, model_id: &str) -> bool {
        matches!(self.state(model_id), Some(ModelState::Ready { .. }))
    }

    /// The ready model and its metadata.
    pub fn get(&self, model_id: &str) -> Option<(Arc<RegressionModel>, ModelMetadata)> {
        match self.state(model_id)? {
            ModelState::Ready { model, metadata } => Some((model, metadata)),
            ModelState::NotTrained => None,
        }
    }

    /// Metadata of the latest training attempt, successful or not.
    pub fn latest_metadata(&self, model_id: &str) -> Option<ModelMetadata> {
        self.lineage
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(model_id)
            .and_then(|versions| versions.last().cloned())
    }

    /// Every training attempt for `model_id`, oldest first.
    pub fn lineage(&self, model_id: &str) -> Vec<ModelMetadata> {
        self.lineage
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(model_id)
            .cloned()
            .unwrap_or_default()
    }

    fn training_lock(&self, model_id: &str) -> Arc<Mutex<()>> {
        self.training_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(model_id.to_string())
            .or_default()
            .clone()
    }

    /// Builds a fresh model of `kind`, trains it on `dataset` and publishes
    /// it under `model_id`.
    ///
    /// Concurrent calls for the same id run one after the other. When the
    /// dataset is empty the previous model, if any, stays published and only
    /// the lineage records the attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be built from the manager's
    /// options, and `OptimizerError::Model` if training diverged. Either way
    /// the previously published version stays in place.
    pub fn train(
        &self,
        model_id: &str,
        kind: ModelKind,
        manager: &ModelManager,
        dataset: &TrainingDataset,
        rng: &mut RandomNumberGenerator,
    ) -> Result<ModelMetadata> {
        let lock = self.training_lock(model_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        self.register(model_id);
        let mut model = build_model(kind, manager.options(), rng)?;
        let mut metadata = manager.train_model(model_id, &mut model, dataset, rng);

        {
            let mut lineage = self.lineage.write().unwrap_or_else(PoisonError::into_inner);
            let versions = lineage.entry(model_id.to_string()).or_default();
            metadata.version = versions.len() as u32 + 1;
            versions.push(metadata.clone());
        }

        if metadata.is_trained() {
            self.models
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(
                    model_id.to_string(),
                    ModelState::Ready {
                        model: Arc::new(model),
                        metadata: metadata.clone(),
                    },
                );
            info!(model_id, version = metadata.version, "Published model");
        } else if metadata.status == ModelStatus::Diverged {
            return Err(OptimizerError::Model(format!(
                "Training of '{}' version {} diverged",
                model_id, metadata.version
            )));
        } else {
            debug!(model_id, version = metadata.version, "Training attempt not published");
        }

        Ok(metadata)
    }
}
