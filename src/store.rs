//! # Project Store
//!
//! The engine's only view of the outside world. All reads happen before a
//! run starts and the single write happens after it finishes, so the GA never
//! holds a store handle.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tracing::debug;
use uuid::Uuid;

use crate::domain::{OptimizationResult, Resource, Task, TimeHorizon};
use crate::error::Result;
use crate::features::TrainingDataPoint;

/// Source of tasks, resources and training history, and sink for results.
pub trait ProjectStore: Send + Sync {
    /// Tasks of `project_ids` overlapping `time_horizon`, and the resources
    /// that may be assigned to them.
    fn fetch_tasks_and_resources(
        &self,
        project_ids: &[Uuid],
        time_horizon: &TimeHorizon,
    ) -> Result<(Vec<Task>, Vec<Resource>)>;

    /// Training points of `dataset_id`, or of every dataset when `None`.
    fn load_training_data(&self, dataset_id: Option<&str>) -> Result<Vec<TrainingDataPoint>>;

    /// Persists `result` and returns its id.
    fn save_optimization_result(&self, result: &OptimizationResult) -> Result<Uuid>;
}

/// A [`ProjectStore`] kept in memory, for embedding and tests.
///
/// Resources form one pool shared by every project.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tasks: RwLock<HashMap<Uuid, Vec<Task>>>,
    resources: RwLock<Vec<Resource>>,
    training_data: RwLock<HashMap<String, Vec<TrainingDataPoint>>>,
    results: RwLock<HashMap<Uuid, OptimizationResult>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_task(&self, task: Task) {
        self.tasks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(task.project_id)
            .or_default()
            .push(task);
    }

    pub fn add_resource(&self, resource: Resource) {
        self.resources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(resource);
    }

    pub fn add_training_data(
        &self,
        dataset_id: impl Into<String>,
        points: impl IntoIterator<Item = TrainingDataPoint>,
    ) {
        self.training_data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(dataset_id.into())
            .or_default()
            .extend(points);
    }

    pub fn result(&self, id: &Uuid) -> Option<OptimizationResult> {
        self.results
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn result_count(&self) -> usize {
        self.results
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl ProjectStore for InMemoryStore {
    fn fetch_tasks_and_resources(
        &self,
        project_ids: &[Uuid],
        time_horizon: &TimeHorizon,
    ) -> Result<(Vec<Task>, Vec<Resource>)> {
        let tasks: Vec<Task> = {
            let by_project = self.tasks.read().unwrap_or_else(PoisonError::into_inner);
            project_ids
                .iter()
                .filter_map(|id| by_project.get(id))
                .flatten()
                .filter(|t| time_horizon.overlaps(t.planned_start, t.planned_end))
                .cloned()
                .collect()
        };

        let resources = self
            .resources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        debug!(
            projects = project_ids.len(),
            tasks = tasks.len(),
            resources = resources.len(),
            "Fetched planning data"
        );
        Ok((tasks, resources))
    }

    fn load_training_data(&self, dataset_id: Option<&str>) -> Result<Vec<TrainingDataPoint>> {
        let datasets = self
            .training_data
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let points = match dataset_id {
            Some(id) => datasets.get(id).cloned().unwrap_or_default(),
            None => datasets.values().flatten().cloned().collect(),
        };
        Ok(points)
    }

    fn save_optimization_result(&self, result: &OptimizationResult) -> Result<Uuid> {
        self.results
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(result.id, result.clone());
        Ok(result.id)
    }
}
