#![allow(dead_code)]

use chrono::{NaiveDate, TimeZone, Utc};
use resource_optimizer::{
    domain::{ResourceCategory, ResourceType, TimeHorizon},
    evolution::EvolutionOptions,
    features::{TrainingDataPoint, FEATURE_COUNT},
    ml::TrainingOptions,
    EngineSettings, InMemoryStore, OptimizationGoal, OptimizationRequest, Resource, Task,
};
use uuid::Uuid;

/// Routes `tracing` output through the test harness. Safe to call from every
/// test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

pub fn horizon() -> TimeHorizon {
    TimeHorizon::new(date(1, 1), date(12, 31))
}

/// One task of 100 units at 150 over five days, and one human resource at
/// 50 per hour.
pub fn single_task_store() -> (InMemoryStore, Uuid) {
    let store = InMemoryStore::new();
    let project = Uuid::new_v4();
    store.add_task(
        Task::new(project, "Lay foundation", 100.0, 150.0, date(3, 4), date(3, 8))
            .with_required_category(ResourceCategory::Worker),
    );
    store.add_resource(Resource::new("Site crew", ResourceType::Human, 50.0));
    (store, project)
}

pub fn request(project_ids: Vec<Uuid>, goal: OptimizationGoal) -> OptimizationRequest {
    OptimizationRequest::new(project_ids, goal, horizon(), "planner@example.com")
}

/// Small, seeded settings that keep integration runs fast.
pub fn fast_settings(seed: u64) -> EngineSettings {
    EngineSettings {
        evolution: EvolutionOptions::builder()
            .population_size(20)
            .max_generations(30)
            .seed(seed)
            .build()
            .unwrap(),
        training: TrainingOptions {
            epochs: 5,
            seed: Some(seed),
            ..TrainingOptions::default()
        },
        ..EngineSettings::default()
    }
}

/// Synthetic history: longer planned durations take longer and cost more.
pub fn training_points(n: usize) -> Vec<TrainingDataPoint> {
    (0..n)
        .map(|i| {
            let planned = 2.0 + (i % 10) as f64;
            let mut features = vec![0.5; FEATURE_COUNT];
            features[1] = planned;
            features[3] = 1000.0 * planned;
            let labels = vec![planned * 1.1, 900.0 * planned, 0.8, 0.9, planned * 0.1, 5.0];
            let timestamp = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()
                + chrono::Duration::days(i as i64);
            TrainingDataPoint::new(features, labels, timestamp).unwrap()
        })
        .collect()
}
