mod common;

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use common::{date, init_tracing};
use resource_optimizer::{
    domain::{ResourceCategory, ResourceType},
    features::{FeatureBuilder, HistoricalRecord, PriorProjectOutcome, SplitRatio, TrainingDataset},
    ml::{
        ModelKind, ModelManager, ModelRegistry, ModelStatus, TrainingOptions,
        DURATION_PREDICTION_MODEL_ID, RESOURCE_ALLOCATION_MODEL_ID,
    },
    optimizer::{CostEstimator, EstimateSource},
    rng::RandomNumberGenerator,
    Resource, Task,
};
use uuid::Uuid;

fn history(n: usize) -> Vec<HistoricalRecord> {
    (0..n)
        .map(|i| {
            let planned = 3.0 + (i % 10) as f64;
            HistoricalRecord {
                task_complexity: Some(0.3 + 0.05 * (i % 8) as f64),
                planned_duration_days: Some(planned),
                budget: Some(1_000.0 * planned),
                worker_experience_years: if i % 3 == 0 { None } else { Some(4.0) },
                worker_proficiency: Some(0.75),
                started_on: Some(date(1 + (i % 12) as u32, 10)),
                prior_projects: vec![PriorProjectOutcome {
                    delay_days: 1.0,
                    cost_overrun_pct: 4.0,
                }],
                actual_duration_days: Some(planned * 1.2),
                actual_cost: Some(800.0 * planned),
                quality_score: Some(0.85),
                success_rate: Some(0.9),
                delay_days: Some(planned * 0.2),
                cost_overrun_pct: Some(3.0),
                recorded_at: Some(
                    Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap() + Duration::days(i as i64),
                ),
                ..HistoricalRecord::default()
            }
        })
        .collect()
}

fn dataset(n: usize) -> TrainingDataset {
    let records = history(n);
    let builder = FeatureBuilder::fit(&records);
    TrainingDataset::new("site-history", builder.build_all(&records), SplitRatio::default())
}

fn manager() -> ModelManager {
    ModelManager::new(TrainingOptions {
        epochs: 60,
        ..TrainingOptions::default()
    })
}

#[test]
fn test_records_to_trained_models() {
    init_tracing();
    let data = dataset(40);
    assert_eq!(data.len(), 40);

    let registry = ModelRegistry::new();
    let mut rng = RandomNumberGenerator::from_seed(3);
    for kind in [ModelKind::DurationPrediction, ModelKind::ResourceAllocation] {
        let metadata = registry
            .train(kind.model_id(), kind, &manager(), &data, &mut rng)
            .unwrap();

        assert_eq!(metadata.status, ModelStatus::Trained);
        assert_eq!(metadata.sample_count, 40);
        assert_eq!(metadata.dataset_id, "site-history");
        assert!((0.0..=1.0).contains(&metadata.accuracy));
        assert!(metadata.loss.is_finite());
    }

    assert!(registry.is_ready(DURATION_PREDICTION_MODEL_ID));
    assert!(registry.is_ready(RESOURCE_ALLOCATION_MODEL_ID));

    let (model, _) = registry.get(RESOURCE_ALLOCATION_MODEL_ID).unwrap();
    let prediction = model.predict(data.data_points()[0].features()).unwrap();
    assert_eq!(prediction.len(), ModelKind::ResourceAllocation.output_size());
    assert!(prediction.iter().all(|v| v.is_finite()));
}

#[test]
fn test_empty_history_leaves_model_untrained() {
    init_tracing();
    let registry = ModelRegistry::new();
    registry.register(DURATION_PREDICTION_MODEL_ID);
    let mut rng = RandomNumberGenerator::from_seed(4);

    let metadata = registry
        .train(
            DURATION_PREDICTION_MODEL_ID,
            ModelKind::DurationPrediction,
            &manager(),
            &dataset(0),
            &mut rng,
        )
        .unwrap();

    assert_eq!(metadata.status, ModelStatus::InsufficientData);
    assert_eq!(metadata.accuracy, 0.0);
    assert!(!registry.is_ready(DURATION_PREDICTION_MODEL_ID));
}

#[test]
fn test_estimator_consults_confident_model_only_without_rate() {
    init_tracing();
    let registry = ModelRegistry::new();
    let mut rng = RandomNumberGenerator::from_seed(9);
    let metadata = registry
        .train(
            DURATION_PREDICTION_MODEL_ID,
            ModelKind::DurationPrediction,
            &manager(),
            &dataset(40),
            &mut rng,
        )
        .unwrap();
    let (model, _) = registry.get(DURATION_PREDICTION_MODEL_ID).unwrap();

    let task = Task::new(Uuid::new_v4(), "Pour", 30.0, 200.0, date(9, 2), date(9, 8))
        .with_required_category(ResourceCategory::Material);
    let concrete = Resource::new("Concrete", ResourceType::Material, 0.0);
    let crew = Resource::new("Crew", ResourceType::Human, 45.0);

    let confident = CostEstimator::with_model(Arc::clone(&model), metadata.accuracy, 0.0);
    assert!(confident.is_confident());
    assert_eq!(confident.assess(&task, &concrete).source, EstimateSource::Model);
    assert_eq!(confident.assess(&task, &crew).source, EstimateSource::HourlyRate);

    let doubtful = CostEstimator::with_model(model, metadata.accuracy, 1.1);
    assert!(!doubtful.is_confident());
    assert_eq!(doubtful.assess(&task, &concrete).source, EstimateSource::Heuristic);
}
