use std::sync::Arc;

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rayon::prelude::*;
use uuid::Uuid;

use resource_optimizer::{
    breeding::{BreedStrategy, StandardBreeding},
    domain::{ResourceCategory, ResourceType},
    evolution::{Challenge, EvolutionOptions, FitnessFunction},
    optimizer::{AllocationFitness, CostEstimator, Genome, GenomeContext},
    phenotype::Phenotype,
    rng::RandomNumberGenerator,
    Resource, Task,
};

fn context(task_count: usize) -> Arc<GenomeContext> {
    let project = Uuid::new_v4();
    let start = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
    let tasks = (0..task_count)
        .map(|i| {
            let offset = chrono::Duration::days((i % 20) as i64);
            let category = if i % 3 == 0 {
                ResourceCategory::Equipment
            } else {
                ResourceCategory::Worker
            };
            Task::new(
                project,
                format!("task-{}", i),
                50.0,
                120.0,
                start + offset,
                start + offset + chrono::Duration::days(6),
            )
            .with_required_category(category)
        })
        .collect();
    let resources = (0..12)
        .map(|i| {
            let resource_type = if i % 4 == 0 {
                ResourceType::Equipment
            } else {
                ResourceType::Human
            };
            Resource::new(format!("resource-{}", i), resource_type, 30.0 + 5.0 * i as f64)
        })
        .collect();
    Arc::new(GenomeContext::new(tasks, resources, &CostEstimator::heuristic()).unwrap())
}

fn population(ctx: &GenomeContext, size: usize) -> Vec<Genome> {
    let mut rng = RandomNumberGenerator::from_seed(7);
    (0..size).map(|_| Genome::random(ctx, &mut rng)).collect()
}

fn bench_fitness_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("fitness_evaluation");
    let ctx = context(40);
    let fitness = AllocationFitness::new(Arc::clone(&ctx), FitnessFunction::Composite);

    for size in [16, 64, 256, 1024] {
        let genomes = population(&ctx, size);

        group.bench_with_input(BenchmarkId::new("sequential", size), &genomes, |b, genomes| {
            b.iter(|| {
                genomes
                    .iter()
                    .map(|g| fitness.score(black_box(g)))
                    .collect::<Vec<f64>>()
            })
        });

        group.bench_with_input(BenchmarkId::new("parallel", size), &genomes, |b, genomes| {
            b.iter(|| {
                genomes
                    .par_iter()
                    .map(|g| fitness.score(black_box(g)))
                    .collect::<Vec<f64>>()
            })
        });
    }

    group.finish();
}

fn bench_breeding(c: &mut Criterion) {
    let mut group = c.benchmark_group("breeding");
    let ctx = context(40);
    let breeding = StandardBreeding::new();

    for size in [16, 128, 512] {
        let parents = population(&ctx, size);
        let sequential = EvolutionOptions::builder()
            .population_size(size)
            .parallel_threshold(usize::MAX)
            .build()
            .unwrap();
        let parallel = sequential.to_builder().parallel_threshold(2).build().unwrap();

        group.bench_with_input(BenchmarkId::new("sequential", size), &parents, |b, parents| {
            let mut rng = RandomNumberGenerator::from_seed(11);
            b.iter(|| {
                BreedStrategy::<Genome>::breed(
                    &breeding,
                    black_box(parents.as_slice()),
                    ctx.as_ref(),
                    &sequential,
                    &mut rng,
                )
            })
        });

        group.bench_with_input(BenchmarkId::new("parallel", size), &parents, |b, parents| {
            let mut rng = RandomNumberGenerator::from_seed(11);
            b.iter(|| {
                BreedStrategy::<Genome>::breed(
                    &breeding,
                    black_box(parents.as_slice()),
                    ctx.as_ref(),
                    &parallel,
                    &mut rng,
                )
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fitness_evaluation, bench_breeding);
criterion_main!(benches);
