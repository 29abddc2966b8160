mod common;

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use common::{date, init_tracing};
use resource_optimizer::{
    breeding::StandardBreeding,
    caching::{with_cache, CacheKey, CachedChallenge, ThreadLocalCachedChallenge},
    domain::{ResourceCategory, ResourceType},
    evolution::{CacheType, Challenge, EvolutionLauncher, EvolutionOptions, FitnessFunction},
    optimizer::{AllocationFitness, CostEstimator, Genome, GenomeContext},
    phenotype::Phenotype,
    rng::RandomNumberGenerator,
    Resource, Task,
};
use uuid::Uuid;

/// Counts how often the wrapped fitness actually runs.
#[derive(Clone)]
struct CountingFitness {
    inner: AllocationFitness,
    evaluations: Arc<AtomicUsize>,
}

impl CountingFitness {
    fn new(ctx: Arc<GenomeContext>) -> Self {
        Self {
            inner: AllocationFitness::new(ctx, FitnessFunction::Composite),
            evaluations: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::SeqCst)
    }
}

impl Challenge<Genome> for CountingFitness {
    fn score(&self, genome: &Genome) -> f64 {
        self.evaluations.fetch_add(1, Ordering::SeqCst);
        self.inner.score(genome)
    }
}

fn context() -> Arc<GenomeContext> {
    let project = Uuid::new_v4();
    let tasks = (0..3)
        .map(|i| {
            Task::new(project, format!("Bay {}", i), 20.0, 90.0, date(10, 1), date(10, 4))
                .with_required_category(ResourceCategory::Equipment)
        })
        .collect();
    let resources = vec![
        Resource::new("Excavator", ResourceType::Equipment, 110.0),
        Resource::new("Operator", ResourceType::Human, 55.0),
    ];
    Arc::new(GenomeContext::new(tasks, resources, &CostEstimator::heuristic()).unwrap())
}

#[test]
fn test_global_cache_skips_repeated_plans() {
    init_tracing();
    let ctx = context();
    let counting = CountingFitness::new(Arc::clone(&ctx));
    let cached = CachedChallenge::new(counting.clone());
    let mut rng = RandomNumberGenerator::from_seed(1);

    let genome = Genome::random(&ctx, &mut rng);
    let first = cached.score(&genome);
    let second = cached.score(&genome.clone());

    assert_eq!(first, second);
    assert_eq!(counting.evaluations(), 1);
    assert_eq!(cached.cache_size(), 1);

    cached.clear_cache();
    cached.score(&genome);
    assert_eq!(counting.evaluations(), 2);
}

#[test]
fn test_thread_local_cache_matches_uncached_scores() {
    init_tracing();
    let ctx = context();
    let plain = AllocationFitness::new(Arc::clone(&ctx), FitnessFunction::Composite);
    let cached = ThreadLocalCachedChallenge::new(plain.clone());
    let mut rng = RandomNumberGenerator::from_seed(2);

    for _ in 0..10 {
        let genome = Genome::random(&ctx, &mut rng);
        assert_eq!(cached.score(&genome), plain.score(&genome));
        assert_eq!(cached.score(&genome), plain.score(&genome));
    }
    assert!(cached.cache_size() <= 10);
}

#[test]
fn test_cached_run_evaluates_less() {
    init_tracing();
    let ctx = context();
    let options = EvolutionOptions::builder()
        .population_size(20)
        .max_generations(15)
        .elitism_rate(0.2)
        .cache_type(CacheType::Global)
        .build()
        .unwrap();

    let counting = CountingFitness::new(Arc::clone(&ctx));
    let launcher = EvolutionLauncher::<Genome, _, _>::new(
        StandardBreeding::new(),
        with_cache::<Genome, _>(counting.clone(), options.cache_type()),
    );
    let mut rng = RandomNumberGenerator::from_seed(3);
    let result = launcher.evolve(ctx.as_ref(), &options, &mut rng).unwrap();

    let scored = 20 * result.generations_run;
    // Elites are re-scored every generation and always hit the cache.
    assert!(counting.evaluations() < scored);
}

#[test]
fn test_cache_key_tracks_assignment() {
    let ctx = context();
    let mut rng = RandomNumberGenerator::from_seed(4);
    let genome = Genome::random(&ctx, &mut rng);

    let mut mutated = genome.clone();
    for _ in 0..20 {
        mutated.mutate(&ctx, 1.0, &mut rng);
    }

    assert_eq!(genome.cache_key(), genome.clone().cache_key());
    assert_eq!(genome.cache_key().len(), 3);
    if mutated.allocations() != genome.allocations() {
        let same_plan = mutated
            .allocations()
            .iter()
            .zip(genome.allocations())
            .all(|(a, b)| {
                a.resource_id == b.resource_id
                    && a.allocation_percentage == b.allocation_percentage
                    && a.start == b.start
            });
        assert_eq!(mutated.cache_key() == genome.cache_key(), same_plan);
    }
}
