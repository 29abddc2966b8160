mod common;

use std::sync::Arc;

use common::{date, init_tracing};
use resource_optimizer::{
    breeding::StandardBreeding,
    constraints::{allocation_constraints, PenaltyAdjustedChallenge},
    domain::{
        map_optimization_goal, map_resource_type, map_resource_type_name, Constraints,
        ResourceCategory, ResourceStatus, ResourceType,
    },
    evolution::{
        Challenge, EvolutionLauncher, EvolutionOptions, FitnessFunction, SelectionMethod,
    },
    optimizer::{AllocationFitness, CostEstimator, Genome, GenomeContext},
    rng::RandomNumberGenerator,
    OptimizationGoal, Resource, Task,
};
use uuid::Uuid;

fn tasks(n: usize) -> Vec<Task> {
    let project = Uuid::new_v4();
    (0..n)
        .map(|i| {
            Task::new(project, format!("Task {}", i), 40.0, 60.0, date(8, 5), date(8, 9))
                .with_required_category(ResourceCategory::Worker)
        })
        .collect()
}

fn context(tasks: Vec<Task>, resources: Vec<Resource>) -> Arc<GenomeContext> {
    Arc::new(GenomeContext::new(tasks, resources, &CostEstimator::heuristic()).unwrap())
}

#[test]
fn test_cost_objective_prefers_cheaper_worker() {
    init_tracing();
    let cheap = Resource::new("Apprentice", ResourceType::Human, 20.0);
    let cheap_id = cheap.id;
    let ctx = context(
        tasks(3),
        vec![cheap, Resource::new("Master", ResourceType::Human, 90.0)],
    );
    let options = EvolutionOptions::builder()
        .population_size(40)
        .max_generations(60)
        .fitness_function(FitnessFunction::Cost)
        .seed(11)
        .build()
        .unwrap();
    let launcher = EvolutionLauncher::new(
        StandardBreeding::new(),
        AllocationFitness::new(Arc::clone(&ctx), FitnessFunction::Cost),
    );
    let mut rng = RandomNumberGenerator::from_seed(11);

    let result = launcher.evolve(ctx.as_ref(), &options, &mut rng).unwrap();

    assert!(result
        .best
        .allocations()
        .iter()
        .all(|a| a.resource_id == cheap_id));
    assert_eq!(result.fitness_history.len(), result.generations_run);
    assert!(result.generations_run <= 60);
}

#[test]
fn test_history_never_drops_with_elitism() {
    init_tracing();
    let ctx = context(
        tasks(5),
        vec![
            Resource::new("A", ResourceType::Human, 35.0),
            Resource::new("B", ResourceType::Human, 45.0),
            Resource::new("Loader", ResourceType::Equipment, 70.0),
        ],
    );
    let options = EvolutionOptions::builder()
        .population_size(24)
        .max_generations(25)
        .elitism_rate(0.1)
        .selection_method(SelectionMethod::Rank)
        .convergence_threshold(0.0)
        .build()
        .unwrap();
    let launcher = EvolutionLauncher::new(
        StandardBreeding::new(),
        AllocationFitness::new(Arc::clone(&ctx), FitnessFunction::Composite),
    );
    let mut rng = RandomNumberGenerator::from_seed(21);

    let result = launcher.evolve(ctx.as_ref(), &options, &mut rng).unwrap();

    assert_eq!(result.generations_run, 25);
    assert!(!result.converged);
    for pair in result.fitness_history.windows(2) {
        assert!(pair[1] >= pair[0] - 1e-12);
    }
}

#[test]
fn test_parallel_path_keeps_plans_valid() {
    init_tracing();
    let busy = Resource::new("Busy", ResourceType::Human, 10.0).with_status(ResourceStatus::Maintenance);
    let busy_id = busy.id;
    let ctx = context(
        tasks(4),
        vec![busy, Resource::new("Free", ResourceType::Human, 40.0)],
    );
    let options = EvolutionOptions::builder()
        .population_size(16)
        .max_generations(10)
        .parallel_threshold(2)
        .seed(5)
        .build()
        .unwrap();
    let challenge = PenaltyAdjustedChallenge::new(
        AllocationFitness::new(Arc::clone(&ctx), FitnessFunction::Composite),
        allocation_constraints(&Constraints::default()),
        1.0,
    );
    let launcher = EvolutionLauncher::<Genome, _, _>::new(StandardBreeding::new(), challenge);
    let mut rng = RandomNumberGenerator::from_seed(5);

    let result = launcher.evolve(ctx.as_ref(), &options, &mut rng).unwrap();

    assert_eq!(result.best.len(), 4);
    assert!(result.best.allocations().iter().all(|a| a.resource_id != busy_id));
    assert!(result.best_score > 0.0);
    assert_eq!(launcher.challenge().score(&result.best), result.best_score);
}

#[test]
fn test_resource_type_mapping_is_total() {
    assert_eq!(map_resource_type(ResourceType::Human), ResourceCategory::Worker);
    assert_eq!(map_resource_type(ResourceType::Equipment), ResourceCategory::Equipment);
    assert_eq!(map_resource_type(ResourceType::Material), ResourceCategory::Material);
    assert_eq!(map_resource_type(ResourceType::Unknown), ResourceCategory::Unknown);

    assert_eq!(map_resource_type_name("human"), "worker");
    assert_eq!(map_resource_type_name("equipment"), "equipment");
    assert_eq!(map_resource_type_name("subcontractor"), "subcontractor");
}

#[test]
fn test_goal_mapping_is_total() {
    let cases = [
        ("minimize_cost", FitnessFunction::Cost),
        ("minimize_duration", FitnessFunction::Time),
        ("maximize_quality", FitnessFunction::Quality),
        ("balance_cost_time", FitnessFunction::Composite),
        ("something_else", FitnessFunction::Composite),
    ];
    for (raw, expected) in cases {
        assert_eq!(map_optimization_goal(&OptimizationGoal::from(raw)), expected);
    }
}
