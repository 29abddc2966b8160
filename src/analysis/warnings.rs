//! Constraint breaches of the recommended plan, reported as warnings.

use tracing::debug;

use crate::constraints::allocation_constraints;
use crate::domain::{Constraints, Warning};
use crate::optimizer::Genome;

/// Checks `genome` against the request's limits. Never fails; an empty
/// vector means every limit holds.
pub fn detect_warnings(genome: &Genome, constraints: &Constraints) -> Vec<Warning> {
    let warnings: Vec<Warning> = allocation_constraints(constraints)
        .check_all(genome)
        .into_iter()
        .map(Warning::from)
        .collect();

    if !warnings.is_empty() {
        debug!(count = warnings.len(), "Plan breaches request constraints");
    }
    warnings
}
