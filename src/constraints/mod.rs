//! # Constraints Module
//!
//! Advisory limits on a plan. A breached constraint never rejects a genome:
//! it lowers the fitness through [`PenaltyAdjustedChallenge`] during the
//! search and becomes a [`Warning`] on the final result.
//!
//! ## Key Components
//!
//! - [`Constraint`] trait: checks a phenotype and scores its violations
//! - [`ConstraintViolation`]: a single breach with severity and penalty
//! - [`ConstraintManager`]: evaluates a set of constraints together
//! - [`allocation`]: budget, deadline and resource capacity constraints
//!
//! ## Basic Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use resource_optimizer::constraints::{allocation_constraints, DeadlineConstraint};
//! use resource_optimizer::domain::Constraints;
//!
//! let limits = Constraints {
//!     budget_limit: Some(25_000.0),
//!     deadline: NaiveDate::from_ymd_opt(2024, 9, 30),
//!     ..Constraints::default()
//! };
//!
//! let manager = allocation_constraints(&limits);
//! assert_eq!(manager.len(), 3);
//! ```

use std::fmt::{Debug, Display};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::domain::{Severity, Warning, WarningCategory};
use crate::evolution::Challenge;
use crate::phenotype::Phenotype;

pub mod allocation;

pub use allocation::{
    allocation_constraints, BudgetConstraint, DeadlineConstraint, ResourceCapacityConstraint,
};

/// Upper bound on the fraction of fitness a penalty can remove.
pub const MAX_PENALTY: f64 = 0.9;

/// Represents a violation of a constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintViolation {
    constraint_name: String,
    category: WarningCategory,
    severity: Severity,
    /// Relative size of the breach; 0 means none.
    penalty: f64,
    message: String,
    details: serde_json::Value,
}

impl ConstraintViolation {
    pub fn new<S: Into<String>, M: Into<String>>(
        constraint_name: S,
        category: WarningCategory,
        severity: Severity,
        message: M,
    ) -> Self {
        Self {
            constraint_name: constraint_name.into(),
            category,
            severity,
            penalty: 0.0,
            message: message.into(),
            details: serde_json::Value::Null,
        }
    }

    pub fn with_penalty(mut self, penalty: f64) -> Self {
        self.penalty = if penalty.is_finite() { penalty.max(0.0) } else { 0.0 };
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    pub fn constraint_name(&self) -> &str {
        &self.constraint_name
    }

    pub fn category(&self) -> WarningCategory {
        self.category
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn penalty(&self) -> f64 {
        self.penalty
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> &serde_json::Value {
        &self.details
    }
}

impl Display for ConstraintViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Constraint '{}' violated: {} ({:?})",
            self.constraint_name, self.message, self.severity
        )
    }
}

impl From<ConstraintViolation> for Warning {
    fn from(violation: ConstraintViolation) -> Self {
        Warning {
            category: violation.category,
            severity: violation.severity,
            message: violation.message,
            details: violation.details,
        }
    }
}

/// Trait for defining constraints that can be applied to phenotypes.
pub trait Constraint<P>: Debug + Send + Sync
where
    P: Phenotype,
{
    /// Returns the violations of this constraint; empty when satisfied.
    fn check(&self, phenotype: &P) -> Vec<ConstraintViolation>;

    /// Penalty for the given violations. Defaults to the sum of their
    /// penalties.
    fn penalty_score(&self, violations: &[ConstraintViolation]) -> f64 {
        violations.iter().map(ConstraintViolation::penalty).sum()
    }
}

/// Manages multiple constraints and evaluates them against phenotypes.
#[derive(Debug, Clone)]
pub struct ConstraintManager<P>
where
    P: Phenotype,
{
    constraints: Vec<Arc<dyn Constraint<P>>>,
    _marker: PhantomData<P>,
}

impl<P> ConstraintManager<P>
where
    P: Phenotype,
{
    pub fn new() -> Self {
        Self {
            constraints: Vec::new(),
            _marker: PhantomData,
        }
    }

    pub fn builder() -> ConstraintManagerBuilder<P> {
        ConstraintManagerBuilder::new()
    }

    pub fn add_constraint<C>(&mut self, constraint: C) -> &mut Self
    where
        C: Constraint<P> + 'static,
    {
        self.constraints.push(Arc::new(constraint));
        self
    }

    /// Violations of every constraint, in registration order.
    pub fn check_all(&self, phenotype: &P) -> Vec<ConstraintViolation> {
        self.constraints
            .iter()
            .flat_map(|c| c.check(phenotype))
            .collect()
    }

    pub fn total_penalty_score(&self, phenotype: &P) -> f64 {
        self.constraints
            .iter()
            .map(|c| {
                let violations = c.check(phenotype);
                if violations.is_empty() {
                    0.0
                } else {
                    c.penalty_score(&violations)
                }
            })
            .sum()
    }

    pub fn is_valid(&self, phenotype: &P) -> bool {
        self.check_all(phenotype).is_empty()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

impl<P> Default for ConstraintManager<P>
where
    P: Phenotype,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating a constraint manager with a fluent API.
#[derive(Debug, Clone)]
pub struct ConstraintManagerBuilder<P>
where
    P: Phenotype,
{
    constraints: Vec<Arc<dyn Constraint<P>>>,
}

impl<P> ConstraintManagerBuilder<P>
where
    P: Phenotype,
{
    pub fn new() -> Self {
        Self {
            constraints: Vec::new(),
        }
    }

    pub fn with_constraint<C>(mut self, constraint: C) -> Self
    where
        C: Constraint<P> + 'static,
    {
        self.constraints.push(Arc::new(constraint));
        self
    }

    pub fn build(self) -> ConstraintManager<P> {
        ConstraintManager {
            constraints: self.constraints,
            _marker: PhantomData,
        }
    }
}

impl<P> Default for ConstraintManagerBuilder<P>
where
    P: Phenotype,
{
    fn default() -> Self {
        Self::new()
    }
}

/// A challenge wrapper that scales fitness down for constraint violations.
///
/// The adjusted score is `score × (1 − min(MAX_PENALTY, weight × penalty))`,
/// so a penalized plan keeps its sign and some of its ranking information
/// however large the breach.
#[derive(Debug, Clone)]
pub struct PenaltyAdjustedChallenge<P, C>
where
    P: Phenotype,
    C: Challenge<P>,
{
    challenge: C,
    constraint_manager: ConstraintManager<P>,
    penalty_weight: f64,
}

impl<P, C> PenaltyAdjustedChallenge<P, C>
where
    P: Phenotype,
    C: Challenge<P>,
{
    pub fn new(challenge: C, constraint_manager: ConstraintManager<P>, penalty_weight: f64) -> Self {
        Self {
            challenge,
            constraint_manager,
            penalty_weight,
        }
    }

    pub fn inner(&self) -> &C {
        &self.challenge
    }

    pub fn constraint_manager(&self) -> &ConstraintManager<P> {
        &self.constraint_manager
    }

    pub fn penalty_weight(&self) -> f64 {
        self.penalty_weight
    }
}

impl<P, C> Challenge<P> for PenaltyAdjustedChallenge<P, C>
where
    P: Phenotype,
    C: Challenge<P>,
{
    fn score(&self, phenotype: &P) -> f64 {
        let score = self.challenge.score(phenotype);
        let penalty = self.constraint_manager.total_penalty_score(phenotype);
        if penalty <= 0.0 {
            return score;
        }

        let reduction = (self.penalty_weight * penalty).clamp(0.0, MAX_PENALTY);
        score * (1.0 - reduction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::test_support::{population, Scalar};

    #[derive(Debug)]
    struct AtMost(f64);

    impl Constraint<Scalar> for AtMost {
        fn check(&self, phenotype: &Scalar) -> Vec<ConstraintViolation> {
            if phenotype.value <= self.0 {
                return Vec::new();
            }
            vec![ConstraintViolation::new(
                "AtMost",
                WarningCategory::BudgetOverrun,
                Severity::Critical,
                format!("{} exceeds {}", phenotype.value, self.0),
            )
            .with_penalty((phenotype.value - self.0) / self.0)]
        }
    }

    struct Identity;

    impl Challenge<Scalar> for Identity {
        fn score(&self, phenotype: &Scalar) -> f64 {
            phenotype.value
        }
    }

    #[test]
    fn test_manager_collects_violations() {
        let manager = ConstraintManager::builder()
            .with_constraint(AtMost(5.0))
            .with_constraint(AtMost(8.0))
            .build();
        let values = population(&[4.0, 6.0, 10.0]);

        assert!(manager.is_valid(&values[0]));
        assert_eq!(manager.check_all(&values[1]).len(), 1);
        assert_eq!(manager.check_all(&values[2]).len(), 2);
        assert!((manager.total_penalty_score(&values[2]) - (1.0 + 0.25)).abs() < 1e-12);
    }

    #[test]
    fn test_penalty_is_bounded() {
        let mut manager = ConstraintManager::new();
        manager.add_constraint(AtMost(1.0));
        let challenge = PenaltyAdjustedChallenge::new(Identity, manager, 1.0);
        let values = population(&[1.0, 1.5, 100.0]);

        assert_eq!(challenge.score(&values[0]), 1.0);
        assert!((challenge.score(&values[1]) - 1.5 * 0.5).abs() < 1e-12);
        let heavily_penalized = challenge.score(&values[2]);
        assert!((heavily_penalized - 100.0 * (1.0 - MAX_PENALTY)).abs() < 1e-9);
        assert!(heavily_penalized > 0.0);
    }

    #[test]
    fn test_violation_becomes_warning() {
        let violation = ConstraintViolation::new(
            "Deadline",
            WarningCategory::DeadlineOverrun,
            Severity::High,
            "late",
        )
        .with_penalty(f64::NAN)
        .with_details(serde_json::json!({ "days_late": 3 }));

        assert_eq!(violation.penalty(), 0.0);
        let warning = Warning::from(violation);
        assert_eq!(warning.category, WarningCategory::DeadlineOverrun);
        assert_eq!(warning.severity, Severity::High);
        assert_eq!(warning.details["days_late"], 3);
    }
}
