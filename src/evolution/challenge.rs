use std::sync::Arc;

use crate::phenotype::Phenotype;

/// Scores an individual. Higher is better.
///
/// Challenges are shared across rayon workers during parallel evaluation, so
/// they must be `Send + Sync` and take `&self`.
pub trait Challenge<P: Phenotype>: Send + Sync {
    fn score(&self, phenotype: &P) -> f64;
}

impl<P, C> Challenge<P> for Box<C>
where
    P: Phenotype,
    C: Challenge<P> + ?Sized,
{
    fn score(&self, phenotype: &P) -> f64 {
        (**self).score(phenotype)
    }
}

impl<P, C> Challenge<P> for Arc<C>
where
    P: Phenotype,
    C: Challenge<P> + ?Sized,
{
    fn score(&self, phenotype: &P) -> f64 {
        (**self).score(phenotype)
    }
}
