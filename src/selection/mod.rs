//! Parent and survivor selection.
//!
//! [`ElitistSelection`] picks the survivors carried unchanged into the next
//! generation; the method named by
//! [`SelectionMethod`](crate::evolution::SelectionMethod) picks mating
//! parents via [`for_method`].

pub mod elitist;
pub mod rank;
pub mod roulette;
pub mod selection_strategy;
pub mod tournament;

pub use elitist::ElitistSelection;
pub use rank::RankBasedSelection;
pub use roulette::RouletteWheelSelection;
pub use selection_strategy::SelectionStrategy;
pub use tournament::TournamentSelection;

use crate::error::Result;
use crate::evolution::SelectionMethod;
use crate::phenotype::Phenotype;

/// Builds the parent selection strategy for a run.
///
/// Mating selection always samples with replacement so strong genomes can
/// parent several offspring.
pub fn for_method<P: Phenotype>(
    method: SelectionMethod,
    tournament_size: usize,
) -> Result<Box<dyn SelectionStrategy<P>>> {
    Ok(match method {
        SelectionMethod::Tournament => {
            Box::new(TournamentSelection::new(tournament_size, true)?)
        }
        SelectionMethod::Roulette => Box::new(RouletteWheelSelection::with_duplicates(true)),
        SelectionMethod::Rank => Box::new(RankBasedSelection::default().with_duplicates()),
    })
}
