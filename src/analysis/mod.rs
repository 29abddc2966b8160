//! Post-run analysis of the recommended plan: summary metrics, constraint
//! warnings and alternative scenarios.

pub mod alternatives;
pub mod metrics;
pub mod warnings;

pub use alternatives::{generate_alternatives, with_estimates, COST_OPTIMIZED, TIME_OPTIMIZED};
pub use metrics::calculate_metrics;
pub use warnings::detect_warnings;
