//! Convergence detection over the best-fitness trace.

/// Number of trailing generations inspected by [`has_converged`].
pub const CONVERGENCE_WINDOW: usize = 10;

/// Population variance (mean of squared deviations from the mean).
///
/// Returns `0.0` for an empty slice.
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// Whether the last [`CONVERGENCE_WINDOW`] best-fitness values have settled.
///
/// Histories shorter than the window never count as converged.
pub fn has_converged(history: &[f64], threshold: f64) -> bool {
    if history.len() < CONVERGENCE_WINDOW {
        return false;
    }
    let window = &history[history.len() - CONVERGENCE_WINDOW..];
    variance(window) < threshold
}
