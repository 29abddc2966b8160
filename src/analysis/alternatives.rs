//! What-if scenarios derived from a run's fitness trace.
//!
//! The trade-off size grows with how much the best fitness moved during the
//! run: a search that kept improving suggests the landscape has room for a
//! cheaper or a faster plan at the other objective's expense.

use crate::domain::AlternativeScenario;

pub const COST_OPTIMIZED: &str = "Cost Optimized";
pub const TIME_OPTIMIZED: &str = "Time Optimized";

const BASE_TRADE: f64 = 0.10;
const SPREAD_TRADE: f64 = 0.10;
/// Ratio between the objective given up and the one gained.
const TRADE_RATIO: f64 = 1.5;

/// Exactly two scenarios for a non-empty history, none for an empty one.
/// Absolute estimates are left unset; see [`with_estimates`].
pub fn generate_alternatives(fitness_history: &[f64]) -> Vec<AlternativeScenario> {
    let finite: Vec<f64> = fitness_history
        .iter()
        .copied()
        .filter(|f| f.is_finite())
        .collect();
    if finite.is_empty() {
        return Vec::new();
    }

    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let mean = finite.iter().sum::<f64>() / finite.len() as f64;

    let spread = if max.abs() > f64::EPSILON {
        ((max - min) / max.abs()).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let trade = BASE_TRADE + SPREAD_TRADE * spread;

    vec![
        AlternativeScenario {
            name: COST_OPTIMIZED.to_string(),
            description: format!(
                "Leaner staffing: about {:.0}% cheaper, about {:.0}% longer",
                trade * 100.0,
                trade * TRADE_RATIO * 100.0
            ),
            fitness: mean,
            cost_factor: 1.0 - trade,
            duration_factor: 1.0 + TRADE_RATIO * trade,
            estimated_cost: None,
            estimated_duration_days: None,
        },
        AlternativeScenario {
            name: TIME_OPTIMIZED.to_string(),
            description: format!(
                "Heavier staffing: about {:.0}% faster, about {:.0}% more expensive",
                trade * 100.0,
                trade * TRADE_RATIO * 100.0
            ),
            fitness: mean,
            cost_factor: 1.0 + TRADE_RATIO * trade,
            duration_factor: 1.0 - trade,
            estimated_cost: None,
            estimated_duration_days: None,
        },
    ]
}

/// Fills in absolute cost and duration from the recommended plan's figures.
pub fn with_estimates(
    alternatives: Vec<AlternativeScenario>,
    total_cost: f64,
    duration_days: f64,
) -> Vec<AlternativeScenario> {
    alternatives
        .into_iter()
        .map(|scenario| AlternativeScenario {
            estimated_cost: Some(total_cost * scenario.cost_factor),
            estimated_duration_days: Some(duration_days * scenario.duration_factor),
            ..scenario
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_scenarios_for_any_history() {
        for history in [vec![0.5], vec![0.2, 0.4, 0.6, 0.61], vec![0.0, 0.0]] {
            let alternatives = generate_alternatives(&history);
            assert_eq!(alternatives.len(), 2);
            assert_eq!(alternatives[0].name, COST_OPTIMIZED);
            assert_eq!(alternatives[1].name, TIME_OPTIMIZED);
        }
    }

    #[test]
    fn test_empty_history_has_no_scenarios() {
        assert!(generate_alternatives(&[]).is_empty());
        assert!(generate_alternatives(&[f64::NAN]).is_empty());
    }

    #[test]
    fn test_trade_off_directions() {
        let alternatives = generate_alternatives(&[0.3, 0.6]);
        let cost = &alternatives[0];
        let time = &alternatives[1];

        assert!(cost.cost_factor < 1.0 && cost.duration_factor > 1.0);
        assert!(time.cost_factor > 1.0 && time.duration_factor < 1.0);
        // Spread 0.5 gives a 15% trade.
        assert!((cost.cost_factor - 0.85).abs() < 1e-12);
        assert!((cost.fitness - 0.45).abs() < 1e-12);
    }

    #[test]
    fn test_estimates_scale_plan_figures() {
        let alternatives = with_estimates(generate_alternatives(&[1.0]), 1000.0, 10.0);
        let close = |value: Option<f64>, expected: f64| {
            value.is_some_and(|v| (v - expected).abs() < 1e-9)
        };
        assert!(close(alternatives[0].estimated_cost, 900.0));
        assert!(close(alternatives[0].estimated_duration_days, 11.5));
        assert!(close(alternatives[1].estimated_cost, 1150.0));
        assert!(close(alternatives[1].estimated_duration_days, 9.0));
    }
}
