// crates/deploy-gate-core/src/scoring/stability.rs
// ============================================================================
// Module: Baseline Stability Analyzer
// Description: Summarizes recent history into a stability score and trend.
// Purpose: Reward consistent baselines and penalize regressions and volatility.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Only the most recent [`STABILITY_WINDOW`] entries are analyzed. Entries
//! without a baseline comparison count toward volatility but neither toward
//! regressions nor improvements.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::BaselineStability;
use crate::core::HistoryEntry;
use crate::core::Trend;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Number of most recent history entries analyzed.
pub const STABILITY_WINDOW: usize = 10;
/// Standard deviation of performance that maps to full volatility.
const VOLATILITY_SCALE: f64 = 50.0;
/// Net count difference required before a trend is reported.
const TREND_MARGIN: i64 = 2;
/// Score penalty per regression.
const REGRESSION_PENALTY: f64 = 10.0;
/// Score bonus per improvement.
const IMPROVEMENT_BONUS: f64 = 5.0;
/// Score penalty at full volatility.
const VOLATILITY_PENALTY: f64 = 30.0;
/// Score adjustment applied for a non-stable trend.
const TREND_ADJUSTMENT: f64 = 10.0;

// ============================================================================
// SECTION: Analysis
// ============================================================================

/// Analyzes baseline stability over the most recent history window.
#[must_use]
pub fn analyze_baseline_stability(history: &[HistoryEntry]) -> BaselineStability {
    let window = &history[history.len().saturating_sub(STABILITY_WINDOW) ..];
    if window.is_empty() {
        return BaselineStability {
            stability_score: 50.0,
            volatility: 0.5,
            regression_count: 0,
            improvement_count: 0,
            trend: Trend::Stable,
            sample_size: 0,
        };
    }

    let mut regression_count: u32 = 0;
    let mut improvement_count: u32 = 0;
    for entry in window {
        match entry.enforcement.baseline_passed {
            Some(false) => regression_count += 1,
            Some(true) => improvement_count += 1,
            None => {}
        }
    }

    let performance: Vec<f64> = window.iter().map(|entry| entry.perf_metrics.performance).collect();
    let volatility = (population_std_dev(&performance) / VOLATILITY_SCALE).min(1.0);

    let net = i64::from(improvement_count) - i64::from(regression_count);
    let trend = if net > TREND_MARGIN {
        Trend::Improving
    } else if -net > TREND_MARGIN {
        Trend::Degrading
    } else {
        Trend::Stable
    };

    let mut score = 100.0 - REGRESSION_PENALTY * f64::from(regression_count)
        + IMPROVEMENT_BONUS * f64::from(improvement_count)
        - VOLATILITY_PENALTY * volatility;
    match trend {
        Trend::Improving => score += TREND_ADJUSTMENT,
        Trend::Degrading => score -= TREND_ADJUSTMENT,
        Trend::Stable => {}
    }

    BaselineStability {
        stability_score: score.clamp(0.0, 100.0),
        volatility,
        regression_count,
        improvement_count,
        trend,
        sample_size: u32::try_from(window.len()).unwrap_or(u32::MAX),
    }
}

/// Population standard deviation; zero for fewer than two samples.
#[allow(clippy::cast_precision_loss, reason = "Window is at most ten samples.")]
fn population_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let count = values.len() as f64;
    let mean = values.iter().sum::<f64>() / count;
    let variance = values.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / count;
    variance.sqrt()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_dev_of_constant_series_is_zero() {
        assert!(population_std_dev(&[80.0, 80.0, 80.0]).abs() < f64::EPSILON);
    }

    #[test]
    fn std_dev_uses_population_denominator() {
        let value = population_std_dev(&[40.0, 60.0]);
        assert!((value - 10.0).abs() < 1e-9);
    }
}
