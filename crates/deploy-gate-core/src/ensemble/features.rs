// crates/deploy-gate-core/src/ensemble/features.rs
// ============================================================================
// Module: Ensemble Features
// Description: Normalized feature vector and history sequence for predictors.
// Purpose: Give every predictor the same fixed-shape, bounded input.
// Dependencies: crate::{core, scoring}, serde
// ============================================================================

//! ## Overview
//! [`EnsembleFeatures`] holds [`FEATURE_COUNT`] values in `[0, 1]` plus one
//! [`SEQUENCE_WIDTH`]-wide row per recent history entry, oldest first. The
//! first three values are the heuristic inputs, so every predictor can
//! recover the deterministic view of the change.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::BaselineStability;
use crate::core::DecisionRequest;
use crate::core::HistoryEntry;
use crate::core::RiskClassification;
use crate::core::RunStatus;
use crate::core::TestImpact;
use crate::scoring::risk::HIGH_WEIGHT;
use crate::scoring::stability::STABILITY_WINDOW;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Number of values in the flat feature vector.
pub const FEATURE_COUNT: usize = 12;
/// Number of values per history sequence row.
pub const SEQUENCE_WIDTH: usize = 5;

/// Index of the normalized risk weight.
pub const FEATURE_RISK: usize = 0;
/// Index of the normalized test impact score.
pub const FEATURE_IMPACT: usize = 1;
/// Index of the normalized stability score.
pub const FEATURE_STABILITY: usize = 2;

/// Critical failure count that saturates its feature.
const CRITICAL_SATURATION: f64 = 5.0;
/// High failure count that saturates its feature.
const HIGH_SATURATION: f64 = 10.0;
/// Total issue count that saturates its feature.
const ISSUE_SATURATION: f64 = 50.0;
/// Number of enforcement gates in a quality report.
const ENFORCEMENT_GATES: f64 = 3.0;
/// Neutral value for features without history.
const NEUTRAL: f64 = 0.5;

// ============================================================================
// SECTION: Features
// ============================================================================

/// Predictor input derived from a request and the deterministic scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsembleFeatures {
    /// Flat feature vector.
    pub values: [f64; FEATURE_COUNT],
    /// Per-run rows over the recent history window, oldest first.
    pub sequence: Vec<[f64; SEQUENCE_WIDTH]>,
}

impl EnsembleFeatures {
    /// Builds features from a validated request and its deterministic scores.
    #[must_use]
    #[allow(clippy::cast_precision_loss, reason = "History window is at most ten entries.")]
    pub fn from_scores(
        request: &DecisionRequest,
        risk: &RiskClassification,
        impact: &TestImpact,
        stability: &BaselineStability,
    ) -> Self {
        let window = &request.history[request.history.len().saturating_sub(STABILITY_WINDOW) ..];
        let sample = stability.sample_size.max(1);
        let metrics = &request.quality_report.metrics;

        let enforcement_failures = request.quality_report.enforcement.as_ref().map_or(0.0, |gates| {
            [gates.lighthouse_passed, gates.web_vitals_passed, gates.baseline_comparison_passed]
                .iter()
                .filter(|passed| !**passed)
                .count() as f64
                / ENFORCEMENT_GATES
        });
        let (failure_rate, mean_performance) = if window.is_empty() {
            (NEUTRAL, NEUTRAL)
        } else {
            let failed = window.iter().filter(|entry| entry.status == RunStatus::Failed).count();
            let performance = window.iter().map(|entry| entry.perf_metrics.performance).sum::<f64>();
            (failed as f64 / window.len() as f64, performance / window.len() as f64 / 100.0)
        };

        let values = [
            risk.weight / HIGH_WEIGHT,
            impact.score / 100.0,
            stability.stability_score / 100.0,
            stability.volatility,
            f64::from(stability.regression_count) / f64::from(sample),
            f64::from(stability.improvement_count) / f64::from(sample),
            (f64::from(metrics.critical) / CRITICAL_SATURATION).min(1.0),
            (f64::from(metrics.high) / HIGH_SATURATION).min(1.0),
            (f64::from(metrics.total_issues) / ISSUE_SATURATION).min(1.0),
            enforcement_failures,
            failure_rate,
            mean_performance,
        ];
        Self {
            values,
            sequence: window.iter().map(sequence_row).collect(),
        }
    }

    /// Returns true when every value is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|value| value.is_finite())
            && self.sequence.iter().flatten().all(|value| value.is_finite())
    }

    /// Returns the number of failed runs in the sequence.
    #[must_use]
    pub fn sequence_failures(&self) -> u32 {
        let failed = self.sequence.iter().filter(|row| row[3] >= NEUTRAL).count();
        u32::try_from(failed).unwrap_or(u32::MAX)
    }
}

/// Encodes one history entry as a sequence row.
fn sequence_row(entry: &HistoryEntry) -> [f64; SEQUENCE_WIDTH] {
    let failed = if entry.status == RunStatus::Failed { 1.0 } else { 0.0 };
    let regression = match entry.enforcement.baseline_passed {
        Some(false) => 1.0,
        Some(true) => 0.0,
        None => NEUTRAL,
    };
    [
        entry.perf_metrics.performance / 100.0,
        entry.perf_metrics.accessibility / 100.0,
        entry.perf_metrics.seo / 100.0,
        failed,
        regression,
    ]
}
