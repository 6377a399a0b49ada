// crates/deploy-gate-core/src/scoring/impact.rs
// ============================================================================
// Module: Test Impact Scorer
// Description: Converts a quality report into a 0-100 impact score.
// Purpose: Apply severity caps, enforcement penalties, and gradual degradation.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Severity caps are a hard ceiling applied first. Enforcement penalties then
//! subtract regardless of the cap. The gradual per-failure penalty only
//! applies when no cap was hit, so a severe report is not penalized twice.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::QualityReport;
use crate::core::TestImpact;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Score ceiling when any critical failure is present.
pub const CRITICAL_CAP: f64 = 50.0;
/// Score ceiling when any high failure is present (and no critical).
pub const HIGH_CAP: f64 = 65.0;
/// Penalty for a failed Lighthouse gate.
pub const LIGHTHOUSE_PENALTY: f64 = 10.0;
/// Penalty for a failed Web Vitals gate.
pub const WEB_VITALS_PENALTY: f64 = 10.0;
/// Penalty for a failed baseline comparison.
pub const BASELINE_PENALTY: f64 = 15.0;
/// Penalty per failure for uncapped reports.
pub const PER_FAILURE_PENALTY: f64 = 3.0;
/// Maximum gradual failure penalty.
pub const MAX_FAILURE_PENALTY: f64 = 30.0;

// ============================================================================
// SECTION: Scoring
// ============================================================================

/// Scores the impact of a quality report on deployment confidence.
#[must_use]
pub fn score_test_impact(report: &QualityReport) -> TestImpact {
    let metrics = &report.metrics;
    let mut score: f64 = 100.0;
    let mut capped_by_severity = false;

    if metrics.critical > 0 {
        score = score.min(CRITICAL_CAP);
        capped_by_severity = true;
    } else if metrics.high > 0 {
        score = score.min(HIGH_CAP);
        capped_by_severity = true;
    }

    if let Some(enforcement) = &report.enforcement {
        if !enforcement.lighthouse_passed {
            score -= LIGHTHOUSE_PENALTY;
        }
        if !enforcement.web_vitals_passed {
            score -= WEB_VITALS_PENALTY;
        }
        if !enforcement.baseline_comparison_passed {
            score -= BASELINE_PENALTY;
        }
    }

    if !capped_by_severity && metrics.total_issues > 0 {
        score -= (f64::from(metrics.total_issues) * PER_FAILURE_PENALTY).min(MAX_FAILURE_PENALTY);
    }

    TestImpact {
        score: score.clamp(0.0, 100.0),
        critical_failures: metrics.critical,
        high_failures: metrics.high,
        total_failures: metrics.total_issues,
        capped_by_severity,
    }
}
