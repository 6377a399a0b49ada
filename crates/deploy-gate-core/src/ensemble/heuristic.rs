// crates/deploy-gate-core/src/ensemble/heuristic.rs
// ============================================================================
// Module: Heuristic Predictor
// Description: Closed-form failure probability from deterministic scores.
// Purpose: Provide the always-available ensemble member.
// Dependencies: crate::ensemble::features
// ============================================================================

//! ## Overview
//! The heuristic reads the first three feature values, which carry the
//! normalized risk weight, test impact, and stability score. It needs no
//! model and never fails, so the ensemble always has at least one member.

use super::features::EnsembleFeatures;
use super::features::FEATURE_IMPACT;
use super::features::FEATURE_RISK;
use super::features::FEATURE_STABILITY;

/// Weight of the normalized risk term.
const RISK_TERM: f64 = 0.35;
/// Weight of the inverted impact term.
const IMPACT_TERM: f64 = 0.40;
/// Weight of the inverted stability term.
const STABILITY_TERM: f64 = 0.25;

/// Returns the heuristic failure probability encoded in `features`.
///
/// Equals `0.35 * (riskWeight / 0.4) + 0.40 * (1 - impact / 100) + 0.25 * (1 - stability / 100)`,
/// clamped to `[0, 1]`.
#[must_use]
pub fn heuristic_failure_probability(features: &EnsembleFeatures) -> f64 {
    let risk = features.values[FEATURE_RISK];
    let impact = features.values[FEATURE_IMPACT];
    let stability = features.values[FEATURE_STABILITY];
    (RISK_TERM * risk + IMPACT_TERM * (1.0 - impact) + STABILITY_TERM * (1.0 - stability)).clamp(0.0, 1.0)
}
