// crates/deploy-gate-core/src/fusion.rs
// ============================================================================
// Module: Fusion Engine
// Description: Second-stage fusion of ensemble output with decision context.
// Purpose: Calibrate ensemble trust by agreement, context, and task risk.
// Dependencies: crate::{core, ensemble}, serde, thiserror
// ============================================================================

//! ## Overview
//! Fusion scores how far the ensemble can be trusted for this change. It
//! rewards consensus safety and agreement between members, folds in
//! deterministic context, and penalizes multi-task security or downtime risk.
//! Member weights are recalibrated toward signals that agree with the
//! consensus. Fusion is pure; the decision engine runs it behind a guard and
//! keeps the ensemble confidence when it fails.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::BaselineStability;
use crate::core::RiskClassification;
use crate::core::SignalKind;
use crate::ensemble::EnsemblePrediction;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default share of the final confidence taken from the ensemble confidence.
pub const DEFAULT_DETERMINISTIC_RATIO: f64 = 0.6;
/// Default disagreement added when NN and Bayesian disagree on direction.
pub const DEFAULT_DIRECTION_PENALTY: f64 = 0.15;
/// Default fusion time budget.
pub const DEFAULT_FUSION_TIMEOUT: Duration = Duration::from_millis(500);

/// Weight of consensus safety in the fusion score.
const CONSENSUS_WEIGHT: f64 = 0.5;
/// Weight of the context score in the fusion score.
const CONTEXT_WEIGHT: f64 = 0.3;
/// Weight of agreement in the fusion score.
const AGREEMENT_WEIGHT: f64 = 0.2;
/// Scale of the multi-task risk penalty.
const MTL_PENALTY_SCALE: f64 = 0.1;
/// Regression count that saturates the context penalty.
const REGRESSION_SATURATION: f64 = 5.0;
/// Lowest classifier risk weight.
const MIN_RISK_WEIGHT: f64 = 0.1;
/// Span between the lowest and highest classifier risk weights.
const RISK_WEIGHT_SPAN: f64 = 0.3;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Fusion settings.
#[derive(Debug, Clone, PartialEq)]
pub struct FusionConfig {
    /// Share of the final confidence taken from the ensemble confidence.
    pub deterministic_ratio: f64,
    /// Disagreement added when NN and Bayesian disagree on direction.
    pub direction_penalty: f64,
    /// Time budget for the fusion step.
    pub timeout: Duration,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            deterministic_ratio: DEFAULT_DETERMINISTIC_RATIO,
            direction_penalty: DEFAULT_DIRECTION_PENALTY,
            timeout: DEFAULT_FUSION_TIMEOUT,
        }
    }
}

/// Deterministic context passed to fusion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FusionContext {
    /// Regressions in the recent history window.
    pub recent_regressions: u32,
    /// Stability score scaled to `[0, 1]`.
    pub stability_ratio: f64,
    /// Classifier risk weight.
    pub risk_weight: f64,
}

impl FusionContext {
    /// Builds the context from deterministic scores.
    #[must_use]
    pub fn from_scores(risk: &RiskClassification, stability: &BaselineStability) -> Self {
        Self {
            recent_regressions: stability.regression_count,
            stability_ratio: stability.stability_score / 100.0,
            risk_weight: risk.weight,
        }
    }
}

/// Fusion output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FusionResult {
    /// Fusion score in `[0, 1]`.
    pub fusion_score: f64,
    /// Recalibrated member weights; sums to one.
    pub weights: BTreeMap<String, f64>,
    /// Ordered explanation of the score.
    pub reasoning: Vec<String>,
    /// Confidence in the fusion score, in `[0, 1]`.
    pub confidence: f64,
}

/// Fusion failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FusionError {
    /// An input was not finite.
    #[error("non-finite fusion input: {0}")]
    NonFinite(String),
    /// No model-backed signal was available.
    #[error("no model signals to fuse")]
    NoSignals,
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Fuses ensemble output with deterministic context.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FusionEngine {
    /// Fusion settings.
    config: FusionConfig,
}

impl FusionEngine {
    /// Creates a fusion engine.
    #[must_use]
    pub const fn new(config: FusionConfig) -> Self {
        Self {
            config,
        }
    }

    /// Returns the fusion settings.
    #[must_use]
    pub const fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Fuses a prediction with its context.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError`] when inputs are not finite or no model signal
    /// is present.
    pub fn fuse(
        &self,
        prediction: &EnsemblePrediction,
        context: &FusionContext,
    ) -> Result<FusionResult, FusionError> {
        if !prediction.has_model_signal() {
            return Err(FusionError::NoSignals);
        }
        check_finite("adjustedFailureProbability", prediction.adjusted_failure_probability)?;
        check_finite("stabilityRatio", context.stability_ratio)?;
        check_finite("riskWeight", context.risk_weight)?;
        let signals = prediction.signal_probabilities();
        for (signal, value) in &signals {
            check_finite(signal.as_str(), *value)?;
        }

        let consensus = 1.0 - prediction.adjusted_failure_probability;

        let (low, high) = signals
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), (_, value)| (low.min(*value), high.max(*value)));
        let direction_conflict = match (prediction.nn, prediction.bayesian) {
            (Some(nn), Some(bayesian)) => (nn - 0.5) * (bayesian.mean - 0.5) < 0.0,
            _ => false,
        };
        let mut disagreement = high - low;
        if direction_conflict {
            disagreement += self.config.direction_penalty;
        }
        let agreement = 1.0 - disagreement.clamp(0.0, 1.0);

        let regression_term = 1.0 - (f64::from(context.recent_regressions) / REGRESSION_SATURATION).min(1.0);
        let risk_term = 1.0 - (context.risk_weight - MIN_RISK_WEIGHT) / RISK_WEIGHT_SPAN;
        let context_score =
            (0.5 * context.stability_ratio + 0.3 * regression_term + 0.2 * risk_term).clamp(0.0, 1.0);

        let mtl_penalty =
            prediction.mtl.map_or(0.0, |estimate| MTL_PENALTY_SCALE * estimate.security.max(estimate.downtime));

        let fusion_score = (CONSENSUS_WEIGHT * consensus + CONTEXT_WEIGHT * context_score
            + AGREEMENT_WEIGHT * agreement
            - mtl_penalty)
            .clamp(0.0, 1.0);
        let interval_width = prediction.bayesian.map_or(0.0, |estimate| estimate.interval_width());
        let confidence = (agreement * (1.0 - interval_width / 2.0)).clamp(0.0, 1.0);

        let mut reasoning = vec![
            format!("Consensus safety {:.1}% across {} signals", consensus * 100.0, signals.len()),
            format!("Signal agreement {:.1}%", agreement * 100.0),
        ];
        if direction_conflict {
            reasoning.push("Neural network and Bayesian estimate disagree on failure direction".to_string());
        }
        reasoning.push(format!(
            "Context score {context_score:.2} (stability {:.2}, {} recent regressions)",
            context.stability_ratio, context.recent_regressions
        ));
        if mtl_penalty > 0.0 {
            reasoning.push(format!("Multi-task risk penalty {mtl_penalty:.3}"));
        }
        reasoning.push(format!("Fusion score {fusion_score:.2} with confidence {confidence:.2}"));

        Ok(FusionResult {
            fusion_score,
            weights: calibrate_weights(prediction, &signals),
            reasoning,
            confidence,
        })
    }

    /// Blends ensemble confidence (`[0, 100]`) with a fusion score (`[0, 1]`).
    #[must_use]
    pub fn final_confidence(&self, ensemble_confidence: f64, fusion_score: f64) -> f64 {
        let ratio = self.config.deterministic_ratio;
        ((ratio * ensemble_confidence / 100.0 + (1.0 - ratio) * fusion_score) * 100.0).clamp(0.0, 100.0)
    }
}

/// Scales each member weight by its agreement with the adjusted consensus.
fn calibrate_weights(prediction: &EnsemblePrediction, signals: &[(SignalKind, f64)]) -> BTreeMap<String, f64> {
    let target = prediction.adjusted_failure_probability;
    let scaled: Vec<(&str, f64)> = signals
        .iter()
        .map(|(signal, value)| {
            let base = prediction.weights.get(signal.as_str()).copied().unwrap_or(0.0);
            (signal.as_str(), base * (1.0 - (value - target).abs()).max(0.0))
        })
        .collect();
    let total: f64 = scaled.iter().map(|(_, weight)| weight).sum();
    if total > 0.0 {
        scaled.into_iter().map(|(name, weight)| (name.to_string(), weight / total)).collect()
    } else {
        prediction.weights.clone()
    }
}

/// Rejects non-finite inputs.
fn check_finite(label: &str, value: f64) -> Result<(), FusionError> {
    if value.is_finite() { Ok(()) } else { Err(FusionError::NonFinite(label.to_string())) }
}
