// crates/deploy-gate-core/src/ensemble/bayesian.rs
// ============================================================================
// Module: Bayesian Estimator
// Description: Beta-Binomial posterior over recent run outcomes.
// Purpose: Provide a failure estimate with calibrated uncertainty.
// Dependencies: crate::{ensemble, interfaces}
// ============================================================================

//! ## Overview
//! The prior is a Beta distribution centred on the heuristic failure
//! probability with a fixed pseudo-count. Each failed run in the history
//! sequence adds to `alpha`, each passed run to `beta`. The reported interval
//! is a normal approximation of the posterior, clamped to `[0, 1]`.

use super::BayesianEstimate;
use super::features::EnsembleFeatures;
use super::heuristic::heuristic_failure_probability;
use crate::core::SignalKind;
use crate::interfaces::FailurePredictor;
use crate::interfaces::PredictorError;
use crate::interfaces::PredictorOutput;

/// Default prior pseudo-count.
pub const DEFAULT_PRIOR_STRENGTH: f64 = 4.0;
/// z-score of the two-sided 95% interval.
const Z_95: f64 = 1.96;
/// Prior mean bounds that keep both Beta parameters positive.
const PRIOR_MEAN_BOUNDS: (f64, f64) = (0.01, 0.99);

/// Beta-Binomial failure estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BetaBayesianEstimator {
    /// Prior pseudo-count.
    prior_strength: f64,
}

impl BetaBayesianEstimator {
    /// Creates an estimator with the given prior strength.
    ///
    /// # Errors
    ///
    /// Returns [`PredictorError::ModelUnavailable`] when the strength is not
    /// finite and positive.
    pub fn new(prior_strength: f64) -> Result<Self, PredictorError> {
        if !(prior_strength.is_finite() && prior_strength > 0.0) {
            return Err(PredictorError::ModelUnavailable(format!(
                "prior strength {prior_strength} must be positive"
            )));
        }
        Ok(Self {
            prior_strength,
        })
    }

    /// Computes the posterior estimate for the given features.
    #[must_use]
    #[allow(clippy::cast_precision_loss, reason = "History window is at most ten entries.")]
    pub fn estimate(&self, features: &EnsembleFeatures) -> BayesianEstimate {
        let prior_mean =
            heuristic_failure_probability(features).clamp(PRIOR_MEAN_BOUNDS.0, PRIOR_MEAN_BOUNDS.1);
        let failures = f64::from(features.sequence_failures());
        let passes = features.sequence.len() as f64 - failures;
        let alpha = prior_mean * self.prior_strength + failures;
        let beta = (1.0 - prior_mean) * self.prior_strength + passes;
        let total = alpha + beta;
        let mean = alpha / total;
        let variance = alpha * beta / (total * total * (total + 1.0));
        let margin = Z_95 * variance.sqrt();
        BayesianEstimate {
            mean,
            variance,
            ci_low: (mean - margin).max(0.0),
            ci_high: (mean + margin).min(1.0),
        }
    }
}

impl Default for BetaBayesianEstimator {
    fn default() -> Self {
        Self {
            prior_strength: DEFAULT_PRIOR_STRENGTH,
        }
    }
}

impl FailurePredictor for BetaBayesianEstimator {
    fn signal(&self) -> SignalKind {
        SignalKind::Bayesian
    }

    fn predict(&self, features: &EnsembleFeatures) -> Result<PredictorOutput, PredictorError> {
        Ok(PredictorOutput::Bayesian(self.estimate(features)))
    }
}
