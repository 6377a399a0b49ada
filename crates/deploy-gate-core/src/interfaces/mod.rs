// crates/deploy-gate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Deploy Gate Interfaces
// Description: Capability interfaces for optional enrichment and predictors.
// Purpose: Define the contract surfaces the decision engine consumes.
// Dependencies: crate::{core, ensemble, scoring}
// ============================================================================

//! ## Overview
//! Optional collaborators plug into the engine through these traits. They are
//! resolved once when the engine is built and every call is guarded: an error,
//! panic, or timeout makes the signal unavailable for that decision and never
//! fails the decision itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::SignalKind;
use crate::ensemble::BayesianEstimate;
use crate::ensemble::EnsembleFeatures;
use crate::ensemble::MultiTaskEstimate;
use crate::scoring::FileRiskAssessment;

// ============================================================================
// SECTION: File Risk Index
// ============================================================================

/// File risk lookup errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileRiskError {
    /// The path could not be resolved to a file type.
    #[error("file type unresolved for {0}")]
    Unresolved(String),
    /// The index backend reported an error.
    #[error("file risk index error: {0}")]
    Index(String),
}

/// External per-file risk index.
pub trait FileRiskIndex: Send + Sync {
    /// Resolves a changed path into a file type and a risk score in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`FileRiskError`] when the path cannot be assessed.
    fn assess(&self, path: &str) -> Result<FileRiskAssessment, FileRiskError>;
}

// ============================================================================
// SECTION: Failure Predictors
// ============================================================================

/// Raw output of a failure predictor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PredictorOutput {
    /// Single failure probability in `[0, 1]`.
    Probability(f64),
    /// Per-task probabilities from a multi-task model.
    MultiTask(MultiTaskEstimate),
    /// Posterior summary from a Bayesian estimator.
    Bayesian(BayesianEstimate),
}

/// Predictor failures. All variants degrade the signal to "unavailable".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictorError {
    /// The model is not loaded or not configured.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
    /// The feature vector does not match the model contract.
    #[error("invalid features: {0}")]
    InvalidFeatures(String),
    /// Inference failed at runtime.
    #[error("inference failed: {0}")]
    Inference(String),
}

/// Pluggable failure-probability predictor.
pub trait FailurePredictor: Send + Sync {
    /// Returns the ensemble slot this predictor fills.
    fn signal(&self) -> SignalKind;

    /// Produces a prediction for the given features.
    ///
    /// # Errors
    ///
    /// Returns [`PredictorError`] when the prediction cannot be produced.
    fn predict(&self, features: &EnsembleFeatures) -> Result<PredictorOutput, PredictorError>;
}
