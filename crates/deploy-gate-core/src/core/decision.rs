// crates/deploy-gate-core/src/core/decision.rs
// ============================================================================
// Module: Deploy Gate Decision Types
// Description: Derived scores and the final deployment decision.
// Purpose: Provide the stable, serializable output contract of the engine.
// Dependencies: crate::{ensemble, fusion, scoring}, serde
// ============================================================================

//! ## Overview
//! Every value in this module is derived from request inputs. A
//! [`DeploymentDecision`] carries no timestamps or identifiers so that
//! identical inputs yield identical decisions.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::ensemble::EnsemblePrediction;
use crate::fusion::FusionResult;
use crate::scoring::FileRiskSummary;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Required confidence for critical and high risk changes.
pub const REQUIRED_CONFIDENCE_HIGH: f64 = 90.0;
/// Required confidence for medium risk changes.
pub const REQUIRED_CONFIDENCE_MEDIUM: f64 = 75.0;
/// Required confidence for low risk changes.
pub const REQUIRED_CONFIDENCE_LOW: f64 = 60.0;

// ============================================================================
// SECTION: Risk Classification
// ============================================================================

/// Coarse risk bucket for a set of changed files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    /// Changes touching critical files.
    Critical,
    /// Changes touching high-risk files.
    High,
    /// Changes touching medium-risk files.
    Medium,
    /// Low-risk or documentation-only changes.
    Low,
}

impl RiskCategory {
    /// Returns the confidence threshold a change in this category must meet.
    #[must_use]
    pub const fn required_confidence(self) -> f64 {
        match self {
            Self::Critical | Self::High => REQUIRED_CONFIDENCE_HIGH,
            Self::Medium => REQUIRED_CONFIDENCE_MEDIUM,
            Self::Low => REQUIRED_CONFIDENCE_LOW,
        }
    }

    /// Returns the lowercase wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk classification derived from [`crate::FileTypeStats`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskClassification {
    /// Risk category.
    pub category: RiskCategory,
    /// Risk weight, one of `0.1`, `0.2`, `0.3`, `0.4`.
    pub weight: f64,
    /// Up to three most frequent file types.
    pub dominant_file_types: Vec<String>,
}

// ============================================================================
// SECTION: Test Impact
// ============================================================================

/// Impact score derived from a [`crate::QualityReport`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestImpact {
    /// Score in `[0, 100]`; higher is healthier.
    pub score: f64,
    /// Critical severity failures.
    pub critical_failures: u32,
    /// High severity failures.
    pub high_failures: u32,
    /// Total reported failures.
    pub total_failures: u32,
    /// True when a severity cap limited the score.
    pub capped_by_severity: bool,
}

// ============================================================================
// SECTION: Baseline Stability
// ============================================================================

/// Direction of recent baseline comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    /// Improvements outnumber regressions by more than two.
    Improving,
    /// Neither direction dominates.
    Stable,
    /// Regressions outnumber improvements by more than two.
    Degrading,
}

impl Trend {
    /// Returns the lowercase wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Stable => "stable",
            Self::Degrading => "degrading",
        }
    }
}

/// Stability analysis over the recent history window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineStability {
    /// Score in `[0, 100]`.
    pub stability_score: f64,
    /// Performance volatility in `[0, 1]`.
    pub volatility: f64,
    /// Failed baseline comparisons in the window.
    pub regression_count: u32,
    /// Passed baseline comparisons in the window.
    pub improvement_count: u32,
    /// Trend direction.
    pub trend: Trend,
    /// Number of history entries analyzed.
    pub sample_size: u32,
}

// ============================================================================
// SECTION: Degraded Signals
// ============================================================================

/// Optional signals that can be unavailable for a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// Per-file risk enrichment.
    #[serde(rename = "fileRisk")]
    FileRisk,
    /// Feed-forward neural network.
    #[serde(rename = "nn")]
    NeuralNet,
    /// Sequence (LSTM) model.
    #[serde(rename = "lstm")]
    Sequence,
    /// Multi-task model.
    #[serde(rename = "mtl")]
    MultiTask,
    /// Bayesian estimator.
    #[serde(rename = "bayesian")]
    Bayesian,
    /// Closed-form heuristic (never degraded).
    #[serde(rename = "heuristic")]
    Heuristic,
    /// Second-stage fusion.
    #[serde(rename = "fusion")]
    Fusion,
}

impl SignalKind {
    /// Returns the wire label of the signal.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FileRisk => "fileRisk",
            Self::NeuralNet => "nn",
            Self::Sequence => "lstm",
            Self::MultiTask => "mtl",
            Self::Bayesian => "bayesian",
            Self::Heuristic => "heuristic",
            Self::Fusion => "fusion",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An optional signal that was unavailable, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DegradedSignal {
    /// Signal that was unavailable.
    pub signal: SignalKind,
    /// Short human-readable reason.
    pub reason: String,
}

impl DegradedSignal {
    /// Creates a degraded signal record.
    #[must_use]
    pub fn new(signal: SignalKind, reason: impl Into<String>) -> Self {
        Self {
            signal,
            reason: reason.into(),
        }
    }
}

// ============================================================================
// SECTION: Deployment Decision
// ============================================================================

/// Weighted contributions of the deterministic signals to the base score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionFactors {
    /// Contribution of the inverted risk weight.
    pub risk_weight: f64,
    /// Contribution of the test impact score.
    pub test_impact: f64,
    /// Contribution of the baseline stability score.
    pub baseline_stability: f64,
}

/// ML output attached to a decision when at least one model signal was available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MlAssessment {
    /// Ensemble prediction.
    pub ensemble: EnsemblePrediction,
    /// Confidence after blending the ensemble into the deterministic score.
    pub ensemble_confidence: f64,
    /// Fusion result when the fusion step succeeded.
    pub fusion: Option<FusionResult>,
}

/// Final admit/block decision for a deployment.
///
/// # Invariants
/// - `0 <= confidence <= 100`.
/// - `can_deploy == (confidence >= required_confidence)`.
/// - `required_confidence` follows [`RiskCategory::required_confidence`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentDecision {
    /// Final confidence in `[0, 100]`.
    pub confidence: f64,
    /// Threshold selected from the risk category.
    pub required_confidence: f64,
    /// Whether the deployment may proceed.
    pub can_deploy: bool,
    /// Deterministic factor contributions.
    pub factors: DecisionFactors,
    /// Ordered, human-readable reasoning.
    pub reasoning: Vec<String>,
    /// ML assessment when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ml_prediction: Option<MlAssessment>,
    /// Optional signals that were unavailable.
    #[serde(default)]
    pub degraded_signals: Vec<DegradedSignal>,
    /// Risk classification.
    pub risk: RiskClassification,
    /// Test impact.
    pub test_impact: TestImpact,
    /// Baseline stability.
    pub baseline_stability: BaselineStability,
    /// Per-file risk enrichment when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_risk: Option<FileRiskSummary>,
}

impl DeploymentDecision {
    /// Returns true when the given signal was unavailable for this decision.
    #[must_use]
    pub fn is_degraded(&self, signal: SignalKind) -> bool {
        self.degraded_signals.iter().any(|entry| entry.signal == signal)
    }
}
