// crates/deploy-gate-core/src/runtime/reasoning.rs
// ============================================================================
// Module: Decision Reasoning
// Description: Ordered, human-readable explanation of a decision.
// Purpose: Keep reasoning text stable so identical inputs explain identically.
// Dependencies: crate::{core, scoring}
// ============================================================================

//! ## Overview
//! Lines are emitted in a fixed order: risk, file risk, test impact, baseline
//! stability, confidence against threshold, ML signals, warnings, verdict.

use crate::core::BaselineStability;
use crate::core::DegradedSignal;
use crate::core::MlAssessment;
use crate::core::RiskClassification;
use crate::core::SignalKind;
use crate::core::TestImpact;
use crate::core::Trend;
use crate::scoring::FileRiskSummary;

/// Volatility above which a warning is emitted.
pub const HIGH_VOLATILITY: f64 = 0.5;
/// Reasoning line used when ML was requested but no model signal was available.
pub const ML_UNAVAILABLE: &str = "ML ensemble unavailable (heuristic only)";

/// Everything the reasoning lines are derived from.
pub(crate) struct ReasoningInputs<'a> {
    /// Risk classification.
    pub risk: &'a RiskClassification,
    /// File risk summary when enrichment succeeded.
    pub file_risk: Option<&'a FileRiskSummary>,
    /// Test impact.
    pub test_impact: &'a TestImpact,
    /// Baseline stability.
    pub stability: &'a BaselineStability,
    /// Final confidence.
    pub confidence: f64,
    /// Required confidence.
    pub required_confidence: f64,
    /// Whether ML was enabled for this decision.
    pub ml_requested: bool,
    /// ML assessment when available.
    pub ml: Option<&'a MlAssessment>,
    /// Unavailable optional signals.
    pub degraded: &'a [DegradedSignal],
    /// Verdict.
    pub can_deploy: bool,
}

/// Builds the reasoning lines for a decision.
pub(crate) fn build_reasoning(inputs: &ReasoningInputs<'_>) -> Vec<String> {
    let mut lines = Vec::new();
    let risk = inputs.risk;

    if risk.dominant_file_types.is_empty() {
        lines.push(format!("Risk: {} (weight {:.1}); no changed files", risk.category, risk.weight));
    } else {
        lines.push(format!(
            "Risk: {} (weight {:.1}); dominant file types: {}",
            risk.category,
            risk.weight,
            risk.dominant_file_types.join(", ")
        ));
    }
    if let Some(summary) = inputs.file_risk {
        lines.push(format!(
            "File risk: {} critical of {} assessed files, average risk {:.2} (penalty {:.1})",
            summary.critical_file_count, summary.assessed_files, summary.average_risk, summary.penalty
        ));
    } else if let Some(entry) = find_degraded(inputs.degraded, SignalKind::FileRisk) {
        lines.push(format!("File risk enrichment unavailable: {}", entry.reason));
    }

    let impact = inputs.test_impact;
    let mut impact_line = format!(
        "Test impact: {:.1}/100 ({} failures, {} critical, {} high)",
        impact.score, impact.total_failures, impact.critical_failures, impact.high_failures
    );
    if impact.capped_by_severity {
        impact_line.push_str("; capped due to critical/high severity failures");
    }
    lines.push(impact_line);

    let stability = inputs.stability;
    lines.push(format!(
        "Baseline stability: {:.1}/100 ({}, volatility {:.2}, {} regressions, {} improvements over {} runs)",
        stability.stability_score,
        stability.trend.as_str(),
        stability.volatility,
        stability.regression_count,
        stability.improvement_count,
        stability.sample_size
    ));

    lines.push(format!(
        "Confidence {:.1}% vs required {:.0}% for {} risk",
        inputs.confidence, inputs.required_confidence, risk.category
    ));

    if inputs.ml_requested {
        push_ml_lines(&mut lines, inputs.ml, inputs.degraded);
    }

    if impact.critical_failures > 0 {
        lines.push(format!("Warning: {} critical failures present", impact.critical_failures));
    }
    if impact.high_failures > 0 {
        lines.push(format!("Warning: {} high severity failures present", impact.high_failures));
    }
    if stability.volatility > HIGH_VOLATILITY {
        lines.push(format!("Warning: baseline volatility {:.2} is high", stability.volatility));
    }
    if stability.trend == Trend::Degrading {
        lines.push("Warning: baseline trend is degrading".to_string());
    }

    if inputs.can_deploy {
        lines.push("Deployment allowed".to_string());
    } else {
        lines.push(format!(
            "Deployment blocked: confidence {:.1}% below required {:.0}%",
            inputs.confidence, inputs.required_confidence
        ));
    }
    lines
}

/// Appends ML lines, or the unavailability line.
fn push_ml_lines(lines: &mut Vec<String>, ml: Option<&MlAssessment>, degraded: &[DegradedSignal]) {
    let Some(assessment) = ml else {
        lines.push(ML_UNAVAILABLE.to_string());
        return;
    };
    let ensemble = &assessment.ensemble;
    lines.push(format!(
        "ML ensemble failure probability {:.1}% from {} model signals (ensemble confidence {:.1}%)",
        ensemble.adjusted_failure_probability * 100.0,
        ensemble.model_signals().count(),
        assessment.ensemble_confidence
    ));
    if let Some(adjustment) = ensemble.bayesian_adjustment.filter(|value| value.abs() > f64::EPSILON) {
        lines.push(format!("Bayesian uncertainty adjustment {adjustment:+.3}"));
    }
    for entry in degraded.iter().filter(|entry| !matches!(entry.signal, SignalKind::FileRisk | SignalKind::Fusion)) {
        lines.push(format!("Signal {} unavailable: {}", entry.signal, entry.reason));
    }
    match &assessment.fusion {
        Some(fusion) => lines.push(format!(
            "Fusion score {:.2} (confidence {:.2})",
            fusion.fusion_score, fusion.confidence
        )),
        None => {
            let reason = find_degraded(degraded, SignalKind::Fusion).map_or("not run", |entry| entry.reason.as_str());
            lines.push(format!("Fusion unavailable ({reason}); using ensemble confidence"));
        }
    }
}

/// Returns the degraded entry for a signal.
fn find_degraded(degraded: &[DegradedSignal], signal: SignalKind) -> Option<&DegradedSignal> {
    degraded.iter().find(|entry| entry.signal == signal)
}
