// crates/deploy-gate-core/src/runtime/engine.rs
// ============================================================================
// Module: Deploy Gate Decision Engine
// Description: Linear decision pipeline from request to admit/block verdict.
// Purpose: Combine deterministic scores with optional enrichment and ML.
// Dependencies: crate::{audit, core, ensemble, fusion, guard, interfaces, scoring}
// ============================================================================

//! ## Overview
//! The decision engine is the single canonical execution path for Deploy
//! Gate. Every binding (library, CLI) calls [`DecisionEngine::decide`], which
//! moves through classified, scored, optionally ML-enriched, thresholded, and
//! decided states in that order. Request validation is the only hard error;
//! every optional component is guarded and degrades to the deterministic
//! score.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::reasoning::ReasoningInputs;
use super::reasoning::build_reasoning;
use crate::audit::AuditLogger;
use crate::audit::FinalScoreRecord;
use crate::core::BaselineStability;
use crate::core::DecisionFactors;
use crate::core::DecisionRequest;
use crate::core::DegradedSignal;
use crate::core::DeploymentDecision;
use crate::core::InputError;
use crate::core::MlAssessment;
use crate::core::RiskClassification;
use crate::core::SignalKind;
use crate::core::TestImpact;
use crate::ensemble::EnsembleConfig;
use crate::ensemble::EnsembleFeatures;
use crate::ensemble::EnsemblePredictor;
use crate::ensemble::PredictorRegistry;
use crate::fusion::FusionConfig;
use crate::fusion::FusionContext;
use crate::fusion::FusionEngine;
use crate::guard::run_guarded;
use crate::interfaces::FileRiskError;
use crate::interfaces::FileRiskIndex;
use crate::scoring::FileRiskConfig;
use crate::scoring::FileRiskSummary;
use crate::scoring::analyze_baseline_stability;
use crate::scoring::assess_changed_files;
use crate::scoring::classify_risk;
use crate::scoring::score_test_impact;
use crate::scoring::summarize_file_risk;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Weight of the inverted risk weight in the base score.
pub const RISK_FACTOR_WEIGHT: f64 = 0.35;
/// Weight of the test impact score in the base score.
pub const IMPACT_FACTOR_WEIGHT: f64 = 0.40;
/// Weight of the stability score in the base score.
pub const STABILITY_FACTOR_WEIGHT: f64 = 0.25;
/// Default share of ensemble safety blended into the deterministic score.
pub const DEFAULT_ML_BLEND: f64 = 0.3;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Decision engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Whether ML runs when the request does not say.
    pub ml_enabled: bool,
    /// Share of ensemble safety blended into the deterministic score.
    pub ml_blend: f64,
    /// Ensemble settings.
    pub ensemble: EnsembleConfig,
    /// Fusion settings.
    pub fusion: FusionConfig,
    /// File risk enrichment settings.
    pub file_risk: FileRiskConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ml_enabled: false,
            ml_blend: DEFAULT_ML_BLEND,
            ensemble: EnsembleConfig::default(),
            fusion: FusionConfig::default(),
            file_risk: FileRiskConfig::default(),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Decision failures. Only invalid input is a hard error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecisionError {
    /// The request violated an input contract.
    #[error("invalid decision request: {0}")]
    InvalidInput(#[from] InputError),
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Deployment decision engine.
pub struct DecisionEngine {
    /// Engine configuration.
    config: EngineConfig,
    /// Ensemble over the resolved predictor registry.
    ensemble: EnsemblePredictor,
    /// Fusion step.
    fusion: FusionEngine,
    /// Optional per-file risk index.
    file_risk_index: Option<Arc<dyn FileRiskIndex>>,
    /// Optional audit logger.
    audit: Option<Arc<AuditLogger>>,
}

impl fmt::Debug for DecisionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecisionEngine")
            .field("config", &self.config)
            .field("registry", self.ensemble.registry())
            .field("file_risk_index", &self.file_risk_index.is_some())
            .field("audit", &self.audit.is_some())
            .finish()
    }
}

impl DecisionEngine {
    /// Creates an engine over a resolved predictor registry.
    #[must_use]
    pub fn new(config: EngineConfig, registry: PredictorRegistry) -> Self {
        let ensemble = EnsemblePredictor::new(registry, config.ensemble.clone());
        let fusion = FusionEngine::new(config.fusion.clone());
        Self {
            config,
            ensemble,
            fusion,
            file_risk_index: None,
            audit: None,
        }
    }

    /// Attaches a per-file risk index.
    #[must_use]
    pub fn with_file_risk_index(mut self, index: Arc<dyn FileRiskIndex>) -> Self {
        self.file_risk_index = Some(index);
        self
    }

    /// Attaches an audit logger.
    #[must_use]
    pub fn with_audit_logger(mut self, logger: Arc<AuditLogger>) -> Self {
        self.audit = Some(logger);
        self
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Produces a deployment decision for a request.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError::InvalidInput`] when the request fails
    /// validation. Optional component failures never surface as errors.
    pub async fn decide(&self, request: &DecisionRequest) -> Result<DeploymentDecision, DecisionError> {
        request.validate()?;

        // Classified and scored.
        let risk = classify_risk(&request.file_stats);
        let test_impact = score_test_impact(&request.quality_report);
        let stability = analyze_baseline_stability(&request.history);
        if let Some(audit) = &self.audit {
            audit.record_risk_analysis(&risk);
            audit.record_test_impact(&test_impact);
            audit.record_baseline_stability(&stability);
        }

        let factors = DecisionFactors {
            risk_weight: (100.0 - risk.weight * 100.0) * RISK_FACTOR_WEIGHT,
            test_impact: test_impact.score * IMPACT_FACTOR_WEIGHT,
            baseline_stability: stability.stability_score * STABILITY_FACTOR_WEIGHT,
        };
        let base_score =
            (factors.risk_weight + factors.test_impact + factors.baseline_stability).clamp(0.0, 100.0);

        let mut degraded = Vec::new();
        let file_risk = self.enrich_file_risk(request, &mut degraded).await;
        let deterministic = file_risk
            .as_ref()
            .map_or(base_score, |summary| (base_score - summary.penalty).clamp(0.0, 100.0));

        // ML enriched.
        let ml_requested = request.enable_ml_prediction.unwrap_or(self.config.ml_enabled);
        let mut confidence = deterministic;
        let mut ml_prediction = None;
        if ml_requested
            && let Some((assessment, ml_confidence)) =
                self.assess_ml(request, &risk, &test_impact, &stability, deterministic, &mut degraded).await
        {
            confidence = ml_confidence;
            ml_prediction = Some(assessment);
        }
        let confidence = confidence.clamp(0.0, 100.0);

        // Thresholded and decided.
        let required_confidence = risk.category.required_confidence();
        let can_deploy = confidence >= required_confidence;
        let reasoning = build_reasoning(&ReasoningInputs {
            risk: &risk,
            file_risk: file_risk.as_ref(),
            test_impact: &test_impact,
            stability: &stability,
            confidence,
            required_confidence,
            ml_requested,
            ml: ml_prediction.as_ref(),
            degraded: &degraded,
            can_deploy,
        });

        if let Some(audit) = &self.audit {
            if let Some(assessment) = &ml_prediction {
                audit.record_ml_prediction(assessment);
            }
            for entry in &degraded {
                audit.record_degraded_signal(entry);
            }
            audit.record_final_score(FinalScoreRecord {
                base_score: deterministic,
                confidence,
                required_confidence,
                can_deploy,
                risk_category: risk.category,
            });
        }
        tracing::info!(
            confidence,
            required_confidence,
            can_deploy,
            category = %risk.category,
            degraded = degraded.len(),
            "deployment decision"
        );

        Ok(DeploymentDecision {
            confidence,
            required_confidence,
            can_deploy,
            factors,
            reasoning,
            ml_prediction,
            degraded_signals: degraded,
            risk,
            test_impact,
            baseline_stability: stability,
            file_risk,
        })
    }

    /// Runs the file risk index behind the guard.
    async fn enrich_file_risk(
        &self,
        request: &DecisionRequest,
        degraded: &mut Vec<DegradedSignal>,
    ) -> Option<FileRiskSummary> {
        let index = Arc::clone(self.file_risk_index.as_ref()?);
        let paths = request.changed_files.clone();
        let outcome = run_guarded(self.config.file_risk.timeout, move || {
            Ok::<_, FileRiskError>(assess_changed_files(index.as_ref(), &paths))
        })
        .await;
        let reason = match outcome {
            Ok(assessments) => match summarize_file_risk(&assessments, &self.config.file_risk) {
                Some(summary) => return Some(summary),
                None => "no changed file could be assessed".to_string(),
            },
            Err(failure) => failure.to_string(),
        };
        tracing::warn!(signal = %SignalKind::FileRisk, reason = %reason, "file risk enrichment unavailable");
        degraded.push(DegradedSignal::new(SignalKind::FileRisk, reason));
        None
    }

    /// Runs the ensemble and fusion, returning the assessment and final confidence.
    ///
    /// Returns `None` when no model-backed signal was available.
    async fn assess_ml(
        &self,
        request: &DecisionRequest,
        risk: &RiskClassification,
        test_impact: &TestImpact,
        stability: &BaselineStability,
        deterministic: f64,
        degraded: &mut Vec<DegradedSignal>,
    ) -> Option<(MlAssessment, f64)> {
        let features = EnsembleFeatures::from_scores(request, risk, test_impact, stability);
        let outcome = self.ensemble.predict(&features).await;
        degraded.extend(outcome.degraded);
        let prediction = outcome.prediction;
        if !prediction.has_model_signal() {
            tracing::warn!("no model signal available; keeping deterministic score");
            return None;
        }

        let blend = self.config.ml_blend;
        let ensemble_confidence = (deterministic * (1.0 - blend)
            + (1.0 - prediction.adjusted_failure_probability) * 100.0 * blend)
            .clamp(0.0, 100.0);

        let context = FusionContext::from_scores(risk, stability);
        let engine = self.fusion.clone();
        let fusion_input = prediction.clone();
        let fusion = match run_guarded(self.fusion.config().timeout, move || engine.fuse(&fusion_input, &context))
            .await
        {
            Ok(result) => Some(result),
            Err(failure) => {
                let reason = failure.to_string();
                tracing::warn!(signal = %SignalKind::Fusion, reason = %reason, "fusion unavailable");
                degraded.push(DegradedSignal::new(SignalKind::Fusion, reason));
                None
            }
        };
        let confidence = fusion.as_ref().map_or(ensemble_confidence, |result| {
            self.fusion.final_confidence(ensemble_confidence, result.fusion_score)
        });

        Some((
            MlAssessment {
                ensemble: prediction,
                ensemble_confidence,
                fusion,
            },
            confidence,
        ))
    }
}
