// crates/deploy-gate-core/src/lib.rs
// ============================================================================
// Module: Deploy Gate Core Library
// Description: Public API surface for the Deploy Gate core.
// Purpose: Expose data contracts, scorers, ensemble, fusion, and the decision engine.
// Dependencies: crate::{audit, core, ensemble, fusion, guard, interfaces, runtime, scoring}
// ============================================================================

//! ## Overview
//! Deploy Gate core turns a changed-file summary, a quality report, and a
//! short window of historical runs into a single admit/block deployment
//! decision. The deterministic scorers always run; the ML ensemble and the
//! fusion step are optional and degrade to the deterministic score when any
//! component is missing, slow, or broken. Every decision can be recorded by an
//! injected [`AuditLogger`] and exported as a hashed JSON artifact.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod core;
pub mod ensemble;
pub mod fusion;
mod guard;
pub mod interfaces;
pub mod runtime;
pub mod scoring;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use audit::AuditEntry;
pub use audit::AuditError;
pub use audit::AuditLogger;
pub use audit::AuditRecord;
pub use audit::AuditRun;
pub use audit::AuditStats;
pub use audit::FinalScoreRecord;
pub use ensemble::BayesianEstimate;
pub use ensemble::EnsembleConfig;
pub use ensemble::EnsembleFeatures;
pub use ensemble::EnsemblePrediction;
pub use ensemble::EnsemblePredictor;
pub use ensemble::EnsembleWeights;
pub use ensemble::ModelKind;
pub use ensemble::ModelSources;
pub use ensemble::MultiTaskEstimate;
pub use ensemble::PredictorRegistry;
pub use fusion::FusionConfig;
pub use fusion::FusionContext;
pub use fusion::FusionEngine;
pub use fusion::FusionError;
pub use fusion::FusionResult;
pub use interfaces::FailurePredictor;
pub use interfaces::FileRiskError;
pub use interfaces::FileRiskIndex;
pub use interfaces::PredictorError;
pub use interfaces::PredictorOutput;
pub use runtime::DecisionEngine;
pub use runtime::DecisionError;
pub use runtime::EngineConfig;
pub use scoring::FileRiskAssessment;
pub use scoring::FileRiskConfig;
pub use scoring::FileRiskRule;
pub use scoring::FileRiskSummary;
pub use scoring::RuleFileRiskIndex;
pub use scoring::analyze_baseline_stability;
pub use scoring::classify_risk;
pub use scoring::score_test_impact;
