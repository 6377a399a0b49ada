// crates/deploy-gate-core/src/core/mod.rs
// ============================================================================
// Module: Deploy Gate Core Types
// Description: Input contracts, derived scores, and decision records.
// Purpose: Provide stable, serializable types shared by every pipeline stage.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Core types are the canonical source of truth for any binding (library,
//! CLI, HTTP) that exposes the engine.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod decision;
pub mod hashing;
pub mod inputs;
pub mod timestamp;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use decision::BaselineStability;
pub use decision::DecisionFactors;
pub use decision::DegradedSignal;
pub use decision::DeploymentDecision;
pub use decision::MlAssessment;
pub use decision::REQUIRED_CONFIDENCE_HIGH;
pub use decision::REQUIRED_CONFIDENCE_LOW;
pub use decision::REQUIRED_CONFIDENCE_MEDIUM;
pub use decision::RiskCategory;
pub use decision::RiskClassification;
pub use decision::SignalKind;
pub use decision::TestImpact;
pub use decision::Trend;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use inputs::DecisionRequest;
pub use inputs::EnforcementResults;
pub use inputs::FileTypeStats;
pub use inputs::HistoryEnforcement;
pub use inputs::HistoryEntry;
pub use inputs::InputError;
pub use inputs::PerfMetrics;
pub use inputs::QualityMetrics;
pub use inputs::QualityReport;
pub use inputs::RunStatus;
pub use timestamp::Timestamp;
