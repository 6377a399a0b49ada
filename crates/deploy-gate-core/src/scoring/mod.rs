// crates/deploy-gate-core/src/scoring/mod.rs
// ============================================================================
// Module: Deploy Gate Scoring
// Description: Deterministic scorers and optional file-risk enrichment.
// Purpose: Turn request inputs into the signals the decision engine combines.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Scorers are total, synchronous functions over validated inputs. They never
//! fail and hold no state, so identical inputs always produce identical
//! scores.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod file_risk;
pub mod impact;
pub mod risk;
pub mod stability;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use file_risk::FileRiskAssessment;
pub use file_risk::FileRiskConfig;
pub use file_risk::FileRiskRule;
pub use file_risk::FileRiskSummary;
pub use file_risk::RuleFileRiskIndex;
pub use file_risk::assess_changed_files;
pub use file_risk::summarize_file_risk;
pub use impact::score_test_impact;
pub use risk::classify_risk;
pub use stability::analyze_baseline_stability;
