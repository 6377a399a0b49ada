// crates/deploy-gate-core/src/runtime/mod.rs
// ============================================================================
// Module: Deploy Gate Runtime
// Description: Decision engine and reasoning helpers.
// Purpose: Execute the decision pipeline over validated requests.
// Dependencies: crate::{audit, core, ensemble, fusion, interfaces, scoring}
// ============================================================================

//! ## Overview
//! Runtime modules orchestrate the scorers, optional enrichment, and the ML
//! ensemble into a single [`DeploymentDecision`](crate::DeploymentDecision).
//! All bindings must call into the same engine to keep decisions identical
//! across surfaces.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod engine;
pub mod reasoning;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use engine::DecisionEngine;
pub use engine::DecisionError;
pub use engine::EngineConfig;
