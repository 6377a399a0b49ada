// crates/deploy-gate-config/src/lib.rs
// ============================================================================
// Module: Deploy Gate Config Library
// Description: Canonical config model, validation, and example generation.
// Purpose: Single source of truth for deploy-gate.toml semantics.
// Dependencies: deploy-gate-core, serde, toml
// ============================================================================

//! ## Overview
//! `deploy-gate-config` defines the configuration model for Deploy Gate. It
//! loads `deploy-gate.toml` with strict size and path limits, rejects
//! unknown fields, validates every section fail-closed, and converts the
//! result into the core [`deploy_gate_core::EngineConfig`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
