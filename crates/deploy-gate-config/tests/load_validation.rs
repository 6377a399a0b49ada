//! Load validation tests for deploy-gate-config.
// crates/deploy-gate-config/tests/load_validation.rs
// =============================================================================
// Module: Load Validation Tests
// Description: File loading, size limits, and parse failures.
// Purpose: Ensure config files are read fail-closed.
// =============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::fs;

use deploy_gate_config::ConfigError;
use deploy_gate_config::DeployGateConfig;
use deploy_gate_config::MAX_CONFIG_FILE_SIZE;
use deploy_gate_config::config_toml_example;

type TestResult = Result<(), String>;

#[test]
fn example_config_loads_from_disk() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("deploy-gate.toml");
    fs::write(&path, config_toml_example()).map_err(|err| err.to_string())?;
    let config = DeployGateConfig::load(Some(&path)).map_err(|err| err.to_string())?;
    if !config.file_risk.enabled || config.file_risk.rules.len() != 1 {
        return Err("example file risk section not loaded".to_string());
    }
    if config.ml.enabled {
        return Err("example must leave ML disabled".to_string());
    }
    Ok(())
}

#[test]
fn missing_explicit_file_is_an_io_error() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("absent.toml");
    match DeployGateConfig::load(Some(&path)) {
        Err(ConfigError::Io(_)) => {}
        other => return Err(format!("expected io error, got {other:?}")),
    }
    match DeployGateConfig::load_or_default(Some(&path)) {
        Err(ConfigError::Io(_)) => Ok(()),
        other => Err(format!("explicit path must not fall back to defaults, got {other:?}")),
    }
}

#[test]
fn oversized_file_is_rejected() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("big.toml");
    let padding = format!("# {}\n", "x".repeat(MAX_CONFIG_FILE_SIZE));
    fs::write(&path, padding).map_err(|err| err.to_string())?;
    match DeployGateConfig::load(Some(&path)) {
        Err(ConfigError::Invalid(message)) if message.contains("size limit") => Ok(()),
        other => Err(format!("expected size limit error, got {other:?}")),
    }
}

#[test]
fn non_utf8_file_is_rejected() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("binary.toml");
    fs::write(&path, [0xff_u8, 0xfe, 0x00]).map_err(|err| err.to_string())?;
    match DeployGateConfig::load(Some(&path)) {
        Err(ConfigError::Invalid(message)) if message.contains("utf-8") => Ok(()),
        other => Err(format!("expected utf-8 error, got {other:?}")),
    }
}

#[test]
fn overlong_path_component_is_rejected() -> TestResult {
    let path = std::path::PathBuf::from(format!("{}.toml", "a".repeat(300)));
    match DeployGateConfig::load(Some(&path)) {
        Err(ConfigError::Invalid(message)) if message.contains("component") => Ok(()),
        other => Err(format!("expected path component error, got {other:?}")),
    }
}

#[test]
fn unknown_fields_are_parse_errors() -> TestResult {
    for source in ["[ml]\nenabeld = true\n", "[unknown]\nvalue = 1\n", "[ml.weights]\nlstm = 0.2\n"] {
        match DeployGateConfig::from_toml_str(source) {
            Err(ConfigError::Parse(_)) => {}
            other => return Err(format!("expected parse error for {source:?}, got {other:?}")),
        }
    }
    Ok(())
}

#[test]
fn empty_config_takes_engine_defaults() -> TestResult {
    let config = DeployGateConfig::from_toml_str("").map_err(|err| err.to_string())?;
    if config != DeployGateConfig::default() {
        return Err("empty config differs from defaults".to_string());
    }
    let engine = config.to_engine_config();
    if engine != deploy_gate_core::EngineConfig::default() {
        return Err("default config does not map to default engine settings".to_string());
    }
    Ok(())
}
