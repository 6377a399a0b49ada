// crates/deploy-gate-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and `deploy-gate config example`.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The example spells out every section with its default value so it can be
//! copied and edited. It must always pass validation.

/// Returns a canonical example `deploy-gate.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"# Per-file risk enrichment from changed file paths.
[file_risk]
enabled = true
builtin_rules = true
default_risk = 0.3
critical_risk_threshold = 0.7
critical_file_penalty = 4.0
average_risk_penalty = 10.0
timeout_ms = 1000

# Custom rules are matched before the built-in rules.
[[file_risk.rules]]
pattern = "infra/"
file_type = "infrastructure"
risk = 0.8

# ML ensemble; requests may override `enabled` with enableMlPrediction.
[ml]
enabled = false
blend = 0.3
timeout_ms = 2000
load_timeout_ms = 10000

[ml.weights]
neural_net = 0.25
sequence = 0.20
multi_task = 0.20
bayesian = 0.15
heuristic = 0.20

# ONNX model artifacts; omitted models are reported as degraded signals.
[ml.models]
# neural_net = "models/nn.onnx"
# sequence = "models/lstm.onnx"
# multi_task = "models/mtl.onnx"

[ml.bayesian]
enabled = true
prior_strength = 4.0
high_variance = 0.04
low_variance = 0.01

[ml.fusion]
deterministic_ratio = 0.6
direction_penalty = 0.15
timeout_ms = 500

[audit]
enabled = true
dir = ".deploy-gate/audit"

# Overridden by DEPLOY_GATE_LOG.
[logging]
filter = "warn"
"#,
    )
}
