// crates/deploy-gate-config/src/config.rs
// ============================================================================
// Module: Deploy Gate Configuration
// Description: Configuration loading and validation for Deploy Gate.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: deploy-gate-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Unknown fields are rejected and every section is validated before the
//! config is converted into core engine settings. Missing sections take the
//! engine defaults.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use deploy_gate_core::EngineConfig;
use deploy_gate_core::EnsembleConfig;
use deploy_gate_core::EnsembleWeights;
use deploy_gate_core::FileRiskConfig;
use deploy_gate_core::FileRiskRule;
use deploy_gate_core::FusionConfig;
use deploy_gate_core::ModelSources;
use deploy_gate_core::RuleFileRiskIndex;
use deploy_gate_core::ensemble::DEFAULT_HIGH_VARIANCE;
use deploy_gate_core::ensemble::DEFAULT_MODEL_LOAD_TIMEOUT;
use deploy_gate_core::ensemble::DEFAULT_LOW_VARIANCE;
use deploy_gate_core::ensemble::bayesian::DEFAULT_PRIOR_STRENGTH;
use deploy_gate_core::fusion::DEFAULT_DETERMINISTIC_RATIO;
use deploy_gate_core::fusion::DEFAULT_DIRECTION_PENALTY;
use deploy_gate_core::runtime::engine::DEFAULT_ML_BLEND;
use deploy_gate_core::scoring::file_risk::DEFAULT_AVERAGE_RISK_PENALTY;
use deploy_gate_core::scoring::file_risk::DEFAULT_CRITICAL_FILE_PENALTY;
use deploy_gate_core::scoring::file_risk::DEFAULT_CRITICAL_RISK_THRESHOLD;
use deploy_gate_core::scoring::file_risk::default_rules;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "deploy-gate.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "DEPLOY_GATE_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Minimum component timeout in milliseconds.
pub const MIN_TIMEOUT_MS: u64 = 10;
/// Maximum component timeout in milliseconds.
pub const MAX_TIMEOUT_MS: u64 = 60_000;
/// Maximum number of custom file risk rules.
pub const MAX_FILE_RISK_RULES: usize = 256;
/// Maximum length of a file risk rule pattern or type.
const MAX_RULE_FIELD_LENGTH: usize = 256;
/// Upper bound for per-file penalties.
const MAX_PENALTY: f64 = 100.0;
/// Largest possible variance of a probability.
const MAX_PROBABILITY_VARIANCE: f64 = 0.25;
/// Maximum length of the log filter directive.
const MAX_LOG_FILTER_LENGTH: usize = 512;
/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "warn";
/// Default file risk timeout in milliseconds.
const DEFAULT_FILE_RISK_TIMEOUT_MS: u64 = 1_000;
/// Default ML predictor timeout in milliseconds.
const DEFAULT_ML_TIMEOUT_MS: u64 = 2_000;
/// Default fusion timeout in milliseconds.
const DEFAULT_FUSION_TIMEOUT_MS: u64 = 500;
/// Default default-risk for unmatched paths.
const DEFAULT_UNMATCHED_RISK: f64 = 0.3;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Deploy Gate configuration.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeployGateConfig {
    /// Per-file risk enrichment.
    #[serde(default)]
    pub file_risk: FileRiskSection,
    /// ML ensemble and fusion.
    #[serde(default)]
    pub ml: MlSection,
    /// Audit export.
    #[serde(default)]
    pub audit: AuditSection,
    /// Log filtering.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl DeployGateConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order is the explicit path, then `DEPLOY_GATE_CONFIG`, then
    /// `deploy-gate.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Loads configuration when a source is present, otherwise defaults.
    ///
    /// An explicit path or `DEPLOY_GATE_CONFIG` must exist; only the implicit
    /// `deploy-gate.toml` may be absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let explicit = path.is_some() || env::var_os(CONFIG_ENV_VAR).is_some();
        if !explicit && !Path::new(DEFAULT_CONFIG_NAME).exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        if content.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let config: Self = toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.file_risk.validate()?;
        self.ml.validate()?;
        self.audit.validate()?;
        self.logging.validate()
    }

    /// Converts the configuration into engine settings.
    #[must_use]
    pub fn to_engine_config(&self) -> EngineConfig {
        let ml = &self.ml;
        EngineConfig {
            ml_enabled: ml.enabled,
            ml_blend: ml.blend,
            ensemble: EnsembleConfig {
                weights: ml.weights.to_core(),
                high_variance: ml.bayesian.high_variance,
                low_variance: ml.bayesian.low_variance,
                timeout: Duration::from_millis(ml.timeout_ms),
            },
            fusion: FusionConfig {
                deterministic_ratio: ml.fusion.deterministic_ratio,
                direction_penalty: ml.fusion.direction_penalty,
                timeout: Duration::from_millis(ml.fusion.timeout_ms),
            },
            file_risk: FileRiskConfig {
                critical_risk_threshold: self.file_risk.critical_risk_threshold,
                critical_file_penalty: self.file_risk.critical_file_penalty,
                average_risk_penalty: self.file_risk.average_risk_penalty,
                timeout: Duration::from_millis(self.file_risk.timeout_ms),
            },
        }
    }

    /// Returns the model artifact sources for the predictor registry.
    #[must_use]
    pub fn model_sources(&self) -> ModelSources {
        let models = &self.ml.models;
        ModelSources {
            neural_net: models.neural_net.clone(),
            sequence: models.sequence.clone(),
            multi_task: models.multi_task.clone(),
            bayesian_prior_strength: self.ml.bayesian.enabled.then_some(self.ml.bayesian.prior_strength),
        }
    }

    /// Returns the time budget for loading one model artifact.
    #[must_use]
    pub const fn model_load_timeout(&self) -> Duration {
        Duration::from_millis(self.ml.load_timeout_ms)
    }

    /// Builds the rule-based file risk index, or `None` when disabled.
    ///
    /// Custom rules are checked before the built-in rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the rules are rejected.
    pub fn file_risk_index(&self) -> Result<Option<RuleFileRiskIndex>, ConfigError> {
        let section = &self.file_risk;
        if !section.enabled {
            return Ok(None);
        }
        let mut rules: Vec<FileRiskRule> = section
            .rules
            .iter()
            .map(|rule| FileRiskRule::new(rule.pattern.clone(), rule.file_type.clone(), rule.risk))
            .collect();
        if section.builtin_rules {
            rules.extend(default_rules());
        }
        RuleFileRiskIndex::new(rules, section.default_risk)
            .map(Some)
            .map_err(|err| ConfigError::Invalid(format!("file_risk: {err}")))
    }

    /// Returns the audit directory when audit export is enabled.
    #[must_use]
    pub fn audit_dir(&self) -> Option<&Path> {
        if self.audit.enabled { Some(self.audit.dir.as_path()) } else { None }
    }
}

// ============================================================================
// SECTION: File Risk
// ============================================================================

/// `[file_risk]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileRiskSection {
    /// Whether per-file enrichment runs.
    pub enabled: bool,
    /// Whether the built-in rules follow the custom rules.
    pub builtin_rules: bool,
    /// Risk assigned to paths no rule matches.
    pub default_risk: f64,
    /// Risk at or above which a file counts as critical.
    pub critical_risk_threshold: f64,
    /// Penalty per critical file.
    pub critical_file_penalty: f64,
    /// Penalty scaled by the average risk.
    pub average_risk_penalty: f64,
    /// Time budget for the whole lookup.
    pub timeout_ms: u64,
    /// Custom rules, checked in order.
    pub rules: Vec<FileRiskRuleConfig>,
}

impl Default for FileRiskSection {
    fn default() -> Self {
        Self {
            enabled: false,
            builtin_rules: true,
            default_risk: DEFAULT_UNMATCHED_RISK,
            critical_risk_threshold: DEFAULT_CRITICAL_RISK_THRESHOLD,
            critical_file_penalty: DEFAULT_CRITICAL_FILE_PENALTY,
            average_risk_penalty: DEFAULT_AVERAGE_RISK_PENALTY,
            timeout_ms: DEFAULT_FILE_RISK_TIMEOUT_MS,
            rules: Vec::new(),
        }
    }
}

impl FileRiskSection {
    /// Validates the file risk section.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_unit("file_risk.default_risk", self.default_risk)?;
        validate_unit("file_risk.critical_risk_threshold", self.critical_risk_threshold)?;
        validate_penalty("file_risk.critical_file_penalty", self.critical_file_penalty)?;
        validate_penalty("file_risk.average_risk_penalty", self.average_risk_penalty)?;
        validate_timeout("file_risk.timeout_ms", self.timeout_ms)?;
        if self.rules.len() > MAX_FILE_RISK_RULES {
            return Err(ConfigError::Invalid(format!(
                "file_risk.rules exceeds limit of {MAX_FILE_RISK_RULES}"
            )));
        }
        for (index, rule) in self.rules.iter().enumerate() {
            rule.validate(index)?;
        }
        Ok(())
    }
}

/// One `[[file_risk.rules]]` entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileRiskRuleConfig {
    /// Case-insensitive substring matched against the path.
    pub pattern: String,
    /// File type assigned on match.
    pub file_type: String,
    /// Risk assigned on match.
    pub risk: f64,
}

impl FileRiskRuleConfig {
    /// Validates a single rule.
    fn validate(&self, index: usize) -> Result<(), ConfigError> {
        let field = format!("file_risk.rules[{index}]");
        for (name, value) in [("pattern", &self.pattern), ("file_type", &self.file_type)] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{field}.{name} must be non-empty")));
            }
            if value.len() > MAX_RULE_FIELD_LENGTH {
                return Err(ConfigError::Invalid(format!("{field}.{name} exceeds max length")));
            }
        }
        validate_unit(&format!("{field}.risk"), self.risk)
    }
}

// ============================================================================
// SECTION: ML
// ============================================================================

/// `[ml]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MlSection {
    /// Whether ML runs when a request does not say.
    pub enabled: bool,
    /// Share of ensemble safety blended into the deterministic score.
    pub blend: f64,
    /// Time budget per predictor call.
    pub timeout_ms: u64,
    /// Time budget for loading one model artifact.
    pub load_timeout_ms: u64,
    /// Base ensemble weights.
    pub weights: WeightsSection,
    /// Model artifact paths.
    pub models: ModelsSection,
    /// Bayesian estimator settings.
    pub bayesian: BayesianSection,
    /// Fusion settings.
    pub fusion: FusionSection,
}

impl Default for MlSection {
    fn default() -> Self {
        Self {
            enabled: false,
            blend: DEFAULT_ML_BLEND,
            timeout_ms: DEFAULT_ML_TIMEOUT_MS,
            load_timeout_ms: duration_millis(DEFAULT_MODEL_LOAD_TIMEOUT),
            weights: WeightsSection::default(),
            models: ModelsSection::default(),
            bayesian: BayesianSection::default(),
            fusion: FusionSection::default(),
        }
    }
}

impl MlSection {
    /// Validates the ML section.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_unit("ml.blend", self.blend)?;
        validate_timeout("ml.timeout_ms", self.timeout_ms)?;
        validate_timeout("ml.load_timeout_ms", self.load_timeout_ms)?;
        self.weights.validate()?;
        self.models.validate()?;
        self.bayesian.validate()?;
        self.fusion.validate()
    }
}

/// `[ml.weights]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeightsSection {
    /// Feed-forward network weight.
    pub neural_net: f64,
    /// Sequence model weight.
    pub sequence: f64,
    /// Multi-task model weight.
    pub multi_task: f64,
    /// Bayesian estimator weight.
    pub bayesian: f64,
    /// Heuristic weight.
    pub heuristic: f64,
}

impl Default for WeightsSection {
    fn default() -> Self {
        let weights = EnsembleWeights::default();
        Self {
            neural_net: weights.neural_net,
            sequence: weights.sequence,
            multi_task: weights.multi_task,
            bayesian: weights.bayesian,
            heuristic: weights.heuristic,
        }
    }
}

impl WeightsSection {
    /// Converts into core ensemble weights.
    const fn to_core(&self) -> EnsembleWeights {
        EnsembleWeights {
            neural_net: self.neural_net,
            sequence: self.sequence,
            multi_task: self.multi_task,
            bayesian: self.bayesian,
            heuristic: self.heuristic,
        }
    }

    /// Validates the weights section.
    fn validate(&self) -> Result<(), ConfigError> {
        let entries = [
            ("ml.weights.neural_net", self.neural_net),
            ("ml.weights.sequence", self.sequence),
            ("ml.weights.multi_task", self.multi_task),
            ("ml.weights.bayesian", self.bayesian),
            ("ml.weights.heuristic", self.heuristic),
        ];
        for (field, value) in entries {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!("{field} must be a non-negative number")));
            }
        }
        if self.heuristic <= 0.0 {
            return Err(ConfigError::Invalid("ml.weights.heuristic must be positive".to_string()));
        }
        Ok(())
    }
}

/// `[ml.models]` section.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelsSection {
    /// Feed-forward network artifact.
    pub neural_net: Option<PathBuf>,
    /// Sequence model artifact.
    pub sequence: Option<PathBuf>,
    /// Multi-task model artifact.
    pub multi_task: Option<PathBuf>,
}

impl ModelsSection {
    /// Validates artifact path lengths.
    fn validate(&self) -> Result<(), ConfigError> {
        let entries = [
            ("ml.models.neural_net", &self.neural_net),
            ("ml.models.sequence", &self.sequence),
            ("ml.models.multi_task", &self.multi_task),
        ];
        for (field, path) in entries {
            if let Some(path) = path {
                validate_path_string(field, &path.to_string_lossy())?;
            }
        }
        Ok(())
    }
}

/// `[ml.bayesian]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BayesianSection {
    /// Whether the built-in Bayesian estimator is registered.
    pub enabled: bool,
    /// Pseudo-observations carried by the prior.
    pub prior_strength: f64,
    /// Variance at or above which risk is raised.
    pub high_variance: f64,
    /// Variance at or below which risk is lowered.
    pub low_variance: f64,
}

impl Default for BayesianSection {
    fn default() -> Self {
        Self {
            enabled: true,
            prior_strength: DEFAULT_PRIOR_STRENGTH,
            high_variance: DEFAULT_HIGH_VARIANCE,
            low_variance: DEFAULT_LOW_VARIANCE,
        }
    }
}

impl BayesianSection {
    /// Validates the Bayesian section.
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.prior_strength.is_finite() || self.prior_strength <= 0.0 {
            return Err(ConfigError::Invalid("ml.bayesian.prior_strength must be positive".to_string()));
        }
        for (field, value) in
            [("ml.bayesian.high_variance", self.high_variance), ("ml.bayesian.low_variance", self.low_variance)]
        {
            if !value.is_finite() || !(0.0 ..= MAX_PROBABILITY_VARIANCE).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{field} must be within [0, {MAX_PROBABILITY_VARIANCE}]"
                )));
            }
        }
        if self.low_variance >= self.high_variance {
            return Err(ConfigError::Invalid(
                "ml.bayesian.low_variance must be below ml.bayesian.high_variance".to_string(),
            ));
        }
        Ok(())
    }
}

/// `[ml.fusion]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FusionSection {
    /// Share of the final confidence taken from the ensemble confidence.
    pub deterministic_ratio: f64,
    /// Disagreement added when NN and Bayesian disagree on direction.
    pub direction_penalty: f64,
    /// Time budget for fusion.
    pub timeout_ms: u64,
}

impl Default for FusionSection {
    fn default() -> Self {
        Self {
            deterministic_ratio: DEFAULT_DETERMINISTIC_RATIO,
            direction_penalty: DEFAULT_DIRECTION_PENALTY,
            timeout_ms: DEFAULT_FUSION_TIMEOUT_MS,
        }
    }
}

impl FusionSection {
    /// Validates the fusion section.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_unit("ml.fusion.deterministic_ratio", self.deterministic_ratio)?;
        validate_unit("ml.fusion.direction_penalty", self.direction_penalty)?;
        validate_timeout("ml.fusion.timeout_ms", self.timeout_ms)
    }
}

// ============================================================================
// SECTION: Audit and Logging
// ============================================================================

/// `[audit]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditSection {
    /// Whether each run is exported.
    pub enabled: bool,
    /// Directory receiving `deploy-audit-<runId>.json` files.
    pub dir: PathBuf,
}

impl Default for AuditSection {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from(".deploy-gate/audit"),
        }
    }
}

impl AuditSection {
    /// Validates the audit section.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("audit.dir", &self.dir.to_string_lossy())
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    /// `tracing` filter directive, overridden by `DEPLOY_GATE_LOG`.
    pub filter: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl LoggingSection {
    /// Validates the logging section.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.filter.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.filter must be non-empty".to_string()));
        }
        if self.filter.len() > MAX_LOG_FILTER_LENGTH {
            return Err(ConfigError::Invalid("logging.filter exceeds max length".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a value in `[0, 1]`.
fn validate_unit(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0 ..= 1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{field} must be within [0, 1]")))
    }
}

/// Validates a non-negative penalty.
fn validate_penalty(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0 ..= MAX_PENALTY).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{field} must be within [0, {MAX_PENALTY}]")))
    }
}

/// Converts a default duration into config milliseconds.
fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(MAX_TIMEOUT_MS)
}

/// Validates a timeout in milliseconds.
fn validate_timeout(field: &str, value: u64) -> Result<(), ConfigError> {
    if (MIN_TIMEOUT_MS ..= MAX_TIMEOUT_MS).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{field} must be within [{MIN_TIMEOUT_MS}, {MAX_TIMEOUT_MS}]"
        )))
    }
}
