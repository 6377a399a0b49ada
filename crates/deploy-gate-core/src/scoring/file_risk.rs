// crates/deploy-gate-core/src/scoring/file_risk.rs
// ============================================================================
// Module: File Risk Enrichment
// Description: Per-file risk assessment and summary penalties.
// Purpose: Refine the base score with path-level risk when an index is available.
// Dependencies: crate::interfaces, serde, tracing
// ============================================================================

//! ## Overview
//! A [`FileRiskIndex`] assesses each changed path. Per-file failures are
//! skipped; an empty result means enrichment is unavailable. The summary
//! converts into a penalty subtracted from the base confidence score.
//! [`RuleFileRiskIndex`] is the built-in index backed by ordered substring
//! rules.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::interfaces::FileRiskError;
use crate::interfaces::FileRiskIndex;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default risk score at or above which a file is critical.
pub const DEFAULT_CRITICAL_RISK_THRESHOLD: f64 = 0.7;
/// Default penalty per critical file.
pub const DEFAULT_CRITICAL_FILE_PENALTY: f64 = 4.0;
/// Default penalty scale for the average risk score.
pub const DEFAULT_AVERAGE_RISK_PENALTY: f64 = 10.0;
/// Default time budget for assessing all changed files.
pub const DEFAULT_FILE_RISK_TIMEOUT: Duration = Duration::from_millis(1_000);
/// Maximum number of files reported in [`FileRiskSummary::top_risk_files`].
pub const TOP_RISK_FILE_LIMIT: usize = 5;
/// File type assigned to paths no rule matches.
pub const UNMATCHED_FILE_TYPE: &str = "other";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Risk assessment of a single changed path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRiskAssessment {
    /// Changed path.
    pub path: String,
    /// Resolved file type.
    pub file_type: String,
    /// Risk score in `[0, 1]`.
    pub risk_score: f64,
}

/// Aggregated per-file risk for a change set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRiskSummary {
    /// Number of paths successfully assessed.
    pub assessed_files: u32,
    /// Number of paths at or above the critical threshold.
    pub critical_file_count: u32,
    /// Mean risk score of assessed paths.
    pub average_risk: f64,
    /// Highest-risk paths, riskiest first.
    pub top_risk_files: Vec<FileRiskAssessment>,
    /// Penalty subtracted from the base score.
    pub penalty: f64,
}

/// File risk enrichment settings.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRiskConfig {
    /// Risk score at or above which a file is critical.
    pub critical_risk_threshold: f64,
    /// Penalty per critical file.
    pub critical_file_penalty: f64,
    /// Penalty scale for the average risk score.
    pub average_risk_penalty: f64,
    /// Time budget for assessing all changed files.
    pub timeout: Duration,
}

impl Default for FileRiskConfig {
    fn default() -> Self {
        Self {
            critical_risk_threshold: DEFAULT_CRITICAL_RISK_THRESHOLD,
            critical_file_penalty: DEFAULT_CRITICAL_FILE_PENALTY,
            average_risk_penalty: DEFAULT_AVERAGE_RISK_PENALTY,
            timeout: DEFAULT_FILE_RISK_TIMEOUT,
        }
    }
}

// ============================================================================
// SECTION: Assessment
// ============================================================================

/// Assesses every changed path, skipping paths the index cannot resolve.
#[must_use]
pub fn assess_changed_files(index: &dyn FileRiskIndex, paths: &[String]) -> Vec<FileRiskAssessment> {
    let mut assessments = Vec::with_capacity(paths.len());
    for path in paths {
        match index.assess(path) {
            Ok(assessment) if (0.0 ..= 1.0).contains(&assessment.risk_score) => {
                assessments.push(assessment);
            }
            Ok(assessment) => {
                tracing::warn!(
                    path = %path,
                    risk_score = assessment.risk_score,
                    "file risk out of range; skipping"
                );
            }
            Err(err) => {
                tracing::warn!(path = %path, reason = %err, "file risk lookup failed; skipping");
            }
        }
    }
    assessments
}

/// Summarizes assessments into a [`FileRiskSummary`].
///
/// Returns `None` when no path was assessed.
#[must_use]
#[allow(clippy::cast_precision_loss, reason = "Changed files are bounded well below 2^52.")]
pub fn summarize_file_risk(
    assessments: &[FileRiskAssessment],
    config: &FileRiskConfig,
) -> Option<FileRiskSummary> {
    if assessments.is_empty() {
        return None;
    }
    let critical = assessments
        .iter()
        .filter(|assessment| assessment.risk_score >= config.critical_risk_threshold)
        .count();
    let average_risk =
        assessments.iter().map(|assessment| assessment.risk_score).sum::<f64>() / assessments.len() as f64;

    let mut ranked = assessments.to_vec();
    ranked.sort_by(|left, right| {
        right
            .risk_score
            .partial_cmp(&left.risk_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| left.path.cmp(&right.path))
    });
    ranked.truncate(TOP_RISK_FILE_LIMIT);

    let critical_file_count = u32::try_from(critical).unwrap_or(u32::MAX);
    let penalty = config.critical_file_penalty * f64::from(critical_file_count)
        + config.average_risk_penalty * average_risk;
    Some(FileRiskSummary {
        assessed_files: u32::try_from(assessments.len()).unwrap_or(u32::MAX),
        critical_file_count,
        average_risk,
        top_risk_files: ranked,
        penalty,
    })
}

// ============================================================================
// SECTION: Rule Index
// ============================================================================

/// Substring rule mapping a path to a file type and risk score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct FileRiskRule {
    /// Substring matched against the path.
    pub pattern: String,
    /// File type assigned on match.
    pub file_type: String,
    /// Risk score assigned on match.
    pub risk: f64,
}

impl FileRiskRule {
    /// Creates a rule.
    #[must_use]
    pub fn new(pattern: impl Into<String>, file_type: impl Into<String>, risk: f64) -> Self {
        Self {
            pattern: pattern.into(),
            file_type: file_type.into(),
            risk,
        }
    }
}

/// File risk index backed by ordered substring rules.
///
/// Rules are tried in list order and the first match wins, regardless of how
/// specific later rules are. Paths are lowercased, use `/` separators, and
/// carry a leading `/`, so a pattern such as `/tests/` matches a whole
/// directory segment at any depth.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleFileRiskIndex {
    /// Rules in match order.
    rules: Vec<FileRiskRule>,
    /// Risk for paths no rule matches.
    default_risk: f64,
}

impl RuleFileRiskIndex {
    /// Builds an index from rules and a default risk.
    ///
    /// # Errors
    ///
    /// Returns [`FileRiskError::Index`] when a risk is outside `[0, 1]` or a
    /// pattern is empty.
    pub fn new(rules: Vec<FileRiskRule>, default_risk: f64) -> Result<Self, FileRiskError> {
        if !(0.0 ..= 1.0).contains(&default_risk) {
            return Err(FileRiskError::Index(format!("default risk {default_risk} outside [0, 1]")));
        }
        for rule in &rules {
            if rule.pattern.is_empty() {
                return Err(FileRiskError::Index("rule pattern must not be empty".to_string()));
            }
            if !(0.0 ..= 1.0).contains(&rule.risk) {
                return Err(FileRiskError::Index(format!(
                    "rule {} risk {} outside [0, 1]",
                    rule.pattern, rule.risk
                )));
            }
        }
        Ok(Self {
            rules,
            default_risk,
        })
    }

    /// Returns the built-in rule set for common web and service repositories.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            rules: default_rules(),
            default_risk: 0.3,
        }
    }

    /// Returns the configured rules.
    #[must_use]
    pub fn rules(&self) -> &[FileRiskRule] {
        &self.rules
    }
}

impl FileRiskIndex for RuleFileRiskIndex {
    fn assess(&self, path: &str) -> Result<FileRiskAssessment, FileRiskError> {
        if path.trim().is_empty() {
            return Err(FileRiskError::Unresolved("empty path".to_string()));
        }
        let normalized = format!("/{}", path.replace('\\', "/").to_ascii_lowercase());
        let (file_type, risk_score) = self
            .rules
            .iter()
            .find(|rule| normalized.contains(&rule.pattern.to_ascii_lowercase()))
            .map_or((UNMATCHED_FILE_TYPE, self.default_risk), |rule| (rule.file_type.as_str(), rule.risk));
        Ok(FileRiskAssessment {
            path: path.to_string(),
            file_type: file_type.to_string(),
            risk_score,
        })
    }
}

/// Built-in rules, most specific first.
#[must_use]
pub fn default_rules() -> Vec<FileRiskRule> {
    vec![
        FileRiskRule::new("migrations/", "database", 0.9),
        FileRiskRule::new(".sql", "database", 0.85),
        FileRiskRule::new("auth", "security", 0.85),
        FileRiskRule::new("payment", "payments", 0.9),
        FileRiskRule::new(".github/workflows/", "ci", 0.6),
        FileRiskRule::new("dockerfile", "infrastructure", 0.7),
        FileRiskRule::new(".tf", "infrastructure", 0.75),
        FileRiskRule::new("package-lock.json", "dependencies", 0.5),
        FileRiskRule::new("package.json", "dependencies", 0.55),
        FileRiskRule::new("cargo.lock", "dependencies", 0.5),
        FileRiskRule::new("/test/", "test", 0.1),
        FileRiskRule::new("/tests/", "test", 0.1),
        FileRiskRule::new("/__tests__/", "test", 0.1),
        FileRiskRule::new("_test.", "test", 0.1),
        FileRiskRule::new(".test.", "test", 0.1),
        FileRiskRule::new(".spec.", "test", 0.1),
        FileRiskRule::new(".md", "documentation", 0.05),
        FileRiskRule::new("docs/", "documentation", 0.05),
        FileRiskRule::new(".css", "styles", 0.2),
        FileRiskRule::new(".scss", "styles", 0.2),
        FileRiskRule::new(".png", "assets", 0.05),
        FileRiskRule::new(".svg", "assets", 0.05),
        FileRiskRule::new(".json", "config", 0.4),
        FileRiskRule::new(".yml", "config", 0.4),
        FileRiskRule::new(".yaml", "config", 0.4),
        FileRiskRule::new(".toml", "config", 0.4),
        FileRiskRule::new(".ts", "source", 0.45),
        FileRiskRule::new(".js", "source", 0.45),
        FileRiskRule::new(".rs", "source", 0.45),
        FileRiskRule::new(".py", "source", 0.45),
    ]
}
