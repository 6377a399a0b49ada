// crates/deploy-gate-core/src/core/inputs.rs
// ============================================================================
// Module: Deploy Gate Input Contracts
// Description: Data contracts consumed from external collaborators.
// Purpose: Define file statistics, quality reports, run history, and requests.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! These types are produced outside the engine: a file-classification pass
//! builds [`FileTypeStats`], scanners build [`QualityReport`], and a run store
//! supplies [`HistoryEntry`] values. Their wire form is camelCase JSON.
//!
//! Validation happens once at the boundary via [`DecisionRequest::validate`].
//! Scorers downstream assume validated input and have no failure modes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum number of history entries accepted per request.
pub const MAX_HISTORY_ENTRIES: usize = 1_000;
/// Maximum number of changed file paths accepted per request.
pub const MAX_CHANGED_FILES: usize = 10_000;
/// Maximum length of a single changed file path.
pub const MAX_PATH_LENGTH: usize = 4_096;

// ============================================================================
// SECTION: File Statistics
// ============================================================================

/// File type breakdown for the changed files of a deployment.
///
/// # Invariants
/// - `total_files >= sum(by_type)` and `total_files >= sum(by_risk)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTypeStats {
    /// File count per type name (for example `source`, `documentation`).
    #[serde(default)]
    pub by_type: BTreeMap<String, u32>,
    /// File count per risk tier (`critical`, `high`, `medium`, `low`).
    #[serde(default)]
    pub by_risk: BTreeMap<String, u32>,
    /// Total number of changed files.
    pub total_files: u32,
}

impl FileTypeStats {
    /// Returns the file count for a risk tier (zero when absent).
    #[must_use]
    pub fn risk_count(&self, tier: &str) -> u32 {
        self.by_risk.get(tier).copied().unwrap_or(0)
    }

    /// Returns the file count for a type (zero when absent).
    #[must_use]
    pub fn type_count(&self, file_type: &str) -> u32 {
        self.by_type.get(file_type).copied().unwrap_or(0)
    }

    /// Validates breakdown totals against `total_files`.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::FileStats`] when a breakdown exceeds the total.
    pub fn validate(&self) -> Result<(), InputError> {
        let total = u64::from(self.total_files);
        let by_type: u64 = self.by_type.values().copied().map(u64::from).sum();
        if by_type > total {
            return Err(InputError::FileStats(format!(
                "byType sums to {by_type} but totalFiles is {total}"
            )));
        }
        let by_risk: u64 = self.by_risk.values().copied().map(u64::from).sum();
        if by_risk > total {
            return Err(InputError::FileStats(format!(
                "byRisk sums to {by_risk} but totalFiles is {total}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Quality Report
// ============================================================================

/// Pass/fail status reported by a quality run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// All quality gates passed.
    Passed,
    /// At least one quality gate failed.
    Failed,
}

/// Issue counts by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetrics {
    /// Total number of reported issues.
    pub total_issues: u32,
    /// Critical severity issues.
    pub critical: u32,
    /// High severity issues.
    pub high: u32,
    /// Medium severity issues.
    pub medium: u32,
    /// Low severity issues.
    pub low: u32,
}

/// Quality gate enforcement outcomes attached to a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnforcementResults {
    /// Lighthouse budget gate outcome.
    pub lighthouse_passed: bool,
    /// Core Web Vitals gate outcome.
    pub web_vitals_passed: bool,
    /// Baseline comparison gate outcome.
    pub baseline_comparison_passed: bool,
    /// Lighthouse failure descriptions.
    #[serde(default)]
    pub lighthouse_failures: Vec<String>,
    /// Web Vitals failure descriptions.
    #[serde(default)]
    pub web_vitals_failures: Vec<String>,
    /// Baseline comparison failure descriptions.
    #[serde(default)]
    pub baseline_failures: Vec<String>,
}

/// Quality report produced by external scanners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    /// Overall report status.
    pub status: RunStatus,
    /// Issue counts by severity.
    pub metrics: QualityMetrics,
    /// Optional enforcement gate outcomes.
    #[serde(default)]
    pub enforcement: Option<EnforcementResults>,
}

impl QualityReport {
    /// Validates severity counts against the issue total.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::QualityReport`] when severities exceed the total.
    pub fn validate(&self) -> Result<(), InputError> {
        let metrics = &self.metrics;
        let severity_sum = u64::from(metrics.critical)
            + u64::from(metrics.high)
            + u64::from(metrics.medium)
            + u64::from(metrics.low);
        if severity_sum > u64::from(metrics.total_issues) {
            return Err(InputError::QualityReport(format!(
                "severity counts sum to {severity_sum} but totalIssues is {}",
                metrics.total_issues
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Run History
// ============================================================================

/// Performance scores captured for a historical run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerfMetrics {
    /// Performance score in `[0, 100]`.
    pub performance: f64,
    /// Accessibility score in `[0, 100]`.
    pub accessibility: f64,
    /// SEO score in `[0, 100]`.
    pub seo: f64,
}

/// Enforcement outcomes captured for a historical run.
///
/// Missing values mean the gate did not run for that entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEnforcement {
    /// Lighthouse gate outcome.
    #[serde(default)]
    pub lighthouse_passed: Option<bool>,
    /// Web Vitals gate outcome.
    #[serde(default)]
    pub web_vitals_passed: Option<bool>,
    /// Baseline comparison outcome.
    #[serde(default)]
    pub baseline_passed: Option<bool>,
}

/// One historical pipeline run, ordered oldest first in request history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Producer-supplied timestamp (opaque to the engine).
    pub timestamp: String,
    /// Run status.
    pub status: RunStatus,
    /// Performance scores.
    pub perf_metrics: PerfMetrics,
    /// Enforcement outcomes.
    #[serde(default)]
    pub enforcement: HistoryEnforcement,
}

impl HistoryEntry {
    /// Validates that all performance scores are finite and in range.
    fn validate(&self, index: usize) -> Result<(), InputError> {
        let scores = [
            ("performance", self.perf_metrics.performance),
            ("accessibility", self.perf_metrics.accessibility),
            ("seo", self.perf_metrics.seo),
        ];
        for (name, value) in scores {
            if !value.is_finite() || !(0.0 ..= 100.0).contains(&value) {
                return Err(InputError::History(format!(
                    "entry {index}: {name} score {value} is outside [0, 100]"
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Decision Request
// ============================================================================

/// A single deployment decision request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DecisionRequest {
    /// Changed-file statistics.
    pub file_stats: FileTypeStats,
    /// Quality report for the candidate build.
    pub quality_report: QualityReport,
    /// Prior runs, oldest first. Only the most recent window is scored.
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    /// Optional changed-file paths for per-file risk enrichment.
    #[serde(default)]
    pub changed_files: Vec<String>,
    /// Optional override of the configured ML prediction toggle.
    #[serde(default)]
    pub enable_ml_prediction: Option<bool>,
}

impl DecisionRequest {
    /// Validates every mandatory input before it enters the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`InputError`] describing the first malformed input.
    pub fn validate(&self) -> Result<(), InputError> {
        self.file_stats.validate()?;
        self.quality_report.validate()?;
        if self.history.len() > MAX_HISTORY_ENTRIES {
            return Err(InputError::History(format!(
                "{} entries exceeds limit of {MAX_HISTORY_ENTRIES}",
                self.history.len()
            )));
        }
        for (index, entry) in self.history.iter().enumerate() {
            entry.validate(index)?;
        }
        if self.changed_files.len() > MAX_CHANGED_FILES {
            return Err(InputError::ChangedFiles(format!(
                "{} paths exceeds limit of {MAX_CHANGED_FILES}",
                self.changed_files.len()
            )));
        }
        for path in &self.changed_files {
            if path.trim().is_empty() {
                return Err(InputError::ChangedFiles("empty path".to_string()));
            }
            if path.len() > MAX_PATH_LENGTH {
                return Err(InputError::ChangedFiles("path exceeds max length".to_string()));
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Boundary validation errors for mandatory inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// File statistics are inconsistent.
    #[error("invalid file stats: {0}")]
    FileStats(String),
    /// Quality report is inconsistent.
    #[error("invalid quality report: {0}")]
    QualityReport(String),
    /// Run history is malformed.
    #[error("invalid history: {0}")]
    History(String),
    /// Changed file list is malformed.
    #[error("invalid changed files: {0}")]
    ChangedFiles(String),
}
