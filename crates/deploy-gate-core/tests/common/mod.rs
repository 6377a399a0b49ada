// crates/deploy-gate-core/tests/common/mod.rs
// ============================================================================
// Module: Shared Test Fixtures
// Description: Request builders and scripted predictors for core tests.
// ============================================================================
//! ## Overview
//! Builders for decision requests plus predictors that return fixed values,
//! fail, panic, or stall, so degradation paths can be exercised directly.

#![allow(
    dead_code,
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Shared fixtures are used by a subset of test binaries."
)]

use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

use deploy_gate_core::DecisionRequest;
use deploy_gate_core::EnforcementResults;
use deploy_gate_core::EnsembleFeatures;
use deploy_gate_core::FailurePredictor;
use deploy_gate_core::FileTypeStats;
use deploy_gate_core::HistoryEnforcement;
use deploy_gate_core::HistoryEntry;
use deploy_gate_core::PerfMetrics;
use deploy_gate_core::PredictorError;
use deploy_gate_core::PredictorOutput;
use deploy_gate_core::QualityMetrics;
use deploy_gate_core::QualityReport;
use deploy_gate_core::RunStatus;
use deploy_gate_core::SignalKind;

pub fn stats(by_type: &[(&str, u32)], by_risk: &[(&str, u32)], total: u32) -> FileTypeStats {
    FileTypeStats {
        by_type: by_type.iter().map(|(k, v)| ((*k).to_string(), *v)).collect::<BTreeMap<_, _>>(),
        by_risk: by_risk.iter().map(|(k, v)| ((*k).to_string(), *v)).collect::<BTreeMap<_, _>>(),
        total_files: total,
    }
}

pub fn low_risk_stats() -> FileTypeStats {
    stats(&[("source", 3)], &[("low", 3)], 3)
}

pub fn metrics(total: u32, critical: u32, high: u32, medium: u32, low: u32) -> QualityMetrics {
    QualityMetrics {
        total_issues: total,
        critical,
        high,
        medium,
        low,
    }
}

pub fn gates(lighthouse: bool, web_vitals: bool, baseline: bool) -> EnforcementResults {
    EnforcementResults {
        lighthouse_passed: lighthouse,
        web_vitals_passed: web_vitals,
        baseline_comparison_passed: baseline,
        lighthouse_failures: Vec::new(),
        web_vitals_failures: Vec::new(),
        baseline_failures: Vec::new(),
    }
}

pub fn report(metrics: QualityMetrics, enforcement: Option<EnforcementResults>) -> QualityReport {
    let status = if metrics.total_issues == 0 { RunStatus::Passed } else { RunStatus::Failed };
    QualityReport {
        status,
        metrics,
        enforcement,
    }
}

pub fn clean_report() -> QualityReport {
    report(metrics(0, 0, 0, 0, 0), Some(gates(true, true, true)))
}

pub fn entry(performance: f64, baseline_passed: Option<bool>) -> HistoryEntry {
    HistoryEntry {
        timestamp: "2026-01-01T00:00:00Z".to_string(),
        status: if baseline_passed == Some(false) { RunStatus::Failed } else { RunStatus::Passed },
        perf_metrics: PerfMetrics {
            performance,
            accessibility: 95.0,
            seo: 90.0,
        },
        enforcement: HistoryEnforcement {
            lighthouse_passed: Some(true),
            web_vitals_passed: Some(true),
            baseline_passed,
        },
    }
}

/// Ten steady runs: eight improvements and two without a baseline comparison.
pub fn clean_history() -> Vec<HistoryEntry> {
    let mut history: Vec<HistoryEntry> = (0 .. 8).map(|_| entry(92.0, Some(true))).collect();
    history.push(entry(92.0, None));
    history.push(entry(92.0, None));
    history
}

/// Ten runs alternating between 20 and 100 performance with alternating baselines.
pub fn volatile_history() -> Vec<HistoryEntry> {
    (0 .. 10)
        .map(|index| {
            if index % 2 == 0 { entry(20.0, Some(false)) } else { entry(100.0, Some(true)) }
        })
        .collect()
}

pub fn request(file_stats: FileTypeStats, quality_report: QualityReport, history: Vec<HistoryEntry>) -> DecisionRequest {
    DecisionRequest {
        file_stats,
        quality_report,
        history,
        changed_files: Vec::new(),
        enable_ml_prediction: None,
    }
}

pub fn clean_request() -> DecisionRequest {
    request(low_risk_stats(), clean_report(), clean_history())
}

pub fn critical_request() -> DecisionRequest {
    request(
        stats(&[("source", 2)], &[("critical", 1), ("low", 1)], 2),
        report(metrics(3, 1, 1, 1, 0), None),
        clean_history(),
    )
}

// ============================================================================
// SECTION: Scripted Predictors
// ============================================================================

/// Behavior of a scripted predictor.
#[derive(Clone, Copy)]
pub enum Script {
    Output(PredictorOutput),
    Fail,
    Panic,
    Stall(Duration),
}

pub struct ScriptedPredictor {
    pub signal: SignalKind,
    pub script: Script,
}

impl ScriptedPredictor {
    pub fn new(signal: SignalKind, script: Script) -> Self {
        Self {
            signal,
            script,
        }
    }
}

impl FailurePredictor for ScriptedPredictor {
    fn signal(&self) -> SignalKind {
        self.signal
    }

    fn predict(&self, _features: &EnsembleFeatures) -> Result<PredictorOutput, PredictorError> {
        match self.script {
            Script::Output(output) => Ok(output),
            Script::Fail => Err(PredictorError::Inference("scripted failure".to_string())),
            Script::Panic => panic!("scripted panic"),
            Script::Stall(duration) => {
                thread::sleep(duration);
                Ok(PredictorOutput::Probability(0.1))
            }
        }
    }
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < 1e-9, "expected {expected}, got {actual}");
}
