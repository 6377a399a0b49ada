// crates/deploy-gate-core/tests/decision_engine.rs
// ============================================================================
// Module: Decision Engine Tests
// Description: End-to-end decisions through the canonical pipeline.
// ============================================================================
//! ## Overview
//! Drives [`DecisionEngine::decide`] through clean, blocked, volatile,
//! enriched, and ML-degraded scenarios and checks the decision invariants,
//! including fusion failure and tolerance of extra producer fields.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::Script;
use common::ScriptedPredictor;
use common::assert_close;
use common::clean_report;
use common::clean_request;
use common::critical_request;
use common::entry;
use common::low_risk_stats;
use common::metrics;
use common::report;
use common::request;
use common::stats;
use common::volatile_history;
use deploy_gate_core::AuditLogger;
use deploy_gate_core::DecisionEngine;
use deploy_gate_core::DecisionError;
use deploy_gate_core::DecisionRequest;
use deploy_gate_core::EngineConfig;
use deploy_gate_core::FileRiskAssessment;
use deploy_gate_core::FileRiskError;
use deploy_gate_core::FileRiskIndex;
use deploy_gate_core::FileRiskRule;
use deploy_gate_core::FusionConfig;
use deploy_gate_core::FusionEngine;
use deploy_gate_core::InputError;
use deploy_gate_core::PredictorOutput;
use deploy_gate_core::PredictorRegistry;
use deploy_gate_core::RiskCategory;
use deploy_gate_core::RuleFileRiskIndex;
use deploy_gate_core::SignalKind;
use deploy_gate_core::runtime::reasoning::ML_UNAVAILABLE;
use serde_json::json;

fn engine() -> DecisionEngine {
    DecisionEngine::new(EngineConfig::default(), PredictorRegistry::empty())
}

fn ml_engine(registry: PredictorRegistry) -> DecisionEngine {
    let config = EngineConfig {
        ml_enabled: true,
        ..EngineConfig::default()
    };
    DecisionEngine::new(config, registry)
}

/// Index that fails every lookup.
struct BrokenIndex;

impl FileRiskIndex for BrokenIndex {
    fn assess(&self, _path: &str) -> Result<FileRiskAssessment, FileRiskError> {
        Err(FileRiskError::Index("index offline".to_string()))
    }
}

// ============================================================================
// SECTION: Deterministic Path
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn clean_low_risk_change_is_allowed() {
    let decision = engine().decide(&clean_request()).await.expect("decision");
    assert_close(decision.factors.risk_weight, 28.0);
    assert_close(decision.factors.test_impact, 40.0);
    assert_close(decision.factors.baseline_stability, 25.0);
    assert_close(decision.confidence, 93.0);
    assert_close(decision.required_confidence, 60.0);
    assert!(decision.can_deploy);
    assert!(decision.ml_prediction.is_none());
    assert!(decision.degraded_signals.is_empty());
    assert_eq!(decision.reasoning.last().map(String::as_str), Some("Deployment allowed"));
}

#[tokio::test(flavor = "multi_thread")]
async fn critical_failures_block_critical_change() {
    let decision = engine().decide(&critical_request()).await.expect("decision");
    assert_eq!(decision.risk.category, RiskCategory::Critical);
    assert_close(decision.test_impact.score, 50.0);
    assert_close(decision.confidence, 66.0);
    assert_close(decision.required_confidence, 90.0);
    assert!(!decision.can_deploy);
    assert!(decision.reasoning.iter().any(|line| line.contains("capped due to critical/high severity failures")));
    assert!(decision.reasoning.iter().any(|line| line.contains("1 critical failures present")));
    assert!(decision.reasoning.last().expect("verdict").starts_with("Deployment blocked"));
}

#[tokio::test(flavor = "multi_thread")]
async fn volatile_history_emits_warning() {
    let decision = engine()
        .decide(&request(low_risk_stats(), clean_report(), volatile_history()))
        .await
        .expect("decision");
    assert_close(decision.baseline_stability.volatility, 0.8);
    assert_close(decision.baseline_stability.stability_score, 51.0);
    assert_close(decision.confidence, 28.0 + 40.0 + 12.75);
    assert!(decision.can_deploy);
    assert!(decision.reasoning.iter().any(|line| line == "Warning: baseline volatility 0.80 is high"));
}

#[tokio::test(flavor = "multi_thread")]
async fn degrading_trend_is_called_out() {
    let history: Vec<_> = (0 .. 4).map(|_| entry(70.0, Some(false))).collect();
    let decision = engine().decide(&request(low_risk_stats(), clean_report(), history)).await.expect("decision");
    assert!(decision.reasoning.iter().any(|line| line == "Warning: baseline trend is degrading"));
}

#[tokio::test(flavor = "multi_thread")]
async fn threshold_follows_risk_category() {
    let cases = [
        (stats(&[("source", 1)], &[("critical", 1)], 1), 90.0),
        (stats(&[("source", 1)], &[("high", 1)], 1), 90.0),
        (stats(&[("config", 1)], &[("medium", 1)], 1), 75.0),
        (stats(&[("source", 1)], &[("low", 1)], 1), 60.0),
        (stats(&[("documentation", 2)], &[("high", 2)], 2), 60.0),
    ];
    for (file_stats, required) in cases {
        let decision = engine().decide(&request(file_stats, clean_report(), Vec::new())).await.expect("decision");
        assert_close(decision.required_confidence, required);
        assert_eq!(decision.can_deploy, decision.confidence >= decision.required_confidence);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn identical_requests_produce_identical_decisions() {
    let engine = engine();
    let first = engine.decide(&critical_request()).await.expect("first");
    let second = engine.decide(&critical_request()).await.expect("second");
    assert_eq!(first, second);
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_request_is_rejected() {
    let bad = request(low_risk_stats(), report(metrics(1, 2, 0, 0, 0), None), Vec::new());
    let error = engine().decide(&bad).await.unwrap_err();
    assert!(matches!(error, DecisionError::InvalidInput(InputError::QualityReport(_))));

    let mut blank_path = clean_request();
    blank_path.changed_files = vec![" ".to_string()];
    assert!(engine().decide(&blank_path).await.is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn producer_fields_in_reports_are_ignored() {
    let request: DecisionRequest = serde_json::from_value(json!({
        "fileStats": {"byType": {"source": 1}, "byRisk": {"low": 1}, "totalFiles": 1, "analyzer": "scan-v2"},
        "qualityReport": {
            "status": "passed",
            "url": "https://staging.example.com",
            "timestamp": "2026-01-01T00:00:00Z",
            "metrics": {"totalIssues": 0, "critical": 0, "high": 0, "medium": 0, "low": 0, "info": 3},
            "enforcement": {
                "lighthousePassed": true,
                "webVitalsPassed": true,
                "baselineComparisonPassed": true,
                "budgetFile": "budget.json"
            }
        },
        "history": [{
            "timestamp": "2026-01-01T00:00:00Z",
            "status": "passed",
            "commit": "abc123",
            "perfMetrics": {"performance": 90.0, "accessibility": 95.0, "seo": 92.0, "pwa": 40.0},
            "enforcement": {"baselinePassed": true, "notes": "ok"}
        }]
    }))
    .expect("request with producer fields");
    let plain: DecisionRequest = serde_json::from_value(json!({
        "fileStats": {"byType": {"source": 1}, "byRisk": {"low": 1}, "totalFiles": 1},
        "qualityReport": {
            "status": "passed",
            "metrics": {"totalIssues": 0, "critical": 0, "high": 0, "medium": 0, "low": 0},
            "enforcement": {"lighthousePassed": true, "webVitalsPassed": true, "baselineComparisonPassed": true}
        },
        "history": [{
            "timestamp": "2026-01-01T00:00:00Z",
            "status": "passed",
            "perfMetrics": {"performance": 90.0, "accessibility": 95.0, "seo": 92.0},
            "enforcement": {"baselinePassed": true}
        }]
    }))
    .expect("plain request");
    assert_eq!(request, plain);
    let decision = engine().decide(&request).await.expect("decision");
    assert_eq!(decision, engine().decide(&plain).await.expect("plain decision"));

    let envelope = serde_json::from_value::<DecisionRequest>(json!({
        "fileStats": {"totalFiles": 0},
        "qualityReport": {
            "status": "passed",
            "metrics": {"totalIssues": 0, "critical": 0, "high": 0, "medium": 0, "low": 0}
        },
        "dryRun": true
    }));
    assert!(envelope.is_err());
}

// ============================================================================
// SECTION: File Risk Enrichment
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn file_risk_penalty_lowers_confidence() {
    let index = RuleFileRiskIndex::new(
        vec![FileRiskRule::new("migrations/", "database", 0.9), FileRiskRule::new("src/", "source", 0.5)],
        0.3,
    )
    .expect("index");
    let engine = engine().with_file_risk_index(Arc::new(index));
    let mut request = clean_request();
    request.changed_files = vec!["db/migrations/001.sql".to_string(), "src/lib.rs".to_string()];

    let decision = engine.decide(&request).await.expect("decision");
    let summary = decision.file_risk.as_ref().expect("summary");
    assert_eq!(summary.critical_file_count, 1);
    assert_close(summary.penalty, 4.0 + 10.0 * 0.7);
    assert_close(decision.confidence, 93.0 - 11.0);
    assert!(decision.reasoning[1].starts_with("File risk: 1 critical of 2 assessed files"));
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_index_degrades_file_risk_only() {
    let engine = engine().with_file_risk_index(Arc::new(BrokenIndex));
    let mut request = clean_request();
    request.changed_files = vec!["src/lib.rs".to_string()];

    let decision = engine.decide(&request).await.expect("decision");
    assert!(decision.file_risk.is_none());
    assert!(decision.is_degraded(SignalKind::FileRisk));
    assert_close(decision.confidence, 93.0);
    assert!(decision.can_deploy);
    assert!(decision.reasoning.iter().any(|line| line.starts_with("File risk enrichment unavailable")));
}

// ============================================================================
// SECTION: ML Path
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn ml_disabled_uses_deterministic_sum() {
    let registry = PredictorRegistry::empty()
        .with_predictor(Arc::new(ScriptedPredictor::new(
            SignalKind::NeuralNet,
            Script::Output(PredictorOutput::Probability(0.9)),
        )))
        .expect("registry");
    let engine = DecisionEngine::new(EngineConfig::default(), registry);
    let decision = engine.decide(&clean_request()).await.expect("decision");
    assert!(decision.ml_prediction.is_none());
    let factors = decision.factors;
    assert_close(decision.confidence, factors.risk_weight + factors.test_impact + factors.baseline_stability);
}

#[tokio::test(flavor = "multi_thread")]
async fn all_models_unavailable_matches_ml_disabled() {
    let disabled = engine().decide(&clean_request()).await.expect("disabled");
    let degraded = ml_engine(PredictorRegistry::empty()).decide(&clean_request()).await.expect("degraded");

    assert_close(degraded.confidence, disabled.confidence);
    assert_close(degraded.required_confidence, disabled.required_confidence);
    assert_eq!(degraded.can_deploy, disabled.can_deploy);
    assert_eq!(degraded.factors, disabled.factors);
    assert!(degraded.ml_prediction.is_none());
    let signals: Vec<_> = degraded.degraded_signals.iter().map(|entry| entry.signal).collect();
    assert_eq!(
        signals,
        vec![SignalKind::NeuralNet, SignalKind::Sequence, SignalKind::MultiTask, SignalKind::Bayesian]
    );
    assert!(degraded.reasoning.iter().any(|line| line == ML_UNAVAILABLE));
}

#[tokio::test(flavor = "multi_thread")]
async fn request_override_beats_config_toggle() {
    let mut request = clean_request();
    request.enable_ml_prediction = Some(false);
    let decision = ml_engine(PredictorRegistry::empty()).decide(&request).await.expect("decision");
    assert!(decision.degraded_signals.is_empty());
    assert!(!decision.reasoning.iter().any(|line| line == ML_UNAVAILABLE));
}

#[tokio::test(flavor = "multi_thread")]
async fn model_signal_blends_ensemble_and_fusion() {
    let registry = PredictorRegistry::empty()
        .with_predictor(Arc::new(ScriptedPredictor::new(
            SignalKind::NeuralNet,
            Script::Output(PredictorOutput::Probability(0.1)),
        )))
        .expect("registry");
    let decision = ml_engine(registry).decide(&clean_request()).await.expect("decision");
    let assessment = decision.ml_prediction.as_ref().expect("ml prediction");

    // Heuristic 0.175 at weight 0.75, NN 0.1 at weight 0.25.
    let adjusted = 0.25 * 0.1 + 0.75 * 0.175;
    assert_close(assessment.ensemble.adjusted_failure_probability, adjusted);
    assert_close(assessment.ensemble_confidence, 93.0 * 0.7 + (1.0 - adjusted) * 100.0 * 0.3);

    let fusion = assessment.fusion.as_ref().expect("fusion");
    let expected = FusionEngine::default().final_confidence(assessment.ensemble_confidence, fusion.fusion_score);
    assert_close(decision.confidence, expected);
    assert_eq!(decision.can_deploy, decision.confidence >= decision.required_confidence);
    assert!(decision.reasoning.iter().any(|line| line.starts_with("ML ensemble failure probability")));
    assert!(decision.reasoning.iter().any(|line| line == "Signal lstm unavailable: model not configured"));
}

#[tokio::test(flavor = "multi_thread")]
async fn fusion_failure_keeps_ensemble_confidence() {
    let registry = PredictorRegistry::empty()
        .with_predictor(Arc::new(ScriptedPredictor::new(
            SignalKind::NeuralNet,
            Script::Output(PredictorOutput::Probability(0.1)),
        )))
        .expect("registry");
    let config = EngineConfig {
        ml_enabled: true,
        fusion: FusionConfig {
            timeout: Duration::ZERO,
            ..FusionConfig::default()
        },
        ..EngineConfig::default()
    };
    let decision = DecisionEngine::new(config, registry).decide(&clean_request()).await.expect("decision");
    let assessment = decision.ml_prediction.as_ref().expect("ml prediction");

    assert!(assessment.fusion.is_none());
    assert_close(decision.confidence, assessment.ensemble_confidence);
    assert!(decision.is_degraded(SignalKind::Fusion));
    assert!(decision.reasoning.iter().any(|line| line.starts_with("Fusion unavailable")));
    assert_eq!(decision.can_deploy, decision.confidence >= decision.required_confidence);
}

// ============================================================================
// SECTION: Audit
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn decisions_are_audited_in_phase_order() {
    let logger = Arc::new(AuditLogger::new());
    let engine = ml_engine(PredictorRegistry::empty()).with_audit_logger(Arc::clone(&logger));
    engine.decide(&clean_request()).await.expect("decision");

    let kinds: Vec<_> = logger.entries().iter().map(|entry| entry.record.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            "riskAnalysis",
            "testImpact",
            "baselineStability",
            "degradedSignal",
            "degradedSignal",
            "degradedSignal",
            "degradedSignal",
            "finalScore",
        ]
    );
    let stats = logger.stats();
    assert_eq!(stats.total, 8);
    assert_eq!(stats.degraded_signal, 4);
    assert_eq!(stats.ml_prediction, 0);
}
