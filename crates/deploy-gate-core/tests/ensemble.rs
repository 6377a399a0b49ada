// crates/deploy-gate-core/tests/ensemble.rs
// ============================================================================
// Module: Ensemble Predictor Tests
// Description: Weight renormalization, Bayesian adjustment, and guarded members.
// ============================================================================
//! ## Overview
//! Verifies that unavailable members hand their weight to the heuristic and
//! that errors, panics, timeouts, and out-of-range outputs all degrade a
//! member without failing the ensemble.

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
use common::clean_request;
use deploy_gate_core::BayesianEstimate;
use deploy_gate_core::EnsembleConfig;
use deploy_gate_core::EnsembleFeatures;
use deploy_gate_core::EnsemblePredictor;
use deploy_gate_core::MultiTaskEstimate;
use deploy_gate_core::PredictorOutput;
use deploy_gate_core::PredictorRegistry;
use deploy_gate_core::SignalKind;
use deploy_gate_core::analyze_baseline_stability;
use deploy_gate_core::classify_risk;
use deploy_gate_core::ensemble::BetaBayesianEstimator;
use deploy_gate_core::ensemble::ModelSignals;
use deploy_gate_core::ensemble::bayesian_adjustment;
use deploy_gate_core::ensemble::combine_signals;
use deploy_gate_core::ensemble::heuristic_failure_probability;
use deploy_gate_core::score_test_impact;

fn clean_features() -> EnsembleFeatures {
    let request = clean_request();
    let risk = classify_risk(&request.file_stats);
    let impact = score_test_impact(&request.quality_report);
    let stability = analyze_baseline_stability(&request.history);
    EnsembleFeatures::from_scores(&request, &risk, &impact, &stability)
}

fn scripted(signal: SignalKind, script: Script) -> Arc<ScriptedPredictor> {
    Arc::new(ScriptedPredictor::new(signal, script))
}

fn weight(prediction: &deploy_gate_core::EnsemblePrediction, name: &str) -> f64 {
    prediction.weights.get(name).copied().unwrap_or_default()
}

// ============================================================================
// SECTION: Combination
// ============================================================================

#[test]
fn heuristic_only_takes_full_weight() {
    let prediction = combine_signals(&EnsembleConfig::default(), 0.3, ModelSignals::default());
    assert_eq!(prediction.weights.len(), 1);
    assert_close(weight(&prediction, "heuristic"), 1.0);
    assert_close(prediction.ensemble_failure_probability, 0.3);
    assert!(prediction.bayesian_adjustment.is_none());
    assert!(!prediction.has_model_signal());
}

#[test]
fn missing_members_hand_weight_to_heuristic() {
    let signals = ModelSignals {
        neural_net: Some(0.1),
        ..ModelSignals::default()
    };
    let prediction = combine_signals(&EnsembleConfig::default(), 0.5, signals);
    assert_close(weight(&prediction, "nn"), 0.25);
    assert_close(weight(&prediction, "heuristic"), 0.75);
    assert_close(prediction.ensemble_failure_probability, 0.25 * 0.1 + 0.75 * 0.5);
    let total: f64 = prediction.weights.values().sum();
    assert_close(total, 1.0);
}

#[test]
fn all_members_use_base_weights() {
    let signals = ModelSignals {
        neural_net: Some(0.2),
        sequence: Some(0.4),
        multi_task: Some(MultiTaskEstimate {
            success: 0.9,
            performance: 0.1,
            security: 0.05,
            downtime: 0.02,
        }),
        bayesian: Some(BayesianEstimate {
            mean: 0.2,
            variance: 0.02,
            ci_low: 0.0,
            ci_high: 0.48,
        }),
    };
    let prediction = combine_signals(&EnsembleConfig::default(), 0.3, signals);
    let expected = 0.25 * 0.2 + 0.20 * 0.4 + 0.20 * 0.1 + 0.15 * 0.2 + 0.20 * 0.3;
    assert_close(prediction.ensemble_failure_probability, expected);
    assert_close(prediction.bayesian_adjustment.expect("adjustment"), 0.0);
    assert_close(prediction.adjusted_failure_probability, expected);
}

#[test]
fn bayesian_adjustment_follows_variance_bands() {
    let config = EnsembleConfig::default();
    assert_close(bayesian_adjustment(&config, 0.04), 0.05);
    assert_close(bayesian_adjustment(&config, 0.06), 0.075);
    assert_close(bayesian_adjustment(&config, 0.2), 0.10);
    assert_close(bayesian_adjustment(&config, 0.02), 0.0);
    assert_close(bayesian_adjustment(&config, 0.01), -0.03);
    assert_close(bayesian_adjustment(&config, 0.0), -0.03);
}

#[test]
fn adjusted_probability_is_clamped() {
    let signals = ModelSignals {
        bayesian: Some(BayesianEstimate {
            mean: 0.0,
            variance: 0.001,
            ci_low: 0.0,
            ci_high: 0.05,
        }),
        ..ModelSignals::default()
    };
    let prediction = combine_signals(&EnsembleConfig::default(), 0.0, signals);
    assert_close(prediction.adjusted_failure_probability, 0.0);
}

// ============================================================================
// SECTION: Members
// ============================================================================

#[test]
fn heuristic_matches_closed_form() {
    let features = clean_features();
    // Low risk (0.2), full impact, full stability.
    assert_close(heuristic_failure_probability(&features), 0.35 * 0.5);
}

#[test]
fn bayesian_posterior_moves_toward_observed_outcomes() {
    let features = clean_features();
    let estimate = BetaBayesianEstimator::default().estimate(&features);
    assert!(estimate.mean < heuristic_failure_probability(&features));
    assert!(estimate.ci_low <= estimate.mean && estimate.mean <= estimate.ci_high);
    assert!(estimate.variance < 0.01);
}

#[test]
fn invalid_prior_strength_is_rejected() {
    assert!(BetaBayesianEstimator::new(0.0).is_err());
    assert!(BetaBayesianEstimator::new(f64::NAN).is_err());
}

#[test]
fn registry_rejects_non_model_signals() {
    let result = PredictorRegistry::empty()
        .with_predictor(scripted(SignalKind::Heuristic, Script::Output(PredictorOutput::Probability(0.1))));
    assert!(result.is_err());
}

// ============================================================================
// SECTION: Guarded Execution
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn empty_registry_degrades_every_model_member() {
    let ensemble = EnsemblePredictor::new(PredictorRegistry::empty(), EnsembleConfig::default());
    let outcome = ensemble.predict(&clean_features()).await;
    assert!(!outcome.prediction.has_model_signal());
    let degraded: Vec<_> = outcome.degraded.iter().map(|entry| entry.signal).collect();
    assert_eq!(
        degraded,
        vec![SignalKind::NeuralNet, SignalKind::Sequence, SignalKind::MultiTask, SignalKind::Bayesian]
    );
    assert!(outcome.degraded.iter().all(|entry| entry.reason == "model not configured"));
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_members_are_contained() {
    let registry = PredictorRegistry::empty()
        .with_predictor(scripted(SignalKind::NeuralNet, Script::Fail))
        .and_then(|registry| registry.with_predictor(scripted(SignalKind::Sequence, Script::Panic)))
        .and_then(|registry| {
            registry.with_predictor(scripted(SignalKind::MultiTask, Script::Stall(Duration::from_millis(500))))
        })
        .and_then(|registry| {
            registry.with_predictor(scripted(
                SignalKind::Bayesian,
                Script::Output(PredictorOutput::Probability(0.2)),
            ))
        })
        .expect("registry");
    let config = EnsembleConfig {
        timeout: Duration::from_millis(50),
        ..EnsembleConfig::default()
    };
    let ensemble = EnsemblePredictor::new(registry, config);
    let outcome = ensemble.predict(&clean_features()).await;

    assert!(!outcome.prediction.has_model_signal());
    assert_eq!(outcome.degraded.len(), 4);
    assert!(outcome.degraded[0].reason.contains("scripted failure"));
    assert_eq!(outcome.degraded[1].reason, "component panicked");
    assert!(outcome.degraded[2].reason.starts_with("timed out"));
    assert!(outcome.degraded[3].reason.contains("unexpected output kind"));
}

#[tokio::test(flavor = "multi_thread")]
async fn out_of_range_outputs_are_rejected() {
    let registry = PredictorRegistry::empty()
        .with_predictor(scripted(SignalKind::NeuralNet, Script::Output(PredictorOutput::Probability(1.5))))
        .and_then(|registry| {
            registry.with_predictor(scripted(
                SignalKind::Sequence,
                Script::Output(PredictorOutput::Probability(f64::NAN)),
            ))
        })
        .expect("registry");
    let ensemble = EnsemblePredictor::new(registry, EnsembleConfig::default());
    let outcome = ensemble.predict(&clean_features()).await;
    assert!(outcome.prediction.nn.is_none());
    assert!(outcome.prediction.lstm.is_none());
    assert!(outcome.degraded.iter().any(|entry| entry.reason == "output out of range"));
}

#[tokio::test(flavor = "multi_thread")]
async fn healthy_members_land_in_their_own_slots() {
    let registry = PredictorRegistry::empty()
        .with_predictor(scripted(SignalKind::Sequence, Script::Output(PredictorOutput::Probability(0.3))))
        .and_then(|registry| registry.with_predictor(Arc::new(BetaBayesianEstimator::default())))
        .expect("registry");
    let ensemble = EnsemblePredictor::new(registry, EnsembleConfig::default());
    let outcome = ensemble.predict(&clean_features()).await;
    assert!(outcome.prediction.nn.is_none());
    assert_eq!(outcome.prediction.lstm, Some(0.3));
    assert!(outcome.prediction.bayesian.is_some());
    assert_eq!(outcome.prediction.model_signals().count(), 2);
    let degraded: Vec<_> = outcome.degraded.iter().map(|entry| entry.signal).collect();
    assert_eq!(degraded, vec![SignalKind::NeuralNet, SignalKind::MultiTask]);
}

#[tokio::test(flavor = "multi_thread")]
async fn non_finite_features_degrade_all_members() {
    let mut features = clean_features();
    features.values[5] = f64::INFINITY;
    let registry = PredictorRegistry::empty()
        .with_predictor(Arc::new(BetaBayesianEstimator::default()))
        .expect("registry");
    let ensemble = EnsemblePredictor::new(registry, EnsembleConfig::default());
    let outcome = ensemble.predict(&features).await;
    assert_eq!(outcome.degraded.len(), 4);
    assert!(!outcome.prediction.has_model_signal());
}
