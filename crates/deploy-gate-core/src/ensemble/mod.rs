// crates/deploy-gate-core/src/ensemble/mod.rs
// ============================================================================
// Module: Ensemble Predictor
// Description: Weighted combination of pluggable failure predictors.
// Purpose: Estimate deployment failure probability with graceful degradation.
// Dependencies: crate::{core, guard, interfaces}, serde, tokio, tracing
// ============================================================================

//! ## Overview
//! The heuristic member is always present. Model-backed members come from the
//! [`PredictorRegistry`]; each call runs on the blocking pool behind a timeout
//! and any error, panic, timeout, or out-of-range output removes the member
//! for that decision. The weights of missing members are added to the
//! heuristic, so effective weights always sum to one over the members that
//! produced a value.
//!
//! Security posture: model outputs are untrusted and are range-checked before
//! they reach the combination.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod bayesian;
pub mod features;
pub mod heuristic;
pub mod models;
pub mod registry;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub use bayesian::BetaBayesianEstimator;
pub use features::EnsembleFeatures;
pub use features::FEATURE_COUNT;
pub use heuristic::heuristic_failure_probability;
pub use models::ModelError;
pub use models::ModelKind;
pub use models::OnnxPredictor;
pub use registry::DEFAULT_MODEL_LOAD_TIMEOUT;
pub use registry::ModelSources;
pub use registry::PredictorRegistry;
use registry::MODEL_SIGNALS;
use serde::Deserialize;
use serde::Serialize;

use crate::core::DegradedSignal;
use crate::core::SignalKind;
use crate::guard::run_guarded;
use crate::interfaces::PredictorOutput;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default variance at or above which the Bayesian adjustment raises risk.
pub const DEFAULT_HIGH_VARIANCE: f64 = 0.04;
/// Default variance at or below which the Bayesian adjustment lowers risk.
pub const DEFAULT_LOW_VARIANCE: f64 = 0.01;
/// Default per-predictor time budget.
pub const DEFAULT_PREDICTOR_TIMEOUT: Duration = Duration::from_millis(2_000);
/// Maximum upward Bayesian adjustment.
const MAX_HIGH_VARIANCE_ADJUSTMENT: f64 = 0.10;
/// Upward adjustment at exactly the high-variance threshold.
const HIGH_VARIANCE_ADJUSTMENT_SCALE: f64 = 0.05;
/// Downward adjustment for confident posteriors.
const LOW_VARIANCE_ADJUSTMENT: f64 = -0.03;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Base weights of the ensemble members.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EnsembleWeights {
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

impl EnsembleWeights {
    /// Returns the base weight of a signal. Non-ensemble signals weigh zero.
    #[must_use]
    pub const fn base(&self, signal: SignalKind) -> f64 {
        match signal {
            SignalKind::NeuralNet => self.neural_net,
            SignalKind::Sequence => self.sequence,
            SignalKind::MultiTask => self.multi_task,
            SignalKind::Bayesian => self.bayesian,
            SignalKind::Heuristic => self.heuristic,
            SignalKind::FileRisk | SignalKind::Fusion => 0.0,
        }
    }

    /// Returns the sum of all member weights.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.neural_net + self.sequence + self.multi_task + self.bayesian + self.heuristic
    }
}

impl Default for EnsembleWeights {
    fn default() -> Self {
        Self {
            neural_net: 0.25,
            sequence: 0.20,
            multi_task: 0.20,
            bayesian: 0.15,
            heuristic: 0.20,
        }
    }
}

/// Ensemble settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleConfig {
    /// Base member weights.
    pub weights: EnsembleWeights,
    /// Variance at or above which risk is raised.
    pub high_variance: f64,
    /// Variance at or below which risk is lowered.
    pub low_variance: f64,
    /// Time budget per predictor call.
    pub timeout: Duration,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            weights: EnsembleWeights::default(),
            high_variance: DEFAULT_HIGH_VARIANCE,
            low_variance: DEFAULT_LOW_VARIANCE,
            timeout: DEFAULT_PREDICTOR_TIMEOUT,
        }
    }
}

// ============================================================================
// SECTION: Predictions
// ============================================================================

/// Multi-task model output; every field is a probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiTaskEstimate {
    /// Probability the deployment succeeds.
    pub success: f64,
    /// Probability of a performance regression.
    pub performance: f64,
    /// Probability of a security issue.
    pub security: f64,
    /// Probability of downtime.
    pub downtime: f64,
}

impl MultiTaskEstimate {
    /// Returns the failure probability implied by the success head.
    #[must_use]
    pub fn failure_probability(&self) -> f64 {
        1.0 - self.success
    }

    /// Returns true when every field is a probability.
    fn in_range(&self) -> bool {
        [self.success, self.performance, self.security, self.downtime].iter().all(|value| is_probability(*value))
    }
}

/// Bayesian posterior summary of the failure probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BayesianEstimate {
    /// Posterior mean.
    pub mean: f64,
    /// Posterior variance.
    pub variance: f64,
    /// Lower bound of the 95% interval.
    pub ci_low: f64,
    /// Upper bound of the 95% interval.
    pub ci_high: f64,
}

impl BayesianEstimate {
    /// Returns the width of the 95% interval.
    #[must_use]
    pub fn interval_width(&self) -> f64 {
        self.ci_high - self.ci_low
    }

    /// Returns true when the summary is internally consistent.
    fn in_range(&self) -> bool {
        is_probability(self.mean)
            && is_probability(self.ci_low)
            && is_probability(self.ci_high)
            && self.ci_low <= self.ci_high
            && self.variance.is_finite()
            && (0.0 ..= 0.25).contains(&self.variance)
    }
}

/// Values produced by the model-backed members for one decision.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModelSignals {
    /// Feed-forward network failure probability.
    pub neural_net: Option<f64>,
    /// Sequence model failure probability.
    pub sequence: Option<f64>,
    /// Multi-task model output.
    pub multi_task: Option<MultiTaskEstimate>,
    /// Bayesian posterior.
    pub bayesian: Option<BayesianEstimate>,
}

impl ModelSignals {
    /// Returns the failure probability contributed by a signal, if present.
    #[must_use]
    pub fn probability(&self, signal: SignalKind) -> Option<f64> {
        match signal {
            SignalKind::NeuralNet => self.neural_net,
            SignalKind::Sequence => self.sequence,
            SignalKind::MultiTask => self.multi_task.map(|estimate| estimate.failure_probability()),
            SignalKind::Bayesian => self.bayesian.map(|estimate| estimate.mean),
            SignalKind::FileRisk | SignalKind::Heuristic | SignalKind::Fusion => None,
        }
    }

    /// Returns the number of members that produced a value.
    #[must_use]
    pub fn count(&self) -> usize {
        MODEL_SIGNALS.iter().filter(|signal| self.probability(**signal).is_some()).count()
    }
}

/// Combined ensemble output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsemblePrediction {
    /// Feed-forward network failure probability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nn: Option<f64>,
    /// Sequence model failure probability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lstm: Option<f64>,
    /// Heuristic failure probability.
    pub heuristic: f64,
    /// Multi-task model output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtl: Option<MultiTaskEstimate>,
    /// Bayesian posterior.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bayesian: Option<BayesianEstimate>,
    /// Weighted failure probability before the Bayesian adjustment.
    pub ensemble_failure_probability: f64,
    /// Bayesian adjustment when a posterior was available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bayesian_adjustment: Option<f64>,
    /// Failure probability after the Bayesian adjustment.
    pub adjusted_failure_probability: f64,
    /// Effective weights of the members that produced a value.
    pub weights: BTreeMap<String, f64>,
}

impl EnsemblePrediction {
    /// Returns the model-backed signals captured in this prediction.
    #[must_use]
    pub const fn model_signals(&self) -> ModelSignals {
        ModelSignals {
            neural_net: self.nn,
            sequence: self.lstm,
            multi_task: self.mtl,
            bayesian: self.bayesian,
        }
    }

    /// Returns every available failure probability, heuristic included.
    #[must_use]
    pub fn signal_probabilities(&self) -> Vec<(SignalKind, f64)> {
        let signals = self.model_signals();
        MODEL_SIGNALS
            .iter()
            .filter_map(|signal| signals.probability(*signal).map(|value| (*signal, value)))
            .chain(std::iter::once((SignalKind::Heuristic, self.heuristic)))
            .collect()
    }

    /// Returns true when at least one model-backed member produced a value.
    #[must_use]
    pub fn has_model_signal(&self) -> bool {
        self.model_signals().count() > 0
    }
}

// ============================================================================
// SECTION: Combination
// ============================================================================

/// Returns the Bayesian risk adjustment for a posterior variance.
#[must_use]
pub fn bayesian_adjustment(config: &EnsembleConfig, variance: f64) -> f64 {
    if variance >= config.high_variance {
        (HIGH_VARIANCE_ADJUSTMENT_SCALE * variance / config.high_variance).min(MAX_HIGH_VARIANCE_ADJUSTMENT)
    } else if variance <= config.low_variance {
        LOW_VARIANCE_ADJUSTMENT
    } else {
        0.0
    }
}

/// Combines the heuristic and available model signals into a prediction.
#[must_use]
pub fn combine_signals(config: &EnsembleConfig, heuristic: f64, signals: ModelSignals) -> EnsemblePrediction {
    let weights = &config.weights;
    let mut entries: Vec<(SignalKind, f64, f64)> = Vec::with_capacity(MODEL_SIGNALS.len() + 1);
    let mut absorbed = 0.0;
    for signal in MODEL_SIGNALS {
        match signals.probability(signal) {
            Some(value) => entries.push((signal, weights.base(signal), value)),
            None => absorbed += weights.base(signal),
        }
    }
    entries.push((SignalKind::Heuristic, weights.heuristic + absorbed, heuristic));

    let total: f64 = entries.iter().map(|(_, weight, _)| weight).sum();
    if total <= 0.0 {
        entries = vec![(SignalKind::Heuristic, 1.0, heuristic)];
    }
    let total = if total <= 0.0 { 1.0 } else { total };

    let ensemble = entries.iter().map(|(_, weight, value)| weight / total * value).sum::<f64>().clamp(0.0, 1.0);
    let adjustment = signals.bayesian.map(|estimate| bayesian_adjustment(config, estimate.variance));
    let adjusted = (ensemble + adjustment.unwrap_or(0.0)).clamp(0.0, 1.0);

    EnsemblePrediction {
        nn: signals.neural_net,
        lstm: signals.sequence,
        heuristic,
        mtl: signals.multi_task,
        bayesian: signals.bayesian,
        ensemble_failure_probability: ensemble,
        bayesian_adjustment: adjustment,
        adjusted_failure_probability: adjusted,
        weights: entries
            .iter()
            .map(|(signal, weight, _)| (signal.as_str().to_string(), weight / total))
            .collect(),
    }
}

// ============================================================================
// SECTION: Predictor
// ============================================================================

/// Ensemble prediction plus the members that were unavailable.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleOutcome {
    /// Combined prediction.
    pub prediction: EnsemblePrediction,
    /// Members that produced no value, with reasons.
    pub degraded: Vec<DegradedSignal>,
}

/// Runs registered predictors and combines their outputs.
#[derive(Debug, Clone)]
pub struct EnsemblePredictor {
    /// Resolved predictor slots.
    registry: PredictorRegistry,
    /// Ensemble settings.
    config: EnsembleConfig,
}

impl EnsemblePredictor {
    /// Creates an ensemble over a resolved registry.
    #[must_use]
    pub const fn new(registry: PredictorRegistry, config: EnsembleConfig) -> Self {
        Self {
            registry,
            config,
        }
    }

    /// Returns the ensemble settings.
    #[must_use]
    pub const fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    /// Returns the predictor registry.
    #[must_use]
    pub const fn registry(&self) -> &PredictorRegistry {
        &self.registry
    }

    /// Runs every member and combines the results. Never fails.
    pub async fn predict(&self, features: &EnsembleFeatures) -> EnsembleOutcome {
        let heuristic = heuristic_failure_probability(features);
        let mut signals = ModelSignals::default();
        let mut degraded = Vec::new();

        if features.is_finite() {
            let shared = Arc::new(features.clone());
            for signal in MODEL_SIGNALS {
                match self.run_member(signal, &shared).await {
                    Ok(output) => store_output(&mut signals, signal, output),
                    Err(reason) => degraded.push(DegradedSignal::new(signal, reason)),
                }
            }
        } else {
            for signal in MODEL_SIGNALS {
                degraded.push(DegradedSignal::new(signal, "invalid features: non-finite value"));
            }
        }

        for entry in &degraded {
            tracing::warn!(signal = %entry.signal, reason = %entry.reason, "ensemble signal unavailable");
        }

        EnsembleOutcome {
            prediction: combine_signals(&self.config, heuristic, signals),
            degraded,
        }
    }

    /// Runs one member behind the guard and checks its output.
    async fn run_member(&self, signal: SignalKind, features: &Arc<EnsembleFeatures>) -> Result<PredictorOutput, String> {
        let predictor = self
            .registry
            .get(signal)
            .cloned()
            .ok_or_else(|| self.registry.unavailable_reason(signal).to_string())?;
        let features = Arc::clone(features);
        let output = run_guarded(self.config.timeout, move || predictor.predict(&features))
            .await
            .map_err(|failure| failure.to_string())?;
        check_output(signal, output)
    }
}

/// Verifies an output matches its slot and lies in range.
fn check_output(signal: SignalKind, output: PredictorOutput) -> Result<PredictorOutput, String> {
    let valid = match (signal, output) {
        (SignalKind::NeuralNet | SignalKind::Sequence, PredictorOutput::Probability(value)) => {
            is_probability(value)
        }
        (SignalKind::MultiTask, PredictorOutput::MultiTask(estimate)) => estimate.in_range(),
        (SignalKind::Bayesian, PredictorOutput::Bayesian(estimate)) => estimate.in_range(),
        _ => return Err(format!("unexpected output kind for {signal}")),
    };
    if valid { Ok(output) } else { Err("output out of range".to_string()) }
}

/// Stores a checked output in the slot of its signal.
fn store_output(signals: &mut ModelSignals, signal: SignalKind, output: PredictorOutput) {
    match (signal, output) {
        (SignalKind::Sequence, PredictorOutput::Probability(value)) => signals.sequence = Some(value),
        (_, PredictorOutput::Probability(value)) => signals.neural_net = Some(value),
        (_, PredictorOutput::MultiTask(estimate)) => signals.multi_task = Some(estimate),
        (_, PredictorOutput::Bayesian(estimate)) => signals.bayesian = Some(estimate),
    }
}

/// Returns true for finite values in `[0, 1]`.
fn is_probability(value: f64) -> bool {
    value.is_finite() && (0.0 ..= 1.0).contains(&value)
}
