// crates/deploy-gate-core/src/ensemble/registry.rs
// ============================================================================
// Module: Predictor Registry
// Description: Startup-resolved slots for optional ensemble members.
// Purpose: Load configured models once and report why a slot is empty.
// Dependencies: crate::{ensemble, guard, interfaces}, tokio, tracing
// ============================================================================

//! ## Overview
//! Each model-backed ensemble member has one slot. Slots are filled once when
//! the engine is built. Every artifact loads on the blocking pool behind a
//! time budget; an artifact that fails, panics, or times out leaves its slot
//! empty and the failure becomes the degraded reason on every decision.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::bayesian::BetaBayesianEstimator;
use super::models::ModelKind;
use super::models::load_model;
use crate::core::SignalKind;
use crate::guard::run_guarded;
use crate::interfaces::FailurePredictor;
use crate::interfaces::PredictorError;

/// Model-backed signals in ensemble order.
pub const MODEL_SIGNALS: [SignalKind; 4] =
    [SignalKind::NeuralNet, SignalKind::Sequence, SignalKind::MultiTask, SignalKind::Bayesian];

/// Reason recorded for slots that were never configured.
const NOT_CONFIGURED: &str = "model not configured";
/// Default time budget for loading one model artifact.
pub const DEFAULT_MODEL_LOAD_TIMEOUT: Duration = Duration::from_millis(10_000);

// ============================================================================
// SECTION: Sources
// ============================================================================

/// Where to load each model from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelSources {
    /// Feed-forward network artifact.
    pub neural_net: Option<PathBuf>,
    /// Sequence model artifact.
    pub sequence: Option<PathBuf>,
    /// Multi-task model artifact.
    pub multi_task: Option<PathBuf>,
    /// Prior strength for the built-in Bayesian estimator; `None` disables it.
    pub bayesian_prior_strength: Option<f64>,
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Optional ensemble members keyed by signal.
#[derive(Clone, Default)]
pub struct PredictorRegistry {
    /// Feed-forward network slot.
    neural_net: Option<Arc<dyn FailurePredictor>>,
    /// Sequence model slot.
    sequence: Option<Arc<dyn FailurePredictor>>,
    /// Multi-task model slot.
    multi_task: Option<Arc<dyn FailurePredictor>>,
    /// Bayesian estimator slot.
    bayesian: Option<Arc<dyn FailurePredictor>>,
    /// Load failures for empty slots.
    load_errors: BTreeMap<SignalKind, String>,
}

impl PredictorRegistry {
    /// Creates a registry with every slot empty.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads every configured model, each within `budget`.
    ///
    /// Failures, panics, and timeouts are logged and leave the slot empty.
    pub async fn load(sources: &ModelSources, budget: Duration) -> Self {
        let mut registry = Self::empty();
        let artifacts = [
            (ModelKind::NeuralNet, &sources.neural_net),
            (ModelKind::Sequence, &sources.sequence),
            (ModelKind::MultiTask, &sources.multi_task),
        ];
        for (kind, path) in artifacts {
            let Some(path) = path.clone() else {
                continue;
            };
            match run_guarded(budget, move || load_model(kind, &path)).await {
                Ok(model) => registry.fill(kind.signal(), Arc::new(model)),
                Err(failure) => registry.record_load_error(kind.signal(), failure.to_string()),
            }
        }
        if let Some(strength) = sources.bayesian_prior_strength {
            match BetaBayesianEstimator::new(strength) {
                Ok(estimator) => registry.fill(SignalKind::Bayesian, Arc::new(estimator)),
                Err(err) => registry.record_load_error(SignalKind::Bayesian, err.to_string()),
            }
        }
        tracing::info!(loaded = registry.loaded_count(), "predictor registry resolved");
        registry
    }

    /// Installs a predictor in the slot named by [`FailurePredictor::signal`].
    ///
    /// # Errors
    ///
    /// Returns [`PredictorError::ModelUnavailable`] when the predictor reports
    /// a signal that has no slot.
    pub fn with_predictor(mut self, predictor: Arc<dyn FailurePredictor>) -> Result<Self, PredictorError> {
        let signal = predictor.signal();
        if !MODEL_SIGNALS.contains(&signal) {
            return Err(PredictorError::ModelUnavailable(format!("no predictor slot for {signal}")));
        }
        self.fill(signal, predictor);
        self.load_errors.remove(&signal);
        Ok(self)
    }

    /// Returns the predictor in a slot.
    #[must_use]
    pub fn get(&self, signal: SignalKind) -> Option<&Arc<dyn FailurePredictor>> {
        match signal {
            SignalKind::NeuralNet => self.neural_net.as_ref(),
            SignalKind::Sequence => self.sequence.as_ref(),
            SignalKind::MultiTask => self.multi_task.as_ref(),
            SignalKind::Bayesian => self.bayesian.as_ref(),
            SignalKind::FileRisk | SignalKind::Heuristic | SignalKind::Fusion => None,
        }
    }

    /// Returns why a slot is empty.
    #[must_use]
    pub fn unavailable_reason(&self, signal: SignalKind) -> &str {
        self.load_errors.get(&signal).map_or(NOT_CONFIGURED, String::as_str)
    }

    /// Returns the number of filled slots.
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        MODEL_SIGNALS.iter().filter(|signal| self.get(**signal).is_some()).count()
    }

    /// Stores a predictor in the slot for `signal`. Non-model signals are ignored.
    fn fill(&mut self, signal: SignalKind, predictor: Arc<dyn FailurePredictor>) {
        let slot = match signal {
            SignalKind::NeuralNet => &mut self.neural_net,
            SignalKind::Sequence => &mut self.sequence,
            SignalKind::MultiTask => &mut self.multi_task,
            SignalKind::Bayesian => &mut self.bayesian,
            SignalKind::FileRisk | SignalKind::Heuristic | SignalKind::Fusion => return,
        };
        *slot = Some(predictor);
    }

    /// Records a load failure for a slot.
    fn record_load_error(&mut self, signal: SignalKind, reason: String) {
        tracing::warn!(signal = %signal, reason = %reason, "model failed to load; slot left empty");
        self.load_errors.insert(signal, reason);
    }
}

impl std::fmt::Debug for PredictorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let loaded: Vec<&str> = MODEL_SIGNALS
            .iter()
            .filter(|signal| self.get(**signal).is_some())
            .map(|signal| signal.as_str())
            .collect();
        f.debug_struct("PredictorRegistry")
            .field("loaded", &loaded)
            .field("load_errors", &self.load_errors)
            .finish()
    }
}
