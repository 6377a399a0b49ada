// crates/deploy-gate-core/src/ensemble/models.rs
// ============================================================================
// Module: Model Inference
// Description: ONNX Runtime sessions for externally trained predictors.
// Purpose: Run trained NN, LSTM, and multi-task models behind the predictor seam.
// Dependencies: crate::{ensemble, interfaces}, ndarray, ort, parking_lot
// ============================================================================

//! ## Overview
//! Each trained model is an ONNX graph with exactly one `float32` input:
//!
//! - [`ModelKind::NeuralNet`]: `[1, FEATURE_COUNT]` feature row, first output
//!   holds the failure probability.
//! - [`ModelKind::Sequence`]: `[1, SEQUENCE_LENGTH, SEQUENCE_WIDTH]` history
//!   window, oldest first and front-padded with the oldest row; first output
//!   holds the failure probability.
//! - [`ModelKind::MultiTask`]: `[1, FEATURE_COUNT]` feature row, with outputs
//!   named `success`, `performance`, `security`, and `downtime`.
//!
//! The graph signature is checked once at load time. Output values are
//! untrusted and are range-checked by the ensemble.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Read;
use std::path::Path;

use ndarray::Array2;
use ndarray::Array3;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::Tensor;
use parking_lot::Mutex;
use thiserror::Error;

use super::MultiTaskEstimate;
use super::features::EnsembleFeatures;
use super::features::FEATURE_COUNT;
use super::features::SEQUENCE_WIDTH;
use crate::core::SignalKind;
use crate::interfaces::FailurePredictor;
use crate::interfaces::PredictorError;
use crate::interfaces::PredictorOutput;
use crate::scoring::stability::STABILITY_WINDOW;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum model artifact size in bytes.
pub const MAX_MODEL_BYTES: u64 = 64 * 1024 * 1024;
/// Number of history steps fed to the sequence model.
pub const SEQUENCE_LENGTH: usize = STABILITY_WINDOW;
/// Output names of a multi-task graph, in [`MultiTaskEstimate`] order.
pub const MULTI_TASK_OUTPUTS: [&str; 4] = ["success", "performance", "security", "downtime"];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Model loading errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Artifact could not be read.
    #[error("model io error: {0}")]
    Io(String),
    /// ONNX Runtime rejected the artifact.
    #[error("model load error: {0}")]
    Load(String),
    /// Graph inputs or outputs do not match the model kind.
    #[error("model shape error: {0}")]
    Shape(String),
}

// ============================================================================
// SECTION: Model Kinds
// ============================================================================

/// Trained model families the ensemble consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// Feed-forward network over the feature row.
    NeuralNet,
    /// Sequence model over the history window.
    Sequence,
    /// Multi-task model over the feature row.
    MultiTask,
}

impl ModelKind {
    /// Returns the ensemble slot filled by this kind.
    #[must_use]
    pub const fn signal(self) -> SignalKind {
        match self {
            Self::NeuralNet => SignalKind::NeuralNet,
            Self::Sequence => SignalKind::Sequence,
            Self::MultiTask => SignalKind::MultiTask,
        }
    }
}

// ============================================================================
// SECTION: Predictor
// ============================================================================

/// Loaded ONNX session for one ensemble slot.
pub struct OnnxPredictor {
    /// Model family.
    kind: ModelKind,
    /// Session; `run` needs exclusive access.
    session: Mutex<Session>,
    /// Output names read after each run, in interpretation order.
    outputs: Vec<String>,
}

impl OnnxPredictor {
    /// Builds a session from ONNX bytes and checks its signature.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Load`] when ONNX Runtime rejects the graph and
    /// [`ModelError::Shape`] when its signature does not match `kind`.
    pub fn from_bytes(kind: ModelKind, bytes: &[u8]) -> Result<Self, ModelError> {
        let session = Session::builder()
            .map_err(|err| ModelError::Load(err.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|err| ModelError::Load(err.to_string()))?
            .commit_from_memory(bytes)
            .map_err(|err| ModelError::Load(err.to_string()))?;
        let output_names: Vec<String> = session.outputs.iter().map(|output| output.name.clone()).collect();
        let outputs = resolve_outputs(kind, session.inputs.len(), &output_names)?;
        Ok(Self {
            kind,
            session: Mutex::new(session),
            outputs,
        })
    }

    /// Returns the model family.
    #[must_use]
    pub const fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Runs the session and reads the first value of each resolved output.
    fn run(&self, input: Tensor<f32>) -> Result<Vec<f64>, PredictorError> {
        let mut session = self.session.lock();
        let outputs =
            session.run(ort::inputs![input]).map_err(|err| PredictorError::Inference(err.to_string()))?;
        self.outputs
            .iter()
            .map(|name| {
                let value = outputs
                    .get(name.as_str())
                    .ok_or_else(|| PredictorError::Inference(format!("missing output {name}")))?;
                let (_, data) = value
                    .try_extract_tensor::<f32>()
                    .map_err(|err| PredictorError::Inference(format!("output {name}: {err}")))?;
                data.first()
                    .map(|first| f64::from(*first))
                    .ok_or_else(|| PredictorError::Inference(format!("output {name} is empty")))
            })
            .collect()
    }
}

impl FailurePredictor for OnnxPredictor {
    fn signal(&self) -> SignalKind {
        self.kind.signal()
    }

    fn predict(&self, features: &EnsembleFeatures) -> Result<PredictorOutput, PredictorError> {
        let input = match self.kind {
            ModelKind::Sequence => Tensor::from_array(sequence_tensor(features)?),
            ModelKind::NeuralNet | ModelKind::MultiTask => Tensor::from_array(feature_tensor(features)),
        }
        .map_err(|err| PredictorError::Inference(format!("tensor error: {err}")))?;
        let values = self.run(input)?;
        interpret_outputs(self.kind, &values)
    }
}

impl std::fmt::Debug for OnnxPredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxPredictor").field("kind", &self.kind).field("outputs", &self.outputs).finish()
    }
}

// ============================================================================
// SECTION: Tensors
// ============================================================================

/// Narrows a bounded feature to the `float32` the graphs consume.
#[allow(clippy::cast_possible_truncation, reason = "Features are bounded to [0, 1].")]
fn to_f32(value: f64) -> f32 {
    value as f32
}

/// Builds the `[1, FEATURE_COUNT]` input row.
#[must_use]
pub fn feature_tensor(features: &EnsembleFeatures) -> Array2<f32> {
    Array2::from_shape_fn((1, FEATURE_COUNT), |(_, column)| to_f32(features.values[column]))
}

/// Builds the `[1, SEQUENCE_LENGTH, SEQUENCE_WIDTH]` history window.
///
/// Keeps the most recent [`SEQUENCE_LENGTH`] rows and front-pads shorter
/// histories with the oldest row.
///
/// # Errors
///
/// Returns [`PredictorError::InvalidFeatures`] when the history is empty.
pub fn sequence_tensor(features: &EnsembleFeatures) -> Result<Array3<f32>, PredictorError> {
    let rows = &features.sequence[features.sequence.len().saturating_sub(SEQUENCE_LENGTH) ..];
    let oldest = rows
        .first()
        .ok_or_else(|| PredictorError::InvalidFeatures("empty history sequence".to_string()))?;
    let padding = SEQUENCE_LENGTH - rows.len();
    Ok(Array3::from_shape_fn((1, SEQUENCE_LENGTH, SEQUENCE_WIDTH), |(_, step, column)| {
        let row = step.checked_sub(padding).and_then(|index| rows.get(index)).unwrap_or(oldest);
        to_f32(row[column])
    }))
}

// ============================================================================
// SECTION: Signatures
// ============================================================================

/// Checks a graph signature and returns the output names to read.
///
/// # Errors
///
/// Returns [`ModelError::Shape`] when the graph does not take exactly one
/// input or lacks the outputs `kind` needs.
pub fn resolve_outputs(kind: ModelKind, input_count: usize, outputs: &[String]) -> Result<Vec<String>, ModelError> {
    let label = kind.signal();
    if input_count != 1 {
        return Err(ModelError::Shape(format!("{label}: expected 1 input, found {input_count}")));
    }
    match kind {
        ModelKind::NeuralNet | ModelKind::Sequence => outputs
            .first()
            .map(|name| vec![name.clone()])
            .ok_or_else(|| ModelError::Shape(format!("{label}: graph has no outputs"))),
        ModelKind::MultiTask => MULTI_TASK_OUTPUTS
            .iter()
            .map(|required| {
                outputs
                    .iter()
                    .find(|name| name.as_str() == *required)
                    .cloned()
                    .ok_or_else(|| ModelError::Shape(format!("{label}: missing output {required}")))
            })
            .collect(),
    }
}

/// Maps raw output values to a predictor output.
///
/// # Errors
///
/// Returns [`PredictorError::Inference`] when the value count does not match
/// `kind`.
pub fn interpret_outputs(kind: ModelKind, values: &[f64]) -> Result<PredictorOutput, PredictorError> {
    match (kind, values) {
        (ModelKind::NeuralNet | ModelKind::Sequence, [probability]) => {
            Ok(PredictorOutput::Probability(*probability))
        }
        (ModelKind::MultiTask, [success, performance, security, downtime]) => {
            Ok(PredictorOutput::MultiTask(MultiTaskEstimate {
                success: *success,
                performance: *performance,
                security: *security,
                downtime: *downtime,
            }))
        }
        _ => Err(PredictorError::Inference(format!(
            "{}: unexpected output count {}",
            kind.signal(),
            values.len()
        ))),
    }
}

// ============================================================================
// SECTION: Loading
// ============================================================================

/// Loads an ONNX model from disk.
///
/// # Errors
///
/// Returns [`ModelError`] when the file cannot be read, exceeds
/// [`MAX_MODEL_BYTES`], or is rejected by ONNX Runtime.
pub fn load_model(kind: ModelKind, path: &Path) -> Result<OnnxPredictor, ModelError> {
    let file = fs::File::open(path).map_err(|err| ModelError::Io(format!("{}: {err}", path.display())))?;
    let mut bytes = Vec::new();
    file.take(MAX_MODEL_BYTES + 1)
        .read_to_end(&mut bytes)
        .map_err(|err| ModelError::Io(format!("{}: {err}", path.display())))?;
    if bytes.len() as u64 > MAX_MODEL_BYTES {
        return Err(ModelError::Io(format!("{}: exceeds {MAX_MODEL_BYTES} bytes", path.display())));
    }
    tracing::debug!(path = %path.display(), bytes = bytes.len(), signal = %kind.signal(), "loading onnx model");
    OnnxPredictor::from_bytes(kind, &bytes)
}
