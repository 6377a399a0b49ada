// crates/deploy-gate-core/src/audit.rs
// ============================================================================
// Module: Deploy Gate Audit Logger
// Description: Append-only record of decision phases with hashed export.
// Purpose: Make every decision reproducible and reviewable after the fact.
// Dependencies: crate::core, rand, serde, serde_json, tokio, tracing
// ============================================================================

//! ## Overview
//! An [`AuditLogger`] is created by the caller and shared with the decision
//! engine through an `Arc`. It buffers one run of entries in memory. Exports
//! are written atomically (temp file + rename) as `deploy-audit-<runId>.json`
//! and carry a SHA-256 digest over the RFC 8785 canonical JSON of the run
//! body, so tampering with any entry is detectable.
//!
//! Export failures never affect decisions: callers choose between the
//! fallible [`AuditLogger::export`] and the warning-only variants.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io;
use std::io::ErrorKind;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use rand::RngCore;
use rand::rngs::OsRng;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::core::BaselineStability;
use crate::core::DegradedSignal;
use crate::core::MlAssessment;
use crate::core::RiskCategory;
use crate::core::RiskClassification;
use crate::core::TestImpact;
use crate::core::Timestamp;
use crate::core::hashing::HashDigest;
use crate::core::hashing::HashError;
use crate::core::hashing::hash_canonical_json;
use crate::core::hashing::to_hex;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// File name prefix of exported runs.
pub const AUDIT_FILE_PREFIX: &str = "deploy-audit-";
/// Random bytes appended to run identifiers.
const RUN_ID_SUFFIX_BYTES: usize = 4;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Audit export errors.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Filesystem failure.
    #[error("audit io error: {0}")]
    Io(String),
    /// Run could not be serialized.
    #[error("audit serialization error: {0}")]
    Serialization(String),
    /// Run digest could not be computed.
    #[error(transparent)]
    Hash(#[from] HashError),
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// Summary of the final scoring phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalScoreRecord {
    /// Deterministic score before ML blending.
    pub base_score: f64,
    /// Final confidence.
    pub confidence: f64,
    /// Threshold applied.
    pub required_confidence: f64,
    /// Verdict.
    pub can_deploy: bool,
    /// Risk category that selected the threshold.
    pub risk_category: RiskCategory,
}

/// Payload of one audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum AuditRecord {
    /// Risk classification output.
    RiskAnalysis(RiskClassification),
    /// Test impact output.
    TestImpact(TestImpact),
    /// Baseline stability output.
    BaselineStability(BaselineStability),
    /// ML assessment attached to the decision.
    MlPrediction(MlAssessment),
    /// Optional signal that was unavailable.
    DegradedSignal(DegradedSignal),
    /// Final score and verdict.
    FinalScore(FinalScoreRecord),
}

impl AuditRecord {
    /// Returns the wire label of the record kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RiskAnalysis(_) => "riskAnalysis",
            Self::TestImpact(_) => "testImpact",
            Self::BaselineStability(_) => "baselineStability",
            Self::MlPrediction(_) => "mlPrediction",
            Self::DegradedSignal(_) => "degradedSignal",
            Self::FinalScore(_) => "finalScore",
        }
    }
}

/// One buffered audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// One-based position within the run.
    pub sequence: u64,
    /// Time the entry was recorded.
    pub timestamp: Timestamp,
    /// Entry payload.
    pub record: AuditRecord,
}

/// Entry counts per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStats {
    /// All entries.
    pub total: u64,
    /// Risk analysis entries.
    pub risk_analysis: u64,
    /// Test impact entries.
    pub test_impact: u64,
    /// Baseline stability entries.
    pub baseline_stability: u64,
    /// ML prediction entries.
    pub ml_prediction: u64,
    /// Degraded signal entries.
    pub degraded_signal: u64,
    /// Final score entries.
    pub final_score: u64,
}

impl AuditStats {
    /// Counts one record.
    fn count(&mut self, record: &AuditRecord) {
        self.total += 1;
        match record {
            AuditRecord::RiskAnalysis(_) => self.risk_analysis += 1,
            AuditRecord::TestImpact(_) => self.test_impact += 1,
            AuditRecord::BaselineStability(_) => self.baseline_stability += 1,
            AuditRecord::MlPrediction(_) => self.ml_prediction += 1,
            AuditRecord::DegradedSignal(_) => self.degraded_signal += 1,
            AuditRecord::FinalScore(_) => self.final_score += 1,
        }
    }
}

/// Exported audit run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRun {
    /// Run identifier.
    pub run_id: String,
    /// RFC 3339 export time.
    pub timestamp: String,
    /// Entries in recording order.
    pub entries: Vec<AuditEntry>,
    /// Entry counts.
    pub stats: AuditStats,
    /// Digest over the canonical run body.
    pub digest: HashDigest,
}

/// Hashed portion of an [`AuditRun`].
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuditRunBody<'a> {
    /// Run identifier.
    run_id: &'a str,
    /// RFC 3339 export time.
    timestamp: &'a str,
    /// Entries in recording order.
    entries: &'a [AuditEntry],
    /// Entry counts.
    stats: &'a AuditStats,
}

impl AuditRun {
    /// Recomputes the digest and compares it with the stored one.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Hash`] when the body cannot be canonicalized.
    pub fn verify_digest(&self) -> Result<bool, AuditError> {
        let digest = hash_canonical_json(&AuditRunBody {
            run_id: &self.run_id,
            timestamp: &self.timestamp,
            entries: &self.entries,
            stats: &self.stats,
        })?;
        Ok(digest == self.digest)
    }

    /// Returns the export file name for this run.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{AUDIT_FILE_PREFIX}{}.json", self.run_id)
    }
}

// ============================================================================
// SECTION: Logger
// ============================================================================

/// Mutable state of the current run.
#[derive(Debug)]
struct AuditState {
    /// Current run identifier.
    run_id: String,
    /// Buffered entries.
    entries: Vec<AuditEntry>,
    /// Entry counts.
    stats: AuditStats,
}

/// Buffered audit logger for decision runs.
#[derive(Debug)]
pub struct AuditLogger {
    /// Current run state.
    state: Mutex<AuditState>,
    /// Number of runs started by this logger.
    run_sequence: AtomicU64,
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditLogger {
    /// Creates a logger with a fresh run.
    #[must_use]
    pub fn new() -> Self {
        let run_sequence = AtomicU64::new(0);
        let run_id = next_run_id(&run_sequence);
        Self {
            state: Mutex::new(AuditState {
                run_id,
                entries: Vec::new(),
                stats: AuditStats::default(),
            }),
            run_sequence,
        }
    }

    /// Returns the current run identifier.
    #[must_use]
    pub fn run_id(&self) -> String {
        self.lock().run_id.clone()
    }

    /// Returns a snapshot of the buffered entries.
    #[must_use]
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.lock().entries.clone()
    }

    /// Returns entry counts for the current run.
    #[must_use]
    pub fn stats(&self) -> AuditStats {
        self.lock().stats
    }

    /// Records a risk classification.
    pub fn record_risk_analysis(&self, risk: &RiskClassification) {
        self.append(AuditRecord::RiskAnalysis(risk.clone()));
    }

    /// Records a test impact score.
    pub fn record_test_impact(&self, impact: &TestImpact) {
        self.append(AuditRecord::TestImpact(*impact));
    }

    /// Records a baseline stability analysis.
    pub fn record_baseline_stability(&self, stability: &BaselineStability) {
        self.append(AuditRecord::BaselineStability(*stability));
    }

    /// Records an ML assessment.
    pub fn record_ml_prediction(&self, assessment: &MlAssessment) {
        self.append(AuditRecord::MlPrediction(assessment.clone()));
    }

    /// Records an unavailable optional signal.
    pub fn record_degraded_signal(&self, signal: &DegradedSignal) {
        self.append(AuditRecord::DegradedSignal(signal.clone()));
    }

    /// Records the final score and verdict.
    pub fn record_final_score(&self, record: FinalScoreRecord) {
        self.append(AuditRecord::FinalScore(record));
    }

    /// Empties the buffer and starts a new run.
    pub fn clear(&self) {
        let run_id = next_run_id(&self.run_sequence);
        let mut state = self.lock();
        state.run_id = run_id;
        state.entries.clear();
        state.stats = AuditStats::default();
    }

    /// Builds a hashed snapshot of the current run.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when the run cannot be hashed.
    pub fn snapshot(&self) -> Result<AuditRun, AuditError> {
        let (run_id, entries, stats) = {
            let state = self.lock();
            (state.run_id.clone(), state.entries.clone(), state.stats)
        };
        let timestamp = Timestamp::now().to_rfc3339().unwrap_or_default();
        let digest = hash_canonical_json(&AuditRunBody {
            run_id: &run_id,
            timestamp: &timestamp,
            entries: &entries,
            stats: &stats,
        })?;
        Ok(AuditRun {
            run_id,
            timestamp,
            entries,
            stats,
            digest,
        })
    }

    /// Exports the current run to `dir` and returns the written path.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when hashing or writing fails.
    pub fn export(&self, dir: &Path) -> Result<PathBuf, AuditError> {
        let run = self.snapshot()?;
        write_run(dir, &run)
    }

    /// Exports the current run, reducing any failure to a warning.
    pub fn export_or_warn(&self, dir: &Path) -> Option<PathBuf> {
        match self.export(dir) {
            Ok(path) => Some(path),
            Err(err) => {
                tracing::warn!(dir = %dir.display(), reason = %err, "audit export failed");
                None
            }
        }
    }

    /// Snapshots the run now and writes it on the blocking pool.
    ///
    /// The returned handle may be dropped; the write still completes. Without
    /// a tokio runtime the run is written inline and `None` is returned.
    pub fn export_in_background(&self, dir: PathBuf) -> Option<JoinHandle<()>> {
        let run = match self.snapshot() {
            Ok(run) => run,
            Err(err) => {
                tracing::warn!(reason = %err, "audit snapshot failed");
                return None;
            }
        };
        let write = move || {
            if let Err(err) = write_run(&dir, &run) {
                tracing::warn!(dir = %dir.display(), reason = %err, "audit export failed");
            }
        };
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            Some(handle.spawn_blocking(write))
        } else {
            write();
            None
        }
    }

    /// Appends a record to the current run.
    fn append(&self, record: AuditRecord) {
        let mut state = self.lock();
        let sequence = state.stats.total + 1;
        tracing::debug!(run_id = %state.run_id, sequence, kind = record.kind(), "audit entry recorded");
        state.stats.count(&record);
        state.entries.push(AuditEntry {
            sequence,
            timestamp: Timestamp::now(),
            record,
        });
    }

    /// Locks the run state, recovering from poisoning.
    fn lock(&self) -> MutexGuard<'_, AuditState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds `<unixMillis>-<sequence>-<random hex>` and advances the sequence.
fn next_run_id(run_sequence: &AtomicU64) -> String {
    let sequence = run_sequence.fetch_add(1, Ordering::SeqCst) + 1;
    let millis = Timestamp::now().as_unix_millis();
    let mut suffix = [0_u8; RUN_ID_SUFFIX_BYTES];
    if let Err(err) = OsRng.try_fill_bytes(&mut suffix) {
        tracing::warn!(reason = %err, "os rng unavailable; run id suffix is zero");
    }
    format!("{millis}-{sequence}-{}", to_hex(&suffix))
}

/// Writes a run atomically into `dir`. The temp file is removed on failure.
fn write_run(dir: &Path, run: &AuditRun) -> Result<PathBuf, AuditError> {
    fs::create_dir_all(dir).map_err(|err| AuditError::Io(err.to_string()))?;
    let path = dir.join(run.file_name());
    let temp_path = path.with_extension("json.tmp");
    let bytes = serde_json::to_vec_pretty(run).map_err(|err| AuditError::Serialization(err.to_string()))?;
    let written = write_synced(&temp_path, &bytes)
        .and_then(|()| fs::rename(&temp_path, &path))
        .map_err(|err| AuditError::Io(err.to_string()));
    if let Err(err) = written {
        if let Err(cleanup) = fs::remove_file(&temp_path)
            && cleanup.kind() != ErrorKind::NotFound
        {
            tracing::warn!(path = %temp_path.display(), reason = %cleanup, "audit temp file not removed");
        }
        return Err(err);
    }
    tracing::info!(run_id = %run.run_id, path = %path.display(), entries = run.entries.len(), "audit run exported");
    Ok(path)
}

/// Creates or truncates `path`, writes `bytes`, and syncs to disk.
fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::OpenOptions::new().create(true).write(true).truncate(true).open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
