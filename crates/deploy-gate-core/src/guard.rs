// crates/deploy-gate-core/src/guard.rs
// ============================================================================
// Module: Guarded Execution
// Description: Time-boxed execution of optional components.
// Purpose: Contain errors, panics, and timeouts of pluggable collaborators.
// Dependencies: tokio
// ============================================================================

//! ## Overview
//! Optional components run on the tokio blocking pool behind a timeout. Any
//! failure is reported as a [`GuardFailure`] so the caller can record the
//! signal as unavailable. A timed-out task keeps running on its blocking
//! thread; its result is discarded. A zero budget times out without running
//! the task.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Display;
use std::time::Duration;

use thiserror::Error;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Reasons a guarded task produced no value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum GuardFailure {
    /// The task returned an error.
    #[error("{0}")]
    Failed(String),
    /// The task panicked.
    #[error("component panicked")]
    Panicked,
    /// The task was cancelled before completion.
    #[error("component cancelled")]
    Cancelled,
    /// The task exceeded its time budget.
    #[error("timed out after {0} ms")]
    TimedOut(u128),
}

// ============================================================================
// SECTION: Execution
// ============================================================================

/// Runs `task` on the blocking pool with the given time budget.
pub(crate) async fn run_guarded<T, E, F>(budget: Duration, task: F) -> Result<T, GuardFailure>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Display + Send + 'static,
{
    if budget.is_zero() {
        return Err(GuardFailure::TimedOut(0));
    }
    let handle = tokio::task::spawn_blocking(task);
    match tokio::time::timeout(budget, handle).await {
        Err(_) => Err(GuardFailure::TimedOut(budget.as_millis())),
        Ok(Err(join)) if join.is_panic() => Err(GuardFailure::Panicked),
        Ok(Err(_)) => Err(GuardFailure::Cancelled),
        Ok(Ok(Err(err))) => Err(GuardFailure::Failed(err.to_string())),
        Ok(Ok(Ok(value))) => Ok(value),
    }
}
