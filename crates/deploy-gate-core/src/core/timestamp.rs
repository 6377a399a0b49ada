// crates/deploy-gate-core/src/core/timestamp.rs
// ============================================================================
// Module: Deploy Gate Time Model
// Description: Canonical timestamp representation for audit records.
// Purpose: Keep decision values free of wall-clock time while stamping audit logs.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Decisions never carry timestamps so that identical inputs produce identical
//! decisions. Only audit records are stamped, and only through [`Timestamp`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Canonical timestamp used in Deploy Gate audit records, in unix epoch
/// milliseconds.
///
/// # Invariants
/// - Decision values never embed a timestamp; only audit entries do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Reads the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        let millis = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self(i64::try_from(millis).unwrap_or(i64::MAX))
    }

    /// Wraps a unix-millisecond value.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }

    /// Formats the timestamp as an RFC 3339 string.
    ///
    /// Returns `None` for values outside the representable date range.
    #[must_use]
    pub fn to_rfc3339(self) -> Option<String> {
        let nanos = i128::from(self.0) * 1_000_000;
        let datetime = OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()?;
        datetime.format(&Rfc3339).ok()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_formats_as_rfc3339() {
        assert_eq!(Timestamp::from_unix_millis(0).to_rfc3339().as_deref(), Some("1970-01-01T00:00:00Z"));
    }

    #[test]
    fn out_of_range_values_do_not_format() {
        assert_eq!(Timestamp::from_unix_millis(i64::MAX).to_rfc3339(), None);
    }

    #[test]
    fn serializes_as_plain_millis() {
        let json = serde_json::to_string(&Timestamp::from_unix_millis(42)).ok();
        assert_eq!(json.as_deref(), Some("42"));
    }
}
