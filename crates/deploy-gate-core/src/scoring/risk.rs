// crates/deploy-gate-core/src/scoring/risk.rs
// ============================================================================
// Module: Risk Classifier
// Description: Maps changed-file statistics to a risk category and weight.
// Purpose: Provide the deterministic risk input to the base confidence score.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Classification is a total function over [`FileTypeStats`]. Empty changes
//! and documentation-only changes short-circuit to the lowest weights; other
//! changes take the highest populated risk tier.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::FileTypeStats;
use crate::core::RiskCategory;
use crate::core::RiskClassification;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Weight for documentation-only changes.
pub const DOCS_ONLY_WEIGHT: f64 = 0.1;
/// Weight for low risk changes (also used for empty changes).
pub const LOW_WEIGHT: f64 = 0.2;
/// Weight for medium risk changes.
pub const MEDIUM_WEIGHT: f64 = 0.3;
/// Weight for critical and high risk changes.
pub const HIGH_WEIGHT: f64 = 0.4;
/// Type name that marks documentation files.
pub const DOCUMENTATION_TYPE: &str = "documentation";
/// Number of dominant file types reported.
const DOMINANT_TYPE_LIMIT: usize = 3;

/// Risk tiers in strict priority order.
const TIER_PRIORITY: [(&str, RiskCategory, f64); 4] = [
    ("critical", RiskCategory::Critical, HIGH_WEIGHT),
    ("high", RiskCategory::High, HIGH_WEIGHT),
    ("medium", RiskCategory::Medium, MEDIUM_WEIGHT),
    ("low", RiskCategory::Low, LOW_WEIGHT),
];

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Classifies changed-file statistics into a risk category and weight.
#[must_use]
pub fn classify_risk(stats: &FileTypeStats) -> RiskClassification {
    if stats.total_files == 0 {
        return RiskClassification {
            category: RiskCategory::Low,
            weight: LOW_WEIGHT,
            dominant_file_types: Vec::new(),
        };
    }

    if stats.type_count(DOCUMENTATION_TYPE) == stats.total_files {
        return RiskClassification {
            category: RiskCategory::Low,
            weight: DOCS_ONLY_WEIGHT,
            dominant_file_types: vec![DOCUMENTATION_TYPE.to_string()],
        };
    }

    let (category, weight) = TIER_PRIORITY
        .iter()
        .find(|(tier, _, _)| stats.risk_count(tier) > 0)
        .map_or((RiskCategory::Low, LOW_WEIGHT), |(_, category, weight)| (*category, *weight));

    RiskClassification {
        category,
        weight,
        dominant_file_types: dominant_file_types(stats),
    }
}

/// Returns the most frequent file types.
///
/// Ties are broken by type name ascending: `by_type` is an ordered map and the
/// sort is stable, so equal counts keep map order.
fn dominant_file_types(stats: &FileTypeStats) -> Vec<String> {
    let mut ranked: Vec<(&String, u32)> =
        stats.by_type.iter().filter(|(_, count)| **count > 0).map(|(name, count)| (name, *count)).collect();
    ranked.sort_by(|left, right| right.1.cmp(&left.1));
    ranked.into_iter().take(DOMINANT_TYPE_LIMIT).map(|(name, _)| name.clone()).collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn stats(by_type: &[(&str, u32)], by_risk: &[(&str, u32)], total: u32) -> FileTypeStats {
        FileTypeStats {
            by_type: by_type.iter().map(|(k, v)| ((*k).to_string(), *v)).collect::<BTreeMap<_, _>>(),
            by_risk: by_risk.iter().map(|(k, v)| ((*k).to_string(), *v)).collect::<BTreeMap<_, _>>(),
            total_files: total,
        }
    }

    #[test]
    fn dominant_types_break_ties_by_name() {
        let input = stats(&[("source", 2), ("config", 2), ("test", 2), ("assets", 1)], &[], 7);
        assert_eq!(dominant_file_types(&input), vec!["config", "source", "test"]);
    }

    #[test]
    fn zero_count_types_are_not_dominant() {
        let input = stats(&[("source", 1), ("styles", 0)], &[], 1);
        assert_eq!(dominant_file_types(&input), vec!["source"]);
    }
}
