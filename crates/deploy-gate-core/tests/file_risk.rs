// crates/deploy-gate-core/tests/file_risk.rs
// ============================================================================
// Module: File Risk Enrichment Tests
// Description: Rule index resolution and summary penalties.
// ============================================================================
//! ## Overview
//! Covers list-order rule resolution, anchored built-in test rules, per-file failure skipping, and the
//! critical-count and average-risk penalties.

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

use common::assert_close;
use deploy_gate_core::FileRiskAssessment;
use deploy_gate_core::FileRiskConfig;
use deploy_gate_core::FileRiskError;
use deploy_gate_core::FileRiskIndex;
use deploy_gate_core::FileRiskRule;
use deploy_gate_core::RuleFileRiskIndex;
use deploy_gate_core::scoring::assess_changed_files;
use deploy_gate_core::scoring::summarize_file_risk;

fn index() -> RuleFileRiskIndex {
    RuleFileRiskIndex::new(
        vec![
            FileRiskRule::new("migrations/", "database", 0.9),
            FileRiskRule::new("src/", "source", 0.5),
            FileRiskRule::new(".md", "documentation", 0.05),
        ],
        0.3,
    )
    .expect("valid rules")
}

fn assessment(path: &str, risk: f64) -> FileRiskAssessment {
    FileRiskAssessment {
        path: path.to_string(),
        file_type: "source".to_string(),
        risk_score: risk,
    }
}

#[test]
fn rules_apply_in_list_order() {
    let index = index();
    let nested = index.assess("src/migrations/001_init.sql").expect("assess");
    assert_eq!(nested.file_type, "database");
    assert_close(nested.risk_score, 0.9);

    let source = index.assess("src/lib.rs").expect("assess");
    assert_eq!(source.file_type, "source");

    let reordered = RuleFileRiskIndex::new(
        vec![FileRiskRule::new("src/", "source", 0.5), FileRiskRule::new("migrations/", "database", 0.9)],
        0.3,
    )
    .expect("valid rules");
    let nested = reordered.assess("src/migrations/001_init.sql").expect("assess");
    assert_eq!(nested.file_type, "source");
}

#[test]
fn builtin_test_rules_match_test_paths_only() {
    let index = RuleFileRiskIndex::builtin();
    let test_paths =
        ["tests/engine.rs", "web/src/__tests__/app.tsx", "pkg/server_test.go", "ui/button.spec.ts", "test/setup.js"];
    for path in test_paths {
        assert_eq!(index.assess(path).expect("assess").file_type, "test", "{path}");
    }
    for path in ["src/latest.ts", "src/contest/entry.rs", "components/TestimonialCard.tsx"] {
        assert_eq!(index.assess(path).expect("assess").file_type, "source", "{path}");
    }
}

#[test]
fn unmatched_paths_take_default_risk() {
    let resolved = index().assess("Makefile").expect("assess");
    assert_eq!(resolved.file_type, "other");
    assert_close(resolved.risk_score, 0.3);
}

#[test]
fn matching_ignores_case_and_separators() {
    let resolved = index().assess("DB\\Migrations\\003.sql").expect("assess");
    assert_eq!(resolved.file_type, "database");
}

#[test]
fn out_of_range_rules_are_rejected() {
    let error = RuleFileRiskIndex::new(vec![FileRiskRule::new("x", "y", 1.5)], 0.2).unwrap_err();
    assert!(matches!(error, FileRiskError::Index(_)));
    assert!(RuleFileRiskIndex::new(Vec::new(), -0.1).is_err());
    assert!(RuleFileRiskIndex::new(vec![FileRiskRule::new("", "y", 0.5)], 0.2).is_err());
}

#[test]
fn unresolvable_paths_are_skipped() {
    let paths = vec!["src/lib.rs".to_string(), "   ".to_string(), "README.md".to_string()];
    let assessments = assess_changed_files(&index(), &paths);
    assert_eq!(assessments.len(), 2);
}

#[test]
fn summary_penalizes_critical_files_and_average_risk() {
    let assessments = vec![assessment("a", 0.9), assessment("b", 0.7), assessment("c", 0.2)];
    let summary = summarize_file_risk(&assessments, &FileRiskConfig::default()).expect("summary");
    assert_eq!(summary.assessed_files, 3);
    assert_eq!(summary.critical_file_count, 2);
    assert_close(summary.average_risk, 0.6);
    assert_close(summary.penalty, 4.0 * 2.0 + 10.0 * 0.6);
}

#[test]
fn summary_lists_top_five_riskiest_files() {
    let assessments: Vec<_> = (0 .. 8).map(|index| assessment(&format!("f{index}"), f64::from(index) / 10.0)).collect();
    let summary = summarize_file_risk(&assessments, &FileRiskConfig::default()).expect("summary");
    let paths: Vec<_> = summary.top_risk_files.iter().map(|file| file.path.as_str()).collect();
    assert_eq!(paths, vec!["f7", "f6", "f5", "f4", "f3"]);
}

#[test]
fn configured_penalties_override_defaults() {
    let config = FileRiskConfig {
        critical_file_penalty: 1.0,
        average_risk_penalty: 0.0,
        ..FileRiskConfig::default()
    };
    let summary = summarize_file_risk(&[assessment("a", 0.95)], &config).expect("summary");
    assert_close(summary.penalty, 1.0);
}

#[test]
fn empty_assessments_produce_no_summary() {
    assert!(summarize_file_risk(&[], &FileRiskConfig::default()).is_none());
}

#[test]
fn builtin_rules_classify_common_paths() {
    let index = RuleFileRiskIndex::builtin();
    assert_eq!(index.assess("docs/guide.md").expect("assess").file_type, "documentation");
    assert_eq!(index.assess("db/migrations/001.sql").expect("assess").file_type, "database");
    assert!(index.assess("src/auth/session.ts").expect("assess").risk_score >= 0.7);
}
