// crates/courtside-core/tests/rules.rs
// ============================================================================
// Module: Rule Set Tests
// Description: Tests for validation, atomic mutation, and diff.
// ============================================================================
//! ## Overview
//! Validates fail-closed rule construction and the audit diff.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use std::collections::BTreeMap;

use courtside_core::InvalidRuleError;
use courtside_core::RuleSet;
use courtside_core::RuleValue;

// ============================================================================
// SECTION: Construction
// ============================================================================

#[test]
fn defaults_validate() {
    assert!(RuleSet::default().validate().is_ok());
}

#[test]
fn from_map_applies_overrides() {
    let mut overrides = BTreeMap::new();
    overrides.insert("three_point_value".to_string(), RuleValue::Int(5));
    overrides.insert("elam_enabled".to_string(), RuleValue::Bool(false));
    let rules = RuleSet::from_map(&overrides).unwrap();
    assert_eq!(rules.three_point_value, 5);
    assert!(!rules.elam_enabled);
}

#[test]
fn from_map_rejects_out_of_range_naming_the_field() {
    let mut overrides = BTreeMap::new();
    overrides.insert("three_point_value".to_string(), RuleValue::Int(99));
    let err = RuleSet::from_map(&overrides).unwrap_err();
    let InvalidRuleError::OutOfRange { parameter, .. } = err else {
        panic!("expected OutOfRange, got {err:?}");
    };
    assert_eq!(parameter, "three_point_value");
}

#[test]
fn unknown_parameter_is_rejected() {
    let err = RuleSet::default().apply("gravity", RuleValue::Float(9.8)).unwrap_err();
    assert!(matches!(err, InvalidRuleError::UnknownParameter(_)));
}

#[test]
fn wrong_type_is_rejected() {
    let err = RuleSet::default().apply("quarters", RuleValue::Float(4.5)).unwrap_err();
    assert!(matches!(err, InvalidRuleError::WrongType { .. }));
}

// ============================================================================
// SECTION: Atomic Mutation
// ============================================================================

#[test]
fn apply_returns_new_instance_and_leaves_receiver_untouched() {
    let base = RuleSet::default();
    let next = base.apply("elam_margin", RuleValue::Int(21)).unwrap();
    assert_eq!(base.elam_margin, 11);
    assert_eq!(next.elam_margin, 21);
}

#[test]
fn failed_apply_changes_nothing() {
    let base = RuleSet::default();
    assert!(base.apply("elam_margin", RuleValue::Int(500)).is_err());
    assert_eq!(base.elam_margin, 11);
}

// ============================================================================
// SECTION: Diff and Round-Trip
// ============================================================================

#[test]
fn diff_enumerates_changed_parameters() {
    let base = RuleSet::default();
    let next = base
        .apply("three_point_value", RuleValue::Int(5))
        .unwrap()
        .apply("foul_base_rate", RuleValue::Float(0.12))
        .unwrap();
    let changes = base.diff(&next);
    assert_eq!(changes.len(), 2);
    assert!(changes.iter().any(|change| change.parameter == "three_point_value"));
    assert!(changes.iter().any(|change| change.parameter == "foul_base_rate"));
}

#[test]
fn diff_of_identical_rule_sets_is_empty() {
    let base = RuleSet::default();
    assert!(base.diff(&base.clone()).is_empty());
}

#[test]
fn rule_set_round_trips_through_json() {
    let rules = RuleSet::default().apply("quarter_possessions", RuleValue::Int(24)).unwrap();
    let encoded = serde_json::to_string(&rules).unwrap();
    let decoded: RuleSet = serde_json::from_str(&encoded).unwrap();
    assert_eq!(rules, decoded);
}

#[test]
fn every_declared_parameter_is_readable() {
    let rules = RuleSet::default();
    for name in RuleSet::parameter_names() {
        assert!(rules.get(name).is_some(), "parameter {name} is not readable");
    }
}
