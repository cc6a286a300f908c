// crates/sieve-logic/tests/condition.rs
// ============================================================================
// Module: Condition Tree Tests
// Description: Tests for condition evaluation and validation.
// ============================================================================
//! ## Overview
//! Validates fail-closed comparison semantics, short-circuiting, and
//! probability leaves under a scripted random source.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use sieve_logic::Comparator;
use sieve_logic::Condition;
use sieve_logic::ContextResolver;
use sieve_logic::LogicError;
use sieve_logic::RandomSource;
use sieve_logic::Scalar;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Context backed by a static field table.
struct TableContext(Vec<(&'static str, Scalar)>);

impl ContextResolver for TableContext {
    fn resolve(&self, path: &str) -> Option<Scalar> {
        self.0.iter().find(|(key, _)| *key == path).map(|(_, value)| value.clone())
    }
}

/// Random source replaying a fixed script of draws.
struct ScriptedRandom(Vec<f64>, usize);

impl ScriptedRandom {
    fn new(draws: Vec<f64>) -> Self {
        Self(draws, 0)
    }
}

impl RandomSource for ScriptedRandom {
    fn next_unit(&mut self) -> f64 {
        let draw = self.0[self.1 % self.0.len()];
        self.1 += 1;
        draw
    }
}

fn ctx() -> TableContext {
    TableContext(vec![
        ("player.stamina", Scalar::Num(0.42)),
        ("player.on_court", Scalar::Bool(true)),
        ("game.last_action", Scalar::Str("three_point".to_string())),
    ])
}

// ============================================================================
// SECTION: Comparison Semantics
// ============================================================================

#[test]
fn numeric_comparisons_order_numerically() {
    let mut rng = ScriptedRandom::new(vec![0.0]);
    let below = Condition::compare("player.stamina", Comparator::Lt, 0.5);
    let above = Condition::compare("player.stamina", Comparator::Gte, 0.5);
    assert!(below.evaluate(&ctx(), &mut rng).unwrap());
    assert!(!above.evaluate(&ctx(), &mut rng).unwrap());
}

#[test]
fn missing_field_compares_false() {
    let mut rng = ScriptedRandom::new(vec![0.0]);
    let condition = Condition::compare("player.nonexistent", Comparator::Eq, 1.0);
    assert!(!condition.evaluate(&ctx(), &mut rng).unwrap());
}

#[test]
fn cross_type_comparison_is_false() {
    let mut rng = ScriptedRandom::new(vec![0.0]);
    let condition = Condition::compare("game.last_action", Comparator::Eq, 3.0);
    assert!(!condition.evaluate(&ctx(), &mut rng).unwrap());
}

#[test]
fn string_equality_matches() {
    let mut rng = ScriptedRandom::new(vec![0.0]);
    let condition = Condition::compare("game.last_action", Comparator::Eq, "three_point");
    assert!(condition.evaluate(&ctx(), &mut rng).unwrap());
}

// ============================================================================
// SECTION: Combinators
// ============================================================================

#[test]
fn empty_all_is_true_and_empty_any_is_false() {
    let mut rng = ScriptedRandom::new(vec![0.0]);
    assert!(Condition::all(vec![]).evaluate(&ctx(), &mut rng).unwrap());
    assert!(!Condition::any(vec![]).evaluate(&ctx(), &mut rng).unwrap());
}

#[test]
fn all_short_circuits_before_random_draw() {
    // The failing comparison precedes the random leaf, so no draw happens
    // and the scripted source position stays untouched.
    let mut rng = ScriptedRandom::new(vec![0.0]);
    let condition = Condition::all(vec![
        Condition::compare("player.stamina", Comparator::Gt, 0.9),
        Condition::Random(1.0),
    ]);
    assert!(!condition.evaluate(&ctx(), &mut rng).unwrap());
    assert_eq!(rng.1, 0);
}

#[test]
fn random_leaf_threshold_is_exclusive() {
    let mut rng = ScriptedRandom::new(vec![0.25]);
    assert!(Condition::Random(0.3).evaluate(&ctx(), &mut rng).unwrap());
    let mut rng = ScriptedRandom::new(vec![0.25]);
    assert!(!Condition::Random(0.25).evaluate(&ctx(), &mut rng).unwrap());
}

#[test]
fn not_inverts() {
    let mut rng = ScriptedRandom::new(vec![0.0]);
    let condition =
        Condition::Not(Box::new(Condition::compare("player.on_court", Comparator::Eq, true)));
    assert!(!condition.evaluate(&ctx(), &mut rng).unwrap());
}

// ============================================================================
// SECTION: Validation
// ============================================================================

#[test]
fn validate_rejects_out_of_range_probability() {
    let condition = Condition::Random(1.5);
    assert!(matches!(condition.validate(), Err(LogicError::InvalidProbability(_))));
}

#[test]
fn validate_rejects_deep_trees() {
    let mut condition = Condition::Random(0.5);
    for _ in 0..64 {
        condition = Condition::Not(Box::new(condition));
    }
    assert!(matches!(condition.validate(), Err(LogicError::TooDeep { .. })));
}

// ============================================================================
// SECTION: Wire Form
// ============================================================================

#[test]
fn condition_round_trips_through_json() {
    let condition = Condition::all(vec![
        Condition::compare("player.stamina", Comparator::Lte, 0.35),
        Condition::any(vec![Condition::Random(0.1), Condition::compare(
            "game.last_action",
            Comparator::Eq,
            "at_rim",
        )]),
    ]);
    let encoded = serde_json::to_string(&condition).unwrap();
    let decoded: Condition = serde_json::from_str(&encoded).unwrap();
    assert_eq!(condition, decoded);
}
