// crates/sieve-logic/tests/expr.rs
// ============================================================================
// Module: Expression Grammar Tests
// Description: Tests for parsing and evaluating the restricted grammar.
// ============================================================================
//! ## Overview
//! Validates precedence, the fixed function table, path lexing, and
//! fail-closed evaluation of mutation-argument expressions.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    reason = "Test-only panic-based assertions are permitted."
)]

use sieve_logic::ContextResolver;
use sieve_logic::LogicError;
use sieve_logic::RandomSource;
use sieve_logic::Scalar;
use sieve_logic::parse_expr;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Context resolving a handful of engine-shaped fields.
struct SimContext;

impl ContextResolver for SimContext {
    fn resolve(&self, path: &str) -> Option<Scalar> {
        match path {
            "player.scoring" => Some(Scalar::Num(72.0)),
            "event.points" => Some(Scalar::Num(3.0)),
            "player:9b1f.ego" => Some(Scalar::Num(88.0)),
            _ => None,
        }
    }
}

/// Fixed random source for weighted-choice tests.
struct FixedRandom(f64);

impl RandomSource for FixedRandom {
    fn next_unit(&mut self) -> f64 {
        self.0
    }
}

fn eval_num(source: &str) -> f64 {
    parse_expr(source).unwrap().eval(&SimContext, &mut FixedRandom(0.0)).unwrap().as_num().unwrap()
}

// ============================================================================
// SECTION: Arithmetic and Precedence
// ============================================================================

#[test]
fn multiplication_binds_tighter_than_addition() {
    assert_eq!(eval_num("2 + 3 * 4"), 14.0);
    assert_eq!(eval_num("(2 + 3) * 4"), 20.0);
}

#[test]
fn unary_negation_applies_before_binary() {
    assert_eq!(eval_num("-2 + 5"), 3.0);
}

#[test]
fn division_by_zero_is_zero() {
    // Mutation arguments must stay total; a zero divisor cannot abort a game.
    assert_eq!(eval_num("5 / 0"), 0.0);
}

#[test]
fn comparisons_yield_booleans() {
    let result =
        parse_expr("player.scoring >= 70 && event.points == 3").unwrap().eval(&SimContext, &mut FixedRandom(0.0)).unwrap();
    assert_eq!(result, Scalar::Bool(true));
}

// ============================================================================
// SECTION: Fields and Paths
// ============================================================================

#[test]
fn missing_field_resolves_to_zero() {
    assert_eq!(eval_num("team.morale + 1"), 1.0);
}

#[test]
fn qualified_path_with_hyphen_lexes_as_one_field() {
    assert_eq!(eval_num("player:9b1f.ego"), 88.0);
}

// ============================================================================
// SECTION: Function Table
// ============================================================================

#[test]
fn logistic_is_half_at_midpoint() {
    assert!((eval_num("logistic(50, 50, 0.1)") - 0.5).abs() < 1e-9);
}

#[test]
fn clamp_orders_bounds() {
    assert_eq!(eval_num("clamp(5, 0, 1)"), 1.0);
    assert_eq!(eval_num("clamp(5, 1, 0)"), 1.0);
}

#[test]
fn weighted_choice_picks_by_cumulative_weight() {
    let expr = parse_expr("weighted_choice(1, 10, 3, 20)").unwrap();
    let low = expr.eval(&SimContext, &mut FixedRandom(0.1)).unwrap();
    let high = expr.eval(&SimContext, &mut FixedRandom(0.9)).unwrap();
    assert_eq!(low, Scalar::Num(10.0));
    assert_eq!(high, Scalar::Num(20.0));
}

#[test]
fn weighted_choice_rejects_zero_total_weight() {
    let expr = parse_expr("weighted_choice(0, 10, 0, 20)").unwrap();
    let result = expr.eval(&SimContext, &mut FixedRandom(0.5));
    assert!(matches!(result, Err(LogicError::DegenerateWeights)));
}

#[test]
fn unknown_function_is_rejected_at_parse_time() {
    assert!(matches!(parse_expr("exec(1)"), Err(LogicError::UnknownFunction(_))));
}

#[test]
fn arity_is_checked_at_parse_time() {
    assert!(matches!(parse_expr("clamp(1, 2)"), Err(LogicError::Arity { .. })));
}

// ============================================================================
// SECTION: Parse Failures
// ============================================================================

#[test]
fn trailing_input_is_rejected() {
    assert!(matches!(parse_expr("1 + 2 3"), Err(LogicError::Parse { .. })));
}

#[test]
fn unexpected_character_reports_offset() {
    let Err(LogicError::Parse { offset, .. }) = parse_expr("1 + $") else {
        panic!("expected parse error");
    };
    assert_eq!(offset, 4);
}
