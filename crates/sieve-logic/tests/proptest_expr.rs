// crates/sieve-logic/tests/proptest_expr.rs
// ============================================================================
// Module: Expression Property Tests
// Description: Parser robustness and evaluation totality properties.
// ============================================================================
//! ## Overview
//! The parser must reject or accept arbitrary input without panicking, and
//! accepted numeric expressions must evaluate to finite, total results.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use proptest::prelude::*;
use sieve_logic::EmptyContext;
use sieve_logic::RandomSource;
use sieve_logic::parse_expr;

/// Half-unit random source for property runs.
struct Half;

impl RandomSource for Half {
    fn next_unit(&mut self) -> f64 {
        0.5
    }
}

proptest! {
    /// Arbitrary input never panics the tokenizer or parser.
    #[test]
    fn parser_is_total_over_arbitrary_input(source in ".{0,64}") {
        let _ = parse_expr(&source);
    }

    /// Arithmetic over literals always evaluates without error.
    #[test]
    fn literal_arithmetic_evaluates(
        a in -1_000.0..1_000.0_f64,
        b in -1_000.0..1_000.0_f64,
    ) {
        let source = format!("({a}) + ({b}) * 2 - ({a}) / 3");
        let expr = parse_expr(&source).unwrap();
        let value = expr.eval(&EmptyContext, &mut Half).unwrap();
        prop_assert!(value.as_num().is_some_and(f64::is_finite));
    }

    /// Division by a zero divisor is total, never a crash.
    #[test]
    fn division_is_total(a in -1_000.0..1_000.0_f64) {
        let source = format!("({a}) / 0");
        let expr = parse_expr(&source).unwrap();
        let value = expr.eval(&EmptyContext, &mut Half).unwrap();
        prop_assert_eq!(value.as_num(), Some(0.0));
    }
}
