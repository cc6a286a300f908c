// crates/sieve-logic/src/error.rs
// ============================================================================
// Module: Sieve Logic Errors
// Description: Structured diagnostics for condition and expression evaluation.
// Purpose: Provide actionable failures that stay decoupled from caller domains.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Centralizes the errors raised while parsing or evaluating conditions and
//! expressions. Structural errors (bad grammar, unknown functions, depth
//! abuse) are surfaced here; *missing data* is not an error, since evaluation is
//! fail-closed and resolves missing fields to false.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Error Definition
// ============================================================================

/// Errors raised by condition and expression parsing or evaluation.
///
/// # Invariants
/// - Variants are stable for serialization and audit payloads.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogicError {
    /// Expression source failed to tokenize or parse.
    #[error("expression parse error at offset {offset}: {message}")]
    Parse {
        /// Byte offset into the expression source.
        offset: usize,
        /// Human-readable description of the failure.
        message: String,
    },

    /// Expression referenced a function outside the fixed table.
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    /// Function called with the wrong number of arguments.
    #[error("function {function} expects {expected} arguments, got {actual}")]
    Arity {
        /// Function name from the fixed table.
        function: String,
        /// Expected argument count.
        expected: usize,
        /// Actual argument count supplied.
        actual: usize,
    },

    /// Operand had a type the operator cannot consume.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Expected type label.
        expected: String,
        /// Actual type label encountered.
        found: String,
    },

    /// A probability literal fell outside `[0.0, 1.0]`.
    #[error("probability out of range: {0}")]
    InvalidProbability(f64),

    /// Condition or expression tree exceeded the recursion bound.
    #[error("tree too deep: depth {actual} exceeds maximum {max}")]
    TooDeep {
        /// Maximum allowed recursion depth.
        max: usize,
        /// Depth encountered during traversal.
        actual: usize,
    },

    /// `weighted_choice` was called with non-positive total weight.
    #[error("weighted choice requires positive total weight")]
    DegenerateWeights,
}
