// crates/sieve-logic/src/context.rs
// ============================================================================
// Module: Evaluation Context Seams
// Description: Field resolution and randomness injection traits.
// Purpose: Keep the algebra generic while domains supply state and RNG.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The context seam is where domain semantics enter the algebra. A
//! [`ContextResolver`] maps dotted field paths to scalar values; a
//! [`RandomSource`] supplies unit-interval draws. Both are injected per
//! evaluation so the caller controls determinism end to end.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Scalar Values
// ============================================================================

/// Scalar value produced by field resolution and expression evaluation.
///
/// # Invariants
/// - Untagged wire form: booleans, then numbers, then strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Boolean value.
    Bool(bool),
    /// Numeric value (all numerics are f64 in the grammar).
    Num(f64),
    /// String value.
    Str(String),
}

impl Scalar {
    /// Returns the numeric value when this scalar is a number.
    #[must_use]
    pub fn as_num(&self) -> Option<f64> {
        match self {
            Self::Num(value) => Some(*value),
            Self::Bool(_) | Self::Str(_) => None,
        }
    }

    /// Returns the boolean value, coercing numbers by non-zero test.
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::Num(value) => *value != 0.0,
            Self::Str(value) => !value.is_empty(),
        }
    }

    /// Returns a stable label for the scalar's type, used in diagnostics.
    #[must_use]
    pub const fn type_label(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Num(_) => "number",
            Self::Str(_) => "string",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => value.fmt(f),
            Self::Num(value) => value.fmt(f),
            Self::Str(value) => value.fmt(f),
        }
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Num(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

// ============================================================================
// SECTION: Context Resolver
// ============================================================================

/// Resolves dotted field paths to scalar values.
///
/// Implementations should resolve namespaced paths (for example
/// `event.points` or `player.stamina`) and return `None` for anything they
/// do not recognize. Missing paths are not errors: comparisons against them
/// evaluate to false.
pub trait ContextResolver {
    /// Resolves a field path, returning `None` when the path is unknown.
    fn resolve(&self, path: &str) -> Option<Scalar>;
}

/// Context that resolves nothing, for tests and constant expressions.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyContext;

impl ContextResolver for EmptyContext {
    fn resolve(&self, _path: &str) -> Option<Scalar> {
        None
    }
}

// ============================================================================
// SECTION: Random Source
// ============================================================================

/// Deterministic randomness seam for probability leaves and `weighted_choice`.
///
/// # Invariants
/// - `next_unit` returns values in `[0.0, 1.0)`.
/// - Callers own seeding; the crate never constructs an RNG.
pub trait RandomSource {
    /// Returns the next unit-interval draw.
    fn next_unit(&mut self) -> f64;
}
