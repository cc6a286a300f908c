// crates/sieve-logic/src/condition.rs
// ============================================================================
// Module: Condition Trees
// Description: Boolean algebra over field comparisons and probability leaves.
// Purpose: Provide deterministic, fail-closed condition evaluation.
// Dependencies: crate::{context, error}, serde, smallvec
// ============================================================================

//! ## Overview
//! Conditions are trees over logical combinators (`all`, `any`, `not`),
//! field comparisons, and random-probability leaves. Evaluation
//! short-circuits left to right, which keeps the number of RNG draws a pure
//! function of the inputs. Unresolvable fields and type mismatches compare
//! as false; only structural abuse (depth, bad probabilities) is an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use smallvec::SmallVec;

use crate::context::ContextResolver;
use crate::context::RandomSource;
use crate::context::Scalar;
use crate::error::LogicError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum condition tree depth accepted by validation and evaluation.
pub const MAX_CONDITION_DEPTH: usize = 32;

// ============================================================================
// SECTION: Comparator
// ============================================================================

/// Comparison operator for field leaves.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    /// Equality.
    Eq,
    /// Strictly less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Strictly greater than.
    Gt,
    /// Greater than or equal.
    Gte,
}

// ============================================================================
// SECTION: Condition Definition
// ============================================================================

/// Condition tree with domain-agnostic structure.
///
/// The logical combinators are universal; the `Compare` leaf is where
/// domain state enters through the caller's [`ContextResolver`].
///
/// # Invariants
/// - `Random` probabilities lie in `[0.0, 1.0]` after [`Condition::validate`].
/// - Trees never exceed [`MAX_CONDITION_DEPTH`] after validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Logical AND: every sub-condition must hold. Empty `all` is true.
    All(SmallVec<[Box<Condition>; 4]>),
    /// Logical OR: at least one sub-condition must hold. Empty `any` is false.
    Any(SmallVec<[Box<Condition>; 4]>),
    /// Logical NOT: inverts the sub-condition.
    Not(Box<Condition>),
    /// Probability leaf: true when the next unit draw is below the threshold.
    Random(f64),
    /// Field comparison leaf resolved through the evaluation context.
    Compare {
        /// Namespaced field path (for example `player.stamina`).
        field: String,
        /// Comparison operator.
        cmp: Comparator,
        /// Right-hand value.
        value: Scalar,
    },
}

impl Condition {
    /// Builds an `all` node from parts.
    #[must_use]
    pub fn all(conditions: Vec<Condition>) -> Self {
        Self::All(conditions.into_iter().map(Box::new).collect())
    }

    /// Builds an `any` node from parts.
    #[must_use]
    pub fn any(conditions: Vec<Condition>) -> Self {
        Self::Any(conditions.into_iter().map(Box::new).collect())
    }

    /// Builds a comparison leaf.
    #[must_use]
    pub fn compare(field: impl Into<String>, cmp: Comparator, value: impl Into<Scalar>) -> Self {
        Self::Compare { field: field.into(), cmp, value: value.into() }
    }

    /// Validates probabilities and depth without evaluating.
    ///
    /// Run once at registration time so evaluation can stay infallible with
    /// respect to structure.
    ///
    /// # Errors
    ///
    /// Returns [`LogicError::InvalidProbability`] or [`LogicError::TooDeep`].
    pub fn validate(&self) -> Result<(), LogicError> {
        self.validate_at(0)
    }

    /// Recursive validation helper carrying the current depth.
    fn validate_at(&self, depth: usize) -> Result<(), LogicError> {
        if depth > MAX_CONDITION_DEPTH {
            return Err(LogicError::TooDeep { max: MAX_CONDITION_DEPTH, actual: depth });
        }
        match self {
            Self::All(children) | Self::Any(children) => {
                for child in children {
                    child.validate_at(depth + 1)?;
                }
                Ok(())
            }
            Self::Not(child) => child.validate_at(depth + 1),
            Self::Random(probability) => {
                if (0.0..=1.0).contains(probability) {
                    Ok(())
                } else {
                    Err(LogicError::InvalidProbability(*probability))
                }
            }
            Self::Compare { .. } => Ok(()),
        }
    }

    /// Evaluates the condition against a context and a random source.
    ///
    /// Short-circuits left to right. Missing fields and type mismatches
    /// evaluate to false.
    ///
    /// # Errors
    ///
    /// Returns [`LogicError::TooDeep`] when the tree exceeds the depth bound
    /// (possible only for unvalidated trees).
    pub fn evaluate<C, R>(&self, ctx: &C, rng: &mut R) -> Result<bool, LogicError>
    where
        C: ContextResolver,
        R: RandomSource,
    {
        self.evaluate_at(ctx, rng, 0)
    }

    /// Recursive evaluation helper carrying the current depth.
    fn evaluate_at<C, R>(&self, ctx: &C, rng: &mut R, depth: usize) -> Result<bool, LogicError>
    where
        C: ContextResolver,
        R: RandomSource,
    {
        if depth > MAX_CONDITION_DEPTH {
            return Err(LogicError::TooDeep { max: MAX_CONDITION_DEPTH, actual: depth });
        }
        match self {
            Self::All(children) => {
                for child in children {
                    if !child.evaluate_at(ctx, rng, depth + 1)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Any(children) => {
                for child in children {
                    if child.evaluate_at(ctx, rng, depth + 1)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Self::Not(child) => Ok(!child.evaluate_at(ctx, rng, depth + 1)?),
            Self::Random(probability) => Ok(rng.next_unit() < *probability),
            Self::Compare { field, cmp, value } => {
                Ok(ctx.resolve(field).is_some_and(|left| compare_scalars(&left, *cmp, value)))
            }
        }
    }
}

// ============================================================================
// SECTION: Scalar Comparison
// ============================================================================

/// Compares two scalars under fail-closed typing rules.
///
/// Numbers order numerically; booleans and strings support equality only.
/// Cross-type comparisons are false.
fn compare_scalars(left: &Scalar, cmp: Comparator, right: &Scalar) -> bool {
    match (left, right) {
        (Scalar::Num(l), Scalar::Num(r)) => match cmp {
            Comparator::Eq => (l - r).abs() < f64::EPSILON,
            Comparator::Lt => l < r,
            Comparator::Lte => l <= r,
            Comparator::Gt => l > r,
            Comparator::Gte => l >= r,
        },
        (Scalar::Bool(l), Scalar::Bool(r)) => matches!(cmp, Comparator::Eq) && l == r,
        (Scalar::Str(l), Scalar::Str(r)) => matches!(cmp, Comparator::Eq) && l == r,
        _ => false,
    }
}
