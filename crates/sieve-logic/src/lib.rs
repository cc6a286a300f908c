// crates/sieve-logic/src/lib.rs
// ============================================================================
// Module: Sieve Logic Root
// Description: Public API surface for the condition and expression subsystem.
// Purpose: Wire together condition trees, the expression grammar, and context
// resolution. Dependencies: crate::{condition, context, error, expr}
// ============================================================================

//! ## Overview
//! Sieve Logic is a domain-agnostic condition algebra paired with a restricted
//! arithmetic expression grammar. Callers inject field resolution through
//! [`ContextResolver`] and randomness through [`RandomSource`]; the crate never
//! touches a clock, a global RNG, or arbitrary user code. Evaluation is
//! fail-closed: unresolvable fields compare as false rather than erroring.

// ============================================================================
// SECTION: Core Modules
// ============================================================================

pub mod condition;
pub mod context;
pub mod error;
pub mod expr;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use condition::Comparator;
pub use condition::Condition;
pub use condition::MAX_CONDITION_DEPTH;
pub use context::ContextResolver;
pub use context::EmptyContext;
pub use context::RandomSource;
pub use context::Scalar;
pub use error::LogicError;
pub use expr::Expr;
pub use expr::parse_expr;
