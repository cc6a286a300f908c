// crates/courtside-engine/src/error.rs
// ============================================================================
// Module: Simulation Errors
// Description: Fatal error taxonomy for the engine.
// Purpose: Abort games loudly on constraint violations; never panic.
// Dependencies: courtside-core, courtside-effects, sieve-logic, thiserror
// ============================================================================

//! ## Overview
//! The engine surfaces no recoverable errors: an invalid rule parameter, a
//! malformed effect action, or a broken invariant aborts the game with a
//! fatal error. The orchestrator captures it, marks
//! the round failed, and does not advance.

// ============================================================================
// SECTION: Imports
// ============================================================================

use courtside_core::InvalidRuleError;
use courtside_effects::EffectError;
use sieve_logic::LogicError;
use thiserror::Error;

// ============================================================================
// SECTION: Error Definition
// ============================================================================

/// Fatal simulation errors.
#[derive(Debug, Error)]
pub enum SimError {
    /// Rule set failed validation at game start.
    #[error("invalid rules: {0}")]
    Rules(#[from] InvalidRuleError),
    /// Effect condition or action was malformed.
    #[error("effect failure: {0}")]
    Effect(#[from] EffectError),
    /// Expression evaluation failed inside a move trigger.
    #[error("move logic failure: {0}")]
    Logic(#[from] LogicError),
    /// A simulation invariant broke.
    #[error("simulation invariant violated: {0}")]
    Invariant(String),
}
