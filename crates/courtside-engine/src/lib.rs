// crates/courtside-engine/src/lib.rs
// ============================================================================
// Module: Courtside Engine Root
// Description: Public API surface for the simulation engine.
// Purpose: Expose the pure simulation entry point and its state types.
// Dependencies: crate::{engine, error, narrate, possession, rng, state}
// ============================================================================

//! ## Overview
//! The engine turns `(teams, rules, effects, seed)` into a [`GameResult`]
//! deterministically. Everything in this crate is CPU-only: no suspension
//! points, no storage, no clock, no global randomness.
//!
//! [`GameResult`]: courtside_core::GameResult

// ============================================================================
// SECTION: Core Modules
// ============================================================================

pub mod engine;
pub mod error;
pub mod narrate;
pub mod possession;
pub mod rng;
pub mod state;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use engine::GameInputs;
pub use engine::simulate_game;
pub use error::SimError;
pub use possession::DefenseScheme;
pub use rng::GameRng;
pub use state::GameState;
pub use state::PlayerState;
pub use state::Side;
pub use state::SimResolver;
pub use state::TeamSide;
