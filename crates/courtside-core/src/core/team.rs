// crates/courtside-core/src/core/team.rs
// ============================================================================
// Module: Courtside Team Model
// Description: Team roster, venue descriptor, and strategy.
// Purpose: Define the durable team record and per-team strategy inputs.
// Dependencies: crate::core::{identifiers, player}, serde
// ============================================================================

//! ## Overview
//! Teams are recreated each season with fresh identifiers but carry over by
//! name. A team owns a small ordered roster (active trio plus bench), a venue
//! descriptor that perturbs simulation, and the governance-set strategy the
//! engine consumes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::TeamId;
use crate::core::player::Player;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Players on court per team when the roster allows.
pub const ON_COURT_COUNT: usize = 3;

// ============================================================================
// SECTION: Venue
// ============================================================================

/// Venue descriptor attached to a team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    /// Display name.
    pub name: String,
    /// Seating capacity.
    pub capacity: u32,
    /// Altitude in meters; high altitude accelerates stamina drain.
    pub altitude_m: i32,
    /// Playing surface label.
    pub surface: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

// ============================================================================
// SECTION: Strategy
// ============================================================================

/// Governance-set strategy consumed by the engine.
///
/// # Invariants
/// - `defensive_intensity` lies in `[-1.0, 1.0]`.
/// - Shot biases are multiplicative weights in `[0.0, 4.0]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStrategy {
    /// Defensive pressure dial; positive raises fouls and stamina cost.
    pub defensive_intensity: f64,
    /// Pace dial; positive shortens possessions.
    pub pace_bias: f64,
    /// Bias toward rim attempts.
    pub at_rim_bias: f64,
    /// Bias toward mid-range attempts.
    pub mid_range_bias: f64,
    /// Bias toward three-point attempts.
    pub three_point_bias: f64,
}

impl Default for TeamStrategy {
    fn default() -> Self {
        Self {
            defensive_intensity: 0.0,
            pace_bias: 0.0,
            at_rim_bias: 1.0,
            mid_range_bias: 1.0,
            three_point_bias: 1.0,
        }
    }
}

// ============================================================================
// SECTION: Team Record
// ============================================================================

/// Durable team record.
///
/// # Invariants
/// - `players` is ordered: the first [`ON_COURT_COUNT`] are the starters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    /// Team identifier (new each season).
    pub id: TeamId,
    /// Carry-over display name.
    pub name: String,
    /// Short display emblem.
    pub emblem: String,
    /// Ordered roster: starters first, then bench.
    pub players: Vec<Player>,
    /// Home venue descriptor.
    pub venue: Venue,
}

impl Team {
    /// Returns the starting trio (or the whole roster when short-handed).
    #[must_use]
    pub fn starters(&self) -> &[Player] {
        let count = self.players.len().min(ON_COURT_COUNT);
        &self.players[..count]
    }
}
