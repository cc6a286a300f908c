// crates/courtside-core/src/core/meta.rs
// ============================================================================
// Module: Courtside Meta Store Types
// Description: Scoped key/value overlays attached to teams and players.
// Purpose: Define the bucket keys and values effects read and write.
// Dependencies: crate::core::identifiers, serde, sieve-logic
// ============================================================================

//! ## Overview
//! Meta buckets are the only mechanism by which effects observe state across
//! possessions and games. Buckets are keyed by (entity kind, entity id,
//! season) and stored as JSON columns on team and player rows; they survive
//! game boundaries and reset at season boundaries.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use sieve_logic::Scalar;

use crate::core::identifiers::SeasonId;

// ============================================================================
// SECTION: Bucket Keys
// ============================================================================

/// Entity families that own meta buckets.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaEntityKind {
    /// Team-scoped bucket.
    Team,
    /// Player-scoped bucket.
    Player,
}

impl MetaEntityKind {
    /// Returns the stable path segment used in condition field paths.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::Player => "player",
        }
    }
}

/// Fully scoped bucket key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MetaKey {
    /// Entity family.
    pub kind: MetaEntityKind,
    /// Entity identifier string.
    pub entity_id: String,
    /// Season scope.
    pub season_id: SeasonId,
}

// ============================================================================
// SECTION: Buckets
// ============================================================================

/// One entity's key/value overlay.
///
/// BTreeMap keeps iteration stable so serialized forms are byte-stable.
pub type MetaBucket = BTreeMap<String, Scalar>;
