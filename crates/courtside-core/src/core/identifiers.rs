// crates/courtside-core/src/core/identifiers.rs
// ============================================================================
// Module: Courtside Identifiers
// Description: Canonical opaque identifiers for league entities and events.
// Purpose: Provide strongly typed, serializable identifiers with stable wire
// forms. Dependencies: serde, uuid
// ============================================================================

//! ## Overview
//! Every entity is addressed by an opaque string identifier holding UUID
//! text. Identifiers are minted with [`fresh`](LeagueId::fresh) at creation
//! boundaries only; replay and simulation code treats them as opaque keys and
//! never parses their content.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Declares an opaque string identifier newtype.
macro_rules! declare_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        ///
        /// # Invariants
        /// - Wire form is the raw string; content is opaque to consumers.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Mints a fresh random identifier.
            #[must_use]
            pub fn fresh() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Wraps an existing identifier string.
            #[must_use]
            pub fn from_string(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }
    };
}

declare_id!(
    /// League identifier.
    LeagueId
);
declare_id!(
    /// Season identifier.
    SeasonId
);
declare_id!(
    /// Team identifier (new per season).
    TeamId
);
declare_id!(
    /// Player identifier (new per season).
    PlayerId
);
declare_id!(
    /// Governor identifier (a human participant).
    GovernorId
);
declare_id!(
    /// Proposal aggregate identifier.
    ProposalId
);
declare_id!(
    /// Game result identifier.
    GameId
);
declare_id!(
    /// Registered effect identifier.
    EffectId
);
declare_id!(
    /// Governance event identifier.
    EventId
);
declare_id!(
    /// Trade aggregate identifier.
    TradeId
);
