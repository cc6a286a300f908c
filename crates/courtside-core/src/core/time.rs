// crates/courtside-core/src/core/time.rs
// ============================================================================
// Module: Courtside Time Model
// Description: Canonical timestamp representation for logs and records.
// Purpose: Provide deterministic, replayable time values across records.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Courtside embeds explicit time values in events and results to keep
//! replay deterministic. The core and the simulation engine never read
//! wall-clock time; the runtime supplies timestamps at its edges.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Canonical UTC timestamp in unix milliseconds.
///
/// # Invariants
/// - Values are explicitly provided by callers; the core never reads a clock.
/// - Monotonicity within a log is a caller responsibility; consumers order by
///   sequence number, not by timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix milliseconds.
    #[must_use]
    pub const fn unix_millis(self) -> i64 {
        self.0
    }

    /// Returns this timestamp advanced by the given number of seconds.
    #[must_use]
    pub const fn plus_seconds(self, seconds: i64) -> Self {
        Self(self.0.saturating_add(seconds.saturating_mul(1_000)))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}
