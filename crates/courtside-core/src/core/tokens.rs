// crates/courtside-core/src/core/tokens.rs
// ============================================================================
// Module: Courtside Token Economy
// Description: Token kinds and derived balance computation.
// Purpose: Keep balances derived from the event log, never stored.
// Dependencies: crate::core::{events, identifiers}, serde
// ============================================================================

//! ## Overview
//! Token balances are never persisted: for each (governor, season, kind) the
//! balance is the sum of regenerated amounts minus spent amounts over the
//! season's event log. The non-negativity invariant is enforced at spend
//! time by the governance kernel; this module only folds.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::events::EventKind;
use crate::core::events::GovernanceEvent;
use crate::core::identifiers::GovernorId;

// ============================================================================
// SECTION: Token Kind
// ============================================================================

/// Fungible token kinds spent on governance actions.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    /// Spent to submit a proposal.
    Propose,
    /// Spent to amend a proposal.
    Amend,
    /// Spent to double one vote's weight.
    Boost,
}

impl TokenKind {
    /// Returns a stable label for audit payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Propose => "PROPOSE",
            Self::Amend => "AMEND",
            Self::Boost => "BOOST",
        }
    }
}

// ============================================================================
// SECTION: Ledger
// ============================================================================

/// Derived per-governor token balances for one season.
///
/// # Invariants
/// - Balances reflect exactly the events folded in; callers re-fold rather
///   than mutate. A cached instance is never authoritative.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenLedger {
    /// Balance per (governor, token kind).
    balances: BTreeMap<(GovernorId, TokenKind), i64>,
}

impl TokenLedger {
    /// Folds a season's event log into a ledger.
    ///
    /// Unknown and non-token events are skipped; ordering does not affect
    /// the totals.
    #[must_use]
    pub fn from_events(events: &[GovernanceEvent]) -> Self {
        let mut ledger = Self::default();
        for event in events {
            match event.decode() {
                EventKind::TokenRegenerated { token_type, amount, .. } => {
                    if let Some(governor_id) = event.governor_id.clone() {
                        *ledger.balances.entry((governor_id, token_type)).or_insert(0) += amount;
                    }
                }
                EventKind::TokenSpent { token_type, amount, .. } => {
                    if let Some(governor_id) = event.governor_id.clone() {
                        *ledger.balances.entry((governor_id, token_type)).or_insert(0) -= amount;
                    }
                }
                _ => {}
            }
        }
        ledger
    }

    /// Returns the balance for a governor and token kind.
    #[must_use]
    pub fn balance(&self, governor_id: &GovernorId, kind: TokenKind) -> i64 {
        self.balances.get(&(governor_id.clone(), kind)).copied().unwrap_or(0)
    }

    /// Returns true when the governor can afford `amount` of `kind`.
    #[must_use]
    pub fn can_spend(&self, governor_id: &GovernorId, kind: TokenKind, amount: i64) -> bool {
        self.balance(governor_id, kind) >= amount
    }
}
