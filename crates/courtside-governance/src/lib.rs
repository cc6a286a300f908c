// crates/courtside-governance/src/lib.rs
// ============================================================================
// Module: Courtside Governance Root
// Description: Public API surface for the governance kernel.
// Purpose: Wire together the kernel, projections, and classification rules.
// Dependencies: crate::{kernel, projection, sanitize, strategy, tier}
// ============================================================================

//! ## Overview
//! The governance kernel owns the proposal lifecycle, the token economy, and
//! the tally. All derived state (proposal status, balances, strategies,
//! trades) rebuilds from the append-only event log; the kernel is the only
//! writer.

// ============================================================================
// SECTION: Core Modules
// ============================================================================

pub mod kernel;
pub mod projection;
pub mod sanitize;
pub mod strategy;
pub mod tier;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use kernel::ActionOutcome;
pub use kernel::GovernanceError;
pub use kernel::GovernanceKernel;
pub use kernel::GovernorRoster;
pub use kernel::TallyReport;
pub use kernel::load_trades;
pub use projection::ProposalProjection;
pub use projection::load_proposals;
pub use sanitize::sanitize;
pub use strategy::load_strategies;
pub use strategy::parse_strategy;
pub use tier::interpretation_tier;
pub use tier::needs_admin_review;
pub use tier::threshold_for_tier;
