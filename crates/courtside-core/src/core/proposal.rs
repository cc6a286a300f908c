// crates/courtside-core/src/core/proposal.rs
// ============================================================================
// Module: Courtside Proposal Model
// Description: Proposal aggregate, votes, amendments, trades, and tallies.
// Purpose: Define the governance aggregates rebuilt from the event log.
// Dependencies: crate::core::{effects, identifiers, time}, serde
// ============================================================================

//! ## Overview
//! Proposals are aggregates: their durable truth is the governance event
//! stream, and the structs here are the rebuilt projections. The governance
//! kernel owns the replay; these types only carry state and enumerate it
//! stably for the wire.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::effects::EffectSpec;
use crate::core::identifiers::GovernorId;
use crate::core::identifiers::PlayerId;
use crate::core::identifiers::ProposalId;
use crate::core::identifiers::SeasonId;
use crate::core::identifiers::TeamId;
use crate::core::identifiers::TradeId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Proposal Status
// ============================================================================

/// Proposal lifecycle status.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    /// Interpretation failed; queued for background retry.
    PendingInterpretation,
    /// Interpreted and open for votes.
    Confirmed,
    /// Open for votes but awaiting admin review.
    FlaggedForReview,
    /// Admin vetoed before tally; tokens refunded.
    Vetoed,
    /// Amended; votes before the amendment are invalidated.
    Amended,
    /// Tally passed; effects enacted.
    Passed,
    /// Tally failed.
    Failed,
    /// Author cancelled before tally.
    Cancelled,
    /// Interpretation retries exhausted; tokens refunded.
    Expired,
}

// ============================================================================
// SECTION: Interpretation
// ============================================================================

/// Structured interpretation of a proposal's raw text.
///
/// # Invariants
/// - `confidence` lies in `[0.0, 1.0]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    /// One-line summary of the interpreted intent.
    pub summary: String,
    /// Effects the proposal installs when passed.
    pub effects: Vec<EffectSpec>,
    /// Interpreter confidence.
    pub confidence: f64,
    /// Whether the injection classifier flagged the input.
    pub injection_flagged: bool,
}

// ============================================================================
// SECTION: Proposal Aggregate
// ============================================================================

/// Proposal aggregate projection.
///
/// # Invariants
/// - Rebuilt by replaying the proposal's event stream; never mutated
///   outside the governance kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    /// Proposal identifier.
    pub id: ProposalId,
    /// Authoring governor.
    pub author_id: GovernorId,
    /// Author's team.
    pub team_id: TeamId,
    /// Season scope.
    pub season_id: SeasonId,
    /// Raw submitted text.
    pub raw_text: String,
    /// Sanitized text fed to interpretation.
    pub sanitized_text: String,
    /// Current interpretation, absent while pending.
    pub interpretation: Option<Interpretation>,
    /// Impact tier, 1 through 7+.
    pub tier: u8,
    /// PROPOSE tokens charged at submit.
    pub token_cost: i64,
    /// Lifecycle status.
    pub status: ProposalStatus,
    /// Whether admin review is required before the outcome is trusted.
    pub needs_admin_review: bool,
    /// Amendments applied so far.
    pub amendment_count: u8,
    /// Round the proposal was submitted in.
    pub submitted_round: u32,
    /// Submission timestamp.
    pub submitted_at: Timestamp,
}

// ============================================================================
// SECTION: Votes and Amendments
// ============================================================================

/// Vote direction.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteDirection {
    /// In favor.
    Yes,
    /// Against.
    No,
}

/// Vote scoped to a proposal.
///
/// # Invariants
/// - `weight` is `1/N` over the voter team's active governors, doubled when
///   boosted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    /// Proposal voted on.
    pub proposal_id: ProposalId,
    /// Voting governor.
    pub governor_id: GovernorId,
    /// Voter's team.
    pub team_id: TeamId,
    /// Direction.
    pub direction: VoteDirection,
    /// Weighted contribution.
    pub weight: f64,
    /// Whether a BOOST token doubled the weight.
    pub boosted: bool,
    /// Cast timestamp.
    pub cast_at: Timestamp,
}

/// Amendment replacing a proposal's interpretation.
///
/// # Invariants
/// - The original author never appears as `author_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amendment {
    /// Amended proposal.
    pub proposal_id: ProposalId,
    /// Amending governor.
    pub author_id: GovernorId,
    /// Replacement interpretation.
    pub interpretation: Interpretation,
    /// Amendment timestamp.
    pub amended_at: Timestamp,
}

/// Weighted tally outcome recorded on pass or fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TallyOutcome {
    /// Weighted yes votes.
    pub weighted_yes: f64,
    /// Weighted no votes.
    pub weighted_no: f64,
    /// Total counted weight.
    pub total_weight: f64,
    /// Threshold the yes share had to strictly exceed.
    pub threshold: f64,
    /// Whether the proposal passed.
    pub passed: bool,
}

// ============================================================================
// SECTION: Trades
// ============================================================================

/// Trade offer status.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    /// Awaiting a response.
    Offered,
    /// Accepted; rosters swapped.
    Accepted,
    /// Rejected.
    Rejected,
}

/// Trade aggregate projection.
///
/// # Invariants
/// - Fields are symmetric: swapping the from/to pairs yields the
///   counterparty's view of the same trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOffer {
    /// Trade identifier.
    pub id: TradeId,
    /// Season scope.
    pub season_id: SeasonId,
    /// Offering team.
    pub from_team_id: TeamId,
    /// Receiving team.
    pub to_team_id: TeamId,
    /// Player leaving the offering team.
    pub offered_player_id: PlayerId,
    /// Player requested from the receiving team.
    pub requested_player_id: PlayerId,
    /// Governor who made the offer.
    pub offered_by: GovernorId,
    /// Offer status.
    pub status: TradeStatus,
    /// Offer timestamp.
    pub offered_at: Timestamp,
}
