// crates/courtside-core/src/core/events.rs
// ============================================================================
// Module: Courtside Governance Events
// Description: Append-only event envelope and the typed payload taxonomy.
// Purpose: Provide bit-stable wire forms with forward-compatible decoding.
// Dependencies: crate::core::{effects, identifiers, proposal, rules, team,
// time, tokens}, serde, serde_json
// ============================================================================

//! ## Overview
//! Governance events are the source of truth for all derived state. The
//! envelope carries ordering and scoping columns; the payload is a tagged
//! union over the event taxonomy. Unknown tags decode to [`EventKind::Unknown`]
//! with the raw payload preserved, so newer writers never break older
//! readers. No update or delete operation exists anywhere in this module.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::effects::EffectRecord;
use crate::core::identifiers::EffectId;
use crate::core::identifiers::EventId;
use crate::core::identifiers::GovernorId;
use crate::core::identifiers::ProposalId;
use crate::core::identifiers::SeasonId;
use crate::core::identifiers::TeamId;
use crate::core::proposal::Amendment;
use crate::core::proposal::Proposal;
use crate::core::proposal::TallyOutcome;
use crate::core::proposal::TradeOffer;
use crate::core::proposal::Vote;
use crate::core::rules::RuleValue;
use crate::core::team::TeamStrategy;
use crate::core::time::Timestamp;
use crate::core::tokens::TokenKind;

// ============================================================================
// SECTION: Aggregate Kinds
// ============================================================================

/// Aggregate family an event belongs to.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateKind {
    /// Proposal lifecycle and votes.
    Proposal,
    /// Token regeneration and spend.
    Token,
    /// Rule enactment and rollback.
    RuleChange,
    /// Trade offers and responses.
    Trade,
    /// Team strategy updates.
    Strategy,
    /// Effect registration and expiry.
    Effect,
    /// Vote records.
    Vote,
}

// ============================================================================
// SECTION: Event Taxonomy
// ============================================================================

/// Typed payloads for every event in the taxonomy.
///
/// The wire form is internally tagged with the dotted `event_type`; decoding
/// an unrecognized tag yields [`EventKind::Unknown`] instead of an error.
///
/// # Invariants
/// - Tags are dotted names, stable on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum EventKind {
    /// Proposal submitted with its initial interpretation.
    #[serde(rename = "proposal.submitted")]
    ProposalSubmitted {
        /// Full proposal dump.
        proposal: Proposal,
    },
    /// Interpretation failed; queued for background retry.
    #[serde(rename = "proposal.pending_interpretation")]
    ProposalPendingInterpretation {
        /// Proposal identifier.
        proposal_id: ProposalId,
        /// Retries attempted so far.
        retry_count: u32,
    },
    /// One background interpretation retry failed.
    #[serde(rename = "proposal.interpretation_retry_failed")]
    ProposalInterpretationRetryFailed {
        /// Proposal identifier.
        proposal_id: ProposalId,
        /// Failure reason.
        reason: String,
    },
    /// Retries exhausted; proposal expired with refund.
    #[serde(rename = "proposal.interpretation_expired")]
    ProposalInterpretationExpired {
        /// Proposal identifier.
        proposal_id: ProposalId,
        /// PROPOSE tokens refunded.
        refund_amount: i64,
    },
    /// Proposal interpreted and opened for votes.
    #[serde(rename = "proposal.confirmed")]
    ProposalConfirmed {
        /// Proposal identifier.
        proposal_id: ProposalId,
        /// Interpretation, present when confirmation came from a background
        /// retry rather than the submit path.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        interpretation: Option<crate::core::proposal::Interpretation>,
        /// Tier computed with the late interpretation.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tier: Option<u8>,
    },
    /// Proposal flagged for admin review (still open to vote).
    #[serde(rename = "proposal.flagged_for_review")]
    ProposalFlaggedForReview {
        /// Full proposal dump.
        proposal: Proposal,
    },
    /// Admin cleared a flagged proposal.
    #[serde(rename = "proposal.review_cleared")]
    ProposalReviewCleared {
        /// Proposal identifier.
        proposal_id: ProposalId,
    },
    /// Admin vetoed a proposal; tokens refunded.
    #[serde(rename = "proposal.vetoed")]
    ProposalVetoed {
        /// Full proposal dump.
        proposal: Proposal,
        /// Veto reason.
        reason: String,
    },
    /// Author cancelled the proposal.
    #[serde(rename = "proposal.cancelled")]
    ProposalCancelled {
        /// Proposal identifier.
        proposal_id: ProposalId,
    },
    /// Proposal amended; earlier votes invalidated.
    #[serde(rename = "proposal.amended")]
    ProposalAmended {
        /// Amendment dump.
        amendment: Amendment,
    },
    /// Minimum-voting-period marker emitted at the first tally attempt.
    #[serde(rename = "proposal.first_tally_seen")]
    ProposalFirstTallySeen {
        /// Proposal identifier.
        proposal_id: ProposalId,
        /// Round of the first tally attempt.
        round: u32,
    },
    /// Tally passed.
    #[serde(rename = "proposal.passed")]
    ProposalPassed {
        /// Proposal identifier.
        proposal_id: ProposalId,
        /// Weighted tally with threshold.
        tally: TallyOutcome,
    },
    /// Tally failed.
    #[serde(rename = "proposal.failed")]
    ProposalFailed {
        /// Proposal identifier.
        proposal_id: ProposalId,
        /// Weighted tally with threshold.
        tally: TallyOutcome,
    },
    /// Constraint rejection audit record.
    #[serde(rename = "proposal.rejected")]
    ProposalRejected {
        /// Proposal identifier.
        proposal_id: ProposalId,
        /// Rejection reason.
        reason: String,
    },
    /// Vote cast on a proposal.
    #[serde(rename = "vote.cast")]
    VoteCast {
        /// Vote dump.
        vote: Vote,
    },
    /// Rule parameter enacted after a passed proposal.
    #[serde(rename = "rule.enacted")]
    RuleEnacted {
        /// Changed parameter.
        parameter: String,
        /// Value before enactment.
        old_value: RuleValue,
        /// Value after enactment.
        new_value: RuleValue,
        /// Source proposal.
        proposal_id: ProposalId,
        /// Round of enactment.
        round: u32,
    },
    /// Rule application failed validation and was rolled back.
    #[serde(rename = "rule.rolled_back")]
    RuleRolledBack {
        /// Rollback reason.
        reason: String,
        /// Source proposal.
        proposal_id: ProposalId,
    },
    /// Tokens spent.
    #[serde(rename = "token.spent")]
    TokenSpent {
        /// Token kind.
        token_type: TokenKind,
        /// Amount spent.
        amount: i64,
        /// Spend reason.
        reason: String,
    },
    /// Tokens regenerated at a window boundary.
    #[serde(rename = "token.regenerated")]
    TokenRegenerated {
        /// Token kind.
        token_type: TokenKind,
        /// Amount regenerated.
        amount: i64,
        /// Regeneration reason.
        reason: String,
    },
    /// Trade offered.
    #[serde(rename = "trade.offered")]
    TradeOffered {
        /// Trade dump.
        trade: TradeOffer,
    },
    /// Trade accepted.
    #[serde(rename = "trade.accepted")]
    TradeAccepted {
        /// Trade dump.
        trade: TradeOffer,
    },
    /// Trade rejected.
    #[serde(rename = "trade.rejected")]
    TradeRejected {
        /// Trade dump.
        trade: TradeOffer,
    },
    /// Raw strategy text set by a governor.
    #[serde(rename = "strategy.set")]
    StrategySet {
        /// Team the strategy applies to.
        team_id: TeamId,
        /// Raw strategy text.
        raw: String,
    },
    /// Strategy interpreted into structured form.
    #[serde(rename = "strategy.interpreted")]
    StrategyInterpreted {
        /// Team the strategy applies to.
        team_id: TeamId,
        /// Structured strategy.
        strategy: TeamStrategy,
    },
    /// Effect registered from a passed proposal.
    #[serde(rename = "effect.registered")]
    EffectRegistered {
        /// Registered effect dump.
        effect: EffectRecord,
    },
    /// Effect expired.
    #[serde(rename = "effect.expired")]
    EffectExpired {
        /// Effect identifier.
        effect_id: EffectId,
        /// Round of expiry.
        round: u32,
    },
    /// Unrecognized tag preserved for forward compatibility.
    #[serde(skip)]
    Unknown {
        /// Original dotted event type.
        event_type: String,
        /// Raw payload preserved verbatim.
        payload: Value,
    },
}

impl EventKind {
    /// Returns the dotted event type tag.
    #[must_use]
    pub fn event_type(&self) -> &str {
        match self {
            Self::ProposalSubmitted { .. } => "proposal.submitted",
            Self::ProposalPendingInterpretation { .. } => "proposal.pending_interpretation",
            Self::ProposalInterpretationRetryFailed { .. } => {
                "proposal.interpretation_retry_failed"
            }
            Self::ProposalInterpretationExpired { .. } => "proposal.interpretation_expired",
            Self::ProposalConfirmed { .. } => "proposal.confirmed",
            Self::ProposalFlaggedForReview { .. } => "proposal.flagged_for_review",
            Self::ProposalReviewCleared { .. } => "proposal.review_cleared",
            Self::ProposalVetoed { .. } => "proposal.vetoed",
            Self::ProposalCancelled { .. } => "proposal.cancelled",
            Self::ProposalAmended { .. } => "proposal.amended",
            Self::ProposalFirstTallySeen { .. } => "proposal.first_tally_seen",
            Self::ProposalPassed { .. } => "proposal.passed",
            Self::ProposalFailed { .. } => "proposal.failed",
            Self::ProposalRejected { .. } => "proposal.rejected",
            Self::VoteCast { .. } => "vote.cast",
            Self::RuleEnacted { .. } => "rule.enacted",
            Self::RuleRolledBack { .. } => "rule.rolled_back",
            Self::TokenSpent { .. } => "token.spent",
            Self::TokenRegenerated { .. } => "token.regenerated",
            Self::TradeOffered { .. } => "trade.offered",
            Self::TradeAccepted { .. } => "trade.accepted",
            Self::TradeRejected { .. } => "trade.rejected",
            Self::StrategySet { .. } => "strategy.set",
            Self::StrategyInterpreted { .. } => "strategy.interpreted",
            Self::EffectRegistered { .. } => "effect.registered",
            Self::EffectExpired { .. } => "effect.expired",
            Self::Unknown { event_type, .. } => event_type,
        }
    }

    /// Returns the aggregate family and identifier the event belongs to.
    #[must_use]
    pub fn aggregate(&self) -> (AggregateKind, String) {
        match self {
            Self::ProposalSubmitted { proposal }
            | Self::ProposalFlaggedForReview { proposal }
            | Self::ProposalVetoed { proposal, .. } => {
                (AggregateKind::Proposal, proposal.id.to_string())
            }
            Self::ProposalPendingInterpretation { proposal_id, .. }
            | Self::ProposalInterpretationRetryFailed { proposal_id, .. }
            | Self::ProposalInterpretationExpired { proposal_id, .. }
            | Self::ProposalConfirmed { proposal_id, .. }
            | Self::ProposalReviewCleared { proposal_id }
            | Self::ProposalCancelled { proposal_id }
            | Self::ProposalFirstTallySeen { proposal_id, .. }
            | Self::ProposalPassed { proposal_id, .. }
            | Self::ProposalFailed { proposal_id, .. }
            | Self::ProposalRejected { proposal_id, .. } => {
                (AggregateKind::Proposal, proposal_id.to_string())
            }
            Self::ProposalAmended { amendment } => {
                (AggregateKind::Proposal, amendment.proposal_id.to_string())
            }
            Self::VoteCast { vote } => (AggregateKind::Vote, vote.proposal_id.to_string()),
            Self::RuleEnacted { parameter, .. } => {
                (AggregateKind::RuleChange, parameter.clone())
            }
            Self::RuleRolledBack { proposal_id, .. } => {
                (AggregateKind::RuleChange, proposal_id.to_string())
            }
            Self::TokenSpent { token_type, .. } | Self::TokenRegenerated { token_type, .. } => {
                (AggregateKind::Token, token_type.as_str().to_string())
            }
            Self::TradeOffered { trade }
            | Self::TradeAccepted { trade }
            | Self::TradeRejected { trade } => (AggregateKind::Trade, trade.id.to_string()),
            Self::StrategySet { team_id, .. } | Self::StrategyInterpreted { team_id, .. } => {
                (AggregateKind::Strategy, team_id.to_string())
            }
            Self::EffectRegistered { effect } => {
                (AggregateKind::Effect, effect.id.to_string())
            }
            Self::EffectExpired { effect_id, .. } => {
                (AggregateKind::Effect, effect_id.to_string())
            }
            Self::Unknown { event_type, .. } => {
                (AggregateKind::Proposal, event_type.clone())
            }
        }
    }

    /// Serializes the payload to its tagged wire form.
    ///
    /// # Errors
    ///
    /// Returns the underlying serialization error; payloads contain only
    /// serializable value types, so failures indicate a programming bug.
    pub fn to_wire(&self) -> Result<Value, serde_json::Error> {
        if let Self::Unknown { payload, .. } = self {
            return Ok(payload.clone());
        }
        serde_json::to_value(self)
    }

    /// Decodes a tagged wire payload, preserving unknown tags.
    #[must_use]
    pub fn from_wire(event_type: &str, payload: Value) -> Self {
        serde_json::from_value(payload.clone()).unwrap_or_else(|_| Self::Unknown {
            event_type: event_type.to_string(),
            payload,
        })
    }
}

// ============================================================================
// SECTION: Event Envelope
// ============================================================================

/// Append-only governance event envelope.
///
/// # Invariants
/// - `sequence_number` strictly increases within a season; assignment
///   happens inside the store's insert transaction.
/// - Envelopes are immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceEvent {
    /// Event identifier.
    pub id: EventId,
    /// Monotonic per-season sequence number.
    pub sequence_number: u64,
    /// Dotted event type, duplicated from the payload for indexing.
    pub event_type: String,
    /// Aggregate identifier.
    pub aggregate_id: String,
    /// Aggregate family.
    pub aggregate_kind: AggregateKind,
    /// Season scope.
    pub season_id: SeasonId,
    /// Round the event was appended in.
    pub round_number: u32,
    /// Acting governor, when applicable.
    pub governor_id: Option<GovernorId>,
    /// Acting governor's team, when applicable.
    pub team_id: Option<TeamId>,
    /// Append timestamp, supplied by the runtime.
    pub timestamp: Timestamp,
    /// Tagged payload wire form.
    pub payload: Value,
}

impl GovernanceEvent {
    /// Builds an unsequenced envelope from a typed payload.
    ///
    /// The store assigns `sequence_number` at append time; the placeholder
    /// here is zero and never observable through reads.
    ///
    /// # Errors
    ///
    /// Returns the underlying serialization error from payload encoding.
    pub fn build(
        kind: &EventKind,
        season_id: SeasonId,
        round_number: u32,
        governor_id: Option<GovernorId>,
        team_id: Option<TeamId>,
        timestamp: Timestamp,
    ) -> Result<Self, serde_json::Error> {
        let (aggregate_kind, aggregate_id) = kind.aggregate();
        Ok(Self {
            id: EventId::fresh(),
            sequence_number: 0,
            event_type: kind.event_type().to_string(),
            aggregate_id,
            aggregate_kind,
            season_id,
            round_number,
            governor_id,
            team_id,
            timestamp,
            payload: kind.to_wire()?,
        })
    }

    /// Decodes the payload into its typed form, preserving unknown tags.
    #[must_use]
    pub fn decode(&self) -> EventKind {
        EventKind::from_wire(&self.event_type, self.payload.clone())
    }
}
