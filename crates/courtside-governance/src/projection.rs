// crates/courtside-governance/src/projection.rs
// ============================================================================
// Module: Proposal Projections
// Description: Aggregate reconstruction by replaying the event log.
// Purpose: Rebuild proposal state, votes, and amendment cutoffs exactly.
// Dependencies: crate::tier, courtside-core
// ============================================================================

//! ## Overview
//! Proposals are aggregates: the event log is the truth and these
//! projections are derived views. Replay folds the season's events in
//! sequence order; anything unknown is skipped. The amendment cutoff is a
//! sequence number, not a timestamp; consumers must never order by clock.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use courtside_core::EventKind;
use courtside_core::GovernanceEvent;
use courtside_core::Proposal;
use courtside_core::ProposalId;
use courtside_core::ProposalStatus;
use courtside_core::Vote;

use crate::tier::interpretation_tier;

// ============================================================================
// SECTION: Projection
// ============================================================================

/// Rebuilt proposal state with tally bookkeeping.
#[derive(Debug, Clone)]
pub struct ProposalProjection {
    /// Rebuilt proposal aggregate.
    pub proposal: Proposal,
    /// Votes with the sequence number they were appended at.
    pub votes: Vec<(u64, Vote)>,
    /// Sequence number of the latest amendment; 0 when never amended.
    pub last_amend_seq: u64,
    /// Whether a `first_tally_seen` marker exists.
    pub first_tally_seen: bool,
    /// Background interpretation retries recorded so far.
    pub retry_count: u32,
}

impl ProposalProjection {
    /// Votes that count at tally: appended after the latest amendment, one
    /// per governor (the latest wins).
    #[must_use]
    pub fn countable_votes(&self) -> Vec<&Vote> {
        let mut by_governor: BTreeMap<&courtside_core::GovernorId, &Vote> = BTreeMap::new();
        for (sequence, vote) in &self.votes {
            if *sequence > self.last_amend_seq {
                by_governor.insert(&vote.governor_id, vote);
            }
        }
        by_governor.into_values().collect()
    }

    /// Returns true when the proposal still accepts votes.
    #[must_use]
    pub const fn open_for_votes(&self) -> bool {
        matches!(
            self.proposal.status,
            ProposalStatus::Confirmed
                | ProposalStatus::Amended
                | ProposalStatus::FlaggedForReview
        )
    }

    /// Returns true when the governor already has a countable vote.
    #[must_use]
    pub fn has_countable_vote(&self, governor_id: &courtside_core::GovernorId) -> bool {
        self.votes
            .iter()
            .any(|(sequence, vote)| {
                *sequence > self.last_amend_seq && &vote.governor_id == governor_id
            })
    }
}

// ============================================================================
// SECTION: Replay
// ============================================================================

/// Rebuilds every proposal in a season from its event log.
///
/// Events must be supplied in sequence order; unknown tags are skipped.
#[must_use]
pub fn load_proposals(
    events: &[GovernanceEvent],
) -> BTreeMap<ProposalId, ProposalProjection> {
    let mut projections: BTreeMap<ProposalId, ProposalProjection> = BTreeMap::new();
    for event in events {
        match event.decode() {
            EventKind::ProposalSubmitted { proposal } => {
                projections.insert(proposal.id.clone(), ProposalProjection {
                    proposal,
                    votes: Vec::new(),
                    last_amend_seq: 0,
                    first_tally_seen: false,
                    retry_count: 0,
                });
            }
            EventKind::ProposalPendingInterpretation { proposal_id, retry_count } => {
                if let Some(projection) = projections.get_mut(&proposal_id) {
                    projection.proposal.status = ProposalStatus::PendingInterpretation;
                    projection.retry_count = retry_count;
                }
            }
            EventKind::ProposalInterpretationRetryFailed { proposal_id, .. } => {
                if let Some(projection) = projections.get_mut(&proposal_id) {
                    projection.retry_count += 1;
                }
            }
            EventKind::ProposalInterpretationExpired { proposal_id, .. } => {
                if let Some(projection) = projections.get_mut(&proposal_id) {
                    projection.proposal.status = ProposalStatus::Expired;
                }
            }
            EventKind::ProposalConfirmed { proposal_id, interpretation, tier } => {
                if let Some(projection) = projections.get_mut(&proposal_id) {
                    if let Some(interpretation) = interpretation {
                        projection.proposal.interpretation = Some(interpretation);
                    }
                    if let Some(tier) = tier {
                        projection.proposal.tier = tier;
                    }
                    if projection.proposal.status != ProposalStatus::FlaggedForReview {
                        projection.proposal.status = ProposalStatus::Confirmed;
                    }
                }
            }
            EventKind::ProposalFlaggedForReview { proposal } => {
                if let Some(projection) = projections.get_mut(&proposal.id) {
                    projection.proposal.status = ProposalStatus::FlaggedForReview;
                    projection.proposal.needs_admin_review = true;
                }
            }
            EventKind::ProposalReviewCleared { proposal_id } => {
                if let Some(projection) = projections.get_mut(&proposal_id) {
                    projection.proposal.needs_admin_review = false;
                    if projection.proposal.status == ProposalStatus::FlaggedForReview {
                        projection.proposal.status = ProposalStatus::Confirmed;
                    }
                }
            }
            EventKind::ProposalVetoed { proposal, .. } => {
                if let Some(projection) = projections.get_mut(&proposal.id) {
                    projection.proposal.status = ProposalStatus::Vetoed;
                }
            }
            EventKind::ProposalCancelled { proposal_id } => {
                if let Some(projection) = projections.get_mut(&proposal_id) {
                    projection.proposal.status = ProposalStatus::Cancelled;
                }
            }
            EventKind::ProposalAmended { amendment } => {
                if let Some(projection) = projections.get_mut(&amendment.proposal_id) {
                    projection.proposal.tier = interpretation_tier(&amendment.interpretation);
                    projection.proposal.interpretation = Some(amendment.interpretation);
                    projection.proposal.status = ProposalStatus::Amended;
                    projection.proposal.amendment_count += 1;
                    projection.last_amend_seq = event.sequence_number;
                }
            }
            EventKind::ProposalFirstTallySeen { proposal_id, .. } => {
                if let Some(projection) = projections.get_mut(&proposal_id) {
                    projection.first_tally_seen = true;
                }
            }
            EventKind::ProposalPassed { proposal_id, .. } => {
                if let Some(projection) = projections.get_mut(&proposal_id) {
                    projection.proposal.status = ProposalStatus::Passed;
                }
            }
            EventKind::ProposalFailed { proposal_id, .. } => {
                if let Some(projection) = projections.get_mut(&proposal_id) {
                    projection.proposal.status = ProposalStatus::Failed;
                }
            }
            EventKind::VoteCast { vote } => {
                if let Some(projection) = projections.get_mut(&vote.proposal_id) {
                    projection.votes.push((event.sequence_number, vote));
                }
            }
            _ => {}
        }
    }
    projections
}
