// crates/courtside-core/tests/events.rs
// ============================================================================
// Module: Governance Event Tests
// Description: Tests for payload wire forms, unknown tags, and the ledger.
// ============================================================================
//! ## Overview
//! Validates bit-stable payload encoding, forward-compatible decoding, the
//! season lifecycle graph, and derived token balances.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use courtside_core::EventKind;
use courtside_core::GovernanceEvent;
use courtside_core::GovernorId;
use courtside_core::ProposalId;
use courtside_core::SeasonId;
use courtside_core::SeasonPhase;
use courtside_core::Timestamp;
use courtside_core::TokenKind;
use courtside_core::TokenLedger;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn envelope(kind: &EventKind, governor: Option<&str>, sequence: u64) -> GovernanceEvent {
    let mut event = GovernanceEvent::build(
        kind,
        SeasonId::from("season-1"),
        3,
        governor.map(GovernorId::from),
        None,
        Timestamp::from_unix_millis(1_700_000_000_000),
    )
    .unwrap();
    event.sequence_number = sequence;
    event
}

// ============================================================================
// SECTION: Wire Forms
// ============================================================================

#[test]
fn payload_round_trips_with_dotted_tag() {
    let kind = EventKind::ProposalFirstTallySeen {
        proposal_id: ProposalId::from("prop-1"),
        round: 7,
    };
    let event = envelope(&kind, None, 1);
    assert_eq!(event.event_type, "proposal.first_tally_seen");
    assert_eq!(event.payload.get("event_type").and_then(|tag| tag.as_str()),
        Some("proposal.first_tally_seen"));
    assert_eq!(event.decode(), kind);
}

#[test]
fn unknown_tag_is_preserved_verbatim() {
    let payload = serde_json::json!({
        "event_type": "proposal.telepathy_granted",
        "psi": 11,
    });
    let kind = EventKind::from_wire("proposal.telepathy_granted", payload.clone());
    let EventKind::Unknown { event_type, payload: preserved } = kind else {
        panic!("expected Unknown");
    };
    assert_eq!(event_type, "proposal.telepathy_granted");
    assert_eq!(preserved, payload);
}

#[test]
fn every_taxonomy_tag_matches_event_type() {
    let kinds = [
        EventKind::ProposalConfirmed {
            proposal_id: ProposalId::from("p"),
            interpretation: None,
            tier: None,
        },
        EventKind::TokenSpent {
            token_type: TokenKind::Propose,
            amount: 1,
            reason: "test".to_string(),
        },
        EventKind::ProposalCancelled { proposal_id: ProposalId::from("p") },
    ];
    for kind in kinds {
        let wire = kind.to_wire().unwrap();
        assert_eq!(
            wire.get("event_type").and_then(|tag| tag.as_str()),
            Some(kind.event_type()),
        );
        assert_eq!(EventKind::from_wire(kind.event_type(), wire), kind);
    }
}

// ============================================================================
// SECTION: Lifecycle Graph
// ============================================================================

#[test]
fn lifecycle_graph_permits_the_forward_path() {
    let path = [
        SeasonPhase::Setup,
        SeasonPhase::Active,
        SeasonPhase::TiebreakerCheck,
        SeasonPhase::Playoffs,
        SeasonPhase::Championship,
        SeasonPhase::Offseason,
        SeasonPhase::Complete,
    ];
    for window in path.windows(2) {
        assert!(window[0].can_transition_to(window[1]), "{:?} -> {:?}", window[0], window[1]);
    }
}

#[test]
fn lifecycle_graph_rejects_backward_and_skipping_edges() {
    assert!(!SeasonPhase::Complete.can_transition_to(SeasonPhase::Active));
    assert!(!SeasonPhase::Active.can_transition_to(SeasonPhase::Championship));
    assert!(!SeasonPhase::Offseason.can_transition_to(SeasonPhase::Playoffs));
}

// ============================================================================
// SECTION: Token Ledger
// ============================================================================

#[test]
fn ledger_folds_regeneration_minus_spend() {
    let regen = EventKind::TokenRegenerated {
        token_type: TokenKind::Propose,
        amount: 2,
        reason: "window".to_string(),
    };
    let spend = EventKind::TokenSpent {
        token_type: TokenKind::Propose,
        amount: 1,
        reason: "proposal".to_string(),
    };
    let events = vec![
        envelope(&regen, Some("gov-1"), 1),
        envelope(&spend, Some("gov-1"), 2),
        envelope(&regen, Some("gov-2"), 3),
    ];
    let ledger = TokenLedger::from_events(&events);
    assert_eq!(ledger.balance(&GovernorId::from("gov-1"), TokenKind::Propose), 1);
    assert_eq!(ledger.balance(&GovernorId::from("gov-2"), TokenKind::Propose), 2);
    assert_eq!(ledger.balance(&GovernorId::from("gov-1"), TokenKind::Boost), 0);
}

#[test]
fn ledger_prefixes_stay_non_negative_when_spends_follow_grants() {
    let regen = EventKind::TokenRegenerated {
        token_type: TokenKind::Amend,
        amount: 1,
        reason: "window".to_string(),
    };
    let spend = EventKind::TokenSpent {
        token_type: TokenKind::Amend,
        amount: 1,
        reason: "amend".to_string(),
    };
    let events = vec![envelope(&regen, Some("gov-1"), 1), envelope(&spend, Some("gov-1"), 2)];
    for prefix in 0..=events.len() {
        let ledger = TokenLedger::from_events(&events[..prefix]);
        assert!(ledger.balance(&GovernorId::from("gov-1"), TokenKind::Amend) >= 0);
    }
}
