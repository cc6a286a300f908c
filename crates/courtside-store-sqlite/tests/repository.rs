// crates/courtside-store-sqlite/tests/repository.rs
// ============================================================================
// Module: Repository Tests
// Description: Sequencing, round-trips, self-healing, leases, and meta.
// ============================================================================
//! ## Overview
//! Validates the event log's ordering contract, entity round-trips through
//! the store, schema self-healing, the scheduler lease, and meta bucket
//! persistence.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use courtside_core::EventKind;
use courtside_core::EventStore;
use courtside_core::GameId;
use courtside_core::GameResult;
use courtside_core::GovernanceEvent;
use courtside_core::GovernorId;
use courtside_core::MetaBucket;
use courtside_core::MetaEntityKind;
use courtside_core::MetaKey;
use courtside_core::ProposalId;
use courtside_core::RuleSet;
use courtside_core::SeasonId;
use courtside_core::TeamId;
use courtside_core::Timestamp;
use courtside_core::TokenKind;
use courtside_store_sqlite::Repository;
use sieve_logic::Scalar;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn season_id() -> SeasonId {
    SeasonId::from("season-1")
}

fn event(kind: &EventKind) -> GovernanceEvent {
    GovernanceEvent::build(
        kind,
        season_id(),
        1,
        Some(GovernorId::from("gov-1")),
        None,
        Timestamp::from_unix_millis(1_700_000_000_000),
    )
    .unwrap()
}

fn sample_result(round: u32, slot: u32, presented: bool) -> GameResult {
    GameResult {
        id: GameId::from(format!("game-{round}-{slot}").as_str()),
        season_id: season_id(),
        round,
        slot,
        home_team_id: TeamId::from("team-1"),
        away_team_id: TeamId::from("team-2"),
        home_score: 71,
        away_score: 66,
        seed: 42,
        rng_draws: 913,
        quarter_scores: vec![(20, 15), (18, 17), (16, 18), (17, 16)],
        play_by_play: Vec::new(),
        box_scores: Vec::new(),
        elam: None,
        safety_capped: false,
        total_possessions: 84,
        lead_changes: 6,
        ruleset_snapshot: RuleSet::default(),
        presented,
    }
}

// ============================================================================
// SECTION: Event Sequencing
// ============================================================================

#[test]
fn sequence_numbers_strictly_increase_per_season() {
    let mut repo = Repository::in_memory().unwrap();
    for index in 0..5 {
        let kind = EventKind::TokenRegenerated {
            token_type: TokenKind::Propose,
            amount: 1,
            reason: format!("window {index}"),
        };
        repo.append_event(event(&kind)).unwrap();
    }
    let events = repo.events_for_season(&season_id()).unwrap();
    assert_eq!(events.len(), 5);
    for window in events.windows(2) {
        assert!(window[0].sequence_number < window[1].sequence_number);
    }
    assert_eq!(events[0].sequence_number, 1);
}

#[test]
fn append_returns_the_sequenced_envelope() {
    let mut repo = Repository::in_memory().unwrap();
    let kind = EventKind::ProposalCancelled { proposal_id: ProposalId::from("prop-1") };
    let sequenced = repo.append_event(event(&kind)).unwrap();
    assert_eq!(sequenced.sequence_number, 1);
}

#[test]
fn reads_filter_by_type_and_aggregate() {
    let mut repo = Repository::in_memory().unwrap();
    let cancel = EventKind::ProposalCancelled { proposal_id: ProposalId::from("prop-1") };
    let spend = EventKind::TokenSpent {
        token_type: TokenKind::Propose,
        amount: 1,
        reason: "submit".to_string(),
    };
    repo.append_event(event(&cancel)).unwrap();
    repo.append_event(event(&spend)).unwrap();

    let cancels = repo.events_by_type(&season_id(), "proposal.cancelled").unwrap();
    assert_eq!(cancels.len(), 1);
    let aggregate = repo.events_for_aggregate(&season_id(), "prop-1").unwrap();
    assert_eq!(aggregate.len(), 1);
    assert_eq!(aggregate[0].decode(), cancel);
}

#[test]
fn event_payload_round_trips_through_the_store() {
    let mut repo = Repository::in_memory().unwrap();
    let kind = EventKind::TokenSpent {
        token_type: TokenKind::Boost,
        amount: 1,
        reason: "vote_boost:prop-9".to_string(),
    };
    repo.append_event(event(&kind)).unwrap();
    let loaded = repo.events_for_season(&season_id()).unwrap();
    assert_eq!(loaded[0].decode(), kind);
}

// ============================================================================
// SECTION: Game Results
// ============================================================================

#[test]
fn game_result_round_trips_and_presented_flag_updates() {
    let repo = Repository::in_memory().unwrap();
    let result = sample_result(1, 0, false);
    repo.insert_game_result(&result).unwrap();

    let loaded = repo.results_for_round(&season_id(), 1).unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0], result);

    repo.mark_presented(&result.id).unwrap();
    let presented = repo.results_for_round(&season_id(), 1).unwrap();
    assert!(presented[0].presented);
}

#[test]
fn unpresented_lookup_targets_the_latest_round_only() {
    let repo = Repository::in_memory().unwrap();
    repo.insert_game_result(&sample_result(1, 0, true)).unwrap();
    repo.insert_game_result(&sample_result(2, 0, false)).unwrap();
    repo.insert_game_result(&sample_result(2, 1, false)).unwrap();

    let unpresented = repo.unpresented_latest_round(&season_id()).unwrap();
    assert_eq!(unpresented.len(), 2);
}

// ============================================================================
// SECTION: Leases
// ============================================================================

#[test]
fn lease_excludes_other_holders_until_expiry() {
    let repo = Repository::in_memory().unwrap();
    assert!(repo.try_acquire_lease("tick", "holder-a", 1_000, 5_000).unwrap());
    // A rival cannot take a live lease, but the holder can renew it.
    assert!(!repo.try_acquire_lease("tick", "holder-b", 2_000, 5_000).unwrap());
    assert!(repo.try_acquire_lease("tick", "holder-a", 2_000, 5_000).unwrap());
    // After expiry the rival wins.
    assert!(repo.try_acquire_lease("tick", "holder-b", 10_000, 5_000).unwrap());
}

// ============================================================================
// SECTION: Meta Buckets
// ============================================================================

#[test]
fn meta_buckets_flush_and_reload() {
    let repo = Repository::in_memory().unwrap();
    let team = courtside_core::Team {
        id: TeamId::from("team-1"),
        name: "Testers".to_string(),
        emblem: "T".to_string(),
        players: Vec::new(),
        venue: courtside_core::Venue {
            name: "Test Pavilion".to_string(),
            capacity: 100,
            altitude_m: 0,
            surface: "hardwood".to_string(),
            latitude: 0.0,
            longitude: 0.0,
        },
    };
    repo.upsert_team(&season_id(), &team).unwrap();

    let key = MetaKey {
        kind: MetaEntityKind::Team,
        entity_id: "team-1".to_string(),
        season_id: season_id(),
    };
    let mut bucket = MetaBucket::new();
    bucket.insert("hot_streak".to_string(), Scalar::Num(3.0));
    repo.flush_meta(&[(key.clone(), bucket.clone())]).unwrap();

    let loaded = repo.load_meta_buckets(&season_id()).unwrap();
    assert_eq!(loaded.get(&key), Some(&bucket));
}

// ============================================================================
// SECTION: Schema Self-Healing
// ============================================================================

#[test]
fn reopening_heals_missing_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("league.db");
    let config = courtside_store_sqlite::RepositoryConfig {
        path: path.clone(),
        busy_timeout_ms: 1_000,
        journal_mode: courtside_store_sqlite::JournalMode::Delete,
        sync_mode: courtside_store_sqlite::SyncMode::Normal,
    };

    // Simulate an old deployment: a game_results table missing the
    // presented column.
    {
        let connection = rusqlite::Connection::open(&path).unwrap();
        connection
            .execute_batch(
                "CREATE TABLE game_results (id TEXT PRIMARY KEY, season_id TEXT NOT NULL, \
                 round INTEGER NOT NULL, slot INTEGER NOT NULL, payload TEXT NOT NULL);",
            )
            .unwrap();
    }

    let repo = Repository::open(&config).unwrap();
    repo.insert_game_result(&sample_result(1, 0, true)).unwrap();
    let loaded = repo.results_for_round(&season_id(), 1).unwrap();
    assert!(loaded[0].presented, "healed column should store the flag");
}
