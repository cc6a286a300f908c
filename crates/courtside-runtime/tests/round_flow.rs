// crates/courtside-runtime/tests/round_flow.rs
// ============================================================================
// Module: Round Flow Tests
// Description: End-to-end rounds, governance-only mode, and recovery.
// ============================================================================
//! ## Overview
//! Exercises the orchestrator against a seeded in-memory league on the mock
//! AI path: a full three-phase round, the governance-only branch for
//! COMPLETE seasons, interrupted-presentation recovery, and bus fan-out.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only panic-based assertions are permitted."
)]

use std::collections::BTreeMap;
use std::sync::Arc;

use courtside_ai::AiGateway;
use courtside_core::EventStore;
use courtside_core::GovernorId;
use courtside_core::SeasonPhase;
use courtside_core::Timestamp;
use courtside_governance::GovernanceKernel;
use courtside_governance::GovernorRoster;
use courtside_runtime::EventBus;
use courtside_runtime::Orchestrator;
use courtside_runtime::PresentationMode;
use courtside_runtime::PresentationPace;
use courtside_runtime::PresentationState;
use courtside_runtime::RuntimeConfig;
use courtside_runtime::Scheduler;
use courtside_runtime::SeedConfig;
use courtside_runtime::seed_league;
use courtside_store_sqlite::Repository;
use courtside_store_sqlite::RepositoryConfig;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn fixture_config() -> RuntimeConfig {
    RuntimeConfig {
        database: RepositoryConfig {
            path: std::path::PathBuf::from(":memory:"),
            busy_timeout_ms: 1_000,
            journal_mode: courtside_store_sqlite::JournalMode::Delete,
            sync_mode: courtside_store_sqlite::SyncMode::Normal,
        },
        presentation_mode: PresentationMode::Instant,
        presentation_pace: PresentationPace::Manual,
        quarter_replay_seconds: 1,
        game_interval_seconds: 0,
        governance_admin_id: None,
        evals_enabled: true,
        log_level: "warn".to_string(),
        production: false,
        ai: courtside_runtime::AiConfig::default(),
    }
}

fn fixture_seed() -> SeedConfig {
    SeedConfig {
        league_name: "Test League".to_string(),
        seed: 7,
        rules: BTreeMap::new(),
        teams: (1..=4)
            .map(|index| courtside_runtime::bootstrap::TeamSeed {
                name: format!("Team {index}"),
                emblem: String::new(),
                governors: vec![format!("gov-{index}")],
                venue: None,
            })
            .collect(),
    }
}

fn fixture_orchestrator() -> Orchestrator {
    let repo = Repository::in_memory().unwrap();
    seed_league(&repo, &fixture_seed()).unwrap();
    Orchestrator {
        repo,
        bus: Arc::new(EventBus::default()),
        gateway: Arc::new(AiGateway::mock_only()),
        config: fixture_config(),
    }
}

fn now() -> Timestamp {
    Timestamp::from_unix_millis(1_700_000_000_000)
}

// ============================================================================
// SECTION: Full Round
// ============================================================================

#[test]
fn a_round_simulates_persists_and_publishes() {
    let orchestrator = fixture_orchestrator();
    let mut round_done = orchestrator.bus.subscribe("round.completed");

    let output = orchestrator.run_round(now()).unwrap();
    assert_eq!(output.round, 1);
    assert!(!output.governance_only);
    assert_eq!(output.results.len(), 2, "four teams play two games per round");

    // Instant mode persists results already visible.
    let stored = orchestrator.repo.results_for_round(&output.season_id, 1).unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|result| result.presented));

    let season = orchestrator.repo.latest_season().unwrap().unwrap();
    assert_eq!(season.completed_rounds, 1);

    let published = round_done.try_recv().expect("round.completed should publish");
    assert_eq!(published.event_type, "round.completed");
}

#[test]
fn rounds_are_reproducible_from_their_stored_seeds() {
    let orchestrator = fixture_orchestrator();
    let output = orchestrator.run_round(now()).unwrap();
    let stored = orchestrator.repo.results_for_round(&output.season_id, 1).unwrap();
    for result in &stored {
        assert!(result.rng_draws > 0);
        assert_eq!(result.ruleset_snapshot, courtside_core::RuleSet::default());
    }
}

#[test]
fn reports_and_usage_are_stored_in_phase_c() {
    let orchestrator = fixture_orchestrator();
    orchestrator.run_round(now()).unwrap();
    // Usage was drained into the log by phase C; a second drain is empty.
    assert!(orchestrator.gateway.drain_usage().is_empty());
}

// ============================================================================
// SECTION: Governance-Only Mode
// ============================================================================

#[test]
fn complete_seasons_still_tally_pending_governance() {
    let orchestrator = fixture_orchestrator();
    let mut season = orchestrator.repo.latest_season().unwrap().unwrap();

    // Submit a proposal while tokens exist, then force the season COMPLETE.
    let roster = GovernorRoster::new(
        orchestrator.repo.roster_for_season(&season.id).unwrap(),
    );
    let mut repo = orchestrator.repo.clone();
    let gateway = courtside_ai::MockProvider;
    let mut kernel = GovernanceKernel::new(&mut repo, &gateway, &roster, None);
    kernel.regenerate_tokens(&season, 1, now()).unwrap();
    let (outcome, _) = kernel
        .submit_proposal(
            &season,
            1,
            now(),
            &GovernorId::from("gov-1"),
            "set three_point_value to 5",
        )
        .unwrap();
    assert_eq!(outcome, courtside_governance::ActionOutcome::Ok);
    drop(kernel);

    season.phase = SeasonPhase::Complete;
    orchestrator.repo.upsert_season(&season).unwrap();

    let output = orchestrator.run_round(now()).unwrap();
    assert!(output.governance_only);
    assert!(output.results.is_empty(), "no games simulate for a COMPLETE season");
    assert_eq!(output.tally.examined, 1);
    assert_eq!(output.tally.deferred, 1, "first tally attempt defers");

    // The season's rule set stays frozen.
    let unchanged = orchestrator.repo.latest_season().unwrap().unwrap();
    assert_eq!(unchanged.current_rules, season.current_rules);
}

// ============================================================================
// SECTION: Presenter Recovery
// ============================================================================

#[test]
fn recovery_marks_interrupted_games_presented_without_resuming() {
    let mut config = fixture_config();
    config.presentation_mode = PresentationMode::Replay;
    let repo = Repository::in_memory().unwrap();
    seed_league(&repo, &fixture_seed()).unwrap();
    let orchestrator = Arc::new(Orchestrator {
        repo,
        bus: Arc::new(EventBus::default()),
        gateway: Arc::new(AiGateway::mock_only()),
        config,
    });

    // Replay mode persists games hidden; simulate a crash before the
    // presenter finished by never running it.
    let output = orchestrator.run_round(now()).unwrap();
    let hidden = orchestrator.repo.unpresented_latest_round(&output.season_id).unwrap();
    assert_eq!(hidden.len(), 2);

    let presentation = Arc::new(PresentationState::default());
    let scheduler = Scheduler::new(Arc::clone(&orchestrator), Arc::clone(&presentation));
    scheduler.recover().unwrap();

    let after = orchestrator.repo.unpresented_latest_round(&output.season_id).unwrap();
    assert!(after.is_empty(), "recovery makes every interrupted game visible");
    assert!(!presentation.is_active());
}

// ============================================================================
// SECTION: Event Bus
// ============================================================================

#[test]
fn wildcard_subscribers_see_typed_events() {
    let bus = EventBus::default();
    let mut wildcard = bus.subscribe(courtside_runtime::WILDCARD);
    let mut typed = bus.subscribe("game.completed");
    bus.publish("game.completed", serde_json::json!({ "round": 1 }));

    assert_eq!(typed.try_recv().unwrap().event_type, "game.completed");
    assert_eq!(wildcard.try_recv().unwrap().event_type, "game.completed");
}

#[test]
fn overflow_drops_the_oldest_events() {
    let bus = EventBus::new(2);
    let mut subscriber = bus.subscribe("tick");
    for index in 0..5 {
        bus.publish("tick", serde_json::json!({ "index": index }));
    }
    // The two newest survive; the receiver first observes the lag.
    let mut seen = Vec::new();
    loop {
        match subscriber.try_recv() {
            Ok(event) => seen.push(event.payload["index"].as_i64().unwrap()),
            Err(tokio::sync::broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    assert_eq!(seen, vec![3, 4]);
}

// ============================================================================
// SECTION: Token Regeneration Cadence
// ============================================================================

#[test]
fn tokens_regenerate_each_window_boundary() {
    let orchestrator = fixture_orchestrator();
    let output = orchestrator.run_round(now()).unwrap();
    let events = orchestrator.repo.events_for_season(&output.season_id).unwrap();
    let regens = events
        .iter()
        .filter(|event| event.event_type == "token.regenerated")
        .count();
    // Four governors, three token kinds, interval of one round.
    assert_eq!(regens, 12);
}
