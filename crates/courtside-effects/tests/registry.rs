// crates/courtside-effects/tests/registry.rs
// ============================================================================
// Module: Effect Registry Tests
// Description: Tests for activation replay, firing order, and mutations.
// ============================================================================
//! ## Overview
//! Validates wildcard hook matching, replay-based activation windows, the
//! mutate-event accumulation pipeline, priority suppression, and meta
//! mutations.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    reason = "Test-only panic-based assertions are permitted."
)]

use std::collections::BTreeMap;

use courtside_core::Action;
use courtside_core::ArgValue;
use courtside_core::EffectDuration;
use courtside_core::EffectId;
use courtside_core::EffectKind;
use courtside_core::EffectRecord;
use courtside_core::EffectSpec;
use courtside_core::EventKind;
use courtside_core::GovernanceEvent;
use courtside_core::MetaEntityKind;
use courtside_core::ProposalId;
use courtside_core::SeasonId;
use courtside_core::StateOp;
use courtside_core::TargetSelector;
use courtside_core::Timestamp;
use courtside_effects::EffectRegistry;
use courtside_effects::MetaScope;
use courtside_effects::MetaStore;
use courtside_effects::hooks;
use courtside_effects::pattern_matches;
use sieve_logic::Condition;
use sieve_logic::ContextResolver;
use sieve_logic::RandomSource;
use sieve_logic::Scalar;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Empty inner resolver; tests resolve through event fields only.
struct NoState;

impl ContextResolver for NoState {
    fn resolve(&self, _path: &str) -> Option<Scalar> {
        None
    }
}

/// Fixed random source.
struct Fixed(f64);

impl RandomSource for Fixed {
    fn next_unit(&mut self) -> f64 {
        self.0
    }
}

fn scope() -> MetaScope {
    MetaScope {
        season_id: SeasonId::from("season-1"),
        player_id: Some("player-1".to_string()),
        team_id: Some("team-1".to_string()),
    }
}

fn record(id: &str, priority: i64, hook: &str, actions: Vec<Action>) -> EffectRecord {
    EffectRecord {
        id: EffectId::from(id),
        source_proposal_id: ProposalId::from("prop-1"),
        spec: EffectSpec {
            kind: EffectKind::HookCallback,
            name: format!("effect {id}"),
            hook_points: vec![hook.to_string()],
            condition: None,
            actions,
            scope: TargetSelector::League,
            duration: EffectDuration::Permanent,
            priority,
            parameter: None,
            value: None,
        },
        activation_round: 1,
        expiration_round: None,
    }
}

// ============================================================================
// SECTION: Hook Matching
// ============================================================================

#[test]
fn wildcard_patterns_match_at_any_depth() {
    assert!(pattern_matches("sim.possession.pre", "sim.possession.pre"));
    assert!(pattern_matches("sim.possession.*", "sim.possession.pre"));
    assert!(pattern_matches("sim.*", "sim.shot.resolved"));
    assert!(pattern_matches("*", "gov.post"));
    assert!(!pattern_matches("sim.possession.pre", "sim.possession.post"));
    assert!(!pattern_matches("gov.*", "sim.game.pre"));
    assert!(!pattern_matches("sim.possession.pre.extra", "sim.possession.pre"));
}

// ============================================================================
// SECTION: Activation Replay
// ============================================================================

fn registration_event(effect: EffectRecord) -> GovernanceEvent {
    GovernanceEvent::build(
        &EventKind::EffectRegistered { effect },
        SeasonId::from("season-1"),
        1,
        None,
        None,
        Timestamp::from_unix_millis(0),
    )
    .unwrap()
}

#[test]
fn load_active_honors_activation_and_expiration_windows() {
    let mut active = record("effect-a", 0, hooks::SIM_POSSESSION_PRE, vec![]);
    active.activation_round = 2;
    let mut expiring = record("effect-b", 0, hooks::SIM_POSSESSION_PRE, vec![]);
    expiring.activation_round = 1;
    expiring.expiration_round = Some(3);
    let events = vec![registration_event(active), registration_event(expiring)];

    let at_round_1 = EffectRegistry::load_active(&events, 1).unwrap();
    assert_eq!(at_round_1.records().len(), 1);
    let at_round_2 = EffectRegistry::load_active(&events, 2).unwrap();
    assert_eq!(at_round_2.records().len(), 2);
    let at_round_3 = EffectRegistry::load_active(&events, 3).unwrap();
    assert_eq!(at_round_3.records().len(), 1);
}

#[test]
fn expiry_event_overrides_open_ended_duration() {
    let effect = record("effect-a", 0, hooks::SIM_POSSESSION_PRE, vec![]);
    let expire = GovernanceEvent::build(
        &EventKind::EffectExpired { effect_id: EffectId::from("effect-a"), round: 2 },
        SeasonId::from("season-1"),
        2,
        None,
        None,
        Timestamp::from_unix_millis(0),
    )
    .unwrap();
    let events = vec![registration_event(effect), expire];
    let registry = EffectRegistry::load_active(&events, 5).unwrap();
    assert!(registry.records().is_empty());
}

// ============================================================================
// SECTION: Firing
// ============================================================================

#[test]
fn mutate_event_rewrites_fields_for_later_effects() {
    // The higher-priority effect writes the modifier; the lower-priority one
    // reads it back through an expression, proving accumulation order.
    let writer = record("effect-a", 10, hooks::SIM_POSSESSION_PRE, vec![Action::MutateEvent {
        field: "shot_probability_modifier".to_string(),
        value: ArgValue::Num(0.05),
    }]);
    let doubler = record("effect-b", 5, hooks::SIM_POSSESSION_PRE, vec![Action::MutateEvent {
        field: "shot_probability_modifier".to_string(),
        value: ArgValue::Expr("event.shot_probability_modifier * 2".to_string()),
    }]);
    let registry = EffectRegistry::from_records(vec![doubler, writer]).unwrap();
    let mut event = BTreeMap::new();
    event.insert("shot_probability_modifier".to_string(), Scalar::Num(0.0));
    let mut meta = MetaStore::default();
    registry
        .fire(
            hooks::SIM_POSSESSION_PRE,
            &mut event,
            &NoState,
            &mut meta,
            &scope(),
            &mut Fixed(0.5),
        )
        .unwrap();
    assert_eq!(
        event.get("shot_probability_modifier").and_then(Scalar::as_num),
        Some(0.1)
    );
}

#[test]
fn condition_gates_actions_with_game_rng() {
    let mut effect = record("effect-a", 0, hooks::SIM_POSSESSION_PRE, vec![Action::Narrative {
        text: "chaos stirs".to_string(),
    }]);
    effect.spec.condition = Some(Condition::Random(0.25));
    let registry = EffectRegistry::from_records(vec![effect]).unwrap();
    let mut meta = MetaStore::default();

    let mut event = BTreeMap::new();
    let hit = registry
        .fire(hooks::SIM_POSSESSION_PRE, &mut event, &NoState, &mut meta, &scope(), &mut Fixed(0.1))
        .unwrap();
    assert_eq!(hit.narratives, vec!["chaos stirs".to_string()]);

    let mut event = BTreeMap::new();
    let miss = registry
        .fire(hooks::SIM_POSSESSION_PRE, &mut event, &NoState, &mut meta, &scope(), &mut Fixed(0.9))
        .unwrap();
    assert!(miss.narratives.is_empty());
}

#[test]
fn block_default_suppresses_lower_priority_effects() {
    let blocker = record("effect-a", 10, hooks::SIM_POSSESSION_PRE, vec![Action::BlockDefault]);
    let silenced = record("effect-b", 1, hooks::SIM_POSSESSION_PRE, vec![Action::Narrative {
        text: "never heard".to_string(),
    }]);
    let registry = EffectRegistry::from_records(vec![silenced, blocker]).unwrap();
    let mut event = BTreeMap::new();
    let mut meta = MetaStore::default();
    let outcome = registry
        .fire(hooks::SIM_POSSESSION_PRE, &mut event, &NoState, &mut meta, &scope(), &mut Fixed(0.5))
        .unwrap();
    assert!(outcome.narratives.is_empty());
}

#[test]
fn block_event_cancels_propagation() {
    let canceller = record("effect-a", 10, hooks::SIM_POSSESSION_PRE, vec![Action::BlockEvent]);
    let registry = EffectRegistry::from_records(vec![canceller]).unwrap();
    let mut event = BTreeMap::new();
    let mut meta = MetaStore::default();
    let outcome = registry
        .fire(hooks::SIM_POSSESSION_PRE, &mut event, &NoState, &mut meta, &scope(), &mut Fixed(0.5))
        .unwrap();
    assert!(outcome.block_event);
}

#[test]
fn meta_mutations_apply_through_scoped_buckets() {
    let effect = record("effect-a", 0, hooks::SIM_POSSESSION_POST, vec![Action::MutateState {
        target: TargetSelector::BallHandler,
        field: "meta.hot_streak".to_string(),
        op: StateOp::Add,
        value: ArgValue::Num(1.0),
    }]);
    let registry = EffectRegistry::from_records(vec![effect]).unwrap();
    let mut meta = MetaStore::default();
    let mut event = BTreeMap::new();
    registry
        .fire(
            hooks::SIM_POSSESSION_POST,
            &mut event,
            &NoState,
            &mut meta,
            &scope(),
            &mut Fixed(0.5),
        )
        .unwrap();
    let value = meta.get_scoped(
        MetaEntityKind::Player,
        "player-1",
        &SeasonId::from("season-1"),
        "hot_streak",
    );
    assert_eq!(value, Some(Scalar::Num(1.0)));
    assert!(!meta.is_clean());
}

#[test]
fn ties_break_by_effect_id_for_stable_order() {
    let first = record("effect-a", 5, hooks::SIM_POSSESSION_PRE, vec![Action::Narrative {
        text: "first".to_string(),
    }]);
    let second = record("effect-b", 5, hooks::SIM_POSSESSION_PRE, vec![Action::Narrative {
        text: "second".to_string(),
    }]);
    let registry = EffectRegistry::from_records(vec![second, first]).unwrap();
    let mut event = BTreeMap::new();
    let mut meta = MetaStore::default();
    let outcome = registry
        .fire(hooks::SIM_POSSESSION_PRE, &mut event, &NoState, &mut meta, &scope(), &mut Fixed(0.5))
        .unwrap();
    assert_eq!(outcome.narratives, vec!["first".to_string(), "second".to_string()]);
}

// ============================================================================
// SECTION: Registration From Proposals
// ============================================================================

#[test]
fn parameter_changes_are_not_registered_as_hook_effects() {
    let interpretation = courtside_core::Interpretation {
        summary: "threes worth five".to_string(),
        effects: vec![
            EffectSpec {
                kind: EffectKind::ParameterChange,
                name: "three_point_value change".to_string(),
                hook_points: Vec::new(),
                condition: None,
                actions: Vec::new(),
                scope: TargetSelector::League,
                duration: EffectDuration::Permanent,
                priority: 0,
                parameter: Some("three_point_value".to_string()),
                value: Some(courtside_core::RuleValue::Int(5)),
            },
            EffectSpec {
                kind: EffectKind::HookCallback,
                name: "hot hand".to_string(),
                hook_points: vec![hooks::SIM_POSSESSION_PRE.to_string()],
                condition: None,
                actions: Vec::new(),
                scope: TargetSelector::League,
                duration: EffectDuration::Rounds { count: 3 },
                priority: 0,
                parameter: None,
                value: None,
            },
        ],
        confidence: 0.9,
        injection_flagged: false,
    };
    let records = EffectRegistry::records_from_interpretation(
        &interpretation,
        &ProposalId::from("prop-1"),
        4,
    );
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].activation_round, 4);
    assert_eq!(records[0].expiration_round, Some(7));
}
