// crates/courtside-engine/src/engine.rs
// ============================================================================
// Module: Simulation Engine
// Description: The pure game simulation entry point and quarter loop.
// Purpose: `(teams, rules, effects, seed) -> GameResult` with no I/O.
// Dependencies: crate::{error, possession, rng, state}, courtside-core,
// courtside-effects
// ============================================================================

//! ## Overview
//! `simulate_game` is a pure total function: the same inputs produce
//! byte-identical outputs, including play-by-play, box scores, and the final
//! RNG position. It performs no I/O, reads no clock, and touches no globals.
//! The meta store is an explicit in/out parameter so cross-possession effect
//! state stays part of the function contract.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use courtside_core::BoxScoreLine;
use courtside_core::ElamMeta;
use courtside_core::GameId;
use courtside_core::GameResult;
use courtside_core::RuleSet;
use courtside_core::SeasonId;
use courtside_core::Team;
use courtside_core::TeamStrategy;
use courtside_effects::EffectRegistry;
use courtside_effects::MetaStore;
use courtside_effects::hooks;

use crate::error::SimError;
use crate::possession::run_possession;
use crate::rng::GameRng;
use crate::state::GameState;
use crate::state::Side;
use crate::state::TeamSide;

// ============================================================================
// SECTION: Inputs
// ============================================================================

/// Everything a game needs, owned or borrowed by the caller.
///
/// # Invariants
/// - The engine never reaches outside this structure: no repository, no
///   bus, no gateway, no clock.
#[derive(Debug)]
pub struct GameInputs<'a> {
    /// Game identifier assigned by the scheduler.
    pub game_id: GameId,
    /// Season scope.
    pub season_id: SeasonId,
    /// Round number.
    pub round: u32,
    /// Slot within the round.
    pub slot: u32,
    /// Home team record.
    pub home: &'a Team,
    /// Away team record.
    pub away: &'a Team,
    /// Home strategy.
    pub home_strategy: TeamStrategy,
    /// Away strategy.
    pub away_strategy: TeamStrategy,
    /// Rule set in force.
    pub rules: &'a RuleSet,
    /// Game seed.
    pub seed: u64,
    /// Active effect registry.
    pub registry: &'a EffectRegistry,
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Simulates one game deterministically.
///
/// # Errors
///
/// Returns [`SimError`] on invalid rules, malformed effects, or a broken
/// invariant. There are no recoverable errors.
pub fn simulate_game(
    inputs: &GameInputs<'_>,
    meta: &mut MetaStore,
) -> Result<GameResult, SimError> {
    inputs.rules.validate()?;
    let rules = inputs.rules;
    let mut rng = GameRng::new(inputs.seed);

    let mut state = GameState {
        home: TeamSide::new(inputs.home.clone(), inputs.home_strategy.clone()),
        away: TeamSide::new(inputs.away.clone(), inputs.away_strategy.clone()),
        quarter: 0,
        possession: 0,
        clock_seconds: 0,
        elam_active: false,
        elam_target: None,
        last_action: None,
        last_result: None,
        consecutive_makes: 0,
        consecutive_misses: 0,
        lead_changes: 0,
        last_leader: 0,
        log: Vec::new(),
        quarter_scores: Vec::new(),
    };
    apply_home_court(&mut state);

    let mut narration_buffer = Vec::new();
    let mut game_event = BTreeMap::new();
    fire_plain_hook(
        &mut state,
        inputs,
        &mut rng,
        meta,
        hooks::SIM_GAME_PRE,
        &mut game_event,
        &mut narration_buffer,
    )?;

    let quarters = rules.quarters.max(1) as u32;
    let per_quarter_cap = (rules.quarter_possessions.max(1) as u32) * 2;
    let safety_cap = rules.safety_cap_possessions.max(1) as u32;
    let mut offense = Side::Home;
    let mut elam = None;
    let mut safety_capped = false;

    'game: for quarter in 1..=quarters {
        state.quarter = quarter;
        state.clock_seconds = (rules.quarter_minutes.max(1) as u32) * 60;
        let quarter_start = (state.home.score, state.away.score);

        // Elam activation replaces the clock for the final period.
        if rules.elam_enabled
            && !state.elam_active
            && i64::from(quarter) == rules.elam_trigger_quarter + 1
        {
            let leader = state.home.score.max(state.away.score);
            let target = leader + rules.elam_margin.max(1) as u32;
            state.elam_active = true;
            state.elam_target = Some(target);
            state.clock_seconds = 0;
            elam = Some(ElamMeta {
                target,
                leader_score_at_activation: leader,
                activated_at_possession: state.possession,
            });
        }

        let mut quarter_event = BTreeMap::new();
        fire_plain_hook(
            &mut state,
            inputs,
            &mut rng,
            meta,
            hooks::SIM_QUARTER_PRE,
            &mut quarter_event,
            &mut narration_buffer,
        )?;

        let mut quarter_possessions = 0_u32;
        loop {
            if state.possession >= safety_cap {
                safety_capped = true;
                break 'game;
            }
            if state.elam_active {
                let target = state.elam_target.unwrap_or(u32::MAX);
                if state.home.score >= target || state.away.score >= target {
                    break;
                }
            } else if state.clock_seconds == 0 || quarter_possessions >= per_quarter_cap {
                break;
            }

            let tick = run_possession(
                &mut state,
                offense,
                rules,
                inputs.registry,
                meta,
                &inputs.season_id,
                &mut rng,
            )?;
            quarter_possessions += 1;
            if !state.elam_active {
                state.clock_seconds = state.clock_seconds.saturating_sub(tick.seconds_used);
            }
            if !tick.retained {
                offense = offense.other();
            }
            enforce_on_court_invariant(&state)?;
        }

        let mut quarter_post = BTreeMap::new();
        fire_plain_hook(
            &mut state,
            inputs,
            &mut rng,
            meta,
            hooks::SIM_QUARTER_POST,
            &mut quarter_post,
            &mut narration_buffer,
        )?;

        state
            .quarter_scores
            .push((state.home.score - quarter_start.0, state.away.score - quarter_start.1));

        if state.elam_active {
            let target = state.elam_target.unwrap_or(u32::MAX);
            if state.home.score >= target || state.away.score >= target {
                break 'game;
            }
        }

        // Quarter-break recovery, halftime reset, and substitutions.
        if quarter < quarters {
            let halftime = quarter == quarters / 2;
            let recovery = if halftime {
                rules.halftime_stamina_recovery
            } else {
                rules.quarter_break_recovery
            };
            for side in [Side::Home, Side::Away] {
                let side_state = state.side_mut(side);
                for player in &mut side_state.players {
                    if !player.ejected {
                        player.current_stamina = (player.current_stamina + recovery).min(1.0);
                    }
                }
                if halftime {
                    side_state.team_fouls = 0;
                }
            }
            apply_quarter_break_substitutions(&mut state, rules);
        }
    }

    // Record a partial final quarter when the safety cap tripped mid-quarter.
    if state.quarter_scores.len() < state.quarter as usize {
        let counted: (u32, u32) = state
            .quarter_scores
            .iter()
            .fold((0, 0), |acc, (home, away)| (acc.0 + home, acc.1 + away));
        state
            .quarter_scores
            .push((state.home.score - counted.0, state.away.score - counted.1));
    }

    Ok(finalize(inputs, state, elam, safety_capped, rng))
}

// ============================================================================
// SECTION: Setup Helpers
// ============================================================================

/// Applies the home-court attribute nudge.
fn apply_home_court(state: &mut GameState) {
    for player in &mut state.home.players {
        let scoring = player.current_attributes.scoring;
        player.current_attributes.scoring = scoring.saturating_add(1).min(100);
    }
}

/// Fires a hook with no possession scope (game and quarter boundaries).
fn fire_plain_hook(
    state: &mut GameState,
    inputs: &GameInputs<'_>,
    rng: &mut GameRng,
    meta: &mut MetaStore,
    hook: &str,
    event: &mut BTreeMap<String, sieve_logic::Scalar>,
    narration_buffer: &mut Vec<String>,
) -> Result<(), SimError> {
    // Boundary hooks reuse the possession firing path with the first
    // on-court pair as the implicit subject.
    let handler_index = state.home.on_court().first().copied().unwrap_or(0);
    let defender_index = state.away.on_court().first().copied().unwrap_or(0);
    crate::possession::fire_boundary_hook(
        state,
        Side::Home,
        handler_index,
        defender_index,
        inputs.registry,
        meta,
        &inputs.season_id,
        rng,
        inputs.rules,
        hook,
        event,
        narration_buffer,
    )?;
    Ok(())
}

// ============================================================================
// SECTION: Substitutions
// ============================================================================

/// Swaps tired on-court players for fresher bench players at breaks.
fn apply_quarter_break_substitutions(state: &mut GameState, rules: &RuleSet) {
    let threshold = rules.substitution_stamina_threshold;
    for side in [Side::Home, Side::Away] {
        let side_state = state.side_mut(side);
        loop {
            let Some(tired_index) = side_state
                .on_court()
                .into_iter()
                .filter(|&index| side_state.players[index].current_stamina < threshold)
                .min_by(|&a, &b| {
                    side_state.players[a]
                        .current_stamina
                        .partial_cmp(&side_state.players[b].current_stamina)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
            else {
                break;
            };
            let Some(bench_index) = side_state.best_bench() else { break };
            if side_state.players[bench_index].current_stamina
                <= side_state.players[tired_index].current_stamina
            {
                break;
            }
            side_state.players[tired_index].on_court = false;
            side_state.players[bench_index].on_court = true;
        }
    }
}

/// Verifies the on-court count invariant after every possession.
fn enforce_on_court_invariant(state: &GameState) -> Result<(), SimError> {
    for side_state in [&state.home, &state.away] {
        let on_court = side_state.on_court().len();
        if on_court > courtside_core::ON_COURT_COUNT {
            return Err(SimError::Invariant(format!(
                "team {} has {on_court} players on court",
                side_state.team.id
            )));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Finalization
// ============================================================================

/// Builds the durable game result from final state.
fn finalize(
    inputs: &GameInputs<'_>,
    state: GameState,
    elam: Option<ElamMeta>,
    safety_capped: bool,
    rng: GameRng,
) -> GameResult {
    let box_scores = state
        .home
        .players
        .iter()
        .map(|player| (player, state.home.team.id.clone()))
        .chain(state.away.players.iter().map(|player| (player, state.away.team.id.clone())))
        .map(|(player, team_id)| BoxScoreLine {
            player_id: player.player.id.clone(),
            team_id,
            points: player.points,
            field_goals_made: player.field_goals_made,
            field_goals_attempted: player.field_goals_attempted,
            threes_made: player.threes_made,
            threes_attempted: player.threes_attempted,
            free_throws_made: player.free_throws_made,
            free_throws_attempted: player.free_throws_attempted,
            rebounds: player.rebounds,
            steals: player.steals,
            turnovers: player.turnovers,
            fouls: player.fouls,
            possessions_played: player.possessions_played,
            plus_minus: player.plus_minus,
        })
        .collect();

    GameResult {
        id: inputs.game_id.clone(),
        season_id: inputs.season_id.clone(),
        round: inputs.round,
        slot: inputs.slot,
        home_team_id: state.home.team.id.clone(),
        away_team_id: state.away.team.id.clone(),
        home_score: state.home.score,
        away_score: state.away.score,
        seed: inputs.seed,
        rng_draws: rng.draws(),
        quarter_scores: state.quarter_scores,
        play_by_play: state.log,
        box_scores,
        elam,
        safety_capped,
        total_possessions: state.possession,
        lead_changes: state.lead_changes,
        ruleset_snapshot: inputs.rules.clone(),
        presented: false,
    }
}
