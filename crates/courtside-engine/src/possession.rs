// crates/courtside-engine/src/possession.rs
// ============================================================================
// Module: Possession Resolution
// Description: The ordered twelve-step possession pipeline.
// Purpose: Resolve one possession with hooks fired at each step.
// Dependencies: crate::{error, narrate, rng, state}, courtside-core,
// courtside-effects, sieve-logic
// ============================================================================

//! ## Overview
//! A possession resolves through a fixed pipeline: context installation,
//! defense scheme selection, matchup assignment, action selection, turnover
//! check, shot resolution, score crediting, foul check, rebound, move
//! triggers, stamina drain, and cross-possession bookkeeping. Every
//! probabilistic decision draws from the single game RNG in this order, which
//! is what makes replay bit-stable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use courtside_core::ActionType;
use courtside_core::Archetype;
use courtside_core::MoveEffect;
use courtside_core::PlayLogEntry;
use courtside_core::PossessionOutcome;
use courtside_core::RuleSet;
use courtside_core::SeasonId;
use courtside_core::StateOp;
use courtside_core::TargetSelector;
use courtside_effects::EffectRegistry;
use courtside_effects::FireOutcome;
use courtside_effects::MetaScope;
use courtside_effects::MetaStore;
use courtside_effects::hooks;
use sieve_logic::Scalar;

use crate::error::SimError;
use crate::narrate::narrate;
use crate::rng::GameRng;
use crate::state::GameState;
use crate::state::Side;
use crate::state::SimResolver;

// ============================================================================
// SECTION: Defense Schemes
// ============================================================================

/// Defensive scheme selected per possession.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefenseScheme {
    /// Tight man-to-man.
    ManTight,
    /// Switching man.
    ManSwitch,
    /// Zone.
    Zone,
    /// Full-court press.
    Press,
}

impl DefenseScheme {
    /// Contest strength multiplier applied to shot suppression.
    const fn contest_strength(self) -> f64 {
        match self {
            Self::ManTight => 1.0,
            Self::ManSwitch => 0.8,
            Self::Press => 0.7,
            Self::Zone => 0.6,
        }
    }

    /// Additive foul probability.
    const fn foul_modifier(self) -> f64 {
        match self {
            Self::ManTight => 0.02,
            Self::ManSwitch => 0.01,
            Self::Zone => 0.0,
            Self::Press => 0.03,
        }
    }

    /// Additive defender stamina cost per possession.
    const fn stamina_cost(self) -> f64 {
        match self {
            Self::ManTight => 0.005,
            Self::ManSwitch => 0.003,
            Self::Zone => 0.002,
            Self::Press => 0.008,
        }
    }

    /// Additive turnover probability forced on the offense.
    const fn turnover_modifier(self) -> f64 {
        match self {
            Self::ManTight => 0.01,
            Self::ManSwitch => 0.02,
            Self::Zone => -0.01,
            Self::Press => 0.05,
        }
    }
}

// ============================================================================
// SECTION: Possession Context
// ============================================================================

/// Hook-installable modifiers for one possession.
///
/// The engine seeds these as `sim.possession.pre` event fields; effects
/// rewrite them with `mutate_event` and the resolved values steer the rest
/// of the pipeline.
#[derive(Debug, Clone, Copy)]
struct PossessionContext {
    /// Additive shot probability.
    shot_probability_modifier: f64,
    /// Additive points on a made shot.
    shot_value_modifier: f64,
    /// Additional offense stamina drain.
    extra_stamina_drain: f64,
    /// Additive turnover probability.
    turnover_modifier: f64,
    /// Probability the ball handler is ejected outright.
    random_ejection_probability: f64,
    /// Bonus passes credited at `value_per_pass` points each.
    bonus_pass_count: f64,
    /// Multiplicative action biases.
    at_rim_bias: f64,
    /// Mid-range bias.
    mid_range_bias: f64,
    /// Three-point bias.
    three_point_bias: f64,
    /// Drive bias.
    drive_bias: f64,
    /// Post-up bias.
    post_up_bias: f64,
    /// Defensive intensity after governance and effect input.
    defensive_intensity: f64,
}

impl PossessionContext {
    /// Seeds the pre-hook event map with default knob values.
    fn seed_event(defensive_intensity: f64) -> BTreeMap<String, Scalar> {
        let mut event = BTreeMap::new();
        event.insert("shot_probability_modifier".to_string(), Scalar::Num(0.0));
        event.insert("shot_value_modifier".to_string(), Scalar::Num(0.0));
        event.insert("extra_stamina_drain".to_string(), Scalar::Num(0.0));
        event.insert("turnover_modifier".to_string(), Scalar::Num(0.0));
        event.insert("random_ejection_probability".to_string(), Scalar::Num(0.0));
        event.insert("bonus_pass_count".to_string(), Scalar::Num(0.0));
        event.insert("at_rim_bias".to_string(), Scalar::Num(1.0));
        event.insert("mid_range_bias".to_string(), Scalar::Num(1.0));
        event.insert("three_point_bias".to_string(), Scalar::Num(1.0));
        event.insert("drive_bias".to_string(), Scalar::Num(1.0));
        event.insert("post_up_bias".to_string(), Scalar::Num(1.0));
        event.insert("defensive_intensity".to_string(), Scalar::Num(defensive_intensity));
        event
    }

    /// Reads the possibly rewritten knobs back out of the event map.
    fn from_event(event: &BTreeMap<String, Scalar>) -> Self {
        let read = |field: &str, fallback: f64| {
            event.get(field).and_then(Scalar::as_num).unwrap_or(fallback)
        };
        Self {
            shot_probability_modifier: read("shot_probability_modifier", 0.0),
            shot_value_modifier: read("shot_value_modifier", 0.0),
            extra_stamina_drain: read("extra_stamina_drain", 0.0),
            turnover_modifier: read("turnover_modifier", 0.0),
            random_ejection_probability: read("random_ejection_probability", 0.0),
            bonus_pass_count: read("bonus_pass_count", 0.0),
            at_rim_bias: read("at_rim_bias", 1.0),
            mid_range_bias: read("mid_range_bias", 1.0),
            three_point_bias: read("three_point_bias", 1.0),
            drive_bias: read("drive_bias", 1.0),
            post_up_bias: read("post_up_bias", 1.0),
            defensive_intensity: read("defensive_intensity", 0.0),
        }
    }
}

// ============================================================================
// SECTION: Possession Result
// ============================================================================

/// Outcome of one resolved possession for the game loop.
#[derive(Debug, Clone, Copy)]
pub struct PossessionTick {
    /// Whether the offense retained the ball (offensive rebound).
    pub retained: bool,
    /// Clock seconds the possession consumed.
    pub seconds_used: u32,
}

// ============================================================================
// SECTION: Hook Firing
// ============================================================================

/// Fires a hook and applies score and state mutations to the game.
///
/// Narratives accumulate into `narration_buffer`; sub-events append as
/// bracketed narration lines so they surface in the play log.
#[allow(clippy::too_many_arguments, reason = "Internal pipeline helper with one call shape.")]
fn fire_hook(
    state: &mut GameState,
    offense: Side,
    handler_index: usize,
    defender_index: usize,
    registry: &EffectRegistry,
    meta: &mut MetaStore,
    season_id: &SeasonId,
    rng: &mut GameRng,
    rules: &RuleSet,
    hook: &str,
    event: &mut BTreeMap<String, Scalar>,
    narration_buffer: &mut Vec<String>,
) -> Result<FireOutcome, SimError> {
    let scope = MetaScope {
        season_id: season_id.clone(),
        player_id: state
            .side(offense)
            .players
            .get(handler_index)
            .map(|player| player.player.id.to_string()),
        team_id: Some(state.side(offense).team.id.to_string()),
    };
    let outcome = {
        let resolver = SimResolver { state, offense, handler_index, defender_index };
        registry.fire(hook, event, &resolver, meta, &scope, rng)?
    };
    for mutation in &outcome.state_mutations {
        apply_state_mutation(state, offense, handler_index, defender_index, rules, mutation);
    }
    for (target, points) in &outcome.scores {
        let side = resolve_team_side(state, offense, target);
        if let Some(side) = side {
            let points = points.max(0.0).round() as u32;
            state.credit(side, points);
        }
    }
    for line in &outcome.narratives {
        narration_buffer.push(line.clone());
    }
    for (name, count) in &outcome.sub_events {
        narration_buffer.push(format!("[{name} x{count}]"));
    }
    Ok(outcome)
}

/// Resolves a team-valued target selector to a side.
fn resolve_team_side(state: &GameState, offense: Side, target: &TargetSelector) -> Option<Side> {
    match target {
        TargetSelector::OffenseTeam | TargetSelector::League | TargetSelector::BallHandler => {
            Some(offense)
        }
        TargetSelector::DefenseTeam | TargetSelector::Defender => Some(offense.other()),
        TargetSelector::Team { team_id } => state.side_of_team(team_id),
        TargetSelector::Player { player_id } => {
            let home = state
                .home
                .players
                .iter()
                .any(|player| &player.player.id == player_id);
            if home {
                Some(Side::Home)
            } else {
                Some(Side::Away)
            }
        }
    }
}

/// Applies one effect-issued state mutation to game structures.
fn apply_state_mutation(
    state: &mut GameState,
    offense: Side,
    handler_index: usize,
    defender_index: usize,
    rules: &RuleSet,
    mutation: &courtside_effects::StateMutation,
) {
    let value = match &mutation.value {
        Scalar::Num(number) => *number,
        Scalar::Bool(flag) => f64::from(*flag),
        Scalar::Str(_) => return,
    };
    let (side, player_index) = match &mutation.target {
        TargetSelector::BallHandler => (offense, Some(handler_index)),
        TargetSelector::Defender => (offense.other(), Some(defender_index)),
        TargetSelector::OffenseTeam | TargetSelector::League => (offense, None),
        TargetSelector::DefenseTeam => (offense.other(), None),
        TargetSelector::Team { team_id } => match state.side_of_team(team_id) {
            Some(side) => (side, None),
            None => return,
        },
        TargetSelector::Player { player_id } => {
            let locate = |players: &[crate::state::PlayerState]| {
                players.iter().position(|player| &player.player.id == player_id)
            };
            if let Some(index) = locate(&state.home.players) {
                (Side::Home, Some(index))
            } else if let Some(index) = locate(&state.away.players) {
                (Side::Away, Some(index))
            } else {
                return;
            }
        }
    };
    let floor = rules.stamina_floor;
    let side_state = state.side_mut(side);
    if let Some(index) = player_index {
        let Some(player) = side_state.players.get_mut(index) else { return };
        match mutation.field.as_str() {
            "current_stamina" => {
                let current = player.current_stamina;
                player.current_stamina = combine(current, value, mutation.op).clamp(floor, 1.0);
            }
            "fouls" => {
                let current = f64::from(player.fouls);
                player.fouls = combine(current, value, mutation.op).max(0.0) as u32;
            }
            "pending_shot_bonus" => {
                let current = player.pending_shot_bonus;
                player.pending_shot_bonus = combine(current, value, mutation.op);
            }
            field => {
                if let Some(current) = player.current_attributes.get(field) {
                    let next = combine(f64::from(current), value, mutation.op).clamp(1.0, 100.0);
                    set_attribute(&mut player.current_attributes, field, next as u8);
                }
            }
        }
    } else if mutation.field.as_str() == "team_fouls" {
        let current = f64::from(side_state.team_fouls);
        side_state.team_fouls = combine(current, value, mutation.op).max(0.0) as u32;
    }
}

/// Applies a state operator to a current value.
fn combine(current: f64, operand: f64, op: StateOp) -> f64 {
    match op {
        StateOp::Set => operand,
        StateOp::Add => current + operand,
        StateOp::Subtract => current - operand,
    }
}

/// Writes an attribute by name.
fn set_attribute(attributes: &mut courtside_core::AttributeVector, field: &str, value: u8) {
    match field {
        "scoring" => attributes.scoring = value,
        "passing" => attributes.passing = value,
        "defense" => attributes.defense = value,
        "speed" => attributes.speed = value,
        "stamina" => attributes.stamina = value,
        "iq" => attributes.iq = value,
        "ego" => attributes.ego = value,
        "chaotic_alignment" => attributes.chaotic_alignment = value,
        "fate" => attributes.fate = value,
        _ => {}
    }
}

// ============================================================================
// SECTION: Pipeline Steps
// ============================================================================

/// Selects the ball handler among on-court offense players.
fn select_ball_handler(state: &GameState, offense: Side, rng: &mut GameRng) -> Option<usize> {
    let side = state.side(offense);
    let on_court = side.on_court();
    if on_court.is_empty() {
        return None;
    }
    let weights: Vec<f64> = on_court
        .iter()
        .map(|&index| {
            let player = &side.players[index];
            (f64::from(player.current_attributes.ego) * 0.6
                + f64::from(player.current_attributes.scoring) * 0.4)
                .max(1.0)
        })
        .collect();
    Some(on_court[rng.pick_weighted(&weights)])
}

/// Selects the defensive scheme by defender aggregates and intensity.
fn select_scheme(
    state: &GameState,
    offense: Side,
    defensive_intensity: f64,
    rng: &mut GameRng,
) -> DefenseScheme {
    let defense = state.side(offense.other());
    let speed = defense.on_court_mean(|player| f64::from(player.current_attributes.speed));
    let three_tendency = state.side(offense).strategy.three_point_bias;
    let weights = [
        (3.0 + defensive_intensity * 2.0).max(1.0),
        (2.0 + speed / 50.0).max(1.0),
        (2.0 + (2.0 - three_tendency)).max(1.0),
        (1.0 + defensive_intensity * 1.5 + speed / 100.0).max(1.0),
    ];
    match rng.pick_weighted(&weights) {
        0 => DefenseScheme::ManTight,
        1 => DefenseScheme::ManSwitch,
        2 => DefenseScheme::Zone,
        _ => DefenseScheme::Press,
    }
}

/// Assigns the primary defender by minimizing a perturbed cost.
fn assign_defender(
    state: &GameState,
    offense: Side,
    handler_index: usize,
    rng: &mut GameRng,
) -> usize {
    let handler_scoring = f64::from(
        state.side(offense).players[handler_index].current_attributes.scoring,
    );
    let defense = state.side(offense.other());
    let mut best = 0;
    let mut best_cost = f64::INFINITY;
    for index in defense.on_court() {
        let defender = &defense.players[index];
        let cost = (handler_scoring - f64::from(defender.current_attributes.defense)).abs()
            - defender.current_stamina * 5.0
            + rng.range(0.0, 8.0);
        if cost < best_cost {
            best_cost = cost;
            best = index;
        }
    }
    best
}

/// Selects the offensive action from archetype, strategy, and effect biases.
fn select_action(
    state: &GameState,
    offense: Side,
    handler_index: usize,
    ctx: &PossessionContext,
    rng: &mut GameRng,
) -> ActionType {
    let side = state.side(offense);
    let archetype = side.players[handler_index].player.archetype;
    let base = match archetype {
        Archetype::Slasher => [3.0, 1.5, 1.0, 3.0, 1.0],
        Archetype::Sniper => [1.0, 2.0, 4.0, 1.0, 1.0],
        Archetype::Anchor => [2.5, 1.5, 1.0, 1.0, 3.0],
        Archetype::Conductor => [1.5, 1.5, 1.5, 1.5, 1.5],
        Archetype::Journeyman => [1.5, 1.5, 1.5, 1.5, 1.5],
    };
    let strategy = &side.strategy;
    let weights = [
        (base[0] * strategy.at_rim_bias * ctx.at_rim_bias).max(1.0),
        (base[1] * strategy.mid_range_bias * ctx.mid_range_bias).max(1.0),
        (base[2] * strategy.three_point_bias * ctx.three_point_bias).max(1.0),
        (base[3] * strategy.at_rim_bias * ctx.drive_bias).max(1.0),
        (base[4] * strategy.mid_range_bias * ctx.post_up_bias).max(1.0),
    ];
    match rng.pick_weighted(&weights) {
        0 => ActionType::AtRim,
        1 => ActionType::MidRange,
        2 => ActionType::ThreePoint,
        3 => ActionType::Drive,
        _ => ActionType::PostUp,
    }
}

/// Logistic midpoint for a shot type.
const fn shot_midpoint(action: ActionType) -> f64 {
    match action {
        ActionType::AtRim => 35.0,
        ActionType::Drive => 45.0,
        ActionType::PostUp => 50.0,
        ActionType::MidRange => 55.0,
        ActionType::ThreePoint | ActionType::FreeThrow => 65.0,
    }
}

/// Base point value for a shot type.
fn shot_value(action: ActionType, rules: &RuleSet) -> i64 {
    match action {
        ActionType::ThreePoint => rules.three_point_value,
        ActionType::FreeThrow => rules.free_throw_value,
        ActionType::AtRim | ActionType::MidRange | ActionType::Drive | ActionType::PostUp => {
            rules.two_point_value
        }
    }
}

/// Logistic steepness shared across shot types.
const SHOT_STEEPNESS: f64 = 0.05;

/// Computes the clamped make probability for the current shot.
fn shot_probability(
    state: &GameState,
    offense: Side,
    handler_index: usize,
    defender_index: usize,
    action: ActionType,
    scheme: DefenseScheme,
    ctx: &PossessionContext,
) -> f64 {
    let handler = &state.side(offense).players[handler_index];
    let defender = &state.side(offense.other()).players[defender_index];
    let scoring = f64::from(handler.current_attributes.scoring);
    let base = 1.0 / (1.0 + (-SHOT_STEEPNESS * (scoring - shot_midpoint(action))).exp());
    let contest = 1.0
        - (f64::from(defender.current_attributes.defense) / 100.0)
            * scheme.contest_strength()
            * 0.35;
    let iq = 1.0 + (f64::from(handler.current_attributes.iq) - 50.0) / 500.0;
    let stamina = 0.6 + 0.4 * handler.current_stamina;
    let bonus = handler.pending_shot_bonus;
    (base * contest * iq * stamina + ctx.shot_probability_modifier + bonus).clamp(0.01, 0.99)
}

/// Fires a boundary hook (game or quarter scope) through the same pipeline
/// the possession steps use.
///
/// # Errors
///
/// Returns [`SimError`] when an effect action is malformed.
#[allow(clippy::too_many_arguments, reason = "Internal pipeline helper with one call shape.")]
pub(crate) fn fire_boundary_hook(
    state: &mut GameState,
    offense: Side,
    handler_index: usize,
    defender_index: usize,
    registry: &EffectRegistry,
    meta: &mut MetaStore,
    season_id: &SeasonId,
    rng: &mut GameRng,
    rules: &RuleSet,
    hook: &str,
    event: &mut BTreeMap<String, Scalar>,
    narration_buffer: &mut Vec<String>,
) -> Result<FireOutcome, SimError> {
    fire_hook(
        state,
        offense,
        handler_index,
        defender_index,
        registry,
        meta,
        season_id,
        rng,
        rules,
        hook,
        event,
        narration_buffer,
    )
}

// ============================================================================
// SECTION: Possession Entry Point
// ============================================================================

/// Resolves one full possession.
///
/// # Errors
///
/// Returns [`SimError`] when an effect action is malformed; the game aborts
/// and the orchestrator records the round as failed.
#[allow(clippy::too_many_lines, reason = "The pipeline order is the specification.")]
pub fn run_possession(
    state: &mut GameState,
    offense: Side,
    rules: &RuleSet,
    registry: &EffectRegistry,
    meta: &mut MetaStore,
    season_id: &SeasonId,
    rng: &mut GameRng,
) -> Result<PossessionTick, SimError> {
    state.possession += 1;
    let possession = state.possession;
    let mut narration_buffer = Vec::new();

    // Clock cost is drawn before resolution so a blocked possession still
    // consumes time.
    let pace_shift = state.side(offense).strategy.pace_bias * 2.0;
    let seconds_used = (rules.pace_seconds_per_possession as f64 + rng.range(-4.0, 4.0)
        - pace_shift)
        .clamp(6.0, rules.shot_clock_seconds as f64) as u32;

    let Some(handler_index) = select_ball_handler(state, offense, rng) else {
        return Err(SimError::Invariant("no on-court players for offense".to_string()));
    };

    // Step 1: possession.pre installs the context knobs.
    let defensive_intensity = state.side(offense.other()).strategy.defensive_intensity;
    let mut event = PossessionContext::seed_event(defensive_intensity);
    let pre = fire_hook(
        state,
        offense,
        handler_index,
        0,
        registry,
        meta,
        season_id,
        rng,
        rules,
        hooks::SIM_POSSESSION_PRE,
        &mut event,
        &mut narration_buffer,
    )?;
    let ctx = PossessionContext::from_event(&event);
    if pre.block_event {
        log_entry(
            state,
            offense,
            handler_index,
            ActionType::AtRim,
            PossessionOutcome::Blocked,
            0,
            possession,
            String::from("The possession dissolves before it begins."),
            &mut narration_buffer,
        );
        finish_possession(state, offense, rules, &ctx, None, rng);
        return Ok(PossessionTick { retained: false, seconds_used });
    }

    // Random ejection installed by chaos effects.
    if ctx.random_ejection_probability > 0.0 && rng.chance(ctx.random_ejection_probability) {
        eject_handler(state, offense, handler_index, rules);
        log_entry(
            state,
            offense,
            handler_index,
            ActionType::AtRim,
            PossessionOutcome::Blocked,
            0,
            possession,
            String::from("Ejected by forces beyond the rulebook."),
            &mut narration_buffer,
        );
        finish_possession(state, offense, rules, &ctx, None, rng);
        return Ok(PossessionTick { retained: false, seconds_used });
    }

    // Steps 2 and 3: scheme, then matchup.
    let scheme = select_scheme(state, offense, ctx.defensive_intensity, rng);
    let defender_index = assign_defender(state, offense, handler_index, rng);

    // Step 4: action selection.
    let action = select_action(state, offense, handler_index, &ctx, rng);

    // Step 5: turnover and steal check.
    let handler_iq =
        f64::from(state.side(offense).players[handler_index].current_attributes.iq);
    let turnover_p = (rules.turnover_base_rate
        + scheme.turnover_modifier()
        + ctx.turnover_modifier
        + (50.0 - handler_iq) * 0.001)
        .clamp(0.0, 0.9);
    if rng.chance(turnover_p) {
        let stolen = rng.chance(0.6);
        {
            let side = state.side_mut(offense);
            side.players[handler_index].turnovers += 1;
        }
        if stolen {
            state.side_mut(offense.other()).players[defender_index].steals += 1;
        }
        let line = narrate(state, offense, handler_index, action, PossessionOutcome::Turnover, 0, rng);
        log_entry(
            state,
            offense,
            handler_index,
            action,
            PossessionOutcome::Turnover,
            0,
            possession,
            line,
            &mut narration_buffer,
        );
        finish_possession(state, offense, rules, &ctx, Some((scheme, defender_index)), rng);
        return Ok(PossessionTick { retained: false, seconds_used });
    }

    // Step 6: shot resolution, exactly one make/miss draw.
    let probability =
        shot_probability(state, offense, handler_index, defender_index, action, scheme, &ctx);
    let made = rng.chance(probability);
    {
        let handler = &mut state.side_mut(offense).players[handler_index];
        handler.pending_shot_bonus = 0.0;
        handler.field_goals_attempted += 1;
        if action == ActionType::ThreePoint {
            handler.threes_attempted += 1;
        }
    }

    let mut outcome;
    let mut points = 0_u32;
    if made {
        // Step 7: score crediting.
        let value = shot_value(action, rules) as f64
            + ctx.shot_value_modifier
            + ctx.bonus_pass_count * rules.value_per_pass;
        points = value.max(0.0).round() as u32;
        {
            let handler = &mut state.side_mut(offense).players[handler_index];
            handler.field_goals_made += 1;
            handler.points += points;
            if action == ActionType::ThreePoint {
                handler.threes_made += 1;
            }
        }
        state.credit(offense, points);
        outcome = PossessionOutcome::Made;
        fire_shot_resolved(
            state, offense, handler_index, defender_index, registry, meta, season_id, rng,
            rules, action, true, points, &mut narration_buffer,
        )?;
    } else {
        outcome = PossessionOutcome::Missed;
        fire_shot_resolved(
            state, offense, handler_index, defender_index, registry, meta, season_id, rng,
            rules, action, false, 0, &mut narration_buffer,
        )?;

        // Step 8: foul check on the miss.
        let foul_p = (rules.foul_base_rate
            + scheme.foul_modifier()
            + ctx.defensive_intensity.max(0.0) * 0.05)
            .clamp(0.0, 0.9);
        if rng.chance(foul_p) {
            outcome = PossessionOutcome::Fouled;
            points += resolve_foul(
                state,
                offense,
                handler_index,
                defender_index,
                registry,
                meta,
                season_id,
                rng,
                rules,
                action,
                &mut narration_buffer,
            )?;
        } else {
            // Step 9: rebound.
            let offense_board = state
                .side(offense)
                .on_court_mean(|player| f64::from(player.current_attributes.speed));
            let defense_board = state
                .side(offense.other())
                .on_court_mean(|player| f64::from(player.current_attributes.defense));
            let rebound_p = (rules.offensive_rebound_base
                + (offense_board - defense_board) * 0.002)
                .clamp(0.02, 0.7);
            let mut rebound_event = BTreeMap::new();
            rebound_event
                .insert("offensive_rebound_probability".to_string(), Scalar::Num(rebound_p));
            fire_hook(
                state,
                offense,
                handler_index,
                defender_index,
                registry,
                meta,
                season_id,
                rng,
                rules,
                hooks::SIM_REBOUND_CONTESTED,
                &mut rebound_event,
                &mut narration_buffer,
            )?;
            let rebound_p = rebound_event
                .get("offensive_rebound_probability")
                .and_then(Scalar::as_num)
                .unwrap_or(rebound_p);
            if rng.chance(rebound_p) {
                outcome = PossessionOutcome::MissedRetained;
                let side = state.side_mut(offense);
                let board_index = side.on_court().first().copied().unwrap_or(handler_index);
                side.players[board_index].rebounds += 1;
            } else {
                let side = state.side_mut(offense.other());
                let board_index = side.on_court().first().copied().unwrap_or(defender_index);
                side.players[board_index].rebounds += 1;
            }
        }
    }

    // Step 10: move triggers.
    resolve_moves(
        state,
        offense,
        handler_index,
        defender_index,
        registry,
        meta,
        season_id,
        rng,
        rules,
        action,
        outcome,
        &mut narration_buffer,
    )?;

    // Steps 11 and 12: stamina drain and cross-possession bookkeeping.
    finish_possession(state, offense, rules, &ctx, Some((scheme, defender_index)), rng);
    state.last_action = Some(action);
    state.last_result = Some(outcome);
    match outcome {
        PossessionOutcome::Made => {
            state.consecutive_makes += 1;
            state.consecutive_misses = 0;
        }
        PossessionOutcome::Missed | PossessionOutcome::MissedRetained
        | PossessionOutcome::Fouled => {
            state.consecutive_misses += 1;
            state.consecutive_makes = 0;
        }
        PossessionOutcome::Turnover | PossessionOutcome::Blocked => {
            state.consecutive_makes = 0;
            state.consecutive_misses = 0;
        }
    }
    let mut post_event = BTreeMap::new();
    post_event.insert("action".to_string(), Scalar::Str(action.as_str().to_string()));
    post_event.insert("result".to_string(), Scalar::Str(outcome.as_str().to_string()));
    post_event.insert("points".to_string(), Scalar::Num(f64::from(points)));
    fire_hook(
        state,
        offense,
        handler_index,
        defender_index,
        registry,
        meta,
        season_id,
        rng,
        rules,
        hooks::SIM_POSSESSION_POST,
        &mut post_event,
        &mut narration_buffer,
    )?;

    let line = narrate(state, offense, handler_index, action, outcome, points, rng);
    log_entry(
        state,
        offense,
        handler_index,
        action,
        outcome,
        points,
        possession,
        line,
        &mut narration_buffer,
    );

    let retained = outcome == PossessionOutcome::MissedRetained;
    Ok(PossessionTick { retained, seconds_used })
}

// ============================================================================
// SECTION: Foul Resolution
// ============================================================================

/// Resolves a shooting foul: foul accounting, hook, free throws, ejection.
#[allow(clippy::too_many_arguments, reason = "Internal pipeline helper with one call shape.")]
fn resolve_foul(
    state: &mut GameState,
    offense: Side,
    handler_index: usize,
    defender_index: usize,
    registry: &EffectRegistry,
    meta: &mut MetaStore,
    season_id: &SeasonId,
    rng: &mut GameRng,
    rules: &RuleSet,
    action: ActionType,
    narration_buffer: &mut Vec<String>,
) -> Result<u32, SimError> {
    {
        let defense = state.side_mut(offense.other());
        defense.players[defender_index].fouls += 1;
        defense.team_fouls += 1;
    }
    let defender_fouls = state.side(offense.other()).players[defender_index].fouls;
    let mut foul_event = BTreeMap::new();
    foul_event.insert("fouls".to_string(), Scalar::Num(f64::from(defender_fouls)));
    fire_hook(
        state,
        offense,
        handler_index,
        defender_index,
        registry,
        meta,
        season_id,
        rng,
        rules,
        hooks::SIM_FOUL_COMMITTED,
        &mut foul_event,
        narration_buffer,
    )?;

    // Free-throw sequence: three attempts behind the arc, otherwise two.
    let attempts = if action == ActionType::ThreePoint { 3 } else { 2 };
    let mut earned = 0_u32;
    for _ in 0..attempts {
        let made = rng.chance(rules.free_throw_probability);
        let handler = &mut state.side_mut(offense).players[handler_index];
        handler.free_throws_attempted += 1;
        if made {
            handler.free_throws_made += 1;
            let value = rules.free_throw_value.max(0) as u32;
            handler.points += value;
            earned += value;
        }
    }
    if earned > 0 {
        state.credit(offense, earned);
    }

    // Foul-limit ejection with immediate replacement.
    if defender_fouls >= rules.personal_foul_limit.max(0) as u32 {
        let defense = state.side_mut(offense.other());
        defense.players[defender_index].ejected = true;
        defense.players[defender_index].on_court = false;
        if let Some(bench_index) = defense.best_bench() {
            defense.players[bench_index].on_court = true;
        }
    }
    Ok(earned)
}

/// Ejects the ball handler outright (chaos effects) with replacement.
fn eject_handler(state: &mut GameState, offense: Side, handler_index: usize, rules: &RuleSet) {
    let limit = rules.personal_foul_limit.max(0) as u32;
    let side = state.side_mut(offense);
    side.players[handler_index].ejected = true;
    side.players[handler_index].on_court = false;
    side.players[handler_index].fouls = side.players[handler_index].fouls.max(limit);
    if let Some(bench_index) = side.best_bench() {
        side.players[bench_index].on_court = true;
    }
}

// ============================================================================
// SECTION: Shot Hook
// ============================================================================

/// Fires `sim.shot.resolved` with the shot's fields.
#[allow(clippy::too_many_arguments, reason = "Internal pipeline helper with one call shape.")]
fn fire_shot_resolved(
    state: &mut GameState,
    offense: Side,
    handler_index: usize,
    defender_index: usize,
    registry: &EffectRegistry,
    meta: &mut MetaStore,
    season_id: &SeasonId,
    rng: &mut GameRng,
    rules: &RuleSet,
    action: ActionType,
    made: bool,
    points: u32,
    narration_buffer: &mut Vec<String>,
) -> Result<(), SimError> {
    let mut event = BTreeMap::new();
    event.insert("action".to_string(), Scalar::Str(action.as_str().to_string()));
    event.insert("made".to_string(), Scalar::Bool(made));
    event.insert("points".to_string(), Scalar::Num(f64::from(points)));
    fire_hook(
        state,
        offense,
        handler_index,
        defender_index,
        registry,
        meta,
        season_id,
        rng,
        rules,
        hooks::SIM_SHOT_RESOLVED,
        &mut event,
        narration_buffer,
    )?;
    Ok(())
}

// ============================================================================
// SECTION: Move Triggers
// ============================================================================

/// Evaluates on-court offense moves against the resolved possession.
#[allow(clippy::too_many_arguments, reason = "Internal pipeline helper with one call shape.")]
fn resolve_moves(
    state: &mut GameState,
    offense: Side,
    handler_index: usize,
    defender_index: usize,
    registry: &EffectRegistry,
    meta: &mut MetaStore,
    season_id: &SeasonId,
    rng: &mut GameRng,
    rules: &RuleSet,
    action: ActionType,
    outcome: PossessionOutcome,
    narration_buffer: &mut Vec<String>,
) -> Result<(), SimError> {
    let mut event = BTreeMap::new();
    event.insert("action".to_string(), Scalar::Str(action.as_str().to_string()));
    event.insert("result".to_string(), Scalar::Str(outcome.as_str().to_string()));

    let on_court = state.side(offense).on_court();
    for index in on_court {
        let moves = state.side(offense).players[index].player.moves.clone();
        for player_move in moves {
            let triggered = {
                let resolver =
                    SimResolver { state, offense, handler_index: index, defender_index };
                let scope = MetaScope {
                    season_id: season_id.clone(),
                    player_id: Some(
                        state.side(offense).players[index].player.id.to_string(),
                    ),
                    team_id: Some(state.side(offense).team.id.to_string()),
                };
                let ctx = courtside_effects::EventContext {
                    event: &event,
                    meta,
                    scope: &scope,
                    inner: &resolver,
                };
                player_move.trigger.evaluate(&ctx, rng).map_err(SimError::from)?
            };
            if !triggered {
                continue;
            }
            match &player_move.effect {
                MoveEffect::ShotBonus { amount } => {
                    state.side_mut(offense).players[index].pending_shot_bonus += *amount;
                }
                MoveEffect::PointBonus { amount } => {
                    if outcome == PossessionOutcome::Made && *amount > 0 {
                        let bonus = *amount as u32;
                        state.side_mut(offense).players[index].points += bonus;
                        state.credit(offense, bonus);
                    }
                }
                MoveEffect::StaminaSurge { amount } => {
                    let floor = rules.stamina_floor;
                    let player = &mut state.side_mut(offense).players[index];
                    player.current_stamina =
                        (player.current_stamina + amount).clamp(floor, 1.0);
                }
                MoveEffect::Flourish { line } => {
                    narration_buffer.push(line.clone());
                }
            }
            let mut move_event = BTreeMap::new();
            move_event.insert("move".to_string(), Scalar::Str(player_move.name.clone()));
            fire_hook(
                state,
                offense,
                handler_index,
                defender_index,
                registry,
                meta,
                season_id,
                rng,
                rules,
                hooks::SIM_MOVE_TRIGGERED,
                &mut move_event,
                narration_buffer,
            )?;
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Stamina and Bookkeeping
// ============================================================================

/// Applies stamina drain, bench recovery, and possession counts.
fn finish_possession(
    state: &mut GameState,
    offense: Side,
    rules: &RuleSet,
    ctx: &PossessionContext,
    defense_detail: Option<(DefenseScheme, usize)>,
    rng: &mut GameRng,
) {
    let floor = rules.stamina_floor;
    let altitude_drain = |venue_altitude: i32| {
        if venue_altitude > 1_500 { 0.004 } else { 0.0 }
    };
    let home_altitude = state.home.team.venue.altitude_m;
    let pace_drain = state.side(offense).strategy.pace_bias.abs() * 0.002;
    let scheme_cost = defense_detail.map_or(0.0, |(scheme, _)| scheme.stamina_cost());
    let intensity_extra =
        state.side(offense.other()).strategy.defensive_intensity.max(0.0) * 0.003;
    // One wobble draw keeps drains from being perfectly flat.
    let wobble = rng.range(0.0, 0.004);

    for side in [Side::Home, Side::Away] {
        let is_offense = side == offense;
        let away_altitude = if side == Side::Away { altitude_drain(home_altitude) } else { 0.0 };
        let side_state = state.side_mut(side);
        for player in &mut side_state.players {
            if player.on_court {
                let mut drain = rules.stamina_drain_base + pace_drain + wobble + away_altitude;
                if is_offense {
                    drain += ctx.extra_stamina_drain;
                } else {
                    drain += scheme_cost + intensity_extra;
                }
                player.current_stamina = (player.current_stamina - drain).clamp(floor, 1.0);
                player.possessions_played += 1;
            } else if !player.ejected {
                player.current_stamina =
                    (player.current_stamina + rules.bench_recovery_per_possession).min(1.0);
            }
        }
    }
}

/// Appends a play log entry with joined narration.
#[allow(clippy::too_many_arguments, reason = "Internal pipeline helper with one call shape.")]
fn log_entry(
    state: &mut GameState,
    offense: Side,
    handler_index: usize,
    action: ActionType,
    outcome: PossessionOutcome,
    points: u32,
    possession: u32,
    line: String,
    narration_buffer: &mut Vec<String>,
) {
    let mut narration = line;
    for extra in narration_buffer.drain(..) {
        narration.push(' ');
        narration.push_str(&extra);
    }
    let offense_side = state.side(offense);
    let entry = PlayLogEntry {
        quarter: state.quarter,
        clock_seconds: state.clock_seconds,
        possession,
        offense_team_id: offense_side.team.id.clone(),
        ball_handler_id: offense_side.players[handler_index].player.id.clone(),
        action,
        outcome,
        points,
        home_score: state.home.score,
        away_score: state.away.score,
        narration,
    };
    state.log.push(entry);
}
