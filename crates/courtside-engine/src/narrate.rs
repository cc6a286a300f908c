// crates/courtside-engine/src/narrate.rs
// ============================================================================
// Module: Deterministic Narration
// Description: Template-driven play-by-play lines baked at simulation time.
// Purpose: Give every possession a narration string without any AI call.
// Dependencies: crate::{rng, state}, courtside-core
// ============================================================================

//! ## Overview
//! Play-by-play narration is part of the game result and must be bit-stable,
//! so it comes from fixed template tables with variants picked by the game
//! RNG. AI-generated prose (commentary, reports) is a separate round-level
//! artifact and never feeds back into results.

// ============================================================================
// SECTION: Imports
// ============================================================================

use courtside_core::ActionType;
use courtside_core::PossessionOutcome;

use crate::rng::GameRng;
use crate::state::GameState;
use crate::state::Side;

// ============================================================================
// SECTION: Templates
// ============================================================================

/// Action flavor fragments.
const fn action_fragments(action: ActionType) -> [&'static str; 2] {
    match action {
        ActionType::AtRim => ["attacks the rim", "goes right at the basket"],
        ActionType::MidRange => ["pulls up from the elbow", "rises for the mid-range look"],
        ActionType::ThreePoint => ["lets it fly from deep", "steps back behind the arc"],
        ActionType::Drive => ["knifes into the lane", "turns the corner on the drive"],
        ActionType::PostUp => ["backs down the defense", "works the block"],
        ActionType::FreeThrow => ["steps to the line", "settles at the stripe"],
    }
}

/// Outcome flavor fragments.
const fn outcome_fragments(outcome: PossessionOutcome) -> [&'static str; 2] {
    match outcome {
        PossessionOutcome::Made => ["it drops!", "nothing but net."],
        PossessionOutcome::Missed => ["off the iron.", "no good."],
        PossessionOutcome::MissedRetained => {
            ["short, but the offense keeps it alive.", "missed, offensive board!"]
        }
        PossessionOutcome::Turnover => ["stripped away!", "thrown into traffic and lost."],
        PossessionOutcome::Fouled => ["hacked on the way up.", "whistle — contact on the shot."],
        PossessionOutcome::Blocked => ["the play never happens.", "wiped from the record."],
    }
}

// ============================================================================
// SECTION: Narration
// ============================================================================

/// Builds one narration line for a resolved possession.
///
/// Variant picks draw from the game RNG, so narration is reproducible from
/// the seed like everything else.
#[must_use]
pub fn narrate(
    state: &GameState,
    offense: Side,
    handler_index: usize,
    action: ActionType,
    outcome: PossessionOutcome,
    points: u32,
    rng: &mut GameRng,
) -> String {
    let name = &state.side(offense).players[handler_index].player.name;
    let action_pick = usize::from(rng.chance(0.5));
    let outcome_pick = usize::from(rng.chance(0.5));
    let action_text = action_fragments(action)[action_pick];
    let outcome_text = outcome_fragments(outcome)[outcome_pick];
    if points > 0 {
        format!("{name} {action_text} — {outcome_text} (+{points})")
    } else {
        format!("{name} {action_text} — {outcome_text}")
    }
}
