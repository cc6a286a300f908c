// crates/courtside-effects/src/hooks.rs
// ============================================================================
// Module: Hook Points
// Description: Dotted hook point names and wildcard subscription matching.
// Purpose: Route engine events to subscribed effects.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Hook points are dotted strings forming a hierarchy. Effects subscribe
//! with exact names or with `*` wildcards at any depth: `sim.*` matches
//! every simulation hook, `sim.possession.*` the possession pair, and a bare
//! `*` matches everything.

// ============================================================================
// SECTION: Hook Point Names
// ============================================================================

/// Fired before each game.
pub const SIM_GAME_PRE: &str = "sim.game.pre";
/// Fired before each quarter.
pub const SIM_QUARTER_PRE: &str = "sim.quarter.pre";
/// Fired after each quarter.
pub const SIM_QUARTER_POST: &str = "sim.quarter.post";
/// Fired before each possession resolves.
pub const SIM_POSSESSION_PRE: &str = "sim.possession.pre";
/// Fired after each possession resolves.
pub const SIM_POSSESSION_POST: &str = "sim.possession.post";
/// Fired when a shot resolves.
pub const SIM_SHOT_RESOLVED: &str = "sim.shot.resolved";
/// Fired when a foul is committed.
pub const SIM_FOUL_COMMITTED: &str = "sim.foul.committed";
/// Fired when a rebound is contested.
pub const SIM_REBOUND_CONTESTED: &str = "sim.rebound.contested";
/// Fired when stamina drains.
pub const SIM_STAMINA_DRAIN: &str = "sim.stamina.drain";
/// Fired when a player move triggers.
pub const SIM_MOVE_TRIGGERED: &str = "sim.move.triggered";
/// Fired before the simulation report generates.
pub const REPORT_SIMULATION_PRE: &str = "report.simulation.pre";
/// Fired before commentary generates.
pub const REPORT_COMMENTARY_PRE: &str = "report.commentary.pre";
/// Fired before a governance tally.
pub const GOV_PRE: &str = "gov.pre";
/// Fired after a governance tally.
pub const GOV_POST: &str = "gov.post";

// ============================================================================
// SECTION: Matching
// ============================================================================

/// Returns true when a subscription pattern matches a fired hook point.
///
/// Segments compare exactly except `*`, which matches the rest of the name
/// at its depth. A trailing non-wildcard pattern must consume the whole
/// hook name.
#[must_use]
pub fn pattern_matches(pattern: &str, hook: &str) -> bool {
    let mut pattern_segments = pattern.split('.');
    let mut hook_segments = hook.split('.');
    loop {
        match (pattern_segments.next(), hook_segments.next()) {
            (None, None) => return true,
            (Some("*"), _) => return true,
            (Some(pattern_segment), Some(hook_segment)) => {
                if pattern_segment != hook_segment {
                    return false;
                }
            }
            (Some(_), None) | (None, Some(_)) => return false,
        }
    }
}
