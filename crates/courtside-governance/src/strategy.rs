// crates/courtside-governance/src/strategy.rs
// ============================================================================
// Module: Strategy Interpretation
// Description: Keyword parsing of governor strategy text and replay.
// Purpose: Turn free-form strategy text into structured engine inputs.
// Dependencies: courtside-core
// ============================================================================

//! ## Overview
//! Strategy text is interpreted with a deterministic keyword heuristic so
//! the engine inputs never depend on model availability. Replay folds
//! `strategy.interpreted` events; the latest per team wins.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use courtside_core::EventKind;
use courtside_core::GovernanceEvent;
use courtside_core::TeamId;
use courtside_core::TeamStrategy;

// ============================================================================
// SECTION: Interpretation
// ============================================================================

/// Parses strategy text into structured form with keyword rules.
#[must_use]
pub fn parse_strategy(raw: &str) -> TeamStrategy {
    let lowered = raw.to_lowercase();
    let mut strategy = TeamStrategy::default();
    if lowered.contains("aggressive") || lowered.contains("press") || lowered.contains("clamp") {
        strategy.defensive_intensity = 0.5;
    }
    if lowered.contains("passive") || lowered.contains("conserve") {
        strategy.defensive_intensity = -0.3;
    }
    if lowered.contains("fast") || lowered.contains("run") || lowered.contains("push the pace") {
        strategy.pace_bias = 0.5;
    }
    if lowered.contains("slow") || lowered.contains("grind") {
        strategy.pace_bias = -0.5;
    }
    if lowered.contains("three") || lowered.contains("deep") || lowered.contains("arc") {
        strategy.three_point_bias = 2.0;
    }
    if lowered.contains("paint") || lowered.contains("inside") || lowered.contains("rim") {
        strategy.at_rim_bias = 2.0;
    }
    if lowered.contains("midrange") || lowered.contains("mid-range") {
        strategy.mid_range_bias = 1.8;
    }
    strategy
}

// ============================================================================
// SECTION: Replay
// ============================================================================

/// Folds the latest interpreted strategy per team from the event log.
#[must_use]
pub fn load_strategies(events: &[GovernanceEvent]) -> BTreeMap<TeamId, TeamStrategy> {
    let mut strategies = BTreeMap::new();
    for event in events {
        if let EventKind::StrategyInterpreted { team_id, strategy } = event.decode() {
            strategies.insert(team_id, strategy);
        }
    }
    strategies
}
