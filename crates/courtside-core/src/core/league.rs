// crates/courtside-core/src/core/league.rs
// ============================================================================
// Module: Courtside League Model
// Description: League, season, lifecycle phases, and scheduling records.
// Purpose: Define season lifecycle with a fixed transition graph.
// Dependencies: crate::core::{identifiers, rules, time}, serde, thiserror
// ============================================================================

//! ## Overview
//! A league contains an ordered sequence of seasons. A season owns its teams,
//! schedule, and rule set: the immutable starting copy plus the mutable
//! current copy derived from the governance log. Lifecycle transitions follow
//! a fixed directed graph; anything off-graph fails loudly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::LeagueId;
use crate::core::identifiers::SeasonId;
use crate::core::identifiers::TeamId;
use crate::core::rules::RuleSet;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Season Phase
// ============================================================================

/// Season lifecycle phase.
///
/// # Invariants
/// - Variants are stable for serialization.
/// - Transitions follow [`SeasonPhase::can_transition_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonPhase {
    /// Teams and schedule under construction.
    Setup,
    /// Regular season rounds in progress.
    Active,
    /// Regular season done; standings checked for ties.
    TiebreakerCheck,
    /// Tiebreaker games in progress.
    Tiebreakers,
    /// Playoff rounds in progress.
    Playoffs,
    /// Championship series in progress.
    Championship,
    /// Post-championship governance window.
    Offseason,
    /// Season closed; archive written.
    Complete,
}

impl SeasonPhase {
    /// Returns true when the transition is on the fixed lifecycle graph.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Setup, Self::Active)
                | (Self::Active, Self::TiebreakerCheck)
                | (Self::TiebreakerCheck, Self::Tiebreakers | Self::Playoffs)
                | (Self::Tiebreakers, Self::Playoffs)
                | (Self::Playoffs, Self::Championship)
                | (Self::Championship, Self::Offseason)
                | (Self::Offseason, Self::Complete)
        )
    }

    /// Returns a stable label for logs and events.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Active => "active",
            Self::TiebreakerCheck => "tiebreaker_check",
            Self::Tiebreakers => "tiebreakers",
            Self::Playoffs => "playoffs",
            Self::Championship => "championship",
            Self::Offseason => "offseason",
            Self::Complete => "complete",
        }
    }
}

/// Illegal lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal season transition: {from:?} -> {to:?}")]
pub struct LifecycleError {
    /// Phase the season was in.
    pub from: SeasonPhase,
    /// Phase the transition requested.
    pub to: SeasonPhase,
}

// ============================================================================
// SECTION: Lifecycle Config
// ============================================================================

/// Free-form lifecycle configuration stored on the season.
///
/// # Invariants
/// - `champion_team_id` is set only in `Offseason` and `Complete` phases.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Deadline for the offseason governance window, when scheduled.
    pub offseason_closes_at: Option<Timestamp>,
    /// Champion team, once the championship resolves.
    pub champion_team_id: Option<TeamId>,
    /// Rounds the playoffs should run.
    pub playoff_rounds: u8,
    /// Whether passed offseason rules carry into the next season.
    pub carry_rules_forward: bool,
}

// ============================================================================
// SECTION: Schedule
// ============================================================================

/// One scheduled game pairing within a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledGame {
    /// Round number the pairing belongs to.
    pub round: u32,
    /// Position within the round, controlling persist order.
    pub slot: u32,
    /// Home team.
    pub home_team_id: TeamId,
    /// Away team.
    pub away_team_id: TeamId,
    /// Per-game seed; fixed at scheduling time for reproducibility.
    pub seed: u64,
}

// ============================================================================
// SECTION: Season and League
// ============================================================================

/// Durable season record.
///
/// # Invariants
/// - `starting_rules` never changes after activation; `current_rules` is
///   derived from the governance log and updated on `rule.enacted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    /// Season identifier.
    pub id: SeasonId,
    /// Owning league.
    pub league_id: LeagueId,
    /// Ordinal within the league, 1-based.
    pub number: u32,
    /// Lifecycle phase.
    pub phase: SeasonPhase,
    /// Immutable starting rule set.
    pub starting_rules: RuleSet,
    /// Current rule set derived from the event log.
    pub current_rules: RuleSet,
    /// Last completed round number; 0 before any round runs.
    pub completed_rounds: u32,
    /// Lifecycle configuration blob.
    pub lifecycle: LifecycleConfig,
}

impl Season {
    /// Transitions the season to the next phase.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError`] when the transition is off-graph.
    pub fn transition_to(&mut self, next: SeasonPhase) -> Result<(), LifecycleError> {
        if !self.phase.can_transition_to(next) {
            return Err(LifecycleError { from: self.phase, to: next });
        }
        self.phase = next;
        Ok(())
    }
}

/// Durable league record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    /// League identifier.
    pub id: LeagueId,
    /// Display name.
    pub name: String,
    /// Ordered season identifiers, oldest first.
    pub seasons: Vec<SeasonId>,
}
