// crates/courtside-core/src/core/result.rs
// ============================================================================
// Module: Courtside Game Results
// Description: Durable game result, play-by-play, and box score records.
// Purpose: Define the replayable artifact the engine produces per game.
// Dependencies: crate::core::{identifiers, rules}, serde
// ============================================================================

//! ## Overview
//! A game result is everything the presenter and the audit trail need:
//! final and quarter scores, the ordered play-by-play with baked narration,
//! per-player box scores, Elam metadata, the rule set snapshot the game ran
//! under, and the `presented` flag that gates visibility during replay.
//! Ephemeral game state is never persisted; it is rebuilt from the seed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::GameId;
use crate::core::identifiers::PlayerId;
use crate::core::identifiers::SeasonId;
use crate::core::identifiers::TeamId;
use crate::core::rules::RuleSet;

// ============================================================================
// SECTION: Actions and Outcomes
// ============================================================================

/// Offensive action attempted on a possession.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Shot at the rim.
    AtRim,
    /// Mid-range jumper.
    MidRange,
    /// Three-point attempt.
    ThreePoint,
    /// Drive to the basket.
    Drive,
    /// Post-up play.
    PostUp,
    /// Free throw (emitted by the foul sequence).
    FreeThrow,
}

impl ActionType {
    /// Returns a stable label for context resolution and narration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AtRim => "at_rim",
            Self::MidRange => "mid_range",
            Self::ThreePoint => "three_point",
            Self::Drive => "drive",
            Self::PostUp => "post_up",
            Self::FreeThrow => "free_throw",
        }
    }
}

/// Outcome of a possession.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PossessionOutcome {
    /// Shot scored.
    Made,
    /// Shot missed, defensive rebound.
    Missed,
    /// Shot missed, offensive rebound retained.
    MissedRetained,
    /// Ball lost before a shot.
    Turnover,
    /// Shooter fouled; free throws followed.
    Fouled,
    /// Possession cancelled by an effect.
    Blocked,
}

impl PossessionOutcome {
    /// Returns a stable label for context resolution and narration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Made => "made",
            Self::Missed => "missed",
            Self::MissedRetained => "missed_retained",
            Self::Turnover => "turnover",
            Self::Fouled => "fouled",
            Self::Blocked => "blocked",
        }
    }
}

// ============================================================================
// SECTION: Play-by-Play
// ============================================================================

/// One possession log entry.
///
/// # Invariants
/// - Entries are ordered; running scores are monotone non-decreasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayLogEntry {
    /// Quarter number, 1-based; Elam play keeps the final quarter number.
    pub quarter: u32,
    /// Game clock seconds remaining in the quarter (0 during Elam).
    pub clock_seconds: u32,
    /// Possession ordinal across the game, 1-based.
    pub possession: u32,
    /// Team on offense.
    pub offense_team_id: TeamId,
    /// Ball handler.
    pub ball_handler_id: PlayerId,
    /// Action attempted.
    pub action: ActionType,
    /// Possession outcome.
    pub outcome: PossessionOutcome,
    /// Points credited on the possession.
    pub points: u32,
    /// Home score after the possession.
    pub home_score: u32,
    /// Away score after the possession.
    pub away_score: u32,
    /// Narration line baked at simulation time.
    pub narration: String,
}

// ============================================================================
// SECTION: Box Scores
// ============================================================================

/// Per-player box score line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxScoreLine {
    /// Player.
    pub player_id: PlayerId,
    /// Player's team.
    pub team_id: TeamId,
    /// Points scored.
    pub points: u32,
    /// Field goals made.
    pub field_goals_made: u32,
    /// Field goals attempted.
    pub field_goals_attempted: u32,
    /// Threes made.
    pub threes_made: u32,
    /// Threes attempted.
    pub threes_attempted: u32,
    /// Free throws made.
    pub free_throws_made: u32,
    /// Free throws attempted.
    pub free_throws_attempted: u32,
    /// Rebounds collected.
    pub rebounds: u32,
    /// Steals credited.
    pub steals: u32,
    /// Turnovers committed.
    pub turnovers: u32,
    /// Personal fouls committed.
    pub fouls: u32,
    /// Possessions spent on court.
    pub possessions_played: u32,
    /// Score differential while on court.
    pub plus_minus: i32,
}

// ============================================================================
// SECTION: Elam Metadata
// ============================================================================

/// Elam ending activation metadata.
///
/// # Invariants
/// - Recorded exactly once per game when the ending activates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElamMeta {
    /// Target score the game ended at.
    pub target: u32,
    /// Leader's score at activation.
    pub leader_score_at_activation: u32,
    /// Possession ordinal at activation.
    pub activated_at_possession: u32,
}

// ============================================================================
// SECTION: Game Result
// ============================================================================

/// Durable game result.
///
/// # Invariants
/// - Fully determined by the simulation inputs; two runs with identical
///   inputs serialize to identical bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    /// Game identifier.
    pub id: GameId,
    /// Season scope.
    pub season_id: SeasonId,
    /// Round number.
    pub round: u32,
    /// Slot within the round, controlling persist order.
    pub slot: u32,
    /// Home team.
    pub home_team_id: TeamId,
    /// Away team.
    pub away_team_id: TeamId,
    /// Final home score.
    pub home_score: u32,
    /// Final away score.
    pub away_score: u32,
    /// Seed the game ran under.
    pub seed: u64,
    /// Total RNG draws consumed, recording the final RNG position.
    pub rng_draws: u64,
    /// Per-quarter (home, away) scores.
    pub quarter_scores: Vec<(u32, u32)>,
    /// Ordered play-by-play log.
    pub play_by_play: Vec<PlayLogEntry>,
    /// Per-player box scores, home roster first.
    pub box_scores: Vec<BoxScoreLine>,
    /// Elam activation metadata, when the ending activated.
    pub elam: Option<ElamMeta>,
    /// Whether the safety cap ended the game.
    pub safety_capped: bool,
    /// Total possessions played.
    pub total_possessions: u32,
    /// Lead changes across the game.
    pub lead_changes: u32,
    /// Rule set snapshot the game ran under.
    pub ruleset_snapshot: RuleSet,
    /// Whether the presenter has made the game visible.
    pub presented: bool,
}

impl GameResult {
    /// Returns the winning team, or `None` on a tie.
    #[must_use]
    pub fn winner(&self) -> Option<&TeamId> {
        match self.home_score.cmp(&self.away_score) {
            std::cmp::Ordering::Greater => Some(&self.home_team_id),
            std::cmp::Ordering::Less => Some(&self.away_team_id),
            std::cmp::Ordering::Equal => None,
        }
    }
}
