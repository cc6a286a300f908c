// crates/courtside-engine/src/state.rs
// ============================================================================
// Module: Ephemeral Game State
// Description: In-game player, team, and game structures plus resolution.
// Purpose: Hold the state the possession loop mutates; never persisted.
// Dependencies: courtside-core, sieve-logic
// ============================================================================

//! ## Overview
//! Game state is rebuilt from the seed and the inputs on every simulation;
//! nothing here touches storage. The state also implements the generic field
//! resolution effects query: adding a field to the resolver's match makes it
//! queryable from conditions with no evaluator change.

// ============================================================================
// SECTION: Imports
// ============================================================================

use courtside_core::ActionType;
use courtside_core::AttributeVector;
use courtside_core::ON_COURT_COUNT;
use courtside_core::Player;
use courtside_core::PlayerId;
use courtside_core::PossessionOutcome;
use courtside_core::PlayLogEntry;
use courtside_core::Team;
use courtside_core::TeamId;
use courtside_core::TeamStrategy;
use sieve_logic::ContextResolver;
use sieve_logic::Scalar;

// ============================================================================
// SECTION: Player State
// ============================================================================

/// Ephemeral per-player game state with embedded stat counters.
///
/// # Invariants
/// - `current_stamina` stays inside `[stamina_floor, 1.0]`.
/// - `on_court` players per side never exceed [`ON_COURT_COUNT`].
#[derive(Debug, Clone)]
pub struct PlayerState {
    /// Durable player record.
    pub player: Player,
    /// In-game attributes after venue adjustment.
    pub current_attributes: AttributeVector,
    /// Current stamina.
    pub current_stamina: f64,
    /// Personal fouls committed.
    pub fouls: u32,
    /// Whether the player is on court.
    pub on_court: bool,
    /// Whether the player fouled out or was ejected.
    pub ejected: bool,
    /// Shot-probability bonus carried from a triggered move.
    pub pending_shot_bonus: f64,
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
    /// Possessions spent on court.
    pub possessions_played: u32,
    /// Score differential while on court.
    pub plus_minus: i32,
}

impl PlayerState {
    /// Builds the initial state from a durable record.
    #[must_use]
    pub fn new(player: Player, on_court: bool) -> Self {
        Self {
            current_attributes: player.base_attributes,
            current_stamina: 1.0,
            fouls: 0,
            on_court,
            ejected: false,
            pending_shot_bonus: 0.0,
            points: 0,
            field_goals_made: 0,
            field_goals_attempted: 0,
            threes_made: 0,
            threes_attempted: 0,
            free_throws_made: 0,
            free_throws_attempted: 0,
            rebounds: 0,
            steals: 0,
            turnovers: 0,
            possessions_played: 0,
            plus_minus: 0,
            player,
        }
    }

    /// Returns true when the player can enter the game.
    #[must_use]
    pub const fn available(&self) -> bool {
        !self.on_court && !self.ejected
    }
}

// ============================================================================
// SECTION: Team State
// ============================================================================

/// Ephemeral per-team game state.
#[derive(Debug, Clone)]
pub struct TeamSide {
    /// Durable team record.
    pub team: Team,
    /// Strategy in force for the game.
    pub strategy: TeamStrategy,
    /// Player states, roster order preserved.
    pub players: Vec<PlayerState>,
    /// Current score.
    pub score: u32,
    /// Team fouls in the current half.
    pub team_fouls: u32,
}

impl TeamSide {
    /// Builds the initial side state with the starters on court.
    #[must_use]
    pub fn new(team: Team, strategy: TeamStrategy) -> Self {
        let players = team
            .players
            .iter()
            .enumerate()
            .map(|(index, player)| PlayerState::new(player.clone(), index < ON_COURT_COUNT))
            .collect();
        Self { team, strategy, players, score: 0, team_fouls: 0 }
    }

    /// Indices of on-court players.
    #[must_use]
    pub fn on_court(&self) -> Vec<usize> {
        self.players
            .iter()
            .enumerate()
            .filter(|(_, state)| state.on_court)
            .map(|(index, _)| index)
            .collect()
    }

    /// Index of the highest-stamina available bench player, if any.
    #[must_use]
    pub fn best_bench(&self) -> Option<usize> {
        self.players
            .iter()
            .enumerate()
            .filter(|(_, state)| state.available())
            .max_by(|a, b| {
                a.1.current_stamina
                    .partial_cmp(&b.1.current_stamina)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b.0.cmp(&a.0))
            })
            .map(|(index, _)| index)
    }

    /// Mean of an on-court attribute, for aggregate checks.
    #[must_use]
    pub fn on_court_mean(&self, pick: fn(&PlayerState) -> f64) -> f64 {
        let on_court = self.on_court();
        if on_court.is_empty() {
            return 0.0;
        }
        let total: f64 = on_court.iter().map(|&index| pick(&self.players[index])).sum();
        total / on_court.len() as f64
    }
}

// ============================================================================
// SECTION: Game State
// ============================================================================

/// Side index for home and away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Home side.
    Home,
    /// Away side.
    Away,
}

impl Side {
    /// The opposing side.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Home => Self::Away,
            Self::Away => Self::Home,
        }
    }
}

/// Ephemeral whole-game state.
///
/// # Invariants
/// - Scores are monotone non-decreasing.
/// - Never persisted; rebuilt from seed and inputs.
#[derive(Debug, Clone)]
pub struct GameState {
    /// Home side.
    pub home: TeamSide,
    /// Away side.
    pub away: TeamSide,
    /// Current quarter, 1-based.
    pub quarter: u32,
    /// Possession ordinal across the game, 1-based.
    pub possession: u32,
    /// Seconds remaining in the quarter clock (0 during Elam).
    pub clock_seconds: u32,
    /// Whether the Elam ending is active.
    pub elam_active: bool,
    /// Elam target score once active.
    pub elam_target: Option<u32>,
    /// Last resolved action.
    pub last_action: Option<ActionType>,
    /// Last possession outcome.
    pub last_result: Option<PossessionOutcome>,
    /// Consecutive made shots by the current streak holder.
    pub consecutive_makes: u32,
    /// Consecutive missed shots by the current streak holder.
    pub consecutive_misses: u32,
    /// Lead changes so far.
    pub lead_changes: u32,
    /// Sign of the last non-tied margin: +1 home, -1 away.
    pub last_leader: i8,
    /// Accumulated play-by-play.
    pub log: Vec<PlayLogEntry>,
    /// Per-quarter (home, away) scores.
    pub quarter_scores: Vec<(u32, u32)>,
}

impl GameState {
    /// Returns the side state for an index.
    #[must_use]
    pub fn side(&self, side: Side) -> &TeamSide {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }

    /// Returns the mutable side state for an index.
    pub fn side_mut(&mut self, side: Side) -> &mut TeamSide {
        match side {
            Side::Home => &mut self.home,
            Side::Away => &mut self.away,
        }
    }

    /// Looks up which side a team id belongs to.
    #[must_use]
    pub fn side_of_team(&self, team_id: &TeamId) -> Option<Side> {
        if &self.home.team.id == team_id {
            Some(Side::Home)
        } else if &self.away.team.id == team_id {
            Some(Side::Away)
        } else {
            None
        }
    }

    /// Credits points to a side and updates lead-change accounting.
    pub fn credit(&mut self, side: Side, points: u32) {
        self.side_mut(side).score += points;
        let margin = i64::from(self.home.score) - i64::from(self.away.score);
        let leader: i8 = match margin.cmp(&0) {
            std::cmp::Ordering::Greater => 1,
            std::cmp::Ordering::Less => -1,
            std::cmp::Ordering::Equal => 0,
        };
        if leader != 0 {
            if self.last_leader != 0 && leader != self.last_leader {
                self.lead_changes += 1;
            }
            self.last_leader = leader;
        }
        let on_court_margin = if matches!(side, Side::Home) { points as i32 } else { -(points as i32) };
        for state in &mut self.home.players {
            if state.on_court {
                state.plus_minus += on_court_margin;
            }
        }
        for state in &mut self.away.players {
            if state.on_court {
                state.plus_minus -= on_court_margin;
            }
        }
    }
}

// ============================================================================
// SECTION: Field Resolution
// ============================================================================

/// Resolver over the game state for effect conditions and expressions.
///
/// Paths: `game.*` for whole-game fields, `player.*` for the ball handler,
/// `defender.*` for the matched defender, `team.*`/`opponent.*` for the
/// offense and defense sides, and `player:{id}.*`/`team:{id}.*` for absolute
/// lookups.
pub struct SimResolver<'a> {
    /// Game state under resolution.
    pub state: &'a GameState,
    /// Offense side for the current event.
    pub offense: Side,
    /// Roster index of the ball handler on the offense side.
    pub handler_index: usize,
    /// Roster index of the matched defender on the defense side.
    pub defender_index: usize,
}

impl SimResolver<'_> {
    /// Resolves a player-scoped field.
    fn player_field(state: &PlayerState, field: &str) -> Option<Scalar> {
        match field {
            "stamina" => Some(Scalar::Num(state.current_stamina)),
            "fouls" => Some(Scalar::Num(f64::from(state.fouls))),
            "points" => Some(Scalar::Num(f64::from(state.points))),
            "on_court" => Some(Scalar::Bool(state.on_court)),
            "ejected" => Some(Scalar::Bool(state.ejected)),
            "archetype" => Some(Scalar::Str(format!("{:?}", state.player.archetype).to_lowercase())),
            _ => state
                .current_attributes
                .get(field)
                .map(|value| Scalar::Num(f64::from(value))),
        }
    }

    /// Resolves a team-scoped field.
    fn team_field(side: &TeamSide, field: &str) -> Option<Scalar> {
        match field {
            "score" => Some(Scalar::Num(f64::from(side.score))),
            "team_fouls" => Some(Scalar::Num(f64::from(side.team_fouls))),
            "defensive_intensity" => Some(Scalar::Num(side.strategy.defensive_intensity)),
            "pace_bias" => Some(Scalar::Num(side.strategy.pace_bias)),
            "name" => Some(Scalar::Str(side.team.name.clone())),
            _ => None,
        }
    }

    /// Finds a player state anywhere in the game by id.
    fn find_player(&self, player_id: &str) -> Option<&PlayerState> {
        self.state
            .home
            .players
            .iter()
            .chain(self.state.away.players.iter())
            .find(|state| state.player.id == PlayerId::from(player_id))
    }
}

impl ContextResolver for SimResolver<'_> {
    fn resolve(&self, path: &str) -> Option<Scalar> {
        if let Some(field) = path.strip_prefix("game.") {
            let state = self.state;
            return match field {
                "quarter" => Some(Scalar::Num(f64::from(state.quarter))),
                "possession" => Some(Scalar::Num(f64::from(state.possession))),
                "clock_seconds" => Some(Scalar::Num(f64::from(state.clock_seconds))),
                "home_score" => Some(Scalar::Num(f64::from(state.home.score))),
                "away_score" => Some(Scalar::Num(f64::from(state.away.score))),
                "score_margin" => Some(Scalar::Num(
                    f64::from(state.home.score) - f64::from(state.away.score),
                )),
                "elam_active" => Some(Scalar::Bool(state.elam_active)),
                "elam_target" => state.elam_target.map(|target| Scalar::Num(f64::from(target))),
                "last_action" => {
                    state.last_action.map(|action| Scalar::Str(action.as_str().to_string()))
                }
                "last_result" => {
                    state.last_result.map(|result| Scalar::Str(result.as_str().to_string()))
                }
                "consecutive_makes" => Some(Scalar::Num(f64::from(state.consecutive_makes))),
                "consecutive_misses" => Some(Scalar::Num(f64::from(state.consecutive_misses))),
                "lead_changes" => Some(Scalar::Num(f64::from(state.lead_changes))),
                _ => None,
            };
        }
        if let Some(field) = path.strip_prefix("player.") {
            let offense = self.state.side(self.offense);
            return Self::player_field(offense.players.get(self.handler_index)?, field);
        }
        if let Some(field) = path.strip_prefix("defender.") {
            let defense = self.state.side(self.offense.other());
            return Self::player_field(defense.players.get(self.defender_index)?, field);
        }
        if let Some(field) = path.strip_prefix("team.") {
            return Self::team_field(self.state.side(self.offense), field);
        }
        if let Some(field) = path.strip_prefix("opponent.") {
            return Self::team_field(self.state.side(self.offense.other()), field);
        }
        if let Some(rest) = path.strip_prefix("player:") {
            let (player_id, field) = rest.split_once('.')?;
            return Self::player_field(self.find_player(player_id)?, field);
        }
        if let Some(rest) = path.strip_prefix("team:") {
            let (team_id, field) = rest.split_once('.')?;
            let side = self.state.side_of_team(&TeamId::from(team_id))?;
            return Self::team_field(self.state.side(side), field);
        }
        None
    }
}
