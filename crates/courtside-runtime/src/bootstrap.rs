// crates/courtside-runtime/src/bootstrap.rs
// ============================================================================
// Module: League Bootstrap
// Description: Creates a league, season, rosters, and schedule from config.
// Purpose: Back the `seed` CLI command with deterministic generation.
// Dependencies: courtside-core, courtside-store-sqlite, rand, serde, toml
// ============================================================================

//! ## Overview
//! Seeding builds a complete playable league from a small TOML description:
//! teams with generated five-player rosters, venues, governor enrollment, a
//! double round-robin schedule with per-game seeds, and the season in its
//! ACTIVE phase. Generation is seeded, so the same config produces the same
//! league.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;

use courtside_core::Archetype;
use courtside_core::AttributeVector;
use courtside_core::GovernorId;
use courtside_core::League;
use courtside_core::LeagueId;
use courtside_core::LifecycleConfig;
use courtside_core::Player;
use courtside_core::PlayerId;
use courtside_core::RuleSet;
use courtside_core::RuleValue;
use courtside_core::ScheduledGame;
use courtside_core::Season;
use courtside_core::SeasonId;
use courtside_core::SeasonPhase;
use courtside_core::Team;
use courtside_core::TeamId;
use courtside_core::Venue;
use courtside_store_sqlite::Repository;
use courtside_store_sqlite::RepositoryError;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Seed Config
// ============================================================================

/// Venue description in the seed file.
#[derive(Debug, Clone, Deserialize)]
pub struct VenueSeed {
    /// Venue display name.
    pub name: String,
    /// Seating capacity.
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    /// Altitude in meters.
    #[serde(default)]
    pub altitude_m: i32,
    /// Surface label.
    #[serde(default = "default_surface")]
    pub surface: String,
    /// Latitude.
    #[serde(default)]
    pub latitude: f64,
    /// Longitude.
    #[serde(default)]
    pub longitude: f64,
}

/// Returns the default venue capacity.
const fn default_capacity() -> u32 {
    12_000
}

/// Returns the default surface.
fn default_surface() -> String {
    "hardwood".to_string()
}

/// Team description in the seed file.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamSeed {
    /// Team name.
    pub name: String,
    /// Short emblem string.
    #[serde(default)]
    pub emblem: String,
    /// Governors enrolled on this team.
    #[serde(default)]
    pub governors: Vec<String>,
    /// Venue description; a default is generated when absent.
    #[serde(default)]
    pub venue: Option<VenueSeed>,
}

/// Top-level seed file.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    /// League display name.
    pub league_name: String,
    /// Master generation seed.
    #[serde(default = "default_master_seed")]
    pub seed: u64,
    /// Rule overrides applied on top of defaults.
    #[serde(default)]
    pub rules: BTreeMap<String, RuleValue>,
    /// Team descriptions; at least two.
    pub teams: Vec<TeamSeed>,
}

/// Returns the default master seed.
const fn default_master_seed() -> u64 {
    42
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Bootstrap failures.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Seed file could not be read.
    #[error("seed config io error: {0}")]
    Io(String),
    /// Seed file failed to parse.
    #[error("seed config parse error: {0}")]
    Parse(String),
    /// Seed file failed validation.
    #[error("seed config invalid: {0}")]
    Invalid(String),
    /// Storage failure while writing the league.
    #[error("seed storage failure: {0}")]
    Repository(#[from] RepositoryError),
}

// ============================================================================
// SECTION: Generation
// ============================================================================

/// First names used for generated players.
const FIRST_NAMES: &[&str] = &[
    "Juno", "Marrow", "Tova", "Castellan", "Pell", "Iris", "Orson", "Vesper", "Quill", "Sable",
    "Harrow", "Lumen", "Ditty", "Onyx", "Faye", "Rook",
];

/// Last names used for generated players.
const LAST_NAMES: &[&str] = &[
    "Atlas", "Breaker", "Crowe", "Delgado", "Ember", "Frost", "Gale", "Hollow", "Ives",
    "Jubilee", "Kite", "Loom", "Meridian", "North", "Oduya", "Pine",
];

/// Draws an attribute in `[40, 95]` with a small star chance.
fn draw_attribute(rng: &mut SmallRng) -> u8 {
    let base = 40 + (rng.random::<f64>() * 45.0) as u8;
    if rng.random::<f64>() < 0.08 { base.saturating_add(10).min(100) } else { base }
}

/// Generates one player.
fn generate_player(rng: &mut SmallRng, index: usize) -> Player {
    let first = FIRST_NAMES[(rng.random::<f64>() * FIRST_NAMES.len() as f64) as usize
        % FIRST_NAMES.len()];
    let last = LAST_NAMES[(rng.random::<f64>() * LAST_NAMES.len() as f64) as usize
        % LAST_NAMES.len()];
    let archetype = match index {
        0 => Archetype::Slasher,
        1 => Archetype::Sniper,
        2 => Archetype::Anchor,
        3 => Archetype::Conductor,
        _ => Archetype::Journeyman,
    };
    Player {
        id: PlayerId::fresh(),
        name: format!("{first} {last}"),
        base_attributes: AttributeVector {
            scoring: draw_attribute(rng),
            passing: draw_attribute(rng),
            defense: draw_attribute(rng),
            speed: draw_attribute(rng),
            stamina: draw_attribute(rng),
            iq: draw_attribute(rng),
            ego: draw_attribute(rng),
            chaotic_alignment: draw_attribute(rng),
            fate: draw_attribute(rng),
        },
        moves: Vec::new(),
        archetype,
        backstory: format!("{first} {last} arrived with something to prove."),
    }
}

/// Builds a default venue for a team.
fn default_venue(team_name: &str, rng: &mut SmallRng) -> Venue {
    Venue {
        name: format!("{team_name} Pavilion"),
        capacity: default_capacity(),
        altitude_m: (rng.random::<f64>() * 2_200.0) as i32,
        surface: default_surface(),
        latitude: -60.0 + rng.random::<f64>() * 120.0,
        longitude: -180.0 + rng.random::<f64>() * 360.0,
    }
}

/// Builds a double round-robin schedule with seeded games.
fn build_schedule(team_ids: &[TeamId], rounds: u32, rng: &mut SmallRng) -> Vec<ScheduledGame> {
    let mut games = Vec::new();
    let count = team_ids.len();
    for round in 1..=rounds {
        // Circle-method pairing rotated by round.
        let mut order: Vec<usize> = (0..count).collect();
        order.rotate_left(round as usize % count.max(1));
        let mut slot = 0;
        let mut used = vec![false; count];
        for i in 0..count {
            if used[i] {
                continue;
            }
            let Some(j) = (i + 1..count).find(|&j| !used[j]) else { continue };
            used[i] = true;
            used[j] = true;
            let (home, away) =
                if round % 2 == 0 { (order[i], order[j]) } else { (order[j], order[i]) };
            games.push(ScheduledGame {
                round,
                slot,
                home_team_id: team_ids[home].clone(),
                away_team_id: team_ids[away].clone(),
                seed: rng.random::<u64>(),
            });
            slot += 1;
        }
    }
    games
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Loads a seed file.
///
/// # Errors
///
/// Returns [`BootstrapError`] on read or parse failure.
pub fn load_seed_config(path: &Path) -> Result<SeedConfig, BootstrapError> {
    let body =
        std::fs::read_to_string(path).map_err(|err| BootstrapError::Io(err.to_string()))?;
    toml::from_str(&body).map_err(|err| BootstrapError::Parse(err.to_string()))
}

/// Creates the league, season, teams, schedule, and enrollment.
///
/// # Errors
///
/// Returns [`BootstrapError`] on invalid config or storage failure.
pub fn seed_league(repo: &Repository, config: &SeedConfig) -> Result<Season, BootstrapError> {
    if config.teams.len() < 2 {
        return Err(BootstrapError::Invalid("at least two teams are required".to_string()));
    }
    let rules = RuleSet::from_map(&config.rules)
        .map_err(|err| BootstrapError::Invalid(err.to_string()))?;
    let mut rng = SmallRng::seed_from_u64(config.seed);

    let league = League {
        id: LeagueId::fresh(),
        name: config.league_name.clone(),
        seasons: Vec::new(),
    };
    let season_id = SeasonId::fresh();
    let mut team_ids = Vec::new();
    for team_seed in &config.teams {
        let players = (0..5).map(|index| generate_player(&mut rng, index)).collect();
        let venue = team_seed.venue.as_ref().map_or_else(
            || default_venue(&team_seed.name, &mut rng),
            |seed| Venue {
                name: seed.name.clone(),
                capacity: seed.capacity,
                altitude_m: seed.altitude_m,
                surface: seed.surface.clone(),
                latitude: seed.latitude,
                longitude: seed.longitude,
            },
        );
        let team = Team {
            id: TeamId::fresh(),
            name: team_seed.name.clone(),
            emblem: team_seed.emblem.clone(),
            players,
            venue,
        };
        repo.upsert_team(&season_id, &team)?;
        for governor in &team_seed.governors {
            repo.enroll_governor(
                &season_id,
                &GovernorId::from_string(governor.clone()),
                &team.id,
            )?;
        }
        team_ids.push(team.id);
    }

    let rounds = rules.rounds_per_season.max(1) as u32;
    let schedule = build_schedule(&team_ids, rounds, &mut rng);
    repo.insert_schedule(&season_id, &schedule)?;

    let mut league = league;
    league.seasons.push(season_id.clone());
    repo.upsert_league(&league)?;

    let season = Season {
        id: season_id,
        league_id: league.id.clone(),
        number: 1,
        phase: SeasonPhase::Active,
        starting_rules: rules.clone(),
        current_rules: rules,
        completed_rounds: 0,
        lifecycle: LifecycleConfig::default(),
    };
    repo.upsert_season(&season)?;
    Ok(season)
}
