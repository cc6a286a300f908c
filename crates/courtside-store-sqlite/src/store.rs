// crates/courtside-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Repository
// Description: Transactional facade over the embedded store.
// Purpose: Persist every entity and assign event sequence numbers atomically.
// Dependencies: crate::schema, courtside-core, rusqlite, serde_json
// ============================================================================

//! ## Overview
//! The repository is the only component that touches SQLite. Sessions are
//! short: every method takes the connection mutex, runs one transaction, and
//! releases. The writer-lock guarantees of the underlying store are the
//! concurrency model; nothing here spans an AI call. Event appends assign
//! the next per-season sequence number inside the insert transaction, so a
//! conflict can only mean two writers, which the session lock forbids.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use courtside_core::EventStore;
use courtside_core::GameId;
use courtside_core::GameResult;
use courtside_core::GovernanceEvent;
use courtside_core::GovernorId;
use courtside_core::League;
use courtside_core::LeagueId;
use courtside_core::MetaBucket;
use courtside_core::MetaEntityKind;
use courtside_core::MetaKey;
use courtside_core::ScheduledGame;
use courtside_core::Season;
use courtside_core::SeasonId;
use courtside_core::StoreError;
use courtside_core::Team;
use courtside_core::TeamId;
use courtside_core::UsageRecord;
use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;

use crate::schema::ensure_schema;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Lease key used by the scheduler singleton guard.
pub const SCHEDULER_LEASE_KEY: &str = "scheduler_lease";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JournalMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl JournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the repository.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryConfig {
    /// Path to the database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Journal mode.
    #[serde(default)]
    pub journal_mode: JournalMode,
    /// Sync mode.
    #[serde(default)]
    pub sync_mode: SyncMode,
}

/// Returns the default busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Repository errors.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// I/O failure opening or preparing the database.
    #[error("repository io error: {0}")]
    Io(String),
    /// `SQLite` engine failure.
    #[error("repository db error: {0}")]
    Db(String),
    /// Writer lock timed out; retryable.
    #[error("repository busy: {0}")]
    Busy(String),
    /// Unique constraint conflict (event sequence collision).
    #[error("repository conflict: {0}")]
    Conflict(String),
    /// Stored payload failed to decode.
    #[error("repository invalid data: {0}")]
    Invalid(String),
}

impl From<RepositoryError> for StoreError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Io(message) => Self::Io(message),
            RepositoryError::Db(message) => Self::Io(message),
            RepositoryError::Busy(message) => Self::Busy(message),
            RepositoryError::Conflict(message) => Self::Conflict(message),
            RepositoryError::Invalid(message) => Self::Invalid(message),
        }
    }
}

/// Maps a rusqlite error to the repository taxonomy.
fn map_db_error(error: &rusqlite::Error) -> RepositoryError {
    if let rusqlite::Error::SqliteFailure(failure, _) = error {
        match failure.code {
            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
                return RepositoryError::Busy(error.to_string());
            }
            ErrorCode::ConstraintViolation => {
                return RepositoryError::Conflict(error.to_string());
            }
            _ => {}
        }
    }
    RepositoryError::Db(error.to_string())
}

// ============================================================================
// SECTION: Repository
// ============================================================================

/// `SQLite`-backed repository.
#[derive(Clone)]
pub struct Repository {
    /// Shared connection guarded by a mutex; the in-process writer lock.
    connection: Arc<Mutex<Connection>>,
}

impl Repository {
    /// Opens (or creates) the database at the configured path.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] when the database cannot be opened or the
    /// schema cannot be initialized.
    pub fn open(config: &RepositoryConfig) -> Result<Self, RepositoryError> {
        ensure_parent_dir(&config.path)?;
        let connection = Connection::open_with_flags(
            &config.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )
        .map_err(|err| RepositoryError::Io(err.to_string()))?;
        connection
            .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
            .map_err(|err| map_db_error(&err))?;
        connection
            .execute_batch(&format!(
                "PRAGMA foreign_keys = ON; PRAGMA journal_mode = {}; PRAGMA synchronous = {};",
                config.journal_mode.pragma_value(),
                config.sync_mode.pragma_value()
            ))
            .map_err(|err| map_db_error(&err))?;
        ensure_schema(&connection)?;
        Ok(Self { connection: Arc::new(Mutex::new(connection)) })
    }

    /// Opens an in-memory repository, used by tests and `step` dry runs.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] when initialization fails.
    pub fn in_memory() -> Result<Self, RepositoryError> {
        let connection =
            Connection::open_in_memory().map_err(|err| RepositoryError::Io(err.to_string()))?;
        ensure_schema(&connection)?;
        Ok(Self { connection: Arc::new(Mutex::new(connection)) })
    }

    /// Takes the connection lock.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, RepositoryError> {
        self.connection
            .lock()
            .map_err(|_| RepositoryError::Io("connection mutex poisoned".to_string()))
    }

    // ------------------------------------------------------------------
    // Leagues and seasons
    // ------------------------------------------------------------------

    /// Inserts or replaces a league.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] on storage failure.
    pub fn upsert_league(&self, league: &League) -> Result<(), RepositoryError> {
        let payload = encode(league)?;
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT OR REPLACE INTO leagues (id, payload) VALUES (?1, ?2)",
                params![league.id.as_str(), payload],
            )
            .map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    /// Loads a league by id.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] on storage failure or corrupt payload.
    pub fn load_league(&self, league_id: &LeagueId) -> Result<Option<League>, RepositoryError> {
        let guard = self.lock()?;
        let payload: Option<String> = guard
            .query_row(
                "SELECT payload FROM leagues WHERE id = ?1",
                params![league_id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| map_db_error(&err))?;
        payload.map(|payload| decode(&payload)).transpose()
    }

    /// Inserts or replaces a season.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] on storage failure.
    pub fn upsert_season(&self, season: &Season) -> Result<(), RepositoryError> {
        let payload = encode(season)?;
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT OR REPLACE INTO seasons (id, league_id, number, phase, payload) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    season.id.as_str(),
                    season.league_id.as_str(),
                    season.number,
                    season.phase.as_str(),
                    payload
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    /// Loads a season by id.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] on storage failure or corrupt payload.
    pub fn load_season(&self, season_id: &SeasonId) -> Result<Option<Season>, RepositoryError> {
        let guard = self.lock()?;
        let payload: Option<String> = guard
            .query_row(
                "SELECT payload FROM seasons WHERE id = ?1",
                params![season_id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| map_db_error(&err))?;
        payload.map(|payload| decode(&payload)).transpose()
    }

    /// Loads the latest season by number.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] on storage failure or corrupt payload.
    pub fn latest_season(&self) -> Result<Option<Season>, RepositoryError> {
        let guard = self.lock()?;
        let payload: Option<String> = guard
            .query_row(
                "SELECT payload FROM seasons ORDER BY number DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| map_db_error(&err))?;
        payload.map(|payload| decode(&payload)).transpose()
    }

    // ------------------------------------------------------------------
    // Teams and players
    // ------------------------------------------------------------------

    /// Inserts or replaces a team and its player index rows.
    ///
    /// Meta columns are preserved for existing rows; new rows start empty.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] on storage failure.
    pub fn upsert_team(&self, season_id: &SeasonId, team: &Team) -> Result<(), RepositoryError> {
        let payload = encode(team)?;
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| map_db_error(&err))?;
        tx.execute(
            "INSERT INTO teams (id, season_id, name, payload) VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(id) DO UPDATE SET payload = excluded.payload, name = excluded.name",
            params![team.id.as_str(), season_id.as_str(), team.name, payload],
        )
        .map_err(|err| map_db_error(&err))?;
        for player in &team.players {
            tx.execute(
                "INSERT INTO players (id, season_id, team_id, name) VALUES (?1, ?2, ?3, ?4) \
                 ON CONFLICT(id) DO UPDATE SET team_id = excluded.team_id, \
                 name = excluded.name",
                params![
                    player.id.as_str(),
                    season_id.as_str(),
                    team.id.as_str(),
                    player.name
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        }
        tx.commit().map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    /// Loads a season's teams ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] on storage failure or corrupt payload.
    pub fn teams_for_season(&self, season_id: &SeasonId) -> Result<Vec<Team>, RepositoryError> {
        let guard = self.lock()?;
        let mut statement = guard
            .prepare("SELECT payload FROM teams WHERE season_id = ?1 ORDER BY name")
            .map_err(|err| map_db_error(&err))?;
        let rows = statement
            .query_map(params![season_id.as_str()], |row| row.get::<_, String>(0))
            .map_err(|err| map_db_error(&err))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| map_db_error(&err))?;
        rows.iter().map(|payload| decode(payload)).collect()
    }

    // ------------------------------------------------------------------
    // Schedule
    // ------------------------------------------------------------------

    /// Inserts scheduled games.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] on storage failure.
    pub fn insert_schedule(
        &self,
        season_id: &SeasonId,
        games: &[ScheduledGame],
    ) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| map_db_error(&err))?;
        for game in games {
            tx.execute(
                "INSERT OR REPLACE INTO schedule \
                 (season_id, round, slot, home_team_id, away_team_id, seed) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    season_id.as_str(),
                    game.round,
                    game.slot,
                    game.home_team_id.as_str(),
                    game.away_team_id.as_str(),
                    game.seed as i64
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        }
        tx.commit().map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    /// Loads one round's schedule in slot order.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] on storage failure.
    pub fn schedule_for_round(
        &self,
        season_id: &SeasonId,
        round: u32,
    ) -> Result<Vec<ScheduledGame>, RepositoryError> {
        let guard = self.lock()?;
        let mut statement = guard
            .prepare(
                "SELECT round, slot, home_team_id, away_team_id, seed FROM schedule \
                 WHERE season_id = ?1 AND round = ?2 ORDER BY slot",
            )
            .map_err(|err| map_db_error(&err))?;
        let rows = statement
            .query_map(params![season_id.as_str(), round], |row| {
                Ok(ScheduledGame {
                    round: row.get(0)?,
                    slot: row.get(1)?,
                    home_team_id: TeamId::from_string(row.get::<_, String>(2)?),
                    away_team_id: TeamId::from_string(row.get::<_, String>(3)?),
                    seed: row.get::<_, i64>(4)? as u64,
                })
            })
            .map_err(|err| map_db_error(&err))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| map_db_error(&err))?;
        Ok(rows)
    }

    // ------------------------------------------------------------------
    // Game results
    // ------------------------------------------------------------------

    /// Inserts a game result and its box score rows.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] on storage failure.
    pub fn insert_game_result(&self, result: &GameResult) -> Result<(), RepositoryError> {
        let payload = encode(result)?;
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| map_db_error(&err))?;
        tx.execute(
            "INSERT OR REPLACE INTO game_results \
             (id, season_id, round, slot, presented, payload) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                result.id.as_str(),
                result.season_id.as_str(),
                result.round,
                result.slot,
                i32::from(result.presented),
                payload
            ],
        )
        .map_err(|err| map_db_error(&err))?;
        for line in &result.box_scores {
            let line_payload = encode(line)?;
            tx.execute(
                "INSERT OR REPLACE INTO box_scores \
                 (game_id, player_id, season_id, round, payload) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    result.id.as_str(),
                    line.player_id.as_str(),
                    result.season_id.as_str(),
                    result.round,
                    line_payload
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        }
        tx.commit().map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    /// Loads one round's results in slot order.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] on storage failure or corrupt payload.
    pub fn results_for_round(
        &self,
        season_id: &SeasonId,
        round: u32,
    ) -> Result<Vec<GameResult>, RepositoryError> {
        let guard = self.lock()?;
        let mut statement = guard
            .prepare(
                "SELECT payload, presented FROM game_results \
                 WHERE season_id = ?1 AND round = ?2 ORDER BY slot",
            )
            .map_err(|err| map_db_error(&err))?;
        let rows = statement
            .query_map(params![season_id.as_str(), round], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i32>(1)?))
            })
            .map_err(|err| map_db_error(&err))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| map_db_error(&err))?;
        rows.iter()
            .map(|(payload, presented)| {
                let mut result: GameResult = decode(payload)?;
                result.presented = *presented != 0;
                Ok(result)
            })
            .collect()
    }

    /// Loads every result in a season, round then slot order.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] on storage failure or corrupt payload.
    pub fn results_for_season(
        &self,
        season_id: &SeasonId,
    ) -> Result<Vec<GameResult>, RepositoryError> {
        let guard = self.lock()?;
        let mut statement = guard
            .prepare(
                "SELECT payload, presented FROM game_results \
                 WHERE season_id = ?1 ORDER BY round, slot",
            )
            .map_err(|err| map_db_error(&err))?;
        let rows = statement
            .query_map(params![season_id.as_str()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i32>(1)?))
            })
            .map_err(|err| map_db_error(&err))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| map_db_error(&err))?;
        rows.iter()
            .map(|(payload, presented)| {
                let mut result: GameResult = decode(payload)?;
                result.presented = *presented != 0;
                Ok(result)
            })
            .collect()
    }

    /// Marks a game presented (visible).
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] on storage failure.
    pub fn mark_presented(&self, game_id: &GameId) -> Result<(), RepositoryError> {
        let guard = self.lock()?;
        guard
            .execute(
                "UPDATE game_results SET presented = 1 WHERE id = ?1",
                params![game_id.as_str()],
            )
            .map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    /// Returns unpresented game ids in the latest round with games.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] on storage failure.
    pub fn unpresented_latest_round(
        &self,
        season_id: &SeasonId,
    ) -> Result<Vec<GameId>, RepositoryError> {
        let guard = self.lock()?;
        let latest: Option<u32> = guard
            .query_row(
                "SELECT MAX(round) FROM game_results WHERE season_id = ?1",
                params![season_id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| map_db_error(&err))?
            .flatten();
        let Some(round) = latest else {
            return Ok(Vec::new());
        };
        let mut statement = guard
            .prepare(
                "SELECT id FROM game_results \
                 WHERE season_id = ?1 AND round = ?2 AND presented = 0 ORDER BY slot",
            )
            .map_err(|err| map_db_error(&err))?;
        let rows = statement
            .query_map(params![season_id.as_str(), round], |row| row.get::<_, String>(0))
            .map_err(|err| map_db_error(&err))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| map_db_error(&err))?;
        Ok(rows.into_iter().map(GameId::from_string).collect())
    }

    // ------------------------------------------------------------------
    // Enrollment
    // ------------------------------------------------------------------

    /// Enrolls a governor on a team for a season.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] on storage failure.
    pub fn enroll_governor(
        &self,
        season_id: &SeasonId,
        governor_id: &GovernorId,
        team_id: &TeamId,
    ) -> Result<(), RepositoryError> {
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT OR REPLACE INTO players_enrollment \
                 (governor_id, season_id, team_id, active) VALUES (?1, ?2, ?3, 1)",
                params![governor_id.as_str(), season_id.as_str(), team_id.as_str()],
            )
            .map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    /// Loads the active governor roster for a season.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] on storage failure.
    pub fn roster_for_season(
        &self,
        season_id: &SeasonId,
    ) -> Result<BTreeMap<GovernorId, TeamId>, RepositoryError> {
        let guard = self.lock()?;
        let mut statement = guard
            .prepare(
                "SELECT governor_id, team_id FROM players_enrollment \
                 WHERE season_id = ?1 AND active = 1",
            )
            .map_err(|err| map_db_error(&err))?;
        let rows = statement
            .query_map(params![season_id.as_str()], |row| {
                Ok((
                    GovernorId::from_string(row.get::<_, String>(0)?),
                    TeamId::from_string(row.get::<_, String>(1)?),
                ))
            })
            .map_err(|err| map_db_error(&err))?
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map_err(|err| map_db_error(&err))?;
        Ok(rows)
    }

    // ------------------------------------------------------------------
    // Reports and usage
    // ------------------------------------------------------------------

    /// Inserts a generated report.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] on storage failure.
    pub fn insert_report(
        &self,
        season_id: &SeasonId,
        round: u32,
        kind: &str,
        governor_id: Option<&GovernorId>,
        body: &str,
    ) -> Result<(), RepositoryError> {
        let id = format!(
            "{}:{}:{}:{}",
            season_id.as_str(),
            round,
            kind,
            governor_id.map_or("-", GovernorId::as_str)
        );
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT OR REPLACE INTO reports \
                 (id, season_id, round, kind, governor_id, body) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id,
                    season_id.as_str(),
                    round,
                    kind,
                    governor_id.map(GovernorId::as_str),
                    body
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    /// Appends AI usage records to the usage log.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] on storage failure.
    pub fn append_usage(
        &self,
        records: &[UsageRecord],
        created_ms: i64,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| map_db_error(&err))?;
        for record in records {
            tx.execute(
                "INSERT INTO ai_usage_log \
                 (purpose, model_id, input_tokens, output_tokens, cache_tokens, latency_ms, \
                  created_ms) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.purpose.as_str(),
                    record.model_id,
                    record.input_tokens as i64,
                    record.output_tokens as i64,
                    record.cache_tokens as i64,
                    record.latency_ms as i64,
                    created_ms
                ],
            )
            .map_err(|err| map_db_error(&err))?;
        }
        tx.commit().map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Meta buckets
    // ------------------------------------------------------------------

    /// Loads every meta bucket for a season from team and player rows.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] on storage failure or corrupt payload.
    pub fn load_meta_buckets(
        &self,
        season_id: &SeasonId,
    ) -> Result<BTreeMap<MetaKey, MetaBucket>, RepositoryError> {
        let guard = self.lock()?;
        let mut buckets = BTreeMap::new();
        for (table, kind) in
            [("teams", MetaEntityKind::Team), ("players", MetaEntityKind::Player)]
        {
            let mut statement = guard
                .prepare(&format!(
                    "SELECT id, meta FROM {table} WHERE season_id = ?1 AND meta != '{{}}'"
                ))
                .map_err(|err| map_db_error(&err))?;
            let rows = statement
                .query_map(params![season_id.as_str()], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })
                .map_err(|err| map_db_error(&err))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| map_db_error(&err))?;
            for (entity_id, meta) in rows {
                let bucket: MetaBucket = decode(&meta)?;
                buckets.insert(
                    MetaKey { kind, entity_id, season_id: season_id.clone() },
                    bucket,
                );
            }
        }
        Ok(buckets)
    }

    /// Flushes dirty meta buckets back to their JSON columns.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] on storage failure.
    pub fn flush_meta(
        &self,
        buckets: &[(MetaKey, MetaBucket)],
    ) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| map_db_error(&err))?;
        for (key, bucket) in buckets {
            let table = match key.kind {
                MetaEntityKind::Team => "teams",
                MetaEntityKind::Player => "players",
            };
            let payload = encode(bucket)?;
            tx.execute(
                &format!("UPDATE {table} SET meta = ?1 WHERE id = ?2 AND season_id = ?3"),
                params![payload, key.entity_id, key.season_id.as_str()],
            )
            .map_err(|err| map_db_error(&err))?;
        }
        tx.commit().map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Bot state lease
    // ------------------------------------------------------------------

    /// Tries to acquire (or renew) the named lease.
    ///
    /// Returns false when another holder's lease is still live.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] on storage failure.
    pub fn try_acquire_lease(
        &self,
        key: &str,
        holder: &str,
        now_ms: i64,
        lease_ms: i64,
    ) -> Result<bool, RepositoryError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction().map_err(|err| map_db_error(&err))?;
        let current: Option<(String, i64)> = tx
            .query_row(
                "SELECT value, lease_expires_ms FROM bot_state WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|err| map_db_error(&err))?;
        if let Some((value, expires)) = current {
            if value != holder && expires > now_ms {
                tx.commit().map_err(|err| map_db_error(&err))?;
                return Ok(false);
            }
        }
        tx.execute(
            "INSERT OR REPLACE INTO bot_state (key, value, lease_expires_ms) \
             VALUES (?1, ?2, ?3)",
            params![key, holder, now_ms + lease_ms],
        )
        .map_err(|err| map_db_error(&err))?;
        tx.commit().map_err(|err| map_db_error(&err))?;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Archives and standings
    // ------------------------------------------------------------------

    /// Writes the season archive payload.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] on storage failure.
    pub fn insert_archive(
        &self,
        season_id: &SeasonId,
        payload: &serde_json::Value,
    ) -> Result<(), RepositoryError> {
        let body = serde_json::to_string(payload)
            .map_err(|err| RepositoryError::Invalid(err.to_string()))?;
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT OR REPLACE INTO season_archives (season_id, payload) VALUES (?1, ?2)",
                params![season_id.as_str(), body],
            )
            .map_err(|err| map_db_error(&err))?;
        Ok(())
    }

    /// Computes the (wins, losses) standings table from stored results.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] on storage failure or corrupt payload.
    pub fn standings(
        &self,
        season_id: &SeasonId,
    ) -> Result<BTreeMap<TeamId, (u32, u32)>, RepositoryError> {
        let results = self.results_for_season(season_id)?;
        let mut standings: BTreeMap<TeamId, (u32, u32)> = BTreeMap::new();
        for result in results {
            let Some(winner) = result.winner().cloned() else { continue };
            let loser = if winner == result.home_team_id {
                result.away_team_id.clone()
            } else {
                result.home_team_id.clone()
            };
            standings.entry(winner).or_insert((0, 0)).0 += 1;
            standings.entry(loser).or_insert((0, 0)).1 += 1;
        }
        Ok(standings)
    }
}

// ============================================================================
// SECTION: Event Store
// ============================================================================

impl EventStore for Repository {
    fn append_event(&mut self, event: GovernanceEvent) -> Result<GovernanceEvent, StoreError> {
        let payload = serde_json::to_string(&event.payload)
            .map_err(|err| StoreError::Invalid(err.to_string()))?;
        let mut guard = self.lock().map_err(StoreError::from)?;
        let tx = guard.transaction().map_err(|err| StoreError::from(map_db_error(&err)))?;
        let next_sequence: u64 = tx
            .query_row(
                "SELECT COALESCE(MAX(sequence_number), 0) + 1 FROM governance_events \
                 WHERE season_id = ?1",
                params![event.season_id.as_str()],
                |row| row.get::<_, i64>(0),
            )
            .map_err(|err| StoreError::from(map_db_error(&err)))? as u64;
        let mut sequenced = event;
        sequenced.sequence_number = next_sequence;
        tx.execute(
            "INSERT INTO governance_events \
             (id, season_id, sequence_number, event_type, aggregate_id, aggregate_kind, \
              round_number, governor_id, team_id, timestamp_ms, payload) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                sequenced.id.as_str(),
                sequenced.season_id.as_str(),
                sequenced.sequence_number as i64,
                sequenced.event_type,
                sequenced.aggregate_id,
                aggregate_label(sequenced.aggregate_kind),
                sequenced.round_number,
                sequenced.governor_id.as_ref().map(GovernorId::as_str),
                sequenced.team_id.as_ref().map(TeamId::as_str),
                sequenced.timestamp.unix_millis(),
                payload
            ],
        )
        .map_err(|err| StoreError::from(map_db_error(&err)))?;
        tx.commit().map_err(|err| StoreError::from(map_db_error(&err)))?;
        Ok(sequenced)
    }

    fn events_for_season(&self, season_id: &SeasonId) -> Result<Vec<GovernanceEvent>, StoreError> {
        self.query_events(
            "SELECT id, season_id, sequence_number, event_type, aggregate_id, aggregate_kind, \
             round_number, governor_id, team_id, timestamp_ms, payload FROM governance_events \
             WHERE season_id = ?1 ORDER BY sequence_number",
            &[&season_id.as_str()],
        )
    }

    fn events_by_type(
        &self,
        season_id: &SeasonId,
        event_type: &str,
    ) -> Result<Vec<GovernanceEvent>, StoreError> {
        self.query_events(
            "SELECT id, season_id, sequence_number, event_type, aggregate_id, aggregate_kind, \
             round_number, governor_id, team_id, timestamp_ms, payload FROM governance_events \
             WHERE season_id = ?1 AND event_type = ?2 ORDER BY sequence_number",
            &[&season_id.as_str(), &event_type],
        )
    }

    fn events_for_aggregate(
        &self,
        season_id: &SeasonId,
        aggregate_id: &str,
    ) -> Result<Vec<GovernanceEvent>, StoreError> {
        self.query_events(
            "SELECT id, season_id, sequence_number, event_type, aggregate_id, aggregate_kind, \
             round_number, governor_id, team_id, timestamp_ms, payload FROM governance_events \
             WHERE season_id = ?1 AND aggregate_id = ?2 ORDER BY sequence_number",
            &[&season_id.as_str(), &aggregate_id],
        )
    }
}

impl Repository {
    /// Runs one event query with positional string parameters.
    fn query_events(
        &self,
        sql: &str,
        parameters: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<GovernanceEvent>, StoreError> {
        let guard = self.lock().map_err(StoreError::from)?;
        let mut statement =
            guard.prepare(sql).map_err(|err| StoreError::from(map_db_error(&err)))?;
        let rows = statement
            .query_map(parameters, row_to_event)
            .map_err(|err| StoreError::from(map_db_error(&err)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| StoreError::from(map_db_error(&err)))?;
        rows.into_iter()
            .map(|row| row.map_err(StoreError::Invalid))
            .collect::<Result<Vec<_>, _>>()
    }
}

/// Maps one governance_events row; payload decoding is deferred so SQL
/// errors and JSON errors stay distinguishable.
fn row_to_event(
    row: &rusqlite::Row<'_>,
) -> Result<Result<GovernanceEvent, String>, rusqlite::Error> {
    let id: String = row.get(0)?;
    let season_id: String = row.get(1)?;
    let sequence_number: i64 = row.get(2)?;
    let event_type: String = row.get(3)?;
    let aggregate_id: String = row.get(4)?;
    let aggregate_kind: String = row.get(5)?;
    let round_number: u32 = row.get(6)?;
    let governor_id: Option<String> = row.get(7)?;
    let team_id: Option<String> = row.get(8)?;
    let timestamp_ms: i64 = row.get(9)?;
    let payload: String = row.get(10)?;
    Ok(build_event(
        id,
        season_id,
        sequence_number,
        event_type,
        aggregate_id,
        &aggregate_kind,
        round_number,
        governor_id,
        team_id,
        timestamp_ms,
        &payload,
    ))
}

/// Builds an envelope from decoded row parts.
#[allow(clippy::too_many_arguments, reason = "One row, one envelope.")]
fn build_event(
    id: String,
    season_id: String,
    sequence_number: i64,
    event_type: String,
    aggregate_id: String,
    aggregate_kind: &str,
    round_number: u32,
    governor_id: Option<String>,
    team_id: Option<String>,
    timestamp_ms: i64,
    payload: &str,
) -> Result<GovernanceEvent, String> {
    let payload: serde_json::Value =
        serde_json::from_str(payload).map_err(|err| err.to_string())?;
    Ok(GovernanceEvent {
        id: courtside_core::EventId::from_string(id),
        sequence_number: sequence_number.max(0) as u64,
        event_type,
        aggregate_id,
        aggregate_kind: parse_aggregate(aggregate_kind),
        season_id: SeasonId::from_string(season_id),
        round_number,
        governor_id: governor_id.map(GovernorId::from_string),
        team_id: team_id.map(TeamId::from_string),
        timestamp: courtside_core::Timestamp::from_unix_millis(timestamp_ms),
        payload,
    })
}

/// Stable label for an aggregate kind column.
const fn aggregate_label(kind: courtside_core::AggregateKind) -> &'static str {
    match kind {
        courtside_core::AggregateKind::Proposal => "proposal",
        courtside_core::AggregateKind::Token => "token",
        courtside_core::AggregateKind::RuleChange => "rule_change",
        courtside_core::AggregateKind::Trade => "trade",
        courtside_core::AggregateKind::Strategy => "strategy",
        courtside_core::AggregateKind::Effect => "effect",
        courtside_core::AggregateKind::Vote => "vote",
    }
}

/// Parses an aggregate kind column, defaulting unknowns to proposal.
fn parse_aggregate(label: &str) -> courtside_core::AggregateKind {
    match label {
        "token" => courtside_core::AggregateKind::Token,
        "rule_change" => courtside_core::AggregateKind::RuleChange,
        "trade" => courtside_core::AggregateKind::Trade,
        "strategy" => courtside_core::AggregateKind::Strategy,
        "effect" => courtside_core::AggregateKind::Effect,
        "vote" => courtside_core::AggregateKind::Vote,
        _ => courtside_core::AggregateKind::Proposal,
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Creates the parent directory for the database path.
fn ensure_parent_dir(path: &Path) -> Result<(), RepositoryError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|err| RepositoryError::Io(err.to_string()))?;
        }
    }
    Ok(())
}

/// Serializes an entity payload.
fn encode<T: serde::Serialize>(value: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(value).map_err(|err| RepositoryError::Invalid(err.to_string()))
}

/// Deserializes an entity payload.
fn decode<T: for<'de> serde::Deserialize<'de>>(payload: &str) -> Result<T, RepositoryError> {
    serde_json::from_str(payload).map_err(|err| RepositoryError::Invalid(err.to_string()))
}
