// crates/courtside-store-sqlite/src/schema.rs
// ============================================================================
// Module: Schema Definition and Self-Healing
// Description: Table declarations, creation, and column reconciliation.
// Purpose: Keep the durable schema in sync with the declared shape.
// Dependencies: rusqlite
// ============================================================================

//! ## Overview
//! The schema is declared in one table so startup can self-heal: after
//! creating missing tables, every declared column is compared against
//! `PRAGMA table_info` and added with its default when absent. This removes
//! the "forgot to migrate" bug class for additive changes; destructive
//! changes still require an operator.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rusqlite::Connection;

use crate::store::RepositoryError;

// ============================================================================
// SECTION: Declarations
// ============================================================================

/// One declared column with its SQL type and default expression.
pub struct ColumnDecl {
    /// Column name.
    pub name: &'static str,
    /// SQL type plus constraints used at ALTER time.
    pub definition: &'static str,
}

/// One declared table.
pub struct TableDecl {
    /// Table name.
    pub name: &'static str,
    /// Full CREATE TABLE body (columns and constraints).
    pub create_body: &'static str,
    /// Declared columns for self-healing.
    pub columns: &'static [ColumnDecl],
}

/// Declared tables, in creation order.
pub const TABLES: &[TableDecl] = &[
    TableDecl {
        name: "leagues",
        create_body: "id TEXT PRIMARY KEY, payload TEXT NOT NULL",
        columns: &[
            ColumnDecl { name: "id", definition: "TEXT" },
            ColumnDecl { name: "payload", definition: "TEXT NOT NULL DEFAULT '{}'" },
        ],
    },
    TableDecl {
        name: "seasons",
        create_body: "id TEXT PRIMARY KEY, league_id TEXT NOT NULL, number INTEGER NOT NULL, \
                      phase TEXT NOT NULL, payload TEXT NOT NULL",
        columns: &[
            ColumnDecl { name: "id", definition: "TEXT" },
            ColumnDecl { name: "league_id", definition: "TEXT NOT NULL DEFAULT ''" },
            ColumnDecl { name: "number", definition: "INTEGER NOT NULL DEFAULT 0" },
            ColumnDecl { name: "phase", definition: "TEXT NOT NULL DEFAULT 'setup'" },
            ColumnDecl { name: "payload", definition: "TEXT NOT NULL DEFAULT '{}'" },
        ],
    },
    TableDecl {
        name: "teams",
        create_body: "id TEXT PRIMARY KEY, season_id TEXT NOT NULL, name TEXT NOT NULL, \
                      payload TEXT NOT NULL, meta TEXT NOT NULL DEFAULT '{}'",
        columns: &[
            ColumnDecl { name: "id", definition: "TEXT" },
            ColumnDecl { name: "season_id", definition: "TEXT NOT NULL DEFAULT ''" },
            ColumnDecl { name: "name", definition: "TEXT NOT NULL DEFAULT ''" },
            ColumnDecl { name: "payload", definition: "TEXT NOT NULL DEFAULT '{}'" },
            ColumnDecl { name: "meta", definition: "TEXT NOT NULL DEFAULT '{}'" },
        ],
    },
    TableDecl {
        name: "players",
        create_body: "id TEXT PRIMARY KEY, season_id TEXT NOT NULL, team_id TEXT NOT NULL, \
                      name TEXT NOT NULL, meta TEXT NOT NULL DEFAULT '{}'",
        columns: &[
            ColumnDecl { name: "id", definition: "TEXT" },
            ColumnDecl { name: "season_id", definition: "TEXT NOT NULL DEFAULT ''" },
            ColumnDecl { name: "team_id", definition: "TEXT NOT NULL DEFAULT ''" },
            ColumnDecl { name: "name", definition: "TEXT NOT NULL DEFAULT ''" },
            ColumnDecl { name: "meta", definition: "TEXT NOT NULL DEFAULT '{}'" },
        ],
    },
    TableDecl {
        name: "schedule",
        create_body: "season_id TEXT NOT NULL, round INTEGER NOT NULL, slot INTEGER NOT NULL, \
                      home_team_id TEXT NOT NULL, away_team_id TEXT NOT NULL, \
                      seed INTEGER NOT NULL, PRIMARY KEY (season_id, round, slot)",
        columns: &[
            ColumnDecl { name: "season_id", definition: "TEXT NOT NULL DEFAULT ''" },
            ColumnDecl { name: "round", definition: "INTEGER NOT NULL DEFAULT 0" },
            ColumnDecl { name: "slot", definition: "INTEGER NOT NULL DEFAULT 0" },
            ColumnDecl { name: "home_team_id", definition: "TEXT NOT NULL DEFAULT ''" },
            ColumnDecl { name: "away_team_id", definition: "TEXT NOT NULL DEFAULT ''" },
            ColumnDecl { name: "seed", definition: "INTEGER NOT NULL DEFAULT 0" },
        ],
    },
    TableDecl {
        name: "game_results",
        create_body: "id TEXT PRIMARY KEY, season_id TEXT NOT NULL, round INTEGER NOT NULL, \
                      slot INTEGER NOT NULL, presented INTEGER NOT NULL DEFAULT 0, \
                      payload TEXT NOT NULL",
        columns: &[
            ColumnDecl { name: "id", definition: "TEXT" },
            ColumnDecl { name: "season_id", definition: "TEXT NOT NULL DEFAULT ''" },
            ColumnDecl { name: "round", definition: "INTEGER NOT NULL DEFAULT 0" },
            ColumnDecl { name: "slot", definition: "INTEGER NOT NULL DEFAULT 0" },
            ColumnDecl { name: "presented", definition: "INTEGER NOT NULL DEFAULT 0" },
            ColumnDecl { name: "payload", definition: "TEXT NOT NULL DEFAULT '{}'" },
        ],
    },
    TableDecl {
        name: "box_scores",
        create_body: "game_id TEXT NOT NULL, player_id TEXT NOT NULL, season_id TEXT NOT NULL, \
                      round INTEGER NOT NULL, payload TEXT NOT NULL, \
                      PRIMARY KEY (game_id, player_id)",
        columns: &[
            ColumnDecl { name: "game_id", definition: "TEXT NOT NULL DEFAULT ''" },
            ColumnDecl { name: "player_id", definition: "TEXT NOT NULL DEFAULT ''" },
            ColumnDecl { name: "season_id", definition: "TEXT NOT NULL DEFAULT ''" },
            ColumnDecl { name: "round", definition: "INTEGER NOT NULL DEFAULT 0" },
            ColumnDecl { name: "payload", definition: "TEXT NOT NULL DEFAULT '{}'" },
        ],
    },
    TableDecl {
        name: "players_enrollment",
        create_body: "governor_id TEXT NOT NULL, season_id TEXT NOT NULL, \
                      team_id TEXT NOT NULL, active INTEGER NOT NULL DEFAULT 1, \
                      PRIMARY KEY (governor_id, season_id)",
        columns: &[
            ColumnDecl { name: "governor_id", definition: "TEXT NOT NULL DEFAULT ''" },
            ColumnDecl { name: "season_id", definition: "TEXT NOT NULL DEFAULT ''" },
            ColumnDecl { name: "team_id", definition: "TEXT NOT NULL DEFAULT ''" },
            ColumnDecl { name: "active", definition: "INTEGER NOT NULL DEFAULT 1" },
        ],
    },
    TableDecl {
        name: "governance_events",
        create_body: "id TEXT NOT NULL, season_id TEXT NOT NULL, \
                      sequence_number INTEGER NOT NULL, event_type TEXT NOT NULL, \
                      aggregate_id TEXT NOT NULL, aggregate_kind TEXT NOT NULL, \
                      round_number INTEGER NOT NULL, governor_id TEXT, team_id TEXT, \
                      timestamp_ms INTEGER NOT NULL, payload TEXT NOT NULL, \
                      PRIMARY KEY (season_id, sequence_number)",
        columns: &[
            ColumnDecl { name: "id", definition: "TEXT NOT NULL DEFAULT ''" },
            ColumnDecl { name: "season_id", definition: "TEXT NOT NULL DEFAULT ''" },
            ColumnDecl { name: "sequence_number", definition: "INTEGER NOT NULL DEFAULT 0" },
            ColumnDecl { name: "event_type", definition: "TEXT NOT NULL DEFAULT ''" },
            ColumnDecl { name: "aggregate_id", definition: "TEXT NOT NULL DEFAULT ''" },
            ColumnDecl { name: "aggregate_kind", definition: "TEXT NOT NULL DEFAULT ''" },
            ColumnDecl { name: "round_number", definition: "INTEGER NOT NULL DEFAULT 0" },
            ColumnDecl { name: "governor_id", definition: "TEXT" },
            ColumnDecl { name: "team_id", definition: "TEXT" },
            ColumnDecl { name: "timestamp_ms", definition: "INTEGER NOT NULL DEFAULT 0" },
            ColumnDecl { name: "payload", definition: "TEXT NOT NULL DEFAULT '{}'" },
        ],
    },
    TableDecl {
        name: "reports",
        create_body: "id TEXT PRIMARY KEY, season_id TEXT NOT NULL, round INTEGER NOT NULL, \
                      kind TEXT NOT NULL, governor_id TEXT, body TEXT NOT NULL",
        columns: &[
            ColumnDecl { name: "id", definition: "TEXT" },
            ColumnDecl { name: "season_id", definition: "TEXT NOT NULL DEFAULT ''" },
            ColumnDecl { name: "round", definition: "INTEGER NOT NULL DEFAULT 0" },
            ColumnDecl { name: "kind", definition: "TEXT NOT NULL DEFAULT ''" },
            ColumnDecl { name: "governor_id", definition: "TEXT" },
            ColumnDecl { name: "body", definition: "TEXT NOT NULL DEFAULT ''" },
        ],
    },
    TableDecl {
        name: "effects_registry",
        create_body: "id TEXT PRIMARY KEY, season_id TEXT NOT NULL, proposal_id TEXT NOT NULL, \
                      activation_round INTEGER NOT NULL, expiration_round INTEGER, \
                      payload TEXT NOT NULL",
        columns: &[
            ColumnDecl { name: "id", definition: "TEXT" },
            ColumnDecl { name: "season_id", definition: "TEXT NOT NULL DEFAULT ''" },
            ColumnDecl { name: "proposal_id", definition: "TEXT NOT NULL DEFAULT ''" },
            ColumnDecl { name: "activation_round", definition: "INTEGER NOT NULL DEFAULT 0" },
            ColumnDecl { name: "expiration_round", definition: "INTEGER" },
            ColumnDecl { name: "payload", definition: "TEXT NOT NULL DEFAULT '{}'" },
        ],
    },
    TableDecl {
        name: "ai_usage_log",
        create_body: "id INTEGER PRIMARY KEY AUTOINCREMENT, purpose TEXT NOT NULL, \
                      model_id TEXT NOT NULL, input_tokens INTEGER NOT NULL, \
                      output_tokens INTEGER NOT NULL, cache_tokens INTEGER NOT NULL, \
                      latency_ms INTEGER NOT NULL, created_ms INTEGER NOT NULL",
        columns: &[
            ColumnDecl { name: "purpose", definition: "TEXT NOT NULL DEFAULT ''" },
            ColumnDecl { name: "model_id", definition: "TEXT NOT NULL DEFAULT ''" },
            ColumnDecl { name: "input_tokens", definition: "INTEGER NOT NULL DEFAULT 0" },
            ColumnDecl { name: "output_tokens", definition: "INTEGER NOT NULL DEFAULT 0" },
            ColumnDecl { name: "cache_tokens", definition: "INTEGER NOT NULL DEFAULT 0" },
            ColumnDecl { name: "latency_ms", definition: "INTEGER NOT NULL DEFAULT 0" },
            ColumnDecl { name: "created_ms", definition: "INTEGER NOT NULL DEFAULT 0" },
        ],
    },
    TableDecl {
        name: "season_archives",
        create_body: "season_id TEXT PRIMARY KEY, payload TEXT NOT NULL",
        columns: &[
            ColumnDecl { name: "season_id", definition: "TEXT" },
            ColumnDecl { name: "payload", definition: "TEXT NOT NULL DEFAULT '{}'" },
        ],
    },
    TableDecl {
        name: "bot_state",
        create_body: "key TEXT PRIMARY KEY, value TEXT NOT NULL DEFAULT '', \
                      lease_expires_ms INTEGER NOT NULL DEFAULT 0",
        columns: &[
            ColumnDecl { name: "key", definition: "TEXT" },
            ColumnDecl { name: "value", definition: "TEXT NOT NULL DEFAULT ''" },
            ColumnDecl { name: "lease_expires_ms", definition: "INTEGER NOT NULL DEFAULT 0" },
        ],
    },
];

/// Secondary indexes created after tables.
const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_events_type ON governance_events (season_id, event_type)",
    "CREATE INDEX IF NOT EXISTS idx_events_aggregate ON governance_events (season_id, aggregate_id)",
    "CREATE INDEX IF NOT EXISTS idx_games_round ON game_results (season_id, round)",
    "CREATE INDEX IF NOT EXISTS idx_reports_round ON reports (season_id, round)",
    "CREATE INDEX IF NOT EXISTS idx_schedule_round ON schedule (season_id, round)",
];

// ============================================================================
// SECTION: Creation and Healing
// ============================================================================

/// Creates missing tables and indexes, then reconciles columns.
///
/// # Errors
///
/// Returns [`RepositoryError::Db`] when DDL fails.
pub fn ensure_schema(connection: &Connection) -> Result<(), RepositoryError> {
    for table in TABLES {
        connection
            .execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {} ({});",
                table.name, table.create_body
            ))
            .map_err(|err| RepositoryError::Db(err.to_string()))?;
        heal_columns(connection, table)?;
    }
    for index in INDEXES {
        connection
            .execute_batch(index)
            .map_err(|err| RepositoryError::Db(err.to_string()))?;
    }
    Ok(())
}

/// Adds declared columns missing from the live table.
fn heal_columns(connection: &Connection, table: &TableDecl) -> Result<(), RepositoryError> {
    let mut statement = connection
        .prepare(&format!("PRAGMA table_info({})", table.name))
        .map_err(|err| RepositoryError::Db(err.to_string()))?;
    let existing: Vec<String> = statement
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(|err| RepositoryError::Db(err.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| RepositoryError::Db(err.to_string()))?;
    for column in table.columns {
        if existing.iter().any(|name| name == column.name) {
            continue;
        }
        log::info!("healing schema: adding {}.{}", table.name, column.name);
        connection
            .execute_batch(&format!(
                "ALTER TABLE {} ADD COLUMN {} {};",
                table.name, column.name, column.definition
            ))
            .map_err(|err| RepositoryError::Db(err.to_string()))?;
    }
    Ok(())
}
