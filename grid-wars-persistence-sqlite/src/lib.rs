use std::str::FromStr;

use chrono::{DateTime, Utc};
use grid_wars_domain::{ServiceError, ServiceResult};
use sqlx::{
    Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use uuid::Uuid;

pub mod accounts;
pub mod games;

pub async fn create_db_pool(database_url: &str) -> ServiceResult<Pool<Sqlite>> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(db_err)?
        .create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(db_err)
}

/// Creates the tables if needed. The UNIQUE email constraint and the game
/// check constraints are the authoritative guards behind the
/// application-level pre-checks.
pub async fn init_schema(pool: &Pool<Sqlite>) -> ServiceResult<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await.map_err(db_err)?;
    }
    Ok(())
}

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS accounts (
        id TEXT PRIMARY KEY,
        username TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        profile_image TEXT,
        wins INTEGER NOT NULL DEFAULT 0,
        losses INTEGER NOT NULL DEFAULT 0,
        draws INTEGER NOT NULL DEFAULT 0,
        total_games INTEGER NOT NULL DEFAULT 0,
        level INTEGER NOT NULL DEFAULT 1,
        streak_days INTEGER NOT NULL DEFAULT 0,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS games (
        id TEXT PRIMARY KEY,
        player1_id TEXT NOT NULL,
        player2_id TEXT,
        winner_id TEXT,
        game_status TEXT NOT NULL DEFAULT 'waiting',
        current_turn TEXT NOT NULL DEFAULT 'X',
        player1_symbol TEXT NOT NULL DEFAULT 'X',
        player2_symbol TEXT NOT NULL DEFAULT 'O',
        game_mode TEXT NOT NULL DEFAULT 'pvp',
        difficulty TEXT,
        result_type TEXT,
        started_at TEXT,
        completed_at TEXT,
        created_at TEXT NOT NULL,
        CHECK (player1_id <> player2_id),
        CHECK (player1_symbol <> player2_symbol)
    )",
    "CREATE TABLE IF NOT EXISTS game_moves (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        game_id TEXT NOT NULL,
        player_id TEXT NOT NULL,
        position INTEGER NOT NULL CHECK (position >= 0 AND position <= 8),
        symbol TEXT NOT NULL,
        move_number INTEGER NOT NULL CHECK (move_number > 0 AND move_number <= 9),
        created_at TEXT NOT NULL,
        UNIQUE (game_id, position),
        UNIQUE (game_id, move_number)
    )",
];

pub(crate) fn db_err(e: sqlx::Error) -> ServiceError {
    ServiceError::Internal(e.to_string())
}

pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.message().contains("UNIQUE constraint failed"))
}

pub(crate) fn parse_uuid(s: &str) -> ServiceResult<Uuid> {
    Uuid::parse_str(s).map_err(|e| ServiceError::Internal(format!("Invalid uuid in row: {}", e)))
}

pub(crate) fn parse_timestamp(s: &str) -> ServiceResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ServiceError::Internal(format!("Invalid timestamp in row: {}", e)))
}

#[cfg(test)]
pub(crate) fn temp_db_url() -> String {
    let path = std::env::temp_dir().join(format!("grid-wars-test-{}.db", Uuid::new_v4()));
    format!("sqlite://{}", path.display())
}
