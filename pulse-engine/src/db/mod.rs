//! Database access for pulse-engine
//!
//! **[VPE-DB-010]** SQLite-backed venue, signal, and score persistence

pub mod settings;
pub mod sqlite_store;

use anyhow::Result;
use sqlx::SqlitePool;
use std::path::Path;

pub use sqlite_store::SqliteStore;

/// Initialize database connection pool
///
/// **[VPE-DB-010]** Connects to pulse.db in the root folder
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the engine's tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS venues (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            rich_telemetry INTEGER NOT NULL DEFAULT 0,
            external_place_id TEXT,
            special_event_until TEXT,
            last_score REAL,
            last_confidence REAL,
            last_source TEXT,
            last_scored_at TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS check_ins (
            id TEXT PRIMARY KEY,
            venue_id TEXT NOT NULL,
            participant_id TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_check_ins_venue_time ON check_ins(venue_id, created_at)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS wait_entries (
            id TEXT PRIMARY KEY,
            venue_id TEXT NOT NULL,
            minutes INTEGER NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ratings (
            id TEXT PRIMARY KEY,
            venue_id TEXT NOT NULL,
            rating INTEGER NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS venue_photos (
            id TEXT PRIMARY KEY,
            venue_id TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS vibe_reports (
            id TEXT PRIMARY KEY,
            venue_id TEXT NOT NULL,
            participant_id TEXT NOT NULL,
            vibe_level TEXT NOT NULL,
            wait_minutes INTEGER,
            crowd_percent INTEGER,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_vibe_reports_venue_time ON vibe_reports(venue_id, created_at)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pings (
            id TEXT PRIMARY KEY,
            venue_id TEXT NOT NULL,
            device_id TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_pings_venue_time ON pings(venue_id, created_at)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS social_signals (
            id TEXT PRIMARY KEY,
            venue_id TEXT NOT NULL,
            platform TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS score_history (
            id TEXT PRIMARY KEY,
            venue_id TEXT NOT NULL,
            value REAL NOT NULL,
            confidence REAL NOT NULL,
            source TEXT NOT NULL,
            breakdown TEXT,
            computed_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_score_history_venue ON score_history(venue_id, computed_at)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized");

    Ok(())
}
