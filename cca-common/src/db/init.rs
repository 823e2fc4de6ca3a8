//! Database initialization
//!
//! Creates the SQLite file on first run and applies the schema. All table
//! creation is idempotent, so opening an existing database is safe.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create every table used by the analysis service
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_settings_table(pool).await?;
    create_calls_table(pool).await?;
    create_findings_table(pool).await?;
    Ok(())
}

/// Create the settings table
///
/// Stores configuration key-value pairs (e.g. `llm_api_key`).
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the calls_input table
///
/// One row per call transcript. Rows are created by ingestion and only their
/// `status` changes afterwards.
pub async fn create_calls_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS calls_input (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            call_id TEXT NOT NULL UNIQUE,
            transcript TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'processed', 'processed_no_segment', 'failed', 'failed_writing_db')),
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_calls_input_status ON calls_input(status)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the compliance_findings table
///
/// Append-only; at most one finding per (call, segment index).
pub async fn create_findings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS compliance_findings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            input_call_id INTEGER NOT NULL REFERENCES calls_input(id),
            segment_index INTEGER NOT NULL CHECK (segment_index >= 1),
            customer_query TEXT NOT NULL,
            agent_response TEXT NOT NULL,
            search_query TEXT NOT NULL,
            rag_context TEXT NOT NULL,
            violation_detected INTEGER NOT NULL,
            omission_detected INTEGER NOT NULL,
            analysis TEXT NOT NULL,
            suggestion TEXT,
            processed_at TEXT NOT NULL,
            UNIQUE (input_call_id, segment_index)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_compliance_findings_call ON compliance_findings(input_call_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
