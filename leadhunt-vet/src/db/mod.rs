//! Database access for leadhunt-vet
//!
//! SQLite via sqlx. The join correlation table is deliberately durable
//! rather than in-process: handler instances are not guaranteed to be
//! singletons or long-lived, so all join state mutations go through
//! conditional SQL updates.

pub mod corrections;
pub mod decisions;
pub mod review;

use anyhow::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
///
/// Connects to leadhunt.db in the root folder, creating it if missing.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the leadhunt-vet tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    // Join coordinator correlation table. One row per in-flight candidate;
    // dispatched rows double as short-lived dedup records.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS join_state (
            identity_key TEXT PRIMARY KEY,
            analysis TEXT NOT NULL,
            verification TEXT,
            internal_qc TEXT,
            state TEXT NOT NULL DEFAULT 'awaiting_both',
            timed_out INTEGER NOT NULL DEFAULT 0,
            fan_out_started_at TEXT NOT NULL,
            dispatched_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Decided records, upserted by identity key so redelivered dispatches
    // cannot produce a second decision side effect.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS final_records (
            identity_key TEXT PRIMARY KEY,
            decision TEXT NOT NULL,
            record TEXT NOT NULL,
            decided_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Durable manual review queue. identity_key is unique so reprocessing a
    // source URL cannot queue the same candidate twice; entry_id is the
    // stable human-facing reference.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS manual_review_queue (
            entry_id TEXT PRIMARY KEY,
            identity_key TEXT NOT NULL UNIQUE,
            record TEXT NOT NULL,
            queued_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Append-only corrections dataset for future model fine-tuning
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS corrections (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            entry_id TEXT NOT NULL,
            corrected TEXT NOT NULL,
            submitted_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!(
        "Database tables initialized (join_state, final_records, manual_review_queue, corrections)"
    );

    Ok(())
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
    init_tables(&pool).await.unwrap();
    pool
}
