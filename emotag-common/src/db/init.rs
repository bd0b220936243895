//! Database initialization
//!
//! Opens (or creates) the shared database and creates the schema
//! idempotently. Several emotag worker processes may point at the same
//! database file; everything here is safe to run concurrently.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use sqlite options to create database if it doesn't exist
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers with one writer; worker processes on
    // the same host share this file
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    // Set busy timeout so short write contention waits instead of erroring
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    // Schema creation (idempotent - safe to call from every process)
    create_processed_sentences_table(&pool).await?;
    create_init_locks_table(&pool).await?;

    Ok(pool)
}

/// Create the processed_sentences table
///
/// One row per normalized sentence ever processed. The primary key on the
/// normalized sentence is the uniqueness constraint the whole cache relies
/// on: two processes racing to insert the same key cannot produce two
/// divergent cached results, the loser's insert simply does not apply.
async fn create_processed_sentences_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS processed_sentences (
            normalised_sentence TEXT PRIMARY KEY,
            processed_sentence TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the init_locks table
///
/// Holds the single well-known row used to serialize one-time engine
/// initialization across processes. `lease_expires_at` (unix seconds)
/// bounds how long a crashed holder can keep the lock stuck.
async fn create_init_locks_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS init_locks (
            id INTEGER PRIMARY KEY,
            locked INTEGER NOT NULL DEFAULT 0,
            lease_expires_at INTEGER
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
