use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Executor, SqlitePool};
use tracing::info;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS applications (
    application_id    TEXT PRIMARY KEY,
    company           TEXT NOT NULL,
    position          TEXT NOT NULL,
    url               TEXT NOT NULL,
    status            TEXT NOT NULL,
    submitted_date    TEXT NOT NULL,
    last_updated      TEXT NOT NULL,
    notes             TEXT NOT NULL DEFAULT '',
    resume_used       TEXT NOT NULL DEFAULT '',
    cover_letter_used TEXT NOT NULL DEFAULT '',
    filled_fields     INTEGER NOT NULL DEFAULT 0,
    unfilled_fields   INTEGER NOT NULL DEFAULT 0,
    errors            TEXT NOT NULL DEFAULT ''
);
CREATE INDEX IF NOT EXISTS idx_applications_status ON applications (status);
"#;

/// Creates a SQLite connection pool, creating the database file if needed.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    info!("Connecting to SQLite at {database_url}...");

    if let Some(parent) = database_file(database_url).and_then(Path::parent) {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    info!("SQLite connection pool established");
    Ok(pool)
}

/// Creates the tracker tables. Safe to run on every start.
pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    pool.execute(SCHEMA).await?;
    Ok(())
}

/// File path of a `sqlite://` URL; `None` for in-memory databases.
fn database_file(database_url: &str) -> Option<&Path> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or(rest);
    (!path.is_empty() && path != ":memory:").then(|| Path::new(path))
}

/// Single-connection in-memory database with the schema applied.
#[cfg(test)]
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    migrate(&pool).await.unwrap();
    pool
}
