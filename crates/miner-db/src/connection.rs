//! Database connection management.
//!
//! Opens the `SQLx` `SQLite` pool, creating the database file (and its
//! parent directory) when missing.

use crate::error::{DatabaseError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Maximum pooled connections for a file-backed database.
const MAX_CONNECTIONS: u32 = 5;

/// Open a connection pool for the database at `path` (or `:memory:`).
///
/// # Errors
/// Returns `DatabaseError::Open` if the path is not valid UTF-8, the parent
/// directory cannot be created, or the first connection fails.
pub async fn open_pool(path: impl AsRef<Path>) -> Result<Pool<Sqlite>> {
    let path = path.as_ref();
    let path_str = path
        .to_str()
        .ok_or_else(|| DatabaseError::Open("invalid database path: not valid UTF-8".to_string()))?;

    let in_memory = path_str == ":memory:";

    if !in_memory {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
    }

    let connect_options = SqliteConnectOptions::from_str(path_str)
        .map_err(|e| DatabaseError::Open(format!("invalid connection string: {e}")))?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let connect_options = if in_memory {
        connect_options
    } else {
        connect_options.journal_mode(SqliteJournalMode::Wal)
    };

    // Every in-memory connection would otherwise see its own empty database
    let max_connections = if in_memory { 1 } else { MAX_CONNECTIONS };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(connect_options)
        .await
        .map_err(|e| DatabaseError::Open(format!("failed to initialize pool: {e}")))?;

    tracing::info!("Database pool created at {}", path_str);

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory_pool() {
        let pool = open_pool(":memory:").await.expect("open pool");
        let one: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&pool)
            .await
            .expect("query");
        assert_eq!(one, 1);
    }

    #[tokio::test]
    async fn test_open_creates_parent_directory() {
        let tmp = tempfile::TempDir::new().expect("create temp dir");
        let path = tmp.path().join("nested").join("listings.db");

        let pool = open_pool(&path).await.expect("open pool");
        pool.close().await;

        assert!(path.exists());
    }
}
