//! Miner Database Layer
//!
//! Provides `SQLite` storage for scraped listings and scrape jobs.
//! Uses `SQLx` with embedded migrations.
//!
//! # Architecture
//!
//! - **Listings**: one row per natural key, reconciled with single-statement upserts
//! - **Scrape jobs**: status and counts of background scrape runs
//! - **Migrations**: SQL migrations are embedded and versioned using `SQLx`
//! - **Connection Pooling**: up to 5 connections for file-backed databases
//!
//! # Example
//!
//! ```ignore
//! use miner_db::{listings, Database};
//!
//! let db = Database::new("listings.db").await?;
//! db.run_migrations().await?;
//! let total = listings::count(db.pool()).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod connection;
pub mod error;
pub mod listings;
pub mod migrations;
/// Scrape job management for tracking background scrape runs.
pub mod scrape_jobs;

// Re-export commonly used types
pub use error::{DatabaseError, Result};
pub use listings::{SearchParams, StoredListing, UpsertSummary};
pub use scrape_jobs::{JobCounts, ScrapeJob, ScrapeJobStatus};

use sqlx::{Pool, Sqlite};
use std::path::Path;

/// High-level database interface with migrations.
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open (creating if missing) the database at `path`, or `:memory:`.
    ///
    /// # Errors
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let pool = connection::open_pool(path).await?;
        Ok(Self { pool })
    }

    /// Run all pending database migrations.
    ///
    /// # Errors
    /// Returns `DatabaseError::Migration` if any migration fails.
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Get the current schema version.
    pub async fn get_schema_version(&self) -> Result<i64> {
        migrations::get_schema_version(&self.pool).await
    }

    /// Get a reference to the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Close the database connection gracefully.
    pub async fn close(self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }
}
