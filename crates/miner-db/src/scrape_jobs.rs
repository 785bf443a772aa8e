use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// A background scrape run and its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeJob {
    /// Unique identifier for the job (UUID v4)
    pub id: String,
    /// Registered source name
    pub source: String,
    /// Listing kind requested
    pub kind: String,
    /// Region code requested
    pub region: String,
    /// First page index crawled
    pub start_page: u32,
    /// Number of pages crawled
    pub page_count: u32,
    /// Current status of the job
    pub status: ScrapeJobStatus,
    /// When the job started
    pub started_at: DateTime<Utc>,
    /// When the job finished (if finished)
    pub completed_at: Option<DateTime<Utc>>,
    /// Records extracted across all pages
    pub records_found: u32,
    /// Records reconciled into the store
    pub records_saved: u32,
    /// Records rejected while reconciling
    pub records_failed: u32,
    /// Error message if the job failed
    pub error_message: Option<String>,
}

/// Status of a scrape job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScrapeJobStatus {
    /// Crawl or reconciliation still running
    InProgress,
    /// Finished; counts are final
    Completed,
    /// Aborted with an error
    Failed,
}

impl std::fmt::Display for ScrapeJobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InProgress => write!(f, "InProgress"),
            Self::Completed => write!(f, "Completed"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

impl ScrapeJobStatus {
    /// Parse from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "InProgress" => Some(Self::InProgress),
            "Completed" => Some(Self::Completed),
            "Failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Final record counts written when a job completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobCounts {
    /// Records extracted
    pub found: u32,
    /// Records saved
    pub saved: u32,
    /// Records rejected
    pub failed: u32,
}

/// Create a new scrape job in the `InProgress` state.
///
/// # Errors
/// Returns an error if the database operation fails.
pub async fn create_scrape_job(
    pool: &SqlitePool,
    source: String,
    kind: String,
    region: String,
    start_page: u32,
    page_count: u32,
) -> Result<ScrapeJob, sqlx::Error> {
    let id = uuid::Uuid::new_v4().to_string();
    let started_at = Utc::now();
    let status = ScrapeJobStatus::InProgress;

    sqlx::query(
        "INSERT INTO scrape_jobs (id, source, kind, region, start_page, page_count, status, started_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&source)
    .bind(&kind)
    .bind(&region)
    .bind(i64::from(start_page))
    .bind(i64::from(page_count))
    .bind(status.to_string())
    .bind(started_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(ScrapeJob {
        id,
        source,
        kind,
        region,
        start_page,
        page_count,
        status,
        started_at,
        completed_at: None,
        records_found: 0,
        records_saved: 0,
        records_failed: 0,
        error_message: None,
    })
}

/// Mark a job as completed with its final counts.
///
/// # Errors
/// Returns an error if the database update fails.
pub async fn complete_scrape_job(
    pool: &SqlitePool,
    job_id: &str,
    counts: JobCounts,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE scrape_jobs
         SET status = ?, completed_at = ?, records_found = ?, records_saved = ?, records_failed = ?
         WHERE id = ?",
    )
    .bind(ScrapeJobStatus::Completed.to_string())
    .bind(Utc::now().to_rfc3339())
    .bind(i64::from(counts.found))
    .bind(i64::from(counts.saved))
    .bind(i64::from(counts.failed))
    .bind(job_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Mark a job as failed.
///
/// # Errors
/// Returns an error if the database update fails.
pub async fn fail_scrape_job(
    pool: &SqlitePool,
    job_id: &str,
    error_message: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE scrape_jobs SET status = ?, completed_at = ?, error_message = ? WHERE id = ?",
    )
    .bind(ScrapeJobStatus::Failed.to_string())
    .bind(Utc::now().to_rfc3339())
    .bind(error_message)
    .bind(job_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a scrape job by id.
///
/// # Errors
/// Returns an error if the query fails or a stored value cannot be decoded.
pub async fn get_scrape_job(
    pool: &SqlitePool,
    job_id: &str,
) -> Result<Option<ScrapeJob>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT id, source, kind, region, start_page, page_count, status, started_at,
                completed_at, records_found, records_saved, records_failed, error_message
         FROM scrape_jobs WHERE id = ?",
    )
    .bind(job_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(job_from_row).transpose()
}

/// Most recent jobs first.
///
/// # Errors
/// Returns an error if the query fails or a stored value cannot be decoded.
pub async fn list_scrape_jobs(
    pool: &SqlitePool,
    limit: u32,
) -> Result<Vec<ScrapeJob>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT id, source, kind, region, start_page, page_count, status, started_at,
                completed_at, records_found, records_saved, records_failed, error_message
         FROM scrape_jobs ORDER BY started_at DESC LIMIT ?",
    )
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;

    rows.iter().map(job_from_row).collect()
}

fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(e),
        })
}

fn job_from_row(row: &SqliteRow) -> Result<ScrapeJob, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let status = ScrapeJobStatus::parse(&status).ok_or_else(|| sqlx::Error::ColumnDecode {
        index: "status".to_string(),
        source: format!("unknown scrape job status '{status}'").into(),
    })?;

    let started_at: String = row.try_get("started_at")?;
    let completed_at: Option<String> = row.try_get("completed_at")?;

    Ok(ScrapeJob {
        id: row.try_get("id")?,
        source: row.try_get("source")?,
        kind: row.try_get("kind")?,
        region: row.try_get("region")?,
        start_page: row.try_get("start_page")?,
        page_count: row.try_get("page_count")?,
        status,
        started_at: parse_timestamp("started_at", &started_at)?,
        completed_at: completed_at
            .as_deref()
            .map(|value| parse_timestamp("completed_at", value))
            .transpose()?,
        records_found: row.try_get("records_found")?,
        records_saved: row.try_get("records_saved")?,
        records_failed: row.try_get("records_failed")?,
        error_message: row.try_get("error_message")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn setup_test_db() -> Database {
        let db = Database::new(":memory:").await.expect("create test database");
        db.run_migrations().await.expect("run migrations");
        db
    }

    async fn create_job(db: &Database) -> ScrapeJob {
        create_scrape_job(
            db.pool(),
            "olx".to_string(),
            "venda".to_string(),
            "sp".to_string(),
            1,
            3,
        )
        .await
        .expect("create scrape job")
    }

    #[tokio::test]
    async fn test_create_scrape_job() {
        let db = setup_test_db().await;
        let job = create_job(&db).await;

        assert_eq!(job.source, "olx");
        assert_eq!(job.page_count, 3);
        assert_eq!(job.status, ScrapeJobStatus::InProgress);

        let fetched = get_scrape_job(db.pool(), &job.id)
            .await
            .expect("get job")
            .expect("job exists");
        assert_eq!(fetched.id, job.id);
        assert_eq!(fetched.status, ScrapeJobStatus::InProgress);
        assert!(fetched.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_complete_scrape_job() {
        let db = setup_test_db().await;
        let job = create_job(&db).await;

        complete_scrape_job(
            db.pool(),
            &job.id,
            JobCounts {
                found: 40,
                saved: 38,
                failed: 2,
            },
        )
        .await
        .expect("complete job");

        let fetched = get_scrape_job(db.pool(), &job.id)
            .await
            .expect("get job")
            .expect("job exists");
        assert_eq!(fetched.status, ScrapeJobStatus::Completed);
        assert_eq!(fetched.records_found, 40);
        assert_eq!(fetched.records_saved, 38);
        assert_eq!(fetched.records_failed, 2);
        assert!(fetched.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_fail_scrape_job() {
        let db = setup_test_db().await;
        let job = create_job(&db).await;

        fail_scrape_job(db.pool(), &job.id, "crawl task panicked")
            .await
            .expect("fail job");

        let fetched = get_scrape_job(db.pool(), &job.id)
            .await
            .expect("get job")
            .expect("job exists");
        assert_eq!(fetched.status, ScrapeJobStatus::Failed);
        assert_eq!(fetched.error_message.as_deref(), Some("crawl task panicked"));
    }

    #[tokio::test]
    async fn test_get_missing_job() {
        let db = setup_test_db().await;
        assert!(get_scrape_job(db.pool(), "missing")
            .await
            .expect("query")
            .is_none());
    }

    #[tokio::test]
    async fn test_list_scrape_jobs() {
        let db = setup_test_db().await;
        create_job(&db).await;
        create_job(&db).await;

        let jobs = list_scrape_jobs(db.pool(), 10).await.expect("list jobs");
        assert_eq!(jobs.len(), 2);
        assert!(jobs[0].started_at >= jobs[1].started_at);
    }
}
