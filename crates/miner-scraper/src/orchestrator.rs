//! Scrape job orchestration.
//!
//! Turns a [`ScrapeRequest`] into a tracked job: the request is validated and
//! its source resolved before anything is written, then a `scrape_jobs` row
//! records progress while the crawl runs and its records are reconciled into
//! the listing store.

use crate::error::{Result, ScrapeError};
use crate::registry::SourceRegistry;
use crate::source::ListingSource;
use miner_db::listings;
use miner_db::scrape_jobs::{self, JobCounts, ScrapeJob};
use miner_db::Database;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Parameters of one scrape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeRequest {
    /// Registered source name
    pub source: String,
    /// Listing kind path segment, e.g. `venda` or `aluguel`
    pub kind: String,
    /// Region code, e.g. `sp`
    pub region: String,
    /// First results page, 1-based
    pub start_page: u32,
    /// Number of results pages to crawl
    pub max_pages: u32,
}

impl ScrapeRequest {
    /// Request for the first three pages of a kind and region.
    pub fn new(
        source: impl Into<String>,
        kind: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            kind: kind.into(),
            region: region.into(),
            start_page: 1,
            max_pages: 3,
        }
    }

    /// Check the request before any job is created.
    pub fn validate(&self) -> Result<()> {
        if self.start_page == 0 {
            return Err(ScrapeError::InvalidRequest(
                "start_page must be at least 1".to_string(),
            ));
        }
        if self.max_pages == 0 {
            return Err(ScrapeError::InvalidRequest(
                "max_pages must be at least 1".to_string(),
            ));
        }
        if self.start_page.checked_add(self.max_pages).is_none() {
            return Err(ScrapeError::InvalidRequest(format!(
                "page range {}+{} is out of bounds",
                self.start_page, self.max_pages
            )));
        }
        validate_segment("kind", &self.kind)?;
        if !listings::KIND_LEN.contains(&self.kind.chars().count()) {
            return Err(ScrapeError::InvalidRequest(format!(
                "kind must be {} to {} characters, got '{}'",
                listings::KIND_LEN.start(),
                listings::KIND_LEN.end(),
                self.kind
            )));
        }
        validate_segment("region", &self.region)
    }
}

/// `kind` and `region` end up as URL path segments.
fn validate_segment(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ScrapeError::InvalidRequest(format!("{field} must not be empty")));
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ScrapeError::InvalidRequest(format!(
            "{field} may only contain letters, digits and hyphens, got '{value}'"
        )));
    }
    Ok(())
}

/// A scrape job running in the background.
#[derive(Debug)]
pub struct ScrapeHandle {
    job_id: String,
    task: JoinHandle<Result<JobCounts>>,
}

impl ScrapeHandle {
    /// Id of the job row tracking this scrape.
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Wait for the job task to finish, whatever state its row was left in.
    pub async fn wait(self) -> Result<JobCounts> {
        self.task
            .await
            .map_err(|e| ScrapeError::CrawlFailed(format!("scrape task failed: {e}")))?
    }
}

/// Runs scrape jobs against registered sources.
pub struct ScrapeOrchestrator {
    registry: Arc<SourceRegistry>,
    db: Arc<Database>,
}

impl ScrapeOrchestrator {
    /// Create an orchestrator over a source registry and the listing store.
    pub fn new(registry: Arc<SourceRegistry>, db: Arc<Database>) -> Self {
        Self { registry, db }
    }

    /// Sources this orchestrator can scrape.
    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Start a scrape in the background.
    ///
    /// Invalid requests and unknown sources are rejected before a job row is
    /// created. Poll [`Self::job_status`] for progress, or wait on the
    /// returned handle.
    pub async fn start_scrape(&self, request: ScrapeRequest) -> Result<ScrapeHandle> {
        let (source, job) = self.prepare(&request).await?;
        let job_id = job.id.clone();
        let db = Arc::clone(&self.db);

        let task = tokio::spawn(async move {
            let result = execute(source, db, job.id.clone(), request).await;
            if let Err(e) = &result {
                tracing::error!(job_id = %job.id, "scrape job failed: {}", e);
            }
            result
        });

        Ok(ScrapeHandle { job_id, task })
    }

    /// Run a scrape to completion and return the finished job.
    pub async fn run_scrape(&self, request: ScrapeRequest) -> Result<ScrapeJob> {
        let (source, job) = self.prepare(&request).await?;
        execute(source, Arc::clone(&self.db), job.id.clone(), request).await?;
        self.job_status(&job.id).await
    }

    /// Current state of a scrape job.
    pub async fn job_status(&self, job_id: &str) -> Result<ScrapeJob> {
        scrape_jobs::get_scrape_job(self.db.pool(), job_id)
            .await?
            .ok_or_else(|| ScrapeError::JobNotFound(job_id.to_string()))
    }

    async fn prepare(
        &self,
        request: &ScrapeRequest,
    ) -> Result<(Arc<dyn ListingSource>, ScrapeJob)> {
        request.validate()?;
        let source = self.registry.get(&request.source)?;

        let job = scrape_jobs::create_scrape_job(
            self.db.pool(),
            source.name().to_string(),
            request.kind.clone(),
            request.region.clone(),
            request.start_page,
            request.max_pages,
        )
        .await?;

        tracing::info!(
            job_id = %job.id,
            source = %source.name(),
            kind = %request.kind,
            region = %request.region,
            start_page = request.start_page,
            pages = request.max_pages,
            "created scrape job"
        );

        Ok((source, job))
    }
}

/// Crawl, reconcile and close out one job.
async fn execute(
    source: Arc<dyn ListingSource>,
    db: Arc<Database>,
    job_id: String,
    request: ScrapeRequest,
) -> Result<JobCounts> {
    // A panicking crawl fails the job instead of leaving it InProgress
    let crawl = tokio::spawn(async move {
        source
            .crawl(
                &request.kind,
                &request.region,
                request.start_page,
                request.max_pages,
            )
            .await
    });

    let outcome = match crawl.await {
        Ok(outcome) => outcome,
        Err(e) => {
            let message = format!("crawl task failed: {e}");
            scrape_jobs::fail_scrape_job(db.pool(), &job_id, &message).await?;
            return Err(ScrapeError::CrawlFailed(message));
        }
    };

    let summary = listings::upsert_batch(db.pool(), &outcome.records).await;
    let counts = JobCounts {
        found: u32::try_from(outcome.records.len()).unwrap_or(u32::MAX),
        saved: summary.saved,
        failed: summary.failed,
    };

    if let Err(e) = scrape_jobs::complete_scrape_job(db.pool(), &job_id, counts).await {
        let message = format!("failed to record job completion: {e}");
        if let Err(fail_err) = scrape_jobs::fail_scrape_job(db.pool(), &job_id, &message).await {
            tracing::error!(job_id = %job_id, "failed to mark job as failed: {}", fail_err);
        }
        return Err(e.into());
    }

    tracing::info!(
        job_id = %job_id,
        found = counts.found,
        saved = counts.saved,
        failed = counts.failed,
        pages_failed = outcome.pages_failed(),
        "scrape job completed"
    );

    Ok(counts)
}
