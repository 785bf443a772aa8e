use crate::state::AppState;
use anyhow::{Context, Result};
use miner_db::scrape_jobs::{self, ScrapeJob};
use miner_scraper::{ScrapeHandle, ScrapeOrchestrator, ScrapeRequest};
use tracing::info;

/// Run a scrape to completion in the foreground.
pub async fn scrape_and_wait(state: &AppState, request: ScrapeRequest) -> Result<ScrapeJob> {
    let job = state.orchestrator()?.run_scrape(request).await?;
    Ok(job)
}

/// Start a scrape job without waiting for it.
pub async fn start_scrape(
    orchestrator: &ScrapeOrchestrator,
    request: ScrapeRequest,
) -> Result<ScrapeHandle> {
    let handle = orchestrator.start_scrape(request).await?;
    info!(job_id = %handle.job_id(), "scrape job started");
    Ok(handle)
}

/// Wait for a started job's task to finish, then read back its row.
pub async fn follow_job(
    orchestrator: &ScrapeOrchestrator,
    handle: ScrapeHandle,
) -> Result<ScrapeJob> {
    let job_id = handle.job_id().to_string();
    handle
        .wait()
        .await
        .with_context(|| format!("scrape job {job_id} failed"))?;
    Ok(orchestrator.job_status(&job_id).await?)
}

pub async fn get_job(state: &AppState, job_id: &str) -> Result<ScrapeJob> {
    scrape_jobs::get_scrape_job(state.db.pool(), job_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("scrape job not found: {job_id}"))
}

pub async fn list_jobs(state: &AppState, limit: u32) -> Result<Vec<ScrapeJob>> {
    Ok(scrape_jobs::list_scrape_jobs(state.db.pool(), limit).await?)
}

/// Names of the registered sources.
pub fn sources(state: &AppState) -> Result<Vec<String>> {
    Ok(state
        .registry()?
        .names()
        .into_iter()
        .map(|name| name.to_string())
        .collect())
}
