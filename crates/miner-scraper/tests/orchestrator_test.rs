mod common;

use common::StubFetcher;
use miner_browser::PageFetcher;
use miner_db::scrape_jobs::{self, ScrapeJobStatus};
use miner_db::{listings, Database};
use miner_scraper::{
    CrawlSettings, ScrapeError, ScrapeOrchestrator, ScrapeRequest, SourceRegistry,
};
use std::sync::Arc;
use std::time::Duration;

async fn setup_test_db() -> Arc<Database> {
    let db = Database::new(":memory:").await.expect("create database");
    db.run_migrations().await.expect("run migrations");
    Arc::new(db)
}

fn orchestrator(fetcher: Arc<StubFetcher>, db: Arc<Database>) -> ScrapeOrchestrator {
    let registry = SourceRegistry::with_defaults(
        fetcher as Arc<dyn PageFetcher>,
        CrawlSettings {
            workers: 2,
            delay_between_pages: Duration::ZERO,
        },
    )
    .expect("build registry");
    ScrapeOrchestrator::new(Arc::new(registry), db)
}

#[tokio::test]
async fn test_unknown_source_rejected_without_job() {
    let fetcher = Arc::new(StubFetcher::new());
    let db = setup_test_db().await;
    let orchestrator = orchestrator(Arc::clone(&fetcher), Arc::clone(&db));

    let result = orchestrator
        .start_scrape(ScrapeRequest::new("zap", "venda", "sp"))
        .await;

    assert!(matches!(result, Err(ScrapeError::UnknownSource(ref name)) if name == "zap"));
    let jobs = scrape_jobs::list_scrape_jobs(db.pool(), 10)
        .await
        .expect("list jobs");
    assert!(jobs.is_empty());
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn test_invalid_request_rejected_without_job() {
    let fetcher = Arc::new(StubFetcher::new());
    let db = setup_test_db().await;
    let orchestrator = orchestrator(Arc::clone(&fetcher), Arc::clone(&db));

    let request = ScrapeRequest {
        max_pages: 0,
        ..ScrapeRequest::new("olx", "venda", "sp")
    };
    let result = orchestrator.run_scrape(request).await;

    assert!(matches!(result, Err(ScrapeError::InvalidRequest(_))));
    assert!(scrape_jobs::list_scrape_jobs(db.pool(), 10)
        .await
        .expect("list jobs")
        .is_empty());
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn test_run_scrape_completes_job() {
    let fetcher = Arc::new(StubFetcher::new().failing_on(2));
    let db = setup_test_db().await;
    let orchestrator = orchestrator(fetcher, Arc::clone(&db));

    let job = orchestrator
        .run_scrape(ScrapeRequest::new("OLX", "venda", "sp"))
        .await
        .expect("run scrape");

    assert_eq!(job.status, ScrapeJobStatus::Completed);
    assert_eq!(job.source, "olx");
    assert_eq!(job.records_found, 4);
    assert_eq!(job.records_saved, 4);
    assert_eq!(job.records_failed, 0);
    assert!(job.completed_at.is_some());
    assert_eq!(listings::count(db.pool()).await.expect("count"), 4);
}

#[tokio::test]
async fn test_rescrape_converges() {
    let fetcher = Arc::new(StubFetcher::new());
    let db = setup_test_db().await;
    let orchestrator = orchestrator(fetcher, Arc::clone(&db));

    for _ in 0..2 {
        orchestrator
            .run_scrape(ScrapeRequest::new("olx", "venda", "sp"))
            .await
            .expect("run scrape");
    }

    // Same natural keys both times, so rows are updated rather than duplicated
    assert_eq!(listings::count(db.pool()).await.expect("count"), 6);
}

#[tokio::test]
async fn test_background_job_is_queryable() {
    let fetcher = Arc::new(StubFetcher::new().with_latency(Duration::from_millis(10)));
    let db = setup_test_db().await;
    let orchestrator = orchestrator(fetcher, Arc::clone(&db));

    let handle = orchestrator
        .start_scrape(ScrapeRequest::new("olx", "aluguel", "rj"))
        .await
        .expect("start scrape");
    let job_id = handle.job_id().to_string();

    let mut job = orchestrator.job_status(&job_id).await.expect("job status");
    for _ in 0..200 {
        if job.status != ScrapeJobStatus::InProgress {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        job = orchestrator.job_status(&job_id).await.expect("job status");
    }

    assert_eq!(job.status, ScrapeJobStatus::Completed);
    assert_eq!(job.kind, "aluguel");
    assert_eq!(job.region, "rj");
    assert_eq!(job.records_saved, 6);

    let counts = handle.wait().await.expect("job result");
    assert_eq!(counts.saved, 6);
}

#[tokio::test]
async fn test_completion_failure_marks_job_failed() {
    let db = setup_test_db().await;
    sqlx::query(
        "CREATE TRIGGER reject_completion BEFORE UPDATE ON scrape_jobs
         WHEN NEW.status = 'Completed'
         BEGIN SELECT RAISE(ABORT, 'completion rejected'); END",
    )
    .execute(db.pool())
    .await
    .expect("create trigger");
    let orchestrator = orchestrator(Arc::new(StubFetcher::new()), Arc::clone(&db));

    let result = orchestrator
        .run_scrape(ScrapeRequest::new("olx", "venda", "sp"))
        .await;
    assert!(result.is_err());

    let jobs = scrape_jobs::list_scrape_jobs(db.pool(), 10)
        .await
        .expect("list jobs");
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].status, ScrapeJobStatus::Failed);
    assert!(jobs[0]
        .error_message
        .as_deref()
        .is_some_and(|m| m.contains("completion rejected")));
}

#[tokio::test]
async fn test_background_job_finishes_when_job_row_is_stuck() {
    let db = setup_test_db().await;
    sqlx::query(
        "CREATE TRIGGER freeze_jobs BEFORE UPDATE ON scrape_jobs
         BEGIN SELECT RAISE(ABORT, 'jobs are read-only'); END",
    )
    .execute(db.pool())
    .await
    .expect("create trigger");
    let orchestrator = orchestrator(Arc::new(StubFetcher::new()), Arc::clone(&db));

    let handle = orchestrator
        .start_scrape(ScrapeRequest::new("olx", "venda", "sp"))
        .await
        .expect("start scrape");
    let job_id = handle.job_id().to_string();

    let result = tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .expect("job task finishes");
    assert!(result.is_err());

    // Neither completion nor failure could be recorded
    let job = orchestrator.job_status(&job_id).await.expect("job status");
    assert_eq!(job.status, ScrapeJobStatus::InProgress);
}

#[tokio::test]
async fn test_job_not_found() {
    let db = setup_test_db().await;
    let orchestrator = orchestrator(Arc::new(StubFetcher::new()), db);

    assert!(matches!(
        orchestrator.job_status("missing").await,
        Err(ScrapeError::JobNotFound(_))
    ));
}
