//! Bounded pool of page workers.
//!
//! A crawl turns a page range into a queue of URLs shared by at most
//! `workers` tasks. Each worker pops the next URL, scrapes it and sends the
//! page's records back over a channel, so results are merged in completion
//! order. A page that fails to fetch or panics mid-scrape is reported as
//! unfetched and the worker moves on to the next URL.

use crate::page::{PageReport, PageScraper};
use futures_util::FutureExt;
use miner_core::{ListingRecord, ScrapingConfig};
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Pool sizing and pacing for a crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlSettings {
    /// Upper bound on concurrent page workers
    pub workers: usize,
    /// Pause a worker takes before picking its next page
    pub delay_between_pages: Duration,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self::from(&ScrapingConfig::default())
    }
}

impl From<&ScrapingConfig> for CrawlSettings {
    fn from(config: &ScrapingConfig) -> Self {
        Self {
            workers: config.workers,
            delay_between_pages: Duration::from_millis(config.delay_between_pages_ms),
        }
    }
}

/// Everything a crawl produced.
#[derive(Debug, Clone, Default)]
pub struct CrawlOutcome {
    /// Records from every page, in page completion order
    pub records: Vec<ListingRecord>,
    /// One report per page, in completion order
    pub pages: Vec<PageReport>,
}

impl CrawlOutcome {
    /// Pages that could not be fetched or panicked while scraping
    pub fn pages_failed(&self) -> usize {
        self.pages.iter().filter(|p| !p.fetched).count()
    }

    /// Cards discarded during extraction across all pages
    pub fn cards_skipped(&self) -> usize {
        self.pages.iter().map(|p| p.skipped).sum()
    }
}

struct PageResult {
    page: u32,
    records: Vec<ListingRecord>,
    report: PageReport,
}

type PageQueue = Arc<Mutex<VecDeque<(u32, String)>>>;

/// Crawls page ranges with a bounded number of concurrent workers.
pub struct ConcurrentCrawler {
    scraper: Arc<PageScraper>,
    settings: CrawlSettings,
}

impl ConcurrentCrawler {
    /// Crawler scraping pages through `scraper`.
    pub fn new(scraper: Arc<PageScraper>, settings: CrawlSettings) -> Self {
        Self { scraper, settings }
    }

    /// Pool sizing and pacing in use.
    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    /// Number of workers spawned for `page_count` pages.
    pub fn pool_size(&self, page_count: u32) -> usize {
        let pages = usize::try_from(page_count).unwrap_or(usize::MAX);
        self.settings.workers.max(1).min(pages)
    }

    /// Scrape pages `start_page..start_page + page_count`, building each URL
    /// with `page_url`.
    pub async fn crawl<F>(
        &self,
        kind: &str,
        start_page: u32,
        page_count: u32,
        page_url: F,
    ) -> CrawlOutcome
    where
        F: Fn(u32) -> String,
    {
        let end_page = start_page.saturating_add(page_count);
        let pages: VecDeque<(u32, String)> =
            (start_page..end_page).map(|page| (page, page_url(page))).collect();
        let page_total = pages.len();

        if pages.is_empty() {
            return CrawlOutcome::default();
        }

        let pool_size = self.pool_size(page_count);
        info!(
            kind,
            start_page,
            pages = page_total,
            workers = pool_size,
            "starting crawl"
        );

        let queue: PageQueue = Arc::new(Mutex::new(pages));
        let (tx, mut rx) = mpsc::channel::<PageResult>(pool_size);
        let mut workers = JoinSet::new();

        for worker in 0..pool_size {
            workers.spawn(run_worker(
                worker,
                Arc::clone(&queue),
                Arc::clone(&self.scraper),
                tx.clone(),
                kind.to_string(),
                self.settings.delay_between_pages,
            ));
        }
        // Workers hold the only senders, so the channel closes once they all exit
        drop(tx);

        let mut outcome = CrawlOutcome::default();
        while let Some(result) = rx.recv().await {
            debug!(
                page = result.page,
                records = result.records.len(),
                "page finished"
            );
            outcome.records.extend(result.records);
            outcome.pages.push(result.report);
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                if e.is_panic() {
                    error!("crawl worker panicked: {}", e);
                } else {
                    warn!("crawl worker cancelled: {}", e);
                }
            }
        }

        let lost = page_total.saturating_sub(outcome.pages.len());
        if lost > 0 {
            warn!(lost, "pages lost to worker failures");
        }

        info!(
            records = outcome.records.len(),
            pages_failed = outcome.pages_failed(),
            cards_skipped = outcome.cards_skipped(),
            "crawl finished"
        );

        outcome
    }
}

async fn run_worker(
    worker: usize,
    queue: PageQueue,
    scraper: Arc<PageScraper>,
    tx: mpsc::Sender<PageResult>,
    kind: String,
    delay: Duration,
) {
    loop {
        let next = queue.lock().await.pop_front();
        let Some((page, url)) = next else {
            break;
        };

        debug!(worker, page, "worker picked page");
        let scrape = AssertUnwindSafe(scraper.scrape_page_with_report(&kind, &url));
        let (records, report) = match scrape.catch_unwind().await {
            Ok(result) => result,
            Err(_) => {
                error!(worker, page, url = %url, "page scrape panicked, skipping");
                let report = PageReport {
                    url: url.clone(),
                    ..PageReport::default()
                };
                (Vec::new(), report)
            }
        };

        if tx
            .send(PageResult {
                page,
                records,
                report,
            })
            .await
            .is_err()
        {
            break;
        }

        if !delay.is_zero() && !queue.lock().await.is_empty() {
            tokio::time::sleep(delay).await;
        }
    }
    debug!(worker, "worker idle, exiting");
}
