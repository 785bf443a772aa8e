//! Single results page scraping.

use crate::extractor::FieldExtractor;
use miner_browser::PageFetcher;
use miner_core::ListingRecord;
use scraper::Html;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What happened to one results page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageReport {
    /// Page URL
    pub url: String,
    /// `false` when the page could not be fetched at all
    pub fetched: bool,
    /// Cards matched on the page
    pub cards_found: usize,
    /// Cards turned into records
    pub extracted: usize,
    /// Cards discarded during extraction
    pub skipped: usize,
}

/// Fetches a results page and extracts every card on it.
pub struct PageScraper {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<FieldExtractor>,
}

impl PageScraper {
    /// Scraper fetching through `fetcher`.
    pub fn new(fetcher: Arc<dyn PageFetcher>, extractor: Arc<FieldExtractor>) -> Self {
        Self { fetcher, extractor }
    }

    /// Records found on `url`. A page that cannot be fetched yields no records.
    pub async fn scrape_page(&self, kind: &str, url: &str) -> Vec<ListingRecord> {
        self.scrape_page_with_report(kind, url).await.0
    }

    /// Like [`Self::scrape_page`], also reporting what happened to the page.
    pub async fn scrape_page_with_report(
        &self,
        kind: &str,
        url: &str,
    ) -> (Vec<ListingRecord>, PageReport) {
        info!(url, "scraping page");

        let html = match self.fetcher.fetch(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(url, error = %e, "failed to fetch page, skipping");
                let report = PageReport {
                    url: url.to_string(),
                    ..PageReport::default()
                };
                return (Vec::new(), report);
            }
        };

        let (records, mut report) = extract_listings(&self.extractor, &html, kind);
        report.url = url.to_string();

        info!(
            url,
            cards = report.cards_found,
            extracted = report.extracted,
            skipped = report.skipped,
            "page scraped"
        );

        (records, report)
    }
}

/// Extract every card in `html`, in document order. Cards that fail
/// extraction are logged and counted, never fatal.
pub fn extract_listings(
    extractor: &FieldExtractor,
    html: &str,
    kind: &str,
) -> (Vec<ListingRecord>, PageReport) {
    let document = Html::parse_document(html);
    let mut records = Vec::new();
    let mut report = PageReport {
        fetched: true,
        ..PageReport::default()
    };

    for (index, card) in document.select(extractor.selectors().card()).enumerate() {
        report.cards_found += 1;
        match extractor.extract(card, index, kind) {
            Ok(record) => records.push(record),
            Err(e) => {
                debug!(error = %e, "skipping card");
                report.skipped += 1;
            }
        }
    }

    report.extracted = records.len();
    (records, report)
}
