//! Marketplace sources.
//!
//! A source knows how to build its results-page URLs and how to crawl a
//! page range of them. OLX is the only marketplace shipped today.

use crate::crawler::{ConcurrentCrawler, CrawlOutcome, CrawlSettings};
use crate::error::{Result, ScrapeError};
use crate::extractor::{CardSelectors, FieldExtractor};
use crate::page::PageScraper;
use async_trait::async_trait;
use miner_browser::PageFetcher;
use miner_core::SourceName;
use std::sync::Arc;
use url::Url;

/// Base of every OLX real-estate results URL.
pub const OLX_BASE_URL: &str = "https://www.olx.com.br/imoveis";

/// A marketplace that can be crawled for listings.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Registry key of this source.
    fn name(&self) -> &SourceName;

    /// Base URL relative card links resolve against.
    fn base_url(&self) -> &Url;

    /// URL of results page `page` for a listing kind and region.
    fn page_url(&self, kind: &str, region: &str, page: u32) -> String;

    /// Crawl `page_count` results pages starting at `start_page`.
    async fn crawl(&self, kind: &str, region: &str, start_page: u32, page_count: u32)
        -> CrawlOutcome;
}

/// OLX Brazil real-estate listings.
pub struct OlxSource {
    name: SourceName,
    base_url: Url,
    crawler: ConcurrentCrawler,
}

impl OlxSource {
    /// OLX source against the public site.
    pub fn new(fetcher: Arc<dyn PageFetcher>, settings: CrawlSettings) -> Result<Self> {
        Self::with_base_url(fetcher, settings, OLX_BASE_URL)
    }

    /// Point the source at another host, e.g. a local mirror in tests.
    pub fn with_base_url(
        fetcher: Arc<dyn PageFetcher>,
        settings: CrawlSettings,
        base_url: &str,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| ScrapeError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        let extractor = FieldExtractor::new(CardSelectors::olx()?, base_url.clone());
        let scraper = PageScraper::new(fetcher, Arc::new(extractor));

        Ok(Self {
            name: SourceName::new("olx")?,
            base_url,
            crawler: ConcurrentCrawler::new(Arc::new(scraper), settings),
        })
    }
}

#[async_trait]
impl ListingSource for OlxSource {
    fn name(&self) -> &SourceName {
        &self.name
    }

    fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn page_url(&self, kind: &str, region: &str, page: u32) -> String {
        format!(
            "{}/{kind}/estado-{region}?lis=home_body_search_bar_1001&o={page}",
            self.base_url.as_str().trim_end_matches('/')
        )
    }

    async fn crawl(
        &self,
        kind: &str,
        region: &str,
        start_page: u32,
        page_count: u32,
    ) -> CrawlOutcome {
        self.crawler
            .crawl(kind, start_page, page_count, |page| {
                self.page_url(kind, region, page)
            })
            .await
    }
}
