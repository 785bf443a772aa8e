//! Shared fixtures for scraper integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use miner_browser::{BrowserError, PageFetcher};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

/// Results page with two cards whose titles carry the page number.
pub fn results_page(page: u32) -> String {
    format!(
        r#"<html><body>
            <section data-ds-component="DS-AdCard">
                <a href="/anuncio/{page}-1"><h2>Apartamento {page}-1</h2></a>
                <ul class="olx-ad-card__labels-items">
                    <li><span aria-label="2 quartos">2</span></li>
                    <li><span aria-label="1 vaga">1</span></li>
                </ul>
                <h3 class="olx-ad-card__price">R$ 300.000</h3>
                <p class="olx-ad-card__location">São Paulo, Moema | zona sul</p>
            </section>
            <section data-ds-component="DS-AdCard">
                <a href="/anuncio/{page}-2"><h2>Casa {page}-2</h2></a>
                <h3 class="olx-ad-card__price">R$ 520.000,50</h3>
                <p class="olx-ad-card__location">Campinas, Cambuí</p>
            </section>
        </body></html>"#
    )
}

/// Page number carried in the `o` query parameter.
pub fn page_number(url: &str) -> u32 {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            u.query_pairs()
                .find(|(key, _)| key == "o")
                .and_then(|(_, value)| value.parse().ok())
        })
        .unwrap_or(0)
}

/// Fetcher serving [`results_page`] for every page, with scripted failures
/// and an in-flight counter.
#[derive(Default)]
pub struct StubFetcher {
    failing: HashSet<u32>,
    panicking: HashSet<u32>,
    latency: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, page: u32) -> Self {
        self.failing.insert(page);
        self
    }

    pub fn panicking_on(mut self, page: u32) -> Self {
        self.panicking.insert(page);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> miner_browser::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let page = page_number(url);
        if self.panicking.contains(&page) {
            panic!("stub fetcher panicked on page {page}");
        }
        if self.failing.contains(&page) {
            return Err(BrowserError::Timeout {
                url: url.to_string(),
                secs: 30,
            });
        }

        Ok(results_page(page))
    }
}
