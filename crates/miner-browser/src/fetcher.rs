use crate::error::{BrowserError, Result};
use crate::fingerprint::Fingerprint;
use crate::session::{BrowserSession, BrowserSettings};
use async_trait::async_trait;
use url::Url;

/// Turns a page URL into its rendered markup
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the markup of `url`
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Fetches each page in a fresh Chromium session
#[derive(Debug, Clone, Default)]
pub struct ChromiumFetcher {
    settings: BrowserSettings,
}

impl ChromiumFetcher {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &BrowserSettings {
        &self.settings
    }

    async fn fetch_in_session(&self, url: &str) -> Result<String> {
        let fingerprint = Fingerprint::randomized();
        let session = BrowserSession::launch(&self.settings, &fingerprint).await?;

        let result = session.capture(url).await;
        session.close().await;
        result
    }
}

#[async_trait]
impl PageFetcher for ChromiumFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        validate_url(url)?;

        let limit = self.settings.navigation_timeout;
        tracing::debug!(url, timeout_secs = limit.as_secs(), "fetching page");

        match tokio::time::timeout(limit, self.fetch_in_session(url)).await {
            Ok(result) => result,
            // The session future was dropped, so its Drop impl already released the browser
            Err(_) => Err(BrowserError::Timeout {
                url: url.to_string(),
                secs: limit.as_secs(),
            }),
        }
    }
}

/// Only absolute http(s) URLs are handed to the browser
pub fn validate_url(url: &str) -> Result<Url> {
    let parsed =
        Url::parse(url).map_err(|e| BrowserError::navigation(url, format!("invalid URL: {e}")))?;

    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(parsed),
        scheme => Err(BrowserError::navigation(
            url,
            format!("unsupported URL scheme or missing host: {scheme}"),
        )),
    }
}
