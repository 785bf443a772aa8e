use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrowserError>;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("timed out after {secs}s fetching {url}")]
    Timeout { url: String, secs: u64 },

    #[error("empty page content from {0}")]
    EmptyContent(String),

    #[error("chromium error: {0}")]
    Chromium(String),
}

impl BrowserError {
    pub(crate) fn navigation(url: &str, reason: impl ToString) -> Self {
        Self::Navigation {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}
