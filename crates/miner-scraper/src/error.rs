//! Scraper error types.

use thiserror::Error;

/// Errors raised while configuring or running a scrape.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// No source is registered under the requested name.
    #[error("unknown source: {0}")]
    UnknownSource(String),

    /// A source with the same name is already registered.
    #[error("source already registered: {0}")]
    DuplicateSource(String),

    /// The scrape request was rejected before any job was created.
    #[error("invalid scrape request: {0}")]
    InvalidRequest(String),

    /// A CSS selector failed to compile.
    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector {
        /// Selector as written
        selector: String,
        /// Parser message
        reason: String,
    },

    /// A source base URL failed to parse.
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl {
        /// URL as given
        url: String,
        /// Parser message
        reason: String,
    },

    /// The crawl or job task died before producing an outcome.
    #[error("crawl failed: {0}")]
    CrawlFailed(String),

    /// No scrape job exists with the given id.
    #[error("scrape job not found: {0}")]
    JobNotFound(String),

    /// Listing store error.
    #[error("Database error: {0}")]
    Database(#[from] miner_db::DatabaseError),

    /// Raw `SQLx` error.
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Core error, e.g. an invalid source name.
    #[error("Core error: {0}")]
    Core(#[from] miner_core::MinerError),
}

/// Reasons a single card is discarded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    /// A required element is absent from the card.
    #[error("card {card}: missing {element}")]
    MissingElement {
        /// Position of the card on its page
        card: usize,
        /// Name of the missing element
        element: &'static str,
    },

    /// The price element holds text that is not a price.
    #[error("card {card}: unparseable price {text:?}")]
    InvalidPrice {
        /// Position of the card on its page
        card: usize,
        /// Price text as found
        text: String,
    },
}

/// Result type alias for scraper operations.
pub type Result<T> = std::result::Result<T, ScrapeError>;
