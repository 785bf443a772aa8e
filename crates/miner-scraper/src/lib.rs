//! Listing crawler and scrape job orchestration.
//!
//! Pages are fetched through a [`miner_browser::PageFetcher`], split into ad
//! cards and turned into [`miner_core::ListingRecord`]s, then reconciled into
//! the store by the orchestrator.
//!
//! # Features
//!
//! - Bounded worker pool draining a shared page queue
//! - Per-page and per-card failure isolation
//! - Name-keyed source registry with case-insensitive lookup
//! - Background scrape jobs with queryable status
//!
//! # Example
//!
//! ```rust,ignore
//! use miner_scraper::{ScrapeOrchestrator, ScrapeRequest, SourceRegistry};
//! use std::sync::Arc;
//!
//! let registry = SourceRegistry::with_defaults(fetcher, settings)?;
//! let orchestrator = ScrapeOrchestrator::new(Arc::new(registry), Arc::new(database));
//!
//! let handle = orchestrator
//!     .start_scrape(ScrapeRequest::new("olx", "venda", "sp"))
//!     .await?;
//! println!("{}", handle.job_id());
//! let counts = handle.wait().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod crawler;
pub mod error;
pub mod extractor;
pub mod orchestrator;
pub mod page;
pub mod registry;
pub mod source;

// Re-export commonly used types
pub use crawler::{ConcurrentCrawler, CrawlOutcome, CrawlSettings};
pub use error::{ExtractionError, Result, ScrapeError};
pub use extractor::{CardSelectorSpec, CardSelectors, FieldExtractor};
pub use orchestrator::{ScrapeHandle, ScrapeOrchestrator, ScrapeRequest};
pub use page::{extract_listings, PageReport, PageScraper};
pub use registry::SourceRegistry;
pub use source::{ListingSource, OlxSource, OLX_BASE_URL};
