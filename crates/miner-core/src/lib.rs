//! Miner Core - Foundation crate for the listing miner.
//!
//! This crate provides the listing record and its natural key, the text
//! normalization used by extraction and export filtering, error types and
//! configuration management that all other miner crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - `ListingRecord`, `DedupKey` and the `SourceName` newtype
//! - [`normalize`] - Diacritic stripping, comparison normalization, fuzzy matching
//! - [`filter`] - Export filters built on fuzzy matching
//!
//! # Example
//!
//! ```rust
//! use miner_core::{fuzzy_match, normalize, ExportFilter};
//!
//! assert_eq!(normalize("São  Paulo"), "sao paulo");
//! assert!(fuzzy_match("Centro", "centro sp"));
//!
//! let filter = ExportFilter::new().with("city", "sao paulo");
//! assert!(!filter.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod filter;
pub mod normalize;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, BrowserConfig, DatabaseConfig, ScrapingConfig};
pub use error::{ConfigError, ConfigResult, MinerError, Result};
pub use filter::{ExportFilter, FilterError};
pub use normalize::{extract_number, fuzzy_match, normalize, parse_price, strip_diacritics};
pub use types::{DedupKey, ListingRecord, SourceName, UNKNOWN_LOCATION};
