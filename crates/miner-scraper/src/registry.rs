use crate::crawler::CrawlSettings;
use crate::error::{Result, ScrapeError};
use crate::source::{ListingSource, OlxSource};
use miner_browser::PageFetcher;
use miner_core::SourceName;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Sources available to scrape requests, keyed by name.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: HashMap<SourceName, Arc<dyn ListingSource>>,
}

impl SourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in source.
    pub fn with_defaults(fetcher: Arc<dyn PageFetcher>, settings: CrawlSettings) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Arc::new(OlxSource::new(fetcher, settings)?))?;
        Ok(registry)
    }

    /// Add a source. Fails if its name is already taken.
    pub fn register(&mut self, source: Arc<dyn ListingSource>) -> Result<()> {
        let name = source.name().clone();
        if self.sources.contains_key(&name) {
            return Err(ScrapeError::DuplicateSource(name.to_string()));
        }

        tracing::debug!(source = %name, "registered listing source");
        self.sources.insert(name, source);
        Ok(())
    }

    /// Look up a source. Names are matched case-insensitively.
    pub fn get(&self, name: &str) -> Result<Arc<dyn ListingSource>> {
        SourceName::new(name)
            .ok()
            .and_then(|key| self.sources.get(&key))
            .cloned()
            .ok_or_else(|| ScrapeError::UnknownSource(name.to_string()))
    }

    /// Whether a source is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<SourceName> {
        let mut names: Vec<_> = self.sources.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether no source is registered.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("sources", &self.names())
            .finish()
    }
}
