//! Application state shared by every command.

use anyhow::{Context, Result};
use miner_browser::{BrowserSettings, ChromiumFetcher};
use miner_core::AppConfig;
use miner_db::Database;
use miner_scraper::{CrawlSettings, ScrapeOrchestrator, SourceRegistry};
use std::sync::Arc;

/// Loaded configuration plus the opened, migrated listing store.
pub struct AppState {
    pub config: AppConfig,
    pub db: Arc<Database>,
}

impl AppState {
    /// Open the configured database, creating and migrating it if needed.
    pub async fn open(config: AppConfig) -> Result<Self> {
        let path = config.database_path()?;
        let db = Database::new(&path)
            .await
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        db.run_migrations()
            .await
            .context("failed to run database migrations")?;

        tracing::debug!("Database: {}", path.display());

        Ok(Self {
            config,
            db: Arc::new(db),
        })
    }

    /// Built-in sources wired to a Chromium fetcher using the configured browser settings.
    pub fn registry(&self) -> Result<SourceRegistry> {
        let fetcher = Arc::new(ChromiumFetcher::new(BrowserSettings::from(
            &self.config.browser,
        )));
        let registry =
            SourceRegistry::with_defaults(fetcher, CrawlSettings::from(&self.config.scraping))?;
        Ok(registry)
    }

    pub fn orchestrator(&self) -> Result<ScrapeOrchestrator> {
        Ok(ScrapeOrchestrator::new(
            Arc::new(self.registry()?),
            Arc::clone(&self.db),
        ))
    }
}
