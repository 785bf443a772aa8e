//! Configuration management for the listing miner.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration.
///
/// This is loaded from `~/.config/listing-miner/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Crawl scheduling settings
    pub scraping: ScrapingConfig,
    /// Browser automation settings
    pub browser: BrowserConfig,
    /// Listing store settings
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Load configuration from the default location, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration (from `path` if given) with environment variable overrides,
    /// then validate it.
    ///
    /// Supports the following environment variables:
    /// - `MINER_WORKERS`: Override the crawl worker pool size
    /// - `MINER_HEADLESS`: Override browser headless mode (true/false)
    /// - `MINER_NAVIGATION_TIMEOUT_SECS`: Override the per-page fetch timeout
    /// - `MINER_DATABASE_PATH`: Override the SQLite database path
    pub fn load_with_env(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in production).
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("MINER_WORKERS") {
            if let Ok(workers) = val.parse() {
                self.scraping.workers = workers;
                tracing::debug!("Override scraping.workers from env: {}", workers);
            }
        }

        if let Some(val) = lookup("MINER_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Some(val) = lookup("MINER_NAVIGATION_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                self.browser.navigation_timeout_secs = secs;
                tracing::debug!("Override browser.navigation_timeout_secs from env: {}", secs);
            }
        }

        if let Some(val) = lookup("MINER_DATABASE_PATH") {
            tracing::debug!("Override database.path from env: {}", val);
            self.database.path = Some(PathBuf::from(val));
        }
    }

    /// Reject values the crawler cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.scraping.workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scraping.workers".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if self.browser.navigation_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "browser.navigation_timeout_secs".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if self.browser.window_width == 0 || self.browser.window_height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "browser.window_width/window_height".to_string(),
                reason: "must be non-zero".to_string(),
            });
        }

        Ok(())
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Resolve the database file path: the configured one, or `listings.db`
    /// in the data directory.
    pub fn database_path(&self) -> ConfigResult<PathBuf> {
        match &self.database.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::data_dir()?.join("listings.db")),
        }
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/listing-miner/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses XDG base directories: `~/.local/share/listing-miner`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().to_path_buf())
    }

    fn project_dirs() -> ConfigResult<ProjectDirs> {
        ProjectDirs::from("com", "listing-miner", "listing-miner").ok_or(ConfigError::NoConfigDir)
    }
}

/// Crawl scheduling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    /// Size of the page worker pool; the only bound on concurrent browser sessions
    pub workers: usize,
    /// Pause a worker takes between two pages, in milliseconds (0 = none)
    pub delay_between_pages_ms: u64,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            workers: 3,
            delay_between_pages_ms: 0,
        }
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Keep Chromium's sandbox (containers usually need it off)
    pub sandbox: bool,
    /// Browser window width used when the fingerprint doesn't pick one
    pub window_width: u32,
    /// Browser window height used when the fingerprint doesn't pick one
    pub window_height: u32,
    /// Upper bound on one page fetch, launch to captured markup, in seconds
    pub navigation_timeout_secs: u64,
    /// Explicit Chrome/Chromium binary; auto-detected when unset
    pub chrome_executable: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: false,
            window_width: 1920,
            window_height: 1080,
            navigation_timeout_secs: 30,
            chrome_executable: None,
        }
    }
}

/// Listing store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file; defaults to `listings.db` in the data directory
    pub path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.scraping.workers, 3);
        assert_eq!(config.scraping.delay_between_pages_ms, 0);
        assert!(config.browser.headless);
        assert!(!config.browser.sandbox);
        assert_eq!(config.browser.navigation_timeout_secs, 30);
        assert!(config.database.path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("[scraping]"));
        assert!(toml_str.contains("[browser]"));

        let parsed: AppConfig = toml::from_str(&toml_str).expect("parse serialized config");
        assert_eq!(parsed.scraping.workers, config.scraping.workers);
    }

    #[test]
    fn test_config_load_from_file() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("config.toml");

        let mut config = AppConfig::default();
        config.scraping.workers = 8;
        config.database.path = Some(tmp.path().join("test.db"));

        let contents = toml::to_string_pretty(&config).expect("serialize config");
        fs::write(&config_path, contents).expect("write config file");

        let loaded = AppConfig::load_from(&config_path).expect("load config");
        assert_eq!(loaded.scraping.workers, 8);
        assert_eq!(
            loaded.database_path().expect("database path"),
            tmp.path().join("test.db")
        );
    }

    #[test]
    fn test_load_from_missing_file() {
        let tmp = TempDir::new().expect("create temp dir");
        let result = AppConfig::load_from(&tmp.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("MINER_WORKERS", "6"),
            ("MINER_HEADLESS", "false"),
            ("MINER_NAVIGATION_TIMEOUT_SECS", "not-a-number"),
            ("MINER_DATABASE_PATH", "/tmp/listings.db"),
        ]);

        let mut config = AppConfig::default();
        config.apply_env_overrides(|key| env.get(key).map(ToString::to_string));

        assert_eq!(config.scraping.workers, 6);
        assert!(!config.browser.headless);
        // Unparseable values are ignored
        assert_eq!(config.browser.navigation_timeout_secs, 30);
        assert_eq!(
            config.database.path,
            Some(PathBuf::from("/tmp/listings.db"))
        );
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let mut config = AppConfig::default();
        config.scraping.workers = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("scraping.workers"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = AppConfig::default();
        config.browser.navigation_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[scraping]
workers = 2

[browser]
sandbox = true
"#;

        let config: AppConfig = toml::from_str(toml_str).expect("parse partial config");
        assert_eq!(config.scraping.workers, 2);
        assert!(config.browser.sandbox);
        // These should be defaults
        assert_eq!(config.scraping.delay_between_pages_ms, 0);
        assert!(config.browser.headless);
    }
}
