//! Disposable browser sessions.
//!
//! Every page gets its own Chromium process with a throwaway profile
//! directory. A session is released either explicitly through
//! [`BrowserSession::close`] or, on error paths, timeouts and task
//! cancellation, by its `Drop` impl.

use crate::error::{BrowserError, Result};
use crate::fingerprint::Fingerprint;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    EventDomContentEventFired, NavigateParams, StopLoadingParams,
};
use chromiumoxide::handler::viewport::Viewport;
use futures_util::stream::StreamExt;
use miner_core::BrowserConfig as CoreBrowserConfig;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;

/// chromiumoxide's stock switches, without `--enable-automation`.
const BASE_SWITCHES: &[&str] = &[
    "--disable-background-networking",
    "--enable-features=NetworkService,NetworkServiceInProcess",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-breakpad",
    "--disable-client-side-phishing-detection",
    "--disable-component-extensions-with-background-pages",
    "--disable-default-apps",
    "--disable-extensions",
    "--disable-features=TranslateUI",
    "--disable-hang-monitor",
    "--disable-ipc-flooding-protection",
    "--disable-popup-blocking",
    "--disable-prompt-on-repost",
    "--disable-renderer-backgrounding",
    "--disable-sync",
    "--force-color-profile=srgb",
    "--metrics-recording-only",
    "--no-first-run",
    "--password-store=basic",
    "--use-mock-keychain",
];

/// Every extra switch a session is launched with.
fn launch_switches(fingerprint: &Fingerprint) -> Vec<String> {
    BASE_SWITCHES
        .iter()
        .map(|s| (*s).to_string())
        .chain(fingerprint.launch_args())
        .collect()
}

/// Launch options shared by every session a fetcher creates
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub headless: bool,
    pub sandbox: bool,
    pub navigation_timeout: Duration,
    pub chrome_executable: Option<PathBuf>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self::from(&CoreBrowserConfig::default())
    }
}

impl From<&CoreBrowserConfig> for BrowserSettings {
    fn from(config: &CoreBrowserConfig) -> Self {
        Self {
            headless: config.headless,
            sandbox: config.sandbox,
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
            chrome_executable: config.chrome_executable.clone(),
        }
    }
}

/// One Chromium process plus the task pumping its CDP connection
pub struct BrowserSession {
    browser: Option<Browser>,
    handler: Option<JoinHandle<()>>,
    // Dropped last so the profile outlives the process using it
    profile: TempDir,
}

impl BrowserSession {
    /// Start a fresh browser with its own profile directory
    pub async fn launch(settings: &BrowserSettings, fingerprint: &Fingerprint) -> Result<Self> {
        let profile = tempfile::Builder::new()
            .prefix("miner-chromium-")
            .tempdir()
            .map_err(|e| BrowserError::Launch(format!("profile directory: {e}")))?;

        let config = Self::build_config(settings, fingerprint, profile.path().to_path_buf())?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("CDP handler event error: {}", e);
                }
            }
        });

        tracing::debug!(
            profile = %profile.path().display(),
            user_agent = %fingerprint.user_agent,
            "launched browser session"
        );

        Ok(Self {
            browser: Some(browser),
            handler: Some(handler),
            profile,
        })
    }

    fn build_config(
        settings: &BrowserSettings,
        fingerprint: &Fingerprint,
        profile_dir: PathBuf,
    ) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .disable_default_args()
            .incognito()
            .user_data_dir(profile_dir)
            .window_size(fingerprint.viewport_width, fingerprint.viewport_height)
            .viewport(Viewport {
                width: fingerprint.viewport_width,
                height: fingerprint.viewport_height,
                ..Viewport::default()
            })
            .request_timeout(settings.navigation_timeout);

        if !settings.headless {
            builder = builder.with_head();
        }
        if !settings.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(path) = &settings.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        for arg in launch_switches(fingerprint) {
            builder = builder.arg(arg);
        }

        builder.build().map_err(BrowserError::Launch)
    }

    /// Navigate to `url`, stop loading once the DOM is ready and return the markup.
    pub async fn capture(&self, url: &str) -> Result<String> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| BrowserError::Chromium("session already closed".to_string()))?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Chromium(e.to_string()))?;

        let mut dom_ready = page
            .event_listener::<EventDomContentEventFired>()
            .await
            .map_err(|e| BrowserError::Chromium(e.to_string()))?;

        let response = page
            .execute(NavigateParams::new(url))
            .await
            .map_err(|e| BrowserError::navigation(url, e))?;

        if let Some(reason) = response.result.error_text.clone() {
            return Err(BrowserError::navigation(url, reason));
        }

        if dom_ready.next().await.is_none() {
            return Err(BrowserError::navigation(url, "page closed before DOM was ready"));
        }

        // Ads and trackers keep the load event pending; the cards are already in the DOM
        if let Err(e) = page.execute(StopLoadingParams::default()).await {
            tracing::debug!(url, "stop loading failed: {}", e);
        }

        let html = page
            .content()
            .await
            .map_err(|e| BrowserError::Chromium(e.to_string()))?;

        if html.trim().is_empty() {
            return Err(BrowserError::EmptyContent(url.to_string()));
        }

        Ok(html)
    }

    /// Shut the browser down and wait for the process to exit.
    pub async fn close(mut self) {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                tracing::debug!("browser close failed: {}", e);
            }
            if let Err(e) = browser.wait().await {
                tracing::debug!("waiting for browser exit failed: {}", e);
            }
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        tracing::debug!(profile = %self.profile.path().display(), "closed browser session");
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        if let Some(browser) = self.browser.take() {
            // Dropping the Browser kills its child process
            tracing::debug!(
                profile = %self.profile.path().display(),
                "browser session dropped without close, killing process"
            );
            drop(browser);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_config() {
        let config = CoreBrowserConfig {
            headless: false,
            navigation_timeout_secs: 12,
            chrome_executable: Some(PathBuf::from("/usr/bin/chromium")),
            ..CoreBrowserConfig::default()
        };

        let settings = BrowserSettings::from(&config);
        assert!(!settings.headless);
        assert!(!settings.sandbox);
        assert_eq!(settings.navigation_timeout, Duration::from_secs(12));
        assert_eq!(
            settings.chrome_executable.as_deref(),
            Some(std::path::Path::new("/usr/bin/chromium"))
        );
    }

    #[test]
    fn test_build_config() {
        let settings = BrowserSettings {
            chrome_executable: Some(PathBuf::from("/usr/bin/chromium")),
            ..BrowserSettings::default()
        };
        let profile = TempDir::new().expect("create temp dir");

        let config = BrowserSession::build_config(
            &settings,
            &Fingerprint::fixed(1366, 768),
            profile.path().to_path_buf(),
        );
        assert!(config.is_ok());
    }

    #[test]
    fn test_launch_switches_hide_automation() {
        let switches = launch_switches(&Fingerprint::fixed(1366, 768));

        assert!(!switches.iter().any(|s| s == "--enable-automation"));
        assert!(switches.contains(&"--no-first-run".to_string()));
        assert!(switches.contains(&"--disable-blink-features=AutomationControlled".to_string()));
        assert!(switches.iter().any(|s| s.starts_with("--user-agent=")));
    }
}
