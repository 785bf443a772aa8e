//! Page fetching for JavaScript-rendered listing sites.
//!
//! Each fetch runs in its own short-lived Chromium session with a
//! randomized fingerprint, bounded by a navigation timeout.

pub mod error;
pub mod fetcher;
pub mod fingerprint;
pub mod session;

pub use error::{BrowserError, Result};
pub use fetcher::{ChromiumFetcher, PageFetcher};
pub use fingerprint::Fingerprint;
pub use session::{BrowserSession, BrowserSettings};
