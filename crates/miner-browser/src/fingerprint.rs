use rand::seq::SliceRandom;

/// Desktop user agents rotated across sessions.
const USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36 Edg/123.0.0.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
];

/// Common desktop viewport sizes.
const VIEWPORTS: [(u32, u32); 4] = [(1920, 1080), (1366, 768), (1536, 864), (1440, 900)];

/// Per-session browser identity, re-rolled for every page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub user_agent: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub language: String,
}

impl Fingerprint {
    /// Generate a randomized fingerprint
    pub fn randomized() -> Self {
        let mut rng = rand::thread_rng();

        let user_agent = USER_AGENTS.choose(&mut rng).unwrap_or(&USER_AGENTS[0]);
        let (width, height) = VIEWPORTS.choose(&mut rng).copied().unwrap_or(VIEWPORTS[0]);

        Self {
            user_agent: (*user_agent).to_string(),
            viewport_width: width,
            viewport_height: height,
            language: "pt-BR".to_string(),
        }
    }

    /// Fixed fingerprint using the given window size and the first user agent.
    pub fn fixed(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            user_agent: USER_AGENTS[0].to_string(),
            viewport_width,
            viewport_height,
            language: "pt-BR".to_string(),
        }
    }

    /// Command-line switches that apply this identity and hide the automation flags.
    pub fn launch_args(&self) -> Vec<String> {
        vec![
            format!("--user-agent={}", self.user_agent),
            format!("--lang={}", self.language),
            "--disable-blink-features=AutomationControlled".to_string(),
            "--disable-gpu".to_string(),
            "--disable-dev-shm-usage".to_string(),
        ]
    }
}
