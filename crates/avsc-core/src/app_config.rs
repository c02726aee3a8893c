use std::path::PathBuf;
use std::time::Duration;

/// Desktop Chrome user agent sent when `AVSC_USER_AGENT` is not set.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Browser family driven through WebDriver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserKind {
    Chrome,
    Firefox,
}

impl std::fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrowserKind::Chrome => write!(f, "chrome"),
            BrowserKind::Firefox => write!(f, "firefox"),
        }
    }
}

/// Launch configuration handed opaquely to the driver session.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// WebDriver endpoint, e.g. `http://localhost:9515` for chromedriver.
    pub webdriver_url: String,
    pub browser: BrowserKind,
    pub headless: bool,
    pub user_agent: String,
}

/// Wait timeouts used by the session's polling loop.
///
/// Every wait polls at `poll_interval` and gives up once its own timeout has
/// elapsed. A zero timeout still performs exactly one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Popup detection. Short, because absence is a valid outcome.
    pub popup: Duration,
    /// Cookie-banner detection. Absence is never an error.
    pub cookie_banner: Duration,
    /// Default element wait (popup dismissal, product page root).
    pub element: Duration,
    /// Wait for a search to land on a product page or a no-results page.
    pub search: Duration,
    /// How long to wait after pressing Enter before clicking the submit button.
    pub submit_grace: Duration,
    pub poll_interval: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            popup: Duration::from_millis(5_000),
            cookie_banner: Duration::from_millis(3_000),
            element: Duration::from_millis(20_000),
            search: Duration::from_millis(15_000),
            submit_grace: Duration::from_millis(3_000),
            poll_interval: Duration::from_millis(250),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Vendor landing page; the country popup is shown here.
    pub base_url: String,
    pub webdriver_url: String,
    pub browser: BrowserKind,
    pub headless: bool,
    pub user_agent: String,
    pub popup_timeout_ms: u64,
    pub cookie_timeout_ms: u64,
    pub wait_timeout_ms: u64,
    pub search_timeout_ms: u64,
    pub submit_grace_ms: u64,
    pub poll_interval_ms: u64,
    pub output_dir: PathBuf,
    pub max_concurrent_sessions: usize,
    pub inter_product_delay_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
}

impl AppConfig {
    #[must_use]
    pub fn browser_config(&self) -> BrowserConfig {
        BrowserConfig {
            webdriver_url: self.webdriver_url.clone(),
            browser: self.browser,
            headless: self.headless,
            user_agent: self.user_agent.clone(),
        }
    }

    #[must_use]
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            popup: Duration::from_millis(self.popup_timeout_ms),
            cookie_banner: Duration::from_millis(self.cookie_timeout_ms),
            element: Duration::from_millis(self.wait_timeout_ms),
            search: Duration::from_millis(self.search_timeout_ms),
            submit_grace: Duration::from_millis(self.submit_grace_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}
