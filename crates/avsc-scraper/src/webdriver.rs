//! Real-browser backend over a `WebDriver` server (chromedriver, geckodriver).

use std::time::Duration;

use async_trait::async_trait;
use avsc_core::{BrowserConfig, BrowserKind, Timeouts};
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator as By};
use serde_json::{json, Map, Value};
use tempfile::TempDir;

use crate::driver::Driver;
use crate::error::{DriverError, ScraperError};
use crate::locator::Locator;
use crate::session::Session;

const STATUS_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// A browser driven through `fantoccini`.
pub struct WebDriverBrowser {
    client: Client,
    /// Throwaway Chrome profile, removed when the browser is dropped.
    profile: Option<TempDir>,
}

impl WebDriverBrowser {
    /// Checks the `WebDriver` server is up, then opens a new browser session.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Launch`] if the server is unreachable, the
    /// profile directory cannot be created, or the session is refused.
    pub async fn launch(config: &BrowserConfig) -> Result<Self, ScraperError> {
        probe_webdriver(&config.webdriver_url).await?;

        let launch_err = |reason: String| ScraperError::Launch {
            webdriver_url: config.webdriver_url.clone(),
            reason,
        };

        let profile = match config.browser {
            BrowserKind::Chrome => Some(
                tempfile::Builder::new()
                    .prefix("avsc-chrome-")
                    .tempdir()
                    .map_err(|e| launch_err(format!("cannot create browser profile: {e}")))?,
            ),
            BrowserKind::Firefox => None,
        };

        let caps = capabilities(config, profile.as_ref());
        tracing::debug!(
            webdriver_url = %config.webdriver_url,
            browser = %config.browser,
            headless = config.headless,
            "starting browser session"
        );
        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&config.webdriver_url)
            .await
            .map_err(|e| launch_err(e.to_string()))?;

        Ok(Self { client, profile })
    }
}

impl Session<WebDriverBrowser> {
    /// Launches a browser and wraps it in a fresh session.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Launch`] on any launch failure.
    pub async fn open(config: &BrowserConfig, timeouts: Timeouts) -> Result<Self, ScraperError> {
        let browser = WebDriverBrowser::launch(config).await?;
        tracing::info!(browser = %config.browser, "browser session started");
        Ok(Session::new(browser, timeouts))
    }
}

/// `GET {webdriver_url}/status`, failing fast when no driver is listening.
///
/// # Errors
///
/// Returns [`ScraperError::Launch`] when the endpoint is unreachable or
/// answers with a non-success status.
pub async fn probe_webdriver(webdriver_url: &str) -> Result<(), ScraperError> {
    let status_url = format!("{}/status", webdriver_url.trim_end_matches('/'));
    let launch_err = |reason: String| ScraperError::Launch {
        webdriver_url: webdriver_url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(STATUS_PROBE_TIMEOUT)
        .build()
        .map_err(|e| launch_err(e.to_string()))?;
    let response = client
        .get(&status_url)
        .send()
        .await
        .map_err(|e| launch_err(format!("WebDriver server not reachable: {e}")))?;
    if !response.status().is_success() {
        return Err(launch_err(format!(
            "WebDriver status check returned {}",
            response.status()
        )));
    }
    Ok(())
}

fn capabilities(config: &BrowserConfig, profile: Option<&TempDir>) -> Map<String, Value> {
    let mut caps = Map::new();
    match config.browser {
        BrowserKind::Chrome => {
            let mut args = vec![
                "--no-sandbox".to_string(),
                "--disable-dev-shm-usage".to_string(),
                "--disable-blink-features=AutomationControlled".to_string(),
                "--window-size=1920,1080".to_string(),
                format!("--user-agent={}", config.user_agent),
            ];
            if config.headless {
                args.push("--headless=new".to_string());
                args.push("--disable-gpu".to_string());
            }
            if let Some(dir) = profile {
                args.push(format!("--user-data-dir={}", dir.path().display()));
            }
            caps.insert(
                "goog:chromeOptions".to_string(),
                json!({
                    "args": args,
                    "excludeSwitches": ["enable-automation"],
                }),
            );
        }
        BrowserKind::Firefox => {
            let mut args = vec!["--width=1920".to_string(), "--height=1080".to_string()];
            if config.headless {
                args.push("--headless".to_string());
            }
            caps.insert(
                "moz:firefoxOptions".to_string(),
                json!({
                    "args": args,
                    "prefs": { "general.useragent.override": config.user_agent },
                }),
            );
        }
    }
    caps
}

#[allow(clippy::needless_pass_by_value)]
fn command(err: CmdError) -> DriverError {
    DriverError::Command(err.to_string())
}

#[async_trait]
impl Driver for WebDriverBrowser {
    type Element = Element;

    async fn goto(&mut self, url: &str) -> Result<(), DriverError> {
        self.client.goto(url).await.map_err(command)
    }

    async fn current_url(&mut self) -> Result<String, DriverError> {
        self.client
            .current_url()
            .await
            .map(|url| url.to_string())
            .map_err(command)
    }

    async fn find_all(
        &mut self,
        scope: Option<&Element>,
        locator: &Locator,
    ) -> Result<Vec<Element>, DriverError> {
        let xpath = locator.to_xpath(scope.is_some());
        let found = match scope {
            Some(element) => element.find_all(By::XPath(&xpath)).await,
            None => self.client.find_all(By::XPath(&xpath)).await,
        };
        found.map_err(command)
    }

    async fn text(&mut self, element: &Element) -> Result<String, DriverError> {
        element.text().await.map_err(command)
    }

    async fn attribute(
        &mut self,
        element: &Element,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        element.attr(name).await.map_err(command)
    }

    async fn click(&mut self, element: &Element) -> Result<(), DriverError> {
        element.click().await.map_err(command)
    }

    async fn clear(&mut self, element: &Element) -> Result<(), DriverError> {
        element.clear().await.map_err(command)
    }

    async fn send_keys(&mut self, element: &Element, keys: &str) -> Result<(), DriverError> {
        element.send_keys(keys).await.map_err(command)
    }

    async fn quit(&mut self) -> Result<(), DriverError> {
        let result = self.client.clone().close().await.map_err(command);
        drop(self.profile.take());
        result
    }
}
