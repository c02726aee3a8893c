//! The product flow shared by `product` and `batch`: reach a country,
//! search the catalog, extract the page.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::Context;
use tokio::sync::Mutex;

use avsc_core::{AppConfig, CountryIndex, FlatCountry, Locale, ProductRecord};
use avsc_scraper::{
    extract, locale, search, Driver, ScraperError, SearchOutcome, Session, WebDriverBrowser,
};

use crate::retry::retry_with_backoff;
use crate::LocaleArgs;

/// Picked when no locale flag is given.
pub(crate) const DEFAULT_COUNTRY: &str = "USA";

/// How a session reaches its storefront country.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LocaleTarget {
    /// Open the landing page and pick this country from the popup.
    Named(String),
    /// Open the landing page and pick the first country listed.
    First,
    /// Go straight to a previously harvested country URL.
    Known(Locale),
}

impl LocaleTarget {
    /// # Errors
    ///
    /// Returns an error if `--countries-file` cannot be read or does not list
    /// the requested country with a URL.
    pub(crate) fn from_args(args: &LocaleArgs) -> anyhow::Result<Self> {
        if args.first_country {
            return Ok(LocaleTarget::First);
        }
        let name = args
            .country
            .as_deref()
            .map_or(DEFAULT_COUNTRY, str::trim)
            .to_string();
        match &args.countries_file {
            Some(path) => load_known_locale(path, &name).map(LocaleTarget::Known),
            None => Ok(LocaleTarget::Named(name)),
        }
    }

    /// Name used in batch output file names before any country is resolved.
    pub(crate) fn label(&self) -> &str {
        match self {
            LocaleTarget::Named(name) => name,
            LocaleTarget::First => "first_country",
            LocaleTarget::Known(locale) => &locale.name,
        }
    }
}

/// Reads either `countries_and_urls.json` or `countries_flat_list.json` and
/// returns the entry named `name`.
fn load_known_locale(path: &Path, name: &str) -> anyhow::Result<Locale> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read countries file {}", path.display()))?;
    let index = parse_countries(&raw)
        .with_context(|| format!("{} is not a countries file", path.display()))?;
    let locale = index.find(name).cloned().with_context(|| {
        format!(
            "country \"{name}\" is not listed in {} ({} countries)",
            path.display(),
            index.len()
        )
    })?;
    if locale.url.is_none() {
        anyhow::bail!("country \"{name}\" has no storefront URL in {}", path.display());
    }
    Ok(locale)
}

fn parse_countries(raw: &str) -> anyhow::Result<CountryIndex> {
    if let Ok(index) = serde_json::from_str::<CountryIndex>(raw) {
        return Ok(index);
    }
    let flat: Vec<FlatCountry> = serde_json::from_str(raw)?;
    let mut index = CountryIndex::new();
    for entry in flat {
        index.insert(Locale {
            name: entry.country,
            region_label: entry.region,
            url: entry.url,
        });
    }
    Ok(index)
}

/// Settings that stay fixed across every product of a run.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScrapeContext<'a> {
    pub(crate) base_url: &'a str,
    pub(crate) target: &'a LocaleTarget,
    pub(crate) max_retries: u32,
    pub(crate) backoff_base_secs: u64,
}

impl<'a> ScrapeContext<'a> {
    pub(crate) fn new(config: &'a AppConfig, target: &'a LocaleTarget) -> Self {
        Self {
            base_url: &config.base_url,
            target,
            max_retries: config.max_retries,
            backoff_base_secs: config.retry_backoff_base_secs,
        }
    }
}

/// Launches a browser configured from `config`.
///
/// # Errors
///
/// Returns [`ScraperError::Launch`] when the `WebDriver` server or the
/// browser cannot be started.
pub(crate) async fn open_session(
    config: &AppConfig,
) -> Result<Session<WebDriverBrowser>, ScraperError> {
    Session::open(&config.browser_config(), config.timeouts()).await
}

/// Closes `session`, logging instead of failing; the run's result is already
/// decided by the time this is called.
pub(crate) async fn close_session<D: Driver>(mut session: Session<D>) {
    if let Err(e) = session.close().await {
        tracing::warn!(error = %e, "browser session did not close cleanly");
    }
}

/// Brings `session` to the storefront of `target`.
///
/// # Errors
///
/// Any [`ScraperError`] from navigation or the locale resolver.
pub(crate) async fn establish_locale<D: Driver>(
    session: &mut Session<D>,
    base_url: &str,
    target: &LocaleTarget,
) -> Result<(), ScraperError> {
    match target {
        LocaleTarget::Known(known) => {
            locale::enter_locale(session, known).await?;
        }
        LocaleTarget::Named(name) => {
            session.navigate(base_url).await?;
            locale::select(session, name).await?;
        }
        LocaleTarget::First => {
            session.navigate(base_url).await?;
            locale::select_first(session).await?;
        }
    }
    tracing::info!(
        country = session.state().current_locale().map_or("", |l| l.name.as_str()),
        url = %session.state().current_url(),
        "storefront country established"
    );
    Ok(())
}

/// Searches for `code` and extracts its page, retrying transient failures
/// from a fresh landing page. `Ok(None)` means the catalog has no match.
///
/// # Errors
///
/// The last [`ScraperError`] once retries are exhausted, or the first
/// non-retriable one.
pub(crate) async fn scrape_product<D: Driver>(
    session: &Mutex<Session<D>>,
    ctx: &ScrapeContext<'_>,
    code: &str,
) -> Result<Option<ProductRecord>, ScraperError> {
    let attempts = AtomicU32::new(0);
    let attempts = &attempts;

    retry_with_backoff(ctx.max_retries, ctx.backoff_base_secs, move || async move {
        let mut session = session.lock().await;
        let retrying = attempts.fetch_add(1, Ordering::Relaxed) > 0;
        if retrying || session.state().current_locale().is_none() {
            establish_locale(&mut *session, ctx.base_url, ctx.target).await?;
        }
        match search(&mut *session, code).await? {
            SearchOutcome::Found { url } => {
                tracing::debug!(code, url = %url, "product page reached");
                extract(&mut *session).await.map(Some)
            }
            SearchOutcome::NotFound => {
                tracing::warn!(code, "no product matches code");
                Ok(None)
            }
        }
    })
    .await
}
