use tokio::sync::Mutex;

use avsc_core::{AppConfig, CountryIndex};
use avsc_scraper::{harvest, ScraperError};

use crate::output::{write_json, COUNTRIES_FILE, COUNTRIES_FLAT_FILE};
use crate::retry::retry_with_backoff;
use crate::scrape::{close_session, open_session};

/// `avsc countries`: read every country and URL out of the landing page
/// popup and save `countries_and_urls.json` (plus the flat list with
/// `--flat`).
///
/// # Errors
///
/// Returns an error naming the failing stage if the browser cannot start or
/// the landing page shows no country popup.
pub(crate) async fn run_countries(config: &AppConfig, flat: bool) -> anyhow::Result<()> {
    let session = open_session(config)
        .await
        .map_err(|e| anyhow::Error::new(e).context("could not start a browser session"))?;
    let session = Mutex::new(session);
    let shared = &session;
    let base_url = config.base_url.as_str();

    let result: Result<CountryIndex, ScraperError> = retry_with_backoff(
        config.max_retries,
        config.retry_backoff_base_secs,
        move || async move {
            let mut session = shared.lock().await;
            session.navigate(base_url).await?;
            harvest(&mut *session).await
        },
    )
    .await;
    close_session(session.into_inner()).await;

    let index = result.map_err(|e| {
        let stage = e.stage();
        anyhow::Error::new(e).context(format!("country harvest failed at the {stage} stage"))
    })?;

    for region in index.regions() {
        println!("{} ({})", region.label, region.locales.len());
        for locale in &region.locales {
            println!("  {:<32} {}", locale.name, locale.url.as_deref().unwrap_or("-"));
        }
    }
    println!("{} countries in {} regions", index.len(), index.regions().len());

    let path = write_json(&config.output_dir, COUNTRIES_FILE, &index)?;
    println!("saved {}", path.display());
    if flat {
        let path = write_json(&config.output_dir, COUNTRIES_FLAT_FILE, &index.flatten())?;
        println!("saved {}", path.display());
    }
    Ok(())
}
