use tokio::sync::Mutex;

use avsc_core::AppConfig;

use crate::output::{product_file_name, write_json};
use crate::scrape::{close_session, open_session, scrape_product, LocaleTarget, ScrapeContext};
use crate::LocaleArgs;

/// `avsc product <CODE>`: scrape one product, print it, and save
/// `product_<CODE>.json` in the output directory.
///
/// # Errors
///
/// Returns an error naming the failing stage if the browser cannot start,
/// the country cannot be selected, the search is inconclusive, or the page
/// is not a product page. A search with no match is also an error.
pub(crate) async fn run_product(
    config: &AppConfig,
    code: &str,
    args: &LocaleArgs,
) -> anyhow::Result<()> {
    let code = code.trim();
    if code.is_empty() {
        anyhow::bail!("product code must not be empty");
    }
    let target = LocaleTarget::from_args(args)?;
    let ctx = ScrapeContext::new(config, &target);

    let session = open_session(config)
        .await
        .map_err(|e| anyhow::Error::new(e).context("could not start a browser session"))?;
    let session = Mutex::new(session);
    let result = scrape_product(&session, &ctx, code).await;
    close_session(session.into_inner()).await;

    let record = match result {
        Ok(Some(record)) => record,
        Ok(None) => anyhow::bail!("no product matches code {code}"),
        Err(e) => {
            let stage = e.stage();
            return Err(anyhow::Error::new(e).context(format!(
                "scraping {code} failed at the {stage} stage"
            )));
        }
    };

    println!("{}", serde_json::to_string_pretty(&record)?);
    let path = write_json(&config.output_dir, &product_file_name(code), &record)?;
    println!("saved {}", path.display());
    Ok(())
}
