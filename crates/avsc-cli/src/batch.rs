//! `avsc batch`: scrape a list of product codes with one or more browser
//! sessions.
//!
//! Codes are dealt round-robin to `AVSC_MAX_CONCURRENT_SESSIONS` workers.
//! Each worker owns its own browser and scrapes its share serially, pausing
//! `AVSC_INTER_PRODUCT_DELAY_MS` between products. A failed product becomes
//! a failure entry in the output file and never stops the run.

use std::path::Path;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;

use avsc_core::AppConfig;

use crate::codes::load_codes;
use crate::output::{batch_file_name, write_json, BatchEntry};
use crate::scrape::{close_session, open_session, scrape_product, LocaleTarget, ScrapeContext};
use crate::LocaleArgs;

/// One worker's results, keyed by each code's position in the input list.
struct WorkerReport {
    entries: Vec<(usize, BatchEntry)>,
    country: Option<String>,
}

/// # Errors
///
/// Returns an error if the code list or countries file cannot be read, the
/// results cannot be written, or every product failed.
pub(crate) async fn run_batch(
    config: &AppConfig,
    codes_path: &Path,
    args: &LocaleArgs,
) -> anyhow::Result<()> {
    let codes = load_codes(codes_path)?;
    let target = LocaleTarget::from_args(args)?;
    let ctx = ScrapeContext::new(config, &target);
    let workers = config.max_concurrent_sessions.clamp(1, codes.len());
    let delay = Duration::from_millis(config.inter_product_delay_ms);

    println!(
        "scraping {} products for {} with {workers} session(s)",
        codes.len(),
        target.label()
    );

    let reports: Vec<WorkerReport> = stream::iter(assign(&codes, workers).into_iter().enumerate())
        .map(|(worker, share)| run_worker(config, &ctx, worker, share, delay))
        .buffer_unordered(workers)
        .collect()
        .await;

    let country = reports
        .iter()
        .find_map(|r| r.country.clone())
        .unwrap_or_else(|| target.label().to_string());
    let mut entries: Vec<(usize, BatchEntry)> =
        reports.into_iter().flat_map(|r| r.entries).collect();
    entries.sort_by_key(|(index, _)| *index);
    let entries: Vec<BatchEntry> = entries.into_iter().map(|(_, entry)| entry).collect();

    let total = entries.len();
    let succeeded = entries.iter().filter(|e| e.is_success()).count();
    let failed = total - succeeded;

    let file_name = batch_file_name(&country, chrono::Utc::now().timestamp());
    let path = write_json(&config.output_dir, &file_name, &entries)?;
    println!("succeeded: {succeeded}  failed: {failed}  total: {total}");
    println!("saved {}", path.display());

    if failed > 0 {
        tracing::warn!(failed, total, "some products failed");
    }
    if succeeded == 0 {
        anyhow::bail!("all {total} products failed");
    }
    Ok(())
}

/// Deals `codes` round-robin into `workers` shares, keeping each code's
/// input position.
fn assign(codes: &[String], workers: usize) -> Vec<Vec<(usize, String)>> {
    let workers = workers.max(1);
    let mut shares = vec![Vec::new(); workers];
    for (index, code) in codes.iter().enumerate() {
        shares[index % workers].push((index, code.clone()));
    }
    shares.retain(|share| !share.is_empty());
    shares
}

async fn run_worker(
    config: &AppConfig,
    ctx: &ScrapeContext<'_>,
    worker: usize,
    share: Vec<(usize, String)>,
    delay: Duration,
) -> WorkerReport {
    let session = match open_session(config).await {
        Ok(session) => Mutex::new(session),
        Err(e) => {
            tracing::error!(worker, error = %e, "could not start a browser session");
            return WorkerReport {
                entries: share
                    .iter()
                    .map(|(index, code)| (*index, BatchEntry::failed(code, &e)))
                    .collect(),
                country: None,
            };
        }
    };

    let total = share.len();
    let mut entries = Vec::with_capacity(total);
    for (n, (index, code)) in share.into_iter().enumerate() {
        if n > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        tracing::info!(worker, product = n + 1, total, code = %code, "scraping product");
        let entry = match scrape_product(&session, ctx, &code).await {
            Ok(Some(record)) => BatchEntry::Scraped(record),
            Ok(None) => BatchEntry::not_found(&code),
            Err(e) => {
                tracing::error!(
                    worker,
                    code = %code,
                    stage = %e.stage(),
                    error = %e,
                    "product failed"
                );
                BatchEntry::failed(&code, &e)
            }
        };
        entries.push((index, entry));
    }

    let session = session.into_inner();
    let country = session
        .state()
        .current_locale()
        .map(|locale| locale.name.clone());
    close_session(session).await;

    WorkerReport { entries, country }
}
