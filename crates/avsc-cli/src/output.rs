//! JSON artifacts written by the CLI.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;

use avsc_core::ProductRecord;
use avsc_scraper::ScraperError;

pub(crate) const COUNTRIES_FILE: &str = "countries_and_urls.json";
pub(crate) const COUNTRIES_FLAT_FILE: &str = "countries_flat_list.json";

pub(crate) fn product_file_name(code: &str) -> String {
    format!("product_{}.json", file_safe(code))
}

pub(crate) fn batch_file_name(country: &str, timestamp: i64) -> String {
    format!("batch_products_{}_{timestamp}.json", file_safe(country))
}

/// Replaces anything that is awkward in a file name with `_`.
fn file_safe(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Pretty-prints `value` to `dir/file_name`, creating `dir` if needed.
///
/// # Errors
///
/// Returns an error if the directory cannot be created, the value cannot be
/// serialized, or the file cannot be written.
pub(crate) fn write_json<T: Serialize + ?Sized>(
    dir: &Path,
    file_name: &str,
    value: &T,
) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    let path = dir.join(file_name);
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("failed to serialize {file_name}"))?;
    std::fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote output");
    Ok(path)
}

/// One line of a batch result file: the scraped record, or why the code
/// produced none.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum BatchEntry {
    Scraped(ProductRecord),
    Failed(FailedProduct),
}

#[derive(Debug, Serialize)]
pub(crate) struct FailedProduct {
    pub(crate) product_code: String,
    pub(crate) product_name: Option<String>,
    pub(crate) error: String,
    pub(crate) stage: String,
}

impl BatchEntry {
    pub(crate) fn not_found(code: &str) -> Self {
        BatchEntry::Failed(FailedProduct {
            product_code: code.to_string(),
            product_name: None,
            error: "no product matches this code".to_string(),
            stage: avsc_scraper::Stage::Search.to_string(),
        })
    }

    pub(crate) fn failed(code: &str, err: &ScraperError) -> Self {
        BatchEntry::Failed(FailedProduct {
            product_code: code.to_string(),
            product_name: None,
            error: err.to_string(),
            stage: err.stage().to_string(),
        })
    }

    pub(crate) fn is_success(&self) -> bool {
        matches!(self, BatchEntry::Scraped(_))
    }
}
