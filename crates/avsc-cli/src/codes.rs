//! Product code lists for `avsc batch`.
//!
//! Accepts either a plain one-code-per-line file or a CSV. A CSV header
//! naming a known code column selects that column; otherwise the first
//! column is used.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;

/// Header names recognised as the product code column, compared ignoring
/// case and surrounding whitespace.
const CODE_HEADERS: &[&str] = &[
    "product_code",
    "product code",
    "code",
    "catalog_number",
    "catalog number",
    "sku",
];

/// Reads and parses a code list file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or lists no codes.
pub(crate) fn load_codes(path: &Path) -> anyhow::Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read product codes from {}", path.display()))?;
    let codes = parse_codes(&raw)
        .with_context(|| format!("{} is not a readable code list", path.display()))?;
    if codes.is_empty() {
        anyhow::bail!("no product codes found in {}", path.display());
    }
    tracing::info!(count = codes.len(), path = %path.display(), "loaded product codes");
    Ok(codes)
}

/// Extracts product codes from file contents, dropping blanks and
/// duplicates while keeping first-seen order.
///
/// # Errors
///
/// Returns a [`csv::Error`] if the contents are not readable as CSV.
pub(crate) fn parse_codes(raw: &str) -> Result<Vec<String>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(raw.trim_start_matches('\u{feff}').as_bytes());

    let header = reader.headers()?.clone();
    if header.iter().all(str::is_empty) {
        return Ok(Vec::new());
    }
    let (column, header_is_data) = match header
        .iter()
        .position(|cell| CODE_HEADERS.iter().any(|h| cell.eq_ignore_ascii_case(h)))
    {
        Some(index) => (index, false),
        None if header.len() > 1 && !header.get(0).is_some_and(looks_like_code) => {
            tracing::warn!(
                column = header.get(0).unwrap_or_default(),
                "no standard product code column found; using the first column"
            );
            (0, false)
        }
        None => (0, true),
    };

    let mut cells = Vec::new();
    if header_is_data {
        cells.extend(header.get(column).map(str::to_string));
    }
    for record in reader.records() {
        cells.extend(record?.get(column).map(str::to_string));
    }

    let mut seen = HashSet::new();
    Ok(cells
        .into_iter()
        .filter(|code| !code.is_empty())
        .filter(|code| seen.insert(code.clone()))
        .collect())
}

/// Catalog codes always carry a digit; header labels do not.
fn looks_like_code(cell: &str) -> bool {
    cell.chars().any(|c| c.is_ascii_digit())
}

#[cfg(test)]
#[path = "codes_test.rs"]
mod tests;
