//! Pure text parsing for values read off product pages.
//!
//! Nothing here touches the browser; [`crate::extract`] reads raw strings
//! and hands them to these functions.

use std::str::FromStr;
use std::sync::LazyLock;

use avsc_core::Specifications;
use regex::Regex;
use rust_decimal::Decimal;

/// Currency code or symbol immediately followed by an amount, e.g.
/// `"USD 1,234.50"` or `"$12.00"`. Codes are restricted to ones the vendor
/// sells in so that words like `"PER 100"` are not read as prices.
static PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<currency>\b(?:USD|CAD|MXN|BRL|EUR|GBP|CHF|SEK|NOK|DKK|PLN|CZK|HUF|RON|INR|CNY|JPY|KRW|SGD|AUD|NZD)\b|[$€£¥])\s?(?P<amount>\d[\d,]*(?:\.\d+)?)",
    )
    .expect("valid regex")
});

/// Header cells that label a specification table rather than describe the
/// product.
const HEADER_KEYS: &[&str] = &["property", "specification", "attribute", "name"];

/// Words that mark a `"Key: Value"` line as something other than a
/// specification (navigation, pricing, account chrome).
const LABEL_NOISE: &[&str] = &["price", "cart", "login", "sign in", "quantity", "http"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Price {
    pub amount: Decimal,
    pub currency: String,
}

/// Collapses whitespace runs to single spaces and trims the ends.
#[must_use]
pub fn normalize_space(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Finds the first currency/amount pair in `text`.
///
/// Thousands separators are dropped (`"1,234.50"` → `1234.50`). Returns
/// `None` when no pair is present, e.g. `"Request a quote"`, or when the
/// amount is not plain dot-decimal.
#[must_use]
pub fn parse_price(text: &str) -> Option<Price> {
    let caps = PRICE_RE.captures(text)?;
    let amount = parse_amount(caps.name("amount")?.as_str())?;
    Some(Price {
        amount,
        currency: caps.name("currency")?.as_str().to_string(),
    })
}

/// Combines a separately rendered amount and currency, as found in
/// `itemprop="price"` / `itemprop="priceCurrency"` markup.
#[must_use]
pub fn split_price(amount: &str, currency: &str) -> Option<Price> {
    let currency = currency.trim();
    if currency.is_empty() {
        return None;
    }
    let digits: String = amount
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    Some(Price {
        amount: parse_amount(&digits)?,
        currency: currency.to_string(),
    })
}

/// Accepts dot-decimal amounts with optional three-digit comma grouping.
/// Anything else (`"1.234,50"`, `"12,50"`) could be a decimal comma and is
/// rejected rather than guessed.
fn parse_amount(raw: &str) -> Option<Decimal> {
    let raw = raw.trim_end_matches(',');
    let is_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());

    let (whole, fraction) = match raw.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (raw, None),
    };
    if fraction.is_some_and(|f| !is_digits(f)) {
        return None;
    }
    let mut groups = whole.split(',');
    if !groups.next().is_some_and(is_digits) {
        return None;
    }
    if !groups.all(|g| g.len() == 3 && is_digits(g)) {
        return None;
    }
    Decimal::from_str(&raw.replace(',', "")).ok()
}

/// Folds table-like rows into a specification map.
///
/// Each row is its cells' text in order; the first cell is the key and the
/// second the value. Rows with fewer than two cells, an empty key or value,
/// or a header label are skipped. A trailing `:` on the key is dropped.
/// A repeated key keeps the last value.
#[must_use]
pub fn fold_spec_rows<I>(rows: I) -> Specifications
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut specs = Specifications::new();
    for row in rows {
        let [key, value, ..] = row.as_slice() else {
            continue;
        };
        let key = normalize_space(key.trim_end_matches(':'));
        let value = normalize_space(value);
        if key.is_empty() || value.is_empty() {
            continue;
        }
        if HEADER_KEYS.contains(&key.to_lowercase().as_str()) && value.eq_ignore_ascii_case("value")
        {
            continue;
        }
        specs.insert(key, value);
    }
    specs
}

/// Splits a `"Key: Value"` line at its first colon.
///
/// Returns `None` for lines without a colon, with an implausible key length,
/// or that look like page chrome rather than a product attribute.
#[must_use]
pub fn split_labelled(text: &str) -> Option<(String, String)> {
    let (key, value) = text.split_once(':')?;
    let key = normalize_space(key);
    let value = normalize_space(value);
    if key.chars().count() < 2 || key.chars().count() > 80 || value.is_empty() {
        return None;
    }
    let lower = key.to_lowercase();
    if LABEL_NOISE.iter().any(|noise| lower.contains(noise)) {
        return None;
    }
    Some((key, value))
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
