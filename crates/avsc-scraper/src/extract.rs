//! Product detail page → [`ProductRecord`].
//!
//! Each field has its own locator chain and is extracted independently. A
//! field that cannot be read is left empty and reported as a
//! [`MissingField`] with an [`AbsentReason`]; only a page without the
//! product root marker fails the whole extraction.

use std::fmt;

use avsc_core::{ProductRecord, Specifications};

use crate::driver::Driver;
use crate::error::{ScraperError, Stage};
use crate::locator::catalog::{
    AVAILABILITY, DESCRIPTION, MODEL_NUMBER, MODEL_NUMBER_KEYS, PRICE, PRICE_AMOUNT,
    PRICE_CURRENCY, PRODUCT_ROOT, PRODUCT_SKU, PRODUCT_TITLE, SECTION_EXPANDERS,
    SPEC_DEFINITIONS, SPEC_DEFINITION_LISTS, SPEC_LABELLED, SPEC_LIST_CELLS, SPEC_LIST_ROWS,
    SPEC_TABLE_CELLS, SPEC_TABLE_ROWS, SPEC_TERMS,
};
use crate::locator::{Locator, LocatorSpec};
use crate::parse::{fold_spec_rows, parse_price, split_labelled, split_price, Price};
use crate::session::{Session, WaitOutcome};

/// Descriptions shorter than this are page chrome, not product copy.
const MIN_DESCRIPTION_CHARS: usize = 20;

/// Why a field was left empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbsentReason {
    /// No candidate of the chain matched a non-empty element.
    LocatorExhausted { locator: &'static str },
    /// Elements matched but their text was refused, e.g. a too-short description.
    Rejected {
        locator: &'static str,
        reason: String,
    },
    /// Text was found but could not be parsed, e.g. a price reading "Quote".
    Unparseable { raw: String },
    /// The browser failed while reading the field.
    Driver { message: String },
}

impl fmt::Display for AbsentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbsentReason::LocatorExhausted { locator } => write!(f, "`{locator}` matched nothing"),
            AbsentReason::Rejected { locator, reason } => write!(f, "`{locator}` rejected: {reason}"),
            AbsentReason::Unparseable { raw } => write!(f, "could not parse {raw:?}"),
            AbsentReason::Driver { message } => write!(f, "driver error: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingField {
    pub field: &'static str,
    pub reason: AbsentReason,
}

/// A record plus the fields that could not be filled and why.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub record: ProductRecord,
    pub missing: Vec<MissingField>,
}

type Field<T> = Result<T, AbsentReason>;

/// Extracts the product on the current page.
///
/// # Errors
///
/// [`ScraperError::PageStructure`] when the page has no product root
/// marker; [`ScraperError::Driver`] if the browser fails before field
/// extraction starts.
pub async fn extract<D: Driver>(session: &mut Session<D>) -> Result<ProductRecord, ScraperError> {
    Ok(extract_detailed(session).await?.record)
}

/// [`extract`], also reporting every field left empty.
///
/// # Errors
///
/// See [`extract`].
pub async fn extract_detailed<D: Driver>(
    session: &mut Session<D>,
) -> Result<Extraction, ScraperError> {
    session.refresh_url(Stage::Extract).await?;
    let timeout = session.timeouts().element;
    if let WaitOutcome::TimedOut { .. } = session
        .poll(&PRODUCT_ROOT, timeout)
        .await
        .map_err(ScraperError::driver(Stage::Extract))?
    {
        return Err(ScraperError::PageStructure {
            stage: Stage::Extract,
            url: session.state().current_url().to_string(),
            locator: PRODUCT_ROOT.name.to_string(),
        });
    }

    expand_sections(session).await;

    let mut missing = Vec::new();
    let product_name = keep(
        &mut missing,
        "product_name",
        first_text(session, &PRODUCT_TITLE, |_| Ok(())).await,
    );
    let page_sku = first_text(session, &PRODUCT_SKU, |_| Ok(())).await.ok();
    let description = keep(
        &mut missing,
        "description",
        first_text(session, &DESCRIPTION, accept_description).await,
    );
    let specifications = extract_specifications(session).await;
    let model_number = keep(
        &mut missing,
        "model_number",
        model_number(session, &specifications).await,
    );
    let (price, currency) = match extract_price(session).await {
        Ok(Price { amount, currency }) => (Some(amount), Some(currency)),
        Err(reason) => {
            note(&mut missing, "price", reason.clone());
            note(&mut missing, "currency", reason);
            (None, None)
        }
    };
    let availability = keep(
        &mut missing,
        "availability",
        first_text(session, &AVAILABILITY, |_| Ok(())).await,
    );

    let url = session.state().current_url().to_string();
    let product_code = session
        .state()
        .last_query()
        .map(str::to_string)
        .or(page_sku)
        .unwrap_or_else(|| code_from_url(&url));

    tracing::info!(
        product_code = %product_code,
        url = %url,
        specifications = specifications.len(),
        missing = missing.len(),
        "product extracted"
    );

    Ok(Extraction {
        record: ProductRecord {
            product_code,
            product_name,
            model_number,
            description,
            price,
            currency,
            specifications,
            availability,
            url,
        },
        missing,
    })
}

fn keep<T>(missing: &mut Vec<MissingField>, field: &'static str, result: Field<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(reason) => {
            note(missing, field, reason);
            None
        }
    }
}

fn note(missing: &mut Vec<MissingField>, field: &'static str, reason: AbsentReason) {
    tracing::debug!(field, reason = %reason, "field absent");
    missing.push(MissingField { field, reason });
}

fn accept_description(text: &str) -> Result<(), String> {
    if text.chars().count() < MIN_DESCRIPTION_CHARS {
        return Err(format!("shorter than {MIN_DESCRIPTION_CHARS} characters"));
    }
    Ok(())
}

/// Text of the first element, across the chain's candidates in order, that
/// is non-empty and passes `accept`.
async fn first_text<D, F>(session: &mut Session<D>, spec: &LocatorSpec, accept: F) -> Field<String>
where
    D: Driver,
    F: Fn(&str) -> Result<(), String>,
{
    let mut rejection = None;
    for (candidate, locator) in spec.candidates.iter().enumerate() {
        let elements = session.lookup(locator, None).await.map_err(driver_reason)?;
        let Some(element) = elements.first() else {
            continue;
        };
        let text = session.text(element).await.map_err(driver_reason)?;
        if text.is_empty() {
            continue;
        }
        match accept(&text) {
            Ok(()) => {
                if candidate > 0 {
                    tracing::debug!(locator = spec.name, candidate, strategy = %locator, "field read through fallback");
                }
                return Ok(text);
            }
            Err(reason) => rejection = Some(reason),
        }
    }
    Err(match rejection {
        Some(reason) => AbsentReason::Rejected {
            locator: spec.name,
            reason,
        },
        None => AbsentReason::LocatorExhausted { locator: spec.name },
    })
}

#[allow(clippy::needless_pass_by_value)]
fn driver_reason(err: crate::error::DriverError) -> AbsentReason {
    AbsentReason::Driver {
        message: err.to_string(),
    }
}

/// Clicks every expander toggle it can find so collapsed sections render.
async fn expand_sections<D: Driver>(session: &mut Session<D>) {
    let mut clicked = 0usize;
    for locator in SECTION_EXPANDERS.candidates {
        let element = match session.lookup(locator, None).await {
            Ok(elements) => elements.into_iter().next(),
            Err(e) => {
                tracing::debug!(strategy = %locator, error = %e, "expander lookup failed");
                continue;
            }
        };
        let Some(element) = element else { continue };
        match session.click(&element).await {
            Ok(()) => clicked += 1,
            Err(e) => tracing::debug!(strategy = %locator, error = %e, "expander click failed"),
        }
    }
    if clicked > 0 {
        tracing::debug!(clicked, "expanded detail sections");
    }
}

async fn model_number<D: Driver>(
    session: &mut Session<D>,
    specifications: &Specifications,
) -> Field<String> {
    match first_text(session, &MODEL_NUMBER, |_| Ok(())).await {
        Ok(model) => Ok(model),
        Err(reason) => MODEL_NUMBER_KEYS
            .iter()
            .find_map(|key| specifications.get_ignore_case(key))
            .map(str::to_string)
            .ok_or(reason),
    }
}

async fn extract_price<D: Driver>(session: &mut Session<D>) -> Field<Price> {
    if let Some(price) = microdata_price(session).await.map_err(driver_reason)? {
        return Ok(price);
    }
    let raw = first_text(session, &PRICE, |_| Ok(())).await?;
    parse_price(&raw).ok_or(AbsentReason::Unparseable { raw })
}

/// `itemprop="price"` and `itemprop="priceCurrency"` read from their
/// `content` attribute, falling back to element text.
async fn microdata_price<D: Driver>(
    session: &mut Session<D>,
) -> Result<Option<Price>, crate::error::DriverError> {
    let Some(amount) = session.find(&PRICE_AMOUNT, None).await? else {
        return Ok(None);
    };
    let Some(currency) = session.find(&PRICE_CURRENCY, None).await? else {
        return Ok(None);
    };
    let amount = content_or_text(session, &amount.element).await?;
    let currency = content_or_text(session, &currency.element).await?;
    Ok(split_price(&amount, &currency))
}

async fn content_or_text<D: Driver>(
    session: &mut Session<D>,
    element: &D::Element,
) -> Result<String, crate::error::DriverError> {
    match session.attribute(element, "content").await? {
        Some(content) if !content.trim().is_empty() => Ok(content),
        _ => session.text(element).await,
    }
}

/// Tries each specification layout in turn and keeps the first that yields
/// at least one pair.
async fn extract_specifications<D: Driver>(session: &mut Session<D>) -> Specifications {
    let sources: [(&LocatorSpec, &Locator); 2] = [
        (&SPEC_LIST_ROWS, &SPEC_LIST_CELLS),
        (&SPEC_TABLE_ROWS, &SPEC_TABLE_CELLS),
    ];
    for (rows, cells) in sources {
        for locator in rows.candidates {
            match row_cells(session, locator, cells).await {
                Ok(table) => {
                    let specs = fold_spec_rows(table);
                    if !specs.is_empty() {
                        tracing::debug!(strategy = %locator, pairs = specs.len(), "specifications found");
                        return specs;
                    }
                }
                Err(e) => tracing::debug!(strategy = %locator, error = %e, "specification lookup failed"),
            }
        }
    }

    for locator in SPEC_DEFINITION_LISTS.candidates {
        match definition_pairs(session, locator).await {
            Ok(pairs) => {
                let specs = fold_spec_rows(pairs);
                if !specs.is_empty() {
                    tracing::debug!(strategy = %locator, pairs = specs.len(), "specifications found");
                    return specs;
                }
            }
            Err(e) => tracing::debug!(strategy = %locator, error = %e, "specification lookup failed"),
        }
    }

    match labelled_pairs(session).await {
        Ok(specs) => {
            if specs.is_empty() {
                tracing::debug!(field = "specifications", "no specification source matched");
            }
            specs
        }
        Err(e) => {
            tracing::debug!(error = %e, "labelled specification lookup failed");
            Specifications::new()
        }
    }
}

async fn row_cells<D: Driver>(
    session: &mut Session<D>,
    rows: &Locator,
    cells: &Locator,
) -> Result<Vec<Vec<String>>, crate::error::DriverError> {
    let mut table = Vec::new();
    for row in session.lookup(rows, None).await? {
        let mut texts = Vec::new();
        for cell in session.lookup(cells, Some(&row)).await? {
            texts.push(session.text(&cell).await?);
        }
        table.push(texts);
    }
    Ok(table)
}

async fn definition_pairs<D: Driver>(
    session: &mut Session<D>,
    lists: &Locator,
) -> Result<Vec<Vec<String>>, crate::error::DriverError> {
    let mut pairs = Vec::new();
    for list in session.lookup(lists, None).await? {
        let terms = session.lookup(&SPEC_TERMS, Some(&list)).await?;
        let definitions = session.lookup(&SPEC_DEFINITIONS, Some(&list)).await?;
        for (term, definition) in terms.iter().zip(definitions.iter()) {
            pairs.push(vec![
                session.text(term).await?,
                session.text(definition).await?,
            ]);
        }
    }
    Ok(pairs)
}

async fn labelled_pairs<D: Driver>(
    session: &mut Session<D>,
) -> Result<Specifications, crate::error::DriverError> {
    let mut specs = Specifications::new();
    for element in session.find_all(&SPEC_LABELLED, None).await? {
        let text = session.text(&element).await?;
        if let Some((key, value)) = split_labelled(&text) {
            specs.insert(key, value);
        }
    }
    Ok(specs)
}

/// Last non-empty path segment of `url`, used as the product code when the
/// page was reached without a search.
fn code_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()?
                .rev()
                .find(|s| !s.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_default()
}
