use std::time::Duration;

use crate::driver::Driver;
use crate::error::{ScraperError, Stage};
use crate::locator::catalog::{NO_RESULTS, PRODUCT_ROOT, SEARCH_INPUT, SEARCH_SUBMIT};
use crate::locator::LocatorSpec;
use crate::session::{Session, WaitOutcome};

/// Markers that end a search: a product page or an empty result page.
const SEARCH_OUTCOMES: [LocatorSpec; 2] = [PRODUCT_ROOT, NO_RESULTS];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The search landed on a product detail page.
    Found { url: String },
    /// The site reported no match for the code.
    NotFound,
}

/// Types `product_code` into the site search and waits for the outcome.
///
/// A page that already shows an outcome marker (the previous product, or a
/// previous empty result) is left for the locale's home page first. Enter
/// is pressed first. If neither outcome marker shows up within the
/// submit grace period, the search button is clicked (when one resolves)
/// and the full search timeout applies from there.
///
/// # Errors
///
/// - [`ScraperError::Precondition`] when no locale has been established on
///   the session or the code is blank.
/// - [`ScraperError::Timeout`] when the search box never appears or the
///   search produces neither outcome in time.
/// - [`ScraperError::Navigation`] when the locale home page cannot be
///   reloaded.
/// - [`ScraperError::Driver`] on browser failure.
pub async fn search<D: Driver>(
    session: &mut Session<D>,
    product_code: &str,
) -> Result<SearchOutcome, ScraperError> {
    if session.state().current_locale().is_none() {
        return Err(ScraperError::Precondition {
            stage: Stage::Search,
            operation: "search",
            requirement: "a resolved locale",
        });
    }
    let code = product_code.trim();
    if code.is_empty() {
        return Err(ScraperError::Precondition {
            stage: Stage::Search,
            operation: "search",
            requirement: "a non-empty product code",
        });
    }

    leave_previous_outcome(session).await?;

    let timeouts = session.timeouts();
    let input = session
        .wait_for(&SEARCH_INPUT, timeouts.element, Stage::Search)
        .await?;
    tracing::debug!(product_code = code, strategy = %input.locator, "submitting search");
    session
        .fill(&input.element, code)
        .await
        .map_err(ScraperError::driver(Stage::Search))?;
    session
        .press_enter(&input.element)
        .await
        .map_err(ScraperError::driver(Stage::Search))?;
    session.state_mut().last_query = Some(code.to_string());

    let mut outcome = session
        .poll_any(&SEARCH_OUTCOMES, timeouts.submit_grace)
        .await
        .map_err(ScraperError::driver(Stage::Search))?;

    if matches!(outcome, WaitOutcome::TimedOut { .. }) {
        match session
            .find(&SEARCH_SUBMIT, None)
            .await
            .map_err(ScraperError::driver(Stage::Search))?
        {
            Some(button) => {
                tracing::debug!(strategy = %button.locator, "Enter did not submit; clicking search button");
                session
                    .click(&button.element)
                    .await
                    .map_err(ScraperError::driver(Stage::Search))?;
            }
            None => tracing::debug!("no search button found; waiting on Enter submission"),
        }
        outcome = session
            .poll_any(&SEARCH_OUTCOMES, timeouts.search)
            .await
            .map_err(ScraperError::driver(Stage::Search))?;
    }

    session.refresh_url(Stage::Search).await?;
    match outcome {
        WaitOutcome::Found((0, _)) => {
            let url = session.state().current_url().to_string();
            tracing::info!(product_code = code, url = %url, "product page reached");
            Ok(SearchOutcome::Found { url })
        }
        WaitOutcome::Found(_) => {
            tracing::info!(product_code = code, "search returned no results");
            Ok(SearchOutcome::NotFound)
        }
        WaitOutcome::TimedOut { waited } => Err(session.timeout_error(
            Stage::Search,
            &format!("{}|{}", PRODUCT_ROOT.name, NO_RESULTS.name),
            waited,
        )),
    }
}

/// Navigates to the current locale's home page when the page still shows a
/// product or no-results marker, which would otherwise satisfy the outcome
/// wait before the new search has loaded.
async fn leave_previous_outcome<D: Driver>(session: &mut Session<D>) -> Result<(), ScraperError> {
    let stale = session
        .poll_any(&SEARCH_OUTCOMES, Duration::ZERO)
        .await
        .map_err(ScraperError::driver(Stage::Search))?;
    let WaitOutcome::Found((index, _)) = stale else {
        return Ok(());
    };
    let Some(home) = session
        .state()
        .current_locale()
        .and_then(|locale| locale.url.clone())
    else {
        tracing::debug!(
            marker = SEARCH_OUTCOMES[index].name,
            "previous outcome still shown; no locale URL to reset to"
        );
        return Ok(());
    };
    tracing::debug!(
        marker = SEARCH_OUTCOMES[index].name,
        home = %home,
        "leaving previous search outcome"
    );
    session.navigate(&home).await
}
