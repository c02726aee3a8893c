use avsc_core::CountryIndex;

use crate::driver::Driver;
use crate::error::ScraperError;
use crate::locale::{self, Resolution};
use crate::session::Session;

/// Reads every country link in the popup on the current page, grouped by
/// region heading.
///
/// Links without an `href` are kept with no URL; a country listed twice
/// keeps its first entry. The popup is left open.
///
/// # Errors
///
/// [`ScraperError::HarvestUnavailable`] when no popup is shown, otherwise
/// the errors of [`locale::resolve`] tagged with the harvest stage. A
/// failed harvest never sets the session's locale.
pub async fn harvest<D: Driver>(session: &mut Session<D>) -> Result<CountryIndex, ScraperError> {
    match locale::enumerate(session).await? {
        Resolution::Enumerated(index) => Ok(index),
        Resolution::PopupAbsent { .. } | Resolution::Resolved(_) => {
            Err(ScraperError::HarvestUnavailable {
                url: session.state().current_url().to_string(),
            })
        }
    }
}
