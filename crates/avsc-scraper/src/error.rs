use std::fmt;

use thiserror::Error;

/// The step of a scrape run an error belongs to, reported to the user so a
/// failed run says where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Launch,
    Navigate,
    Locale,
    Search,
    Extract,
    Harvest,
    Close,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Launch => "launch",
            Stage::Navigate => "navigate",
            Stage::Locale => "locale",
            Stage::Search => "search",
            Stage::Extract => "extract",
            Stage::Harvest => "harvest",
            Stage::Close => "close",
        };
        f.write_str(name)
    }
}

/// A browser command that failed inside the driver backend.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("WebDriver command failed: {0}")]
    Command(String),

    #[error("stale element reference: {0}")]
    StaleElement(String),

    #[error("browser session is already closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("failed to launch browser via {webdriver_url}: {reason}")]
    Launch {
        webdriver_url: String,
        reason: String,
    },

    #[error("navigation to {url} failed: {source}")]
    Navigation {
        url: String,
        #[source]
        source: DriverError,
    },

    #[error("{stage} stage timed out after {waited_ms}ms waiting for `{locator}` on {url}")]
    Timeout {
        stage: Stage,
        url: String,
        locator: String,
        waited_ms: u64,
    },

    #[error(
        "no country matching \"{requested}\" in the country popup ({} entries listed)",
        .available.len()
    )]
    LocaleNotFound {
        requested: String,
        available: Vec<String>,
    },

    #[error("{operation} requires {requirement}")]
    Precondition {
        stage: Stage,
        operation: &'static str,
        requirement: &'static str,
    },

    #[error("unexpected page structure on {url}: `{locator}` did not resolve")]
    PageStructure {
        stage: Stage,
        url: String,
        locator: String,
    },

    #[error("country popup is not open on {url}; nothing to harvest")]
    HarvestUnavailable { url: String },

    #[error("{stage} stage: {source}")]
    Driver {
        stage: Stage,
        #[source]
        source: DriverError,
    },
}

impl ScraperError {
    /// Which stage of the run produced this error.
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            ScraperError::Launch { .. } => Stage::Launch,
            ScraperError::Navigation { .. } => Stage::Navigate,
            ScraperError::LocaleNotFound { .. } => Stage::Locale,
            ScraperError::HarvestUnavailable { .. } => Stage::Harvest,
            ScraperError::Timeout { stage, .. }
            | ScraperError::Precondition { stage, .. }
            | ScraperError::PageStructure { stage, .. }
            | ScraperError::Driver { stage, .. } => *stage,
        }
    }

    pub(crate) fn driver(stage: Stage) -> impl FnOnce(DriverError) -> ScraperError {
        move |source| ScraperError::Driver { stage, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_names_url_and_locator() {
        let err = ScraperError::Timeout {
            stage: Stage::Search,
            url: "https://shop.test/us/".into(),
            locator: "product_root|no_results".into(),
            waited_ms: 15_000,
        };
        let msg = err.to_string();
        assert!(msg.contains("https://shop.test/us/"), "{msg}");
        assert!(msg.contains("product_root|no_results"), "{msg}");
        assert_eq!(err.stage(), Stage::Search);
    }

    #[test]
    fn locale_not_found_counts_available_entries() {
        let err = ScraperError::LocaleNotFound {
            requested: "Atlantis".into(),
            available: vec!["USA".into(), "Canada".into()],
        };
        assert_eq!(
            err.to_string(),
            "no country matching \"Atlantis\" in the country popup (2 entries listed)"
        );
        assert_eq!(err.stage(), Stage::Locale);
    }

    #[test]
    fn precondition_reports_the_stage_that_raised_it() {
        let err = ScraperError::Precondition {
            stage: Stage::Locale,
            operation: "enter_locale",
            requirement: "a locale with a URL",
        };
        assert_eq!(err.stage(), Stage::Locale);
        assert_eq!(err.to_string(), "enter_locale requires a locale with a URL");
    }

    #[test]
    fn driver_error_keeps_its_stage() {
        let err = ScraperError::driver(Stage::Harvest)(DriverError::Closed);
        assert_eq!(err.stage(), Stage::Harvest);
    }
}
