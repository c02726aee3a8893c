//! Browser-driven scraping of the Avantor Sciences catalog.
//!
//! A [`Session`] owns one browser. [`locale`] gets past the country popup,
//! [`search`] finds a product by code, [`extract`] reads the product page,
//! and [`harvest`] lists every country site the popup offers.

pub mod driver;
pub mod error;
pub mod extract;
pub mod harvest;
pub mod locale;
pub mod locator;
pub mod parse;
pub mod search;
pub mod session;
pub mod webdriver;

pub use driver::Driver;
pub use error::{DriverError, ScraperError, Stage};
pub use extract::{extract, extract_detailed, AbsentReason, Extraction, MissingField};
pub use harvest::harvest;
pub use locale::{enter_locale, resolve, select, select_first, LocaleRequest, Resolution};
pub use locator::{Locator, LocatorSpec, Strategy, TextMatch};
pub use search::{search, SearchOutcome};
pub use session::{PopupState, Resolved, Session, SessionState, WaitOutcome};
pub use webdriver::{probe_webdriver, WebDriverBrowser};
