use async_trait::async_trait;

use crate::error::DriverError;
use crate::locator::Locator;

/// `WebDriver` key code for Enter.
pub const ENTER_KEY: &str = "\u{E007}";

/// The browser primitives the scraper needs.
///
/// Implemented by [`crate::WebDriverBrowser`] for a real browser and by a
/// scripted in-memory page in tests. Every method is one round trip; waiting
/// and fallback chains live in [`crate::Session`].
#[async_trait]
pub trait Driver: Send {
    /// Handle to an element on the current page. Stale after navigation.
    type Element: Clone + Send + Sync + std::fmt::Debug;

    async fn goto(&mut self, url: &str) -> Result<(), DriverError>;

    async fn current_url(&mut self) -> Result<String, DriverError>;

    /// All elements matching `locator`, in document order. Searches below
    /// `scope` when given, otherwise the whole page.
    async fn find_all(
        &mut self,
        scope: Option<&Self::Element>,
        locator: &Locator,
    ) -> Result<Vec<Self::Element>, DriverError>;

    /// Rendered text of the element including its descendants.
    async fn text(&mut self, element: &Self::Element) -> Result<String, DriverError>;

    async fn attribute(
        &mut self,
        element: &Self::Element,
        name: &str,
    ) -> Result<Option<String>, DriverError>;

    async fn click(&mut self, element: &Self::Element) -> Result<(), DriverError>;

    async fn clear(&mut self, element: &Self::Element) -> Result<(), DriverError>;

    async fn send_keys(&mut self, element: &Self::Element, keys: &str)
        -> Result<(), DriverError>;

    /// Ends the browser session. Called at most once per session.
    async fn quit(&mut self) -> Result<(), DriverError>;
}
