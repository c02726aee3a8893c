//! One browser session plus the page-level state the scraper tracks on it.

use std::time::{Duration, Instant};

use avsc_core::{Locale, Timeouts};

use crate::driver::{Driver, ENTER_KEY};
use crate::error::{DriverError, ScraperError, Stage};
use crate::locator::{Locator, LocatorSpec};
use crate::parse::normalize_space;

/// What is known about the country popup on the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopupState {
    /// Not checked since the last navigation.
    #[default]
    Unknown,
    /// Checked and not shown; the site picked a locale on its own.
    Absent,
    /// Shown and not yet acted on.
    Present,
    /// A country was clicked and the popup went away.
    Resolved,
    /// The popup was read without selecting anything.
    Enumerated,
}

/// Page-level state carried across operations on one [`Session`].
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub(crate) popup: PopupState,
    pub(crate) current_locale: Option<Locale>,
    pub(crate) current_url: String,
    pub(crate) last_query: Option<String>,
}

impl SessionState {
    #[must_use]
    pub fn popup(&self) -> PopupState {
        self.popup
    }

    #[must_use]
    pub fn current_locale(&self) -> Option<&Locale> {
        self.current_locale.as_ref()
    }

    #[must_use]
    pub fn current_url(&self) -> &str {
        &self.current_url
    }

    /// Product code most recently submitted through the search box.
    #[must_use]
    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }
}

/// An element found through a [`LocatorSpec`], with the candidate that hit.
#[derive(Debug, Clone)]
pub struct Resolved<E> {
    pub element: E,
    /// Index into [`LocatorSpec::candidates`]; `0` is the primary strategy.
    pub candidate: usize,
    pub locator: Locator,
}

#[derive(Debug)]
pub enum WaitOutcome<T> {
    Found(T),
    TimedOut { waited: Duration },
}

/// A live browser session.
///
/// Operations take `&mut Session`, so one session is only ever driven by one
/// caller at a time. Call [`Session::close`] when done; dropping an open
/// session logs a warning because the browser may be left running.
pub struct Session<D: Driver> {
    driver: D,
    timeouts: Timeouts,
    state: SessionState,
    closed: bool,
}

impl<D: Driver> Session<D> {
    #[must_use]
    pub fn new(driver: D, timeouts: Timeouts) -> Self {
        Self {
            driver,
            timeouts,
            state: SessionState::default(),
            closed: false,
        }
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    #[must_use]
    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    #[must_use]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Loads `url`. Resets what is known about the popup and forgets the last
    /// search query, since the new page is no longer its result; the current
    /// locale is kept because the site remembers it across pages.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Navigation`] if the browser cannot load the URL.
    pub async fn navigate(&mut self, url: &str) -> Result<(), ScraperError> {
        let nav_err = |source| ScraperError::Navigation {
            url: url.to_string(),
            source,
        };
        if self.closed {
            return Err(nav_err(DriverError::Closed));
        }
        tracing::debug!(url, "navigating");
        self.driver.goto(url).await.map_err(nav_err)?;
        self.state.popup = PopupState::Unknown;
        self.state.last_query = None;
        self.state.current_url = self.driver.current_url().await.map_err(nav_err)?;
        Ok(())
    }

    /// Re-reads the browser's URL into the session state.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Driver`] tagged with `stage` on driver failure.
    pub async fn refresh_url(&mut self, stage: Stage) -> Result<&str, ScraperError> {
        self.state.current_url = self
            .driver
            .current_url()
            .await
            .map_err(ScraperError::driver(stage))?;
        Ok(&self.state.current_url)
    }

    /// Runs a single locator. No fallbacks, no waiting.
    ///
    /// # Errors
    ///
    /// Propagates driver failures.
    pub async fn lookup(
        &mut self,
        locator: &Locator,
        scope: Option<&D::Element>,
    ) -> Result<Vec<D::Element>, DriverError> {
        if self.closed {
            return Err(DriverError::Closed);
        }
        self.driver.find_all(scope, locator).await
    }

    /// Walks the chain once, in order, and returns the first element found.
    ///
    /// # Errors
    ///
    /// Propagates driver failures.
    pub async fn find(
        &mut self,
        spec: &LocatorSpec,
        scope: Option<&D::Element>,
    ) -> Result<Option<Resolved<D::Element>>, DriverError> {
        for (candidate, locator) in spec.candidates.iter().enumerate() {
            let found = self.lookup(locator, scope).await?;
            if let Some(element) = found.into_iter().next() {
                if candidate > 0 {
                    tracing::debug!(
                        locator = spec.name,
                        candidate,
                        strategy = %locator,
                        "resolved through fallback"
                    );
                }
                return Ok(Some(Resolved {
                    element,
                    candidate,
                    locator: *locator,
                }));
            }
        }
        Ok(None)
    }

    /// Like [`Session::find`], but returns every element matched by the
    /// first candidate that matches anything.
    ///
    /// # Errors
    ///
    /// Propagates driver failures.
    pub async fn find_all(
        &mut self,
        spec: &LocatorSpec,
        scope: Option<&D::Element>,
    ) -> Result<Vec<D::Element>, DriverError> {
        for locator in spec.candidates {
            let found = self.lookup(locator, scope).await?;
            if !found.is_empty() {
                return Ok(found);
            }
        }
        Ok(Vec::new())
    }

    /// Polls the chain until something resolves or `timeout` elapses.
    ///
    /// Every tick walks all candidates in order, so a fallback never wins
    /// over a primary that resolves in the same tick. At least one probe is
    /// made even with a zero timeout.
    ///
    /// # Errors
    ///
    /// Propagates driver failures.
    pub async fn poll(
        &mut self,
        spec: &LocatorSpec,
        timeout: Duration,
    ) -> Result<WaitOutcome<Resolved<D::Element>>, DriverError> {
        let deadline = Deadline::start(timeout, self.timeouts.poll_interval);
        loop {
            if let Some(resolved) = self.find(spec, None).await? {
                return Ok(WaitOutcome::Found(resolved));
            }
            if !deadline.tick().await {
                return Ok(WaitOutcome::TimedOut {
                    waited: deadline.elapsed(),
                });
            }
        }
    }

    /// Polls several chains at once and reports which one resolved first
    /// (by index into `specs`). Within a tick, earlier chains win.
    ///
    /// # Errors
    ///
    /// Propagates driver failures.
    pub async fn poll_any(
        &mut self,
        specs: &[LocatorSpec],
        timeout: Duration,
    ) -> Result<WaitOutcome<(usize, Resolved<D::Element>)>, DriverError> {
        let deadline = Deadline::start(timeout, self.timeouts.poll_interval);
        loop {
            for (index, spec) in specs.iter().enumerate() {
                if let Some(resolved) = self.find(spec, None).await? {
                    return Ok(WaitOutcome::Found((index, resolved)));
                }
            }
            if !deadline.tick().await {
                return Ok(WaitOutcome::TimedOut {
                    waited: deadline.elapsed(),
                });
            }
        }
    }

    /// Polls until no candidate of the chain resolves.
    ///
    /// # Errors
    ///
    /// Propagates driver failures.
    pub async fn poll_gone(
        &mut self,
        spec: &LocatorSpec,
        timeout: Duration,
    ) -> Result<WaitOutcome<()>, DriverError> {
        let deadline = Deadline::start(timeout, self.timeouts.poll_interval);
        loop {
            if self.find(spec, None).await?.is_none() {
                return Ok(WaitOutcome::Found(()));
            }
            if !deadline.tick().await {
                return Ok(WaitOutcome::TimedOut {
                    waited: deadline.elapsed(),
                });
            }
        }
    }

    /// [`Session::poll`] with a timeout that is fatal for `stage`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Timeout`] naming the chain and current URL, or
    /// [`ScraperError::Driver`] on driver failure.
    pub async fn wait_for(
        &mut self,
        spec: &LocatorSpec,
        timeout: Duration,
        stage: Stage,
    ) -> Result<Resolved<D::Element>, ScraperError> {
        match self
            .poll(spec, timeout)
            .await
            .map_err(ScraperError::driver(stage))?
        {
            WaitOutcome::Found(resolved) => Ok(resolved),
            WaitOutcome::TimedOut { waited } => Err(self.timeout_error(stage, spec.name, waited)),
        }
    }

    pub(crate) fn timeout_error(
        &self,
        stage: Stage,
        locator: &str,
        waited: Duration,
    ) -> ScraperError {
        ScraperError::Timeout {
            stage,
            url: self.state.current_url.clone(),
            locator: locator.to_string(),
            waited_ms: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Element text with whitespace runs collapsed and ends trimmed.
    ///
    /// # Errors
    ///
    /// Propagates driver failures.
    pub async fn text(&mut self, element: &D::Element) -> Result<String, DriverError> {
        Ok(normalize_space(&self.driver.text(element).await?))
    }

    /// # Errors
    ///
    /// Propagates driver failures.
    pub async fn attribute(
        &mut self,
        element: &D::Element,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        self.driver.attribute(element, name).await
    }

    /// # Errors
    ///
    /// Propagates driver failures.
    pub async fn click(&mut self, element: &D::Element) -> Result<(), DriverError> {
        self.driver.click(element).await
    }

    /// Clears the field and types `text` into it.
    ///
    /// # Errors
    ///
    /// Propagates driver failures.
    pub async fn fill(&mut self, element: &D::Element, text: &str) -> Result<(), DriverError> {
        self.driver.clear(element).await?;
        self.driver.send_keys(element, text).await
    }

    /// # Errors
    ///
    /// Propagates driver failures.
    pub async fn press_enter(&mut self, element: &D::Element) -> Result<(), DriverError> {
        self.driver.send_keys(element, ENTER_KEY).await
    }

    /// Ends the browser session. Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Driver`] if the browser refuses to quit. The
    /// session counts as closed either way.
    pub async fn close(&mut self) -> Result<(), ScraperError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        tracing::debug!(url = %self.state.current_url, "closing browser session");
        self.driver
            .quit()
            .await
            .map_err(ScraperError::driver(Stage::Close))
    }
}

impl<D: Driver> Drop for Session<D> {
    fn drop(&mut self) {
        if !self.closed {
            tracing::warn!(
                url = %self.state.current_url,
                "browser session dropped without close; the browser may still be running"
            );
        }
    }
}

/// Poll bookkeeping: sleeps one interval per tick, never past the deadline.
struct Deadline {
    started: Instant,
    end: Instant,
    interval: Duration,
}

impl Deadline {
    fn start(timeout: Duration, interval: Duration) -> Self {
        let started = Instant::now();
        Self {
            started,
            end: started + timeout,
            interval,
        }
    }

    /// Sleeps until the next probe. Returns `false` once the deadline has
    /// passed, meaning no further probe should be made.
    async fn tick(&self) -> bool {
        let now = Instant::now();
        if now >= self.end {
            return false;
        }
        tokio::time::sleep(self.interval.min(self.end - now)).await;
        true
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
