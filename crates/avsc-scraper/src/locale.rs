//! Country popup handling: detect it, pick a country from it, or read it.
//!
//! The vendor shows a modal listing every country site, grouped into region
//! columns, on first visit. Returning visitors (cookie set) get no popup and
//! land on whatever locale the site picks; that case is reported as
//! [`Resolution::PopupAbsent`] rather than as an error.

use avsc_core::{CountryIndex, Locale};

use crate::driver::Driver;
use crate::error::{ScraperError, Stage};
use crate::locator::catalog::{
    COOKIE_ACCEPT, POPUP_LINKS, POPUP_ROOT, REGION_BLOCK, REGION_HEADING, REGION_LINKS,
};
use crate::session::{PopupState, Session, WaitOutcome};

/// Heading used for popup columns that have none.
pub const UNKNOWN_REGION: &str = "Unknown";

/// Locale name reported when the popup is absent and the URL carries no
/// recognizable locale prefix.
pub const DEFAULT_LOCALE: &str = "default";

/// Names the vendor uses interchangeably for the same country site.
const COUNTRY_ALIASES: &[&[&str]] = &[
    &["USA", "United States", "US"],
    &["United Kingdom", "UK"],
    &["China Mainland", "China"],
];

/// Names shorter than this only match exactly, never as a substring
/// (`"US"` would otherwise hit `"Russia"` and `"Austria"`).
const MIN_SUBSTRING_LEN: usize = 3;

/// URL path prefixes the vendor serves locales under, with the popup name
/// and region each corresponds to.
const KNOWN_PREFIXES: &[(&str, &str, &str)] = &[
    ("us", "USA", "North America"),
    ("ca", "Canada", "North America"),
    ("mx", "Mexico", "North America"),
    ("br", "Brazil", "Latin America"),
    ("uk", "United Kingdom", "Europe"),
    ("gb", "United Kingdom", "Europe"),
    ("de", "Germany", "Europe"),
    ("fr", "France", "Europe"),
    ("it", "Italy", "Europe"),
    ("es", "Spain", "Europe"),
    ("nl", "Netherlands", "Europe"),
    ("be", "Belgium", "Europe"),
    ("at", "Austria", "Europe"),
    ("ch", "Switzerland", "Europe"),
    ("se", "Sweden", "Europe"),
    ("pl", "Poland", "Europe"),
    ("ie", "Ireland", "Europe"),
    ("in", "India", "Asia/Pacific"),
    ("cn", "China Mainland", "Asia/Pacific"),
    ("jp", "Japan", "Asia/Pacific"),
    ("kr", "Korea", "Asia/Pacific"),
    ("sg", "Singapore", "Asia/Pacific"),
    ("au", "Australia", "Asia/Pacific"),
];

/// What [`resolve`] should do with the popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocaleRequest {
    /// Click the country with this name (aliases and substrings allowed).
    Named(String),
    /// Click the first country listed.
    First,
    /// Read every country without clicking anything.
    Enumerate,
}

impl LocaleRequest {
    /// Stage reported for failures while serving this request.
    fn stage(&self) -> Stage {
        match self {
            LocaleRequest::Enumerate => Stage::Harvest,
            LocaleRequest::Named(_) | LocaleRequest::First => Stage::Locale,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// No popup appeared; the site chose `ambient` on its own.
    PopupAbsent { ambient: Locale },
    /// A country was clicked and the popup closed.
    Resolved(Locale),
    /// The popup was read in full.
    Enumerated(CountryIndex),
}

/// A country link read from the popup.
#[derive(Debug, Clone)]
pub(crate) struct PopupLink<E> {
    pub(crate) region: String,
    pub(crate) name: String,
    pub(crate) href: Option<String>,
    pub(crate) element: E,
}

/// Handles the country popup on the current page according to `request`.
///
/// A cookie banner, if shown, is accepted first. Detection waits at most
/// the popup timeout; not finding the popup is not an error. Only the
/// selecting requests adopt the ambient locale when the popup is absent;
/// [`LocaleRequest::Enumerate`] leaves the session's locale untouched.
///
/// # Errors
///
/// - [`ScraperError::LocaleNotFound`] when no link matches a named request.
/// - [`ScraperError::PageStructure`] when the popup shows no country links.
/// - [`ScraperError::Timeout`] when the popup stays open after a click.
/// - [`ScraperError::Driver`] on browser failure.
pub async fn resolve<D: Driver>(
    session: &mut Session<D>,
    request: &LocaleRequest,
) -> Result<Resolution, ScraperError> {
    let stage = request.stage();
    dismiss_cookie_banner(session).await;

    if !detect_popup(session, stage).await? {
        let ambient = ambient_locale(session.state().current_url());
        if *request == LocaleRequest::Enumerate {
            tracing::info!(
                url = %session.state().current_url(),
                "country popup absent; nothing to enumerate"
            );
            return Ok(Resolution::PopupAbsent { ambient });
        }
        tracing::info!(
            locale = %ambient.name,
            url = %session.state().current_url(),
            "country popup absent; using locale chosen by the site"
        );
        session.state_mut().current_locale = Some(ambient.clone());
        return Ok(Resolution::PopupAbsent { ambient });
    }

    let links = collect_popup_links(session, stage).await?;
    if links.is_empty() {
        return Err(ScraperError::PageStructure {
            stage,
            url: session.state().current_url().to_string(),
            locator: POPUP_LINKS.name.to_string(),
        });
    }

    let chosen = match request {
        LocaleRequest::Enumerate => {
            let index = build_index(&links);
            session.state_mut().popup = PopupState::Enumerated;
            tracing::info!(
                regions = index.regions().len(),
                countries = index.len(),
                "country popup enumerated"
            );
            return Ok(Resolution::Enumerated(index));
        }
        LocaleRequest::First => &links[0],
        LocaleRequest::Named(name) => {
            let names: Vec<&str> = links.iter().map(|l| l.name.as_str()).collect();
            let Some(position) = pick_link(&names, name) else {
                return Err(ScraperError::LocaleNotFound {
                    requested: name.clone(),
                    available: names.iter().map(|n| (*n).to_string()).collect(),
                });
            };
            &links[position]
        }
    };

    let locale = Locale {
        name: chosen.name.clone(),
        region_label: chosen.region.clone(),
        url: chosen.href.clone(),
    };
    tracing::debug!(locale = %locale.name, region = %locale.region_label, "selecting country");
    session
        .click(&chosen.element)
        .await
        .map_err(ScraperError::driver(Stage::Locale))?;

    let timeout = session.timeouts().element;
    match session
        .poll_gone(&POPUP_ROOT, timeout)
        .await
        .map_err(ScraperError::driver(Stage::Locale))?
    {
        WaitOutcome::Found(()) => {}
        WaitOutcome::TimedOut { waited } => {
            return Err(session.timeout_error(Stage::Locale, POPUP_ROOT.name, waited));
        }
    }

    session.refresh_url(Stage::Locale).await?;
    let state = session.state_mut();
    state.popup = PopupState::Resolved;
    state.current_locale = Some(locale.clone());
    tracing::info!(locale = %locale.name, url = %state.current_url, "country selected");
    Ok(Resolution::Resolved(locale))
}

/// Selects the country named `name`.
///
/// # Errors
///
/// See [`resolve`].
pub async fn select<D: Driver>(
    session: &mut Session<D>,
    name: &str,
) -> Result<Resolution, ScraperError> {
    resolve(session, &LocaleRequest::Named(name.to_string())).await
}

/// Selects whichever country the popup lists first.
///
/// # Errors
///
/// See [`resolve`].
pub async fn select_first<D: Driver>(
    session: &mut Session<D>,
) -> Result<Resolution, ScraperError> {
    resolve(session, &LocaleRequest::First).await
}

/// Reads the popup into a [`CountryIndex`] without selecting anything.
///
/// # Errors
///
/// See [`resolve`].
pub async fn enumerate<D: Driver>(session: &mut Session<D>) -> Result<Resolution, ScraperError> {
    resolve(session, &LocaleRequest::Enumerate).await
}

/// Opens a locale straight from its URL (as recorded in a harvested index)
/// and confirms it, selecting it in the popup if the site shows one anyway.
///
/// # Errors
///
/// [`ScraperError::Precondition`] if `locale` has no URL, otherwise the
/// errors of [`Session::navigate`] and [`resolve`].
pub async fn enter_locale<D: Driver>(
    session: &mut Session<D>,
    locale: &Locale,
) -> Result<Resolution, ScraperError> {
    let Some(url) = locale.url.as_deref() else {
        return Err(ScraperError::Precondition {
            stage: Stage::Locale,
            operation: "enter_locale",
            requirement: "a locale with a URL",
        });
    };
    session.navigate(url).await?;
    match select(session, &locale.name).await? {
        Resolution::PopupAbsent { .. } => {
            session.state_mut().current_locale = Some(locale.clone());
            Ok(Resolution::PopupAbsent {
                ambient: locale.clone(),
            })
        }
        other => Ok(other),
    }
}

/// Clicks the cookie consent button if one shows up within the cookie
/// timeout. Failures are logged and otherwise ignored.
pub(crate) async fn dismiss_cookie_banner<D: Driver>(session: &mut Session<D>) -> bool {
    let timeout = session.timeouts().cookie_banner;
    match session.poll(&COOKIE_ACCEPT, timeout).await {
        Ok(WaitOutcome::Found(button)) => match session.click(&button.element).await {
            Ok(()) => {
                tracing::debug!(strategy = %button.locator, "cookie banner accepted");
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "cookie banner click failed");
                false
            }
        },
        Ok(WaitOutcome::TimedOut { .. }) => false,
        Err(e) => {
            tracing::debug!(error = %e, "cookie banner lookup failed");
            false
        }
    }
}

/// Waits up to the popup timeout for the popup and records the result.
async fn detect_popup<D: Driver>(
    session: &mut Session<D>,
    stage: Stage,
) -> Result<bool, ScraperError> {
    let timeout = session.timeouts().popup;
    let outcome = session
        .poll(&POPUP_ROOT, timeout)
        .await
        .map_err(ScraperError::driver(stage))?;
    let present = matches!(outcome, WaitOutcome::Found(_));
    session.state_mut().popup = if present {
        PopupState::Present
    } else {
        PopupState::Absent
    };
    tracing::debug!(present, url = %session.state().current_url(), "country popup check");
    Ok(present)
}

/// Reads every country link in the popup, in document order, tagged with
/// the heading of the region column it sits in.
async fn collect_popup_links<D: Driver>(
    session: &mut Session<D>,
    stage: Stage,
) -> Result<Vec<PopupLink<D::Element>>, ScraperError> {
    let mut links = Vec::new();

    let blocks = session
        .find_all(&REGION_BLOCK, None)
        .await
        .map_err(ScraperError::driver(stage))?;
    if blocks.is_empty() {
        tracing::debug!("no region columns in popup; reading links directly");
        let anchors = session
            .find_all(&POPUP_LINKS, None)
            .await
            .map_err(ScraperError::driver(stage))?;
        read_links(session, stage, UNKNOWN_REGION, anchors, &mut links).await?;
        return Ok(links);
    }

    for block in blocks {
        let region = match session
            .find(&REGION_HEADING, Some(&block))
            .await
            .map_err(ScraperError::driver(stage))?
        {
            Some(heading) => session
                .text(&heading.element)
                .await
                .map_err(ScraperError::driver(stage))?,
            None => String::new(),
        };
        let region = if region.is_empty() {
            UNKNOWN_REGION.to_string()
        } else {
            region
        };
        let anchors = session
            .find_all(&REGION_LINKS, Some(&block))
            .await
            .map_err(ScraperError::driver(stage))?;
        read_links(session, stage, &region, anchors, &mut links).await?;
    }
    Ok(links)
}

async fn read_links<D: Driver>(
    session: &mut Session<D>,
    stage: Stage,
    region: &str,
    anchors: Vec<D::Element>,
    out: &mut Vec<PopupLink<D::Element>>,
) -> Result<(), ScraperError> {
    for element in anchors {
        let name = session
            .text(&element)
            .await
            .map_err(ScraperError::driver(stage))?;
        if name.is_empty() {
            continue;
        }
        let href = session
            .attribute(&element, "href")
            .await
            .map_err(ScraperError::driver(stage))?
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty());
        out.push(PopupLink {
            region: region.to_string(),
            name,
            href,
            element,
        });
    }
    Ok(())
}

/// Groups links by region. A country listed twice keeps its first entry.
pub(crate) fn build_index<E>(links: &[PopupLink<E>]) -> CountryIndex {
    let mut index = CountryIndex::new();
    for link in links {
        let inserted = index.insert(Locale {
            name: link.name.clone(),
            region_label: link.region.clone(),
            url: link.href.clone(),
        });
        if !inserted {
            tracing::debug!(country = %link.name, region = %link.region, "duplicate country skipped");
        }
    }
    index
}

/// The requested name followed by its aliases.
fn candidate_names(requested: &str) -> Vec<String> {
    let requested = requested.trim();
    let mut names = vec![requested.to_string()];
    if let Some(group) = COUNTRY_ALIASES
        .iter()
        .find(|group| group.iter().any(|a| a.eq_ignore_ascii_case(requested)))
    {
        names.extend(
            group
                .iter()
                .filter(|a| !a.eq_ignore_ascii_case(requested))
                .map(|a| (*a).to_string()),
        );
    }
    names
}

/// Picks the link to click for `requested` among popup link texts.
///
/// Exact case-insensitive matches (on the name or any alias) beat
/// substring matches. Among equally good matches the first in document
/// order wins; several substring hits are logged as ambiguous.
pub(crate) fn pick_link(link_names: &[&str], requested: &str) -> Option<usize> {
    let wanted = candidate_names(requested);
    let lowered: Vec<String> = link_names.iter().map(|n| n.to_lowercase()).collect();

    for name in &wanted {
        let name = name.to_lowercase();
        if let Some(position) = lowered.iter().position(|link| *link == name) {
            return Some(position);
        }
    }

    for name in wanted
        .iter()
        .filter(|n| n.chars().count() >= MIN_SUBSTRING_LEN)
    {
        let name = name.to_lowercase();
        let hits: Vec<usize> = lowered
            .iter()
            .enumerate()
            .filter(|(_, link)| link.contains(&name))
            .map(|(i, _)| i)
            .collect();
        if let Some(&first) = hits.first() {
            if hits.len() > 1 {
                let candidates: Vec<&str> = hits.iter().map(|&i| link_names[i]).collect();
                tracing::warn!(
                    requested,
                    chosen = link_names[first],
                    ?candidates,
                    "country name is ambiguous; taking the first match"
                );
            }
            return Some(first);
        }
    }
    None
}

/// Infers the locale the site picked from the URL's first path segment,
/// e.g. `https://www.avantorsciences.com/us/en/` → `USA`.
pub(crate) fn ambient_locale(url: &str) -> Locale {
    let parsed = reqwest::Url::parse(url).ok();
    let prefixed = parsed.as_ref().and_then(|u| {
        let segment = u
            .path_segments()?
            .find(|s| !s.is_empty())
            .filter(|s| looks_like_locale_prefix(s))?;
        Some((u, segment))
    });

    let Some((parsed, segment)) = prefixed else {
        return Locale {
            name: DEFAULT_LOCALE.to_string(),
            region_label: String::new(),
            url: Some(url.to_string()),
        };
    };

    let lower = segment.to_ascii_lowercase();
    let (name, region) = KNOWN_PREFIXES
        .iter()
        .find(|(prefix, _, _)| *prefix == lower)
        .map_or_else(
            || (lower.to_ascii_uppercase(), String::new()),
            |(_, name, region)| ((*name).to_string(), (*region).to_string()),
        );
    let home = parsed
        .join(&format!("/{segment}/"))
        .map_or_else(|_| url.to_string(), String::from);
    Locale {
        name,
        region_label: region,
        url: Some(home),
    }
}

/// `"us"` or `"en-gb"` style segments.
fn looks_like_locale_prefix(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    match bytes.len() {
        2 => bytes.iter().all(u8::is_ascii_alphabetic),
        5 => {
            bytes[2] == b'-'
                && bytes[..2].iter().all(u8::is_ascii_alphabetic)
                && bytes[3..].iter().all(u8::is_ascii_alphabetic)
        }
        _ => false,
    }
}

#[cfg(test)]
#[path = "locale_test.rs"]
mod tests;
