//! In-memory browser for exercising the scraper without a `WebDriver`.
//!
//! Pages are small element trees keyed by URL. Clicking an `<a href>` loads
//! the target page, a `data-dismiss` attribute removes the element with that
//! id, and pressing Enter in (or clicking the submit button of) the search
//! box routes to the configured result page. Every lookup and click is
//! recorded so tests can assert on the order of strategies tried.

#![allow(dead_code)]

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use avsc_core::Timeouts;
use avsc_scraper::driver::ENTER_KEY;
use avsc_scraper::locator::{parse_path, Locator, Strategy};
use avsc_scraper::{Driver, DriverError, Session};

pub const BASE: &str = "https://shop.test/";
pub const US_HOME: &str = "https://shop.test/us/";
pub const CA_HOME: &str = "https://shop.test/ca/";
pub const NO_RESULTS_URL: &str = "https://shop.test/us/search?empty";
pub const WIDGET_CODE: &str = "76181-190";
pub const WIDGET_URL: &str = "https://shop.test/us/p/76181-190";

// ---------------------------------------------------------------------------
// Page builder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct El {
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<El>,
}

pub fn el(tag: &str) -> El {
    El {
        tag: tag.to_string(),
        attrs: Vec::new(),
        text: String::new(),
        children: Vec::new(),
    }
}

impl El {
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    pub fn class(self, value: &str) -> Self {
        self.attr("class", value)
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn child(mut self, child: El) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = El>) -> Self {
        self.children.extend(children);
        self
    }
}

// ---------------------------------------------------------------------------
// DOM arena
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Node {
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<usize>,
    parent: Option<usize>,
}

/// Node 0 is the document; ids are assigned in document order.
#[derive(Debug)]
struct Dom {
    nodes: Vec<Node>,
}

impl Dom {
    fn empty() -> Self {
        Dom {
            nodes: vec![Node {
                tag: "#document".into(),
                attrs: Vec::new(),
                text: String::new(),
                children: Vec::new(),
                parent: None,
            }],
        }
    }

    fn build(root: &El) -> Self {
        let mut dom = Dom::empty();
        dom.add(root, 0);
        dom
    }

    fn add(&mut self, el: &El, parent: usize) {
        let id = self.nodes.len();
        self.nodes.push(Node {
            tag: el.tag.to_ascii_lowercase(),
            attrs: el.attrs.clone(),
            text: el.text.clone(),
            children: Vec::new(),
            parent: Some(parent),
        });
        self.nodes[parent].children.push(id);
        for child in &el.children {
            self.add(child, id);
        }
    }

    fn attr(&self, id: usize, name: &str) -> Option<&str> {
        self.nodes[id]
            .attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn is_attached(&self, id: usize) -> bool {
        let mut current = id;
        loop {
            if current == 0 {
                return true;
            }
            match self.nodes[current].parent {
                Some(parent) if self.nodes[parent].children.contains(&current) => current = parent,
                _ => return false,
            }
        }
    }

    /// Descendants of `from` (excluding it) in document order.
    fn descendants(&self, from: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.nodes[from].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id].children.iter().rev().copied());
        }
        out
    }

    fn own_text(&self, id: usize) -> String {
        self.nodes[id].text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn deep_text(&self, id: usize) -> String {
        let mut parts = vec![self.nodes[id].text.clone()];
        for child in self.descendants(id) {
            parts.push(self.nodes[child].text.clone());
        }
        parts.join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn query(&self, scope: usize, locator: &Locator) -> Vec<usize> {
        match locator.strategy {
            Strategy::Structure => {
                let mut current = vec![scope];
                for step in parse_path(locator.pattern) {
                    let mut next: Vec<usize> = current
                        .iter()
                        .flat_map(|&id| self.descendants(id))
                        .filter(|&id| {
                            step.matches(&self.nodes[id].tag, self.attr(id, "class").unwrap_or(""))
                        })
                        .collect();
                    next.sort_unstable();
                    next.dedup();
                    current = next;
                }
                current
            }
            Strategy::Attribute(name) => self
                .descendants(scope)
                .into_iter()
                .filter(|&id| {
                    locator.accepts_tag(&self.nodes[id].tag)
                        && self
                            .attr(id, name)
                            .is_some_and(|v| v.contains(locator.pattern))
                })
                .collect(),
            Strategy::Text(how) => self
                .descendants(scope)
                .into_iter()
                .filter(|&id| {
                    locator.accepts_tag(&self.nodes[id].tag)
                        && how.matches(&self.own_text(id), locator.pattern)
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Site + browser
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct FakeSite {
    pages: HashMap<String, El>,
    search_routes: HashMap<String, String>,
    no_results_url: Option<String>,
    enter_ignored: bool,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, root: El) -> Self {
        self.pages.insert(url.to_string(), root);
        self
    }

    pub fn search_route(mut self, code: &str, url: &str) -> Self {
        self.search_routes.insert(code.to_string(), url.to_string());
        self
    }

    pub fn no_results(mut self, url: &str) -> Self {
        self.no_results_url = Some(url.to_string());
        self
    }

    /// Pressing Enter in the search box does nothing; only the button submits.
    pub fn enter_ignored(mut self) -> Self {
        self.enter_ignored = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Handle {
    generation: u64,
    id: usize,
}

#[derive(Debug)]
pub struct FakeBrowser {
    site: FakeSite,
    dom: Dom,
    url: String,
    generation: u64,
    values: HashMap<usize, String>,
    /// Every locator run, rendered with its `Display` form.
    pub lookups: Vec<String>,
    /// Text (or tag) of every element clicked.
    pub clicks: Vec<String>,
    pub visits: Vec<String>,
    pub quits: usize,
}

impl FakeBrowser {
    pub fn new(site: FakeSite) -> Self {
        Self {
            site,
            dom: Dom::empty(),
            url: "about:blank".into(),
            generation: 0,
            values: HashMap::new(),
            lookups: Vec::new(),
            clicks: Vec::new(),
            visits: Vec::new(),
            quits: 0,
        }
    }

    fn load(&mut self, url: &str) -> Result<(), DriverError> {
        let Some(root) = self.site.pages.get(url) else {
            return Err(DriverError::Command(format!(
                "unknown error: net::ERR_NAME_NOT_RESOLVED ({url})"
            )));
        };
        self.dom = Dom::build(root);
        self.url = url.to_string();
        self.generation += 1;
        self.values.clear();
        self.visits.push(url.to_string());
        Ok(())
    }

    fn live(&self, handle: &Handle) -> Result<usize, DriverError> {
        if handle.generation != self.generation || !self.dom.is_attached(handle.id) {
            return Err(DriverError::StaleElement(format!("node {}", handle.id)));
        }
        Ok(handle.id)
    }

    fn submit(&mut self, query: &str) -> Result<(), DriverError> {
        let target = self
            .site
            .search_routes
            .get(query.trim())
            .cloned()
            .or_else(|| self.site.no_results_url.clone());
        match target {
            Some(url) => self.load(&url),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Driver for FakeBrowser {
    type Element = Handle;

    async fn goto(&mut self, url: &str) -> Result<(), DriverError> {
        self.load(url)
    }

    async fn current_url(&mut self) -> Result<String, DriverError> {
        Ok(self.url.clone())
    }

    async fn find_all(
        &mut self,
        scope: Option<&Handle>,
        locator: &Locator,
    ) -> Result<Vec<Handle>, DriverError> {
        self.lookups.push(locator.to_string());
        let scope = match scope {
            Some(handle) => self.live(handle)?,
            None => 0,
        };
        let generation = self.generation;
        Ok(self
            .dom
            .query(scope, locator)
            .into_iter()
            .map(|id| Handle { generation, id })
            .collect())
    }

    async fn text(&mut self, element: &Handle) -> Result<String, DriverError> {
        let id = self.live(element)?;
        Ok(self.dom.deep_text(id))
    }

    async fn attribute(
        &mut self,
        element: &Handle,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        let id = self.live(element)?;
        if name == "value" {
            if let Some(value) = self.values.get(&id) {
                return Ok(Some(value.clone()));
            }
        }
        Ok(self.dom.attr(id, name).map(str::to_string))
    }

    async fn click(&mut self, element: &Handle) -> Result<(), DriverError> {
        let id = self.live(element)?;
        let label = self.dom.deep_text(id);
        self.clicks.push(if label.is_empty() {
            self.dom.nodes[id].tag.clone()
        } else {
            label
        });

        if let Some(target) = self.dom.attr(id, "data-dismiss").map(str::to_string) {
            let victim = (1..self.dom.nodes.len())
                .find(|&n| self.dom.attr(n, "id") == Some(target.as_str()));
            if let Some(victim) = victim {
                if let Some(parent) = self.dom.nodes[victim].parent {
                    self.dom.nodes[parent].children.retain(|&c| c != victim);
                }
            }
            return Ok(());
        }
        if self.dom.nodes[id].tag == "a" {
            if let Some(href) = self.dom.attr(id, "href").map(str::to_string) {
                return self.load(&href);
            }
            return Ok(());
        }
        if self.dom.attr(id, "type") == Some("submit") {
            let query = self
                .dom
                .descendants(0)
                .into_iter()
                .find(|n| self.dom.nodes[*n].tag == "input" && self.values.contains_key(n))
                .and_then(|n| self.values.get(&n).cloned())
                .unwrap_or_default();
            return self.submit(&query);
        }
        Ok(())
    }

    async fn clear(&mut self, element: &Handle) -> Result<(), DriverError> {
        let id = self.live(element)?;
        self.values.insert(id, String::new());
        Ok(())
    }

    async fn send_keys(&mut self, element: &Handle, keys: &str) -> Result<(), DriverError> {
        let id = self.live(element)?;
        if keys == ENTER_KEY {
            if self.site.enter_ignored {
                return Ok(());
            }
            let query = self.values.get(&id).cloned().unwrap_or_default();
            return self.submit(&query);
        }
        self.values.entry(id).or_default().push_str(keys);
        Ok(())
    }

    async fn quit(&mut self) -> Result<(), DriverError> {
        self.quits += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn fast_timeouts() -> Timeouts {
    Timeouts {
        popup: Duration::from_millis(40),
        cookie_banner: Duration::from_millis(10),
        element: Duration::from_millis(60),
        search: Duration::from_millis(60),
        submit_grace: Duration::from_millis(20),
        poll_interval: Duration::from_millis(5),
    }
}

/// A session already navigated to `url`.
pub async fn session_at(site: FakeSite, url: &str) -> Session<FakeBrowser> {
    let mut session = Session::new(FakeBrowser::new(site), fast_timeouts());
    session.navigate(url).await.unwrap();
    session
}

pub type RegionFixture<'a> = (&'a str, &'a [(&'a str, Option<&'a str>)]);

/// Country popup in the vendor's modal markup.
pub fn popup(regions: &[RegionFixture<'_>]) -> El {
    let columns = regions.iter().map(|(label, links)| {
        el("div").class("col-md-4").children([
            el("h5").class("country-name").text(&format!("  {label}  ")),
            el("ul")
                .class("country-list-items")
                .children(links.iter().map(|(name, href)| {
                    let mut anchor = el("a").class("link").text(name);
                    if let Some(href) = href {
                        anchor = anchor.attr("href", href);
                    }
                    el("li").class("list-item").child(anchor)
                })),
        ])
    });
    el("ngb-modal-window").class("modal fade show").child(
        el("div")
            .class("modal-body")
            .child(el("h4").text("Select an Avantor Country"))
            .child(el("div").class("country-selector-countries row").children(columns)),
    )
}

pub fn cookie_banner() -> El {
    el("div").attr("id", "cookie-banner").child(
        el("button")
            .attr("data-dismiss", "cookie-banner")
            .text("Accept All Cookies"),
    )
}

pub fn search_header() -> El {
    el("header").children([
        el("input").attr("name", "searchTerm").attr("type", "text"),
        el("button").attr("type", "submit").text("Search"),
    ])
}

pub fn landing(body: impl IntoIterator<Item = El>) -> El {
    el("html").child(el("body").children(body))
}

/// A locale home page with just the search header.
pub fn locale_home() -> El {
    landing([search_header()])
}

/// A product detail page: search header, root marker, title, then `body`.
pub fn product_page(title: &str, body: impl IntoIterator<Item = El>) -> El {
    landing([
        search_header(),
        el("div")
            .class("product-detail")
            .child(el("h1").class("product-title").text(title))
            .children(body),
    ])
}

pub fn no_results_page() -> El {
    landing([
        search_header(),
        el("div").class("no-results").text("No results found"),
    ])
}

pub fn spec_list(rows: &[(&str, &str)]) -> El {
    el("ul").class("spec-table").children(rows.iter().map(|(k, v)| {
        el("li").children([
            el("div").class("name-col").text(&format!("{k}:")),
            el("div").class("value-col").text(v),
        ])
    }))
}

/// Three-region popup on [`BASE`] plus the USA/Canada home pages, a Widget
/// product reachable by search, and a no-results page.
pub fn standard_site() -> FakeSite {
    FakeSite::new()
        .page(
            BASE,
            landing([popup(&[
                (
                    "North America",
                    &[("USA", Some(US_HOME)), ("Canada", Some(CA_HOME))],
                ),
                ("Latin America", &[("Brazil", Some("https://shop.test/br/"))]),
                (
                    "Europe",
                    &[
                        ("Austria", Some("https://shop.test/at/")),
                        ("Belgium", Some("https://shop.test/be/")),
                        ("United Kingdom", Some("https://shop.test/uk/")),
                    ],
                ),
            ])]),
        )
        .page(US_HOME, locale_home())
        .page(CA_HOME, locale_home())
        .page("https://shop.test/br/", locale_home())
        .page("https://shop.test/at/", locale_home())
        .page("https://shop.test/be/", locale_home())
        .page("https://shop.test/uk/", locale_home())
        .page(
            WIDGET_URL,
            product_page(
                "Widget",
                [el("div")
                    .class("no-select-spec")
                    .text("A sturdy general-purpose laboratory widget.")],
            ),
        )
        .page(NO_RESULTS_URL, no_results_page())
        .search_route(WIDGET_CODE, WIDGET_URL)
        .no_results(NO_RESULTS_URL)
}
