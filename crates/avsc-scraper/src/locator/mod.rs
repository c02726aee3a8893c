//! Element locators and the fallback chains built from them.
//!
//! A [`Locator`] names one way to find elements (by visible text, by an
//! attribute substring, or by a class/tag path). A [`LocatorSpec`] is an
//! ordered chain of locators for one logical element: the first candidate is
//! the primary strategy, the rest are fallbacks tried in order. Chains are
//! plain `const` data (see [`catalog`]) so fallbacks can be added without
//! touching the code that walks them.

pub mod catalog;
mod path;
mod xpath;

pub use path::{parse_path, PathStep};

/// How a text locator compares the element's own (whitespace-normalized)
/// text against its pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMatch {
    Exact,
    ExactIgnoreCase,
    Contains,
    ContainsIgnoreCase,
}

impl TextMatch {
    /// Applies the comparison to already-normalized text.
    #[must_use]
    pub fn matches(self, text: &str, pattern: &str) -> bool {
        match self {
            TextMatch::Exact => text == pattern,
            TextMatch::ExactIgnoreCase => text.to_lowercase() == pattern.to_lowercase(),
            TextMatch::Contains => text.contains(pattern),
            TextMatch::ContainsIgnoreCase => {
                text.to_lowercase().contains(&pattern.to_lowercase())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Match on the element's own text node.
    Text(TextMatch),
    /// Substring match on the named attribute's value.
    Attribute(&'static str),
    /// Descendant path of `tag.class` steps, e.g. `"ul.spec-table li"`.
    Structure,
}

/// One element-finding strategy.
///
/// `tag` restricts the element name: `"*"` for any element, or
/// `|`-separated alternatives such as `"a|button"`. Structure locators carry
/// their tags inside `pattern` and ignore `tag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locator {
    pub strategy: Strategy,
    pub tag: &'static str,
    pub pattern: &'static str,
}

impl Locator {
    #[must_use]
    pub const fn text(tag: &'static str, pattern: &'static str, how: TextMatch) -> Self {
        Self {
            strategy: Strategy::Text(how),
            tag,
            pattern,
        }
    }

    #[must_use]
    pub const fn attr(tag: &'static str, name: &'static str, pattern: &'static str) -> Self {
        Self {
            strategy: Strategy::Attribute(name),
            tag,
            pattern,
        }
    }

    #[must_use]
    pub const fn path(pattern: &'static str) -> Self {
        Self {
            strategy: Strategy::Structure,
            tag: "*",
            pattern,
        }
    }

    /// Compiles the locator into an `XPath` expression. Scoped expressions
    /// search below a context element (`.//`), unscoped ones the whole
    /// document (`//`).
    #[must_use]
    pub fn to_xpath(&self, scoped: bool) -> String {
        xpath::compile(self, scoped)
    }

    /// Whether `tag` (lowercase element name) satisfies the tag filter.
    #[must_use]
    pub fn accepts_tag(&self, tag: &str) -> bool {
        tag_matches(self.tag, tag)
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.strategy {
            Strategy::Text(how) => write!(f, "{}[text {how:?} {:?}]", self.tag, self.pattern),
            Strategy::Attribute(name) => {
                write!(f, "{}[@{name} contains {:?}]", self.tag, self.pattern)
            }
            Strategy::Structure => write!(f, "{}", self.pattern),
        }
    }
}

/// A named, ordered fallback chain for one logical element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatorSpec {
    /// Stable identifier used in logs and errors, e.g. `"search_input"`.
    pub name: &'static str,
    pub candidates: &'static [Locator],
}

impl LocatorSpec {
    #[must_use]
    pub fn primary(&self) -> Option<&Locator> {
        self.candidates.first()
    }

    #[must_use]
    pub fn fallbacks(&self) -> &[Locator] {
        self.candidates.get(1..).unwrap_or_default()
    }
}

pub(crate) fn tag_matches(filter: &str, tag: &str) -> bool {
    filter == "*" || filter.split('|').any(|t| t.eq_ignore_ascii_case(tag))
}

#[cfg(test)]
#[path = "locator_test.rs"]
mod tests;
