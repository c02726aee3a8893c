/// One step of a structure path: an element filter plus required classes.
///
/// `"li.list-item"` parses to tag `"li"` with class `list-item`;
/// `".country-name"` to tag `"*"`; `"td|th"` to alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    pub tag: String,
    pub classes: Vec<String>,
}

impl PathStep {
    /// Whether an element with `tag` and the whitespace-separated `class`
    /// attribute value satisfies this step. Classes match whole tokens.
    #[must_use]
    pub fn matches(&self, tag: &str, class: &str) -> bool {
        super::tag_matches(&self.tag, tag)
            && self
                .classes
                .iter()
                .all(|wanted| class.split_whitespace().any(|have| have == wanted))
    }
}

/// Splits a structure pattern into descendant steps.
#[must_use]
pub fn parse_path(pattern: &str) -> Vec<PathStep> {
    pattern
        .split_whitespace()
        .map(|raw| {
            let mut parts = raw.split('.');
            let tag = match parts.next() {
                Some("") | None => "*".to_string(),
                Some(tag) => tag.to_ascii_lowercase(),
            };
            let classes = parts
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect();
            PathStep { tag, classes }
        })
        .collect()
}
