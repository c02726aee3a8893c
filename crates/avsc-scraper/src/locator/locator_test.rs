use super::catalog::{POPUP_ROOT, SEARCH_INPUT, SPEC_TABLE_CELLS};
use super::*;

#[test]
fn structure_path_compiles_to_class_token_predicates() {
    let xpath = Locator::path("ul.spec-table li").to_xpath(false);
    assert_eq!(
        xpath,
        "//ul[contains(concat(' ', normalize-space(@class), ' '), ' spec-table ')]//li"
    );
}

#[test]
fn scoped_expression_starts_at_context_node() {
    let xpath = Locator::path("h5.country-name").to_xpath(true);
    assert!(xpath.starts_with(".//h5["), "{xpath}");
}

#[test]
fn tag_alternatives_use_self_axis() {
    assert_eq!(
        SPEC_TABLE_CELLS.to_xpath(true),
        ".//*[self::td or self::th]"
    );
}

#[test]
fn attribute_locator_is_substring_match() {
    let xpath = Locator::attr("input", "placeholder", "Search").to_xpath(false);
    assert_eq!(xpath, "//input[contains(@placeholder, 'Search')]");
}

#[test]
fn case_insensitive_text_folds_both_sides() {
    let xpath = Locator::text("*", "In Stock", TextMatch::ContainsIgnoreCase).to_xpath(false);
    assert!(xpath.contains("translate(normalize-space(text())"), "{xpath}");
    assert!(xpath.ends_with("'in stock')]"), "{xpath}");
}

#[test]
fn apostrophes_switch_quote_style() {
    let xpath = Locator::text("a", "Côte d'Ivoire", TextMatch::Exact).to_xpath(false);
    assert_eq!(xpath, "//a[normalize-space(text())=\"Côte d'Ivoire\"]");
}

#[test]
fn mixed_quotes_use_concat() {
    let xpath = Locator::text("*", "12\" O'Ring", TextMatch::Contains).to_xpath(false);
    assert!(
        xpath.contains("concat('12\" O', \"'\", 'Ring')"),
        "unexpected xpath: {xpath}"
    );
}

#[test]
fn parse_path_handles_bare_class_and_alternatives() {
    let steps = parse_path(".country-name td|th");
    assert_eq!(steps[0].tag, "*");
    assert_eq!(steps[0].classes, vec!["country-name".to_string()]);
    assert_eq!(steps[1].tag, "td|th");
    assert!(steps[1].matches("th", ""));
}

#[test]
fn path_step_matches_whole_class_tokens_only() {
    let step = &parse_path("div.modal.show")[0];
    assert!(step.matches("div", "modal fade show"));
    assert!(!step.matches("div", "modal-dialog show"));
    assert!(!step.matches("span", "modal show"));
}

#[test]
fn text_match_modes() {
    assert!(TextMatch::Exact.matches("USA", "USA"));
    assert!(!TextMatch::Exact.matches("usa", "USA"));
    assert!(TextMatch::ExactIgnoreCase.matches("usa", "USA"));
    assert!(TextMatch::Contains.matches("United Kingdom", "Kingdom"));
    assert!(TextMatch::ContainsIgnoreCase.matches("IN STOCK", "in stock"));
}

#[test]
fn catalog_chains_have_a_primary_and_ordered_fallbacks() {
    assert_eq!(
        POPUP_ROOT.primary(),
        Some(&Locator::path("ngb-modal-window.modal"))
    );
    assert_eq!(POPUP_ROOT.fallbacks().len(), POPUP_ROOT.candidates.len() - 1);
    assert_eq!(SEARCH_INPUT.fallbacks()[0], Locator::attr("input", "id", "search"));
}
