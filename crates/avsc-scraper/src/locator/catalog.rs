//! Locator chains for every element the scraper touches on the vendor site.
//!
//! Order matters: the first candidate is the primary strategy and the
//! remaining ones are tried only when it resolves nothing.

use super::{Locator, LocatorSpec, TextMatch};

pub const COOKIE_ACCEPT: LocatorSpec = LocatorSpec {
    name: "cookie_accept",
    candidates: &[
        Locator::text("button", "Accept All Cookies", TextMatch::Contains),
        Locator::attr("button", "id", "onetrust-accept"),
        Locator::text("button", "Accept", TextMatch::Contains),
    ],
};

pub const POPUP_ROOT: LocatorSpec = LocatorSpec {
    name: "popup_root",
    candidates: &[
        Locator::path("ngb-modal-window.modal"),
        Locator::path("div.modal.show"),
        Locator::path("div.country-selector"),
        Locator::text("*", "Select an Avantor Country", TextMatch::Contains),
    ],
};

/// One column of the popup: a region heading above a list of country links.
pub const REGION_BLOCK: LocatorSpec = LocatorSpec {
    name: "region_block",
    candidates: &[
        Locator::path("div.country-selector-countries div.col-md-4"),
        Locator::path("ngb-modal-window div.col-md-4"),
        Locator::path("div.modal div.country-region"),
    ],
};

/// Scoped to a [`REGION_BLOCK`].
pub const REGION_HEADING: LocatorSpec = LocatorSpec {
    name: "region_heading",
    candidates: &[
        Locator::path("h5.country-name"),
        Locator::path("h5"),
        Locator::path("h4"),
    ],
};

/// Scoped to a [`REGION_BLOCK`].
pub const REGION_LINKS: LocatorSpec = LocatorSpec {
    name: "region_links",
    candidates: &[
        Locator::path("ul.country-list-items li.list-item a.link"),
        Locator::path("ul.country-list-items a"),
        Locator::path("li a"),
    ],
};

/// Popup links when the popup has no recognizable region columns.
pub const POPUP_LINKS: LocatorSpec = LocatorSpec {
    name: "country_links",
    candidates: &[
        Locator::path("ngb-modal-window a.link"),
        Locator::path("div.modal.show a"),
        Locator::path("div.country-selector a"),
    ],
};

pub const SEARCH_INPUT: LocatorSpec = LocatorSpec {
    name: "search_input",
    candidates: &[
        Locator::attr("input", "name", "search"),
        Locator::attr("input", "id", "search"),
        Locator::attr("input", "placeholder", "Search"),
        Locator::attr("input", "type", "search"),
        Locator::attr("input", "class", "search"),
        Locator::attr("*", "role", "searchbox"),
    ],
};

pub const SEARCH_SUBMIT: LocatorSpec = LocatorSpec {
    name: "search_submit",
    candidates: &[
        Locator::attr("button", "type", "submit"),
        Locator::attr("button", "class", "search"),
        Locator::attr("button", "aria-label", "Search"),
        Locator::text("button", "Search", TextMatch::ContainsIgnoreCase),
        Locator::attr("input", "type", "submit"),
    ],
};

/// Marker proving the current page is a product detail page.
pub const PRODUCT_ROOT: LocatorSpec = LocatorSpec {
    name: "product_root",
    candidates: &[
        Locator::path("div.product-detail"),
        Locator::path("div.product-details"),
        Locator::attr("*", "data-testid", "product-detail"),
        Locator::path("h1.product-title"),
    ],
};

pub const NO_RESULTS: LocatorSpec = LocatorSpec {
    name: "no_results",
    candidates: &[
        Locator::path(".no-results"),
        Locator::attr("*", "data-testid", "no-results"),
        Locator::text("*", "No results found", TextMatch::ContainsIgnoreCase),
        Locator::text("*", "did not match any products", TextMatch::ContainsIgnoreCase),
    ],
};

pub const PRODUCT_TITLE: LocatorSpec = LocatorSpec {
    name: "product_title",
    candidates: &[
        Locator::path("h1.product-title"),
        Locator::path("h1.product-name"),
        Locator::path("h1.title"),
        Locator::path("h1"),
        Locator::path(".product-title"),
    ],
};

pub const PRODUCT_SKU: LocatorSpec = LocatorSpec {
    name: "product_sku",
    candidates: &[
        Locator::attr("*", "class", "sku"),
        Locator::attr("*", "class", "product-code"),
        Locator::attr("*", "class", "catalog-number"),
        Locator::attr("*", "data-testid", "sku"),
    ],
};

pub const MODEL_NUMBER: LocatorSpec = LocatorSpec {
    name: "model_number",
    candidates: &[
        Locator::attr("*", "class", "model-number"),
        Locator::attr("*", "data-testid", "model-number"),
    ],
};

pub const DESCRIPTION: LocatorSpec = LocatorSpec {
    name: "description",
    candidates: &[
        Locator::path("div.no-select-spec"),
        Locator::path("div.no-select-spec div.d-block"),
        Locator::path("div.no-select-spec p"),
        Locator::path("div.product-description"),
        Locator::path("div.description"),
        Locator::path("div.product-details p"),
    ],
};

/// Toggles that reveal collapsed detail or specification sections.
pub const SECTION_EXPANDERS: LocatorSpec = LocatorSpec {
    name: "section_expanders",
    candidates: &[
        Locator::text("a|button", "More Product Details", TextMatch::Contains),
        Locator::text("a|button", "View Specifications", TextMatch::ContainsIgnoreCase),
        Locator::text("button", "Specification", TextMatch::Contains),
        Locator::attr("*", "aria-controls", "specification"),
    ],
};

pub const PRICE_AMOUNT: LocatorSpec = LocatorSpec {
    name: "price_amount",
    candidates: &[Locator::attr("*", "itemprop", "price")],
};

pub const PRICE_CURRENCY: LocatorSpec = LocatorSpec {
    name: "price_currency",
    candidates: &[Locator::attr("*", "itemprop", "priceCurrency")],
};

/// Elements whose text holds currency and amount together, e.g. `"USD 1,234.50"`.
pub const PRICE: LocatorSpec = LocatorSpec {
    name: "price",
    candidates: &[
        Locator::attr("*", "class", "product-price"),
        Locator::attr("*", "data-testid", "price"),
        Locator::path("span.price"),
        Locator::attr("*", "class", "price"),
    ],
};

pub const AVAILABILITY: LocatorSpec = LocatorSpec {
    name: "availability",
    candidates: &[
        Locator::attr("*", "class", "availability"),
        Locator::attr("*", "class", "stock"),
        Locator::text("*", "In Stock", TextMatch::ContainsIgnoreCase),
        Locator::text("*", "Out of Stock", TextMatch::ContainsIgnoreCase),
    ],
};

/// Specification rows laid out as `<li>` pairs of name/value columns.
pub const SPEC_LIST_ROWS: LocatorSpec = LocatorSpec {
    name: "spec_list_rows",
    candidates: &[Locator::path("ul.spec-table li")],
};

/// Scoped to a [`SPEC_LIST_ROWS`] row; yields the name cell then the value cell.
pub const SPEC_LIST_CELLS: Locator = Locator::attr("div", "class", "-col");

pub const SPEC_TABLE_ROWS: LocatorSpec = LocatorSpec {
    name: "spec_table_rows",
    candidates: &[
        Locator::path("table.specification tr"),
        Locator::path("table.specifications tr"),
        Locator::path("table.spec tr"),
        Locator::path("div.specifications table tr"),
        Locator::path("div.specs table tr"),
        Locator::path("div.product-specifications table tr"),
        Locator::path("table.details tr"),
    ],
};

/// Scoped to a [`SPEC_TABLE_ROWS`] row.
pub const SPEC_TABLE_CELLS: Locator = Locator::path("td|th");

pub const SPEC_DEFINITION_LISTS: LocatorSpec = LocatorSpec {
    name: "spec_definition_lists",
    candidates: &[
        Locator::path("dl.specification"),
        Locator::path("dl.specifications"),
        Locator::path("dl.property"),
        Locator::path("dl.attribute"),
        Locator::path("div.specifications dl"),
        Locator::path("div.specs dl"),
    ],
};

pub const SPEC_TERMS: Locator = Locator::path("dt");
pub const SPEC_DEFINITIONS: Locator = Locator::path("dd");

/// Single elements holding `"Name: Value"` text.
pub const SPEC_LABELLED: LocatorSpec = LocatorSpec {
    name: "spec_labelled",
    candidates: &[
        Locator::attr("li", "class", "spec"),
        Locator::attr("div", "class", "spec-item"),
        Locator::attr("p", "class", "spec"),
    ],
};

/// Specification keys that carry the model number when the page has no
/// dedicated element for it.
pub const MODEL_NUMBER_KEYS: &[&str] = &["Model Number", "Model No.", "Model"];
