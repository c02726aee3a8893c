//! Country/URL harvesting from the popup.

mod support;

use avsc_scraper::{harvest, search, PopupState, ScraperError, Stage};

use support::{el, landing, popup, session_at, standard_site, FakeSite, BASE, US_HOME};

#[tokio::test]
async fn three_regions_keep_sizes_and_link_order() {
    let mut session = session_at(standard_site(), BASE).await;

    let index = harvest(&mut session).await.unwrap();

    let shape: Vec<(&str, usize)> = index
        .regions()
        .iter()
        .map(|r| (r.label.as_str(), r.locales.len()))
        .collect();
    assert_eq!(
        shape,
        vec![("North America", 2), ("Latin America", 1), ("Europe", 3)]
    );
    let europe: Vec<&str> = index
        .region("Europe")
        .unwrap()
        .locales
        .iter()
        .map(|l| l.name.as_str())
        .collect();
    assert_eq!(europe, vec!["Austria", "Belgium", "United Kingdom"]);
    assert_eq!(
        index.find("Canada").unwrap().url.as_deref(),
        Some("https://shop.test/ca/")
    );
}

#[tokio::test]
async fn harvest_leaves_popup_open_and_clicks_nothing() {
    let mut session = session_at(standard_site(), BASE).await;

    harvest(&mut session).await.unwrap();

    assert!(session.driver().clicks.is_empty());
    assert_eq!(session.state().popup(), PopupState::Enumerated);
    assert_eq!(session.state().current_url(), BASE);
}

#[tokio::test]
async fn links_without_href_are_kept_without_url() {
    let site = FakeSite::new().page(
        BASE,
        landing([popup(&[(
            "Middle East",
            &[("Coming soon", None), ("Israel", Some("https://shop.test/il/"))],
        )])]),
    );
    let mut session = session_at(site, BASE).await;

    let index = harvest(&mut session).await.unwrap();

    let region = index.region("Middle East").unwrap();
    assert_eq!(region.locales[0].name, "Coming soon");
    assert_eq!(region.locales[0].url, None);
    assert_eq!(region.locales.len(), 2);
}

#[tokio::test]
async fn column_without_heading_is_labelled_unknown() {
    let site = FakeSite::new().page(
        BASE,
        landing([el("ngb-modal-window").class("modal show").child(
            el("div").class("country-selector-countries").child(
                el("div").class("col-md-4").child(
                    el("ul").class("country-list-items").child(
                        el("li")
                            .class("list-item")
                            .child(el("a").class("link").attr("href", "https://shop.test/jp/").text("Japan")),
                    ),
                ),
            ),
        )]),
    );
    let mut session = session_at(site, BASE).await;

    let index = harvest(&mut session).await.unwrap();

    assert_eq!(index.regions()[0].label, "Unknown");
    assert_eq!(index.len(), 1);
}

#[tokio::test]
async fn harvest_without_popup_is_unavailable() {
    let mut session = session_at(standard_site(), US_HOME).await;

    let err = harvest(&mut session).await.unwrap_err();

    match err {
        ScraperError::HarvestUnavailable { url } => assert_eq!(url, US_HOME),
        other => panic!("expected HarvestUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn failed_harvest_does_not_adopt_the_ambient_locale() {
    let mut session = session_at(standard_site(), US_HOME).await;

    harvest(&mut session).await.unwrap_err();

    assert!(session.state().current_locale().is_none());
    let err = search(&mut session, "76181-190").await.unwrap_err();
    assert!(
        matches!(err, ScraperError::Precondition { operation: "search", .. }),
        "{err:?}"
    );
}

#[tokio::test]
async fn popup_without_links_fails_at_the_harvest_stage() {
    let site = FakeSite::new().page(
        BASE,
        landing([el("ngb-modal-window")
            .class("modal show")
            .child(el("h4").text("Select an Avantor Country"))]),
    );
    let mut session = session_at(site, BASE).await;

    let err = harvest(&mut session).await.unwrap_err();

    match &err {
        ScraperError::PageStructure { locator, .. } => assert_eq!(locator, "country_links"),
        other => panic!("expected PageStructure, got {other:?}"),
    }
    assert_eq!(err.stage(), Stage::Harvest);
}

#[tokio::test]
async fn harvested_index_serializes_as_region_map() {
    let mut session = session_at(standard_site(), BASE).await;

    let index = harvest(&mut session).await.unwrap();
    let json = serde_json::to_value(&index).unwrap();

    assert_eq!(
        json["North America"][0],
        serde_json::json!({"country": "USA", "url": "https://shop.test/us/"})
    );
    assert_eq!(json.as_object().unwrap().len(), 3);
    assert_eq!(index.flatten().len(), 6);
}
