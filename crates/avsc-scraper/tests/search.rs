//! Catalog search against the in-memory browser.

mod support;

use avsc_scraper::{locale, search, ScraperError, SearchOutcome, Session, Stage};

use support::{
    el, fast_timeouts, landing, session_at, standard_site, FakeBrowser, FakeSite, BASE,
    NO_RESULTS_URL, US_HOME, WIDGET_CODE, WIDGET_URL,
};

async fn resolved_session(site: FakeSite) -> Session<FakeBrowser> {
    let mut session = session_at(site, BASE).await;
    locale::select(&mut session, "USA").await.unwrap();
    session
}

#[tokio::test]
async fn search_before_locale_is_a_precondition_error() {
    let mut session = session_at(standard_site(), US_HOME).await;

    let err = search(&mut session, WIDGET_CODE).await.unwrap_err();

    assert!(
        matches!(err, ScraperError::Precondition { operation: "search", .. }),
        "expected Precondition, got {err:?}"
    );
    assert_eq!(err.stage(), Stage::Search);
    assert!(session.driver().lookups.is_empty());
}

#[tokio::test]
async fn search_on_unopened_session_is_a_precondition_error() {
    let mut session = Session::new(FakeBrowser::new(standard_site()), fast_timeouts());

    let err = search(&mut session, WIDGET_CODE).await.unwrap_err();

    assert!(matches!(err, ScraperError::Precondition { .. }), "{err:?}");
}

#[tokio::test]
async fn matching_code_lands_on_product_page() {
    let mut session = resolved_session(standard_site()).await;

    let outcome = search(&mut session, &format!("  {WIDGET_CODE} ")).await.unwrap();

    assert_eq!(
        outcome,
        SearchOutcome::Found {
            url: WIDGET_URL.to_string()
        }
    );
    assert_eq!(session.state().last_query(), Some(WIDGET_CODE));
}

#[tokio::test]
async fn unknown_code_is_not_found_rather_than_an_error() {
    let mut session = resolved_session(standard_site()).await;

    let outcome = search(&mut session, "00000-000").await.unwrap();

    assert_eq!(outcome, SearchOutcome::NotFound);
    assert_eq!(session.state().current_url(), NO_RESULTS_URL);
}

#[tokio::test]
async fn submit_button_is_used_when_enter_does_not_submit() {
    let mut session = resolved_session(standard_site().enter_ignored()).await;

    let outcome = search(&mut session, WIDGET_CODE).await.unwrap();

    assert!(matches!(outcome, SearchOutcome::Found { .. }), "{outcome:?}");
    assert_eq!(session.driver().clicks.last().map(String::as_str), Some("Search"));
}

#[tokio::test]
async fn ambiguous_outcome_times_out_instead_of_not_found() {
    let blank = "https://shop.test/us/search?pending";
    let site = standard_site()
        .page(blank, landing([el("div").class("spinner")]))
        .search_route("PENDING-1", blank);
    let mut session = resolved_session(site).await;

    let err = search(&mut session, "PENDING-1").await.unwrap_err();

    match err {
        ScraperError::Timeout {
            stage,
            url,
            locator,
            ..
        } => {
            assert_eq!(stage, Stage::Search);
            assert_eq!(url, blank);
            assert_eq!(locator, "product_root|no_results");
        }
        other => panic!("expected Timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_search_box_times_out() {
    let site = standard_site().page(US_HOME, landing([el("main")]));
    let mut session = resolved_session(site).await;

    let err = search(&mut session, WIDGET_CODE).await.unwrap_err();

    assert!(
        matches!(err, ScraperError::Timeout { ref locator, .. } if locator == "search_input"),
        "{err:?}"
    );
}

#[tokio::test]
async fn blank_code_is_rejected() {
    let mut session = resolved_session(standard_site()).await;

    let err = search(&mut session, "   ").await.unwrap_err();

    assert!(matches!(err, ScraperError::Precondition { .. }), "{err:?}");
}

#[tokio::test]
async fn search_from_a_product_page_restarts_from_locale_home() {
    let mut session = resolved_session(standard_site()).await;
    search(&mut session, WIDGET_CODE).await.unwrap();

    let outcome = search(&mut session, "00000-000").await.unwrap();

    assert_eq!(outcome, SearchOutcome::NotFound);
    let visits = &session.driver().visits;
    assert_eq!(
        visits[visits.len() - 3..],
        [WIDGET_URL, US_HOME, NO_RESULTS_URL].map(String::from)
    );
}
