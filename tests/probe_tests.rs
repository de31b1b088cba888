use storefront_probe::driver::memory::{MemoryElement, MemoryPage};
use storefront_probe::driver::{AutomationDriver, DriverError, Selector};
use storefront_probe::heuristic::{TextRule, rules};
use storefront_probe::probe::{
    MAX_PROBE_TIMEOUT_MS, ProbeResult, ProbeSpec, parse_count, probe, probe_count,
    probe_counter_text, probe_page_text,
};
use storefront_probe::probe::chain::FallbackChain;

use crate::common::drivers::{Answer, ScriptedDriver, sel};

mod common;

// =========================================================================
// ProbeResult
// =========================================================================

#[test]
fn absence_errors_read_as_not_found() {
    let not_found: ProbeResult<String> = ProbeResult::from_read(Err(DriverError::ElementNotFound {
        selector: "#price".into(),
    }));
    assert_eq!(not_found, ProbeResult::NotFound);

    let timed_out: ProbeResult<String> = ProbeResult::from_read(Err(DriverError::Timeout {
        selector: "#price".into(),
        timeout_ms: 1000,
    }));
    assert_eq!(timed_out, ProbeResult::NotFound);
}

#[test]
fn session_faults_read_as_errored() {
    let result: ProbeResult<String> =
        ProbeResult::from_read(Err(DriverError::SessionClosed("Target closed".into())));
    assert!(result.is_errored());
    match result {
        ProbeResult::Errored(reason) => assert!(reason.contains("Target closed")),
        other => panic!("expected Errored, got {:?}", other),
    }
}

#[test]
fn filter_turns_rejected_value_into_not_found() {
    assert_eq!(ProbeResult::Found(3).filter(|n| *n > 5), ProbeResult::NotFound);
    assert_eq!(ProbeResult::Found(7).filter(|n| *n > 5), ProbeResult::Found(7));
    assert_eq!(
        ProbeResult::<u32>::Errored("x".into()).filter(|_| false),
        ProbeResult::Errored("x".into())
    );
}

// =========================================================================
// probe
// =========================================================================

#[test]
fn visible_probe_returns_element_text() {
    let mut page = MemoryPage::new("https://shop.test")
        .with_element(".price", MemoryElement::visible("£32.50"));

    let result = probe(&mut page, &ProbeSpec::visible(sel(".price")));
    assert_eq!(result, ProbeResult::Found("£32.50".to_string()));
}

#[test]
fn hidden_and_missing_elements_are_not_found() {
    let mut page = MemoryPage::new("https://shop.test")
        .with_element(".spinner", MemoryElement::hidden("Loading"));

    assert_eq!(probe(&mut page, &ProbeSpec::visible(sel(".spinner"))), ProbeResult::NotFound);
    assert_eq!(probe(&mut page, &ProbeSpec::visible(sel("#nope"))), ProbeResult::NotFound);
}

#[test]
fn driver_timeout_is_not_found_but_fault_is_errored() {
    let mut driver = ScriptedDriver::new()
        .answer("#slow", Answer::TimesOut)
        .answer("#broken", Answer::Fault("Execution context was destroyed"));

    assert_eq!(probe(&mut driver, &ProbeSpec::visible(sel("#slow"))), ProbeResult::NotFound);
    assert!(probe(&mut driver, &ProbeSpec::visible(sel("#broken"))).is_errored());
}

#[test]
fn predicate_must_hold_on_value_read() {
    let mut page = MemoryPage::new("https://shop.test")
        .with_element(".price", MemoryElement::visible("Price: TBC"));

    let spec = ProbeSpec::text(sel(".price")).with_predicate(TextRule::regex(r"\d+\.\d{2}").unwrap());
    assert_eq!(probe(&mut page, &spec), ProbeResult::NotFound);

    page.set(".price", MemoryElement::visible("Price: £32.50"));
    assert_eq!(probe(&mut page, &spec), ProbeResult::Found("Price: £32.50".to_string()));
}

#[test]
fn attribute_probe_reads_attribute() {
    let mut page = MemoryPage::new("https://shop.test").with_element(
        "button.add-to-basket",
        MemoryElement::visible("Add").with_attribute("aria-disabled", "false"),
    );

    let found = probe(&mut page, &ProbeSpec::attribute(sel("button.add-to-basket"), "aria-disabled"));
    assert_eq!(found, ProbeResult::Found("false".to_string()));

    let missing = probe(&mut page, &ProbeSpec::attribute(sel("button.add-to-basket"), "data-sku"));
    assert_eq!(missing, ProbeResult::NotFound);
}

#[test]
fn probing_twice_gives_the_same_result_and_changes_nothing() {
    let mut page = MemoryPage::new("https://shop.test")
        .with_element(".stock", MemoryElement::visible("In Stock"));
    let spec = ProbeSpec::visible(sel(".stock"));

    let first = probe(&mut page, &spec);
    let second = probe(&mut page, &spec);

    assert_eq!(first, second);
    assert!(page.actions().is_empty(), "probes must not mutate the page");
}

#[test]
fn probe_timeout_is_clamped() {
    let spec = ProbeSpec::visible(Selector::css("#price")).with_timeout(30_000);
    assert_eq!(spec.timeout_ms, MAX_PROBE_TIMEOUT_MS);

    let short = ProbeSpec::visible(Selector::css("#price")).with_timeout(250);
    assert_eq!(short.timeout_ms, 250);
}

#[test]
fn zero_wait_is_raised_to_one_millisecond() {
    let spec = ProbeSpec::visible(Selector::css("#price")).with_timeout(0);
    assert_eq!(spec.timeout_ms, 1);

    let mut driver = ScriptedDriver::new().answer(".price", Answer::Visible("£32.50"));
    let chain = FallbackChain::visible_any(&[sel("#price"), sel(".price")], 0);
    let outcome = chain.evaluate(&mut driver);

    assert_eq!(outcome.result, ProbeResult::Found("£32.50".to_string()));
    assert_eq!(driver.waits, vec![1, 1]);
}

#[test]
fn describe_mentions_attribute_and_predicate() {
    let spec = ProbeSpec::attribute(sel("img.hero"), "alt").with_predicate(TextRule::contains("Keg"));
    assert_eq!(spec.describe(), "img.hero [alt] contains \"Keg\"");
}

// =========================================================================
// Counts and page text
// =========================================================================

#[test]
fn count_of_absent_selector_is_zero_not_missing() {
    let mut page = MemoryPage::new("https://shop.test")
        .with_element(".basket-line", MemoryElement::visible("Keg").with_matches(3));

    assert_eq!(probe_count(&mut page, &sel(".basket-line")), ProbeResult::Found(3));
    assert_eq!(probe_count(&mut page, &sel(".wishlist-line")), ProbeResult::Found(0));
}

#[test]
fn counter_text_reads_first_number() {
    let mut page = MemoryPage::new("https://shop.test")
        .with_element(".basket-count", MemoryElement::visible("Basket (12 items)"))
        .with_element(".empty-badge", MemoryElement::visible("Basket"));

    assert_eq!(probe_counter_text(&mut page, &sel(".basket-count")), ProbeResult::Found(12));
    assert_eq!(probe_counter_text(&mut page, &sel(".empty-badge")), ProbeResult::NotFound);
}

#[test]
fn parse_count_cases() {
    assert_eq!(parse_count("3"), Some(3));
    assert_eq!(parse_count("Basket (12 items)"), Some(12));
    assert_eq!(parse_count("2 of 10"), Some(2));
    assert_eq!(parse_count("none"), None);
    assert_eq!(parse_count(""), None);
}

#[test]
fn page_text_probe_applies_heuristic() {
    let mut page = MemoryPage::new("https://shop.test").with_body("Pale Ale\nPrice: £32.50 per keg");
    let found = probe_page_text(&mut page, &rules::price_is_displayed());
    assert!(found.is_found());

    page.set_body("Pale Ale\nPrice: TBC");
    assert_eq!(probe_page_text(&mut page, &rules::price_is_displayed()), ProbeResult::NotFound);
}

#[test]
fn memory_page_body_defaults_to_visible_text() {
    let mut page = MemoryPage::new("https://shop.test")
        .with_element("h1", MemoryElement::visible("Pale Ale"))
        .with_element(".price", MemoryElement::visible("£32.50"))
        .with_element(".debug", MemoryElement::hidden("secret"));

    let body = page.body_text().unwrap();
    assert!(body.contains("Pale Ale"));
    assert!(body.contains("£32.50"));
    assert!(!body.contains("secret"));
}

#[test]
fn closed_page_faults_every_read() {
    let mut page = MemoryPage::new("https://shop.test")
        .with_element(".price", MemoryElement::visible("£32.50"));
    page.close();

    assert!(probe(&mut page, &ProbeSpec::visible(sel(".price"))).is_errored());
    assert!(probe_count(&mut page, &sel(".price")).is_errored());
}
