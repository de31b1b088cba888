use storefront_probe::driver::Selector;

#[test]
fn plain_string_is_css() {
    let selector: Selector = "button.add-to-basket".parse().unwrap();
    assert_eq!(selector, Selector::css("button.add-to-basket"));
}

#[test]
fn text_prefix_is_text_matcher() {
    let selector: Selector = "text=£".parse().unwrap();
    assert_eq!(selector, Selector::text("£"));
}

#[test]
fn role_with_and_without_name() {
    let button: Selector = "role=button".parse().unwrap();
    assert_eq!(button, Selector::role("button", None));

    let named: Selector = "role=button:Add to basket".parse().unwrap();
    assert_eq!(named, Selector::role("button", Some("Add to basket")));
}

#[test]
fn empty_selectors_are_rejected() {
    assert!("".parse::<Selector>().is_err());
    assert!("   ".parse::<Selector>().is_err());
    assert!("text=".parse::<Selector>().is_err());
    assert!("role=".parse::<Selector>().is_err());
}

#[test]
fn display_reads_back_as_same_selector() {
    for raw in ["#price", "text=Add to basket", "role=link:Basket", "role=dialog"] {
        let selector: Selector = raw.parse().unwrap();
        assert_eq!(selector.to_string(), raw);
    }
}

#[test]
fn selectors_deserialize_from_yaml_strings() {
    let selectors: Vec<Selector> =
        serde_yaml::from_str("[\"#price\", \".price\", \"text=£\"]").unwrap();
    assert_eq!(
        selectors,
        vec![Selector::css("#price"), Selector::css(".price"), Selector::text("£")]
    );
}

#[test]
fn empty_selector_in_yaml_is_an_error() {
    let result: Result<Vec<Selector>, _> = serde_yaml::from_str("[\"\"]");
    assert!(result.is_err());
}
