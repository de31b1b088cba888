//! Named content heuristics for the storefront journeys.
//!
//! These trade precision for recall: they answer "is this shown somewhere on
//! the page" by looking at the page text, so unrelated copy can satisfy them.
//! `promo_terms_shown` is the known offender (a "Terms" footer link is
//! enough). Tighten a rule only against real markup from the site.

use crate::heuristic::{ContentHeuristic, TextRule};

fn built_in_regex(pattern: &'static str) -> TextRule {
    TextRule::regex(pattern).expect("built-in heuristic pattern must compile")
}

/// A currency amount is visible: a pound sign and a two-decimal number.
pub fn price_is_displayed() -> ContentHeuristic {
    ContentHeuristic::new(
        "price_is_displayed",
        vec![
            TextRule::any_of(&["£", "GBP"]),
            built_in_regex(r"\d+\.\d{2}"),
        ],
    )
}

pub fn stock_status_is_displayed() -> ContentHeuristic {
    ContentHeuristic::new(
        "stock_status_is_displayed",
        vec![TextRule::any_of(&[
            "In Stock",
            "in stock",
            "In stock",
            "Available",
            "available",
            "Out of Stock",
            "Out of stock",
            "out of stock",
            "Sold out",
            "Low stock",
        ])],
    )
}

pub fn promo_terms_shown() -> ContentHeuristic {
    ContentHeuristic::new(
        "promo_terms_shown",
        vec![TextRule::any_of(&[
            "Terms",
            "terms",
            "T&Cs",
            "T&C",
            "Offer ends",
            "offer ends",
        ])],
    )
}

pub fn basket_is_empty() -> ContentHeuristic {
    ContentHeuristic::new(
        "basket_is_empty",
        vec![TextRule::any_of(&[
            "Your basket is empty",
            "your basket is empty",
            "Your cart is empty",
            "your cart is empty",
            "No items in your basket",
        ])],
    )
}

pub fn delivery_info_shown() -> ContentHeuristic {
    ContentHeuristic::new(
        "delivery_info_shown",
        vec![
            TextRule::any_of(&["Delivery", "delivery", "Collection", "collection"]),
            built_in_regex(r"(?i)(free|£\d|next day|\d+\s*(-\s*\d+\s*)?(working )?days?)"),
        ],
    )
}

pub fn search_results_shown() -> ContentHeuristic {
    ContentHeuristic::new(
        "search_results_shown",
        vec![built_in_regex(
            r"(?i)(\d+\s+(results?|products?|items?)\b|results for|showing \d+)",
        )],
    )
}

pub fn store_results_shown() -> ContentHeuristic {
    ContentHeuristic::new(
        "store_results_shown",
        vec![TextRule::any_of(&[
            "Opening hours",
            "Opening Hours",
            "Opening times",
            "Opening Times",
            "Get directions",
            "Get Directions",
            "miles away",
            "km away",
        ])],
    )
}

/// Every named heuristic, in display order.
pub fn catalogue() -> Vec<ContentHeuristic> {
    vec![
        price_is_displayed(),
        stock_status_is_displayed(),
        promo_terms_shown(),
        basket_is_empty(),
        delivery_info_shown(),
        search_results_shown(),
        store_results_shown(),
    ]
}

pub fn by_name(name: &str) -> Option<ContentHeuristic> {
    catalogue().into_iter().find(|h| h.name == name)
}
