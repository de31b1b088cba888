use storefront_probe::driver::memory::{MemoryElement, MemoryPage};
use storefront_probe::poll::ManualClock;

pub const KEG_URL: &str = "https://shop.test/kegs/pale-ale";

/// Product page for a keg: price, stock label, add button and a basket badge
/// that goes to 1 when the button is clicked.
pub fn keg_product_page(clock: &ManualClock) -> MemoryPage {
    MemoryPage::new("about:blank")
        .with_clock(clock.clone())
        .with_element("h1", MemoryElement::visible("Pale Ale 30L Keg"))
        .with_element(".price", MemoryElement::visible("Price: £32.50 per keg"))
        .with_element(".stock", MemoryElement::visible("In Stock"))
        .with_element("button.add-to-basket", MemoryElement::visible("Add to basket"))
        .with_element(".basket-count", MemoryElement::visible("Basket (0)"))
        .on_click(
            "button.add-to-basket",
            ".basket-count",
            MemoryElement::visible("Basket (1)"),
        )
}
