pub mod error;
pub mod memory;
pub mod selector;
pub mod session;

pub use error::DriverError;
pub use selector::Selector;

/// Read-only view of the current page.
///
/// Probes, chains and pollers only ever call these methods. Implementations
/// report a missing element as `Ok(false)` / `Ok(None)` / `Ok(0)` where they
/// can, and as an absence-class `DriverError` where they cannot.
pub trait AutomationDriver {
    /// Whether the element is visible, waiting at most `timeout_ms` for it.
    fn is_visible(&mut self, selector: &Selector, timeout_ms: u64) -> Result<bool, DriverError>;

    fn text_content(&mut self, selector: &Selector) -> Result<Option<String>, DriverError>;

    fn count(&mut self, selector: &Selector) -> Result<u32, DriverError>;

    fn get_attribute(
        &mut self,
        selector: &Selector,
        name: &str,
    ) -> Result<Option<String>, DriverError>;

    /// Full visible text of the page.
    fn body_text(&mut self) -> Result<String, DriverError>;
}

/// A driver that can also change the page. Used by check runners and page
/// objects, never by the probing primitives.
pub trait PageDriver: AutomationDriver {
    fn navigate(&mut self, url: &str) -> Result<(), DriverError>;

    fn click(&mut self, selector: &Selector) -> Result<(), DriverError>;

    fn fill(&mut self, selector: &Selector, value: &str) -> Result<(), DriverError>;

    fn current_url(&mut self) -> Result<String, DriverError>;

    /// Let the page settle for `ms` milliseconds.
    fn wait_idle(&mut self, ms: u64) -> Result<(), DriverError>;
}
