use std::collections::HashMap;

use storefront_probe::driver::memory::MemoryPage;
use storefront_probe::driver::{AutomationDriver, DriverError, PageDriver, Selector};

/// How a `ScriptedDriver` answers for one selector.
#[derive(Debug, Clone)]
pub enum Answer {
    Visible(&'static str),
    Hidden,
    /// The driver's own wait expired
    TimesOut,
    /// Browser reported something unclassifiable
    Fault(&'static str),
}

/// Read-only driver answering from a fixed table and logging every call.
/// Selectors missing from the table are absent.
#[derive(Debug, Default)]
pub struct ScriptedDriver {
    answers: HashMap<String, Answer>,
    body: String,
    pub calls: Vec<String>,
    /// Timeouts handed to `is_visible`, in call order
    pub waits: Vec<u64>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, selector: &str, answer: Answer) -> Self {
        self.answers.insert(selector.to_string(), answer);
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    fn lookup(&mut self, op: &str, selector: &Selector) -> Result<Option<&'static str>, DriverError> {
        self.calls.push(format!("{} {}", op, selector));
        match self.answers.get(&selector.to_string()) {
            Some(Answer::Visible(text)) => Ok(Some(*text)),
            Some(Answer::Hidden) | None => Ok(None),
            Some(Answer::TimesOut) => Err(DriverError::Timeout {
                selector: selector.to_string(),
                timeout_ms: 1000,
            }),
            Some(Answer::Fault(error)) => Err(DriverError::SessionProtocol {
                command: op.to_string(),
                error: error.to_string(),
            }),
        }
    }
}

impl AutomationDriver for ScriptedDriver {
    fn is_visible(&mut self, selector: &Selector, timeout_ms: u64) -> Result<bool, DriverError> {
        self.waits.push(timeout_ms);
        Ok(self.lookup("is_visible", selector)?.is_some())
    }

    fn text_content(&mut self, selector: &Selector) -> Result<Option<String>, DriverError> {
        Ok(self.lookup("text_content", selector)?.map(str::to_string))
    }

    fn count(&mut self, selector: &Selector) -> Result<u32, DriverError> {
        Ok(self.lookup("count", selector)?.map_or(0, |_| 1))
    }

    fn get_attribute(
        &mut self,
        selector: &Selector,
        _name: &str,
    ) -> Result<Option<String>, DriverError> {
        Ok(self.lookup("get_attribute", selector)?.map(str::to_string))
    }

    fn body_text(&mut self) -> Result<String, DriverError> {
        self.calls.push("body_text".to_string());
        Ok(self.body.clone())
    }
}

/// A `MemoryPage` whose body text can no longer be read, as when the tab
/// navigates away in the middle of a heuristic check.
pub struct BrokenBodyPage(pub MemoryPage);

impl AutomationDriver for BrokenBodyPage {
    fn is_visible(&mut self, selector: &Selector, timeout_ms: u64) -> Result<bool, DriverError> {
        self.0.is_visible(selector, timeout_ms)
    }

    fn text_content(&mut self, selector: &Selector) -> Result<Option<String>, DriverError> {
        self.0.text_content(selector)
    }

    fn count(&mut self, selector: &Selector) -> Result<u32, DriverError> {
        self.0.count(selector)
    }

    fn get_attribute(
        &mut self,
        selector: &Selector,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        self.0.get_attribute(selector, name)
    }

    fn body_text(&mut self) -> Result<String, DriverError> {
        Err(DriverError::SessionClosed("Target closed".into()))
    }
}

impl PageDriver for BrokenBodyPage {
    fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.0.navigate(url)
    }

    fn click(&mut self, selector: &Selector) -> Result<(), DriverError> {
        self.0.click(selector)
    }

    fn fill(&mut self, selector: &Selector, value: &str) -> Result<(), DriverError> {
        self.0.fill(selector, value)
    }

    fn current_url(&mut self) -> Result<String, DriverError> {
        self.0.current_url()
    }

    fn wait_idle(&mut self, ms: u64) -> Result<(), DriverError> {
        self.0.wait_idle(ms)
    }
}

pub fn sel(raw: &str) -> Selector {
    raw.parse().expect("test selector must parse")
}

pub fn sels(raw: &[&str]) -> Vec<Selector> {
    raw.iter().map(|s| sel(s)).collect()
}
