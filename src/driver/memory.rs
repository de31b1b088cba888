use std::collections::HashMap;
use std::time::Duration;

use crate::driver::{AutomationDriver, DriverError, PageDriver, Selector};
use crate::poll::clock::{Clock, ManualClock};

/// State of one selector on a `MemoryPage` at some instant.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MemoryElement {
    pub visible: bool,
    pub text: Option<String>,
    pub attributes: HashMap<String, String>,
    /// How many DOM nodes the selector matches (0 = absent)
    pub matches: u32,
}

impl MemoryElement {
    pub fn visible(text: &str) -> Self {
        Self {
            visible: true,
            text: Some(text.to_string()),
            attributes: HashMap::new(),
            matches: 1,
        }
    }

    /// Present in the DOM but not rendered.
    pub fn hidden(text: &str) -> Self {
        Self {
            visible: false,
            ..Self::visible(text)
        }
    }

    pub fn absent() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_matches(mut self, matches: u32) -> Self {
        self.matches = matches;
        self
    }
}

/// Scripted in-memory page implementing the driver contracts.
///
/// Elements can change over time when a `ManualClock` is attached, and
/// clicks can trigger changes elsewhere on the page, which is enough to
/// model cart counters, loaders and toasts without a browser.
#[derive(Debug, Default)]
pub struct MemoryPage {
    url: String,
    body: Option<String>,
    elements: HashMap<Selector, Vec<(u64, MemoryElement)>>,
    reactions: HashMap<Selector, Vec<(Selector, MemoryElement)>>,
    click_failures: HashMap<Selector, u32>,
    clock: Option<ManualClock>,
    closed: bool,
    reads: u32,
    actions: Vec<String>,
}

fn parse(raw: &str) -> Selector {
    raw.parse().unwrap_or_else(|_| Selector::Css(raw.to_string()))
}

impl MemoryPage {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn with_clock(mut self, clock: ManualClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Fixed body text. Without one, the body is the text of all visible elements.
    pub fn with_body(mut self, body: &str) -> Self {
        self.body = Some(body.to_string());
        self
    }

    pub fn with_element(mut self, selector: &str, element: MemoryElement) -> Self {
        self.set(selector, element);
        self
    }

    /// Replace the element state from now on.
    pub fn set(&mut self, selector: &str, element: MemoryElement) {
        let now = self.now_ms();
        self.schedule(selector, now, element);
    }

    /// Change the element state once the clock reaches `at_ms`.
    pub fn schedule(&mut self, selector: &str, at_ms: u64, element: MemoryElement) {
        let timeline = self.elements.entry(parse(selector)).or_default();
        timeline.push((at_ms, element));
        timeline.sort_by_key(|(at, _)| *at);
    }

    pub fn set_body(&mut self, body: &str) {
        self.body = Some(body.to_string());
    }

    /// Clicking `trigger` sets `target` to `element`.
    pub fn on_click(mut self, trigger: &str, target: &str, element: MemoryElement) -> Self {
        self.reactions
            .entry(parse(trigger))
            .or_default()
            .push((parse(target), element));
        self
    }

    /// The next `times` clicks on `selector` fail as if the element were not ready.
    pub fn fail_clicks(mut self, selector: &str, times: u32) -> Self {
        self.click_failures.insert(parse(selector), times);
        self
    }

    /// Simulate the tab going away: every later call fails with `SessionClosed`.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Number of read calls served so far.
    pub fn reads(&self) -> u32 {
        self.reads
    }

    /// Mutating calls in the order they happened, e.g. `click button.add`.
    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    fn now_ms(&self) -> u64 {
        self.clock.as_ref().map_or(0, |c| c.now_ms())
    }

    fn current(&self, selector: &Selector) -> Option<&MemoryElement> {
        let now = self.now_ms();
        self.elements
            .get(selector)?
            .iter()
            .rev()
            .find(|(at, _)| *at <= now)
            .map(|(_, element)| element)
            .filter(|element| element.matches > 0)
    }

    fn read(&mut self) -> Result<(), DriverError> {
        if self.closed {
            return Err(DriverError::SessionClosed("page closed".into()));
        }
        self.reads += 1;
        Ok(())
    }

    fn act(&mut self, action: String) -> Result<(), DriverError> {
        if self.closed {
            return Err(DriverError::SessionClosed("page closed".into()));
        }
        self.actions.push(action);
        Ok(())
    }
}

impl AutomationDriver for MemoryPage {
    fn is_visible(&mut self, selector: &Selector, _timeout_ms: u64) -> Result<bool, DriverError> {
        self.read()?;
        Ok(self.current(selector).is_some_and(|e| e.visible))
    }

    fn text_content(&mut self, selector: &Selector) -> Result<Option<String>, DriverError> {
        self.read()?;
        Ok(self.current(selector).and_then(|e| e.text.clone()))
    }

    fn count(&mut self, selector: &Selector) -> Result<u32, DriverError> {
        self.read()?;
        Ok(self.current(selector).map_or(0, |e| e.matches))
    }

    fn get_attribute(
        &mut self,
        selector: &Selector,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        self.read()?;
        Ok(self
            .current(selector)
            .and_then(|e| e.attributes.get(name).cloned()))
    }

    fn body_text(&mut self) -> Result<String, DriverError> {
        self.read()?;
        if let Some(body) = &self.body {
            return Ok(body.clone());
        }

        let mut selectors: Vec<&Selector> = self.elements.keys().collect();
        selectors.sort_by_key(|s| s.to_string());

        let texts: Vec<String> = selectors
            .into_iter()
            .filter_map(|s| self.current(s))
            .filter(|e| e.visible)
            .filter_map(|e| e.text.clone())
            .collect();
        Ok(texts.join("\n"))
    }
}

impl PageDriver for MemoryPage {
    fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.act(format!("navigate {}", url))?;
        self.url = url.to_string();
        Ok(())
    }

    fn click(&mut self, selector: &Selector) -> Result<(), DriverError> {
        self.act(format!("click {}", selector))?;

        if let Some(remaining) = self.click_failures.get_mut(selector) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(DriverError::ElementNotFound {
                    selector: selector.to_string(),
                });
            }
        }

        if !self.current(selector).is_some_and(|e| e.visible) {
            return Err(DriverError::ElementNotFound {
                selector: selector.to_string(),
            });
        }

        let now = self.now_ms();
        if let Some(reactions) = self.reactions.get(selector).cloned() {
            for (target, element) in reactions {
                let timeline = self.elements.entry(target).or_default();
                timeline.push((now, element));
                timeline.sort_by_key(|(at, _)| *at);
            }
        }
        Ok(())
    }

    fn fill(&mut self, selector: &Selector, value: &str) -> Result<(), DriverError> {
        self.act(format!("fill {} = {}", selector, value))?;
        if self.current(selector).is_none() {
            return Err(DriverError::ElementNotFound {
                selector: selector.to_string(),
            });
        }
        Ok(())
    }

    fn current_url(&mut self) -> Result<String, DriverError> {
        self.read()?;
        Ok(self.url.clone())
    }

    fn wait_idle(&mut self, ms: u64) -> Result<(), DriverError> {
        self.act(format!("wait {}", ms))?;
        if let Some(clock) = &self.clock {
            clock.sleep(Duration::from_millis(ms));
        }
        Ok(())
    }
}
