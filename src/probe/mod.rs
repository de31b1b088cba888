use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::driver::{AutomationDriver, DriverError, Selector};
use crate::heuristic::{ContentHeuristic, TextRule};

pub mod chain;

/// Default intrinsic wait of a single probe.
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 1_000;

/// Upper bound on a probe's intrinsic wait, so a chain of probes fails fast.
pub const MAX_PROBE_TIMEOUT_MS: u64 = 1_000;

// ============================================================================
// Probe result
// ============================================================================

/// Outcome of one probe. Absence is a value, not an error: only driver faults
/// the probe cannot interpret end up in `Errored`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeResult<T> {
    Found(T),
    NotFound,
    Errored(String),
}

impl<T> ProbeResult<T> {
    /// Absence-class driver errors become `NotFound`, the rest `Errored`.
    pub fn from_read(read: Result<Option<T>, DriverError>) -> Self {
        match read {
            Ok(Some(value)) => ProbeResult::Found(value),
            Ok(None) => ProbeResult::NotFound,
            Err(e) if e.is_absence() => ProbeResult::NotFound,
            Err(e) => ProbeResult::Errored(e.to_string()),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, ProbeResult::Found(_))
    }

    pub fn is_errored(&self) -> bool {
        matches!(self, ProbeResult::Errored(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            ProbeResult::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> ProbeResult<&T> {
        match self {
            ProbeResult::Found(value) => ProbeResult::Found(value),
            ProbeResult::NotFound => ProbeResult::NotFound,
            ProbeResult::Errored(reason) => ProbeResult::Errored(reason.clone()),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ProbeResult<U> {
        match self {
            ProbeResult::Found(value) => ProbeResult::Found(f(value)),
            ProbeResult::NotFound => ProbeResult::NotFound,
            ProbeResult::Errored(reason) => ProbeResult::Errored(reason),
        }
    }

    /// A found value the predicate rejects counts as not found.
    pub fn filter(self, predicate: impl FnOnce(&T) -> bool) -> Self {
        match self {
            ProbeResult::Found(value) if !predicate(&value) => ProbeResult::NotFound,
            other => other,
        }
    }
}

// ============================================================================
// Probe spec
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeCheck {
    /// Element is visible; the value is its text (empty if it has none)
    Visible,
    /// Element exists and has text
    Text,
    /// Element exists and carries the attribute
    Attribute { name: String },
}

/// One selector strategy for one condition.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeSpec {
    pub selector: Selector,
    pub check: ProbeCheck,
    /// Required substring/regex on the value read
    pub predicate: Option<TextRule>,
    pub timeout_ms: u64,
}

impl ProbeSpec {
    pub fn visible(selector: Selector) -> Self {
        Self {
            selector,
            check: ProbeCheck::Visible,
            predicate: None,
            timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
        }
    }

    pub fn text(selector: Selector) -> Self {
        Self {
            check: ProbeCheck::Text,
            ..Self::visible(selector)
        }
    }

    pub fn attribute(selector: Selector, name: &str) -> Self {
        Self {
            check: ProbeCheck::Attribute {
                name: name.to_string(),
            },
            ..Self::visible(selector)
        }
    }

    pub fn with_predicate(mut self, predicate: TextRule) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Kept within `1..=MAX_PROBE_TIMEOUT_MS`; a zero wait means no limit to
    /// the browser.
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms.clamp(1, MAX_PROBE_TIMEOUT_MS);
        self
    }

    pub fn describe(&self) -> String {
        let mut out = self.selector.to_string();
        if let ProbeCheck::Attribute { name } = &self.check {
            out.push_str(&format!(" [{}]", name));
        }
        if let Some(predicate) = &self.predicate {
            out.push_str(&format!(" {}", predicate));
        }
        out
    }
}

// ============================================================================
// Probes
// ============================================================================

/// Make one read-only attempt to satisfy `spec`.
pub fn probe<D>(driver: &mut D, spec: &ProbeSpec) -> ProbeResult<String>
where
    D: AutomationDriver + ?Sized,
{
    let read = match &spec.check {
        ProbeCheck::Visible => match driver.is_visible(&spec.selector, spec.timeout_ms) {
            Ok(true) => driver
                .text_content(&spec.selector)
                .map(|text| Some(text.unwrap_or_default())),
            Ok(false) => Ok(None),
            Err(e) => Err(e),
        },
        ProbeCheck::Text => driver.text_content(&spec.selector),
        ProbeCheck::Attribute { name } => driver.get_attribute(&spec.selector, name),
    };

    let result = ProbeResult::from_read(read).filter(|value| {
        spec.predicate
            .as_ref()
            .is_none_or(|predicate| predicate.matches(value))
    });

    debug!(probe = %spec.describe(), found = result.is_found(), errored = result.is_errored(), "probe");
    result
}

/// Number of nodes matching `selector`. Zero is a legitimate observation.
pub fn probe_count<D>(driver: &mut D, selector: &Selector) -> ProbeResult<u32>
where
    D: AutomationDriver + ?Sized,
{
    ProbeResult::from_read(driver.count(selector).map(Some))
}

/// Read a counter badge such as `Basket (3)` and return the first integer in it.
pub fn probe_counter_text<D>(driver: &mut D, selector: &Selector) -> ProbeResult<u32>
where
    D: AutomationDriver + ?Sized,
{
    match ProbeResult::from_read(driver.text_content(selector)) {
        ProbeResult::Found(text) => match parse_count(&text) {
            Some(count) => ProbeResult::Found(count),
            None => ProbeResult::NotFound,
        },
        ProbeResult::NotFound => ProbeResult::NotFound,
        ProbeResult::Errored(reason) => ProbeResult::Errored(reason),
    }
}

/// Evaluate a content heuristic against the whole page text.
/// The value found is the page text the heuristic judged.
pub fn probe_page_text<D>(driver: &mut D, heuristic: &ContentHeuristic) -> ProbeResult<String>
where
    D: AutomationDriver + ?Sized,
{
    ProbeResult::from_read(driver.body_text().map(Some)).filter(|text| heuristic.evaluate(text))
}

/// First run of ASCII digits in `text`, e.g. `"Basket (12 items)"` -> 12.
pub fn parse_count(text: &str) -> Option<u32> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
