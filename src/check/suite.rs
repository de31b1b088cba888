use std::fmt;

use serde::{Deserialize, Serialize};

use crate::driver::Selector;
use crate::heuristic::TextRule;

/// A scenario to run against one page: where to start and what to do.
/// Deserialized from YAML for review and execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckSuite {
    /// Human-readable name for this scenario
    pub name: String,

    /// URL to navigate to before executing steps
    pub start_url: String,

    /// Ordered list of steps to execute
    pub steps: Vec<CheckStep>,
}

/// A single step. Targets are given as fallback lists: the first visible
/// selector is used.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CheckStep {
    Navigate { url: String },

    Click { any_of: Vec<Selector> },

    Fill { any_of: Vec<Selector>, value: String },

    /// Let the page settle
    Wait { duration_ms: u64 },

    /// Evaluate expectations against the current page
    Expect { checks: Vec<Expectation> },
}

/// Where a count comes from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CountSource {
    /// Number of nodes matching the selector
    #[default]
    Elements,
    /// First integer in the element's text, e.g. a basket badge
    Text,
}

/// One "is X true / visible / present" question. Every expectation is polled
/// until it holds or its timeout (default from config) is spent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expectation {
    Visible {
        any_of: Vec<Selector>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },

    /// None of the selectors is visible (spinners, toasts going away)
    Hidden {
        any_of: Vec<Selector>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },

    ElementText {
        any_of: Vec<Selector>,
        rule: TextRule,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },

    CountAtLeast {
        any_of: Vec<Selector>,
        expected: u32,
        #[serde(default)]
        read: CountSource,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },

    CountExactly {
        any_of: Vec<Selector>,
        expected: u32,
        #[serde(default)]
        read: CountSource,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },

    /// A named heuristic from the rule catalogue
    Heuristic {
        rule: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },

    /// Ad-hoc heuristic: all rules must hold on the page text
    PageText {
        rules: Vec<TextRule>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },

    UrlContains {
        expected: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
    },
}

impl Expectation {
    pub fn timeout_ms(&self) -> Option<u64> {
        match self {
            Expectation::Visible { timeout_ms, .. }
            | Expectation::Hidden { timeout_ms, .. }
            | Expectation::ElementText { timeout_ms, .. }
            | Expectation::CountAtLeast { timeout_ms, .. }
            | Expectation::CountExactly { timeout_ms, .. }
            | Expectation::Heuristic { timeout_ms, .. }
            | Expectation::PageText { timeout_ms, .. }
            | Expectation::UrlContains { timeout_ms, .. } => *timeout_ms,
        }
    }

    /// Variant name for report headings.
    pub fn kind(&self) -> &'static str {
        match self {
            Expectation::Visible { .. } => "Visible",
            Expectation::Hidden { .. } => "Hidden",
            Expectation::ElementText { .. } => "ElementText",
            Expectation::CountAtLeast { .. } => "CountAtLeast",
            Expectation::CountExactly { .. } => "CountExactly",
            Expectation::Heuristic { .. } => "Heuristic",
            Expectation::PageText { .. } => "PageText",
            Expectation::UrlContains { .. } => "UrlContains",
        }
    }
}

fn join(selectors: &[Selector]) -> String {
    selectors
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(" | ")
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Visible { any_of, .. } => write!(f, "visible {}", join(any_of)),
            Expectation::Hidden { any_of, .. } => write!(f, "hidden {}", join(any_of)),
            Expectation::ElementText { any_of, rule, .. } => {
                write!(f, "text of {} {}", join(any_of), rule)
            }
            Expectation::CountAtLeast {
                any_of, expected, ..
            } => write!(f, "count of {} >= {}", join(any_of), expected),
            Expectation::CountExactly {
                any_of, expected, ..
            } => write!(f, "count of {} == {}", join(any_of), expected),
            Expectation::Heuristic { rule, .. } => write!(f, "heuristic {}", rule),
            Expectation::PageText { rules, .. } => write!(f, "page text with {} rule(s)", rules.len()),
            Expectation::UrlContains { expected, .. } => write!(f, "url contains {:?}", expected),
        }
    }
}

/// Result of evaluating one expectation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckResult {
    /// Which step this check belongs to (0-indexed)
    pub step_index: usize,

    pub expectation: Expectation,

    pub passed: bool,

    /// Value observed last (for debugging failures)
    pub actual: Option<String>,

    /// Recognizer that satisfied the check
    pub matched: Option<String>,

    /// Human-readable failure reason: selectors tried, time spent
    pub message: Option<String>,

    pub elapsed_ms: u64,
}

/// Result of running a complete suite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub suite_name: String,

    /// Whether all steps ran and all checks passed
    pub passed: bool,

    pub steps_run: usize,

    pub check_results: Vec<CheckResult>,

    /// Set when a step failed to execute (as opposed to a check failing)
    pub error: Option<String>,
}
