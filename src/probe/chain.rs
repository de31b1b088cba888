use tracing::debug;

use crate::driver::{AutomationDriver, Selector};
use crate::heuristic::ContentHeuristic;
use crate::probe::{ProbeResult, ProbeSpec, probe, probe_page_text};

/// One way of recognising a logical UI condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Recognizer {
    Probe(ProbeSpec),
    /// Last resort when no selector is stable: judge the page text.
    PageText(ContentHeuristic),
}

impl Recognizer {
    pub fn describe(&self) -> String {
        match self {
            Recognizer::Probe(spec) => spec.describe(),
            Recognizer::PageText(heuristic) => format!("page text: {}", heuristic.name),
        }
    }

    pub fn evaluate<D>(&self, driver: &mut D) -> ProbeResult<String>
    where
        D: AutomationDriver + ?Sized,
    {
        match self {
            Recognizer::Probe(spec) => probe(driver, spec),
            Recognizer::PageText(heuristic) => probe_page_text(driver, heuristic),
        }
    }
}

/// Short-circuit over lazily produced probe results.
///
/// Returns the first `Found` or `Errored` together with its position, or
/// `(None, NotFound)` when every probe came back empty. Probes after the
/// deciding one are never run as long as `results` is lazy.
pub fn first_found<T>(results: impl IntoIterator<Item = ProbeResult<T>>) -> (Option<usize>, ProbeResult<T>) {
    results
        .into_iter()
        .enumerate()
        .find(|(_, result)| !matches!(result, ProbeResult::NotFound))
        .map_or((None, ProbeResult::NotFound), |(index, result)| (Some(index), result))
}

/// Ordered recognizers for one logical condition; first success wins.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FallbackChain {
    recognizers: Vec<Recognizer>,
}

impl FallbackChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Visibility probes for each selector, in the given order.
    pub fn visible_any(selectors: &[Selector], timeout_ms: u64) -> Self {
        selectors.iter().fold(Self::new(), |chain, selector| {
            chain.then_probe(ProbeSpec::visible(selector.clone()).with_timeout(timeout_ms))
        })
    }

    pub fn then(mut self, recognizer: Recognizer) -> Self {
        self.recognizers.push(recognizer);
        self
    }

    pub fn then_probe(self, spec: ProbeSpec) -> Self {
        self.then(Recognizer::Probe(spec))
    }

    pub fn then_page_text(self, heuristic: ContentHeuristic) -> Self {
        self.then(Recognizer::PageText(heuristic))
    }

    pub fn len(&self) -> usize {
        self.recognizers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recognizers.is_empty()
    }

    pub fn recognizers(&self) -> &[Recognizer] {
        &self.recognizers
    }

    /// Run the recognizers strictly in order, one at a time.
    pub fn evaluate<D>(&self, driver: &mut D) -> ChainOutcome
    where
        D: AutomationDriver + ?Sized,
    {
        let (index, result) = first_found(self.recognizers.iter().map(|r| r.evaluate(&mut *driver)));

        let matched_index = index.filter(|_| result.is_found());
        let outcome = ChainOutcome {
            result,
            matched_index,
            attempted: self.recognizers.iter().map(Recognizer::describe).collect(),
        };

        debug!(
            matched = ?outcome.matched(),
            errored = outcome.result.is_errored(),
            "fallback chain of {} evaluated",
            self.len()
        );
        outcome
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChainOutcome {
    pub result: ProbeResult<String>,
    /// Position of the recognizer that found the condition
    pub matched_index: Option<usize>,
    /// Every recognizer of the chain, described, in order
    pub attempted: Vec<String>,
}

impl ChainOutcome {
    /// Description of the recognizer that matched.
    pub fn matched(&self) -> Option<&str> {
        self.matched_index
            .and_then(|i| self.attempted.get(i))
            .map(String::as_str)
    }

    pub fn reason(&self) -> String {
        match &self.result {
            ProbeResult::Found(_) => format!(
                "matched {}",
                self.matched().unwrap_or("unknown recognizer")
            ),
            ProbeResult::NotFound => format!(
                "tried {} selectors {:?}, none matched",
                self.attempted.len(),
                self.attempted
            ),
            ProbeResult::Errored(reason) => format!("driver fault: {}", reason),
        }
    }
}
