use thiserror::Error;
use tracing::{debug, info, warn};

use crate::check::context::RunContext;
use crate::check::suite::{CheckResult, CheckStep, CheckSuite, CountSource, Expectation, SuiteResult};
use crate::driver::{DriverError, PageDriver, Selector};
use crate::heuristic::{ContentHeuristic, HeuristicVerdict, rules};
use crate::poll::retry::{RetryPolicy, retry_with_backoff_if};
use crate::poll::{Clock, PollConfig, PollOutcome, Poller, ProbeFault, SystemClock, assert_at_least, assert_exact};
use crate::probe::chain::{FallbackChain, Recognizer, first_found};
use crate::probe::{DEFAULT_PROBE_TIMEOUT_MS, ProbeResult, ProbeSpec, probe_count, probe_counter_text};
use crate::trace::{ProbeTraceEvent, TraceLogger, text_fingerprint};

/// Timing knobs shared by every step of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    pub probe_timeout_ms: u64,
    pub poll: PollConfig,
    pub retry: RetryPolicy,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            poll: PollConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("no {action} target: {reason}")]
    TargetNotFound { action: &'static str, reason: String },

    #[error("{action} failed after {attempts} attempt(s): {last_error}")]
    Action {
        action: &'static str,
        attempts: u32,
        #[source]
        last_error: DriverError,
    },

    #[error(transparent)]
    Fault(#[from] ProbeFault),
}

/// What one expectation came to, before it becomes a `CheckResult`.
#[derive(Debug, Default)]
struct Evaluation {
    passed: bool,
    actual: Option<String>,
    matched: Option<String>,
    message: Option<String>,
    elapsed_ms: u64,
    attempts: u32,
    fingerprint: Option<String>,
    fault: Option<ProbeFault>,
}

impl Evaluation {
    fn from_fault(fault: ProbeFault) -> Self {
        Self {
            message: Some(fault.to_string()),
            elapsed_ms: fault.elapsed_ms,
            attempts: fault.attempts,
            fault: Some(fault),
            ..Self::default()
        }
    }
}

fn describe_all(chain: &FallbackChain) -> Vec<String> {
    chain.recognizers().iter().map(Recognizer::describe).collect()
}

/// Executes check suites step by step against a page driver.
pub struct CheckRunner<'a, C: Clock = SystemClock> {
    settings: RunSettings,
    clock: C,
    trace: Option<&'a TraceLogger>,
}

impl CheckRunner<'static, SystemClock> {
    pub fn new(settings: RunSettings) -> Self {
        Self::with_clock(settings, SystemClock::new())
    }
}

impl<'a, C: Clock> CheckRunner<'a, C> {
    pub fn with_clock(settings: RunSettings, clock: C) -> Self {
        Self {
            settings,
            clock,
            trace: None,
        }
    }

    pub fn with_trace<'b>(self, trace: &'b TraceLogger) -> CheckRunner<'b, C> {
        CheckRunner {
            settings: self.settings,
            clock: self.clock,
            trace: Some(trace),
        }
    }

    /// Run a complete suite. Check failures are recorded and the suite goes
    /// on; a step that cannot execute ends the suite with an error.
    pub fn run<D>(&self, suite: &CheckSuite, driver: &mut D) -> SuiteResult
    where
        D: PageDriver + ?Sized,
    {
        let mut ctx = RunContext::new();
        info!(suite = %suite.name, steps = suite.steps.len(), "running suite");

        if let Err(e) = self.retry_action("navigate", || driver.navigate(&suite.start_url)) {
            return SuiteResult {
                suite_name: suite.name.clone(),
                passed: false,
                steps_run: 0,
                check_results: ctx.check_results,
                error: Some(format!("Failed to navigate to start_url: {}", e)),
            };
        }

        for (i, step) in suite.steps.iter().enumerate() {
            ctx.current_step = i;

            if let Err(e) = self.execute_step(suite, step, i, driver, &mut ctx) {
                warn!(suite = %suite.name, step = i, error = %e, "step failed");
                return SuiteResult {
                    suite_name: suite.name.clone(),
                    passed: false,
                    steps_run: i + 1,
                    check_results: ctx.check_results,
                    error: Some(format!("Step {} failed: {}", i, e)),
                };
            }
        }

        let passed = ctx.all_passed();
        info!(suite = %suite.name, passed, failed_checks = ctx.fail_count(), "suite finished");
        SuiteResult {
            suite_name: suite.name.clone(),
            passed,
            steps_run: suite.steps.len(),
            check_results: ctx.check_results,
            error: None,
        }
    }

    fn execute_step<D>(
        &self,
        suite: &CheckSuite,
        step: &CheckStep,
        step_index: usize,
        driver: &mut D,
        ctx: &mut RunContext,
    ) -> Result<(), StepError>
    where
        D: PageDriver + ?Sized,
    {
        debug!(step = step_index, ?step, "executing step");

        match step {
            CheckStep::Navigate { url } => self.retry_action("navigate", || driver.navigate(url)),

            CheckStep::Click { any_of } => {
                let target = self.resolve_target("click", any_of, driver)?;
                self.retry_action("click", || driver.click(&target))
            }

            CheckStep::Fill { any_of, value } => {
                let target = self.resolve_target("fill", any_of, driver)?;
                self.retry_action("fill", || driver.fill(&target, value))
            }

            CheckStep::Wait { duration_ms } => Ok(driver.wait_idle(*duration_ms)?),

            CheckStep::Expect { checks } => {
                for expectation in checks {
                    let evaluation = self.evaluate(expectation, driver);
                    let fault = self.record(suite, step_index, expectation, evaluation, ctx);
                    if let Some(fault) = fault {
                        return Err(StepError::Fault(fault));
                    }
                }
                Ok(())
            }
        }
    }

    /// Store the result, write the trace line, and hand back any driver fault.
    fn record(
        &self,
        suite: &CheckSuite,
        step_index: usize,
        expectation: &Expectation,
        evaluation: Evaluation,
        ctx: &mut RunContext,
    ) -> Option<ProbeFault> {
        if evaluation.passed {
            debug!(check = %expectation, elapsed_ms = evaluation.elapsed_ms, "check passed");
        } else {
            warn!(check = %expectation, message = ?evaluation.message, "check failed");
        }

        if let Some(trace) = self.trace {
            let event = ProbeTraceEvent::now(&suite.name, step_index, expectation, evaluation.passed)
                .with_timing(evaluation.elapsed_ms, evaluation.attempts)
                .with_matched(evaluation.matched.as_deref())
                .with_message(evaluation.message.as_deref())
                .with_page_fingerprint(evaluation.fingerprint.clone());
            trace.log(&event);
        }

        ctx.record(CheckResult {
            step_index,
            expectation: expectation.clone(),
            passed: evaluation.passed,
            actual: evaluation.actual,
            matched: evaluation.matched,
            message: evaluation.message,
            elapsed_ms: evaluation.elapsed_ms,
        });
        evaluation.fault
    }

    fn poller(&self, timeout_ms: Option<u64>) -> Poller<C> {
        let config = match timeout_ms {
            Some(ms) => self.settings.poll.with_timeout(ms),
            None => self.settings.poll,
        };
        Poller::with_clock(config, self.clock.clone())
    }

    fn retry_action<F>(&self, action: &'static str, mut run: F) -> Result<(), StepError>
    where
        F: FnMut() -> Result<(), DriverError>,
    {
        retry_with_backoff_if(&self.settings.retry, &self.clock, |_| run(), DriverError::is_transient)
            .map_err(|failure| StepError::Action {
                action,
                attempts: failure.attempts,
                last_error: failure.last_error,
            })
    }

    /// Wait for the first visible selector of `any_of`.
    fn resolve_target<D>(
        &self,
        action: &'static str,
        any_of: &[Selector],
        driver: &mut D,
    ) -> Result<Selector, StepError>
    where
        D: PageDriver + ?Sized,
    {
        let chain = FallbackChain::visible_any(any_of, self.settings.probe_timeout_ms);
        let mut matched = None;

        let outcome = self.poller(None).poll(|| {
            let outcome = chain.evaluate(&mut *driver);
            matched = outcome.matched_index;
            outcome.result
        })?;

        match (outcome, matched.and_then(|i| any_of.get(i))) {
            (PollOutcome::Success { .. }, Some(selector)) => Ok(selector.clone()),
            (outcome, _) => Err(StepError::TargetNotFound {
                action,
                reason: format!(
                    "tried {} selectors {:?}, none visible within {}ms",
                    any_of.len(),
                    describe_all(&chain),
                    outcome.elapsed_ms()
                ),
            }),
        }
    }

    // ========================================================================
    // Expectations
    // ========================================================================

    fn evaluate<D>(&self, expectation: &Expectation, driver: &mut D) -> Evaluation
    where
        D: PageDriver + ?Sized,
    {
        let poller = self.poller(expectation.timeout_ms());
        let probe_timeout = self.settings.probe_timeout_ms;

        match expectation {
            Expectation::Visible { any_of, .. } => {
                let chain = FallbackChain::visible_any(any_of, probe_timeout);
                self.evaluate_chain(&chain, "visible", &poller, driver)
            }

            Expectation::Hidden { any_of, .. } => {
                let chain = FallbackChain::visible_any(any_of, probe_timeout);
                self.evaluate_hidden(&chain, &poller, driver)
            }

            Expectation::ElementText { any_of, rule, .. } => {
                let chain = any_of.iter().fold(FallbackChain::new(), |chain, selector| {
                    chain.then_probe(
                        ProbeSpec::text(selector.clone())
                            .with_predicate(rule.clone())
                            .with_timeout(probe_timeout),
                    )
                });
                self.evaluate_chain(&chain, "with matching text", &poller, driver)
            }

            Expectation::CountAtLeast {
                any_of,
                expected,
                read,
                ..
            } => {
                let outcome = poller.poll_at_least(|| read_count(&mut *driver, any_of, *read), *expected);
                count_evaluation(outcome, any_of, *expected, assert_at_least)
            }

            Expectation::CountExactly {
                any_of,
                expected,
                read,
                ..
            } => {
                let outcome = poller.poll_exactly(|| read_count(&mut *driver, any_of, *read), *expected);
                count_evaluation(outcome, any_of, *expected, assert_exact)
            }

            Expectation::Heuristic { rule, .. } => match rules::by_name(rule) {
                Some(heuristic) => self.evaluate_heuristic(&heuristic, &poller, driver),
                None => Evaluation {
                    message: Some(format!("unknown heuristic rule '{}'", rule)),
                    ..Evaluation::default()
                },
            },

            Expectation::PageText { rules, .. } => {
                let heuristic = ContentHeuristic::new("page_text", rules.clone());
                self.evaluate_heuristic(&heuristic, &poller, driver)
            }

            Expectation::UrlContains { expected, .. } => {
                let outcome = poller.poll_until(
                    || ProbeResult::from_read(driver.current_url().map(Some)),
                    |url: &String| url.contains(expected.as_str()),
                );
                match outcome {
                    Ok(PollOutcome::Success {
                        value,
                        elapsed_ms,
                        attempts,
                    }) => Evaluation {
                        passed: true,
                        actual: Some(value),
                        elapsed_ms,
                        attempts,
                        ..Evaluation::default()
                    },
                    Ok(PollOutcome::TimedOut {
                        elapsed_ms,
                        attempts,
                        last_result,
                    }) => Evaluation {
                        actual: last_result.found(),
                        message: Some(format!(
                            "URL does not contain '{}' after {}ms",
                            expected, elapsed_ms
                        )),
                        elapsed_ms,
                        attempts,
                        ..Evaluation::default()
                    },
                    Err(fault) => Evaluation::from_fault(fault),
                }
            }
        }
    }

    fn evaluate_chain<D>(
        &self,
        chain: &FallbackChain,
        condition: &str,
        poller: &Poller<C>,
        driver: &mut D,
    ) -> Evaluation
    where
        D: PageDriver + ?Sized,
    {
        let mut matched = None;
        let outcome = poller.poll(|| {
            let outcome = chain.evaluate(&mut *driver);
            matched = outcome.matched().map(str::to_string);
            outcome.result
        });

        match outcome {
            Ok(PollOutcome::Success {
                value,
                elapsed_ms,
                attempts,
            }) => Evaluation {
                passed: true,
                actual: Some(value),
                matched,
                elapsed_ms,
                attempts,
                ..Evaluation::default()
            },
            Ok(PollOutcome::TimedOut {
                elapsed_ms,
                attempts,
                ..
            }) => Evaluation {
                message: Some(format!(
                    "tried {} selectors {:?}, none {} within {}ms ({} attempts)",
                    chain.len(),
                    describe_all(chain),
                    condition,
                    elapsed_ms,
                    attempts
                )),
                elapsed_ms,
                attempts,
                ..Evaluation::default()
            },
            Err(fault) => Evaluation::from_fault(fault),
        }
    }

    fn evaluate_hidden<D>(&self, chain: &FallbackChain, poller: &Poller<C>, driver: &mut D) -> Evaluation
    where
        D: PageDriver + ?Sized,
    {
        let mut still_visible = None;
        let outcome = poller.poll_absent(|| {
            let outcome = chain.evaluate(&mut *driver);
            still_visible = outcome.matched().map(str::to_string);
            outcome.result
        });

        match outcome {
            Ok(PollOutcome::Success {
                elapsed_ms,
                attempts,
                ..
            }) => Evaluation {
                passed: true,
                elapsed_ms,
                attempts,
                ..Evaluation::default()
            },
            Ok(PollOutcome::TimedOut {
                elapsed_ms,
                attempts,
                ..
            }) => Evaluation {
                actual: still_visible.clone(),
                message: Some(format!(
                    "{} still visible after {}ms ({} attempts)",
                    still_visible.as_deref().unwrap_or("element"),
                    elapsed_ms,
                    attempts
                )),
                elapsed_ms,
                attempts,
                ..Evaluation::default()
            },
            Err(fault) => Evaluation::from_fault(fault),
        }
    }

    fn evaluate_heuristic<D>(
        &self,
        heuristic: &ContentHeuristic,
        poller: &Poller<C>,
        driver: &mut D,
    ) -> Evaluation
    where
        D: PageDriver + ?Sized,
    {
        let mut last_verdict: Option<HeuristicVerdict> = None;
        let mut last_text: Option<String> = None;

        let outcome = poller.poll(|| match driver.body_text() {
            Ok(text) => {
                let verdict = heuristic.explain(&text);
                let holds = verdict.holds;
                last_verdict = Some(verdict);
                last_text = Some(text);
                if holds {
                    ProbeResult::Found(())
                } else {
                    ProbeResult::NotFound
                }
            }
            Err(e) => ProbeResult::from_read(Err(e)),
        });

        let actual = last_text
            .as_ref()
            .map(|text| format!("(page text, {} chars)", text.chars().count()));
        let fingerprint = last_text.as_deref().map(text_fingerprint);

        match outcome {
            Ok(PollOutcome::Success {
                elapsed_ms,
                attempts,
                ..
            }) => Evaluation {
                passed: true,
                actual,
                matched: Some(format!("page text: {}", heuristic.name)),
                elapsed_ms,
                attempts,
                fingerprint,
                ..Evaluation::default()
            },
            Ok(PollOutcome::TimedOut {
                elapsed_ms,
                attempts,
                ..
            }) => Evaluation {
                actual,
                message: Some(format!(
                    "{} within {}ms ({} attempts)",
                    last_verdict
                        .map(|v| v.reason())
                        .unwrap_or_else(|| format!("{} was never evaluated", heuristic.name)),
                    elapsed_ms,
                    attempts
                )),
                elapsed_ms,
                attempts,
                fingerprint,
                ..Evaluation::default()
            },
            Err(fault) => Evaluation {
                fingerprint,
                ..Evaluation::from_fault(fault)
            },
        }
    }
}

/// Read a count through the selectors in order.
///
/// Element counts take the first selector matching anything; badge counts take
/// the first selector whose text holds a number. Either falls back to zero, so
/// an emptied list or a badge that went away reads as `Found(0)`.
fn read_count<D>(driver: &mut D, any_of: &[Selector], read: CountSource) -> ProbeResult<u32>
where
    D: PageDriver + ?Sized,
{
    let (_, result) = match read {
        CountSource::Elements => first_found(
            any_of
                .iter()
                .map(|selector| probe_count(&mut *driver, selector).filter(|n| *n > 0)),
        ),
        CountSource::Text => {
            first_found(any_of.iter().map(|selector| probe_counter_text(&mut *driver, selector)))
        }
    };
    match result {
        ProbeResult::NotFound => ProbeResult::Found(0),
        other => other,
    }
}

fn count_evaluation(
    outcome: Result<PollOutcome<u32>, ProbeFault>,
    any_of: &[Selector],
    expected: u32,
    compare: fn(u32, u32) -> Result<(), String>,
) -> Evaluation {
    match outcome {
        Ok(PollOutcome::Success {
            value,
            elapsed_ms,
            attempts,
        }) => Evaluation {
            passed: true,
            actual: Some(value.to_string()),
            elapsed_ms,
            attempts,
            ..Evaluation::default()
        },
        Ok(PollOutcome::TimedOut {
            elapsed_ms,
            attempts,
            last_result,
        }) => {
            let selectors: Vec<String> = any_of.iter().map(|s| s.to_string()).collect();
            let message = match last_result.as_ref().found() {
                Some(actual) => format!(
                    "{} for {:?} after {}ms ({} attempts)",
                    compare(*actual, expected).err().unwrap_or_default(),
                    selectors,
                    elapsed_ms,
                    attempts
                ),
                None => format!(
                    "no count found for {:?} within {}ms ({} attempts)",
                    selectors, elapsed_ms, attempts
                ),
            };
            Evaluation {
                actual: last_result.found().map(|n| n.to_string()),
                message: Some(message),
                elapsed_ms,
                attempts,
                ..Evaluation::default()
            }
        }
        Err(fault) => Evaluation::from_fault(fault),
    }
}
