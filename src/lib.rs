//! Resilient probes for storefront UIs.
//!
//! Questions like "is the basket badge at least 1" or "is a price shown" are
//! answered by probing a page through an [`AutomationDriver`], falling back
//! across selectors and page-text heuristics, and polling until the answer
//! settles or a timeout is spent.

pub mod check;
pub mod cli;
pub mod driver;
pub mod heuristic;
pub mod poll;
pub mod probe;
pub mod report;
pub mod trace;

pub use driver::{AutomationDriver, DriverError, PageDriver, Selector};
pub use heuristic::{ContentHeuristic, TextRule};
pub use poll::{PollConfig, PollOutcome, Poller, ProbeFault};
pub use probe::chain::{ChainOutcome, FallbackChain, Recognizer};
pub use probe::{ProbeResult, ProbeSpec};
