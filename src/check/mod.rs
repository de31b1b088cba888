pub mod context;
pub mod runner;
pub mod suite;

pub use runner::{CheckRunner, RunSettings, StepError};
pub use suite::{CheckResult, CheckStep, CheckSuite, CountSource, Expectation, SuiteResult};
