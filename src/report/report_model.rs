use serde::{Deserialize, Serialize};

use crate::check::suite::SuiteResult;

/// Aggregated outcome of every suite in one run, consumed by the renderers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Name of the run, usually the suite path given to `run`
    pub run_name: String,

    pub total: usize,
    pub passed: usize,
    pub failed: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,

    pub suites: Vec<SuiteResult>,
}

impl SuiteReport {
    pub fn from_results(run_name: &str, suites: Vec<SuiteResult>) -> Self {
        let total = suites.len();
        let passed = suites.iter().filter(|s| s.passed).count();
        Self {
            run_name: run_name.to_string(),
            total,
            passed,
            failed: total - passed,
            duration_ms: None,
            suites,
        }
    }

    pub fn with_duration(mut self, duration_ms: u128) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}
