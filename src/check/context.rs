use crate::check::suite::CheckResult;

/// Tracks the execution state and results of a running suite.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    /// Current step index (0-based)
    pub current_step: usize,

    pub check_results: Vec<CheckResult>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: CheckResult) {
        self.check_results.push(result);
    }

    pub fn all_passed(&self) -> bool {
        self.check_results.iter().all(|r| r.passed)
    }

    pub fn fail_count(&self) -> usize {
        self.check_results.iter().filter(|r| !r.passed).count()
    }
}
