use serde::Serialize;
use sha1::{Digest, Sha1};
use std::time::{SystemTime, UNIX_EPOCH};

/// One evaluated expectation, as written to the JSONL probe trace.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeTraceEvent {
    pub timestamp_ms: u128,
    pub suite: String,
    pub step: usize,

    pub check: String,
    pub passed: bool,

    pub elapsed_ms: Option<u64>,
    pub attempts: Option<u32>,

    pub matched: Option<String>,
    pub message: Option<String>,

    /// SHA-1 of the page text a heuristic judged, to spot "page never changed"
    pub page_fingerprint: Option<String>,
}

impl ProbeTraceEvent {
    pub fn now(suite: &str, step: usize, check: impl ToString, passed: bool) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            suite: suite.to_string(),
            step,
            check: check.to_string(),
            passed,
            elapsed_ms: None,
            attempts: None,
            matched: None,
            message: None,
            page_fingerprint: None,
        }
    }

    pub fn with_timing(mut self, elapsed_ms: u64, attempts: u32) -> Self {
        self.elapsed_ms = Some(elapsed_ms);
        self.attempts = Some(attempts);
        self
    }

    pub fn with_matched(mut self, matched: Option<&str>) -> Self {
        self.matched = matched.map(|m| m.to_string());
        self
    }

    pub fn with_message(mut self, message: Option<&str>) -> Self {
        self.message = message.map(|m| m.to_string());
        self
    }

    pub fn with_page_fingerprint(mut self, fingerprint: Option<String>) -> Self {
        self.page_fingerprint = fingerprint;
        self
    }
}

pub fn text_fingerprint(text: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
