use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    /// Nothing on the page matched the selector
    #[error("element '{selector}' not found")]
    ElementNotFound { selector: String },

    /// The driver's own wait for the selector expired
    #[error("timed out after {timeout_ms}ms waiting for '{selector}'")]
    Timeout { selector: String, timeout_ms: u64 },

    /// Page or browser went away (closed tab, crashed process, navigation teardown)
    #[error("browser session closed: {0}")]
    SessionClosed(String),

    /// Node.js subprocess failed to spawn
    #[error("failed to spawn {script} (is Node.js installed?): {source}")]
    SubprocessSpawn {
        script: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading from or writing to the browser process failed
    #[error("session I/O: {0}")]
    SessionIO(String),

    /// The browser process reported a failure we have no finer class for
    #[error("{command} failed: {error}")]
    SessionProtocol { command: String, error: String },

    #[error("JSON parse error ({context}): {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON serialize error ({context}): {source}")]
    JsonSerialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DriverError {
    /// Absence-class failures: the condition simply does not hold (yet).
    pub fn is_absence(&self) -> bool {
        matches!(
            self,
            DriverError::ElementNotFound { .. } | DriverError::Timeout { .. }
        )
    }

    /// Failures worth another attempt of a mutating action.
    pub fn is_transient(&self) -> bool {
        self.is_absence() || matches!(self, DriverError::SessionProtocol { .. })
    }
}
