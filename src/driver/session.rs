use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::driver::{AutomationDriver, DriverError, PageDriver, Selector};

/// Request sent to browser_server.js over stdin (one JSON line).
#[derive(Debug, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum BrowserRequest {
    Navigate {
        url: String,
    },
    Click {
        selector: String,
    },
    Fill {
        selector: String,
        value: String,
    },
    Wait {
        duration_ms: u64,
    },
    CurrentUrl,
    QueryVisible {
        selector: String,
        timeout_ms: u64,
    },
    QueryText {
        selector: String,
    },
    QueryCount {
        selector: String,
    },
    QueryAttribute {
        selector: String,
        name: String,
    },
    BodyText,
    Quit,
}

impl BrowserRequest {
    /// Command name as it appears on the wire, for error messages.
    pub fn command(&self) -> &'static str {
        match self {
            BrowserRequest::Navigate { .. } => "navigate",
            BrowserRequest::Click { .. } => "click",
            BrowserRequest::Fill { .. } => "fill",
            BrowserRequest::Wait { .. } => "wait",
            BrowserRequest::CurrentUrl => "current_url",
            BrowserRequest::QueryVisible { .. } => "query_visible",
            BrowserRequest::QueryText { .. } => "query_text",
            BrowserRequest::QueryCount { .. } => "query_count",
            BrowserRequest::QueryAttribute { .. } => "query_attribute",
            BrowserRequest::BodyText => "body_text",
            BrowserRequest::Quit => "quit",
        }
    }

    fn selector(&self) -> Option<&str> {
        match self {
            BrowserRequest::Click { selector }
            | BrowserRequest::Fill { selector, .. }
            | BrowserRequest::QueryVisible { selector, .. }
            | BrowserRequest::QueryText { selector }
            | BrowserRequest::QueryCount { selector }
            | BrowserRequest::QueryAttribute { selector, .. } => Some(selector),
            _ => None,
        }
    }

    fn timeout_ms(&self) -> u64 {
        match self {
            BrowserRequest::QueryVisible { timeout_ms, .. } => *timeout_ms,
            _ => 0,
        }
    }
}

/// Response received from browser_server.js over stdout (one JSON line).
#[derive(Debug, Deserialize)]
pub struct BrowserResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    /// `not_found`, `timeout` or `closed` when the shim could classify the failure
    #[serde(default)]
    pub error_kind: Option<String>,
    #[serde(default)]
    pub ready: Option<bool>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub value: Option<String>,
}

impl BrowserResponse {
    /// Turn a failed response into the matching `DriverError`.
    pub fn into_error(self, request: &BrowserRequest) -> DriverError {
        let error = self.error.unwrap_or_else(|| "Unknown error".into());
        let selector = request.selector().unwrap_or_default().to_string();

        match self.error_kind.as_deref() {
            Some("not_found") => DriverError::ElementNotFound { selector },
            Some("timeout") => DriverError::Timeout {
                selector,
                timeout_ms: request.timeout_ms(),
            },
            Some("closed") => DriverError::SessionClosed(error),
            _ if error.contains("Target closed") || error.contains("has been closed") => {
                DriverError::SessionClosed(error)
            }
            _ if error.starts_with("TimeoutError") => DriverError::Timeout {
                selector,
                timeout_ms: request.timeout_ms(),
            },
            _ => DriverError::SessionProtocol {
                command: request.command().into(),
                error,
            },
        }
    }
}

/// A persistent browser session backed by browser_server.js.
///
/// Launches a long-lived Node.js process that keeps a Chromium page open.
/// Commands are sent as NDJSON over stdin, responses read from stdout.
pub struct BrowserSession {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    closed: bool,
}

impl BrowserSession {
    /// Spawn `node <script>` and wait for its ready line.
    pub fn launch(node: &str, script: &str) -> Result<Self, DriverError> {
        let mut child = Command::new(node)
            .arg(script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| DriverError::SubprocessSpawn {
                script: script.into(),
                source: e,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| DriverError::SessionIO(format!("Failed to capture stdin of {}", script)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DriverError::SessionIO(format!("Failed to capture stdout of {}", script)))?;

        let mut reader = BufReader::new(stdout);

        let mut line = String::new();
        reader
            .read_line(&mut line)
            .map_err(|e| DriverError::SessionIO(format!("Failed to read ready signal: {}", e)))?;

        let response: BrowserResponse =
            serde_json::from_str(line.trim()).map_err(|e| DriverError::JsonParse {
                context: format!("{} ready signal", script),
                source: e,
            })?;

        if !response.ok || response.ready != Some(true) {
            return Err(DriverError::SessionProtocol {
                command: "launch".into(),
                error: format!("Did not receive ready signal from {}", script),
            });
        }

        debug!(script, "browser session ready");

        Ok(BrowserSession {
            child,
            stdin,
            reader,
            closed: false,
        })
    }

    fn send(&mut self, request: &BrowserRequest) -> Result<BrowserResponse, DriverError> {
        if self.closed {
            return Err(DriverError::SessionClosed("session already quit".into()));
        }

        let json = serde_json::to_string(request).map_err(|e| DriverError::JsonSerialize {
            context: "BrowserRequest".into(),
            source: e,
        })?;

        writeln!(self.stdin, "{}", json)
            .and_then(|_| self.stdin.flush())
            .map_err(|e| DriverError::SessionClosed(format!("write to browser process failed: {}", e)))?;

        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .map_err(|e| DriverError::SessionIO(format!("Failed to read from browser process: {}", e)))?;

        if line.trim().is_empty() {
            return Err(DriverError::SessionClosed(
                "empty response from browser process (it may have exited)".into(),
            ));
        }

        serde_json::from_str(line.trim()).map_err(|e| DriverError::JsonParse {
            context: format!("{} response", request.command()),
            source: e,
        })
    }

    /// Send a request and turn `ok: false` into a classified error.
    fn send_ok(&mut self, request: BrowserRequest) -> Result<BrowserResponse, DriverError> {
        let response = self.send(&request)?;
        if !response.ok {
            return Err(response.into_error(&request));
        }
        Ok(response)
    }

    /// Quit the browser process. Safe to call more than once.
    pub fn quit(&mut self) -> Result<(), DriverError> {
        if self.closed {
            return Ok(());
        }
        if let Err(e) = self.send(&BrowserRequest::Quit) {
            warn!(error = %e, "browser process did not acknowledge quit");
        }
        self.closed = true;
        let _ = self.child.wait();
        Ok(())
    }
}

impl AutomationDriver for BrowserSession {
    fn is_visible(&mut self, selector: &Selector, timeout_ms: u64) -> Result<bool, DriverError> {
        let response = self.send_ok(BrowserRequest::QueryVisible {
            selector: selector.to_string(),
            timeout_ms,
        })?;
        Ok(response.visible.unwrap_or(false))
    }

    fn text_content(&mut self, selector: &Selector) -> Result<Option<String>, DriverError> {
        let response = self.send_ok(BrowserRequest::QueryText {
            selector: selector.to_string(),
        })?;
        Ok(response.text)
    }

    fn count(&mut self, selector: &Selector) -> Result<u32, DriverError> {
        let response = self.send_ok(BrowserRequest::QueryCount {
            selector: selector.to_string(),
        })?;
        Ok(response.count.unwrap_or(0))
    }

    fn get_attribute(
        &mut self,
        selector: &Selector,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        let response = self.send_ok(BrowserRequest::QueryAttribute {
            selector: selector.to_string(),
            name: name.to_string(),
        })?;
        Ok(response.value)
    }

    fn body_text(&mut self) -> Result<String, DriverError> {
        let response = self.send_ok(BrowserRequest::BodyText)?;
        Ok(response.text.unwrap_or_default())
    }
}

impl PageDriver for BrowserSession {
    fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.send_ok(BrowserRequest::Navigate { url: url.to_string() })?;
        Ok(())
    }

    fn click(&mut self, selector: &Selector) -> Result<(), DriverError> {
        self.send_ok(BrowserRequest::Click {
            selector: selector.to_string(),
        })?;
        Ok(())
    }

    fn fill(&mut self, selector: &Selector, value: &str) -> Result<(), DriverError> {
        self.send_ok(BrowserRequest::Fill {
            selector: selector.to_string(),
            value: value.to_string(),
        })?;
        Ok(())
    }

    fn current_url(&mut self) -> Result<String, DriverError> {
        let response = self.send_ok(BrowserRequest::CurrentUrl)?;
        response.url.ok_or_else(|| DriverError::SessionProtocol {
            command: "current_url".into(),
            error: "No URL in current_url response".into(),
        })
    }

    fn wait_idle(&mut self, ms: u64) -> Result<(), DriverError> {
        self.send_ok(BrowserRequest::Wait { duration_ms: ms })?;
        Ok(())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        let _ = self.quit();
    }
}
