use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::check::RunSettings;
use crate::poll::PollConfig;
use crate::poll::retry::RetryPolicy;

pub const DEFAULT_CONFIG_PATH: &str = "storefront-probe.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "storefront-probe",
    version,
    about = "Resilient UI probes and check suites for storefront journeys"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: storefront-probe.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run check suites from YAML files in one browser session
    Run {
        /// Path to a suite YAML file or a directory of them
        #[arg(long)]
        spec: String,

        /// Output format: console, junit (default from config)
        #[arg(long)]
        format: Option<String>,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Append a JSONL probe trace to this file
        #[arg(long)]
        trace: Option<String>,

        /// Override the poll timeout of every check
        #[arg(long)]
        poll_timeout_ms: Option<u64>,
    },

    /// Evaluate a named heuristic against text, without a browser
    Eval {
        /// Heuristic name, see `rules`
        #[arg(long)]
        rule: String,

        /// Text to judge
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,

        /// File whose contents to judge
        #[arg(long)]
        file: Option<String>,
    },

    /// List the named heuristics and their facts
    Rules,
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `storefront-probe.yaml`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub trace: TraceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    pub probe_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub poll_timeout_ms: u64,
    pub retry_attempts: u32,
    pub retry_initial_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: 1_000,
            poll_interval_ms: 200,
            poll_timeout_ms: 10_000,
            retry_attempts: 3,
            retry_initial_delay_ms: 250,
        }
    }
}

impl TimingConfig {
    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            probe_timeout_ms: self.probe_timeout_ms,
            poll: PollConfig::new(self.poll_interval_ms, self.poll_timeout_ms),
            retry: RetryPolicy::new(self.retry_attempts, self.retry_initial_delay_ms),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BrowserConfig {
    /// Node.js executable
    pub node: String,
    /// Playwright shim speaking the NDJSON protocol
    pub server_script: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            node: "node".to_string(),
            server_script: "node/browser_server.js".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    pub format: String,
    pub output: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            format: "console".to_string(),
            output: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct TraceConfig {
    pub path: Option<String>,
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if the file is missing or
/// malformed; a malformed file, or a missing file that was asked for
/// explicitly, is reported as a warning.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    match std::fs::read_to_string(config_path) {
        Ok(content) => match serde_yaml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = config_path, error = %e, "ignoring malformed config file");
                AppConfig::default()
            }
        },
        Err(e) => {
            if path.is_some() {
                warn!(path = config_path, error = %e, "config file not readable, using defaults");
            }
            AppConfig::default()
        }
    }
}
