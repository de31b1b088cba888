use std::time::Instant;

use tracing::{info, warn};

use crate::check::{CheckRunner, CheckSuite, RunSettings};
use crate::cli::config::AppConfig;
use crate::driver::session::BrowserSession;
use crate::heuristic::rules;
use crate::report::console::format_console_report;
use crate::report::junit::generate_junit_xml;
use crate::report::report_model::SuiteReport;
use crate::trace::TraceLogger;

// ============================================================================
// run subcommand
// ============================================================================

/// Options for `run` after CLI flags and config are merged.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub spec_path: String,
    pub format: String,
    pub output: Option<String>,
    pub trace_path: Option<String>,
    pub settings: RunSettings,
}

impl RunOptions {
    /// Resolve run options: CLI > config > defaults.
    pub fn resolve(
        config: &AppConfig,
        spec_path: &str,
        format: Option<&str>,
        output: Option<&str>,
        trace_path: Option<&str>,
        poll_timeout_ms: Option<u64>,
    ) -> Self {
        let mut settings = config.timing.run_settings();
        if let Some(ms) = poll_timeout_ms {
            settings.poll = settings.poll.with_timeout(ms);
        }

        Self {
            spec_path: spec_path.to_string(),
            format: format.unwrap_or(config.run.format.as_str()).to_string(),
            output: output.map(str::to_string).or_else(|| config.run.output.clone()),
            trace_path: trace_path.map(str::to_string).or_else(|| config.trace.path.clone()),
            settings,
        }
    }
}

/// Run check suites and return whether all passed.
pub fn cmd_run(options: &RunOptions, config: &AppConfig) -> Result<bool, Box<dyn std::error::Error>> {
    let suites = load_suites(&options.spec_path)?;

    if suites.is_empty() {
        warn!(path = %options.spec_path, "no check suites found");
        return Ok(true);
    }

    info!(count = suites.len(), "running check suites");

    let mut session = BrowserSession::launch(&config.browser.node, &config.browser.server_script)?;
    let trace = match &options.trace_path {
        Some(path) => TraceLogger::new(path),
        None => TraceLogger::disabled(),
    };
    let runner = CheckRunner::new(options.settings).with_trace(&trace);
    let start = Instant::now();

    let mut results = Vec::new();
    for suite in &suites {
        info!(suite = %suite.name, "running");
        results.push(runner.run(suite, &mut session));
    }

    let duration = start.elapsed().as_millis();
    session.quit()?;

    let report = SuiteReport::from_results(&options.spec_path, results).with_duration(duration);
    let all_passed = report.all_passed();
    let output_content = render_report(&report, &options.format);

    match &options.output {
        Some(path) => std::fs::write(path, &output_content)?,
        None => print!("{}", output_content),
    }

    Ok(all_passed)
}

/// Render a report in the named format. Unknown formats fall back to console.
pub fn render_report(report: &SuiteReport, format: &str) -> String {
    match format {
        "junit" => generate_junit_xml(report),
        "console" => format_console_report(report),
        other => {
            warn!(format = other, "unknown report format, using console");
            format_console_report(report)
        }
    }
}

/// Load check suites from a single YAML file or a directory of YAML files.
pub fn load_suites(path: &str) -> Result<Vec<CheckSuite>, Box<dyn std::error::Error>> {
    let metadata = std::fs::metadata(path)?;
    if metadata.is_dir() {
        let mut suites = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let p = entry?.path();
            if p.extension().is_some_and(|e| e == "yaml" || e == "yml") {
                let content = std::fs::read_to_string(&p)?;
                let suite: CheckSuite = serde_yaml::from_str(&content)
                    .map_err(|e| format!("{}: {}", p.display(), e))?;
                suites.push(suite);
            }
        }
        // Sort by name for deterministic order
        suites.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(suites)
    } else {
        let content = std::fs::read_to_string(path)?;
        let suite: CheckSuite = serde_yaml::from_str(&content)?;
        Ok(vec![suite])
    }
}

// ============================================================================
// eval / rules subcommands
// ============================================================================

/// Judge text with a named heuristic. Prints the verdict and returns whether
/// it holds.
pub fn cmd_eval(
    rule: &str,
    text: Option<&str>,
    file: Option<&str>,
) -> Result<bool, Box<dyn std::error::Error>> {
    let heuristic = rules::by_name(rule).ok_or_else(|| format!("unknown heuristic rule '{}'", rule))?;
    let content = match (text, file) {
        (Some(text), _) => text.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => return Err("one of --text or --file is required".into()),
    };

    let verdict = heuristic.explain(&content);
    println!("{}", verdict.reason());
    Ok(verdict.holds)
}

/// Print the rule catalogue, one heuristic per block.
pub fn cmd_rules() {
    print!("{}", format_rules());
}

pub fn format_rules() -> String {
    let mut out = String::new();
    for heuristic in rules::catalogue() {
        out.push_str(&format!("{}\n", heuristic.name));
        for fact in &heuristic.facts {
            out.push_str(&format!("  - {}\n", fact));
        }
    }
    out
}
