use std::fs;

use clap::Parser;
use storefront_probe::cli::commands::{RunOptions, cmd_eval, format_rules, load_suites, render_report};
use storefront_probe::cli::config::{AppConfig, Cli, Commands, load_config};
use storefront_probe::report::report_model::SuiteReport;

// ============================================================================
// CLI Argument Parsing Tests
// ============================================================================

#[test]
fn cli_parse_run_minimal() {
    let cli = Cli::parse_from(["storefront-probe", "run", "--spec", "checks/"]);
    match cli.command {
        Commands::Run {
            spec,
            format,
            output,
            trace,
            poll_timeout_ms,
        } => {
            assert_eq!(spec, "checks/");
            assert!(format.is_none());
            assert!(output.is_none());
            assert!(trace.is_none());
            assert!(poll_timeout_ms.is_none());
        }
        _ => panic!("Expected Run command"),
    }
    assert_eq!(cli.verbose, 0);
}

#[test]
fn cli_parse_run_all_args() {
    let cli = Cli::parse_from([
        "storefront-probe",
        "run",
        "--spec",
        "checks/basket.yaml",
        "--format",
        "junit",
        "-o",
        "report.xml",
        "--trace",
        "probe_trace.jsonl",
        "--poll-timeout-ms",
        "5000",
        "-vv",
    ]);
    match cli.command {
        Commands::Run {
            spec,
            format,
            output,
            trace,
            poll_timeout_ms,
        } => {
            assert_eq!(spec, "checks/basket.yaml");
            assert_eq!(format.as_deref(), Some("junit"));
            assert_eq!(output.as_deref(), Some("report.xml"));
            assert_eq!(trace.as_deref(), Some("probe_trace.jsonl"));
            assert_eq!(poll_timeout_ms, Some(5000));
        }
        _ => panic!("Expected Run command"),
    }
    assert_eq!(cli.verbose, 2);
}

#[test]
fn cli_parse_eval_and_rules() {
    let cli = Cli::parse_from([
        "storefront-probe",
        "eval",
        "--rule",
        "price_is_displayed",
        "--text",
        "£32.50",
    ]);
    assert!(matches!(cli.command, Commands::Eval { ref rule, .. } if rule == "price_is_displayed"));

    let cli = Cli::parse_from(["storefront-probe", "--config", "alt.yaml", "rules"]);
    assert!(matches!(cli.command, Commands::Rules));
    assert_eq!(cli.config.as_deref(), Some("alt.yaml"));
}

#[test]
fn cli_eval_rejects_text_and_file_together() {
    let result = Cli::try_parse_from([
        "storefront-probe",
        "eval",
        "--rule",
        "price_is_displayed",
        "--text",
        "x",
        "--file",
        "page.txt",
    ]);
    assert!(result.is_err());
}

#[test]
fn cli_run_requires_spec() {
    assert!(Cli::try_parse_from(["storefront-probe", "run"]).is_err());
}

// ============================================================================
// Config Loading Tests
// ============================================================================

#[test]
fn config_defaults() {
    let config = AppConfig::default();
    assert_eq!(config.timing.probe_timeout_ms, 1000);
    assert_eq!(config.timing.poll_interval_ms, 200);
    assert_eq!(config.timing.poll_timeout_ms, 10_000);
    assert_eq!(config.timing.retry_attempts, 3);
    assert_eq!(config.browser.node, "node");
    assert_eq!(config.browser.server_script, "node/browser_server.js");
    assert_eq!(config.run.format, "console");
    assert!(config.trace.path.is_none());
}

#[test]
fn config_missing_file_gives_defaults() {
    let config = load_config(Some("/definitely/not/here/storefront-probe.yaml"));
    assert_eq!(config, AppConfig::default());
}

#[test]
fn config_partial_file_keeps_other_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storefront-probe.yaml");
    fs::write(
        &path,
        "timing:\n  poll_timeout_ms: 5000\nrun:\n  format: junit\ntrace:\n  path: trace.jsonl\n",
    )
    .unwrap();

    let config = load_config(path.to_str());
    assert_eq!(config.timing.poll_timeout_ms, 5000);
    assert_eq!(config.timing.poll_interval_ms, 200);
    assert_eq!(config.run.format, "junit");
    assert_eq!(config.trace.path.as_deref(), Some("trace.jsonl"));
    assert_eq!(config.browser.node, "node");
}

#[test]
fn config_malformed_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storefront-probe.yaml");
    fs::write(&path, "timing: [this is not a map").unwrap();

    assert_eq!(load_config(path.to_str()), AppConfig::default());
}

#[test]
fn timing_becomes_run_settings() {
    let mut config = AppConfig::default();
    config.timing.poll_interval_ms = 0;
    config.timing.retry_attempts = 5;

    let settings = config.timing.run_settings();
    assert_eq!(settings.poll.interval_ms, 1);
    assert_eq!(settings.poll.timeout_ms, 10_000);
    assert_eq!(settings.retry.max_attempts, 5);
    assert_eq!(settings.probe_timeout_ms, 1000);
}

#[test]
fn run_options_prefer_cli_over_config() {
    let mut config = AppConfig::default();
    config.run.format = "junit".into();
    config.run.output = Some("from-config.xml".into());
    config.trace.path = Some("config-trace.jsonl".into());

    let from_config = RunOptions::resolve(&config, "checks/", None, None, None, None);
    assert_eq!(from_config.format, "junit");
    assert_eq!(from_config.output.as_deref(), Some("from-config.xml"));
    assert_eq!(from_config.trace_path.as_deref(), Some("config-trace.jsonl"));
    assert_eq!(from_config.settings.poll.timeout_ms, 10_000);

    let from_cli = RunOptions::resolve(
        &config,
        "checks/",
        Some("console"),
        Some("out.txt"),
        Some("cli-trace.jsonl"),
        Some(3000),
    );
    assert_eq!(from_cli.format, "console");
    assert_eq!(from_cli.output.as_deref(), Some("out.txt"));
    assert_eq!(from_cli.trace_path.as_deref(), Some("cli-trace.jsonl"));
    assert_eq!(from_cli.settings.poll.timeout_ms, 3000);
}

// ============================================================================
// Commands
// ============================================================================

const SUITE_A: &str = "name: B basket\nstart_url: https://shop.test\nsteps: []\n";
const SUITE_B: &str = "name: A search\nstart_url: https://shop.test\nsteps:\n  - action: wait\n    duration_ms: 100\n";

#[test]
fn load_suites_from_directory_sorted_by_name() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("basket.yaml"), SUITE_A).unwrap();
    fs::write(dir.path().join("search.yml"), SUITE_B).unwrap();
    fs::write(dir.path().join("notes.txt"), "not a suite").unwrap();

    let suites = load_suites(dir.path().to_str().unwrap()).unwrap();
    let names: Vec<&str> = suites.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["A search", "B basket"]);
}

#[test]
fn load_suites_from_single_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("basket.yaml");
    fs::write(&path, SUITE_A).unwrap();

    let suites = load_suites(path.to_str().unwrap()).unwrap();
    assert_eq!(suites.len(), 1);
    assert_eq!(suites[0].name, "B basket");
}

#[test]
fn load_suites_reports_bad_yaml_with_path() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("broken.yaml"), "name: [unclosed").unwrap();

    let err = load_suites(dir.path().to_str().unwrap()).unwrap_err();
    assert!(err.to_string().contains("broken.yaml"));
}

#[test]
fn load_suites_missing_path_is_error() {
    assert!(load_suites("/definitely/not/here").is_err());
}

#[test]
fn eval_judges_text_and_files() {
    assert!(cmd_eval("price_is_displayed", Some("Price: £32.50 per keg"), None).unwrap());
    assert!(!cmd_eval("price_is_displayed", Some("Price: TBC"), None).unwrap());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("page.txt");
    fs::write(&path, "Your basket is empty").unwrap();
    assert!(cmd_eval("basket_is_empty", None, path.to_str()).unwrap());
}

#[test]
fn eval_unknown_rule_or_no_input_is_error() {
    assert!(cmd_eval("nope", Some("x"), None).is_err());
    assert!(cmd_eval("price_is_displayed", None, None).is_err());
}

#[test]
fn rules_listing_names_every_heuristic() {
    let listing = format_rules();
    assert!(listing.contains("price_is_displayed\n  - contains any of [\"£\", \"GBP\"]\n"));
    assert!(listing.contains("promo_terms_shown\n"));
    assert!(listing.contains("store_results_shown\n"));
}

#[test]
fn unknown_format_falls_back_to_console() {
    let report = SuiteReport::from_results("r", vec![]);
    assert_eq!(render_report(&report, "html"), render_report(&report, "console"));
    assert!(render_report(&report, "junit").starts_with("<?xml"));
}
