use crate::report::report_model::SuiteReport;

// ============================================================================
// Console reporter
// ============================================================================

/// Format a report for the terminal.
///
/// ```text
/// === Run: specs/ ===
///
/// ✓ PASS  Search for kegs (4 steps, 3 checks)
/// ✗ FAIL  Add keg to basket (3 steps, 2 checks)
///     [FAIL] Step 2: CountAtLeast count of .basket-count >= 1 — expected at least 1 but found 0 ...
///
/// === Results: 1 passed, 1 failed (2 total) in 12.4s ===
/// ```
pub fn format_console_report(report: &SuiteReport) -> String {
    let mut out = format!("=== Run: {} ===\n\n", report.run_name);

    for suite in &report.suites {
        let marker = if suite.passed {
            "\u{2713} PASS"
        } else {
            "\u{2717} FAIL"
        };

        out.push_str(&format!(
            "{}  {} ({} steps, {} checks)\n",
            marker,
            suite.suite_name,
            suite.steps_run,
            suite.check_results.len()
        ));

        if let Some(error) = &suite.error {
            out.push_str(&format!("    [ERROR] {}\n", error));
        }

        for check in suite.check_results.iter().filter(|c| !c.passed) {
            out.push_str(&format!(
                "    [FAIL] Step {}: {} {} \u{2014} {}\n",
                check.step_index,
                check.expectation.kind(),
                check.expectation,
                check.message.as_deref().unwrap_or("check failed")
            ));
        }
    }

    out.push_str(&format!(
        "\n=== Results: {} passed, {} failed ({} total)",
        report.passed, report.failed, report.total
    ));

    if let Some(ms) = report.duration_ms {
        out.push_str(&format!(" in {:.1}s", ms as f64 / 1000.0));
    }

    out.push_str(" ===\n");
    out
}
