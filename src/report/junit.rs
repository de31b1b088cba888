use crate::report::report_model::SuiteReport;

// ============================================================================
// JUnit XML reporter
// ============================================================================

/// One `<testcase>` per suite; failed checks and step errors go into the
/// `<failure>` body so CI shows which selectors were tried and for how long.
pub fn generate_junit_xml(report: &SuiteReport) -> String {
    let time_attr = report
        .duration_ms
        .map(|ms| format!(" time=\"{:.3}\"", ms as f64 / 1000.0))
        .unwrap_or_default();

    let mut cases = String::new();
    for suite in &report.suites {
        let name = escape_xml(&suite.suite_name);

        if suite.passed {
            cases.push_str(&format!(
                "  <testcase name=\"{}\" classname=\"storefront-probe\" />\n",
                name
            ));
            continue;
        }

        let mut lines: Vec<String> = suite
            .check_results
            .iter()
            .filter(|c| !c.passed)
            .map(|c| {
                format!(
                    "Step {}: {}: {}",
                    c.step_index,
                    c.expectation,
                    c.message.as_deref().unwrap_or("check failed")
                )
            })
            .collect();
        let failed_checks = lines.len();

        if let Some(error) = &suite.error {
            lines.push(format!("Error: {}", error));
        }

        let message = if failed_checks > 0 {
            format!("{} check(s) failed", failed_checks)
        } else {
            "execution error".to_string()
        };

        cases.push_str(&format!(
            "  <testcase name=\"{name}\" classname=\"storefront-probe\">\n    <failure message=\"{message}\" type=\"CheckFailure\">{body}</failure>\n  </testcase>\n",
            name = name,
            message = escape_xml(&message),
            body = escape_xml(&lines.join("\n")),
        ));
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<testsuite name=\"{name}\" tests=\"{tests}\" failures=\"{failures}\"{time}>\n{cases}</testsuite>\n",
        name = escape_xml(&report.run_name),
        tests = report.total,
        failures = report.failed,
        time = time_attr,
        cases = cases,
    )
}

pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
