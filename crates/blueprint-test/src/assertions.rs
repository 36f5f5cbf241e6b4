//! Assertion helpers for [`PolicyReport`]s.

use blueprint_core::PolicyReport;

fn describe(report: &PolicyReport) -> String {
    report
        .violations()
        .iter()
        .map(|v| format!("  - {v}"))
        .chain(report.errors().iter().map(|e| format!("  - error: {e}")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Asserts that a report has no violations or errors of any severity.
///
/// # Panics
///
/// Panics with every recorded finding if the report is not empty.
#[track_caller]
pub fn assert_no_violations(report: &PolicyReport) {
    assert!(
        report.is_empty(),
        "Expected an empty report, found:\n{}",
        describe(report)
    );
}

/// Asserts that a violation with `message` was recorded at `location`.
///
/// # Panics
///
/// Panics if no violation at `location` has that message.
#[track_caller]
pub fn assert_violation(report: &PolicyReport, location: &str, message: &str) {
    let found = report
        .violations_at(location)
        .iter()
        .any(|v| v.message == message);
    assert!(
        found,
        "Expected violation at '{location}': {message}\nfound:\n{}",
        describe(report)
    );
}

/// Asserts that `rule` recorded exactly `count` violations.
///
/// # Panics
///
/// Panics if the count differs.
#[track_caller]
pub fn assert_rule_violations(report: &PolicyReport, rule: &str, count: usize) {
    let actual = report.violations().iter().filter(|v| v.rule == rule).count();
    assert_eq!(
        actual,
        count,
        "Expected {count} violations from '{rule}', found {actual}:\n{}",
        describe(report)
    );
}

/// Asserts that a report would block compilation.
///
/// # Panics
///
/// Panics if the report only holds informational findings.
#[track_caller]
pub fn assert_blocking(report: &PolicyReport) {
    assert!(
        report.is_blocking(),
        "Expected a blocking report, found:\n{}",
        describe(report)
    );
}
