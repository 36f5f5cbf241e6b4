//! Accumulated results of applying rules to a tree.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::rule::PolicyRule;

/// Severity of a rule violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    /// Informational, never blocks.
    Info,
    /// Likely mistake.
    Warn,
    /// The node is invalid.
    Error,
}

impl RuleSeverity {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for RuleSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rule violation at a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleViolation {
    /// Name of the rule that produced the violation.
    pub rule: String,
    /// Severity of the rule.
    pub severity: RuleSeverity,
    /// Location of the offending node or field.
    pub location: String,
    /// Human-readable message.
    pub message: String,
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {} ({})", self.severity, self.location, self.message, self.rule)
    }
}

/// A structural problem that prevented a rule from inspecting a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyBuilderError {
    /// Location of the node.
    pub location: String,
    /// Human-readable message.
    pub message: String,
}

impl fmt::Display for PolicyBuilderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Violations and errors collected while validating a tree.
///
/// Violations are kept in insertion order and indexed by location.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PolicyReport {
    violations: Vec<RuleViolation>,
    errors: Vec<PolicyBuilderError>,
    #[serde(skip)]
    by_location: HashMap<String, Vec<usize>>,
}

impl PolicyReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a violation of `rule` at `location`.
    pub fn add_violation<R>(&mut self, rule: &R, location: impl Into<String>, message: impl Into<String>)
    where
        R: PolicyRule + ?Sized,
    {
        let location = location.into();
        self.by_location
            .entry(location.clone())
            .or_default()
            .push(self.violations.len());
        self.violations.push(RuleViolation {
            rule: rule.name().to_string(),
            severity: rule.severity(),
            location,
            message: message.into(),
        });
    }

    /// Records a structural error at `location`.
    pub fn add_error(&mut self, location: impl Into<String>, message: impl Into<String>) {
        self.errors.push(PolicyBuilderError {
            location: location.into(),
            message: message.into(),
        });
    }

    /// Returns all violations in insertion order.
    #[must_use]
    pub fn violations(&self) -> &[RuleViolation] {
        &self.violations
    }

    /// Returns the violations recorded at `location`.
    #[must_use]
    pub fn violations_at(&self, location: &str) -> Vec<&RuleViolation> {
        self.by_location
            .get(location)
            .map(|indices| indices.iter().map(|&i| &self.violations[i]).collect())
            .unwrap_or_default()
    }

    /// Returns all errors in encounter order.
    #[must_use]
    pub fn errors(&self) -> &[PolicyBuilderError] {
        &self.errors
    }

    /// Returns true if any violation is more severe than [`RuleSeverity::Info`].
    #[must_use]
    pub fn has_violations(&self) -> bool {
        self.has_violations_at_least(RuleSeverity::Warn)
    }

    /// Returns true if any violation has at least the given severity.
    #[must_use]
    pub fn has_violations_at_least(&self, severity: RuleSeverity) -> bool {
        self.violations.iter().any(|v| v.severity >= severity)
    }

    /// Returns true if a violation more severe than [`RuleSeverity::Info`]
    /// was recorded at `location`.
    #[must_use]
    pub fn has_violations_at(&self, location: &str) -> bool {
        self.violations_at(location)
            .iter()
            .any(|v| v.severity > RuleSeverity::Info)
    }

    /// Returns true if any structural error was recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns true if nothing at all was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty() && self.errors.is_empty()
    }

    /// Returns the number of violations with the given severity.
    #[must_use]
    pub fn count(&self, severity: RuleSeverity) -> usize {
        self.violations.iter().filter(|v| v.severity == severity).count()
    }

    /// Returns true if compilation should not proceed.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        self.has_violations() || self.has_errors()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visitor::PolicyVisitor;

    struct TestRule(RuleSeverity);

    impl PolicyVisitor for TestRule {}

    impl PolicyRule for TestRule {
        fn name(&self) -> &'static str {
            "Test Rule"
        }

        fn severity(&self) -> RuleSeverity {
            self.0
        }
    }

    #[test]
    fn test_info_never_counts_as_violation() {
        let mut report = PolicyReport::new();
        report.add_violation(&TestRule(RuleSeverity::Info), "clauses[1]", "duplicate");
        assert!(!report.has_violations());
        assert!(!report.has_violations_at("clauses[1]"));
        assert_eq!(report.violations_at("clauses[1]").len(), 1);
        assert!(!report.is_blocking());
    }

    #[test]
    fn test_violations_bucketed_by_location() {
        let mut report = PolicyReport::new();
        let rule = TestRule(RuleSeverity::Error);
        report.add_violation(&rule, "policy.clauses", "first");
        report.add_violation(&rule, "clauses[0]", "other");
        report.add_violation(&rule, "policy.clauses", "second");
        let messages: Vec<_> = report
            .violations_at("policy.clauses")
            .iter()
            .map(|v| v.message.as_str())
            .collect();
        assert_eq!(messages, vec!["first", "second"]);
        assert_eq!(report.violations().len(), 3);
        assert_eq!(report.count(RuleSeverity::Error), 3);
        assert!(report.violations_at("clauses[9]").is_empty());
    }

    #[test]
    fn test_errors_block() {
        let mut report = PolicyReport::new();
        report.add_error("clauses[0].statements[0]", "unresolved base statement");
        assert!(report.has_errors());
        assert!(!report.has_violations());
        assert!(report.is_blocking());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(RuleSeverity::Info < RuleSeverity::Warn);
        assert!(RuleSeverity::Warn < RuleSeverity::Error);
        let mut report = PolicyReport::new();
        report.add_violation(&TestRule(RuleSeverity::Warn), "policy", "mismatch");
        assert!(report.has_violations_at_least(RuleSeverity::Warn));
        assert!(!report.has_violations_at_least(RuleSeverity::Error));
    }

    #[test]
    fn test_serializes_without_index() {
        let mut report = PolicyReport::new();
        report.add_violation(&TestRule(RuleSeverity::Warn), "policy", "mismatch");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["violations"][0]["severity"], "warn");
        assert!(json.get("by_location").is_none());
    }
}
