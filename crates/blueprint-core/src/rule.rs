//! Rules and rulesets applied to policy trees.
//!
//! A [`PolicyRule`] is a [`PolicyVisitor`] with a name and a severity. Rules
//! hold no state between traversals, so one rule object can validate many
//! trees, including concurrently.

use tracing::debug;

use crate::catalog::PolicyTree;
use crate::error::{Error, Result};
use crate::report::{PolicyReport, RuleSeverity};
use crate::visitor::PolicyVisitor;

/// A named check over a policy tree.
pub trait PolicyRule: PolicyVisitor + Send + Sync {
    /// Returns the rule name.
    fn name(&self) -> &'static str;

    /// Returns the severity of violations produced by the rule.
    fn severity(&self) -> RuleSeverity;

    /// Traverses the whole tree.
    fn apply(&self, tree: &PolicyTree, report: &mut PolicyReport) {
        tree.accept(self, report);
    }
}

/// An ordered group of rules.
pub struct PolicyRuleset {
    name: String,
    rules: Vec<Box<dyn PolicyRule>>,
    stop_on_first_failure: bool,
    sealed: bool,
}

impl PolicyRuleset {
    /// Creates an empty ruleset that callers may add rules to.
    pub fn new(name: impl Into<String>, stop_on_first_failure: bool) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
            stop_on_first_failure,
            sealed: false,
        }
    }

    /// Creates a built-in ruleset with a fixed set of rules.
    pub fn sealed(
        name: impl Into<String>,
        stop_on_first_failure: bool,
        rules: Vec<Box<dyn PolicyRule>>,
    ) -> Self {
        Self {
            name: name.into(),
            rules,
            stop_on_first_failure,
            sealed: true,
        }
    }

    /// Adds a rule.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SealedRuleset`] for built-in rulesets.
    pub fn add_rule(&mut self, rule: Box<dyn PolicyRule>) -> Result<()> {
        if self.sealed {
            return Err(Error::SealedRuleset {
                ruleset: self.name.clone(),
            });
        }
        self.rules.push(rule);
        Ok(())
    }

    /// Returns the ruleset name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the rules in application order.
    #[must_use]
    pub fn rules(&self) -> &[Box<dyn PolicyRule>] {
        &self.rules
    }

    /// Returns true if the remaining rules of this ruleset are skipped once the report blocks.
    #[must_use]
    pub const fn stop_on_first_failure(&self) -> bool {
        self.stop_on_first_failure
    }

    /// Returns true if rules cannot be added.
    #[must_use]
    pub const fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Applies every rule in order.
    ///
    /// When `stop_on_first_failure` is set, the remaining rules are skipped
    /// as soon as the report contains a blocking violation or an error.
    pub fn apply(&self, tree: &PolicyTree, report: &mut PolicyReport) {
        debug!(ruleset = %self.name, rules = self.rules.len(), "Applying ruleset");
        for rule in &self.rules {
            rule.apply(tree, report);
            if self.stop_on_first_failure && report.is_blocking() {
                debug!(ruleset = %self.name, rule = rule.name(), "Stopping after failed rule");
                break;
            }
        }
    }
}

impl std::fmt::Debug for PolicyRuleset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyRuleset")
            .field("name", &self.name)
            .field("rules", &self.rules.iter().map(|r| r.name()).collect::<Vec<_>>())
            .field("stop_on_first_failure", &self.stop_on_first_failure)
            .field("sealed", &self.sealed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::policy::Policy;
    use crate::visitor::Node;

    struct PolicyMarker(RuleSeverity);

    impl PolicyVisitor for PolicyMarker {
        fn visit_policy(&self, node: &Node<'_, Policy>, report: &mut PolicyReport) {
            report.add_violation(self, node.location(), "marked");
        }
    }

    impl PolicyRule for PolicyMarker {
        fn name(&self) -> &'static str {
            "Marker"
        }

        fn severity(&self) -> RuleSeverity {
            self.0
        }
    }

    fn tree() -> PolicyTree {
        PolicyTree::policy(Catalog::new(), Policy::new("System"))
    }

    #[test]
    fn test_stop_on_first_failure() {
        let mut ruleset = PolicyRuleset::new("Stopping", true);
        ruleset.add_rule(Box::new(PolicyMarker(RuleSeverity::Error))).unwrap();
        ruleset.add_rule(Box::new(PolicyMarker(RuleSeverity::Error))).unwrap();
        let mut report = PolicyReport::new();
        ruleset.apply(&tree(), &mut report);
        assert_eq!(report.violations().len(), 1);
    }

    #[test]
    fn test_info_does_not_stop() {
        let mut ruleset = PolicyRuleset::new("Stopping", true);
        ruleset.add_rule(Box::new(PolicyMarker(RuleSeverity::Info))).unwrap();
        ruleset.add_rule(Box::new(PolicyMarker(RuleSeverity::Info))).unwrap();
        let mut report = PolicyReport::new();
        ruleset.apply(&tree(), &mut report);
        assert_eq!(report.violations().len(), 2);
    }

    #[test]
    fn test_runs_all_rules_without_stop() {
        let mut ruleset = PolicyRuleset::new("All", false);
        ruleset.add_rule(Box::new(PolicyMarker(RuleSeverity::Error))).unwrap();
        ruleset.add_rule(Box::new(PolicyMarker(RuleSeverity::Warn))).unwrap();
        let mut report = PolicyReport::new();
        ruleset.apply(&tree(), &mut report);
        assert_eq!(report.violations().len(), 2);
    }

    #[test]
    fn test_sealed_ruleset_rejects_rules() {
        let mut ruleset =
            PolicyRuleset::sealed("Built In", false, vec![Box::new(PolicyMarker(RuleSeverity::Warn))]);
        let err = ruleset
            .add_rule(Box::new(PolicyMarker(RuleSeverity::Warn)))
            .unwrap_err();
        assert!(matches!(err, Error::SealedRuleset { ruleset } if ruleset == "Built In"));
        assert_eq!(ruleset.rules().len(), 1);
        assert!(ruleset.is_sealed());
    }
}
