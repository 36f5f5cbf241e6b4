//! Boolean analysis of policies.
//!
//! A policy is an OR of clauses and each clause is an AND of statements.
//! Every distinct [`StatementIdentity`] is one boolean variable; negation
//! applies to the variable, it does not introduce a new one.
//!
//! [`FalsifiabilityRule`] enumerates every assignment of those variables, so
//! its cost doubles with each distinct statement. Nothing here bounds the
//! search; callers that need latency guarantees should limit how many
//! distinct statements a policy may contain before validating it.

use blueprint_core::identity::{clause_identity, LiteralIdentity, StatementIdentity};
use blueprint_core::visitor::walk_clause;
use blueprint_core::{
    Node, Policy, PolicyClause, PolicyReport, PolicyRule, PolicyRuleset, PolicyVisitor,
    RuleSeverity,
};
use tracing::debug;

/// Name of the logic ruleset.
pub const LOGIC_RULESET: &str = "Logic Ruleset";

/// Creates the logic ruleset.
#[must_use]
pub fn logic_ruleset(stop_on_first_failure: bool) -> PolicyRuleset {
    PolicyRuleset::sealed(
        LOGIC_RULESET,
        stop_on_first_failure,
        vec![Box::new(FalsifiabilityRule), Box::new(SatisfiabilityRule)],
    )
}

/// Flags policies that allow every input.
#[derive(Debug, Clone, Copy, Default)]
pub struct FalsifiabilityRule;

impl FalsifiabilityRule {
    /// Returns true if some clause holds under every assignment.
    #[must_use]
    pub fn is_tautology(clauses: &[Vec<LiteralIdentity>]) -> bool {
        let mut variables: Vec<&StatementIdentity> = Vec::new();
        for literal in clauses.iter().flatten() {
            if !variables.contains(&&literal.statement) {
                variables.push(&literal.statement);
            }
        }
        let clauses: Vec<Vec<(usize, bool)>> = clauses
            .iter()
            .map(|clause| {
                clause
                    .iter()
                    .filter_map(|literal| {
                        variables
                            .iter()
                            .position(|v| **v == literal.statement)
                            .map(|index| (index, literal.negated))
                    })
                    .collect()
            })
            .collect();

        debug!(
            variables = variables.len(),
            clauses = clauses.len(),
            "Searching for a falsifying assignment"
        );

        let mut assignment = vec![false; variables.len()];
        loop {
            let satisfied = clauses.iter().any(|clause| {
                clause
                    .iter()
                    .all(|&(index, negated)| assignment[index] != negated)
            });
            if !satisfied {
                return false;
            }
            if !increment(&mut assignment) {
                return true;
            }
        }
    }
}

/// Advances a little-endian bit counter. Returns false once it wraps.
fn increment(bits: &mut [bool]) -> bool {
    for bit in bits.iter_mut() {
        if *bit {
            *bit = false;
        } else {
            *bit = true;
            return true;
        }
    }
    false
}

impl PolicyVisitor for FalsifiabilityRule {
    fn visit_policy(&self, node: &Node<'_, Policy>, report: &mut PolicyReport) {
        let clauses: Vec<Vec<LiteralIdentity>> = node
            .clauses
            .iter()
            .map(|clause| clause_identity(node.catalog(), clause))
            .collect();
        if Self::is_tautology(&clauses) {
            report.add_violation(
                self,
                node.location(),
                "This policy is unsatisfiable because at least one clause can be true for every given input",
            );
        }
    }
}

impl PolicyRule for FalsifiabilityRule {
    fn name(&self) -> &'static str {
        "Falsifiability Rule"
    }

    fn severity(&self) -> RuleSeverity {
        RuleSeverity::Error
    }
}

/// Flags clauses containing a statement and its negation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SatisfiabilityRule;

impl PolicyVisitor for SatisfiabilityRule {
    fn visit_clause(&self, node: &Node<'_, PolicyClause>, report: &mut PolicyReport) {
        let literals = clause_identity(node.catalog(), node.value());
        for (i, first) in literals.iter().enumerate() {
            for (j, second) in literals.iter().enumerate().skip(i + 1) {
                if first.is_complement_of(second) {
                    let location = node.location();
                    report.add_violation(
                        self,
                        location,
                        format!(
                            "This clause is unsatisfiable. The statements at '{}' and '{}' are equivalent but one of them is negated",
                            location.indexed_child("statements", i),
                            location.indexed_child("statements", j)
                        ),
                    );
                }
            }
        }
        walk_clause(self, node, report);
    }
}

impl PolicyRule for SatisfiabilityRule {
    fn name(&self) -> &'static str {
        "Satisfiability Rule"
    }

    fn severity(&self) -> RuleSeverity {
        RuleSeverity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueprint_core::{ConfiguredStatement, PolicyTree};
    use blueprint_test::fixtures::PolicyFixture;

    /// Builds a policy over `Base Statement` where each literal is
    /// `(variable, negated)` and variables differ by their `value` argument.
    fn policy(fixture: &mut PolicyFixture, clauses: &[&[(&str, bool)]]) -> PolicyTree {
        fixture.policy.clauses = clauses
            .iter()
            .map(|literals| PolicyClause {
                statements: literals
                    .iter()
                    .map(|(variable, negated)| {
                        ConfiguredStatement::new(fixture.base_statement)
                            .with_negated(*negated)
                            .with_argument_value("foo, bar")
                            .with_argument_value(*variable)
                    })
                    .collect(),
            })
            .collect();
        fixture.clone().into_tree()
    }

    fn apply(rule: &dyn PolicyRule, tree: &PolicyTree) -> PolicyReport {
        let mut report = PolicyReport::new();
        rule.apply(tree, &mut report);
        report
    }

    #[test]
    fn test_increment_counts_through_every_assignment() {
        let mut bits = vec![false; 3];
        let mut seen = vec![bits.clone()];
        while increment(&mut bits) {
            seen.push(bits.clone());
        }
        assert_eq!(seen.len(), 8);
        assert_eq!(seen[1], vec![true, false, false]);
        assert_eq!(seen[2], vec![false, true, false]);
        assert_eq!(bits, vec![false, false, false]);
    }

    #[test]
    fn test_statement_and_negation_is_tautology() {
        let mut fixture = PolicyFixture::valid();
        let tree = policy(&mut fixture, &[&[("a", false)], &[("a", true)]]);
        let report = apply(&FalsifiabilityRule, &tree);
        assert_eq!(report.violations().len(), 1);
        assert_eq!(report.violations()[0].location, "policy");
        assert!(report.violations()[0]
            .message
            .contains("at least one clause can be true for every given input"));
    }

    #[test]
    fn test_exclusive_clauses_are_falsifiable() {
        let mut fixture = PolicyFixture::valid();
        let tree = policy(
            &mut fixture,
            &[&[("a", false), ("b", true)], &[("a", true), ("b", false)]],
        );
        assert!(apply(&FalsifiabilityRule, &tree).is_empty());
    }

    #[test]
    fn test_covering_clauses_are_tautology() {
        let mut fixture = PolicyFixture::valid();
        let tree = policy(
            &mut fixture,
            &[
                &[("a", false), ("b", true)],
                &[("a", true), ("c", false)],
                &[("b", false), ("c", true)],
                &[("a", false), ("b", false)],
                &[("b", true), ("c", true)],
            ],
        );
        assert_eq!(apply(&FalsifiabilityRule, &tree).violations().len(), 1);
    }

    #[test]
    fn test_valid_policy_is_falsifiable() {
        let tree = PolicyFixture::valid().into_tree();
        let mut report = PolicyReport::new();
        logic_ruleset(false).apply(&tree, &mut report);
        assert!(report.is_empty(), "{:?}", report.violations());
    }

    #[test]
    fn test_complement_in_clause() {
        let mut fixture = PolicyFixture::valid();
        let tree = policy(&mut fixture, &[&[("a", false), ("b", false), ("a", true)]]);
        let report = apply(&SatisfiabilityRule, &tree);
        assert_eq!(report.violations().len(), 1);
        assert_eq!(report.violations()[0].location, "clauses[0]");
        assert_eq!(
            report.violations()[0].message,
            "This clause is unsatisfiable. The statements at 'clauses[0].statements[0]' and 'clauses[0].statements[2]' are equivalent but one of them is negated"
        );
    }

    #[test]
    fn test_different_arguments_are_not_complements() {
        let mut fixture = PolicyFixture::valid();
        let tree = policy(&mut fixture, &[&[("a", false), ("b", true)]]);
        assert!(apply(&SatisfiabilityRule, &tree).is_empty());
    }

    #[test]
    fn test_reordered_array_items_are_complements() {
        let mut fixture = PolicyFixture::valid();
        let base = fixture.base_statement;
        fixture.policy.clauses = vec![PolicyClause::new()
            .with_statement(
                ConfiguredStatement::new(base)
                    .with_argument_value("foo, bar")
                    .with_argument_value("a"),
            )
            .with_statement(
                ConfiguredStatement::new(base)
                    .with_negated(true)
                    .with_argument_value("bar, foo")
                    .with_argument_value("a"),
            )];
        let report = apply(&SatisfiabilityRule, &fixture.into_tree());
        assert_eq!(report.violations().len(), 1);
    }

    #[test]
    fn test_stop_flag_is_configurable() {
        assert!(logic_ruleset(true).stop_on_first_failure());
        assert!(!logic_ruleset(false).stop_on_first_failure());
        assert_eq!(logic_ruleset(false).rules().len(), 2);
    }
}
