//! Rules for how statements, base statements and functions are configured.

use std::collections::HashSet;

use blueprint_core::identity::{clause_identity, LiteralIdentity};
use blueprint_core::visitor::{
    walk_base_statement, walk_clause, walk_function, walk_policy, walk_statement,
};
use blueprint_core::{
    BaseStatement, BaseStatementFunction, ConfiguredStatement, Node, Policy, PolicyClause,
    PolicyElementState, PolicyReport, PolicyRule, PolicyRuleset, PolicyVisitor, RuleSeverity,
};

use super::{
    is_capitalized_words, is_rego_identifier, CAPITALIZED_WORDS_MESSAGE, REGO_IDENTIFIER_MESSAGE,
};

/// Name of the configuration ruleset.
pub const CONFIGURATION_RULESET: &str = "Configuration Ruleset";

/// Creates the configuration ruleset.
#[must_use]
pub fn configuration_ruleset() -> PolicyRuleset {
    PolicyRuleset::sealed(
        CONFIGURATION_RULESET,
        false,
        vec![
            Box::new(DuplicateValueRule),
            Box::new(MatchPolicyTypeRule),
            Box::new(RegexRule),
            Box::new(InvalidStateRule),
        ],
    )
}

/// Flags clauses and statements that repeat an earlier sibling.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicateValueRule;

impl PolicyVisitor for DuplicateValueRule {
    fn visit_policy(&self, node: &Node<'_, Policy>, report: &mut PolicyReport) {
        let mut seen = HashSet::new();
        for (i, clause) in node.clauses.iter().enumerate() {
            if !seen.insert(clause_identity(node.catalog(), clause)) {
                report.add_violation(
                    self,
                    node.location().indexed_child("clauses", i),
                    "This clause is a duplicate and should be removed from the policy",
                );
            }
        }
        walk_policy(self, node, report);
    }

    fn visit_clause(&self, node: &Node<'_, PolicyClause>, report: &mut PolicyReport) {
        let mut seen = HashSet::new();
        for (i, statement) in node.statements.iter().enumerate() {
            if !seen.insert(LiteralIdentity::of(node.catalog(), statement)) {
                report.add_violation(
                    self,
                    node.location().indexed_child("statements", i),
                    "This statement is a duplicate and should be removed from the clause",
                );
            }
        }
        walk_clause(self, node, report);
    }
}

impl PolicyRule for DuplicateValueRule {
    fn name(&self) -> &'static str {
        "Duplicate Value Rule"
    }

    fn severity(&self) -> RuleSeverity {
        RuleSeverity::Info
    }
}

/// Checks that policy types are compatible along the tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchPolicyTypeRule;

impl PolicyVisitor for MatchPolicyTypeRule {
    fn visit_statement(&self, node: &Node<'_, ConfiguredStatement>, report: &mut PolicyReport) {
        let base = node.catalog().statement_base(node.value());
        if let (Some(policy), Some(base)) = (node.policy(), base) {
            if !base.policy_types.contains(&policy.policy_type) {
                report.add_violation(
                    self,
                    node.location(),
                    format!(
                        "The base statement '{}' is not compatible with the policy type '{}'",
                        base.name, policy.policy_type
                    ),
                );
            }
        }
        walk_statement(self, node, report);
    }

    fn visit_base_statement(&self, node: &Node<'_, BaseStatement>, report: &mut PolicyReport) {
        if let Some(function) = node.catalog().statement_function(node.value()) {
            if !node.policy_types.is_subset(&function.policy_types) {
                report.add_violation(
                    self,
                    node.location(),
                    format!(
                        "The function '{}' is not compatible with the policy types '{}'",
                        function.name,
                        join_quoted(node.policy_types.iter().map(String::as_str))
                    ),
                );
            }
        }
        walk_base_statement(self, node, report);
    }

    fn visit_function(&self, node: &Node<'_, BaseStatementFunction>, report: &mut PolicyReport) {
        for dependency in node.catalog().dependencies(node.value()) {
            if !node.policy_types.is_subset(&dependency.policy_types) {
                report.add_violation(
                    self,
                    node.location(),
                    format!(
                        "The dependency '{}' is not compatible with the policy types '{}'",
                        dependency.name,
                        join_quoted(node.policy_types.iter().map(String::as_str))
                    ),
                );
            }
        }
        walk_function(self, node, report);
    }
}

impl PolicyRule for MatchPolicyTypeRule {
    fn name(&self) -> &'static str {
        "Statements Match Policy Type Rule"
    }

    fn severity(&self) -> RuleSeverity {
        RuleSeverity::Warn
    }
}

/// Checks base statement names, function names and parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexRule;

impl PolicyVisitor for RegexRule {
    fn visit_base_statement(&self, node: &Node<'_, BaseStatement>, report: &mut PolicyReport) {
        if !is_capitalized_words(&node.name) {
            report.add_violation(
                self,
                node.location(),
                format!(
                    "The base statement name '{}' is invalid. Base statement names {CAPITALIZED_WORDS_MESSAGE}",
                    node.name
                ),
            );
        }
        walk_base_statement(self, node, report);
    }

    fn visit_function(&self, node: &Node<'_, BaseStatementFunction>, report: &mut PolicyReport) {
        if !is_rego_identifier(&node.name) {
            report.add_violation(
                self,
                node.location(),
                format!(
                    "The base statement function name '{}' is invalid. Function names {REGO_IDENTIFIER_MESSAGE}",
                    node.name
                ),
            );
        }
        let mut invalid: Vec<&str> = Vec::new();
        for parameter in &node.parameters {
            let parameter = parameter.as_str();
            if !parameter.trim().is_empty()
                && !is_rego_identifier(parameter)
                && !invalid.contains(&parameter)
            {
                invalid.push(parameter);
            }
        }
        if !invalid.is_empty() {
            report.add_violation(
                self,
                node.location(),
                format!(
                    "The following parameters for the base statement function '{}' are invalid: '{}' Function parameters {REGO_IDENTIFIER_MESSAGE}",
                    node.name,
                    join_quoted(invalid.into_iter())
                ),
            );
        }
        walk_function(self, node, report);
    }
}

impl PolicyRule for RegexRule {
    fn name(&self) -> &'static str {
        "Regex Rule"
    }

    fn severity(&self) -> RuleSeverity {
        RuleSeverity::Error
    }
}

/// Flags references to elements that are not released.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvalidStateRule;

impl InvalidStateRule {
    fn unreleased(state: Option<PolicyElementState>) -> Option<PolicyElementState> {
        state.filter(|s| !s.is_released())
    }

    fn message(kind: &str, versioned_name: &str, state: PolicyElementState) -> String {
        format!(
            "The {kind} '{versioned_name}' is in the {} state. Please update to a released version or remove",
            state.name().to_lowercase()
        )
    }
}

impl PolicyVisitor for InvalidStateRule {
    fn visit_statement(&self, node: &Node<'_, ConfiguredStatement>, report: &mut PolicyReport) {
        if let Some(base) = node.catalog().statement_base(node.value()) {
            if let Some(state) = Self::unreleased(base.state) {
                report.add_violation(
                    self,
                    node.field("baseStatement"),
                    Self::message("base statement", &base.versioned_name(), state),
                );
            }
        }
        walk_statement(self, node, report);
    }

    fn visit_base_statement(&self, node: &Node<'_, BaseStatement>, report: &mut PolicyReport) {
        if let Some(function) = node.catalog().statement_function(node.value()) {
            if let Some(state) = Self::unreleased(function.state) {
                report.add_violation(
                    self,
                    node.field("function"),
                    Self::message("function", &function.versioned_name(), state),
                );
            }
        }
        walk_base_statement(self, node, report);
    }

    fn visit_function(&self, node: &Node<'_, BaseStatementFunction>, report: &mut PolicyReport) {
        for dependency in node.catalog().dependencies(node.value()) {
            if let Some(state) = Self::unreleased(dependency.state) {
                report.add_violation(
                    self,
                    node.field("dependencies"),
                    Self::message("dependency", &dependency.versioned_name(), state),
                );
            }
        }
        walk_function(self, node, report);
    }
}

impl PolicyRule for InvalidStateRule {
    fn name(&self) -> &'static str {
        "Invalid State Rule"
    }

    fn severity(&self) -> RuleSeverity {
        RuleSeverity::Error
    }
}

fn join_quoted<'a>(values: impl Iterator<Item = &'a str>) -> String {
    values.collect::<Vec<_>>().join("', '")
}
