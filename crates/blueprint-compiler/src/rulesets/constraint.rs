//! Structural rules applied before anything else.
//!
//! The constraint ruleset stops on the first failing rule: later rules and
//! rulesets assume fields are present and references resolve.

use std::collections::{BTreeSet, HashSet};

use blueprint_core::visitor::{
    walk_base_statement, walk_clause, walk_function, walk_policy, walk_statement,
};
use blueprint_core::{
    ArgumentType, BaseStatement, BaseStatementArgument, BaseStatementFunction, ConfiguredStatement,
    FunctionId, Location, Node, Parent, Policy, PolicyClause, PolicyReport, PolicyRule,
    PolicyRuleset, PolicyVisitor, RuleSeverity, Validate,
};

/// Name of the constraint ruleset.
pub const CONSTRAINT_RULESET: &str = "Constraint Ruleset";

/// Creates the constraint ruleset.
#[must_use]
pub fn constraint_ruleset() -> PolicyRuleset {
    PolicyRuleset::sealed(
        CONSTRAINT_RULESET,
        true,
        vec![
            Box::new(ConstraintValidationRule),
            Box::new(ArgumentsConfigurationRule),
            Box::new(CyclicDependenciesRule),
        ],
    )
}

/// Checks the declarative field constraints of every node.
///
/// References that do not resolve in the catalog are recorded as report
/// errors rather than violations.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintValidationRule;

impl ConstraintValidationRule {
    fn check<T: Validate>(&self, value: &T, location: &Location, report: &mut PolicyReport) {
        if let Err(errors) = value.validate() {
            for error in errors {
                report.add_violation(self, location.field(&error.field), error.message);
            }
        }
    }
}

impl PolicyVisitor for ConstraintValidationRule {
    fn visit_policy(&self, node: &Node<'_, Policy>, report: &mut PolicyReport) {
        self.check(node.value(), node.location(), report);
        walk_policy(self, node, report);
    }

    fn visit_clause(&self, node: &Node<'_, PolicyClause>, report: &mut PolicyReport) {
        self.check(node.value(), node.location(), report);
        walk_clause(self, node, report);
    }

    fn visit_statement(&self, node: &Node<'_, ConfiguredStatement>, report: &mut PolicyReport) {
        self.check(node.value(), node.location(), report);
        if let Some(id) = node.base_statement {
            match node.catalog().base_statement(id) {
                None => report.add_error(
                    node.location(),
                    format!("The referenced base statement {id} does not exist"),
                ),
                Some(base) if node.negated && !base.negation_allowed => report.add_violation(
                    self,
                    node.field("negated"),
                    format!("The base statement '{}' cannot be negated", base.name),
                ),
                Some(_) => {}
            }
        }
        walk_statement(self, node, report);
    }

    fn visit_base_statement(&self, node: &Node<'_, BaseStatement>, report: &mut PolicyReport) {
        self.check(node.value(), node.location(), report);
        if let Some(id) = node.function {
            if node.catalog().function(id).is_none() {
                report.add_error(
                    node.location(),
                    format!("The evaluated function {id} does not exist"),
                );
            }
        }
        walk_base_statement(self, node, report);
    }

    fn visit_function(&self, node: &Node<'_, BaseStatementFunction>, report: &mut PolicyReport) {
        self.check(node.value(), node.location(), report);
        for id in &node.dependencies {
            if node.catalog().function(*id).is_none() {
                report.add_error(
                    node.field("dependencies"),
                    format!("The dependency {id} does not exist"),
                );
            }
        }
        walk_function(self, node, report);
    }

    fn visit_argument(&self, node: &Node<'_, BaseStatementArgument>, report: &mut PolicyReport) {
        self.check(node.value(), node.location(), report);
    }

    fn visit_missing_root(&self, location: &Location, report: &mut PolicyReport) {
        report.add_error(location, "The element to validate does not exist");
    }
}

impl PolicyRule for ConstraintValidationRule {
    fn name(&self) -> &'static str {
        "Constraint Validation Rule"
    }

    fn severity(&self) -> RuleSeverity {
        RuleSeverity::Error
    }
}

/// Checks argument values against their types and argument definitions
/// against their functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgumentsConfigurationRule;

impl ArgumentsConfigurationRule {
    fn check_value(
        &self,
        argument: &BaseStatementArgument,
        value: &str,
        location: String,
        report: &mut PolicyReport,
    ) {
        let Some(argument_type) = argument.argument_type else {
            return;
        };
        if !argument_type.matches_argument(value, argument.unique_items) {
            let unique = if argument.unique_items && argument_type.is_array() {
                " with unique items"
            } else {
                ""
            };
            report.add_violation(
                self,
                location.clone(),
                format!("This argument must be a {}{unique}", lower_name(argument_type)),
            );
        }
        if argument.enum_values.is_empty() {
            return;
        }
        let items: Vec<String> = if argument_type.is_array() {
            match argument_type.array_items(value) {
                Ok(items) => items.iter().map(|item| item.key()).collect(),
                Err(_) => {
                    report.add_violation(
                        self,
                        location,
                        format!(
                            "Cannot get array items of type {} from configured argument {value}",
                            lower_name(argument_type)
                        ),
                    );
                    return;
                }
            }
        } else {
            vec![canonical(argument_type, value)]
        };
        let allowed: HashSet<String> = argument
            .enum_values
            .iter()
            .map(|v| canonical(argument_type.base_type(), v))
            .collect();
        if !items.iter().all(|item| allowed.contains(item)) {
            report.add_violation(
                self,
                location,
                format!(
                    "The argument {value} must match the enumerated values {}",
                    format_set(&argument.enum_values)
                ),
            );
        }
    }
}

impl PolicyVisitor for ArgumentsConfigurationRule {
    fn visit_statement(&self, node: &Node<'_, ConfiguredStatement>, report: &mut PolicyReport) {
        if let Some(base) = node.catalog().statement_base(node.value()) {
            let configured: Vec<&BaseStatementArgument> = base.configured_arguments().collect();
            if configured.len() == node.argument_values.len() {
                for (i, (argument, value)) in configured.iter().zip(&node.argument_values).enumerate() {
                    self.check_value(argument, value, node.field(&format!("argumentValues[{i}]")), report);
                }
            } else {
                report.add_violation(
                    self,
                    node.location(),
                    format!(
                        "The base statement '{}' requires {} arguments but {} arguments were provided",
                        base.name,
                        configured.len(),
                        node.argument_values.len()
                    ),
                );
            }
        }
        walk_statement(self, node, report);
    }

    fn visit_base_statement(&self, node: &Node<'_, BaseStatement>, report: &mut PolicyReport) {
        if let Some(function) = node.catalog().statement_function(node.value()) {
            if node.arguments.len() != function.parameters.len() {
                report.add_violation(
                    self,
                    node.location(),
                    format!(
                        "The number of arguments defined does not match the number of parameters for the function '{}'",
                        function.name
                    ),
                );
            }
        }
        walk_base_statement(self, node, report);
    }

    fn visit_argument(&self, node: &Node<'_, BaseStatementArgument>, report: &mut PolicyReport) {
        if let Some(Parent::BaseStatement(base)) = node.parent() {
            let parameter = node
                .catalog()
                .statement_function(base)
                .and_then(|f| f.parameters.get(node.index()));
            if let Some(parameter) = parameter {
                if &node.parameter != parameter {
                    report.add_violation(
                        self,
                        node.field("parameter"),
                        format!(
                            "The parameter '{}' does not match the function parameter '{parameter}'",
                            node.parameter
                        ),
                    );
                }
            }
        }

        let Some(argument_type) = node.argument_type else {
            return;
        };
        let base_type = argument_type.base_type();
        if !node.enum_values.iter().all(|v| base_type.matches_argument(v, false)) {
            report.add_violation(
                self,
                node.field("enumValues"),
                format!("The enum values do not match the type '{}'", lower_name(base_type)),
            );
        }
        if node.constant {
            if let Some(value) = &node.constant_value {
                self.check_value(node.value(), value, node.field("constantValue"), report);
            }
        }
    }
}

impl PolicyRule for ArgumentsConfigurationRule {
    fn name(&self) -> &'static str {
        "Arguments Configuration Rule"
    }

    fn severity(&self) -> RuleSeverity {
        RuleSeverity::Error
    }
}

/// Detects cycles in the function dependency graph.
///
/// Each direct dependency of a visited function is searched depth first.
/// The first time the search reaches a function already on the current
/// path a single violation is recorded for that dependency.
#[derive(Debug, Clone, Copy, Default)]
pub struct CyclicDependenciesRule;

impl CyclicDependenciesRule {
    fn has_cycle(node: &Node<'_, BaseStatementFunction>, dependency: FunctionId) -> bool {
        let catalog = node.catalog();
        let mut path: Vec<&str> = vec![node.name.as_str()];
        let mut finished: HashSet<&str> = HashSet::new();
        // (function, index of the next dependency to explore)
        let mut stack: Vec<(&BaseStatementFunction, usize)> = Vec::new();
        let Some(start) = catalog.function(dependency) else {
            return false;
        };
        if path.contains(&start.name.as_str()) {
            return true;
        }
        path.push(&start.name);
        stack.push((start, 0));

        while let Some(top) = stack.last_mut() {
            let function = top.0;
            let next = top.1;
            top.1 += 1;
            let Some(id) = function.dependencies.get(next) else {
                finished.insert(function.name.as_str());
                path.pop();
                stack.pop();
                continue;
            };
            let Some(child) = catalog.function(*id) else {
                continue;
            };
            if path.contains(&child.name.as_str()) {
                return true;
            }
            if finished.contains(child.name.as_str()) {
                continue;
            }
            path.push(&child.name);
            stack.push((child, 0));
        }
        false
    }
}

impl PolicyVisitor for CyclicDependenciesRule {
    fn visit_function(&self, node: &Node<'_, BaseStatementFunction>, report: &mut PolicyReport) {
        for id in &node.dependencies {
            if Self::has_cycle(node, *id) {
                let dependency = node
                    .catalog()
                    .function(*id)
                    .map_or_else(String::new, |f| f.name.clone());
                report.add_violation(
                    self,
                    node.location(),
                    format!(
                        "The function '{}' has a cyclic dependency on the function '{dependency}'",
                        node.name
                    ),
                );
            }
        }
        walk_function(self, node, report);
    }
}

impl PolicyRule for CyclicDependenciesRule {
    fn name(&self) -> &'static str {
        "Cyclic Dependencies Rule"
    }

    fn severity(&self) -> RuleSeverity {
        RuleSeverity::Error
    }
}

fn lower_name(argument_type: ArgumentType) -> String {
    argument_type.display_name().to_lowercase()
}

// Comparable form of a scalar value, so "1.0" and "1" are the same number.
fn canonical(argument_type: ArgumentType, value: &str) -> String {
    match argument_type {
        ArgumentType::Number => value
            .trim()
            .parse::<f64>()
            .map_or_else(|_| value.to_string(), |n| n.to_string()),
        ArgumentType::Integer => value
            .trim()
            .parse::<i64>()
            .map_or_else(|_| value.to_string(), |n| n.to_string()),
        _ => value.to_string(),
    }
}

fn format_set(values: &BTreeSet<String>) -> String {
    format!("[{}]", values.iter().cloned().collect::<Vec<_>>().join(", "))
}
