//! Structural identities of tree nodes.
//!
//! Two nodes are considered the same when their identities are equal, no
//! matter where they live in the catalog. Identities are plain hashable
//! values, so they can be used as set and map keys. Function dependencies
//! contribute only their versioned names, so cyclic graphs never recurse.

use std::collections::BTreeSet;

use crate::argument::ArgumentType;
use crate::catalog::Catalog;
use crate::policy::{ConfiguredStatement, PolicyClause};
use crate::statement::{BaseStatement, BaseStatementArgument, BaseStatementFunction};

/// Structural identity of a function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionIdentity {
    name: String,
    description: String,
    policy_types: BTreeSet<String>,
    parameters: Vec<String>,
    expression: String,
    dependencies: BTreeSet<String>,
}

impl FunctionIdentity {
    /// Computes the identity of a function.
    #[must_use]
    pub fn of(catalog: &Catalog, function: &BaseStatementFunction) -> Self {
        Self {
            name: function.name.clone(),
            description: function.description.clone(),
            policy_types: function.policy_types.clone(),
            parameters: function.parameters.clone(),
            expression: function.expression.clone(),
            dependencies: catalog
                .dependencies(function)
                .map(BaseStatementFunction::versioned_name)
                .collect(),
        }
    }
}

/// Structural identity of a base statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BaseStatementIdentity {
    name: String,
    description: String,
    negation_allowed: bool,
    policy_types: BTreeSet<String>,
    function: Option<FunctionIdentity>,
    arguments: Vec<BaseStatementArgument>,
}

impl BaseStatementIdentity {
    /// Computes the identity of a base statement.
    #[must_use]
    pub fn of(catalog: &Catalog, base_statement: &BaseStatement) -> Self {
        Self {
            name: base_statement.name.clone(),
            description: base_statement.description.clone(),
            negation_allowed: base_statement.negation_allowed,
            policy_types: base_statement.policy_types.clone(),
            function: catalog
                .statement_function(base_statement)
                .map(|f| FunctionIdentity::of(catalog, f)),
            arguments: base_statement.arguments.clone(),
        }
    }
}

/// Comparison key of one configured argument value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArgumentValueKey {
    /// Compared by exact string equality.
    Exact(String),
    /// Unordered array items, sorted by canonical form.
    Items(Vec<String>),
}

impl ArgumentValueKey {
    /// Computes the key of `value` configured for `argument`.
    #[must_use]
    pub fn of(argument: Option<&BaseStatementArgument>, value: &str) -> Self {
        let unordered_type: Option<ArgumentType> = argument
            .filter(|a| !a.ordered_items)
            .and_then(|a| a.argument_type)
            .filter(|t| t.is_array());
        let Some(argument_type) = unordered_type else {
            return Self::Exact(value.to_string());
        };
        match argument_type.array_items(value) {
            Ok(items) => {
                let mut keys: Vec<String> = items.iter().map(|item| item.key()).collect();
                keys.sort();
                Self::Items(keys)
            }
            Err(_) => Self::Exact(value.to_string()),
        }
    }
}

/// Identity of a configured statement, ignoring negation.
///
/// This is the boolean variable a statement contributes to its policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatementIdentity {
    base_statement: Option<BaseStatementIdentity>,
    arguments: Vec<ArgumentValueKey>,
}

impl StatementIdentity {
    /// Computes the identity of a configured statement.
    #[must_use]
    pub fn of(catalog: &Catalog, statement: &ConfiguredStatement) -> Self {
        let base = catalog.statement_base(statement);
        let configured: Vec<&BaseStatementArgument> =
            base.map(|b| b.configured_arguments().collect()).unwrap_or_default();
        let arguments = statement
            .argument_values
            .iter()
            .enumerate()
            .map(|(i, value)| ArgumentValueKey::of(configured.get(i).copied(), value))
            .collect();
        Self {
            base_statement: base.map(|b| BaseStatementIdentity::of(catalog, b)),
            arguments,
        }
    }
}

/// Identity of a configured statement including negation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LiteralIdentity {
    /// The statement variable.
    pub statement: StatementIdentity,
    /// Whether the variable is negated.
    pub negated: bool,
}

impl LiteralIdentity {
    /// Computes the identity of a configured statement.
    #[must_use]
    pub fn of(catalog: &Catalog, statement: &ConfiguredStatement) -> Self {
        Self {
            statement: StatementIdentity::of(catalog, statement),
            negated: statement.negated,
        }
    }

    /// Returns true if `other` is the same variable with opposite negation.
    #[must_use]
    pub fn is_complement_of(&self, other: &Self) -> bool {
        self.negated != other.negated && self.statement == other.statement
    }
}

/// Identity of a clause: its literals in order.
#[must_use]
pub fn clause_identity(catalog: &Catalog, clause: &PolicyClause) -> Vec<LiteralIdentity> {
    clause
        .statements
        .iter()
        .map(|s| LiteralIdentity::of(catalog, s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BaseStatementId, FunctionId};

    fn catalog_with(argument: BaseStatementArgument) -> (Catalog, BaseStatementId) {
        let mut catalog = Catalog::new();
        let function = catalog.add_function(
            BaseStatementFunction::new("contains", "jdoe", 1)
                .with_parameter("array")
                .with_expression("array[_] == \"x\""),
        );
        let base = catalog.add_base_statement(
            BaseStatement::new("Contains", "jdoe", 1)
                .with_function(function)
                .with_argument(argument),
        );
        (catalog, base)
    }

    #[test]
    fn test_unordered_arrays_compare_as_multisets() {
        let (catalog, base) =
            catalog_with(BaseStatementArgument::new("array", ArgumentType::IntegerArray));
        let a = ConfiguredStatement::new(base).with_argument_value("1, 2, 2");
        let b = ConfiguredStatement::new(base).with_argument_value("2,1,2");
        let c = ConfiguredStatement::new(base).with_argument_value("1, 2");
        assert_eq!(StatementIdentity::of(&catalog, &a), StatementIdentity::of(&catalog, &b));
        assert_ne!(StatementIdentity::of(&catalog, &a), StatementIdentity::of(&catalog, &c));
    }

    #[test]
    fn test_ordered_arrays_compare_exactly() {
        let (catalog, base) = catalog_with(
            BaseStatementArgument::new("array", ArgumentType::StringArray).with_ordered_items(true),
        );
        let a = ConfiguredStatement::new(base).with_argument_value("a, b");
        let b = ConfiguredStatement::new(base).with_argument_value("b, a");
        assert_ne!(StatementIdentity::of(&catalog, &a), StatementIdentity::of(&catalog, &b));
    }

    #[test]
    fn test_unparsable_arrays_fall_back_to_exact() {
        let (catalog, base) =
            catalog_with(BaseStatementArgument::new("array", ArgumentType::IntegerArray));
        let a = ConfiguredStatement::new(base).with_argument_value("1, x");
        let b = ConfiguredStatement::new(base).with_argument_value("1, x");
        let c = ConfiguredStatement::new(base).with_argument_value("x, 1");
        assert_eq!(StatementIdentity::of(&catalog, &a), StatementIdentity::of(&catalog, &b));
        assert_ne!(StatementIdentity::of(&catalog, &a), StatementIdentity::of(&catalog, &c));
    }

    #[test]
    fn test_structurally_equal_base_statements_are_the_same_variable() {
        let mut catalog = Catalog::new();
        let f1 = catalog.add_function(BaseStatementFunction::new("t", "jdoe", 1).with_expression("1 == 1"));
        let f2 = catalog.add_function(BaseStatementFunction::new("t", "other", 2).with_expression("1 == 1"));
        let b1 = catalog.add_base_statement(BaseStatement::new("True", "jdoe", 1).with_function(f1));
        let b2 = catalog.add_base_statement(BaseStatement::new("True", "other", 3).with_function(f2));
        let a = LiteralIdentity::of(&catalog, &ConfiguredStatement::new(b1));
        let b = LiteralIdentity::of(&catalog, &ConfiguredStatement::new(b2).with_negated(true));
        assert!(a.is_complement_of(&b));
        assert!(!a.is_complement_of(&a));
    }

    #[test]
    fn test_cyclic_dependencies_do_not_recurse() {
        let mut catalog = Catalog::new();
        let id = FunctionId::new(0);
        catalog.add_function(BaseStatementFunction::new("loop", "jdoe", 1).with_dependency(id));
        let function = catalog.function(id).unwrap();
        let identity = FunctionIdentity::of(&catalog, function);
        assert_eq!(identity, FunctionIdentity::of(&catalog, function));
    }
}
