//! Policies composed from configured base statements.
//!
//! A [`Policy`] is a disjunction of [`PolicyClause`]s; each clause is a
//! conjunction of [`ConfiguredStatement`]s.
//!
//! # Example
//!
//! ```rust,ignore
//! let policy = Policy::new("System").with_clause(
//!     PolicyClause::new().with_statement(
//!         ConfiguredStatement::new(contains_id).with_argument_value("foo, bar"),
//!     ),
//! );
//! ```

use crate::catalog::BaseStatementId;
use crate::validation::{Validate, ValidationError, ValidationErrors};

/// A policy: any clause being true allows the request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Policy {
    /// Name, required when the policy is saved.
    pub name: String,
    /// Author, required when the policy is saved.
    pub author: String,
    /// Name of the policy type.
    pub policy_type: String,
    /// Clauses, OR-ed together.
    pub clauses: Vec<PolicyClause>,
}

impl Policy {
    /// Creates an empty policy of the given type.
    #[must_use]
    pub fn new(policy_type: impl Into<String>) -> Self {
        Self {
            policy_type: policy_type.into(),
            ..Self::default()
        }
    }

    /// Sets the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the author.
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Appends a clause.
    #[must_use]
    pub fn with_clause(mut self, clause: PolicyClause) -> Self {
        self.clauses.push(clause);
        self
    }

    /// Iterates over every configured statement in clause order.
    pub fn statements(&self) -> impl Iterator<Item = &ConfiguredStatement> {
        self.clauses.iter().flat_map(|c| c.statements.iter())
    }
}

impl Validate for Policy {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.not_blank("policyType", &self.policy_type, "A policy must have a policy type");
        if self.clauses.is_empty() {
            errors.add(ValidationError::empty(
                "clauses",
                "A policy must have at least one clause",
            ));
        }
        errors.into_result()
    }
}

/// A clause: true when all of its statements are true.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PolicyClause {
    /// Statements, AND-ed together.
    pub statements: Vec<ConfiguredStatement>,
}

impl PolicyClause {
    /// Creates an empty clause.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a statement.
    #[must_use]
    pub fn with_statement(mut self, statement: ConfiguredStatement) -> Self {
        self.statements.push(statement);
        self
    }
}

impl Validate for PolicyClause {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.statements.is_empty() {
            errors.add(ValidationError::empty(
                "statements",
                "A policy clause must have at least one configured statement",
            ));
        }
        errors.into_result()
    }
}

/// One use of a base statement inside a clause.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfiguredStatement {
    /// The referenced base statement.
    pub base_statement: Option<BaseStatementId>,
    /// Whether the statement is negated.
    pub negated: bool,
    /// Values for the base statement's configured arguments, in order.
    pub argument_values: Vec<String>,
}

impl ConfiguredStatement {
    /// Creates a statement using the given base statement.
    #[must_use]
    pub fn new(base_statement: BaseStatementId) -> Self {
        Self {
            base_statement: Some(base_statement),
            ..Self::default()
        }
    }

    /// Sets negation.
    #[must_use]
    pub const fn with_negated(mut self, negated: bool) -> Self {
        self.negated = negated;
        self
    }

    /// Appends an argument value.
    #[must_use]
    pub fn with_argument_value(mut self, value: impl Into<String>) -> Self {
        self.argument_values.push(value.into());
        self
    }
}

impl Validate for ConfiguredStatement {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.base_statement.is_none() {
            errors.add(ValidationError::required(
                "baseStatement",
                "Base statement cannot be null",
            ));
        }
        errors.no_blank_items(
            "argumentValues",
            &self.argument_values,
            "Argument values cannot be blank",
        );
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_requires_clause() {
        let errors = Policy::new("System").validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.iter().next().unwrap().field, "clauses");
    }

    #[test]
    fn test_policy_requires_type() {
        let policy = Policy::new(" ").with_clause(PolicyClause::new());
        let errors = policy.validate().unwrap_err();
        assert_eq!(errors.iter().next().unwrap().message, "A policy must have a policy type");
    }

    #[test]
    fn test_empty_clause_is_invalid() {
        assert!(!PolicyClause::new().is_valid());
    }

    #[test]
    fn test_statement_field_errors() {
        let statement = ConfiguredStatement::default()
            .with_argument_value("foo")
            .with_argument_value("");
        let errors = statement.validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["baseStatement", "argumentValues[1]"]);
    }

    #[test]
    fn test_statements_iterates_all_clauses() {
        let id = BaseStatementId::new(0);
        let policy = Policy::new("System")
            .with_clause(PolicyClause::new().with_statement(ConfiguredStatement::new(id)))
            .with_clause(
                PolicyClause::new()
                    .with_statement(ConfiguredStatement::new(id))
                    .with_statement(ConfiguredStatement::new(id).with_negated(true)),
            );
        assert_eq!(policy.statements().count(), 3);
    }
}
