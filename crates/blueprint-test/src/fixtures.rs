//! Known-valid policy elements.
//!
//! Every fixture passes all built-in rulesets. Tests take a fixture, break
//! one thing, and check for the matching violation.

use blueprint_core::{
    ArgumentType, BaseStatement, BaseStatementArgument, BaseStatementFunction, BaseStatementId,
    Catalog, ConfiguredStatement, FunctionId, Policy, PolicyClause, PolicyElementState,
    PolicyTree,
};

/// Policy type used by all fixtures.
pub const POLICY_TYPE: &str = "System";

/// Author used by all fixtures.
pub const AUTHOR: &str = "jdoe";

/// `function_name(array, value)`: true if `value` is in `array`.
#[must_use]
pub fn valid_function() -> BaseStatementFunction {
    BaseStatementFunction::new("function_name", AUTHOR, 1)
        .with_state(PolicyElementState::Released)
        .with_description("Checks whether an array contains a value")
        .with_policy_type(POLICY_TYPE)
        .with_parameter("array")
        .with_parameter("value")
        .with_expression("array[_] == value")
}

/// `Base Statement`, backed by `function`, with a unique string array and
/// a string argument.
#[must_use]
pub fn valid_base_statement(function: FunctionId) -> BaseStatement {
    BaseStatement::new("Base Statement", AUTHOR, 1)
        .with_state(PolicyElementState::Released)
        .with_description("The array contains the value")
        .with_negation_allowed(true)
        .with_policy_type(POLICY_TYPE)
        .with_function(function)
        .with_argument(
            BaseStatementArgument::new("array", ArgumentType::StringArray)
                .with_description("Values to search")
                .with_unique_items(true),
        )
        .with_argument(
            BaseStatementArgument::new("value", ArgumentType::String)
                .with_description("Value to find"),
        )
}

/// `tautology`: a function without parameters that is always true.
#[must_use]
pub fn tautology_function() -> BaseStatementFunction {
    BaseStatementFunction::new("tautology", AUTHOR, 1)
        .with_state(PolicyElementState::Released)
        .with_description("Always true")
        .with_policy_type(POLICY_TYPE)
        .with_expression("1 == 1")
}

/// `Tautology`, backed by `function`, without arguments.
#[must_use]
pub fn tautology_base_statement(function: FunctionId) -> BaseStatement {
    BaseStatement::new("Tautology", AUTHOR, 1)
        .with_state(PolicyElementState::Released)
        .with_description("Always true")
        .with_policy_type(POLICY_TYPE)
        .with_function(function)
}

/// A catalog and policy with handles to every catalog entry.
#[derive(Debug, Clone)]
pub struct PolicyFixture {
    /// Catalog holding both functions and base statements.
    pub catalog: Catalog,
    /// The policy under test.
    pub policy: Policy,
    /// Id of [`valid_function`].
    pub function: FunctionId,
    /// Id of [`valid_base_statement`].
    pub base_statement: BaseStatementId,
    /// Id of [`tautology_function`].
    pub tautology_function: FunctionId,
    /// Id of [`tautology_base_statement`].
    pub tautology_base_statement: BaseStatementId,
}

impl PolicyFixture {
    fn catalog() -> Self {
        let mut catalog = Catalog::new();
        let function = catalog.add_function(valid_function());
        let base_statement = catalog.add_base_statement(valid_base_statement(function));
        let tautology_function = catalog.add_function(tautology_function());
        let tautology_base_statement =
            catalog.add_base_statement(tautology_base_statement(tautology_function));
        Self {
            catalog,
            policy: Policy::new(POLICY_TYPE)
                .with_name("Valid Policy")
                .with_author(AUTHOR),
            function,
            base_statement,
            tautology_function,
            tautology_base_statement,
        }
    }

    /// One clause: `not Base Statement(["foo", "bar"], "foo")` and `Tautology`.
    #[must_use]
    pub fn valid() -> Self {
        let mut fixture = Self::catalog();
        fixture.policy = fixture.policy.with_clause(
            PolicyClause::new()
                .with_statement(
                    ConfiguredStatement::new(fixture.base_statement)
                        .with_negated(true)
                        .with_argument_value("foo, bar")
                        .with_argument_value("foo"),
                )
                .with_statement(ConfiguredStatement::new(fixture.tautology_base_statement)),
        );
        fixture
    }

    /// One clause containing only `Tautology`.
    #[must_use]
    pub fn tautology() -> Self {
        let mut fixture = Self::catalog();
        fixture.policy = fixture.policy.with_clause(
            PolicyClause::new()
                .with_statement(ConfiguredStatement::new(fixture.tautology_base_statement)),
        );
        fixture
    }

    /// Wraps the policy and catalog into a tree rooted at the policy.
    #[must_use]
    pub fn into_tree(self) -> PolicyTree {
        PolicyTree::policy(self.catalog, self.policy)
    }
}
