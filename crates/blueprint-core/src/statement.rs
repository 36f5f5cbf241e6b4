//! Base statements, their arguments, and the functions they evaluate.
//!
//! These are the reusable, versioned building blocks authored by security
//! teams. Policies reference them through a [`Catalog`](crate::Catalog).

use std::collections::BTreeSet;

use crate::argument::ArgumentType;
use crate::catalog::FunctionId;
use crate::state::PolicyElementState;
use crate::validation::{Validate, ValidationError, ValidationErrors};

/// A named, versioned boolean Rego expression with parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BaseStatementFunction {
    /// Function name, used as the Rego rule name.
    pub name: String,
    /// Author of this version.
    pub author: String,
    /// Version number.
    pub version: u32,
    /// Lifecycle state.
    pub state: Option<PolicyElementState>,
    /// Human-readable description.
    pub description: String,
    /// Names of the policy types this function may be used in.
    pub policy_types: BTreeSet<String>,
    /// Ordered parameter names.
    pub parameters: Vec<String>,
    /// Rego expression body, emitted verbatim.
    pub expression: String,
    /// Other functions called from the expression.
    pub dependencies: Vec<FunctionId>,
}

impl BaseStatementFunction {
    /// Creates a function with the given name, author and version.
    #[must_use]
    pub fn new(name: impl Into<String>, author: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            author: author.into(),
            version,
            ..Self::default()
        }
    }

    /// Sets the lifecycle state.
    #[must_use]
    pub const fn with_state(mut self, state: PolicyElementState) -> Self {
        self.state = Some(state);
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Adds a supported policy type.
    #[must_use]
    pub fn with_policy_type(mut self, policy_type: impl Into<String>) -> Self {
        self.policy_types.insert(policy_type.into());
        self
    }

    /// Appends a parameter.
    #[must_use]
    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameters.push(parameter.into());
        self
    }

    /// Sets the expression body.
    #[must_use]
    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = expression.into();
        self
    }

    /// Adds a dependency. Adding the same function twice has no effect.
    #[must_use]
    pub fn with_dependency(mut self, dependency: FunctionId) -> Self {
        if !self.dependencies.contains(&dependency) {
            self.dependencies.push(dependency);
        }
        self
    }

    /// Returns `name:version`.
    #[must_use]
    pub fn versioned_name(&self) -> String {
        format!("{}:{}", self.name, self.version)
    }
}

impl Validate for BaseStatementFunction {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.not_blank("name", &self.name, "Name cannot be blank");
        errors.not_blank("author", &self.author, "Author cannot be blank");
        if self.state.is_none() {
            errors.add(ValidationError::required("state", "State cannot be null"));
        }
        errors.not_blank("description", &self.description, "Description cannot be blank");
        if self.policy_types.is_empty() {
            errors.add(ValidationError::empty(
                "policyTypes",
                "A function must be valid for at least one policy type",
            ));
        }
        errors.no_blank_items("policyTypes", &self.policy_types, "Policy types cannot be blank");
        errors.no_blank_items("parameters", &self.parameters, "Parameters cannot be blank");
        errors.not_blank("expression", &self.expression, "Expression cannot be blank");
        errors.into_result()
    }
}

/// One parameter slot of a base statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BaseStatementArgument {
    /// Function parameter this argument fills.
    pub parameter: String,
    /// Human-readable description.
    pub description: String,
    /// Type of values accepted.
    pub argument_type: Option<ArgumentType>,
    /// Allowed values; empty means unrestricted.
    pub enum_values: BTreeSet<String>,
    /// Array values must not repeat items.
    pub unique_items: bool,
    /// Array values are compared in order rather than as a multiset.
    pub ordered_items: bool,
    /// The value is fixed by the base statement author.
    pub constant: bool,
    /// Value of a constant argument.
    pub constant_value: Option<String>,
}

impl BaseStatementArgument {
    /// Creates a configured argument for `parameter`.
    #[must_use]
    pub fn new(parameter: impl Into<String>, argument_type: ArgumentType) -> Self {
        Self {
            parameter: parameter.into(),
            argument_type: Some(argument_type),
            ..Self::default()
        }
    }

    /// Creates a constant argument for `parameter` with a fixed value.
    #[must_use]
    pub fn constant(
        parameter: impl Into<String>,
        argument_type: ArgumentType,
        value: impl Into<String>,
    ) -> Self {
        Self {
            constant: true,
            constant_value: Some(value.into()),
            ..Self::new(parameter, argument_type)
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Adds an allowed value.
    #[must_use]
    pub fn with_enum_value(mut self, value: impl Into<String>) -> Self {
        self.enum_values.insert(value.into());
        self
    }

    /// Requires array items to be unique.
    #[must_use]
    pub const fn with_unique_items(mut self, unique_items: bool) -> Self {
        self.unique_items = unique_items;
        self
    }

    /// Compares array items in order.
    #[must_use]
    pub const fn with_ordered_items(mut self, ordered_items: bool) -> Self {
        self.ordered_items = ordered_items;
        self
    }
}

impl Validate for BaseStatementArgument {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.not_blank("parameter", &self.parameter, "Parameter cannot be blank");
        errors.not_blank("description", &self.description, "Description cannot be blank");
        if self.argument_type.is_none() {
            errors.add(ValidationError::required("type", "Argument type cannot be null"));
        }
        errors.no_blank_items("enumValues", &self.enum_values, "Enumerated values cannot be blank");
        if self.constant && self.constant_value.is_none() {
            errors.add(ValidationError::constraint(
                "constantValue",
                "A constant argument must have a value",
            ));
        }
        errors.into_result()
    }
}

/// A named, versioned unit exposed to policy authors.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BaseStatement {
    /// Statement name shown to policy authors.
    pub name: String,
    /// Author of this version.
    pub author: String,
    /// Version number.
    pub version: u32,
    /// Lifecycle state.
    pub state: Option<PolicyElementState>,
    /// Human-readable description.
    pub description: String,
    /// Whether policy authors may negate the statement.
    pub negation_allowed: bool,
    /// Policy types this statement may be used in.
    pub policy_types: BTreeSet<String>,
    /// The function evaluated by this statement.
    pub function: Option<FunctionId>,
    /// Arguments, matching the function parameters one to one.
    pub arguments: Vec<BaseStatementArgument>,
}

impl BaseStatement {
    /// Creates a base statement with the given name, author and version.
    #[must_use]
    pub fn new(name: impl Into<String>, author: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            author: author.into(),
            version,
            ..Self::default()
        }
    }

    /// Sets the lifecycle state.
    #[must_use]
    pub const fn with_state(mut self, state: PolicyElementState) -> Self {
        self.state = Some(state);
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Allows or forbids negation.
    #[must_use]
    pub const fn with_negation_allowed(mut self, negation_allowed: bool) -> Self {
        self.negation_allowed = negation_allowed;
        self
    }

    /// Adds a supported policy type.
    #[must_use]
    pub fn with_policy_type(mut self, policy_type: impl Into<String>) -> Self {
        self.policy_types.insert(policy_type.into());
        self
    }

    /// Sets the evaluated function.
    #[must_use]
    pub const fn with_function(mut self, function: FunctionId) -> Self {
        self.function = Some(function);
        self
    }

    /// Appends an argument.
    #[must_use]
    pub fn with_argument(mut self, argument: BaseStatementArgument) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Returns `name:version`.
    #[must_use]
    pub fn versioned_name(&self) -> String {
        format!("{}:{}", self.name, self.version)
    }

    /// Returns the arguments policy authors must supply values for.
    pub fn configured_arguments(&self) -> impl Iterator<Item = &BaseStatementArgument> {
        self.arguments.iter().filter(|a| !a.constant)
    }
}

impl Validate for BaseStatement {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.not_blank("name", &self.name, "Name cannot be blank");
        errors.not_blank("author", &self.author, "Author cannot be blank");
        if self.state.is_none() {
            errors.add(ValidationError::required("state", "State cannot be null"));
        }
        errors.not_blank("description", &self.description, "Description cannot be blank");
        if self.policy_types.is_empty() {
            errors.add(ValidationError::empty(
                "policyTypes",
                "A base statement must be valid for at least one policy type",
            ));
        }
        errors.no_blank_items("policyTypes", &self.policy_types, "Policy types cannot be blank");
        if self.function.is_none() {
            errors.add(ValidationError::required("function", "Evaluated function cannot be null"));
        }
        errors.into_result()
    }
}
