//! Serialized form of a policy tree.
//!
//! Documents reference functions and base statements by versioned name
//! (`name:version`) instead of by catalog id. [`PolicyDocument::into_tree`]
//! resolves the references and builds the [`PolicyTree`].
//!
//! ```json
//! {
//!   "functions": [{ "name": "tautology", "version": 1, "expression": "1 == 1" }],
//!   "baseStatements": [{ "name": "Always", "version": 1, "function": "tautology:1" }],
//!   "policy": {
//!     "policyType": "System",
//!     "clauses": [{ "statements": [{ "baseStatement": "Always:1" }] }]
//!   }
//! }
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::argument::ArgumentType;
use crate::catalog::{BaseStatementId, Catalog, FunctionId, PolicyTree};
use crate::error::{Error, Result};
use crate::policy::{ConfiguredStatement, Policy, PolicyClause};
use crate::state::PolicyElementState;
use crate::statement::{BaseStatement, BaseStatementArgument, BaseStatementFunction};

/// A complete document: the catalog plus one validation root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDocument {
    /// Function definitions.
    #[serde(default)]
    pub functions: Vec<FunctionDocument>,
    /// Base statement definitions.
    #[serde(default)]
    pub base_statements: Vec<BaseStatementDocument>,
    /// A policy root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<PolicyDefinition>,
    /// A base statement root, by versioned name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_statement: Option<String>,
    /// A function root, by versioned name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
}

/// Serialized [`BaseStatementFunction`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FunctionDocument {
    /// Function name.
    pub name: String,
    /// Author.
    pub author: String,
    /// Version number.
    pub version: u32,
    /// Lifecycle state.
    pub state: Option<PolicyElementState>,
    /// Description.
    pub description: String,
    /// Supported policy types.
    pub policy_types: BTreeSet<String>,
    /// Parameter names.
    pub parameters: Vec<String>,
    /// Rego expression.
    pub expression: String,
    /// Versioned names of dependency functions.
    pub dependencies: Vec<String>,
}

/// Serialized [`BaseStatementArgument`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArgumentDocument {
    /// Function parameter.
    pub parameter: String,
    /// Description.
    pub description: String,
    /// Argument type.
    #[serde(rename = "type")]
    pub argument_type: Option<ArgumentType>,
    /// Allowed values.
    pub enum_values: BTreeSet<String>,
    /// Array items must be unique.
    pub unique_items: bool,
    /// Array items are compared in order.
    pub ordered_items: bool,
    /// Value fixed by the base statement author.
    pub constant: bool,
    /// Value of a constant argument.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constant_value: Option<String>,
}

/// Serialized [`BaseStatement`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BaseStatementDocument {
    /// Statement name.
    pub name: String,
    /// Author.
    pub author: String,
    /// Version number.
    pub version: u32,
    /// Lifecycle state.
    pub state: Option<PolicyElementState>,
    /// Description.
    pub description: String,
    /// Whether the statement may be negated.
    pub negation_allowed: bool,
    /// Supported policy types.
    pub policy_types: BTreeSet<String>,
    /// Versioned name of the evaluated function.
    pub function: Option<String>,
    /// Arguments.
    pub arguments: Vec<ArgumentDocument>,
}

/// Serialized [`Policy`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyDefinition {
    /// Policy name.
    pub name: String,
    /// Author.
    pub author: String,
    /// Policy type.
    pub policy_type: String,
    /// Clauses.
    pub clauses: Vec<ClauseDocument>,
}

/// Serialized [`PolicyClause`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClauseDocument {
    /// Statements.
    pub statements: Vec<StatementDocument>,
}

/// Serialized [`ConfiguredStatement`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatementDocument {
    /// Versioned name of the base statement.
    pub base_statement: Option<String>,
    /// Whether the statement is negated.
    pub negated: bool,
    /// Argument values.
    pub argument_values: Vec<String>,
}

impl PolicyDocument {
    /// Parses a document from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SerializationError`] if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resolves references and builds the tree.
    ///
    /// Missing references inside definitions stay unset so rules can report
    /// them; references that name an element the document does not define
    /// are errors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnresolvedReference`] for an unknown versioned name
    /// and [`Error::MissingRoot`] if no root is given.
    pub fn into_tree(self) -> Result<PolicyTree> {
        let mut catalog = Catalog::new();
        let mut function_ids = Vec::with_capacity(self.functions.len());
        for function in &self.functions {
            function_ids.push(catalog.add_function(BaseStatementFunction {
                name: function.name.clone(),
                author: function.author.clone(),
                version: function.version,
                state: function.state,
                description: function.description.clone(),
                policy_types: function.policy_types.clone(),
                parameters: function.parameters.clone(),
                expression: function.expression.clone(),
                dependencies: Vec::new(),
            }));
        }
        for (i, function) in self.functions.iter().enumerate() {
            let mut dependencies = Vec::with_capacity(function.dependencies.len());
            for (j, name) in function.dependencies.iter().enumerate() {
                let id = resolve_function(&catalog, name, || format!("functions[{i}].dependencies[{j}]"))?;
                if !dependencies.contains(&id) {
                    dependencies.push(id);
                }
            }
            if let Some(entry) = catalog.function_mut(function_ids[i]) {
                entry.dependencies = dependencies;
            }
        }

        for (i, base) in self.base_statements.into_iter().enumerate() {
            let function = base
                .function
                .as_deref()
                .map(|name| resolve_function(&catalog, name, || format!("baseStatements[{i}].function")))
                .transpose()?;
            let arguments = base.arguments.into_iter().map(ArgumentDocument::into_argument).collect();
            catalog.add_base_statement(BaseStatement {
                name: base.name,
                author: base.author,
                version: base.version,
                state: base.state,
                description: base.description,
                negation_allowed: base.negation_allowed,
                policy_types: base.policy_types,
                function,
                arguments,
            });
        }

        if let Some(policy) = self.policy {
            let policy = policy.into_policy(&catalog)?;
            return Ok(PolicyTree::policy(catalog, policy));
        }
        if let Some(name) = self.base_statement.as_deref() {
            let id = resolve_base_statement(&catalog, name, || "baseStatement".to_string())?;
            return Ok(PolicyTree::base_statement(catalog, id));
        }
        if let Some(name) = self.function.as_deref() {
            let id = resolve_function(&catalog, name, || "function".to_string())?;
            return Ok(PolicyTree::function(catalog, id));
        }
        Err(Error::MissingRoot)
    }
}

impl ArgumentDocument {
    fn into_argument(self) -> BaseStatementArgument {
        BaseStatementArgument {
            parameter: self.parameter,
            description: self.description,
            argument_type: self.argument_type,
            enum_values: self.enum_values,
            unique_items: self.unique_items,
            ordered_items: self.ordered_items,
            constant: self.constant,
            constant_value: self.constant_value,
        }
    }
}

impl PolicyDefinition {
    fn into_policy(self, catalog: &Catalog) -> Result<Policy> {
        let mut clauses = Vec::with_capacity(self.clauses.len());
        for (i, clause) in self.clauses.into_iter().enumerate() {
            let mut statements = Vec::with_capacity(clause.statements.len());
            for (j, statement) in clause.statements.into_iter().enumerate() {
                let base_statement = statement
                    .base_statement
                    .as_deref()
                    .map(|name| {
                        resolve_base_statement(catalog, name, || {
                            format!("policy.clauses[{i}].statements[{j}].baseStatement")
                        })
                    })
                    .transpose()?;
                statements.push(ConfiguredStatement {
                    base_statement,
                    negated: statement.negated,
                    argument_values: statement.argument_values,
                });
            }
            clauses.push(PolicyClause { statements });
        }
        Ok(Policy {
            name: self.name,
            author: self.author,
            policy_type: self.policy_type,
            clauses,
        })
    }
}

fn resolve_function(
    catalog: &Catalog,
    name: &str,
    location: impl FnOnce() -> String,
) -> Result<FunctionId> {
    catalog.find_function(name).ok_or_else(|| Error::UnresolvedReference {
        kind: "function",
        name: name.to_string(),
        location: location(),
    })
}

fn resolve_base_statement(
    catalog: &Catalog,
    name: &str,
    location: impl FnOnce() -> String,
) -> Result<BaseStatementId> {
    catalog
        .find_base_statement(name)
        .ok_or_else(|| Error::UnresolvedReference {
            kind: "base statement",
            name: name.to_string(),
            location: location(),
        })
}
