//! Arena of functions and base statements, and the tree handed to rules.
//!
//! Functions and base statements are shared between many policies and may
//! reference each other, so they live in a [`Catalog`] and are addressed by
//! [`FunctionId`] and [`BaseStatementId`]. A [`PolicyTree`] pairs a catalog
//! with the root node being validated or compiled.

use std::fmt;

use crate::policy::{ConfiguredStatement, Policy};
use crate::statement::{BaseStatement, BaseStatementFunction};

/// Index of a function in a [`Catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(usize);

impl FunctionId {
    /// Creates an id from a raw index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "function#{}", self.0)
    }
}

/// Index of a base statement in a [`Catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BaseStatementId(usize);

impl BaseStatementId {
    /// Creates an id from a raw index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for BaseStatementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "baseStatement#{}", self.0)
    }
}

/// Owner of all functions and base statements referenced by a tree.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    functions: Vec<BaseStatementFunction>,
    base_statements: Vec<BaseStatement>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a function and returns its id.
    pub fn add_function(&mut self, function: BaseStatementFunction) -> FunctionId {
        self.functions.push(function);
        FunctionId(self.functions.len() - 1)
    }

    /// Adds a base statement and returns its id.
    pub fn add_base_statement(&mut self, base_statement: BaseStatement) -> BaseStatementId {
        self.base_statements.push(base_statement);
        BaseStatementId(self.base_statements.len() - 1)
    }

    /// Looks up a function.
    #[must_use]
    pub fn function(&self, id: FunctionId) -> Option<&BaseStatementFunction> {
        self.functions.get(id.0)
    }

    /// Looks up a function for modification.
    pub fn function_mut(&mut self, id: FunctionId) -> Option<&mut BaseStatementFunction> {
        self.functions.get_mut(id.0)
    }

    /// Looks up a base statement.
    #[must_use]
    pub fn base_statement(&self, id: BaseStatementId) -> Option<&BaseStatement> {
        self.base_statements.get(id.0)
    }

    /// Looks up a base statement for modification.
    pub fn base_statement_mut(&mut self, id: BaseStatementId) -> Option<&mut BaseStatement> {
        self.base_statements.get_mut(id.0)
    }

    /// Resolves the base statement used by a configured statement.
    #[must_use]
    pub fn statement_base(&self, statement: &ConfiguredStatement) -> Option<&BaseStatement> {
        statement.base_statement.and_then(|id| self.base_statement(id))
    }

    /// Resolves the function evaluated by a base statement.
    #[must_use]
    pub fn statement_function(&self, base_statement: &BaseStatement) -> Option<&BaseStatementFunction> {
        base_statement.function.and_then(|id| self.function(id))
    }

    /// Iterates over the resolvable dependencies of a function.
    pub fn dependencies<'a>(
        &'a self,
        function: &'a BaseStatementFunction,
    ) -> impl Iterator<Item = &'a BaseStatementFunction> + 'a {
        function.dependencies.iter().filter_map(|id| self.function(*id))
    }

    /// Finds a function by `name:version`.
    #[must_use]
    pub fn find_function(&self, versioned_name: &str) -> Option<FunctionId> {
        self.functions
            .iter()
            .position(|f| f.versioned_name() == versioned_name)
            .map(FunctionId)
    }

    /// Finds a base statement by `name:version`.
    #[must_use]
    pub fn find_base_statement(&self, versioned_name: &str) -> Option<BaseStatementId> {
        self.base_statements
            .iter()
            .position(|b| b.versioned_name() == versioned_name)
            .map(BaseStatementId)
    }

    /// Returns the number of functions.
    #[must_use]
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Returns the number of base statements.
    #[must_use]
    pub fn base_statement_count(&self) -> usize {
        self.base_statements.len()
    }
}

/// The node a traversal starts from.
#[derive(Debug, Clone)]
pub enum RootNode {
    /// A complete policy.
    Policy(Policy),
    /// A single base statement, validated while it is authored.
    BaseStatement(BaseStatementId),
    /// A single function, validated while it is authored.
    Function(FunctionId),
}

impl RootNode {
    /// Returns the location identifier of the root.
    #[must_use]
    pub const fn identifier(&self) -> &'static str {
        match self {
            Self::Policy(_) => "policy",
            Self::BaseStatement(_) => "baseStatement",
            Self::Function(_) => "function",
        }
    }
}

/// A catalog together with the root being validated or compiled.
#[derive(Debug, Clone)]
pub struct PolicyTree {
    catalog: Catalog,
    root: RootNode,
}

impl PolicyTree {
    /// Creates a tree rooted at a policy.
    #[must_use]
    pub const fn policy(catalog: Catalog, policy: Policy) -> Self {
        Self {
            catalog,
            root: RootNode::Policy(policy),
        }
    }

    /// Creates a tree rooted at a base statement.
    #[must_use]
    pub const fn base_statement(catalog: Catalog, id: BaseStatementId) -> Self {
        Self {
            catalog,
            root: RootNode::BaseStatement(id),
        }
    }

    /// Creates a tree rooted at a function.
    #[must_use]
    pub const fn function(catalog: Catalog, id: FunctionId) -> Self {
        Self {
            catalog,
            root: RootNode::Function(id),
        }
    }

    /// Returns the catalog.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Returns the root node.
    #[must_use]
    pub const fn root(&self) -> &RootNode {
        &self.root
    }

    /// Returns the root policy, if the tree is rooted at one.
    #[must_use]
    pub const fn root_policy(&self) -> Option<&Policy> {
        match &self.root {
            RootNode::Policy(policy) => Some(policy),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicyClause;

    #[test]
    fn test_ids_follow_insertion_order() {
        let mut catalog = Catalog::new();
        let a = catalog.add_function(BaseStatementFunction::new("a", "jdoe", 1));
        let b = catalog.add_function(BaseStatementFunction::new("b", "jdoe", 1));
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(catalog.function(b).map(|f| f.name.as_str()), Some("b"));
        assert!(catalog.function(FunctionId::new(7)).is_none());
    }

    #[test]
    fn test_find_by_versioned_name() {
        let mut catalog = Catalog::new();
        catalog.add_function(BaseStatementFunction::new("a", "jdoe", 1));
        let a2 = catalog.add_function(BaseStatementFunction::new("a", "jdoe", 2));
        assert_eq!(catalog.find_function("a:2"), Some(a2));
        assert_eq!(catalog.find_function("a:3"), None);
    }

    #[test]
    fn test_dependencies_skip_unresolved() {
        let mut catalog = Catalog::new();
        let dep = catalog.add_function(BaseStatementFunction::new("dep", "jdoe", 1));
        let function = BaseStatementFunction::new("f", "jdoe", 1)
            .with_dependency(dep)
            .with_dependency(FunctionId::new(42));
        assert_eq!(catalog.dependencies(&function).count(), 1);
    }

    #[test]
    fn test_root_identifiers() {
        let tree = PolicyTree::policy(Catalog::new(), Policy::new("System").with_clause(PolicyClause::new()));
        assert_eq!(tree.root().identifier(), "policy");
        assert!(tree.root_policy().is_some());
        let tree = PolicyTree::function(Catalog::new(), FunctionId::new(0));
        assert_eq!(tree.root().identifier(), "function");
        assert!(tree.root_policy().is_none());
    }
}
