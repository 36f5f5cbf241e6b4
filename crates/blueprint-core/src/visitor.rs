//! Traversal of policy trees.
//!
//! A [`PolicyVisitor`] has one method per node kind. Every method defaults
//! to the matching `walk_*` function, which visits the node's children in
//! declaration order, so an implementation only overrides the kinds it
//! inspects and calls `walk_*` to keep descending.
//!
//! Traversal order is policy, clauses, statements, base statement, function,
//! then the base statement's arguments. Function dependencies are references
//! and are never traversed as children.
//!
//! # Example
//!
//! ```rust,ignore
//! struct CountStatements(Cell<usize>);
//!
//! impl PolicyVisitor for CountStatements {
//!     fn visit_statement(&self, node: &Node<'_, ConfiguredStatement>, report: &mut PolicyReport) {
//!         self.0.set(self.0.get() + 1);
//!         walk_statement(self, node, report);
//!     }
//! }
//! ```

use std::ops::Deref;

use crate::catalog::{Catalog, PolicyTree, RootNode};
use crate::location::Location;
use crate::policy::{ConfiguredStatement, Policy, PolicyClause};
use crate::report::PolicyReport;
use crate::statement::{BaseStatement, BaseStatementArgument, BaseStatementFunction};

/// The parent of a visited node.
#[derive(Debug, Clone, Copy)]
pub enum Parent<'t> {
    /// Parent of a clause.
    Policy(&'t Policy),
    /// Parent of a configured statement.
    Clause(&'t PolicyClause),
    /// Parent of a base statement reached from a policy.
    Statement(&'t ConfiguredStatement),
    /// Parent of a function or argument.
    BaseStatement(&'t BaseStatement),
}

/// A node being visited, with its position in the tree.
#[derive(Debug, Clone)]
pub struct Node<'t, T> {
    tree: &'t PolicyTree,
    value: &'t T,
    location: Location,
    index: usize,
    parent: Option<Parent<'t>>,
}

impl<'t, T> Node<'t, T> {
    /// Creates the root node of a traversal.
    pub fn root(tree: &'t PolicyTree, value: &'t T) -> Self {
        Self {
            tree,
            value,
            location: Location::root(tree.root().identifier()),
            index: 0,
            parent: None,
        }
    }

    /// Creates a child of this node.
    pub fn child<U>(&self, value: &'t U, location: Location, index: usize, parent: Parent<'t>) -> Node<'t, U> {
        Node {
            tree: self.tree,
            value,
            location,
            index,
            parent: Some(parent),
        }
    }

    /// Returns the node value.
    #[must_use]
    pub const fn value(&self) -> &'t T {
        self.value
    }

    /// Returns the catalog of the tree being traversed.
    #[must_use]
    pub const fn catalog(&self) -> &'t Catalog {
        self.tree.catalog()
    }

    /// Returns the node's location.
    #[must_use]
    pub const fn location(&self) -> &Location {
        &self.location
    }

    /// Returns the node's index among its siblings.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Returns the node's parent, `None` at the root.
    #[must_use]
    pub const fn parent(&self) -> Option<Parent<'t>> {
        self.parent
    }

    /// Returns the root policy, if the tree is rooted at one.
    #[must_use]
    pub const fn policy(&self) -> Option<&'t Policy> {
        self.tree.root_policy()
    }

    /// Returns the location of a field of this node.
    #[must_use]
    pub fn field(&self, field: &str) -> String {
        self.location.field(field)
    }
}

impl<T> Deref for Node<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.value
    }
}

/// Visitor over the nodes of a [`PolicyTree`].
pub trait PolicyVisitor {
    /// Visits a policy.
    fn visit_policy(&self, node: &Node<'_, Policy>, report: &mut PolicyReport) {
        walk_policy(self, node, report);
    }

    /// Visits a clause.
    fn visit_clause(&self, node: &Node<'_, PolicyClause>, report: &mut PolicyReport) {
        walk_clause(self, node, report);
    }

    /// Visits a configured statement.
    fn visit_statement(&self, node: &Node<'_, ConfiguredStatement>, report: &mut PolicyReport) {
        walk_statement(self, node, report);
    }

    /// Visits a base statement.
    fn visit_base_statement(&self, node: &Node<'_, BaseStatement>, report: &mut PolicyReport) {
        walk_base_statement(self, node, report);
    }

    /// Visits a function.
    fn visit_function(&self, node: &Node<'_, BaseStatementFunction>, report: &mut PolicyReport) {
        walk_function(self, node, report);
    }

    /// Visits a base statement argument.
    fn visit_argument(&self, node: &Node<'_, BaseStatementArgument>, report: &mut PolicyReport) {
        walk_argument(self, node, report);
    }

    /// Called instead of a root visit when the root id is not in the catalog.
    fn visit_missing_root(&self, _location: &Location, _report: &mut PolicyReport) {}
}

/// Visits the clauses of a policy.
pub fn walk_policy<V>(visitor: &V, node: &Node<'_, Policy>, report: &mut PolicyReport)
where
    V: PolicyVisitor + ?Sized,
{
    let policy = node.value();
    for (i, clause) in policy.clauses.iter().enumerate() {
        let location = node.location().indexed_child("clauses", i);
        visitor.visit_clause(&node.child(clause, location, i, Parent::Policy(policy)), report);
    }
}

/// Visits the statements of a clause.
pub fn walk_clause<V>(visitor: &V, node: &Node<'_, PolicyClause>, report: &mut PolicyReport)
where
    V: PolicyVisitor + ?Sized,
{
    let clause = node.value();
    for (i, statement) in clause.statements.iter().enumerate() {
        let location = node.location().indexed_child("statements", i);
        visitor.visit_statement(&node.child(statement, location, i, Parent::Clause(clause)), report);
    }
}

/// Visits the base statement of a configured statement, if it resolves.
pub fn walk_statement<V>(visitor: &V, node: &Node<'_, ConfiguredStatement>, report: &mut PolicyReport)
where
    V: PolicyVisitor + ?Sized,
{
    let statement = node.value();
    if let Some(base) = node.catalog().statement_base(statement) {
        let location = node.location().child("baseStatement");
        visitor.visit_base_statement(&node.child(base, location, 0, Parent::Statement(statement)), report);
    }
}

/// Visits the function, if it resolves, then the arguments of a base statement.
pub fn walk_base_statement<V>(visitor: &V, node: &Node<'_, BaseStatement>, report: &mut PolicyReport)
where
    V: PolicyVisitor + ?Sized,
{
    let base = node.value();
    if let Some(function) = node.catalog().statement_function(base) {
        let location = node.location().child("function");
        visitor.visit_function(&node.child(function, location, 0, Parent::BaseStatement(base)), report);
    }
    for (i, argument) in base.arguments.iter().enumerate() {
        let location = node.location().indexed_child("arguments", i);
        visitor.visit_argument(&node.child(argument, location, i, Parent::BaseStatement(base)), report);
    }
}

/// Functions have no children.
pub fn walk_function<V>(_visitor: &V, _node: &Node<'_, BaseStatementFunction>, _report: &mut PolicyReport)
where
    V: PolicyVisitor + ?Sized,
{
}

/// Arguments have no children.
pub fn walk_argument<V>(_visitor: &V, _node: &Node<'_, BaseStatementArgument>, _report: &mut PolicyReport)
where
    V: PolicyVisitor + ?Sized,
{
}

impl PolicyTree {
    /// Runs a visitor over the whole tree, starting at the root.
    pub fn accept<V>(&self, visitor: &V, report: &mut PolicyReport)
    where
        V: PolicyVisitor + ?Sized,
    {
        match self.root() {
            RootNode::Policy(policy) => visitor.visit_policy(&Node::root(self, policy), report),
            RootNode::BaseStatement(id) => match self.catalog().base_statement(*id) {
                Some(base) => visitor.visit_base_statement(&Node::root(self, base), report),
                None => visitor.visit_missing_root(&Location::root("baseStatement"), report),
            },
            RootNode::Function(id) => match self.catalog().function(*id) {
                Some(function) => visitor.visit_function(&Node::root(self, function), report),
                None => visitor.visit_missing_root(&Location::root("function"), report),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::argument::ArgumentType;
    use crate::catalog::FunctionId;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<String>>);

    impl Recorder {
        fn push(&self, kind: &str, location: &Location) {
            self.0.borrow_mut().push(format!("{kind} {location}"));
        }
    }

    impl PolicyVisitor for Recorder {
        fn visit_policy(&self, node: &Node<'_, Policy>, report: &mut PolicyReport) {
            self.push("policy", node.location());
            walk_policy(self, node, report);
        }

        fn visit_clause(&self, node: &Node<'_, PolicyClause>, report: &mut PolicyReport) {
            self.push("clause", node.location());
            walk_clause(self, node, report);
        }

        fn visit_statement(&self, node: &Node<'_, ConfiguredStatement>, report: &mut PolicyReport) {
            self.push("statement", node.location());
            walk_statement(self, node, report);
        }

        fn visit_base_statement(&self, node: &Node<'_, BaseStatement>, report: &mut PolicyReport) {
            self.push("base", node.location());
            walk_base_statement(self, node, report);
        }

        fn visit_function(&self, node: &Node<'_, BaseStatementFunction>, _report: &mut PolicyReport) {
            self.push("function", node.location());
        }

        fn visit_argument(&self, node: &Node<'_, BaseStatementArgument>, _report: &mut PolicyReport) {
            self.push("argument", node.location());
        }

        fn visit_missing_root(&self, location: &Location, _report: &mut PolicyReport) {
            self.push("missing", location);
        }
    }

    fn tree() -> PolicyTree {
        let mut catalog = Catalog::new();
        let dep = catalog.add_function(BaseStatementFunction::new("dep", "jdoe", 1));
        let function = catalog.add_function(BaseStatementFunction::new("f", "jdoe", 1).with_dependency(dep));
        let base = catalog.add_base_statement(
            BaseStatement::new("Base", "jdoe", 1)
                .with_function(function)
                .with_argument(BaseStatementArgument::new("a", ArgumentType::String))
                .with_argument(BaseStatementArgument::new("b", ArgumentType::String)),
        );
        let policy = Policy::new("System").with_clause(
            PolicyClause::new()
                .with_statement(ConfiguredStatement::new(base))
                .with_statement(ConfiguredStatement::default()),
        );
        PolicyTree::policy(catalog, policy)
    }

    #[test]
    fn test_traversal_order_and_locations() {
        let recorder = Recorder::default();
        tree().accept(&recorder, &mut PolicyReport::new());
        assert_eq!(
            recorder.0.into_inner(),
            vec![
                "policy policy",
                "clause clauses[0]",
                "statement clauses[0].statements[0]",
                "base clauses[0].statements[0].baseStatement",
                "function clauses[0].statements[0].baseStatement.function",
                "argument clauses[0].statements[0].baseStatement.arguments[0]",
                "argument clauses[0].statements[0].baseStatement.arguments[1]",
                "statement clauses[0].statements[1]",
            ]
        );
    }

    #[test]
    fn test_function_root() {
        let tree = tree();
        let tree = PolicyTree::function(tree.catalog().clone(), FunctionId::new(1));
        let recorder = Recorder::default();
        tree.accept(&recorder, &mut PolicyReport::new());
        assert_eq!(recorder.0.into_inner(), vec!["function function"]);
    }

    #[test]
    fn test_missing_root() {
        let tree = PolicyTree::function(Catalog::new(), FunctionId::new(3));
        let recorder = Recorder::default();
        tree.accept(&recorder, &mut PolicyReport::new());
        assert_eq!(recorder.0.into_inner(), vec!["missing function"]);
    }

    #[test]
    fn test_node_context() {
        struct ParentCheck;
        impl PolicyVisitor for ParentCheck {
            fn visit_argument(&self, node: &Node<'_, BaseStatementArgument>, _report: &mut PolicyReport) {
                assert!(matches!(node.parent(), Some(Parent::BaseStatement(b)) if b.name == "Base"));
                assert_eq!(node.policy().map(|p| p.policy_type.as_str()), Some("System"));
                assert_eq!(node.field("parameter"), format!("{}.parameter", node.location()));
            }
        }
        tree().accept(&ParentCheck, &mut PolicyReport::new());
    }
}
