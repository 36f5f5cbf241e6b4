//! # Blueprint Core
//!
//! Core types for the Blueprint policy builder.
//!
//! This crate provides the policy tree and the framework rules use to walk
//! it:
//!
//! - [`ArgumentType`] - Types of base statement arguments
//! - [`BaseStatementFunction`], [`BaseStatement`] - Reusable, versioned building blocks
//! - [`Policy`] - Clauses of configured statements
//! - [`Catalog`], [`PolicyTree`] - Arena of shared elements and the tree being validated
//! - [`PolicyVisitor`], [`PolicyRule`], [`PolicyRuleset`] - Traversal and rules
//! - [`PolicyReport`] - Violations and errors collected by rules
//!
//! ## Example
//!
//! ```rust
//! use blueprint_core::{
//!     ArgumentType, BaseStatement, BaseStatementArgument, BaseStatementFunction, Catalog,
//!     ConfiguredStatement, Policy, PolicyClause, PolicyElementState, PolicyTree,
//! };
//!
//! let mut catalog = Catalog::new();
//! let contains = catalog.add_function(
//!     BaseStatementFunction::new("contains", "jdoe", 1)
//!         .with_state(PolicyElementState::Released)
//!         .with_parameter("array")
//!         .with_parameter("value")
//!         .with_expression("array[_] == value"),
//! );
//! let statement = catalog.add_base_statement(
//!     BaseStatement::new("Contains", "jdoe", 1)
//!         .with_function(contains)
//!         .with_argument(BaseStatementArgument::new("array", ArgumentType::StringArray))
//!         .with_argument(BaseStatementArgument::new("value", ArgumentType::String)),
//! );
//! let policy = Policy::new("System").with_clause(
//!     PolicyClause::new().with_statement(
//!         ConfiguredStatement::new(statement)
//!             .with_argument_value("foo, bar")
//!             .with_argument_value("foo"),
//!     ),
//! );
//! let tree = PolicyTree::policy(catalog, policy);
//! assert!(tree.root_policy().is_some());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod argument;
pub mod catalog;
pub mod document;
pub mod error;
pub mod identity;
pub mod location;
pub mod policy;
pub mod report;
pub mod rule;
pub mod state;
pub mod statement;
pub mod validation;
pub mod visitor;


// Re-export main types at crate root
pub use argument::{ArgumentParseError, ArgumentType, ArrayItem};
pub use catalog::{BaseStatementId, Catalog, FunctionId, PolicyTree, RootNode};
pub use document::PolicyDocument;
pub use error::{Error, Result};
pub use location::Location;
pub use policy::{ConfiguredStatement, Policy, PolicyClause};
pub use report::{PolicyBuilderError, PolicyReport, RuleSeverity, RuleViolation};
pub use rule::{PolicyRule, PolicyRuleset};
pub use state::PolicyElementState;
pub use statement::{BaseStatement, BaseStatementArgument, BaseStatementFunction};
pub use validation::{Validate, ValidationError, ValidationErrors};
pub use visitor::{Node, Parent, PolicyVisitor};
