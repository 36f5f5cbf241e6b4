//! # Blueprint Test
//!
//! Shared test support for the Blueprint crates.
//!
//! - [`fixtures`] - a known-valid catalog and policy to mutate in tests
//! - [`documents`] - the same fixture as a JSON policy document
//! - [`assertions`] - report assertion helpers
//!
//! ## Example
//!
//! ```rust
//! use blueprint_core::{PolicyReport, PolicyRuleset};
//! use blueprint_test::{assert_no_violations, PolicyFixture};
//!
//! let tree = PolicyFixture::valid().into_tree();
//! let mut report = PolicyReport::new();
//! PolicyRuleset::new("Empty", false).apply(&tree, &mut report);
//! assert_no_violations(&report);
//! ```

pub mod assertions;
pub mod documents;
pub mod fixtures;

pub use assertions::{
    assert_blocking, assert_no_violations, assert_rule_violations, assert_violation,
};
pub use documents::{valid_document, valid_document_json};
pub use fixtures::PolicyFixture;
