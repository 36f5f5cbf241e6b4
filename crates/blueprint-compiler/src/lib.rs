//! # Blueprint Compiler
//!
//! Policy validation and Rego generation for Blueprint.
//!
//! This crate provides:
//!
//! - The built-in rulesets (constraint, configuration, logic, saved policy)
//! - [`PolicyBuilder`], which runs rulesets over a tree and builds Rego
//! - [`RegoCompiler`], the Rego generator
//! - [`RegoEngine`], an embedded `regorus` engine for checking output
//!
//! ## Example
//!
//! ```rust,ignore
//! use blueprint_compiler::{rulesets, BuilderConfig, PolicyBuilder};
//!
//! let builder = PolicyBuilder::with_config(BuilderConfig::strict());
//! let configuration = rulesets::configuration_ruleset();
//! let report = builder.validate(&tree, &[&configuration]);
//!
//! if !builder.blocks(&report) {
//!     let rego = builder.generate_rego(&tree)?;
//! }
//! ```

pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod rego;
pub mod rulesets;

#[cfg(test)]
mod proptest_tests;

pub use builder::{checksum, BuildOutput, PolicyBuilder};
pub use config::BuilderConfig;
pub use engine::RegoEngine;
pub use error::{CompilerError, Result};
pub use rego::{RegoCompiler, RegoTemplate};
