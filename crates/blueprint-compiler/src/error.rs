//! Error types for the Blueprint compiler.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for compiler operations.
pub type Result<T> = std::result::Result<T, CompilerError>;

/// Errors that can occur while generating Rego.
#[derive(Error, Debug)]
pub enum CompilerError {
    /// Only policies can be compiled.
    #[error("Cannot generate Rego for a {root} root, only for a policy")]
    NotAPolicy {
        /// Kind of the root that was given.
        root: &'static str,
    },

    /// A configured statement has no resolvable base statement.
    #[error("No base statement found for the statement at {location}")]
    UnresolvedBaseStatement {
        /// Location of the statement.
        location: String,
    },

    /// A base statement has no resolvable function.
    #[error("No function found for the base statement '{base_statement}'")]
    UnresolvedFunction {
        /// Versioned name of the base statement.
        base_statement: String,
    },

    /// A function dependency does not resolve.
    #[error("No function found for the dependency {dependency}")]
    UnresolvedDependency {
        /// Id of the missing dependency.
        dependency: String,
    },

    /// A statement supplies the wrong number of argument values.
    #[error("The statement at {location} has {actual} argument values but {expected} are required")]
    ArgumentCount {
        /// Location of the statement.
        location: String,
        /// Number of configured arguments.
        expected: usize,
        /// Number of values supplied.
        actual: usize,
    },

    /// An argument value cannot be rendered as its type.
    #[error("Cannot render '{value}' at {location} as a {argument_type}")]
    ArgumentRender {
        /// Location of the value.
        location: String,
        /// The value.
        value: String,
        /// Display name of the argument type.
        argument_type: String,
    },

    /// Two different functions share a name.
    #[error("Multiple different functions are named '{name}'")]
    ConflictingFunction {
        /// The shared name.
        name: String,
    },

    /// A function is used with different constant argument values.
    #[error("The function '{function}' is used with conflicting constant arguments")]
    ConflictingConstants {
        /// Function name.
        function: String,
    },

    /// A function with constant arguments is also called by another function.
    #[error("The function '{function}' has constant arguments but is a dependency of '{dependent}'")]
    ConstantDependency {
        /// Function with constants.
        function: String,
        /// Function depending on it.
        dependent: String,
    },

    /// The generated source failed to parse.
    #[error("Generated Rego failed to parse: {message}")]
    SyntaxError {
        /// Parser message.
        message: String,
    },

    /// Evaluating a query against generated source failed.
    #[error("Rego evaluation failed: {message}")]
    EvaluationError {
        /// Engine message.
        message: String,
    },

    /// Validation reported blocking findings.
    #[error("Policy validation failed with {violations} violations and {errors} errors")]
    ValidationFailed {
        /// Number of blocking violations.
        violations: usize,
        /// Number of structural errors.
        errors: usize,
    },

    /// Failed to read a configuration file.
    #[error("Failed to read config file {path}: {source}")]
    ConfigReadError {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a configuration file.
    #[error("Invalid config file {path}: {source}")]
    ConfigParseError {
        /// Path to the file.
        path: PathBuf,
        /// Underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },

    /// Writing the generated source failed.
    #[error("Failed to format Rego: {0}")]
    FormatError(#[from] std::fmt::Error),

    /// Core library error.
    #[error(transparent)]
    CoreError(#[from] blueprint_core::Error),
}
