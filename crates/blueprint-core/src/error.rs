//! Error types for Blueprint core operations.
//!
//! This module defines the error types used throughout the `blueprint-core` crate.

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Blueprint core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// An argument type name did not match any known type.
    #[error("Unknown argument type: {name}")]
    UnknownArgumentType {
        /// The name that was looked up.
        name: String,
    },

    /// A lifecycle state name did not match any known state.
    #[error("Unknown policy element state: {name}")]
    UnknownState {
        /// The name that was looked up.
        name: String,
    },

    /// Rules cannot be added to a built-in ruleset.
    #[error("Cannot add rules to the built-in ruleset '{ruleset}'")]
    SealedRuleset {
        /// Name of the built-in ruleset.
        ruleset: String,
    },

    /// A policy document referenced an element it does not define.
    #[error("Unresolved {kind} reference '{name}' at {location}")]
    UnresolvedReference {
        /// Kind of element referenced (function, base statement).
        kind: &'static str,
        /// Versioned name that could not be resolved.
        name: String,
        /// Document location of the reference.
        location: String,
    },

    /// A policy document did not contain a validation root.
    #[error("Policy document has no root: expected one of policy, baseStatement or function")]
    MissingRoot,

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
