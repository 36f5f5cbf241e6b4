//! Built-in rulesets.
//!
//! - [`constraint_ruleset`] - field constraints, argument configuration and
//!   dependency cycles; always applied first
//! - [`configuration_ruleset`] - duplicates, policy type compatibility,
//!   naming and lifecycle state
//! - [`logic_ruleset`] - boolean satisfiability of clauses and policies
//! - [`saved_policy_ruleset`] - requirements for storing a policy

pub mod configuration;
pub mod constraint;
pub mod logic;
pub mod saved;

use once_cell::sync::Lazy;
use regex::Regex;

pub use configuration::{
    configuration_ruleset, DuplicateValueRule, InvalidStateRule, MatchPolicyTypeRule, RegexRule,
    CONFIGURATION_RULESET,
};
pub use constraint::{
    constraint_ruleset, ArgumentsConfigurationRule, ConstraintValidationRule,
    CyclicDependenciesRule, CONSTRAINT_RULESET,
};
pub use logic::{logic_ruleset, FalsifiabilityRule, SatisfiabilityRule, LOGIC_RULESET};
pub use saved::{saved_policy_ruleset, SavedPolicyRule, SAVED_POLICY_RULESET};

/// Capitalized words separated by single spaces, e.g. `Base Statement`.
static CAPITALIZED_WORDS: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Za-z]*( [A-Z][A-Za-z]*)*$").ok());

/// A Rego identifier, e.g. `contains_value`.
static REGO_IDENTIFIER: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_]+[A-Za-z0-9_]*$").ok());

const CAPITALIZED_WORDS_MESSAGE: &str =
    "must only contain letters and spaces, with the first letter of each word capitalized";

const REGO_IDENTIFIER_MESSAGE: &str =
    "must only contain letters, numbers and underscores and cannot start with a number";

fn is_capitalized_words(value: &str) -> bool {
    CAPITALIZED_WORDS.as_ref().is_some_and(|re| re.is_match(value))
}

fn is_rego_identifier(value: &str) -> bool {
    REGO_IDENTIFIER.as_ref().is_some_and(|re| re.is_match(value))
}
