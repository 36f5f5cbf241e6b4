//! Lifecycle state of versioned policy elements.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Lifecycle state of a base statement or function.
///
/// Only [`Released`](Self::Released) elements can be referenced from a policy
/// without a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum PolicyElementState {
    /// Work in progress.
    Draft,
    /// Available for use in policies.
    Released,
    /// Scheduled for removal.
    Deprecated,
}

impl PolicyElementState {
    /// Returns the display name of the state.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Released => "Released",
            Self::Deprecated => "Deprecated",
        }
    }

    /// Looks up a state by name, ignoring case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        [Self::Draft, Self::Released, Self::Deprecated]
            .into_iter()
            .find(|s| s.name().eq_ignore_ascii_case(name))
    }

    /// Returns true if the state is [`Released`](Self::Released).
    #[must_use]
    pub const fn is_released(self) -> bool {
        matches!(self, Self::Released)
    }
}

impl fmt::Display for PolicyElementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for PolicyElementState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| Error::UnknownState {
            name: s.to_string(),
        })
    }
}

impl TryFrom<String> for PolicyElementState {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_case() {
        assert_eq!(PolicyElementState::from_name("released"), Some(PolicyElementState::Released));
        assert_eq!(PolicyElementState::from_name("DRAFT"), Some(PolicyElementState::Draft));
        assert!("retired".parse::<PolicyElementState>().is_err());
    }

    #[test]
    fn test_deserialize_ignores_case() {
        let state: PolicyElementState = serde_json::from_str("\"released\"").unwrap();
        assert_eq!(state, PolicyElementState::Released);
        assert_eq!(serde_json::to_string(&state).unwrap(), "\"Released\"");
        assert!(serde_json::from_str::<PolicyElementState>("\"gone\"").is_err());
    }

    #[test]
    fn test_is_released() {
        assert!(PolicyElementState::Released.is_released());
        assert!(!PolicyElementState::Deprecated.is_released());
    }
}
