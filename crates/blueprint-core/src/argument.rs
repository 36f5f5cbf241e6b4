//! Argument types for base statement parameters.
//!
//! Every [`BaseStatementArgument`](crate::BaseStatementArgument) declares an
//! [`ArgumentType`]. The type decides which configured values are acceptable,
//! how a value is rendered as a Rego literal and, for array types, how the
//! individual items are parsed out of the comma-separated value.
//!
//! # Example
//!
//! ```rust
//! use blueprint_core::ArgumentType;
//!
//! assert!(ArgumentType::IntegerArray.matches_argument("1, 2, 3", true));
//! assert!(!ArgumentType::IntegerArray.matches_argument("1, 1", true));
//! assert_eq!(
//!     ArgumentType::StringArray.generate_rego("foo, bar").as_deref(),
//!     Some(r#"["foo", "bar"]"#)
//! );
//! ```

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::Error;

/// The type of a base statement argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArgumentType {
    /// Any string value.
    String,
    /// A finite floating point number.
    Number,
    /// A 64-bit signed integer.
    Integer,
    /// Exactly `true` or `false`.
    Boolean,
    /// Comma-separated strings.
    StringArray,
    /// Comma-separated numbers.
    NumberArray,
    /// Comma-separated integers.
    IntegerArray,
}

impl ArgumentType {
    /// All argument types, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::String,
        Self::Number,
        Self::Integer,
        Self::Boolean,
        Self::StringArray,
        Self::NumberArray,
        Self::IntegerArray,
    ];

    /// Returns the canonical name used when storing the type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::StringArray => "stringArray",
            Self::NumberArray => "numberArray",
            Self::IntegerArray => "integerArray",
        }
    }

    /// Returns the name shown to policy authors.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Number => "number",
            Self::Integer => "Integer",
            Self::Boolean => "boolean",
            Self::StringArray => "String Array",
            Self::NumberArray => "number array",
            Self::IntegerArray => "integer array",
        }
    }

    /// Looks up a type by its canonical name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Returns true for the array types.
    #[must_use]
    pub const fn is_array(self) -> bool {
        matches!(self, Self::StringArray | Self::NumberArray | Self::IntegerArray)
    }

    /// Returns the element type of an array type, or the type itself for scalars.
    #[must_use]
    pub const fn base_type(self) -> Self {
        match self {
            Self::StringArray => Self::String,
            Self::NumberArray => Self::Number,
            Self::IntegerArray => Self::Integer,
            other => other,
        }
    }

    /// Determines whether a configured value is valid for this type.
    ///
    /// `unique_items` is only consulted for array types, where it rejects
    /// values containing the same item twice.
    #[must_use]
    pub fn matches_argument(self, value: &str, unique_items: bool) -> bool {
        match self {
            Self::String => true,
            Self::Number => parse_number(value).is_some(),
            Self::Integer => parse_integer(value).is_some(),
            Self::Boolean => value == "true" || value == "false",
            Self::StringArray | Self::NumberArray | Self::IntegerArray => {
                let Ok(items) = self.array_items(value) else {
                    return false;
                };
                if !unique_items {
                    return true;
                }
                let mut seen = HashSet::with_capacity(items.len());
                items.iter().all(|item| seen.insert(item.key()))
            }
        }
    }

    /// Renders a configured value as a Rego literal.
    ///
    /// Returns `None` if the value does not match this type.
    #[must_use]
    pub fn generate_rego(self, value: &str) -> Option<String> {
        match self {
            Self::String => quote(value),
            Self::Number => parse_number(value).map(|n| n.to_string()),
            Self::Integer => parse_integer(value).map(|i| i.to_string()),
            Self::Boolean => self.matches_argument(value, false).then(|| value.to_string()),
            Self::StringArray | Self::NumberArray | Self::IntegerArray => {
                let items = self.array_items(value).ok()?;
                let rendered = items
                    .iter()
                    .map(ArrayItem::to_rego)
                    .collect::<Option<Vec<_>>>()?;
                Some(format!("[{}]", rendered.join(", ")))
            }
        }
    }

    /// Parses the items of an array value.
    ///
    /// The value is split on commas and each trimmed item is parsed as the
    /// base type.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentParseError::NotAnArray`] for scalar types and
    /// [`ArgumentParseError::InvalidItem`] if any item fails to parse.
    pub fn array_items(self, value: &str) -> Result<Vec<ArrayItem>, ArgumentParseError> {
        if !self.is_array() {
            return Err(ArgumentParseError::NotAnArray { argument_type: self });
        }
        let base = self.base_type();
        value
            .split(',')
            .map(str::trim)
            .map(|item| {
                let parsed = match base {
                    Self::Number => parse_number(item).map(ArrayItem::Number),
                    Self::Integer => parse_integer(item).map(ArrayItem::Integer),
                    _ => Some(ArrayItem::Text(item.to_string())),
                };
                parsed.ok_or_else(|| ArgumentParseError::InvalidItem {
                    item: item.to_string(),
                    argument_type: base,
                })
            })
            .collect()
    }
}

impl fmt::Display for ArgumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for ArgumentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| Error::UnknownArgumentType {
            name: s.to_string(),
        })
    }
}

/// One parsed item of an array argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayItem {
    /// A string item.
    Text(String),
    /// A number item.
    Number(f64),
    /// An integer item.
    Integer(i64),
}

impl ArrayItem {
    /// Returns a canonical string form used for equality and uniqueness checks.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Integer(i) => i.to_string(),
        }
    }

    fn to_rego(&self) -> Option<String> {
        match self {
            Self::Text(s) => quote(s),
            Self::Number(n) => Some(n.to_string()),
            Self::Integer(i) => Some(i.to_string()),
        }
    }
}

impl fmt::Display for ArrayItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Failure to read items out of an array argument value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentParseError {
    /// The argument type is not an array type.
    #[error("A {} is not an array argument type", argument_type.display_name())]
    NotAnArray {
        /// The scalar type.
        argument_type: ArgumentType,
    },
    /// An item could not be parsed as the base type.
    #[error("'{item}' is not a valid {}", argument_type.display_name().to_lowercase())]
    InvalidItem {
        /// The offending item, trimmed.
        item: String,
        /// The expected base type.
        argument_type: ArgumentType,
    },
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_integer(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok()
}

// JSON string literals are valid Rego string literals.
fn quote(value: &str) -> Option<String> {
    serde_json::to_string(value).ok()
}
