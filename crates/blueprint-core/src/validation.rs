//! Field constraint validation for tree nodes.
//!
//! Each node type declares its field constraints by implementing
//! [`Validate`]. The constraint validation rule turns every failed field
//! into a violation at `<node location>.<field>`.

use std::fmt;

/// A field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field path relative to the validated node (e.g. `argumentValues[1]`).
    pub field: String,
    /// A human-readable description of the failure.
    pub message: String,
    /// The kind of validation that failed.
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(
        field: impl Into<String>,
        message: impl Into<String>,
        kind: ValidationErrorKind,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            kind,
        }
    }

    /// Creates a validation error for a required value that is missing.
    pub fn required(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, message, ValidationErrorKind::Required)
    }

    /// Creates a validation error for a blank string.
    pub fn blank(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, message, ValidationErrorKind::Blank)
    }

    /// Creates a validation error for an empty collection.
    pub fn empty(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, message, ValidationErrorKind::Empty)
    }

    /// Creates a validation error for a constraint violation.
    pub fn constraint(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, message, ValidationErrorKind::Constraint)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation error for '{}': {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// The category of validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    /// A required value was not provided.
    Required,
    /// A string is empty or whitespace.
    Blank,
    /// A collection is empty when it shouldn't be.
    Empty,
    /// A constraint between fields was violated.
    Constraint,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => write!(f, "required"),
            Self::Blank => write!(f, "blank"),
            Self::Empty => write!(f, "empty"),
            Self::Constraint => write!(f, "constraint"),
        }
    }
}

/// A collection of validation errors.
#[derive(Debug, Clone, Default)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Creates an empty validation errors collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a validation error to the collection.
    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Records a blank error if `value` is empty or whitespace.
    pub fn not_blank(&mut self, field: impl Into<String>, value: &str, message: &str) {
        if is_blank(value) {
            self.add(ValidationError::blank(field, message));
        }
    }

    /// Records a blank error for every blank item, using `field[i]` paths.
    pub fn no_blank_items<'a, I>(&mut self, field: &str, items: I, message: &str)
    where
        I: IntoIterator<Item = &'a String>,
    {
        for (i, item) in items.into_iter().enumerate() {
            self.not_blank(format!("{field}[{i}]"), item, message);
        }
    }

    /// Returns true if there are no validation errors.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of validation errors.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns an iterator over the validation errors.
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    /// Converts to a Result, returning `Ok(())` if no errors were recorded.
    ///
    /// # Errors
    ///
    /// Returns the whole collection if it is not empty.
    pub fn into_result(self) -> Result<(), Self> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl FromIterator<ValidationError> for ValidationErrors {
    fn from_iter<T: IntoIterator<Item = ValidationError>>(iter: T) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            write!(f, "no validation errors")
        } else if self.errors.len() == 1 {
            write!(f, "{}", self.errors[0])
        } else {
            writeln!(f, "{} validation errors:", self.errors.len())?;
            for error in &self.errors {
                writeln!(f, "  - {error}")?;
            }
            Ok(())
        }
    }
}

impl std::error::Error for ValidationErrors {}

/// Trait for nodes that declare field constraints.
///
/// Only the node's own fields are checked here; child nodes are validated
/// when the traversal reaches them.
pub trait Validate {
    /// Validates the node's fields.
    ///
    /// # Errors
    ///
    /// Returns every failed field constraint.
    fn validate(&self) -> Result<(), ValidationErrors>;

    /// Returns true if the node has no failed field constraints.
    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Returns true for empty or whitespace-only strings.
#[must_use]
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
