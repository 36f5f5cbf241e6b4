//! Dotted location paths for tree nodes and their fields.
//!
//! The root is addressed by its kind (`policy`). Its direct children drop
//! the root prefix (`clauses[0]`); deeper nodes append their identifier
//! (`clauses[0].statements[1].baseStatement`). Field locations always append
//! the field name (`policy.policyType`).

use std::fmt;

/// Location of a node in a tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    path: String,
    root: bool,
}

impl Location {
    /// Creates the location of a root node.
    pub fn root(identifier: impl Into<String>) -> Self {
        Self {
            path: identifier.into(),
            root: true,
        }
    }

    /// Returns the location of a child with the given identifier.
    #[must_use]
    pub fn child(&self, identifier: &str) -> Self {
        let path = if self.root {
            identifier.to_string()
        } else {
            format!("{}.{identifier}", self.path)
        };
        Self { path, root: false }
    }

    /// Returns the location of the `index`th element of a child list.
    #[must_use]
    pub fn indexed_child(&self, list: &str, index: usize) -> Self {
        self.child(&format!("{list}[{index}]"))
    }

    /// Returns the location of a field of this node.
    #[must_use]
    pub fn field(&self, field: &str) -> String {
        format!("{}.{field}", self.path)
    }

    /// Returns the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl From<&Location> for String {
    fn from(location: &Location) -> Self {
        location.path.clone()
    }
}

impl From<Location> for String {
    fn from(location: Location) -> Self {
        location.path
    }
}
