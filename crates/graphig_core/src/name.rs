//! Validated names for sets and features.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Name of a node set, edge set or feature.
///
/// Names are non-empty, contain no whitespace or control characters and do
/// not start with `#`, which is reserved for internal fields such as `#size`.
///
/// # Example
///
/// ```rust
/// use graphig_core::Name;
///
/// let name = Name::new("h").unwrap();
/// assert_eq!(name.as_str(), "h");
/// assert!(Name::new("#size").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Name(String);

impl Name {
    /// Validate and wrap a name.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidName`] if the name is empty, reserved, or
    /// contains whitespace or control characters.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let reason = if name.is_empty() {
            Some("name must not be empty")
        } else if name.starts_with('#') {
            Some("names starting with '#' are reserved")
        } else if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
            Some("name must not contain whitespace or control characters")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(CoreError::InvalidName { name, reason }),
            None => Ok(Self(name)),
        }
    }

    /// Get the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Name {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Name {
    type Error = CoreError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Name> for String {
    fn from(name: Name) -> Self {
        name.0
    }
}
