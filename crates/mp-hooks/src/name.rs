use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::HookNameError;

/// Dot-namespaced identifier of a hook, e.g. `Status.getOSPid`.
///
/// The dispatcher treats names as opaque keys. Names arriving from outside
/// the process should go through [`FromStr`], which rejects blank input.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HookName(String);

impl HookName {
    /// Wraps a hook name without validation.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrows the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HookName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl FromStr for HookName {
    type Err = HookNameError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(HookNameError::Blank);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(HookNameError::Whitespace(trimmed.to_owned()));
        }
        Ok(Self::new(trimmed))
    }
}

impl Borrow<str> for HookName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for HookName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for HookName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for HookName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&HookName> for HookName {
    fn from(name: &HookName) -> Self {
        name.clone()
    }
}
