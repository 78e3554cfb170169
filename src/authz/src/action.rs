//! Actions a subject may perform on a resource

use crate::error::{AuthzError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reserved action meaning "any action"
pub const ANY_ACTION: &str = "*";

/// A validated action name (read, write, delete, ...) or the `*` wildcard
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Action(String);

impl Action {
    /// Create an action, rejecting empty names, whitespace and embedded `*`
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();

        if name.is_empty() {
            return Err(AuthzError::InvalidAction {
                action: name,
                reason: "action cannot be empty".to_string(),
            });
        }

        if name != ANY_ACTION && name.contains(ANY_ACTION) {
            return Err(AuthzError::InvalidAction {
                action: name,
                reason: "wildcard must be the whole action".to_string(),
            });
        }

        if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(AuthzError::InvalidAction {
                action: name,
                reason: "action cannot contain whitespace".to_string(),
            });
        }

        Ok(Self(name))
    }

    /// The `*` action
    pub fn any() -> Self {
        Self(ANY_ACTION.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_any(&self) -> bool {
        self.0 == ANY_ACTION
    }

    /// Whether this declared action covers the requested one
    pub fn permits(&self, requested: &Action) -> bool {
        self.is_any() || self == requested
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Action {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Action {
    type Error = AuthzError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        action.0
    }
}
