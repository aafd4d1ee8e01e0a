//! Identity
//!
//! The signed-in user as reported by the auth provider.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque user identifier. Also the path segment of the user's list screen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(uid: &str) -> Self {
        Self::new(uid)
    }
}

/// A resolved, signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: UserId,
    pub display_name: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            uid: UserId::new(uid),
            display_name,
        }
    }

    /// Name shown in the list screen title
    pub fn display_label(&self) -> &str {
        self.display_name.as_deref().unwrap_or("User")
    }
}
