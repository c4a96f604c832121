//! Operator identity types.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;

/// Capability string granting every permission.
pub const WILDCARD_PERMISSION: &str = "*";

/// Console role. Drives which affordances the chrome shows; nothing in the
/// console enforces it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Operator,
    Viewer,
    Analyst,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Operator => "operator",
            Self::Viewer => "viewer",
            Self::Analyst => "analyst",
        }
    }

    /// Human-readable label for headers and menus.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Admin => "Administrator",
            Self::Operator => "Operator",
            Self::Viewer => "Viewer",
            Self::Analyst => "Analyst",
        }
    }
}

/// The signed-in operator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub permissions: BTreeSet<String>,
    /// Set by the session container when a login succeeds.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_login: Option<OffsetDateTime>,
}

impl User {
    /// Whether the user holds `capability`, directly or through `*`.
    #[must_use]
    pub fn has_permission(&self, capability: &str) -> bool {
        self.permissions.contains(WILDCARD_PERMISSION) || self.permissions.contains(capability)
    }
}

/// Successful credential exchange: who signed in and their bearer token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grant {
    pub user: User,
    pub token: String,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("username and password are required")]
    MissingCredentials,
    #[error("token rejected: {0}")]
    TokenRejected(String),
    #[error("login service unavailable: {0}")]
    Backend(String),
}
